/// Fixed illustration emitted as the `artwork` event of a dragon summon.
pub const DRAGON_ART: &str = r"
    /\_/\
   / o o \
  (  >w<  )
   \,,,,,/
  //  -  \\
 //  -  - \\
//  -  -  - \\
";

pub const DRAGON_DELAY_MS: u64 = 2000;

/// Largest argument count `console.log` / `console.warn` accept.
pub const MAX_CONSOLE_ARGS: usize = 15;

pub const BLIND_BOX_ITEMS: [&str; 6] = [
    "一个亲亲😘",
    "一杯奶茶🥤",
    "一个bug🐛",
    "一次水逆🌊",
    "一根鸡腿🍗",
    "一朵小红花🌸",
];

pub fn dragon_message(wish: &str) -> String {
    format!("🐉 神龙出现：你的愿望\"{}\"我听到了！", wish)
}

/// Progress of the most recent dragon summon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragonState {
    #[default]
    Idle,
    ArtworkShown,
    MessagePending,
    MessageShown,
}

/// Script-visible `console` value.
#[derive(Debug, Clone, Copy, Default)]
pub struct Console;

/// Script-visible `herlang` namespace value.
#[derive(Debug, Clone, Copy, Default)]
pub struct HerMagic;
