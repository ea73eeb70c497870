use std::time::{SystemTime, UNIX_EPOCH};

use crate::builtins::BLIND_BOX_ITEMS;

/// Blind-box prize draws. Each box is an independent uniform pick from
/// [`BLIND_BOX_ITEMS`]; the same seed always opens the same prizes.
#[derive(Debug, Clone)]
pub struct BlindBox {
    state: u32,
}

impl BlindBox {
    pub fn seeded(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Seed from the wall clock for hosts that do not pin one.
    pub fn from_clock() -> Self {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.subsec_nanos() ^ (elapsed.as_secs() as u32))
            .unwrap_or(1);
        Self::seeded(seed)
    }

    pub fn open(&mut self) -> &'static str {
        BLIND_BOX_ITEMS[self.slot(BLIND_BOX_ITEMS.len() as u32) as usize]
    }

    // Raw values past the last whole multiple of `count` are redrawn.
    fn slot(&mut self, count: u32) -> u32 {
        let zone = u32::MAX - u32::MAX % count;
        loop {
            let raw = self.shuffle();
            if raw < zone {
                return raw % count;
            }
        }
    }

    // mulberry32
    fn shuffle(&mut self) -> u32 {
        self.state = self.state.wrapping_add(0x6d2b_79f5);
        let mut mixed = self.state;
        mixed = (mixed ^ (mixed >> 15)).wrapping_mul(mixed | 1);
        mixed ^= mixed.wrapping_add((mixed ^ (mixed >> 7)).wrapping_mul(mixed | 61));
        mixed ^ (mixed >> 14)
    }
}
