#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    Number,
    Str,
    Comment,
    Punct,
    Whitespace,
    Newline,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn is_ident(&self, name: &str) -> bool {
        self.kind == TokenKind::Ident && self.text == name
    }

    pub fn is_punct(&self, punct: &str) -> bool {
        self.kind == TokenKind::Punct && self.text == punct
    }

    pub fn is_trivia(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Whitespace | TokenKind::Comment | TokenKind::Newline
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentStyle {
    /// `//` and `/* */`
    CLike,
    /// `#` to end of line
    Hash,
}

const TWO_CHAR_PUNCT: [&str; 12] = [
    "==", "!=", "<=", ">=", "&&", "||", "=>", "->", "::", "..", "+=", "-=",
];

/// Splits source into tokens. Concatenating token texts gives back `source`.
pub fn tokenize(source: &str, comments: CommentStyle) -> Vec<Token> {
    let chars = source.chars().collect::<Vec<_>>();
    let mut tokens = Vec::new();
    let mut index = 0usize;

    while index < chars.len() {
        let ch = chars[index];
        let start = index;
        let kind = if ch == '\n' {
            index += 1;
            TokenKind::Newline
        } else if ch.is_whitespace() {
            while index < chars.len() && chars[index].is_whitespace() && chars[index] != '\n' {
                index += 1;
            }
            TokenKind::Whitespace
        } else if is_comment_start(&chars, index, comments) {
            if comments == CommentStyle::CLike && chars.get(index + 1) == Some(&'*') {
                index += 2;
                while index < chars.len()
                    && !(chars[index] == '*' && chars.get(index + 1) == Some(&'/'))
                {
                    index += 1;
                }
                index = (index + 2).min(chars.len());
            } else {
                while index < chars.len() && chars[index] != '\n' {
                    index += 1;
                }
            }
            TokenKind::Comment
        } else if ch == '"' || ch == '\'' || ch == '`' {
            index += 1;
            while index < chars.len() && chars[index] != ch {
                if chars[index] == '\\' {
                    index += 1;
                }
                index += 1;
            }
            index = (index + 1).min(chars.len());
            TokenKind::Str
        } else if ch.is_ascii_digit() {
            while index < chars.len() && (chars[index].is_ascii_alphanumeric() || chars[index] == '_')
            {
                index += 1;
            }
            if chars.get(index) == Some(&'.')
                && chars.get(index + 1).is_some_and(|next| next.is_ascii_digit())
            {
                index += 1;
                while index < chars.len() && chars[index].is_ascii_digit() {
                    index += 1;
                }
            }
            TokenKind::Number
        } else if is_ident_char(ch) {
            while index < chars.len() && is_ident_char(chars[index]) {
                index += 1;
            }
            TokenKind::Ident
        } else {
            let pair = chars
                .get(index..index + 2)
                .map(|pair| pair.iter().collect::<String>());
            if pair
                .as_deref()
                .is_some_and(|pair| TWO_CHAR_PUNCT.contains(&pair))
            {
                index += 2;
            } else {
                index += 1;
            }
            TokenKind::Punct
        };
        tokens.push(Token::new(kind, chars[start..index].iter().collect::<String>()));
    }

    tokens
}

pub fn render(tokens: &[Token]) -> String {
    tokens.iter().map(|token| token.text.as_str()).collect()
}

pub fn is_ident_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

fn is_comment_start(chars: &[char], index: usize, comments: CommentStyle) -> bool {
    match comments {
        CommentStyle::Hash => chars[index] == '#',
        CommentStyle::CLike => {
            chars[index] == '/' && matches!(chars.get(index + 1), Some('/') | Some('*'))
        }
    }
}

/// Index of the bracket closing the one at `open`, skipping nested pairs.
pub fn matching_close(tokens: &[Token], open: usize) -> Option<usize> {
    let (opener, closer) = match tokens.get(open)?.text.as_str() {
        "(" => ("(", ")"),
        "[" => ("[", "]"),
        "{" => ("{", "}"),
        _ => return None,
    };
    let mut depth = 0usize;
    for (index, token) in tokens.iter().enumerate().skip(open) {
        if token.is_punct(opener) {
            depth += 1;
        } else if token.is_punct(closer) {
            depth -= 1;
            if depth == 0 {
                return Some(index);
            }
        }
    }
    None
}

/// Next index at or after `from` that is not whitespace, newline or comment.
pub fn next_significant(tokens: &[Token], from: usize) -> Option<usize> {
    (from..tokens.len()).find(|index| !tokens[*index].is_trivia())
}

pub fn prev_significant(tokens: &[Token], before: usize) -> Option<usize> {
    (0..before).rev().find(|index| !tokens[*index].is_trivia())
}

/// Splits the tokens between two brackets on top-level commas.
pub fn split_args(tokens: &[Token]) -> Vec<Vec<Token>> {
    let mut args = Vec::new();
    let mut current = Vec::new();
    let mut depth = 0i32;
    for token in tokens {
        if token.kind == TokenKind::Punct {
            match token.text.as_str() {
                "(" | "[" | "{" => depth += 1,
                ")" | "]" | "}" => depth -= 1,
                "," if depth == 0 => {
                    args.push(std::mem::take(&mut current));
                    continue;
                }
                _ => {}
            }
        }
        current.push(token.clone());
    }
    if !current.is_empty() || !args.is_empty() {
        args.push(current);
    }
    args
}

pub fn trim_trivia(tokens: &[Token]) -> &[Token] {
    let start = tokens
        .iter()
        .position(|token| !token.is_trivia())
        .unwrap_or(tokens.len());
    let end = tokens
        .iter()
        .rposition(|token| !token.is_trivia())
        .map_or(start, |index| index + 1);
    &tokens[start..end]
}
