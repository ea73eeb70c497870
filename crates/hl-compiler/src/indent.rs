use std::collections::{BTreeMap, BTreeSet};

use hl_core::Diagnostic;

use crate::lexer::{render, tokenize, CommentStyle, Token, TokenKind};

const HEADER_KEYWORDS: [&str; 9] = [
    "def", "if", "elif", "else", "for", "while", "try", "except", "finally",
];

/// Headers that continue the statement opened by the block just closed.
const CONTINUATION_KEYWORDS: [&str; 4] = ["elif", "else", "except", "finally"];

const RESERVED: [&str; 12] = [
    "let", "const", "fn", "if", "else", "for", "while", "return", "break", "continue", "true",
    "false",
];

#[derive(Debug)]
struct OpenBlock {
    indent: usize,
    indent_text: String,
    body_indent: Option<usize>,
    /// Output line of the header that starts this `if`/`try` chain.
    chain_start: usize,
    declared: BTreeSet<String>,
    function_boundary: bool,
}

/// Turns indentation-delimited blocks into braces.
///
/// Blocks close right before the first line that dedents to or past their
/// header, and every block still open at end of input is closed there, so the
/// number of `{` written always equals the number of `}`.
///
/// Names live in function scope. A name first assigned inside a nested block
/// is declared with `let name;` ahead of the outermost statement enclosing
/// it, so it stays readable after the block closes.
pub fn infer_blocks(code: &str) -> (String, Vec<Diagnostic>) {
    let mut out: Vec<String> = Vec::new();
    let mut hoisted: BTreeMap<usize, Vec<String>> = BTreeMap::new();
    let mut diagnostics = Vec::new();
    let mut blocks: Vec<OpenBlock> = Vec::new();
    let mut globals = BTreeSet::new();
    let mut top_indent = None;
    let mut bracket_depth = 0i32;

    for (line_index, line) in code.lines().enumerate() {
        let line_no = line_index + 1;
        let tokens = tokenize(line, CommentStyle::Hash);
        let continuing = bracket_depth > 0;
        bracket_depth += bracket_delta(&tokens);

        if continuing {
            let mut rewritten = rewrite_tokens(tokens);
            if bracket_depth <= 0 {
                bracket_depth = 0;
                terminate_statement(&mut rewritten);
            }
            out.push(render(&rewritten));
            continue;
        }

        let (indent_text, body) = split_indent(&tokens);
        if body.iter().all(|token| token.kind == TokenKind::Whitespace) {
            out.push(String::new());
            continue;
        }
        if body
            .iter()
            .all(|token| matches!(token.kind, TokenKind::Whitespace | TokenKind::Comment))
        {
            out.push(format!("{}{}", indent_text, render(&rewrite_tokens(body.to_vec()))));
            continue;
        }

        let indent = indent_width(&indent_text);
        let mut closed_sibling = None;
        while blocks.last().is_some_and(|block| block.indent >= indent) {
            if let Some(block) = blocks.pop() {
                out.push(format!("{}}}", block.indent_text));
                closed_sibling = (block.indent == indent).then_some(block.chain_start);
            }
        }
        let expected = match blocks.last_mut() {
            Some(block) => *block.body_indent.get_or_insert(indent),
            None => *top_indent.get_or_insert(indent),
        };
        if expected != indent {
            diagnostics.push(Diagnostic::structure(
                format!(
                    "Indentation of {} does not match the enclosing block ({}).",
                    indent, expected
                ),
                line_no,
            ));
        }

        let body = body.to_vec();
        if is_pass(&body) {
            continue;
        }

        if let Some(keyword) = header_keyword(&body) {
            let mut declared = BTreeSet::new();
            if keyword == "def" {
                declared.extend(function_params(&body));
            } else if keyword == "for" {
                declared.extend(loop_variable(&body));
            }
            let mut rewritten = rewrite_tokens(strip_header_colon(body));
            trim_trailing_whitespace(&mut rewritten);
            rewritten.push(Token::new(TokenKind::Whitespace, " "));
            rewritten.push(Token::new(TokenKind::Punct, "{"));
            let header_line = out.len();
            out.push(format!("{}{}", indent_text, render(&rewritten)));
            let chain_start = match closed_sibling {
                Some(start) if CONTINUATION_KEYWORDS.contains(&keyword) => start,
                _ => header_line,
            };
            blocks.push(OpenBlock {
                indent,
                indent_text,
                body_indent: None,
                chain_start,
                declared,
                function_boundary: keyword == "def",
            });
            continue;
        }

        let mut rewritten = rewrite_tokens(body);
        if let Some(name) = assigned_name(&rewritten) {
            if !is_declared(&blocks, &globals, &name) {
                let owner = blocks.iter().rposition(|block| block.function_boundary);
                let outermost = owner.map_or(0, |index| index + 1);
                match blocks.get(outermost) {
                    Some(statement) => {
                        hoisted
                            .entry(statement.chain_start)
                            .or_default()
                            .push(format!("{}let {};", statement.indent_text, name));
                    }
                    None => {
                        let position = rewritten
                            .iter()
                            .position(|token| token.is_ident(&name))
                            .unwrap_or(0);
                        rewritten.insert(position, Token::new(TokenKind::Whitespace, " "));
                        rewritten.insert(position, Token::new(TokenKind::Ident, "let"));
                    }
                }
                match owner.and_then(|index| blocks.get_mut(index)) {
                    Some(function) => {
                        function.declared.insert(name);
                    }
                    None => {
                        globals.insert(name);
                    }
                }
            }
        }
        if bracket_depth <= 0 {
            bracket_depth = 0;
            terminate_statement(&mut rewritten);
        }
        out.push(format!("{}{}", indent_text, render(&rewritten)));
    }

    while let Some(block) = blocks.pop() {
        out.push(format!("{}}}", block.indent_text));
    }

    let mut lines = Vec::with_capacity(out.len());
    for (index, line) in out.into_iter().enumerate() {
        if let Some(declarations) = hoisted.remove(&index) {
            lines.extend(declarations);
        }
        lines.push(line);
    }
    (lines.join("\n"), diagnostics)
}

fn split_indent(tokens: &[Token]) -> (String, &[Token]) {
    match tokens.first() {
        Some(token) if token.kind == TokenKind::Whitespace => (token.text.clone(), &tokens[1..]),
        _ => (String::new(), tokens),
    }
}

fn indent_width(indent: &str) -> usize {
    indent
        .chars()
        .map(|ch| if ch == '\t' { 4 } else { 1 })
        .sum()
}

fn bracket_delta(tokens: &[Token]) -> i32 {
    tokens
        .iter()
        .filter(|token| token.kind == TokenKind::Punct)
        .map(|token| match token.text.as_str() {
            "(" | "[" | "{" => 1,
            ")" | "]" | "}" => -1,
            _ => 0,
        })
        .sum()
}

fn significant(tokens: &[Token]) -> impl Iterator<Item = &Token> {
    tokens.iter().filter(|token| !token.is_trivia())
}

fn is_pass(tokens: &[Token]) -> bool {
    let mut iter = significant(tokens);
    matches!((iter.next(), iter.next()), (Some(token), None) if token.is_ident("pass"))
}

fn header_keyword(tokens: &[Token]) -> Option<&'static str> {
    let first = significant(tokens).next()?;
    let last = significant(tokens).last()?;
    if !last.is_punct(":") {
        return None;
    }
    HEADER_KEYWORDS
        .iter()
        .copied()
        .find(|keyword| first.is_ident(keyword))
}

fn strip_header_colon(mut tokens: Vec<Token>) -> Vec<Token> {
    if let Some(index) = tokens.iter().rposition(|token| token.is_punct(":")) {
        tokens.remove(index);
    }
    // Trailing comments would swallow the brace we append.
    tokens.retain(|token| token.kind != TokenKind::Comment);
    tokens
}

fn function_params(tokens: &[Token]) -> Vec<String> {
    let Some(open) = tokens.iter().position(|token| token.is_punct("(")) else {
        return Vec::new();
    };
    tokens[open + 1..]
        .iter()
        .take_while(|token| !token.is_punct(")"))
        .filter(|token| token.kind == TokenKind::Ident)
        .map(|token| token.text.clone())
        .collect()
}

fn loop_variable(tokens: &[Token]) -> Option<String> {
    let mut iter = significant(tokens);
    iter.next();
    iter.next()
        .filter(|token| token.kind == TokenKind::Ident)
        .map(|token| token.text.clone())
}

fn assigned_name(tokens: &[Token]) -> Option<String> {
    let mut iter = significant(tokens);
    let name = iter.next()?;
    let op = iter.next()?;
    if name.kind == TokenKind::Ident && op.is_punct("=") && !RESERVED.contains(&name.text.as_str())
    {
        return Some(name.text.clone());
    }
    None
}

fn is_declared(blocks: &[OpenBlock], globals: &BTreeSet<String>, name: &str) -> bool {
    for block in blocks.iter().rev() {
        if block.declared.contains(name) {
            return true;
        }
        if block.function_boundary {
            return false;
        }
    }
    globals.contains(name)
}

fn rewrite_tokens(tokens: Vec<Token>) -> Vec<Token> {
    let mut out: Vec<Token> = Vec::with_capacity(tokens.len());
    let mut index = 0usize;
    while index < tokens.len() {
        let token = &tokens[index];
        let next_is_paren = tokens[index + 1..]
            .iter()
            .find(|next| next.kind != TokenKind::Whitespace)
            .is_some_and(|next| next.is_punct("("));
        let replacement = match token.kind {
            TokenKind::Ident => match token.text.as_str() {
                "def" => Some("fn"),
                "elif" => Some("else if"),
                "True" => Some("true"),
                "False" => Some("false"),
                "None" => Some("()"),
                "and" => Some("&&"),
                "or" => Some("||"),
                "not" => Some("!"),
                "finally" => Some(""),
                "print" if next_is_paren => Some("console.log"),
                "str" if next_is_paren => Some("to_string"),
                "except" => {
                    let (catch, consumed) = rewrite_except(&tokens[index..]);
                    out.extend(catch);
                    index += consumed;
                    continue;
                }
                _ => None,
            },
            TokenKind::Str if token.text.starts_with('\'') => {
                out.push(Token::new(TokenKind::Str, double_quoted(&token.text)));
                index += 1;
                continue;
            }
            TokenKind::Comment => {
                out.push(Token::new(
                    TokenKind::Comment,
                    format!("//{}", token.text.trim_start_matches('#')),
                ));
                index += 1;
                continue;
            }
            TokenKind::Punct
                if token.text == "/" && tokens.get(index + 1).is_some_and(|t| t.is_punct("/")) =>
            {
                out.push(token.clone());
                index += 2;
                continue;
            }
            _ => None,
        };
        match replacement {
            Some(text) => out.push(Token::new(TokenKind::Ident, text)),
            None => out.push(token.clone()),
        }
        index += 1;
    }
    out
}

/// `'it\'s "x"'` becomes `"it's \"x\""`. Single quotes are char literals
/// in the target language.
fn double_quoted(literal: &str) -> String {
    let inner = literal.strip_prefix('\'').unwrap_or(literal);
    let inner = inner.strip_suffix('\'').unwrap_or(inner);
    let mut out = String::with_capacity(inner.len() + 2);
    out.push('"');
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => match chars.next() {
                Some('\'') => out.push('\''),
                Some(escaped) => {
                    out.push('\\');
                    out.push(escaped);
                }
                None => out.push_str("\\\\"),
            },
            '"' => out.push_str("\\\""),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

/// `except`, `except E`, `except E as e` become `catch` / `catch (e)`.
/// Returns the replacement and how many input tokens it covers.
fn rewrite_except(tokens: &[Token]) -> (Vec<Token>, usize) {
    let end = tokens
        .iter()
        .position(|token| token.is_punct(":"))
        .unwrap_or(tokens.len());
    let clause = &tokens[..end];
    let bound = clause
        .iter()
        .position(|token| token.is_ident("as"))
        .and_then(|as_index| {
            clause[as_index + 1..]
                .iter()
                .find(|token| token.kind == TokenKind::Ident)
        });
    let mut out = vec![Token::new(TokenKind::Ident, "catch")];
    if let Some(name) = bound {
        out.push(Token::new(TokenKind::Whitespace, " "));
        out.push(Token::new(TokenKind::Punct, "("));
        out.push(name.clone());
        out.push(Token::new(TokenKind::Punct, ")"));
    }
    (out, end)
}

fn trim_trailing_whitespace(tokens: &mut Vec<Token>) {
    while tokens
        .last()
        .is_some_and(|token| token.kind == TokenKind::Whitespace)
    {
        tokens.pop();
    }
}

fn terminate_statement(tokens: &mut Vec<Token>) {
    let comment = match tokens.last() {
        Some(token) if token.kind == TokenKind::Comment => tokens.pop(),
        _ => None,
    };
    trim_trailing_whitespace(tokens);
    let needs_semicolon = tokens
        .last()
        .is_some_and(|token| !(token.is_punct(";") || token.is_punct("{") || token.is_punct("}")));
    if needs_semicolon {
        tokens.push(Token::new(TokenKind::Punct, ";"));
    }
    if let Some(comment) = comment {
        tokens.push(Token::new(TokenKind::Whitespace, " "));
        tokens.push(comment);
    }
}
