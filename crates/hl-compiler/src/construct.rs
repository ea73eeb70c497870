use hl_core::Diagnostic;

use crate::lexer::{
    matching_close, next_significant, prev_significant, render, split_args, tokenize, trim_trivia,
    CommentStyle, Token, TokenKind,
};

/// Rewrites the closed set of Rust-like constructs into script form.
///
/// Passes run once each, macros first. A rewritten macro becomes a single
/// opaque token, so its arguments are unwrapped while it is being built.
pub fn rewrite_constructs(code: &str) -> (String, Vec<Diagnostic>) {
    let mut diagnostics = Vec::new();
    let tokens = tokenize(code, CommentStyle::CLike);

    let tokens = rewrite_macros(tokens, &["panic"], &mut diagnostics);
    let tokens = rewrite_macros(
        tokens,
        &["println", "print", "eprintln", "eprint", "vec"],
        &mut diagnostics,
    );
    let tokens = rewrite_fn_signatures(tokens);
    let tokens = rewrite_bindings(tokens);
    let tokens = rewrite_match(tokens);
    let tokens = unwrap_wrappers(tokens);

    (render(&tokens), diagnostics)
}

fn line_of(tokens: &[Token], index: usize) -> usize {
    1 + tokens[..index]
        .iter()
        .filter(|token| token.kind == TokenKind::Newline)
        .count()
}

fn rewrite_macros(
    tokens: Vec<Token>,
    names: &[&str],
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<Token> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut index = 0usize;
    while index < tokens.len() {
        let token = &tokens[index];
        let is_macro = token.kind == TokenKind::Ident
            && names.contains(&token.text.as_str())
            && tokens.get(index + 1).is_some_and(|next| next.is_punct("!"));
        if !is_macro {
            out.push(token.clone());
            index += 1;
            continue;
        }

        let Some(open) = next_significant(&tokens, index + 2) else {
            out.push(token.clone());
            index += 1;
            continue;
        };
        let Some(close) = matching_close(&tokens, open) else {
            diagnostics.push(Diagnostic::structure(
                format!("Unbalanced arguments for {}!", token.text),
                line_of(&tokens, index),
            ));
            out.push(token.clone());
            index += 1;
            continue;
        };

        let args = split_args(&tokens[open + 1..close])
            .iter()
            .map(|arg| render(&unwrap_wrappers(trim_trivia(arg).to_vec())))
            .collect::<Vec<_>>();
        let after_arrow = prev_significant(&tokens, index).is_some_and(|prev| tokens[prev].is_punct("=>"));
        let replacement = match token.text.as_str() {
            "panic" => {
                let message = format_message(&args).unwrap_or_else(|| "\"explicit panic\"".to_string());
                if after_arrow {
                    format!("{{ throw {} }}", message)
                } else {
                    format!("throw {}", message)
                }
            }
            "eprintln" | "eprint" => format!("console.warn({})", log_arguments(&args)),
            "vec" => format!("[{}]", args.join(", ")),
            _ => format!("console.log({})", log_arguments(&args)),
        };
        out.push(Token::new(TokenKind::Ident, replacement));
        index = close + 1;
    }
    out
}

fn log_arguments(args: &[String]) -> String {
    if let Some((first, rest)) = args.split_first() {
        if let Some(template) = format_template(first, rest) {
            return template;
        }
    }
    args.join(", ")
}

fn format_message(args: &[String]) -> Option<String> {
    let first = args.first()?;
    Some(format_template(first, &args[1..]).unwrap_or_else(|| first.clone()))
}

/// Converts a `"…{}…"` format string plus arguments into an interpolated
/// backtick string. Returns `None` when `fmt` is not a plain string literal
/// or has no placeholders.
fn format_template(fmt: &str, args: &[String]) -> Option<String> {
    let inner = fmt.strip_prefix('"')?.strip_suffix('"')?;
    let chars = inner.chars().collect::<Vec<_>>();
    let mut out = String::from("`");
    let mut positional = 0usize;
    let mut placeholders = 0usize;
    let mut index = 0usize;

    while index < chars.len() {
        let ch = chars[index];
        match ch {
            '{' if chars.get(index + 1) == Some(&'{') => {
                out.push('{');
                index += 2;
                continue;
            }
            '}' if chars.get(index + 1) == Some(&'}') => {
                out.push('}');
                index += 2;
                continue;
            }
            '{' => {
                let close = chars[index..].iter().position(|c| *c == '}')? + index;
                let spec = chars[index + 1..close].iter().collect::<String>();
                let name = spec.split(':').next().unwrap_or_default().trim();
                let expr = if name.is_empty() {
                    positional += 1;
                    args.get(positional - 1)?.clone()
                } else if let Ok(position) = name.parse::<usize>() {
                    args.get(position)?.clone()
                } else {
                    name.to_string()
                };
                out.push_str("${");
                out.push_str(&expr);
                out.push('}');
                placeholders += 1;
                index = close + 1;
                continue;
            }
            '\\' => {
                match chars.get(index + 1) {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some(other) => out.push(*other),
                    None => out.push('\\'),
                }
                index += 2;
                continue;
            }
            '`' => out.push_str("``"),
            _ => out.push(ch),
        }
        index += 1;
    }

    if placeholders == 0 {
        return None;
    }
    out.push('`');
    Some(out)
}

fn rewrite_fn_signatures(tokens: Vec<Token>) -> Vec<Token> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut index = 0usize;
    while index < tokens.len() {
        let token = &tokens[index];
        out.push(token.clone());
        if !token.is_ident("fn") {
            index += 1;
            continue;
        }
        let open = next_significant(&tokens, index + 1)
            .and_then(|name| next_significant(&tokens, name + 1))
            .filter(|open| tokens[*open].is_punct("("));
        let Some(open) = open else {
            index += 1;
            continue;
        };
        let Some(close) = matching_close(&tokens, open) else {
            index += 1;
            continue;
        };

        out.extend_from_slice(&tokens[index + 1..open]);
        let params = split_args(&tokens[open + 1..close])
            .iter()
            .filter_map(|param| param_name(param))
            .collect::<Vec<_>>();
        out.push(Token::new(TokenKind::Punct, "("));
        out.push(Token::new(TokenKind::Ident, params.join(", ")));
        out.push(Token::new(TokenKind::Punct, ")"));

        index = close + 1;
        if let Some(arrow) = next_significant(&tokens, index).filter(|i| tokens[*i].is_punct("->")) {
            let body = (arrow..tokens.len())
                .find(|i| tokens[*i].is_punct("{"))
                .unwrap_or(tokens.len());
            out.push(Token::new(TokenKind::Whitespace, " "));
            index = body;
        }
    }
    out
}

fn param_name(param: &[Token]) -> Option<String> {
    param
        .iter()
        .filter(|token| !token.is_trivia() && !token.is_punct("&"))
        .find(|token| token.kind == TokenKind::Ident && !token.is_ident("mut"))
        .filter(|token| !token.is_ident("self"))
        .map(|token| token.text.clone())
}

/// `let mut x: T = …` and `const X: T = …` lose `mut` and the annotation.
fn rewrite_bindings(tokens: Vec<Token>) -> Vec<Token> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut index = 0usize;
    while index < tokens.len() {
        let token = &tokens[index];
        out.push(token.clone());
        index += 1;
        if !(token.is_ident("let") || token.is_ident("const")) {
            continue;
        }
        let Some(mut name) = next_significant(&tokens, index) else {
            continue;
        };
        if tokens[name].is_ident("mut") {
            index = name + 1;
            match next_significant(&tokens, index) {
                Some(next) => name = next,
                None => continue,
            }
            index = name;
            out.push(Token::new(TokenKind::Whitespace, " "));
        }
        if tokens[name].kind != TokenKind::Ident {
            continue;
        }
        out.extend_from_slice(&tokens[index..=name]);
        index = name + 1;
        let Some(colon) = next_significant(&tokens, index).filter(|i| tokens[*i].is_punct(":"))
        else {
            continue;
        };
        let assign = (colon..tokens.len())
            .find(|i| tokens[*i].is_punct("=") || tokens[*i].is_punct(";"))
            .unwrap_or(tokens.len());
        out.push(Token::new(TokenKind::Whitespace, " "));
        index = assign;
    }
    out
}

fn rewrite_match(tokens: Vec<Token>) -> Vec<Token> {
    tokens
        .into_iter()
        .map(|token| {
            if token.is_ident("match") {
                Token::new(TokenKind::Ident, "switch")
            } else {
                token
            }
        })
        .collect()
}

fn unwrap_wrappers(tokens: Vec<Token>) -> Vec<Token> {
    let mut out: Vec<Token> = Vec::with_capacity(tokens.len());
    let mut index = 0usize;
    while index < tokens.len() {
        let token = &tokens[index];

        if token.is_ident("None") {
            out.push(Token::new(TokenKind::Punct, "()"));
            index += 1;
            continue;
        }
        if token.is_punct("?") {
            index += 1;
            continue;
        }
        if token.is_punct(".")
            && tokens.get(index + 1).is_some_and(|next| next.is_ident("unwrap") || next.is_ident("expect"))
            && tokens.get(index + 2).is_some_and(|next| next.is_punct("("))
        {
            if let Some(close) = matching_close(&tokens, index + 2) {
                index = close + 1;
                continue;
            }
        }

        let wrapper_open = if token.is_ident("String")
            && tokens.get(index + 1).is_some_and(|t| t.is_punct("::"))
            && tokens.get(index + 2).is_some_and(|t| t.is_ident("from"))
        {
            Some(index + 3)
        } else if token.is_ident("Some") || token.is_ident("Ok") || token.is_ident("Err") {
            Some(index + 1)
        } else {
            None
        };
        let wrapped = wrapper_open
            .filter(|open| tokens.get(*open).is_some_and(|t| t.is_punct("(")))
            .and_then(|open| matching_close(&tokens, open).map(|close| (open, close)));
        let Some((open, close)) = wrapped else {
            out.push(token.clone());
            index += 1;
            continue;
        };

        let inner = unwrap_wrappers(tokens[open + 1..close].to_vec());
        if token.is_ident("Err") {
            let returned = out
                .iter()
                .rposition(|prev| !prev.is_trivia())
                .filter(|prev| out[*prev].is_ident("return"));
            if let Some(position) = returned {
                out.truncate(position);
            }
            out.push(Token::new(TokenKind::Ident, "throw "));
        }
        out.extend(inner);
        index = close + 1;
    }
    out
}

#[cfg(test)]
mod construct_tests {
    use super::*;

    fn rewrite(code: &str) -> String {
        rewrite_constructs(code).0
    }

    #[test]
    fn println_with_placeholders_becomes_interpolated_log() {
        assert_eq!(
            rewrite("println!(\"{} + {} = {total}\", a, b);"),
            "console.log(`${a} + ${b} = ${total}`);"
        );
    }

    #[test]
    fn println_without_placeholders_keeps_argument_list() {
        assert_eq!(
            rewrite("println!(\"luck:\", luck);"),
            "console.log(\"luck:\", luck);"
        );
        assert_eq!(rewrite("println!(\"plain\")"), "console.log(\"plain\")");
    }

    #[test]
    fn single_argument_with_named_placeholder_is_interpolated() {
        assert_eq!(rewrite("println!(\"hi {name}\");"), "console.log(`hi ${name}`);");
        assert_eq!(rewrite("eprintln!(\"{name:?}!\")"), "console.warn(`${name}!`)");
    }

    #[test]
    fn panic_becomes_throw_before_unwrapping_runs() {
        assert_eq!(
            rewrite("panic!(\"bad {}\", Some(x));"),
            "throw `bad ${x}`;"
        );
        assert_eq!(rewrite("_ => panic!(\"no\")"), "_ => { throw \"no\" }");
    }

    #[test]
    fn nested_parentheses_stay_inside_macro_arguments() {
        assert_eq!(
            rewrite("println!(\"{}\", f(g(1), 2)); x()"),
            "console.log(`${f(g(1), 2)}`); x()"
        );
    }

    #[test]
    fn fn_signature_loses_types_and_return_annotation() {
        assert_eq!(
            rewrite("fn add(a: i32, mut b: &str) -> Option<i32> {\n    a\n}"),
            "fn add(a, b) {\n    a\n}"
        );
        assert_eq!(rewrite("fn wish() {}"), "fn wish() {}");
    }

    #[test]
    fn bindings_drop_mut_and_annotations() {
        assert_eq!(rewrite("let mut x: Vec<i32> = vec![1, 2];"), "let x = [1, 2];");
        assert_eq!(rewrite("let y = 3;"), "let y = 3;");
        assert_eq!(rewrite("const LIMIT: i64 = 9;"), "const LIMIT = 9;");
    }

    #[test]
    fn match_becomes_switch() {
        let code = "match luck {\n    1 => println!(\"a\"),\n    2 | 3 => println!(\"b\"),\n    _ => println!(\"c\")\n}";
        let out = rewrite(code);
        assert!(out.starts_with("switch luck {"));
        assert!(out.contains("2 | 3 => console.log(\"b\"),"));
    }

    #[test]
    fn wrappers_are_unwrapped() {
        assert_eq!(rewrite("let a = Some(1 + 2);"), "let a = 1 + 2;");
        assert_eq!(rewrite("let b = None;"), "let b = ();");
        assert_eq!(rewrite("let c = Ok(f(1))?;"), "let c = f(1);");
        assert_eq!(rewrite("let d = load().unwrap();"), "let d = load();");
        assert_eq!(rewrite("let e = load().expect(\"x\");"), "let e = load();");
        assert_eq!(rewrite("let s = String::from(\"hi\");"), "let s = \"hi\";");
    }

    #[test]
    fn err_becomes_throw_and_absorbs_return() {
        assert_eq!(rewrite("return Err(\"oops\");"), "throw \"oops\";");
        assert_eq!(rewrite("Err(e)"), "throw e");
    }

    #[test]
    fn unbalanced_macro_is_reported_and_left_alone() {
        let (code, diagnostics) = rewrite_constructs("let a = 1;\nprintln!(\"x\"");
        assert_eq!(code, "let a = 1;\nprintln!(\"x\"");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].line, Some(2));
    }

    #[test]
    fn strings_and_comments_are_untouched() {
        let code = "// match None here\nlet s = \"Some(x) match\";";
        assert_eq!(rewrite(code), code);
    }

    #[test]
    fn eprintln_maps_to_warn() {
        assert_eq!(rewrite("eprintln!(\"careful\")"), "console.warn(\"careful\")");
    }

    #[test]
    fn format_template_handles_escapes() {
        assert_eq!(
            format_template("\"{{}} {}\\n\"", &["x".to_string()]),
            Some("`{} ${x}\n`".to_string())
        );
        assert_eq!(format_template("\"none\"", &[]), None);
        assert_eq!(format_template("\"{}\"", &[]), None);
        assert_eq!(format_template("ident", &[]), None);
    }
}
