// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(test)]

use std::env;

use anyhow::{bail, Result};
use jsonfold::unstable::*;

fn source(code: &str) -> Result<Source> {
    Source::from_contents("test.js".to_string(), code.to_string())
}

fn get_tokens(source: &Source) -> Result<Vec<Token>> {
    let mut tokens = vec![];
    let mut lex = Lexer::new(source);
    loop {
        let tok = lex.next_token()?;
        tokens.push(tok.clone());
        if tok.0 == TokenKind::Eof {
            break;
        }
    }

    Ok(tokens)
}

fn kinds_and_texts(code: &str) -> Result<Vec<(TokenKind, String)>> {
    let source = source(code)?;
    Ok(get_tokens(&source)?
        .iter()
        .map(|t| (t.0, t.1.text().to_string()))
        .collect())
}

// Check that the caret printed for a token points at the token's text.
fn check_loc(tok: &Token) -> Result<()> {
    let msg = tok.1.message("", "");
    let lines: Vec<&str> = msg.split('\n').collect();
    let source_line = lines[3];
    let caret_line = lines[4];

    let Some(caret) = caret_line.chars().position(|c| c == '^') else {
        bail!("could not find caret for {tok:?} {msg}");
    };
    let at_caret: String = source_line.chars().skip(caret).collect();
    let span_str = tok.1.text().split('\n').next().unwrap_or("");
    if !at_caret.starts_with(span_str) {
        bail!("location mismatch for {tok:?} {msg}\n{span_str}\n{at_caret}");
    }
    Ok(())
}

#[test]
fn tokens_of_a_declaration() -> Result<()> {
    use TokenKind::*;
    assert_eq!(
        kinds_and_texts("export const a = { 'b': 1.5e3, c: [null] };")?,
        vec![
            (Ident, "export".to_string()),
            (Ident, "const".to_string()),
            (Ident, "a".to_string()),
            (Symbol, "=".to_string()),
            (Symbol, "{".to_string()),
            (String, "'b'".to_string()),
            (Symbol, ":".to_string()),
            (Number, "1.5e3".to_string()),
            (Symbol, ",".to_string()),
            (Ident, "c".to_string()),
            (Symbol, ":".to_string()),
            (Symbol, "[".to_string()),
            (Ident, "null".to_string()),
            (Symbol, "]".to_string()),
            (Symbol, "}".to_string()),
            (Symbol, ";".to_string()),
            (Eof, "".to_string()),
        ]
    );
    Ok(())
}

#[test]
fn longest_punctuator_wins() -> Result<()> {
    let texts: Vec<_> = kinds_and_texts("a >>>= b ?? c?.d ... x?.5:1")?
        .into_iter()
        .map(|(_, t)| t)
        .collect();
    assert_eq!(
        texts,
        vec!["a", ">>>=", "b", "??", "c", "?.", "d", "...", "x", "?", ".5", ":", "1", ""]
    );
    Ok(())
}

#[test]
fn numbers_and_bigints() -> Result<()> {
    use TokenKind::*;
    assert_eq!(
        kinds_and_texts("0x1F 0b10n 1_000 .5 10n 1.")?,
        vec![
            (Number, "0x1F".to_string()),
            (BigInt, "0b10n".to_string()),
            (Number, "1_000".to_string()),
            (Number, ".5".to_string()),
            (BigInt, "10n".to_string()),
            (Number, "1.".to_string()),
            (Eof, "".to_string()),
        ]
    );
    Ok(())
}

#[test]
fn templates_and_private_names() -> Result<()> {
    use TokenKind::*;
    assert_eq!(
        kinds_and_texts("`a\nb` #x")?,
        vec![
            (Template, "`a\nb`".to_string()),
            (PrivateName, "#x".to_string()),
            (Eof, "".to_string()),
        ]
    );
    Ok(())
}

#[test]
fn newline_flag() -> Result<()> {
    let source = source("a /* one\ntwo */ b // c\nd e")?;
    let flags: Vec<_> = get_tokens(&source)?
        .iter()
        .map(|t| (t.1.text().to_string(), t.2))
        .collect();
    assert_eq!(
        flags,
        vec![
            ("a".to_string(), false),
            ("b".to_string(), true),
            ("d".to_string(), true),
            ("e".to_string(), false),
            ("".to_string(), false),
        ]
    );
    Ok(())
}

#[test]
fn hashbang_is_skipped() -> Result<()> {
    let texts: Vec<_> = kinds_and_texts("#!/usr/bin/env node\nx")?
        .into_iter()
        .map(|(_, t)| t)
        .collect();
    assert_eq!(texts, vec!["x", ""]);
    Ok(())
}

#[test]
fn string_values() -> Result<()> {
    let source = source(r#"'a\x41B\u{43}\n\0' "😀" "\ud800" "line\
continued""#)?;
    let tokens = get_tokens(&source)?;
    assert_eq!(cook_string(&tokens[0].1)?.as_deref(), Some("aABC\n\0"));
    assert_eq!(cook_string(&tokens[1].1)?.as_deref(), Some("\u{1f600}"));
    assert_eq!(cook_string(&tokens[2].1)?, None);
    assert_eq!(cook_string(&tokens[3].1)?.as_deref(), Some("linecontinued"));
    Ok(())
}

#[test]
fn lexer_errors() -> Result<()> {
    let cases = [
        ("'abc", "unterminated string literal"),
        ("'ab\nc'", "unterminated string literal"),
        ("`abc", "unterminated template literal"),
        ("/* abc", "unterminated comment"),
        ("012", "legacy octal literals are not allowed"),
        ("1__0", "invalid numeric separator"),
        ("3in x", "identifier starts immediately after numeric literal"),
        ("0x", "invalid number: missing digits"),
        ("1e+", "invalid number: missing exponent"),
        ("a ¤ b", "invalid character"),
        (r"'\1'", "octal escape sequences are not allowed"),
        (r"'\u{110000}'", "unicode escape out of range"),
    ];
    for (code, expected) in cases {
        let source = source(code)?;
        match get_tokens(&source) {
            Ok(_) => bail!("`{code}` lexed without error"),
            Err(e) => {
                let msg = e.to_string();
                assert!(msg.contains(expected), "{code}: {msg}");
                assert!(msg.contains("--> test.js:"), "{msg}");
            }
        }
    }

    Ok(())
}

#[test]
fn token_locations() -> Result<()> {
    let source = source("const x = {\n\ta: 'é',\n  \"b\": [1, 2],\n};\n")?;
    for tok in get_tokens(&source)? {
        check_loc(&tok)?;
    }
    Ok(())
}

#[test]
#[ignore = "intended for lexing a module given on the command line"]
fn one_file() -> Result<()> {
    let mut file = String::default();
    let mut verbose = false;
    for a in env::args() {
        if a.ends_with(".js") || a.ends_with(".mjs") {
            file = a.clone();
        }
        if matches!(a.as_str(), "verbose") {
            verbose = true;
        }
    }

    if file.is_empty() {
        bail!("missing <module.js>")
    }

    let contents = std::fs::read_to_string(&file)?;
    let source = Source::from_contents(file, contents)?;
    let tokens = get_tokens(&source)?;
    for tok in &tokens {
        if verbose {
            println!("{}", tok.1.message("token", ""));
        }
        check_loc(tok)?;
    }
    println!("{} tokens", tokens.len());
    Ok(())
}
