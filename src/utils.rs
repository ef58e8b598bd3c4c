// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::options::Quote;

use core::fmt::Write;

/// Length of `text` in UTF-16 code units, the length a JavaScript string reports.
pub fn utf16_len(text: &str) -> usize {
    text.chars().map(char::len_utf16).sum()
}

/// Render `text` as a JavaScript string literal.
///
/// Besides the characters a string literal cannot hold, U+2028 and U+2029 are
/// escaped, as is every `</` so that the literal can sit inside an HTML
/// `<script>` element.
pub fn quote_js_string(text: &str, quote: Quote) -> String {
    let q = quote.as_char();
    let mut out = String::with_capacity(text.len() + text.len() / 8 + 2);
    out.push(q);

    let mut prev = '\0';
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            '/' if prev == '<' => out.push_str("\\/"),
            c if c == q => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 || c == '\u{7f}' => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c => out.push(c),
        }
        prev = ch;
    }

    out.push(q);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf16_lengths() {
        assert_eq!(utf16_len(""), 0);
        assert_eq!(utf16_len("abc"), 3);
        assert_eq!(utf16_len("é"), 1);
        assert_eq!(utf16_len("😀"), 2);
    }

    #[test]
    fn quotes_and_backslashes() {
        assert_eq!(
            quote_js_string(r#"{"a":"b\"c"}"#, Quote::Double),
            r#""{\"a\":\"b\\\"c\"}""#
        );
        assert_eq!(
            quote_js_string(r#"{"a":"it's"}"#, Quote::Single),
            r#"'{"a":"it\'s"}'"#
        );
    }

    #[test]
    fn script_close_tags() {
        assert_eq!(
            quote_js_string("<script></script>", Quote::Double),
            r#""<script><\/script>""#
        );
        assert_eq!(quote_js_string("</</", Quote::Double), r#""<\/<\/""#);
        assert_eq!(quote_js_string("a/b", Quote::Double), r#""a/b""#);
    }

    #[test]
    fn line_separators_and_controls() {
        assert_eq!(
            quote_js_string("a\u{2028}b\u{2029}c", Quote::Double),
            r#""a\u2028b\u2029c""#
        );
        assert_eq!(quote_js_string("\n\t\u{1}", Quote::Single), r#"'\n\t\x01'"#);
    }
}
