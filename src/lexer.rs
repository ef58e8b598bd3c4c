// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use core::cmp;
use core::fmt::{self, Debug, Formatter};
use core::iter::Peekable;
use core::str::CharIndices;
use std::rc::Rc;

use anyhow::{anyhow, bail, Result};

#[derive(Clone)]
struct SourceInternal {
    pub file: String,
    pub contents: String,
    pub lines: Vec<(u32, u32)>,
}

/// A module's text together with its file name and line table.
#[derive(Clone)]
pub struct Source {
    src: Rc<SourceInternal>,
}

impl cmp::Ord for Source {
    fn cmp(&self, other: &Source) -> cmp::Ordering {
        Rc::as_ptr(&self.src).cmp(&Rc::as_ptr(&other.src))
    }
}

impl cmp::PartialOrd for Source {
    fn partial_cmp(&self, other: &Source) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl cmp::PartialEq for Source {
    fn eq(&self, other: &Source) -> bool {
        Rc::as_ptr(&self.src) == Rc::as_ptr(&other.src)
    }
}

impl cmp::Eq for Source {}

impl Debug for Source {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        self.src.file.fmt(f)
    }
}

impl Source {
    pub fn from_contents(file: String, contents: String) -> Result<Source> {
        let max_size = u32::MAX as usize - 2; // Account for rows, cols possibly starting at 1, EOF etc.
        if contents.len() > max_size {
            bail!("{file} exceeds maximum allowed module size {max_size}");
        }
        let mut lines = vec![];
        let mut prev_ch = ' ';
        let mut prev_pos = 0u32;
        let mut start = 0u32;
        for (i, ch) in contents.char_indices() {
            if ch == '\n' {
                let end = match prev_ch {
                    '\r' => prev_pos,
                    _ => i as u32,
                };
                lines.push((start, end));
                start = i as u32 + 1;
            }
            prev_ch = ch;
            prev_pos = i as u32;
        }

        if (start as usize) < contents.len() || contents.is_empty() || contents.ends_with('\n') {
            lines.push((start, contents.len() as u32));
        }
        Ok(Self {
            src: Rc::new(SourceInternal {
                file,
                contents,
                lines,
            }),
        })
    }

    pub fn file(&self) -> &String {
        &self.src.file
    }

    pub fn contents(&self) -> &String {
        &self.src.contents
    }

    pub fn line(&self, idx: u32) -> &str {
        let idx = idx as usize;
        if idx < self.src.lines.len() {
            let (start, end) = self.src.lines[idx];
            &self.src.contents[start as usize..end as usize]
        } else {
            ""
        }
    }

    /// 1-based line and column (in chars) of a byte offset.
    pub fn position(&self, offset: u32) -> (u32, u32) {
        let lines = &self.src.lines;
        let idx = lines
            .partition_point(|(start, _)| *start <= offset)
            .saturating_sub(1);
        let line_start = lines.get(idx).map(|(s, _)| *s).unwrap_or(0) as usize;
        let offset = (offset as usize).min(self.src.contents.len());
        let col = self
            .src
            .contents
            .get(line_start..offset)
            .map(|s| s.chars().count())
            .unwrap_or(0);
        (idx as u32 + 1, col as u32 + 1)
    }

    pub fn message(&self, line: u32, col: u32, kind: &str, msg: &str) -> String {
        if line as usize > self.src.lines.len() {
            return format!("{}: invalid line {} specified", self.src.file, line);
        }

        let line_str = format!("{line}");
        let line_num_width = line_str.len() + 1;
        let col_spaces = col as usize - 1;

        format!(
            "\n--> {}:{}:{}\n{:<line_num_width$}|\n\
		{:<line_num_width$}| {}\n\
		{:<line_num_width$}| {:<col_spaces$}^\n\
		{}: {}",
            self.src.file,
            line,
            col,
            "",
            line,
            self.line(line - 1),
            "",
            "",
            kind,
            msg
        )
    }

    pub fn error(&self, line: u32, col: u32, msg: &str) -> anyhow::Error {
        anyhow!(self.message(line, col, "error", msg))
    }

    pub fn error_at(&self, offset: u32, msg: &str) -> anyhow::Error {
        let (line, col) = self.position(offset);
        self.error(line, col, msg)
    }
}

#[derive(Clone)]
pub struct Span {
    pub source: Source,
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn new(source: &Source, start: u32, end: u32) -> Span {
        Span {
            source: source.clone(),
            start,
            end,
        }
    }

    pub fn text(&self) -> &str {
        &self.source.contents()[self.start as usize..self.end as usize]
    }

    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// True if `other` lies within this span.
    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    // Computed on demand; only diagnostics need it.
    pub fn line_col(&self) -> (u32, u32) {
        self.source.position(self.start)
    }

    pub fn message(&self, kind: &str, msg: &str) -> String {
        let (line, col) = self.line_col();
        self.source.message(line, col, kind, msg)
    }

    pub fn error(&self, msg: &str) -> anyhow::Error {
        self.source.error_at(self.start, msg)
    }
}

impl Debug for Span {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        let t = self.text().escape_debug().to_string();
        let max = 32;
        let (txt, trailer) = if t.chars().count() > max {
            (t.chars().take(max).collect::<String>(), "...")
        } else {
            (t, "")
        };
        let (line, col) = self.line_col();

        f.write_fmt(format_args!(
            "{}:{}:{}:{}, \"{}{}\"",
            line, col, self.start, self.end, txt, trailer
        ))
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TokenKind {
    Symbol,
    String,
    Number,
    BigInt,
    Ident,
    PrivateName,
    // A template chunk: "`...`", "`...${", "}...${" or "}...`".
    Template,
    Regex,
    Eof,
}

/// A token, its span and whether a line terminator preceded it.
#[derive(Debug, Clone)]
pub struct Token(pub TokenKind, pub Span, pub bool);

// Longest punctuators first.
const PUNCTUATORS: [&str; 52] = [
    ">>>=", "...", "===", "!==", "**=", "<<=", ">>=", ">>>", "&&=", "||=", "??=", "=>", "==",
    "!=", "<=", ">=", "&&", "||", "??", "?.", "++", "--", "+=", "-=", "*=", "/=", "%=", "&=",
    "|=", "^=", "<<", ">>", "**", "{", "}", "(", ")", "[", "]", ";", ",", "<", ">", "+", "-",
    "*", "/", "%", "&", "|", "^", "!",
];

const SINGLE_PUNCTUATORS: [char; 6] = ['~', '?', ':', '=', '.', '@'];

fn is_line_terminator(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

pub fn is_id_start(ch: char) -> bool {
    ch == '$' || ch == '_' || ch.is_alphabetic()
}

pub fn is_id_continue(ch: char) -> bool {
    ch == '$' || ch == '_' || ch == '\u{200c}' || ch == '\u{200d}' || ch.is_alphanumeric()
}

#[derive(Clone)]
pub struct Lexer<'source> {
    source: Source,
    iter: Peekable<CharIndices<'source>>,
}

impl<'source> Lexer<'source> {
    pub fn new(source: &'source Source) -> Self {
        let mut lexer = Self {
            source: source.clone(),
            iter: source.contents().char_indices().peekable(),
        };
        // Skip hashbang line.
        if source.contents().starts_with("#!") {
            while !matches!(lexer.peek().1, '\n' | '\r') && !lexer.at_eof() {
                lexer.iter.next();
            }
        }
        lexer
    }

    fn peek(&mut self) -> (usize, char) {
        match self.iter.peek() {
            Some((index, chr)) => (*index, *chr),
            _ => (self.source.contents().len(), '\x00'),
        }
    }

    fn peekahead(&mut self, n: usize) -> (usize, char) {
        match self.iter.clone().nth(n) {
            Some((index, chr)) => (index, chr),
            _ => (self.source.contents().len(), '\x00'),
        }
    }

    fn at_eof(&mut self) -> bool {
        self.iter.peek().is_none()
    }

    fn span(&self, start: usize, end: usize) -> Span {
        Span::new(&self.source, start as u32, end as u32)
    }

    fn error_at(&self, offset: usize, msg: &str) -> anyhow::Error {
        self.source.error_at(offset as u32, msg)
    }

    fn read_ident(&mut self, kind: TokenKind) -> Result<Token> {
        let start = self.peek().0;
        if kind == TokenKind::PrivateName {
            // #
            self.iter.next();
        }
        loop {
            let (offset, ch) = self.peek();
            if is_id_continue(ch) {
                self.iter.next();
            } else if ch == '\\' {
                return Err(self.error_at(offset, "escape sequences in identifiers are not supported"));
            } else {
                break;
            }
        }
        let end = self.peek().0;
        Ok(Token(kind, self.span(start, end), false))
    }

    // Reads digits of the given radix, allowing single `_` separators between digits.
    fn read_digits(&mut self, radix: u32) -> Result<usize> {
        let mut count = 0;
        let mut prev_sep = false;
        loop {
            let (offset, ch) = self.peek();
            if ch == '_' {
                if count == 0 || prev_sep || !self.peekahead(1).1.is_digit(radix) {
                    return Err(self.error_at(offset, "invalid numeric separator"));
                }
                prev_sep = true;
            } else if ch.is_digit(radix) {
                count += 1;
                prev_sep = false;
            } else {
                break;
            }
            self.iter.next();
        }
        Ok(count)
    }

    fn read_number(&mut self) -> Result<Token> {
        let (start, chr) = self.peek();
        let mut kind = TokenKind::Number;

        if chr == '0' && matches!(self.peekahead(1).1, 'x' | 'X' | 'o' | 'O' | 'b' | 'B') {
            let radix = match self.peekahead(1).1 {
                'x' | 'X' => 16,
                'o' | 'O' => 8,
                _ => 2,
            };
            self.iter.next();
            self.iter.next();
            if self.read_digits(radix)? == 0 {
                return Err(self.error_at(start, "invalid number: missing digits"));
            }
            if self.peek().1 == 'n' {
                self.iter.next();
                kind = TokenKind::BigInt;
            }
        } else {
            let mut is_integer = true;
            if chr == '.' {
                self.iter.next();
                self.read_digits(10)?;
                is_integer = false;
            } else {
                self.iter.next();
                if chr == '0' && self.peek().1.is_ascii_digit() {
                    return Err(self.error_at(start, "legacy octal literals are not allowed"));
                }
                if chr != '0' && self.peek().1 == '_' {
                    // Separator directly after the first digit.
                    let (offset, _) = self.peek();
                    if !self.peekahead(1).1.is_ascii_digit() {
                        return Err(self.error_at(offset, "invalid numeric separator"));
                    }
                    self.iter.next();
                }
                self.read_digits(10)?;

                // Read fraction part. The digits are optional (`1.` is a number).
                if self.peek().1 == '.' {
                    self.iter.next();
                    if self.peek().1 != '_' {
                        self.read_digits(10)?;
                    }
                    is_integer = false;
                }
            }

            // Read exponent part
            let ch = self.peek().1;
            if ch == 'e' || ch == 'E' {
                self.iter.next();
                if matches!(self.peek().1, '+' | '-') {
                    self.iter.next();
                }
                if self.read_digits(10)? == 0 {
                    let offset = self.peek().0;
                    return Err(self.error_at(offset, "invalid number: missing exponent"));
                }
                is_integer = false;
            }

            if is_integer && self.peek().1 == 'n' {
                self.iter.next();
                kind = TokenKind::BigInt;
            }
        }

        // A numeric literal cannot be immediately followed by an identifier or digit.
        let (offset, ch) = self.peek();
        if is_id_start(ch) || ch.is_ascii_digit() || ch == '\\' {
            return Err(self.error_at(
                offset,
                "identifier starts immediately after numeric literal",
            ));
        }

        Ok(Token(kind, self.span(start, offset), false))
    }

    fn read_string(&mut self) -> Result<Token> {
        let (start, quote) = self.peek();
        self.iter.next();
        loop {
            let (offset, ch) = self.peek();
            match ch {
                c if c == quote => {
                    self.iter.next();
                    break;
                }
                '\\' => {
                    self.iter.next();
                    if self.at_eof() {
                        return Err(self.error_at(start, "unterminated string literal"));
                    }
                    let (_, escaped) = self.peek();
                    self.iter.next();
                    if escaped == '\r' && self.peek().1 == '\n' {
                        self.iter.next();
                    }
                }
                '\n' | '\r' => {
                    return Err(self.error_at(offset, "unterminated string literal"));
                }
                _ if self.at_eof() => {
                    return Err(self.error_at(start, "unterminated string literal"));
                }
                _ => {
                    self.iter.next();
                }
            }
        }
        let end = self.peek().0;

        // Validate escape sequences eagerly.
        let span = self.span(start, end);
        cook_string(&span)?;

        Ok(Token(TokenKind::String, span, false))
    }

    // Reads a template chunk from the current position up to and including the
    // closing "`" or the "${" that opens a substitution.
    fn read_template_chunk(&mut self, start: usize) -> Result<Token> {
        loop {
            let (_, ch) = self.peek();
            match ch {
                '`' => {
                    self.iter.next();
                    break;
                }
                '$' if self.peekahead(1).1 == '{' => {
                    self.iter.next();
                    self.iter.next();
                    break;
                }
                '\\' => {
                    self.iter.next();
                    self.iter.next();
                }
                _ if self.at_eof() => {
                    return Err(self.error_at(start, "unterminated template literal"));
                }
                _ => {
                    self.iter.next();
                }
            }
        }
        let end = self.peek().0;
        Ok(Token(TokenKind::Template, self.span(start, end), false))
    }

    /// Continue a template literal after the `}` that closed a substitution.
    /// The lexer must be positioned right after that `}`.
    pub fn read_template_continuation(&mut self, brace: u32) -> Result<Token> {
        self.read_template_chunk(brace as usize)
    }

    /// Rescan a `/` or `/=` token that starts at `start` as a regular expression.
    /// The lexer must be positioned right after that token.
    pub fn read_regex(&mut self, start: u32) -> Result<Token> {
        let start = start as usize;
        let mut in_class = false;
        loop {
            let (_, ch) = self.peek();
            if self.at_eof() || is_line_terminator(ch) {
                return Err(self.error_at(start, "unterminated regular expression"));
            }
            self.iter.next();
            match ch {
                '\\' => {
                    let (_, escaped) = self.peek();
                    if self.at_eof() || is_line_terminator(escaped) {
                        return Err(self.error_at(start, "unterminated regular expression"));
                    }
                    self.iter.next();
                }
                '[' => in_class = true,
                ']' => in_class = false,
                '/' if !in_class => break,
                _ => (),
            }
        }
        // Flags
        while is_id_continue(self.peek().1) {
            self.iter.next();
        }
        let end = self.peek().0;
        Ok(Token(TokenKind::Regex, self.span(start, end), false))
    }

    // Skips whitespace and comments. Returns true if a line terminator was seen.
    fn skip_ws(&mut self) -> Result<bool> {
        let mut newline = false;
        loop {
            let (offset, ch) = self.peek();
            match ch {
                _ if self.at_eof() => break,
                c if is_line_terminator(c) => newline = true,
                '\t' | '\u{b}' | '\u{c}' | ' ' | '\u{a0}' | '\u{feff}' => (),
                c if c.is_whitespace() => (),
                '/' if self.peekahead(1).1 == '/' => {
                    while !self.at_eof() && !is_line_terminator(self.peek().1) {
                        self.iter.next();
                    }
                    continue;
                }
                '/' if self.peekahead(1).1 == '*' => {
                    self.iter.next();
                    self.iter.next();
                    loop {
                        let (_, c) = self.peek();
                        if self.at_eof() {
                            return Err(self.error_at(offset, "unterminated comment"));
                        }
                        self.iter.next();
                        if c == '*' && self.peek().1 == '/' {
                            self.iter.next();
                            break;
                        }
                        if is_line_terminator(c) {
                            newline = true;
                        }
                    }
                    continue;
                }
                _ => break,
            }
            self.iter.next();
        }
        Ok(newline)
    }

    pub fn next_token(&mut self) -> Result<Token> {
        let newline = self.skip_ws()?;
        let mut tok = self.scan_token()?;
        tok.2 = newline;
        Ok(tok)
    }

    fn scan_token(&mut self) -> Result<Token> {
        let (start, chr) = self.peek();

        if self.at_eof() {
            return Ok(Token(TokenKind::Eof, self.span(start, start), false));
        }

        match chr {
            '.' if self.peekahead(1).1.is_ascii_digit() => self.read_number(),
            _ if chr.is_ascii_digit() => self.read_number(),
            '"' | '\'' => self.read_string(),
            '`' => {
                self.iter.next();
                self.read_template_chunk(start)
            }
            '#' if is_id_start(self.peekahead(1).1) => self.read_ident(TokenKind::PrivateName),
            _ if is_id_start(chr) => self.read_ident(TokenKind::Ident),
            '\\' => Err(self.error_at(start, "escape sequences in identifiers are not supported")),
            _ => {
                let rest = &self.source.contents()[start..];
                let punct = PUNCTUATORS.iter().find(|p| {
                    // `?.` followed by a digit is a conditional operator.
                    rest.starts_with(**p)
                        && !(**p == "?." && rest[2..].starts_with(|c: char| c.is_ascii_digit()))
                });
                let len = match punct {
                    Some(p) => p.len(),
                    None if SINGLE_PUNCTUATORS.contains(&chr) => 1,
                    None => return Err(self.error_at(start, "invalid character")),
                };
                for _ in 0..len {
                    self.iter.next();
                }
                Ok(Token(TokenKind::Symbol, self.span(start, start + len), false))
            }
        }
    }
}

fn read_hex(chars: &mut Peekable<core::str::Chars<'_>>, n: usize) -> Option<u32> {
    let mut v = 0u32;
    for _ in 0..n {
        v = v * 16 + chars.next()?.to_digit(16)?;
    }
    Some(v)
}

/// Decode the value of a quoted string literal token.
///
/// Returns `Ok(None)` when the literal is valid but contains an unpaired
/// surrogate, which a Rust string cannot hold.
pub fn cook_string(span: &Span) -> Result<Option<String>> {
    let raw = span.text();
    let inner = &raw[1..raw.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut well_formed = true;
    let mut chars = inner.chars().peekable();
    let mut pending_high: Option<u32> = None;

    let invalid = |msg: &str| span.error(msg);

    while let Some(ch) = chars.next() {
        let unit = if ch == '\\' {
            let Some(esc) = chars.next() else {
                bail!(invalid("invalid escape sequence"));
            };
            match esc {
                'n' => Some('\n' as u32),
                'r' => Some('\r' as u32),
                't' => Some('\t' as u32),
                'b' => Some(0x08),
                'f' => Some(0x0c),
                'v' => Some(0x0b),
                '0' if !chars.peek().is_some_and(|c| c.is_ascii_digit()) => Some(0),
                '1'..='9' | '0' => bail!(invalid("octal escape sequences are not allowed")),
                'x' => match read_hex(&mut chars, 2) {
                    Some(v) => Some(v),
                    None => bail!(invalid("invalid hexadecimal escape sequence")),
                },
                'u' if chars.peek() == Some(&'{') => {
                    chars.next();
                    let mut v = 0u32;
                    let mut digits = 0;
                    loop {
                        match chars.next() {
                            Some('}') if digits > 0 => break,
                            Some(c) if c.is_ascii_hexdigit() => {
                                v = v.saturating_mul(16).saturating_add(c.to_digit(16).unwrap_or(0));
                                digits += 1;
                            }
                            _ => bail!(invalid("invalid unicode escape sequence")),
                        }
                    }
                    if v > 0x10ffff {
                        bail!(invalid("unicode escape out of range"));
                    }
                    Some(v)
                }
                'u' => match read_hex(&mut chars, 4) {
                    Some(v) => Some(v),
                    None => bail!(invalid("invalid unicode escape sequence")),
                },
                // Line continuations.
                '\r' => {
                    if chars.peek() == Some(&'\n') {
                        chars.next();
                    }
                    None
                }
                '\n' | '\u{2028}' | '\u{2029}' => None,
                c => Some(c as u32),
            }
        } else {
            Some(ch as u32)
        };

        let Some(unit) = unit else {
            continue;
        };

        if let Some(high) = pending_high.take() {
            if (0xdc00..0xe000).contains(&unit) {
                let cp = 0x10000 + ((high - 0xd800) << 10) + (unit - 0xdc00);
                out.extend(char::from_u32(cp));
                continue;
            }
            well_formed = false;
        }

        if (0xd800..0xdc00).contains(&unit) {
            pending_high = Some(unit);
        } else if let Some(c) = char::from_u32(unit) {
            out.push(c);
        } else {
            well_formed = false;
        }
    }

    if pending_high.is_some() {
        well_formed = false;
    }

    Ok(well_formed.then_some(out))
}
