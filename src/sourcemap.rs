// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Source map v3 output.
//!
//! Columns count UTF-16 code units, which is what browsers and bundlers use.

use anyhow::{anyhow, bail, Result};
use data_encoding::BASE64;
use serde::{Deserialize, Serialize};

const BASE64_DIGITS: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

const VLQ_SHIFT: u32 = 5;
const VLQ_CONTINUATION: i64 = 1 << VLQ_SHIFT;
const VLQ_MASK: i64 = VLQ_CONTINUATION - 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMap {
    pub version: u32,
    pub file: String,
    pub sources: Vec<String>,
    pub sources_content: Vec<Option<String>>,
    pub names: Vec<String>,
    pub mappings: String,
}

impl SourceMap {
    pub fn to_json_str(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json_str(json: &str) -> Result<SourceMap> {
        Ok(serde_json::from_str(json)?)
    }

    /// The map as a `data:` URL, for inline `//# sourceMappingURL=` comments.
    pub fn to_url(&self) -> Result<String> {
        let json = self.to_json_str()?;
        Ok(format!(
            "data:application/json;charset=utf-8;base64,{}",
            BASE64.encode(json.as_bytes())
        ))
    }

    /// Decode `mappings` into absolute segments, one list per generated line.
    pub fn decode_mappings(&self) -> Result<Vec<Vec<Segment>>> {
        decode_mappings(&self.mappings)
    }
}

/// A mapping from a generated column to an original position. Lines and
/// columns are 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub generated_column: u32,
    pub source: u32,
    pub original_line: u32,
    pub original_column: u32,
}

pub fn encode_vlq(value: i64, out: &mut String) {
    let mut vlq = if value < 0 {
        ((-value) << 1) | 1
    } else {
        value << 1
    };
    loop {
        let mut digit = vlq & VLQ_MASK;
        vlq >>= VLQ_SHIFT;
        if vlq > 0 {
            digit |= VLQ_CONTINUATION;
        }
        out.push(BASE64_DIGITS[digit as usize] as char);
        if vlq == 0 {
            break;
        }
    }
}

fn base64_value(ch: u8) -> Option<i64> {
    BASE64_DIGITS
        .iter()
        .position(|d| *d == ch)
        .map(|p| p as i64)
}

/// Decode one VLQ value from the front of `bytes`, advancing it.
pub fn decode_vlq(bytes: &mut &[u8]) -> Result<i64> {
    let mut result = 0i64;
    let mut shift = 0;
    loop {
        let Some((&ch, rest)) = bytes.split_first() else {
            bail!("unexpected end of VLQ value");
        };
        *bytes = rest;
        let digit =
            base64_value(ch).ok_or_else(|| anyhow!("invalid base64 digit `{}`", ch as char))?;
        if shift > 60 {
            bail!("VLQ value too large");
        }
        result += (digit & VLQ_MASK) << shift;
        shift += VLQ_SHIFT;
        if digit & VLQ_CONTINUATION == 0 {
            break;
        }
    }
    let negative = result & 1 == 1;
    result >>= 1;
    Ok(if negative { -result } else { result })
}

pub fn decode_mappings(mappings: &str) -> Result<Vec<Vec<Segment>>> {
    let mut lines = vec![];
    let (mut source, mut line, mut column) = (0i64, 0i64, 0i64);
    for text in mappings.split(';') {
        let mut segments = vec![];
        let mut generated_column = 0i64;
        for seg in text.split(',').filter(|s| !s.is_empty()) {
            let mut bytes = seg.as_bytes();
            generated_column += decode_vlq(&mut bytes)?;
            if bytes.is_empty() {
                bail!("segment `{seg}` has no original position");
            }
            source += decode_vlq(&mut bytes)?;
            line += decode_vlq(&mut bytes)?;
            column += decode_vlq(&mut bytes)?;
            // A fifth field names a symbol; names are never emitted.
            if !bytes.is_empty() {
                decode_vlq(&mut bytes)?;
            }
            if [generated_column, source, line, column].iter().any(|v| *v < 0) {
                bail!("segment `{seg}` decodes to a negative position");
            }
            segments.push(Segment {
                generated_column: generated_column as u32,
                source: source as u32,
                original_line: line as u32,
                original_column: column as u32,
            });
        }
        lines.push(segments);
    }
    Ok(lines)
}

/// Incrementally encodes `mappings` for a single source.
#[derive(Debug, Default)]
pub struct MappingsBuilder {
    mappings: String,
    line_has_segment: bool,
    prev_generated_column: i64,
    prev_original_line: i64,
    prev_original_column: i64,
}

impl MappingsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_segment(&mut self, generated_column: u32, original_line: u32, original_column: u32) {
        if self.line_has_segment {
            self.mappings.push(',');
        }
        encode_vlq(
            generated_column as i64 - self.prev_generated_column,
            &mut self.mappings,
        );
        // Always source 0.
        encode_vlq(0, &mut self.mappings);
        encode_vlq(
            original_line as i64 - self.prev_original_line,
            &mut self.mappings,
        );
        encode_vlq(
            original_column as i64 - self.prev_original_column,
            &mut self.mappings,
        );
        self.prev_generated_column = generated_column as i64;
        self.prev_original_line = original_line as i64;
        self.prev_original_column = original_column as i64;
        self.line_has_segment = true;
    }

    pub fn next_line(&mut self) {
        self.mappings.push(';');
        self.prev_generated_column = 0;
        self.line_has_segment = false;
    }

    pub fn finish(self) -> String {
        self.mappings
    }
}
