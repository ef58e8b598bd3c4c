// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::analyzer::{FoldResult, FoldResults};
use crate::lexer::Source;
use crate::options::Options;
use crate::sourcemap::{MappingsBuilder, SourceMap};
use crate::utils::{quote_js_string, utf16_len};

use std::collections::BTreeMap;

use anyhow::Result;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("range {start}..{end} is out of bounds (len={len})")]
    OutOfBounds { start: u32, end: u32, len: u32 },
    #[error("offset {0} is not on a character boundary")]
    NotCharBoundary(u32),
    #[error("cannot overwrite empty range at {0}")]
    EmptyRange(u32),
    #[error("range {start}..{end} overlaps an earlier overwrite")]
    Overlap { start: u32, end: u32 },
    #[error("cannot insert at {0}, inside an overwritten range")]
    InsideOverwrite(u32),
}

enum Chunk<'a> {
    Original { start: u32, end: u32 },
    Overwrite { start: u32, end: u32, text: &'a str },
    Insert { text: &'a str },
}

/// Records replacements against an unchanged original text and renders the
/// result along with a source map.
///
/// Insertions at the start of an overwrite come before the replacement text;
/// insertions at its end come after.
#[derive(Debug, Clone)]
pub struct EditBuffer<'a> {
    original: &'a str,
    // start -> (end, text)
    overwrites: BTreeMap<u32, (u32, String)>,
    inserts: BTreeMap<u32, Vec<String>>,
}

impl<'a> EditBuffer<'a> {
    pub fn new(original: &'a str) -> Self {
        Self {
            original,
            overwrites: BTreeMap::new(),
            inserts: BTreeMap::new(),
        }
    }

    fn len(&self) -> u32 {
        self.original.len() as u32
    }

    fn check_boundary(&self, offset: u32) -> Result<(), EditError> {
        if self.original.is_char_boundary(offset as usize) {
            Ok(())
        } else {
            Err(EditError::NotCharBoundary(offset))
        }
    }

    // The overwrite that strictly contains `pos`, if any.
    fn overwrite_around(&self, pos: u32) -> Option<(u32, u32)> {
        self.overwrites
            .range(..pos)
            .next_back()
            .map(|(s, (e, _))| (*s, *e))
            .filter(|(_, e)| pos < *e)
    }

    pub fn overwrite(&mut self, start: u32, end: u32, text: &str) -> Result<(), EditError> {
        if start > end || end > self.len() {
            return Err(EditError::OutOfBounds {
                start,
                end,
                len: self.len(),
            });
        }
        if start == end {
            return Err(EditError::EmptyRange(start));
        }
        self.check_boundary(start)?;
        self.check_boundary(end)?;

        let overlaps_prev = self
            .overwrites
            .range(..=start)
            .next_back()
            .is_some_and(|(_, (e, _))| start < *e);
        let overlaps_next = self.overwrites.range(start..end).next().is_some();
        if overlaps_prev || overlaps_next {
            return Err(EditError::Overlap { start, end });
        }
        if let Some((pos, _)) = self.inserts.range(start + 1..end).next() {
            return Err(EditError::InsideOverwrite(*pos));
        }

        self.overwrites.insert(start, (end, text.to_string()));
        Ok(())
    }

    pub fn insert(&mut self, pos: u32, text: &str) -> Result<(), EditError> {
        if pos > self.len() {
            return Err(EditError::OutOfBounds {
                start: pos,
                end: pos,
                len: self.len(),
            });
        }
        self.check_boundary(pos)?;
        if self.overwrite_around(pos).is_some() {
            return Err(EditError::InsideOverwrite(pos));
        }
        self.inserts.entry(pos).or_default().push(text.to_string());
        Ok(())
    }

    pub fn has_changes(&self) -> bool {
        !self.overwrites.is_empty() || !self.inserts.is_empty()
    }

    fn chunks(&self) -> Vec<Chunk<'_>> {
        let mut chunks = vec![];
        let mut pos = 0;
        let mut inserts = self.inserts.iter().peekable();
        let mut overwrites = self.overwrites.iter().peekable();

        loop {
            // Insertions at or before the next overwrite come first.
            let next_start = overwrites.peek().map(|(start, _)| **start);
            if let Some((at, texts)) =
                inserts.next_if(|(at, _)| next_start.map_or(true, |start| **at <= start))
            {
                if pos < *at {
                    chunks.push(Chunk::Original {
                        start: pos,
                        end: *at,
                    });
                    pos = *at;
                }
                chunks.extend(texts.iter().map(|text| Chunk::Insert { text }));
                continue;
            }

            let Some((start, (end, text))) = overwrites.next() else {
                break;
            };
            if pos < *start {
                chunks.push(Chunk::Original { start: pos, end: *start });
            }
            chunks.push(Chunk::Overwrite {
                start: *start,
                end: *end,
                text,
            });
            pos = *end;
        }

        if pos < self.len() {
            chunks.push(Chunk::Original {
                start: pos,
                end: self.len(),
            });
        }
        chunks
    }

    pub fn generate_map(&self, file: &str, hires: bool) -> SourceMap {
        let mut builder = MappingsBuilder::new();
        let (mut gen_col, mut orig_line, mut orig_col) = (0u32, 0u32, 0u32);

        for chunk in self.chunks() {
            match chunk {
                Chunk::Original { start, end } => {
                    let mut at_chunk_start = true;
                    for ch in self.original[start as usize..end as usize].chars() {
                        if ch == '\n' {
                            builder.next_line();
                            gen_col = 0;
                            orig_line += 1;
                            orig_col = 0;
                            // Without hires only line starts are mapped.
                            at_chunk_start = true;
                            continue;
                        }
                        if hires || at_chunk_start {
                            builder.add_segment(gen_col, orig_line, orig_col);
                        }
                        at_chunk_start = false;
                        let w = ch.len_utf16() as u32;
                        gen_col += w;
                        orig_col += w;
                    }
                }
                Chunk::Overwrite { start, end, text } => {
                    let (line, col) = (orig_line, orig_col);
                    builder.add_segment(gen_col, line, col);
                    for ch in text.chars() {
                        if ch == '\n' {
                            builder.next_line();
                            gen_col = 0;
                            builder.add_segment(gen_col, line, col);
                        } else {
                            gen_col += ch.len_utf16() as u32;
                        }
                    }
                    for ch in self.original[start as usize..end as usize].chars() {
                        if ch == '\n' {
                            orig_line += 1;
                            orig_col = 0;
                        } else {
                            orig_col += ch.len_utf16() as u32;
                        }
                    }
                }
                Chunk::Insert { text } => {
                    for ch in text.chars() {
                        if ch == '\n' {
                            builder.next_line();
                            gen_col = 0;
                        } else {
                            gen_col += ch.len_utf16() as u32;
                        }
                    }
                }
            }
        }

        SourceMap {
            version: 3,
            file: file.to_string(),
            sources: vec![file.to_string()],
            sources_content: vec![Some(self.original.to_string())],
            names: vec![],
            mappings: builder.finish(),
        }
    }
}

impl core::fmt::Display for EditBuffer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for chunk in self.chunks() {
            match chunk {
                Chunk::Original { start, end } => {
                    f.write_str(&self.original[start as usize..end as usize])?
                }
                Chunk::Overwrite { text, .. } | Chunk::Insert { text } => f.write_str(text)?,
            }
        }
        Ok(())
    }
}

/// Result of transforming one module.
#[derive(Debug, Clone)]
pub struct TransformOutput {
    pub code: String,
    pub map: SourceMap,
    /// Number of literals replaced.
    pub rewrites: usize,
}

struct Target {
    start: u32,
    end: u32,
    json: String,
}

/// Replace every foldable object literal whose JSON text reaches the size
/// threshold with a parse call over that text.
///
/// Objects nested in a replaced object are not replaced again.
pub fn splice(source: &Source, results: &FoldResults, options: &Options) -> Result<TransformOutput> {
    let mut targets = vec![];
    for (expr, result) in results.iter() {
        let FoldResult::Foldable(value) = result else {
            continue;
        };
        let span = expr.span();
        let json = value.to_json_str()?;
        let size = utf16_len(&json);
        if size < options.min_serialized_size() {
            debug!(
                start = span.start,
                size,
                min = options.min_serialized_size(),
                "skipping literal below size threshold"
            );
            continue;
        }
        targets.push(Target {
            start: span.start,
            end: span.end,
            json,
        });
    }

    // Outer literals first.
    targets.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let mut buffer = EditBuffer::new(source.contents());
    let mut applied: Option<(u32, u32)> = None;
    let mut rewrites = 0;
    for target in &targets {
        if let Some((start, end)) = applied {
            if start <= target.start && target.end <= end {
                debug!(
                    start = target.start,
                    end = target.end,
                    "skipping literal inside replaced literal"
                );
                continue;
            }
        }

        let literal = quote_js_string(&target.json, options.quote());
        buffer.overwrite(target.start, target.end, &options.wrap(&literal))?;
        debug!(start = target.start, end = target.end, "replaced literal");
        applied = Some((target.start, target.end));
        rewrites += 1;
    }

    Ok(TransformOutput {
        code: buffer.to_string(),
        map: buffer.generate_map(source.file(), true),
        rewrites,
    })
}
