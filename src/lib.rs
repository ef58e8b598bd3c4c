// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

// Use README.md as crate documentation.
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]

mod analyzer;
mod ast;
mod lexer;
mod lookup;
mod number;
mod options;
mod parser;
mod sourcemap;
mod splicer;
mod transform;
mod utils;
mod value;
mod visitor;

pub use analyzer::{Analyzer, FoldResult, FoldResults};
pub use lexer::{Source, Span};
pub use number::Number;
pub use options::{ConfigError, Options, Quote, DEFAULT_MIN_SERIALIZED_SIZE, DEFAULT_PARSE_FN};
pub use sourcemap::{Segment, SourceMap};
pub use splicer::{splice, EditBuffer, EditError, TransformOutput};
pub use transform::Transform;
pub use utils::{quote_js_string, utf16_len};
pub use value::Value;

/// Items in `unstable` are likely to change.
pub mod unstable {
    pub use crate::ast::*;
    pub use crate::lexer::*;
    pub use crate::lookup::*;
    pub use crate::parser::*;
    pub use crate::sourcemap::{decode_mappings, decode_vlq, encode_vlq, MappingsBuilder};
    pub use crate::visitor::*;
}

#[cfg(test)]
mod test_utils;
