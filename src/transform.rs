// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::analyzer::Analyzer;
use crate::lexer::Source;
use crate::options::Options;
use crate::parser::Parser;
use crate::splicer::{splice, TransformOutput};

use anyhow::Result;
use tracing::{info, info_span};

/// Rewrites constant object literals of a module into parse calls.
///
/// A `Transform` holds only its options. Every call analyzes its module from
/// scratch, so one instance can be shared across modules.
#[derive(Debug, Clone, Default)]
pub struct Transform {
    options: Options,
}

impl Transform {
    pub fn new(options: Options) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Transform the module `code` read from `file`.
    ///
    /// Fails only if the module does not parse.
    pub fn transform(&self, file: &str, code: &str) -> Result<TransformOutput> {
        let source = Source::from_contents(file.to_string(), code.to_string())?;
        self.transform_source(&source)
    }

    pub fn transform_source(&self, source: &Source) -> Result<TransformOutput> {
        let span = info_span!("transform", file = %source.file());
        let _guard = span.enter();

        let program = Parser::new(source)?.parse()?;
        let results = Analyzer::new().analyze(&program)?;
        let output = splice(source, &results, &self.options)?;

        info!(
            objects = results.len(),
            foldable = results.num_foldable(),
            rewrites = output.rewrites,
            "transformed module"
        );
        Ok(output)
    }
}
