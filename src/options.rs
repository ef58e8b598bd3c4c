// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::lexer::{is_id_continue, is_id_start};

use serde::{Deserialize, Serialize};

pub const DEFAULT_MIN_SERIALIZED_SIZE: usize = 1024;
pub const DEFAULT_PARSE_FN: &str = "JSON.parse";
pub const PURE_ANNOTATION: &str = "/*@__PURE__*/";

/// Errors raised while building [`Options`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("minSerializedSize must not be negative, got {0}")]
    NegativeThreshold(String),
    #[error("minSerializedSize must be an integer, got {0}")]
    NonIntegralThreshold(String),
    #[error("parseFn must not be empty")]
    EmptyParseFn,
    #[error("parseFn `{0}` is not a dotted identifier path")]
    InvalidParseFn(String),
    #[error("invalid options: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

/// Quote character of the emitted string literal.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quote {
    #[default]
    Double,
    Single,
}

impl Quote {
    pub fn as_char(self) -> char {
        match self {
            Quote::Double => '"',
            Quote::Single => '\'',
        }
    }
}

// Options as written by the user, validated by `Options::try_from`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawOptions {
    min_serialized_size: Option<serde_json::Number>,
    parse_fn: Option<String>,
    pure_annotation: Option<bool>,
    quote: Option<Quote>,
}

/// Transform configuration.
///
/// ```json
/// { "minSerializedSize": 1024, "parseFn": "JSON.parse", "pureAnnotation": true, "quote": "double" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawOptions")]
pub struct Options {
    /// Literals whose JSON text is shorter than this (in UTF-16 code units)
    /// are left alone. 0 rewrites every foldable literal.
    min_serialized_size: usize,

    /// Function applied to the embedded string.
    parse_fn: String,

    /// Prefix the call with `/*@__PURE__*/` so that unused results can be
    /// dropped by minifiers.
    pure_annotation: bool,

    quote: Quote,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            min_serialized_size: DEFAULT_MIN_SERIALIZED_SIZE,
            parse_fn: DEFAULT_PARSE_FN.to_string(),
            pure_annotation: true,
            quote: Quote::Double,
        }
    }
}

fn threshold_from_number(n: &serde_json::Number) -> Result<usize, ConfigError> {
    if let Some(v) = n.as_u64() {
        return Ok(usize::try_from(v).unwrap_or(usize::MAX));
    }
    if n.as_i64().is_some_and(|v| v < 0) {
        return Err(ConfigError::NegativeThreshold(n.to_string()));
    }
    match n.as_f64() {
        Some(f) if f < 0.0 => Err(ConfigError::NegativeThreshold(n.to_string())),
        // Integral values written with a fraction or exponent, e.g. `1024.0` or `1e3`.
        Some(f) if f.is_finite() && f.fract() == 0.0 => Ok(f as usize),
        _ => Err(ConfigError::NonIntegralThreshold(n.to_string())),
    }
}

fn validate_parse_fn(name: &str) -> Result<(), ConfigError> {
    if name.is_empty() {
        return Err(ConfigError::EmptyParseFn);
    }
    let valid = name.split('.').all(|part| {
        let mut chars = part.chars();
        chars.next().is_some_and(is_id_start) && chars.all(is_id_continue)
    });
    if !valid {
        return Err(ConfigError::InvalidParseFn(name.to_string()));
    }
    Ok(())
}

impl TryFrom<RawOptions> for Options {
    type Error = ConfigError;

    fn try_from(raw: RawOptions) -> Result<Self, Self::Error> {
        let mut options = Options::default();
        if let Some(n) = &raw.min_serialized_size {
            options.min_serialized_size = threshold_from_number(n)?;
        }
        if let Some(parse_fn) = raw.parse_fn {
            options = options.with_parse_fn(parse_fn)?;
        }
        if let Some(pure) = raw.pure_annotation {
            options.pure_annotation = pure;
        }
        if let Some(quote) = raw.quote {
            options.quote = quote;
        }
        Ok(options)
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let raw: RawOptions = serde_json::from_str(json)?;
        Options::try_from(raw)
    }

    pub fn from_json_file(path: &str) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn with_min_serialized_size(mut self, size: usize) -> Self {
        self.min_serialized_size = size;
        self
    }

    pub fn with_parse_fn(mut self, name: impl Into<String>) -> Result<Self, ConfigError> {
        let name = name.into();
        validate_parse_fn(&name)?;
        self.parse_fn = name;
        Ok(self)
    }

    pub fn with_pure_annotation(mut self, pure: bool) -> Self {
        self.pure_annotation = pure;
        self
    }

    pub fn with_quote(mut self, quote: Quote) -> Self {
        self.quote = quote;
        self
    }

    pub fn min_serialized_size(&self) -> usize {
        self.min_serialized_size
    }

    pub fn parse_fn(&self) -> &str {
        &self.parse_fn
    }

    pub fn pure_annotation(&self) -> bool {
        self.pure_annotation
    }

    pub fn quote(&self) -> Quote {
        self.quote
    }

    /// The text emitted in place of a literal, given its quoted JSON text.
    pub fn wrap(&self, literal: &str) -> String {
        let pure = if self.pure_annotation {
            PURE_ANNOTATION
        } else {
            ""
        };
        format!("{pure}{}({literal})", self.parse_fn)
    }
}
