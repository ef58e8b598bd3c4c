// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

fn read_source(file: &str) -> Result<jsonfold::Source> {
    let contents =
        std::fs::read_to_string(file).with_context(|| format!("Failed to read {file}"))?;
    jsonfold::Source::from_contents(file.to_string(), contents)
}

fn jsonfold_lex(file: String, locations: bool) -> Result<()> {
    use jsonfold::unstable::{Lexer, TokenKind};

    let source = read_source(&file)?;
    let mut lexer = Lexer::new(&source);
    loop {
        let token = lexer.next_token()?;
        if token.0 == TokenKind::Eof {
            break;
        }
        if locations {
            println!("{}", token.1.message("", ""));
        }
        println!("{token:?}");
    }
    Ok(())
}

fn jsonfold_parse(file: String) -> Result<()> {
    let source = read_source(&file)?;
    let mut parser = jsonfold::unstable::Parser::new(&source)?;
    let program = parser.parse()?;
    println!("{program:#?}");
    Ok(())
}

fn jsonfold_analyze(file: String) -> Result<()> {
    let source = read_source(&file)?;
    let program = jsonfold::unstable::Parser::new(&source)?.parse()?;
    let results = jsonfold::Analyzer::new().analyze(&program)?;

    for (expr, result) in results.iter() {
        let (line, col) = expr.span().line_col();
        match result.value() {
            Some(value) => println!("{file}:{line}:{col}: {}", value.to_json_str()?),
            None => println!("{file}:{line}:{col}: not foldable"),
        }
    }
    println!(
        "{} object literals, {} foldable",
        results.len(),
        results.num_foldable()
    );
    Ok(())
}

fn jsonfold_transform(
    file: String,
    config: Option<String>,
    min_size: Option<usize>,
    output: Option<String>,
    map: Option<String>,
    inline_map: bool,
) -> Result<()> {
    let mut options = match config {
        Some(config) => jsonfold::Options::from_json_file(&config)?,
        None => jsonfold::Options::default(),
    };
    if let Some(size) = min_size {
        options = options.with_min_serialized_size(size);
    }

    let source = read_source(&file)?;
    let result = jsonfold::Transform::new(options).transform_source(&source)?;

    let mut code = result.code;
    if inline_map {
        code.push_str("\n//# sourceMappingURL=");
        code.push_str(&result.map.to_url()?);
    }
    if let Some(map) = map {
        std::fs::write(&map, result.map.to_json_str()?)
            .with_context(|| format!("Failed to write {map}"))?;
    }

    match output {
        Some(output) => {
            std::fs::write(&output, code).with_context(|| format!("Failed to write {output}"))?
        }
        None => println!("{code}"),
    }
    Ok(())
}

#[derive(Subcommand)]
enum JsonfoldCommand {
    /// Rewrite constant object literals of a module.
    Transform {
        /// Module to transform.
        file: String,

        /// Options file (json).
        #[arg(long, short, value_name = "options.json")]
        config: Option<String>,

        /// Override minSerializedSize.
        #[arg(long, short)]
        min_size: Option<usize>,

        /// Write the transformed module here instead of stdout.
        #[arg(long, short)]
        output: Option<String>,

        /// Write the source map here.
        #[arg(long, value_name = "file.js.map")]
        map: Option<String>,

        /// Append the source map as a data url comment.
        #[arg(long)]
        inline_map: bool,
    },

    /// Show the fold result of every object literal.
    Analyze {
        /// Module to analyze.
        file: String,
    },

    /// Tokenize a module.
    Lex {
        /// Module to tokenize.
        file: String,

        /// Show each token in its source line.
        #[arg(long, short)]
        locations: bool,
    },

    /// Parse a module and print its syntax tree.
    Parse {
        /// Module to parse.
        file: String,
    },
}

#[derive(clap::Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: JsonfoldCommand,

    /// Log each rewrite decision.
    #[arg(long, short, global = true)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        JsonfoldCommand::Transform {
            file,
            config,
            min_size,
            output,
            map,
            inline_map,
        } => jsonfold_transform(file, config, min_size, output, map, inline_map),
        JsonfoldCommand::Analyze { file } => jsonfold_analyze(file),
        JsonfoldCommand::Lex { file, locations } => jsonfold_lex(file, locations),
        JsonfoldCommand::Parse { file } => jsonfold_parse(file),
    }
}
