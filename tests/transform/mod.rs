// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(test)]

use std::env;

use anyhow::{bail, Result};
use jsonfold::unstable::{walk_expr, Expr, Parser, Ref, Visitor};
use jsonfold::*;
use serde::Deserialize;
use test_generator::test_resources;

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TestCase {
    note: String,
    code: String,
    options: Option<Options>,
    // Omitting both `want` and `error` asserts that the module is unchanged.
    want: Option<String>,
    error: Option<String>,
    rewrites: Option<usize>,
    skip: Option<bool>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct YamlTest {
    // Defaults for every case of the file.
    options: Option<Options>,
    cases: Vec<TestCase>,
}

// Collects the values embedded in `<parse_fn>("...")` calls.
struct ParseCalls<'a> {
    parse_fn: &'a str,
    values: Vec<String>,
}

impl Visitor for ParseCalls<'_> {
    fn visit_expr(&mut self, expr: &Ref<Expr>) {
        if let Expr::Call { callee, args, .. } = expr.as_ref() {
            if callee.span().text() == self.parse_fn && args.len() == 1 {
                if let Expr::String {
                    value: Some(text), ..
                } = args[0].as_ref()
                {
                    if let Ok(value) = Value::from_json_str(text) {
                        if let Ok(json) = value.to_json_str() {
                            self.values.push(json);
                        }
                    }
                }
            }
        }
        walk_expr(self, expr);
    }
}

fn parse_calls(file: &str, code: &str, parse_fn: &str) -> Result<Vec<String>> {
    let source = Source::from_contents(file.to_string(), code.to_string())?;
    let program = Parser::new(&source)?.parse()?;
    let mut calls = ParseCalls {
        parse_fn,
        values: vec![],
    };
    calls.visit_program(&program);
    Ok(calls.values)
}

// JSON of the literals a transform is expected to replace: outermost foldable
// literals that reach the threshold.
fn expected_rewrites(file: &str, code: &str, options: &Options) -> Result<Vec<String>> {
    let source = Source::from_contents(file.to_string(), code.to_string())?;
    let program = Parser::new(&source)?.parse()?;
    let results = Analyzer::new().analyze(&program)?;

    let mut kept: Vec<Span> = vec![];
    let mut values = vec![];
    for (expr, result) in results.iter() {
        let Some(value) = result.value() else {
            continue;
        };
        let json = value.to_json_str()?;
        if utf16_len(&json) < options.min_serialized_size() {
            continue;
        }
        if kept.iter().any(|span| span.contains(expr.span())) {
            continue;
        }
        kept.push(expr.span().clone());
        values.push(json);
    }
    Ok(values)
}

fn check_output(file: &str, code: &str, options: &Options, output: &TransformOutput) -> Result<()> {
    // Every replaced literal parses back to its own value.
    let mut before = parse_calls(file, code, options.parse_fn())?;
    before.extend(expected_rewrites(file, code, options)?);
    let mut after = parse_calls(file, &output.code, options.parse_fn())?;
    before.sort();
    after.sort();
    if before != after {
        bail!("parse calls differ\nexpected: {before:?}\n  actual: {after:?}");
    }
    if output.rewrites + parse_calls(file, code, options.parse_fn())?.len() != after.len() {
        bail!("rewrite count {} does not match the output", output.rewrites);
    }

    // A second pass has nothing left to do.
    let transform = Transform::new(options.clone());
    let again = transform.transform(file, &output.code)?;
    if again.code != output.code || again.rewrites != 0 {
        bail!("transform is not idempotent\n{}", again.code);
    }

    let map = &output.map;
    assert_eq!(map.version, 3);
    assert_eq!(map.sources, vec![file.to_string()]);
    assert_eq!(map.sources_content, vec![Some(code.to_string())]);
    let lines = map.decode_mappings()?;
    assert_eq!(lines.len(), output.code.matches('\n').count() + 1);

    let original: Vec<&str> = code.split('\n').collect();
    for segment in lines.iter().flatten() {
        let line = original.get(segment.original_line as usize);
        match line {
            Some(line) if segment.original_column as usize <= utf16_len(line) => (),
            _ => bail!("segment {segment:?} points outside the module"),
        }
    }
    Ok(())
}

fn yaml_test_impl(file: &str) -> Result<()> {
    let yaml_str = std::fs::read_to_string(file)?;
    let test: YamlTest = serde_yaml::from_str(&yaml_str)?;

    println!("running {file}");

    for case in test.cases {
        print!("case {} ", case.note);
        if case.skip == Some(true) {
            println!("skipped");
            continue;
        }

        let options = case
            .options
            .clone()
            .or_else(|| test.options.clone())
            .unwrap_or_default();
        let transform = Transform::new(options.clone());

        match (transform.transform("test.js", &case.code), &case.error) {
            (Ok(output), None) => {
                let expected = case.want.as_deref().unwrap_or(&case.code);
                if output.code != expected {
                    println!(
                        "\n{}",
                        prettydiff::diff_chars(expected, &output.code)
                    );
                    bail!("{}: output mismatch", case.note);
                }
                if case.want.is_none() && output.rewrites != 0 {
                    bail!("{}: {} rewrites in unchanged module", case.note, output.rewrites);
                }
                if let Some(rewrites) = case.rewrites {
                    if output.rewrites != rewrites {
                        bail!(
                            "{}: expected {rewrites} rewrites, got {}",
                            case.note,
                            output.rewrites
                        );
                    }
                }
                check_output("test.js", &case.code, &options, &output)?;
            }
            (Ok(output), Some(_)) => {
                bail!("{}: expected error, got\n{}", case.note, output.code)
            }
            (Err(actual), Some(expected)) => {
                let actual = actual.to_string();
                if !actual.contains(expected) {
                    bail!(
                        "{}: error message mismatch\nexpected: {expected}\nactual: {actual}",
                        case.note
                    );
                }
            }
            (Err(e), None) => return Err(e),
        }

        println!("passed");
    }

    println!("{file} passed");
    Ok(())
}

fn yaml_test(file: &str) -> Result<()> {
    match yaml_test_impl(file) {
        Ok(_) => Ok(()),
        Err(e) => {
            // If Err is returned, it doesn't always get printed by cargo test.
            // Therefore, panic with the error.
            panic!("{}", e);
        }
    }
}

#[test]
fn yaml_test_basic() -> Result<()> {
    crate::init_test_logging();
    yaml_test("tests/transform/cases/basic.yaml")
}

#[test_resources("tests/transform/cases/*.yaml")]
fn run(path: &str) {
    yaml_test(path).unwrap()
}

#[test]
#[ignore = "intended for running a single yaml file given on the command line"]
fn one_yaml() -> Result<()> {
    let mut file = String::default();

    for a in env::args() {
        if a.ends_with(".yaml") {
            file = a;
        }
    }

    if file.is_empty() {
        bail!("missing <yaml-test-file>");
    }

    yaml_test(file.as_str())
}

#[test]
fn map_follows_collapsed_literal() -> Result<()> {
    let code = "const a = {\n  b: 1\n};\nconst c = d;\n";
    let output = Transform::new(Options::new().with_min_serialized_size(0))
        .transform("lib.js", code)?;
    assert_eq!(
        output.code,
        "const a = /*@__PURE__*/JSON.parse(\"{\\\"b\\\":1}\");\nconst c = d;\n"
    );

    let lines = output.map.decode_mappings()?;
    assert_eq!(lines.len(), 3);
    let at = |line: usize, col: usize| {
        lines[line]
            .iter()
            .find(|s| s.generated_column as usize == col)
            .map(|s| (s.original_line, s.original_column))
    };

    // The call maps to the opening brace of the literal.
    assert_eq!(at(0, 10), Some((0, 10)));
    // The `;` after the call maps to the `;` after the closing brace.
    let Some(semi) = output.code.find(");") else {
        bail!("missing call");
    };
    assert_eq!(at(0, semi + 1), Some((2, 1)));
    assert_eq!(at(1, 0), Some((3, 0)));
    assert_eq!(at(1, 6), Some((3, 6)));
    Ok(())
}

#[test]
fn map_survives_json() -> Result<()> {
    let code = "export default {a: [1, 2]};\n";
    let output = Transform::new(Options::new().with_min_serialized_size(0))
        .transform("dir/entry.mjs", code)?;
    let json = output.map.to_json_str()?;
    let map = SourceMap::from_json_str(&json)?;
    assert_eq!(map, output.map);
    assert_eq!(map.file, "dir/entry.mjs");
    assert!(json.contains(r#""sourcesContent":["#));

    let url = output.map.to_url()?;
    assert!(url.starts_with("data:application/json;charset=utf-8;base64,"));
    Ok(())
}

#[test]
fn one_transform_many_modules() -> Result<()> {
    let transform = Transform::new(Options::new().with_min_serialized_size(0));
    let first = transform.transform("a.js", "x = {a: 1};")?;
    let second = transform.transform("b.js", "y = {b: f()};")?;
    assert_eq!(first.rewrites, 1);
    assert_eq!(second.rewrites, 0);
    assert_eq!(second.code, "y = {b: f()};");
    assert_eq!(second.map.sources, vec!["b.js".to_string()]);
    Ok(())
}

#[test]
fn parse_errors_leave_no_output() -> Result<()> {
    let transform = Transform::default();
    let Err(e) = transform.transform("broken.js", "const x = {a: 1;") else {
        bail!("broken module transformed");
    };
    let msg = e.to_string();
    assert!(msg.contains("--> broken.js:1:16"), "{msg}");
    Ok(())
}
