// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(test)]

use std::env;

use anyhow::{bail, Result};
use jsonfold::unstable::*;

#[derive(Default, Debug, PartialEq)]
struct Counts {
    objects: usize,
    arrays: usize,
    regexes: usize,
    templates: usize,
    functions: usize,
    object_patterns: usize,
}

impl Visitor for Counts {
    fn visit_expr(&mut self, expr: &Ref<Expr>) {
        match expr.as_ref() {
            Expr::Object { .. } => self.objects += 1,
            Expr::Array { .. } => self.arrays += 1,
            Expr::Regex { .. } => self.regexes += 1,
            Expr::Template { .. } => self.templates += 1,
            Expr::Function { .. } | Expr::Arrow { .. } => self.functions += 1,
            _ => (),
        }
        walk_expr(self, expr);
    }

    fn visit_pattern(&mut self, pattern: &Pattern) {
        if let Pattern::Object { .. } = pattern {
            self.object_patterns += 1;
        }
        walk_pattern(self, pattern);
    }
}

fn parse(code: &str) -> Result<Program> {
    let source = Source::from_contents("test.js".to_string(), code.to_string())?;
    let mut parser = Parser::new(&source)?;
    parser.parse()
}

fn counts(code: &str) -> Result<Counts> {
    let program = parse(code)?;
    let mut counts = Counts::default();
    counts.visit_program(&program);
    Ok(counts)
}

#[test]
fn module_syntax() -> Result<()> {
    let code = r#"
import def, { a as b, "c d" as e } from "./dep.js" with { type: "json" };
import * as ns from 'ns';
export { b as default2, e };
export * from "./other.js";
export default class Widget extends Base {
  static #count = 0;
  static { Widget.#count++; }
  constructor(opts = {}) { super(opts); this.opts = opts; }
  get size() { return this.opts.size ?? 0; }
  async *items() { yield* this.opts.items; }
}
export async function load(url, { retries = 3, ...rest } = {}) {
  for await (const chunk of fetch(url, rest)) {
    if (!chunk) continue;
  }
  label: for (let i = 0, j = 10; i < j; i++) {
    if (i % 2) continue label;
  }
  try { await ns.run?.(); } catch { } finally { }
  return new.target ?? import.meta.url;
}
"#;
    let program = parse(code)?;
    assert_eq!(program.body.len(), 6);
    Ok(())
}

#[test]
fn regex_and_division() -> Result<()> {
    let c = counts("let a = x / y / z; let b = /ab+c/gi.test(s) ? a : /=/; f(/x/)")?;
    assert_eq!(c.regexes, 3);

    // After `)` of an `if` the slash starts a regex.
    let c = counts("if (ok) /re/.exec(s); (a) / 2;")?;
    assert_eq!(c.regexes, 1);
    Ok(())
}

#[test]
fn templates() -> Result<()> {
    let c = counts("const t = `a${ {b: 1} }c${`inner ${x}`}`; tag`x`;")?;
    // The tagged template holds a template of its own.
    assert_eq!(c.templates, 3);
    assert_eq!(c.objects, 1);
    Ok(())
}

#[test]
fn destructuring_targets_are_patterns() -> Result<()> {
    let c = counts("({a, b: [c, {d}]} = obj); const {e = {f: 1}} = g; [x, {y}] = z;")?;
    assert_eq!(c.objects, 1);
    assert_eq!(c.object_patterns, 4);
    assert_eq!(c.arrays, 0);
    Ok(())
}

#[test]
fn arrows_and_parens() -> Result<()> {
    let c = counts("const f = (a, {b}, ...c) => ({a, b}); const g = async x => x; const h = (1, 2);")?;
    assert_eq!(c.functions, 2);
    assert_eq!(c.objects, 1);
    assert_eq!(c.object_patterns, 1);
    Ok(())
}

#[test]
fn statement_level_braces_are_blocks() -> Result<()> {
    let c = counts("{ a: 1 } x = { a: 1 };")?;
    assert_eq!(c.objects, 1);
    Ok(())
}

#[test]
fn automatic_semicolons() -> Result<()> {
    let program = parse("let a = 1\nlet b = 2\nreturn_value()\na\n++b")?;
    assert_eq!(program.body.len(), 5);
    Ok(())
}

#[test]
fn expression_indexes_are_dense() -> Result<()> {
    let program = parse("x = [1, {a: 2}, 'c'];")?;
    // x, the array, its three items, 2 and the assignment.
    assert_eq!(program.num_expressions, 7);
    Ok(())
}

#[test]
fn parse_errors() -> Result<()> {
    let cases = [
        ("const x = {a: 1", "1:16", "expecting `,` or `}` in object literal"),
        ("const x = [1, 2", "1:16", "expecting `,` or `]` in array literal"),
        ("let x = 1 let y = 2", "1:11", "expecting `;`"),
        ("x = {a 1}", "1:8", "expecting `,` or `}` in object literal"),
        ("x = {1}", "1:7", "expecting `:` after property key"),
        ("1 = 2", "1:1", "invalid assignment target"),
        ("var class = 1", "1:5", "unexpected keyword `class`"),
        ("try {}", "1:7", "expecting `catch` or `finally` after try block"),
        ("x = ", "1:5", "unexpected end of input"),
        ("throw\nx", "2:1", "illegal newline after throw"),
    ];
    for (code, location, expected) in cases {
        match parse(code) {
            Ok(_) => bail!("`{code}` parsed without error"),
            Err(e) => {
                let msg = e.to_string();
                assert!(msg.contains(expected), "{code}: {msg}");
                assert!(msg.contains(&format!("--> test.js:{location}")), "{code}: {msg}");
            }
        }
    }
    Ok(())
}

#[test]
fn deep_nesting() -> Result<()> {
    let depth = MAX_NESTING_DEPTH as usize - 8;
    let arrays = format!("x = {}1{};", "[".repeat(depth), "]".repeat(depth));
    assert_eq!(counts(&arrays)?.arrays, depth);
    let objects = format!("x = {}1{};", "{a: ".repeat(depth), "}".repeat(depth));
    assert_eq!(counts(&objects)?.objects, depth);

    let n = 2000;
    let cases = [
        format!("x = {}1{};", "[".repeat(n), "]".repeat(n)),
        format!("x = {}1{};", "{a: ".repeat(n), "}".repeat(n)),
        format!("x = {}1{};", "(".repeat(n), ")".repeat(n)),
        format!("x = {}y;", "!".repeat(n)),
        format!("x = {}y;", "- ".repeat(n)),
        format!("x = {}y;", "new ".repeat(n)),
        format!("x = y{};", " ** y".repeat(n)),
        format!("x = {}1;", "() => ".repeat(n)),
        format!("{}{}", "{".repeat(n), "}".repeat(n)),
        format!("{}x;", "if (a) ".repeat(n)),
        format!("let {}a{} = b;", "[".repeat(n), "]".repeat(n)),
    ];
    for code in cases {
        match parse(&code) {
            Ok(_) => bail!("`{}...` parsed without error", &code[..20]),
            Err(e) => {
                let msg = e.to_string();
                assert!(msg.contains("nesting too deep"), "{}: {msg}", &code[..20]);
            }
        }
    }
    Ok(())
}

#[test]
#[ignore = "intended for parsing a module given on the command line"]
fn one_file() -> Result<()> {
    let mut file = String::default();
    for a in env::args() {
        if a.ends_with(".js") || a.ends_with(".mjs") {
            file = a;
        }
    }

    if file.is_empty() {
        bail!("missing <module.js>");
    }

    let contents = std::fs::read_to_string(&file)?;
    let source = Source::from_contents(file, contents)?;
    let program = Parser::new(&source)?.parse()?;
    println!("{program:#?}");
    Ok(())
}
