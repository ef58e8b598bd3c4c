// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::*;
use crate::lookup::Lookup;
use crate::value::*;
use crate::visitor::{walk_expr, Visitor};

use std::rc::Rc;

use anyhow::Result;
use indexmap::IndexMap;
use tracing::trace;

/// Outcome of constant-folding one expression.
#[derive(Debug, Clone, PartialEq)]
pub enum FoldResult {
    Foldable(Value),
    NotFoldable,
}

impl FoldResult {
    pub fn is_foldable(&self) -> bool {
        matches!(self, FoldResult::Foldable(_))
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            FoldResult::Foldable(v) => Some(v),
            FoldResult::NotFoldable => None,
        }
    }
}

/// Fold results for every object literal of a program.
#[derive(Debug, Clone)]
pub struct FoldResults {
    table: Lookup<FoldResult>,
    // Object literals in source order, outer before inner.
    objects: Vec<Ref<Expr>>,
}

impl FoldResults {
    /// The result recorded for an object literal, if it was analyzed.
    pub fn get(&self, expr: &Expr) -> Option<&FoldResult> {
        self.table.get_checked(expr.eidx()).ok().flatten()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Ref<Expr>, &FoldResult)> {
        self.objects
            .iter()
            .filter_map(|e| self.get(e).map(|r| (e, r)))
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn num_foldable(&self) -> usize {
        self.iter().filter(|(_, r)| r.is_foldable()).count()
    }
}

// Collects every object literal in walk order.
#[derive(Default)]
struct ObjectCollector {
    objects: Vec<Ref<Expr>>,
}

impl Visitor for ObjectCollector {
    fn visit_expr(&mut self, expr: &Ref<Expr>) {
        if let Expr::Object { .. } = expr.as_ref() {
            self.objects.push(expr.clone());
        }
        walk_expr(self, expr);
    }
}

/// Decides which expressions denote JSON values.
///
/// Only the literal, array and object forms are considered. Object results
/// are cached by expression index, so an object that was already folded as
/// part of an enclosing literal is not folded again when the walk reaches it.
#[derive(Debug, Default)]
pub struct Analyzer {
    cache: Lookup<FoldResult>,
    // Objects whose properties were evaluated during the last analysis.
    folds: usize,
}

impl Analyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of object literals whose properties were evaluated by the last
    /// call to [`Analyzer::analyze`]. With the cache this never exceeds the
    /// number of objects in the program.
    pub fn num_folds(&self) -> usize {
        self.folds
    }

    pub fn analyze(&mut self, program: &Program) -> Result<FoldResults> {
        self.cache = Lookup::with_nodes(program.num_expressions);
        self.folds = 0;

        let mut collector = ObjectCollector::default();
        collector.visit_program(program);

        for object in &collector.objects {
            self.fold_expr(object)?;
        }

        trace!(
            objects = collector.objects.len(),
            cached = self.cache.count(),
            folds = self.folds,
            "analysis done"
        );
        Ok(FoldResults {
            table: core::mem::take(&mut self.cache),
            objects: collector.objects,
        })
    }

    pub fn fold_expr(&mut self, expr: &Ref<Expr>) -> Result<FoldResult> {
        Ok(match expr.as_ref() {
            Expr::Null { .. } => FoldResult::Foldable(Value::Null),
            Expr::Bool { value, .. } => FoldResult::Foldable(Value::Bool(*value)),
            // Literals such as 1e400 overflow to Infinity, which JSON cannot hold.
            Expr::Number { value, .. } if value.is_finite() => {
                FoldResult::Foldable(Value::Number(*value))
            }
            Expr::String {
                value: Some(value), ..
            } => FoldResult::Foldable(Value::String(value.clone())),
            // The cooked value is missing when the literal holds an unpaired
            // surrogate escape. Neither a Rust string nor UTF-8 JSON text can
            // carry one.
            Expr::String { value: None, .. } => FoldResult::NotFoldable,
            Expr::Paren { expr, .. } => self.fold_expr(expr)?,
            Expr::Array { items, .. } => self.fold_array(items)?,
            Expr::Object { .. } => self.fold_object(expr)?,
            _ => FoldResult::NotFoldable,
        })
    }

    fn fold_array(&mut self, items: &[Option<Ref<Expr>>]) -> Result<FoldResult> {
        let mut values = Vec::with_capacity(items.len());
        for item in items {
            // A hole has no JSON counterpart.
            let Some(item) = item else {
                return Ok(FoldResult::NotFoldable);
            };
            match self.fold_expr(item)? {
                FoldResult::Foldable(v) => values.push(v),
                FoldResult::NotFoldable => return Ok(FoldResult::NotFoldable),
            }
        }
        Ok(FoldResult::Foldable(Value::from(values)))
    }

    fn fold_object(&mut self, expr: &Ref<Expr>) -> Result<FoldResult> {
        let Expr::Object { span, props, eidx } = expr.as_ref() else {
            return Ok(FoldResult::NotFoldable);
        };

        self.cache.ensure_capacity(*eidx);
        if let Some(result) = self.cache.get_checked(*eidx)? {
            trace!(eidx, start = span.start, "object cache hit");
            return Ok(result.clone());
        }

        self.folds += 1;
        let result = self.fold_props(props)?;
        self.cache.set_checked(*eidx, result.clone())?;
        Ok(result)
    }

    fn fold_props(&mut self, props: &[Property]) -> Result<FoldResult> {
        let mut fields: IndexMap<Rc<str>, Value> = IndexMap::with_capacity(props.len());
        for prop in props {
            let Property::Init { key, value, .. } = prop else {
                return Ok(FoldResult::NotFoldable);
            };
            let Some(key) = static_key(key) else {
                return Ok(FoldResult::NotFoldable);
            };
            match self.fold_expr(value)? {
                // Re-inserting keeps the first position and takes the last value.
                FoldResult::Foldable(v) => {
                    fields.insert(key, v);
                }
                FoldResult::NotFoldable => return Ok(FoldResult::NotFoldable),
            }
        }
        Ok(FoldResult::Foldable(Value::from(fields)))
    }
}

/// The property name of a key, if it is known without evaluation.
///
/// A literal `__proto__` key sets the prototype instead of defining a
/// property, so it has no JSON counterpart. The computed form `["__proto__"]`
/// defines an ordinary property.
fn static_key(key: &PropKey) -> Option<Rc<str>> {
    match key {
        PropKey::Ident(span) if span.text() != "__proto__" => Some(Rc::from(span.text())),
        PropKey::String {
            value: Some(value), ..
        } if value.as_ref() != "__proto__" => Some(value.clone()),
        PropKey::Computed { expr, .. } => match expr.as_ref() {
            Expr::String {
                value: Some(value), ..
            } => Some(value.clone()),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Source;
    use crate::parser::Parser;

    fn analyze(code: &str) -> Vec<(String, Option<String>)> {
        let source = Source::from_contents("test.js".to_string(), code.to_string()).unwrap();
        let program = Parser::new(&source).unwrap().parse().unwrap();
        let results = Analyzer::new().analyze(&program).unwrap();
        results
            .iter()
            .map(|(e, r)| {
                (
                    e.span().text().to_string(),
                    r.value().map(|v| v.to_json_str().unwrap()),
                )
            })
            .collect()
    }

    #[test]
    fn records_every_object_outer_first() {
        let results = analyze("x = {a: {b: 1}, c: [{d: 2}]};");
        assert_eq!(
            results,
            vec![
                (
                    "{a: {b: 1}, c: [{d: 2}]}".to_string(),
                    Some(r#"{"a":{"b":1},"c":[{"d":2}]}"#.to_string())
                ),
                ("{b: 1}".to_string(), Some(r#"{"b":1}"#.to_string())),
                ("{d: 2}".to_string(), Some(r#"{"d":2}"#.to_string())),
            ]
        );
    }

    #[test]
    fn inner_foldable_outer_not() {
        let results = analyze("x = {a: f(), b: {c: true}};");
        assert_eq!(results[0].1, None);
        assert_eq!(results[1].1.as_deref(), Some(r#"{"c":true}"#));
    }

    #[test]
    fn literal_kinds() {
        let foldable = [
            ("{a: null}", r#"{"a":null}"#),
            ("{a: 'x'}", r#"{"a":"x"}"#),
            ("{a: 0x10, b: 1.50, c: 1e21}", r#"{"a":16,"b":1.5,"c":1e+21}"#),
            (r#"{"a b": 1, ["c"]: 2, 'd': 3}"#, r#"{"a b":1,"c":2,"d":3}"#),
            (r#"{["__proto__"]: 1}"#, r#"{"__proto__":1}"#),
            ("{}", "{}"),
            ("{a: []}", r#"{"a":[]}"#),
            ("{a: (1)}", r#"{"a":1}"#),
            ("{a: ((null))}", r#"{"a":null}"#),
            ("{a: ({b: [(2)]})}", r#"{"a":{"b":[2]}}"#),
        ];
        for (code, json) in foldable {
            let results = analyze(&format!("x = {code};"));
            assert_eq!(results[0].1.as_deref(), Some(json), "{code}");
        }

        let not_foldable = [
            "{a: -1}",
            "{a: `x`}",
            "{a: ``}",
            "{a: /x/}",
            "{a: 1n}",
            "{a: [1,,2]}",
            "{a: [,]}",
            "{a: [...b]}",
            "{a: undefined}",
            "{a: 'a' + 'b'}",
            "{a: (-1)}",
            "{a: (1, 2)}",
            "{a: () => 1}",
            "{a}",
            "{...b}",
            "{a() {}}",
            "{get a() { return 1; }}",
            "{1: 2}",
            "{[k]: 1}",
            "{['a' + 'b']: 1}",
            "{__proto__: null}",
            "{'__proto__': null}",
            "{a: 1e400}",
            r#"{a: '\ud800'}"#,
        ];
        for code in not_foldable {
            let results = analyze(&format!("x = {code};"));
            assert_eq!(results[0].1, None, "{code}");
        }
    }

    #[test]
    fn duplicate_keys_keep_first_position() {
        let results = analyze("x = {a: 1, b: 2, a: 3};");
        assert_eq!(results[0].1.as_deref(), Some(r#"{"a":3,"b":2}"#));
    }

    // Analyzes `code` and returns the number of objects and of object folds.
    fn count_folds(code: &str) -> (usize, usize) {
        let source = Source::from_contents("t.js".to_string(), code.to_string()).unwrap();
        let program = Parser::new(&source).unwrap().parse().unwrap();
        let mut analyzer = Analyzer::new();
        let results = analyzer.analyze(&program).unwrap();
        assert_eq!(results.table.count(), results.len());
        (results.len(), analyzer.num_folds())
    }

    // `{a: {b: ...}}` nested `depth` times with `leaf` at the bottom.
    fn chain(depth: usize, leaf: &str) -> String {
        format!("{}{leaf}{}", "{a: ".repeat(depth), "}".repeat(depth))
    }

    // A tree of objects with `width` children per level.
    fn tree(width: usize, depth: usize) -> String {
        if depth == 0 {
            return "{}".to_string();
        }
        let child = tree(width, depth - 1);
        let props: Vec<String> = (0..width).map(|i| format!("k{i}: {child}")).collect();
        format!("{{{}}}", props.join(", "))
    }

    #[test]
    fn nested_objects_fold_once() {
        assert_eq!(count_folds("x = {a: {b: {c: {}}}};"), (4, 4));

        let source =
            Source::from_contents("t.js".to_string(), "x = {a: {b: {c: {}}}};".to_string())
                .unwrap();
        let program = Parser::new(&source).unwrap().parse().unwrap();
        let results = Analyzer::new().analyze(&program).unwrap();
        assert_eq!(results.num_foldable(), 4);
    }

    #[test]
    fn deep_and_wide_literals_fold_once() {
        // Without the cache a chain folds depth * (depth + 1) / 2 objects.
        assert_eq!(count_folds(&format!("x = {};", chain(50, "1"))), (50, 50));
        assert_eq!(count_folds(&format!("x = {};", chain(50, "f()"))), (50, 50));

        // 1 + 3 + 9 + 27 + 81 objects.
        assert_eq!(count_folds(&format!("x = {};", tree(3, 4))), (121, 121));
        let wide = format!("x = [{}, g()];", tree(3, 4));
        assert_eq!(count_folds(&wide), (121, 121));
    }

    #[test]
    fn failures_are_cached() {
        assert_eq!(count_folds("x = {a: {b: g()}, c: 1};"), (2, 2));
        assert_eq!(count_folds("x = {a: f(), b: {c: {}}};"), (3, 3));
        assert_eq!(count_folds("x = {a: ({b: {}}), c: [{d: {}}]};"), (5, 5));
    }

    #[test]
    fn analyzer_is_reusable() {
        let mut analyzer = Analyzer::new();
        for code in ["x = {a: 1};", "y = [{b: f}];"] {
            let source = Source::from_contents("t.js".to_string(), code.to_string()).unwrap();
            let program = Parser::new(&source).unwrap().parse().unwrap();
            let results = analyzer.analyze(&program).unwrap();
            assert_eq!(results.len(), 1);
        }
    }
}
