// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(test)]

use std::env;

use anyhow::{bail, Result};
use jsonfold::unstable::Parser;
use jsonfold::*;

fn analyze(code: &str) -> Result<Vec<(String, Option<Value>)>> {
    let source = Source::from_contents("test.js".to_string(), code.to_string())?;
    let program = Parser::new(&source)?.parse()?;
    let results = Analyzer::new().analyze(&program)?;
    Ok(results
        .iter()
        .map(|(expr, result)| (expr.span().text().to_string(), result.value().cloned()))
        .collect())
}

#[test]
fn original_plugin_cases() -> Result<()> {
    let foldable = [
        (
            "{ prop1: 1, prop2: 1.1, prop3: 'something', prop4: null, prop5: false, prop6: { nested1: 123 } }",
            r#"{"prop1":1,"prop2":1.1,"prop3":"something","prop4":null,"prop5":false,"prop6":{"nested1":123}}"#,
        ),
        ("{ prop1: {} }", r#"{"prop1":{}}"#),
        ("{ ['prop 1']: true }", r#"{"prop 1":true}"#),
    ];
    for (code, json) in foldable {
        let results = analyze(&format!("export const a = {code};"))?;
        let value = results[0].1.as_ref().map(|v| v.to_json_str()).transpose()?;
        assert_eq!(value.as_deref(), Some(json), "{code}");
    }

    let not_foldable = [
        "{ prop1: undefined }",
        "{ prop1: () => {} }",
        "{ prop1: /a/ }",
        "{ prop1: b }",
        "{ prop1: \"a\" + \"b\" }",
        "{ prop1: false, prop2: { nested: () => {} } }",
    ];
    for code in not_foldable {
        let results = analyze(&format!("const b = 1; export const a = {code};"))?;
        assert_eq!(results[0].1, None, "{code}");
    }
    Ok(())
}

#[test]
fn siblings_fold_independently() -> Result<()> {
    let results = analyze(
        "export const a = { prop1: () => {}, prop2: { nested1: true, nested2: { a: 1 } } };",
    )?;
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].1, None);
    assert_eq!(
        results[1].1,
        Some(Value::from_json_str(
            r#"{"nested1":true,"nested2":{"a":1}}"#
        )?)
    );
    assert_eq!(results[2].1, Some(Value::from_json_str(r#"{"a":1}"#)?));
    Ok(())
}

#[test]
fn objects_in_every_position() -> Result<()> {
    let code = r#"
function f(x = {a: 1}) { return {b: 2}; }
class C { static c = {c: 3}; m() { return [{d: 4}]; } }
const g = () => ({e: 5});
label: for (const k in {f: 6}) { `${ {g: 7} }`; }
export default {h: 8};
"#;
    let results = analyze(code)?;
    let texts: Vec<_> = results.iter().map(|(t, _)| t.as_str()).collect();
    assert_eq!(
        texts,
        vec![
            "{a: 1}", "{b: 2}", "{c: 3}", "{d: 4}", "{e: 5}", "{f: 6}", "{g: 7}", "{h: 8}"
        ]
    );
    assert!(results.iter().all(|(_, v)| v.is_some()));
    Ok(())
}

#[test]
fn folded_values_survive_json() -> Result<()> {
    let code = r#"x = {
  s: "tab\there \"quoted\" </script>   é 😀",
  n: [0, 0.0e0, 1e21, 1e-7, 0.1, 0xff, 1_000],
  nested: {deep: [[], {}, [null, true, false]]},
  "key with spaces": 'v',
};"#;
    let results = analyze(code)?;
    let Some(value) = &results[0].1 else {
        bail!("literal should fold");
    };
    let json = value.to_json_str()?;
    assert_eq!(&Value::from_json_str(&json)?, value);
    let Value::Object(fields) = value else {
        bail!("not an object: {value}");
    };
    let Some(n) = fields.get("n") else {
        bail!("missing n");
    };
    assert_eq!(n.to_json_str()?, "[0,0,1e+21,1e-7,0.1,255,1000]");
    Ok(())
}

#[test]
#[ignore = "intended for analyzing a module given on the command line"]
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
    let results = Analyzer::new().analyze(&program)?;
    for (expr, result) in results.iter() {
        println!("{:?} -> {:?}", expr.span(), result);
    }
    Ok(())
}
