// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(test)]

use std::rc::Rc;

use anyhow::{bail, Result};
use indexmap::IndexMap;
use jsonfold::*;

#[test]
fn object_keys_keep_first_position() -> Result<()> {
    let mut map = IndexMap::new();
    map.insert(Rc::from("b"), Value::from(1u64));
    map.insert(Rc::from("a"), Value::from(2u64));
    map.insert(Rc::from("b"), Value::from(3u64));

    assert_eq!(Value::from(map).to_json_str()?, r#"{"b":3,"a":2}"#);
    Ok(())
}

#[test]
fn serialize_number() -> Result<()> {
    // Check that integer values are serialized without fractional part
    assert_eq!(Value::from(1.0).to_json_str()?, "1");
    assert_eq!(Value::from(-1.0).to_json_str()?, "-1");
    assert_eq!(Value::from(-0.0).to_json_str()?, "0");
    assert_eq!(Value::from(0.5).to_json_str()?, "0.5");
    assert_eq!(Value::from(1e21).to_json_str()?, "1e+21");
    assert_eq!(Value::from(1e20).to_json_str()?, "100000000000000000000");
    assert_eq!(Value::from(123e-20).to_json_str()?, "1.23e-18");
    assert_eq!(Value::from(f64::NAN).to_json_str()?, "null");
    Ok(())
}

#[test]
fn serialize_string() -> Result<()> {
    let v = Value::String("a\"b\\c\nd\u{1}é\u{2028}</".into());
    // JSON escaping only; script-safe escaping happens when the text is quoted.
    assert_eq!(v.to_json_str()?, "\"a\\\"b\\\\c\\nd\\u0001é\u{2028}</\"");
    Ok(())
}

#[test]
fn parse_json() -> Result<()> {
    let v = Value::from_json_str(r#"{"x": [1, 2.50, "s", null, true, {"y": {}}], "big": 12345678901234567890}"#)?;
    let Value::Object(fields) = &v else {
        bail!("not an object: {v}");
    };
    assert_eq!(fields.keys().map(|k| k.as_ref()).collect::<Vec<_>>(), ["x", "big"]);
    let Some(Value::Array(items)) = fields.get("x") else {
        bail!("x is not an array");
    };
    assert_eq!(items[1], Value::from(2.5));
    assert_eq!(items[3], Value::Null);
    assert_eq!(items[4], Value::Bool(true));
    assert_eq!(items[5], Value::from_json_str(r#"{"y":{}}"#)?);
    assert_eq!(
        v.to_json_str()?,
        r#"{"x":[1,2.5,"s",null,true,{"y":{}}],"big":12345678901234567000}"#
    );
    Ok(())
}

#[test]
fn display_is_minimal_json() -> Result<()> {
    let v = Value::from(vec![Value::Null, Value::Bool(true), Value::String("s".into())]);
    assert_eq!(v.to_string(), r#"[null,true,"s"]"#);

    let v = Value::from_json_str("{\n  \"a\": [1, {\"b\": null}]\n}")?;
    assert_eq!(v.to_string(), r#"{"a":[1,{"b":null}]}"#);
    assert_eq!(v.to_string(), v.to_json_str()?);
    Ok(())
}

#[test]
fn invalid_json_is_an_error() {
    assert!(Value::from_json_str("{\"a\":}").is_err());
    assert!(Value::from_json_str("[1, 2").is_err());
}
