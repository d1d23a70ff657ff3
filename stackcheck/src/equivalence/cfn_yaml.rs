//! CloudFormation-aware YAML loading and structural comparison.
//!
//! Short-form intrinsic functions (`!Ref`, `!GetAtt`, `!Sub`, ...) load as
//! their long-form mappings, so `!Ref Vpc` and `{Ref: Vpc}` compare equal.

use serde_yaml::{Mapping, Value};
use std::fmt;

use crate::core::value_kind;

/// Loads a template body and normalises its intrinsic-function tags.
///
/// JSON bodies are accepted, since JSON is valid YAML.
///
/// # Errors
///
/// Returns the underlying parser error for malformed input.
pub fn load_cfn_yaml(content: &str) -> Result<Value, serde_yaml::Error> {
    let value: Value = serde_yaml::from_str(content)?;
    Ok(normalize(value))
}

/// Rewrites every tagged node to its long-form intrinsic mapping.
#[must_use]
pub fn normalize(value: Value) -> Value {
    match value {
        Value::Tagged(tagged) => {
            let tag = tagged.tag.to_string();
            let value = normalize(scalar_as_string(tagged.value));
            expand_intrinsic(tag.trim_start_matches('!'), value)
        }
        Value::Sequence(items) => Value::Sequence(items.into_iter().map(normalize).collect()),
        Value::Mapping(map) => Value::Mapping(
            map.into_iter()
                .map(|(k, v)| (normalize(k), normalize(v)))
                .collect(),
        ),
        scalar => scalar,
    }
}

// A tagged scalar is always text: `!Ref 1` names the same thing as `!Ref '1'`.
// An empty tagged scalar loads as null and becomes the empty string.
fn scalar_as_string(value: Value) -> Value {
    match value {
        Value::Null => Value::String(String::new()),
        Value::Bool(b) => Value::String(b.to_string()),
        Value::Number(n) => Value::String(n.to_string()),
        other => other,
    }
}

fn expand_intrinsic(name: &str, value: Value) -> Value {
    let (key, value) = match name {
        "Ref" | "Condition" => (name.to_string(), value),
        "GetAtt" => ("Fn::GetAtt".to_string(), split_get_att(value)),
        other => (format!("Fn::{other}"), value),
    };
    let mut map = Mapping::new();
    map.insert(Value::String(key), value);
    Value::Mapping(map)
}

// `!GetAtt Resource.Attr` is shorthand for `[Resource, Attr]`. Attribute
// names may themselves contain dots (e.g. `Endpoint.Address`), and a bare
// `!GetAtt Resource` becomes `[Resource]`.
fn split_get_att(value: Value) -> Value {
    match value {
        Value::String(s) => match s.split_once('.') {
            Some((resource, attribute)) => Value::Sequence(vec![
                Value::String(resource.to_string()),
                Value::String(attribute.to_string()),
            ]),
            None => Value::Sequence(vec![Value::String(s)]),
        },
        other => other,
    }
}

/// Where two documents first diverge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Difference {
    /// Dotted location, e.g. `Resources.VPC.Properties[0]`.
    pub path: String,
    /// What the expected document holds there.
    pub expected: String,
    /// What the actual document holds there.
    pub actual: String,
}

impl fmt::Display for Difference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() { "<root>" } else { &self.path };
        write!(f, "at {path}: expected {}, found {}", self.expected, self.actual)
    }
}

/// Returns true if two loaded documents are structurally equal.
///
/// Mapping order is ignored, sequence order is not, and scalars must agree
/// in type (`"1"` is not `1`). Integers and floats compare numerically.
#[must_use]
pub fn structurally_equal(expected: &Value, actual: &Value) -> bool {
    first_difference(expected, actual).is_none()
}

/// Finds the first structural difference between two loaded documents.
#[must_use]
pub fn first_difference(expected: &Value, actual: &Value) -> Option<Difference> {
    let mut path = Vec::new();
    diff(expected, actual, &mut path)
}

fn diff(expected: &Value, actual: &Value, path: &mut Vec<String>) -> Option<Difference> {
    match (expected, actual) {
        (Value::Mapping(e), Value::Mapping(a)) => diff_mappings(e, a, path),
        (Value::Sequence(e), Value::Sequence(a)) => {
            if e.len() != a.len() {
                return Some(difference(
                    path,
                    format!("{} items", e.len()),
                    format!("{} items", a.len()),
                ));
            }
            for (index, (ev, av)) in e.iter().zip(a).enumerate() {
                path.push(format!("[{index}]"));
                let found = diff(ev, av, path);
                path.pop();
                if found.is_some() {
                    return found;
                }
            }
            None
        }
        (Value::Tagged(e), Value::Tagged(a)) if e.tag == a.tag => diff(&e.value, &a.value, path),
        (Value::Number(e), Value::Number(a)) => {
            let equal = match (e.as_i64(), a.as_i64(), e.as_u64(), a.as_u64()) {
                (Some(x), Some(y), _, _) => x == y,
                (_, _, Some(x), Some(y)) => x == y,
                _ => e.as_f64() == a.as_f64(),
            };
            (!equal).then(|| difference(path, describe(expected), describe(actual)))
        }
        _ if expected == actual => None,
        _ => Some(difference(path, describe(expected), describe(actual))),
    }
}

fn diff_mappings(expected: &Mapping, actual: &Mapping, path: &mut Vec<String>) -> Option<Difference> {
    for (key, ev) in expected {
        path.push(key_segment(key));
        let found = match actual.get(key) {
            Some(av) => diff(ev, av, path),
            None => Some(difference(path, describe(ev), "nothing".to_string())),
        };
        path.pop();
        if found.is_some() {
            return found;
        }
    }
    actual
        .iter()
        .find(|(key, _)| !expected.contains_key(*key))
        .map(|(key, av)| {
            path.push(key_segment(key));
            let found = difference(path, "nothing".to_string(), describe(av));
            path.pop();
            found
        })
}

fn difference(path: &[String], expected: String, actual: String) -> Difference {
    let mut joined = String::new();
    for segment in path {
        if !joined.is_empty() && !segment.starts_with('[') {
            joined.push('.');
        }
        joined.push_str(segment);
    }
    Difference {
        path: joined,
        expected,
        actual,
    }
}

fn key_segment(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => describe(other),
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("boolean {b}"),
        Value::Number(n) => format!("number {n}"),
        Value::String(s) => format!("string {s:?}"),
        other => value_kind(other).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(content: &str) -> Value {
        load_cfn_yaml(content).unwrap()
    }

    #[test]
    fn test_flow_and_block_styles_are_equal() {
        assert!(structurally_equal(&load("{a: 1, b: 2}"), &load("b: 2\na: 1\n")));
    }

    #[test]
    fn test_string_and_number_differ() {
        let diff = first_difference(&load("{a: \"1\"}"), &load("{a: 1}")).unwrap();
        assert_eq!(diff.path, "a");
        assert_eq!(diff.expected, "string \"1\"");
        assert_eq!(diff.actual, "number 1");
    }

    #[test]
    fn test_integer_and_float_compare_numerically() {
        assert!(structurally_equal(&load("a: 1"), &load("a: 1.0")));
        assert!(!structurally_equal(&load("a: 1"), &load("a: 1.5")));
    }

    #[test]
    fn test_sequence_order_matters() {
        let diff = first_difference(&load("a: [1, 2]"), &load("a: [2, 1]")).unwrap();
        assert_eq!(diff.path, "a[0]");
    }

    #[test]
    fn test_sequence_length() {
        let diff = first_difference(&load("a: [1]"), &load("a: [1, 2]")).unwrap();
        assert_eq!(diff.expected, "1 items");
        assert_eq!(diff.actual, "2 items");
    }

    #[test]
    fn test_extra_and_missing_keys() {
        let missing = first_difference(&load("a: 1\nb: 2"), &load("a: 1")).unwrap();
        assert_eq!(missing.path, "b");
        assert_eq!(missing.actual, "nothing");

        let extra = first_difference(&load("a: 1"), &load("a: 1\nc: 3")).unwrap();
        assert_eq!(extra.path, "c");
        assert_eq!(extra.expected, "nothing");
    }

    #[test]
    fn test_symmetric() {
        let a = load("Resources: {VPC: {Type: AWS::EC2::VPC}}");
        let b = load("Resources:\n  VPC:\n    Type: AWS::EC2::Subnet\n");
        assert_eq!(structurally_equal(&a, &b), structurally_equal(&b, &a));
        assert!(!structurally_equal(&a, &b));
    }

    #[test]
    fn test_nested_path_reporting() {
        let diff = first_difference(
            &load("Resources: {VPC: {Type: AWS::EC2::VPC}}"),
            &load("Resources: {VPC: {Type: AWS::EC2::Subnet}}"),
        )
        .unwrap();
        assert_eq!(diff.path, "Resources.VPC.Type");
        assert_eq!(
            diff.to_string(),
            "at Resources.VPC.Type: expected string \"AWS::EC2::VPC\", found string \"AWS::EC2::Subnet\""
        );
    }

    #[test]
    fn test_ref_short_form() {
        assert_eq!(load("!Ref Vpc"), load("{Ref: Vpc}"));
    }

    #[test]
    fn test_get_att_short_form() {
        assert_eq!(load("!GetAtt Db.Endpoint.Address"), load("{Fn::GetAtt: [Db, Endpoint.Address]}"));
        assert_eq!(load("!GetAtt [Db, Arn]"), load("{Fn::GetAtt: [Db, Arn]}"));
    }

    #[test]
    fn test_get_att_without_attribute() {
        assert_eq!(load("!GetAtt Db"), load("{Fn::GetAtt: [Db]}"));
        assert!(!structurally_equal(&load("!GetAtt Db"), &load("{Fn::GetAtt: Db}")));
    }

    #[test]
    fn test_tagged_scalars_load_as_strings() {
        assert_eq!(load("a: !Ref 1"), load("a: !Ref '1'"));
        assert_eq!(load("a: !Ref 1"), load("a: {Ref: '1'}"));
        assert_eq!(load("a: !Condition true"), load("a: {Condition: 'true'}"));
        assert!(!structurally_equal(&load("a: !Ref 1"), &load("a: {Ref: 1}")));
    }

    #[test]
    fn test_function_short_forms() {
        assert_eq!(load("!Sub '${AWS::Region}-x'"), load("{Fn::Sub: '${AWS::Region}-x'}"));
        assert_eq!(load("!Join [',', [a, b]]"), load("{Fn::Join: [',', [a, b]]}"));
        assert_eq!(load("!Condition IsProd"), load("{Condition: IsProd}"));
    }

    #[test]
    fn test_nested_tags() {
        assert_eq!(
            load("Value: !Sub ['${X}', {X: !Ref Param}]"),
            load("Value: {Fn::Sub: ['${X}', {X: {Ref: Param}}]}")
        );
    }

    #[test]
    fn test_json_body() {
        assert!(structurally_equal(
            &load(r#"{"Resources": {"VPC": {"Type": "AWS::EC2::VPC"}}}"#),
            &load("Resources:\n  VPC:\n    Type: AWS::EC2::VPC\n"),
        ));
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(load_cfn_yaml("a: [").is_err());
    }
}
