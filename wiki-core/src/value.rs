//! Tagged-union representation of frontmatter metadata values.
//!
//! Frontmatter is user-authored YAML of arbitrary shape. Rather than carry
//! `serde_yaml::Value` through the rest of the pipeline, every value is
//! converted once into this crate's own `Value` union — a scalar, an
//! ordered sequence, or an ordered mapping — so that downstream code
//! (link resolution, tag extraction, rendering collaborators) only has to
//! match one small enum instead of reasoning about YAML's full type zoo
//! (tags, anchors, non-string keys).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A leaf value in frontmatter metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    String(String),
    Bool(bool),
    Number(f64),
}

impl Scalar {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// Frontmatter metadata value: a scalar, an ordered sequence, or an
/// ordered mapping of further values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Scalar(Scalar),
    Sequence(Vec<Value>),
    Mapping(IndexMap<String, Value>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Scalar(s) => s.as_str(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Scalar(s) => s.as_bool(),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// Collect every string found by walking scalars, sequence elements,
    /// and mapping values recursively. Used for link resolution, which
    /// must find `[[wikilinks]]` anywhere in metadata, not just in
    /// known reserved keys.
    pub fn collect_strings<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Value::Scalar(Scalar::String(s)) => out.push(s),
            Value::Scalar(_) => {}
            Value::Sequence(items) => {
                for item in items {
                    item.collect_strings(out);
                }
            }
            Value::Mapping(map) => {
                for v in map.values() {
                    v.collect_strings(out);
                }
            }
        }
    }

    /// Return a new `Value` with every string scalar replaced by applying
    /// `f`, recursing through sequences and mappings. Used to rewrite
    /// wikilinks embedded in metadata.
    pub fn map_strings(&self, f: &mut impl FnMut(&str) -> String) -> Value {
        match self {
            Value::Scalar(Scalar::String(s)) => Value::Scalar(Scalar::String(f(s))),
            Value::Scalar(other) => Value::Scalar(other.clone()),
            Value::Sequence(items) => {
                Value::Sequence(items.iter().map(|v| v.map_strings(f)).collect())
            }
            Value::Mapping(map) => Value::Mapping(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.map_strings(f)))
                    .collect(),
            ),
        }
    }
}

/// Convert a decoded `serde_yaml::Value` into this crate's `Value` union.
/// Non-string mapping keys are stringified; `Null` collapses to an empty
/// mapping entry being skipped entirely by the caller (frontmatter.rs
/// drops null-valued keys before this is reached is not assumed here —
/// nulls become an empty-string scalar so no information silently vanishes).
pub fn from_yaml(yaml: serde_yaml::Value) -> Value {
    match yaml {
        serde_yaml::Value::Null => Value::Scalar(Scalar::String(String::new())),
        serde_yaml::Value::Bool(b) => Value::Scalar(Scalar::Bool(b)),
        serde_yaml::Value::Number(n) => {
            Value::Scalar(Scalar::Number(n.as_f64().unwrap_or_default()))
        }
        serde_yaml::Value::String(s) => Value::Scalar(Scalar::String(s)),
        serde_yaml::Value::Sequence(seq) => {
            Value::Sequence(seq.into_iter().map(from_yaml).collect())
        }
        serde_yaml::Value::Mapping(map) => {
            let mut out = IndexMap::with_capacity(map.len());
            for (k, v) in map {
                let key = match k {
                    serde_yaml::Value::String(s) => s,
                    other => serde_yaml::to_string(&other)
                        .unwrap_or_default()
                        .trim()
                        .to_string(),
                };
                out.insert(key, from_yaml(v));
            }
            Value::Mapping(out)
        }
        serde_yaml::Value::Tagged(tagged) => from_yaml(tagged.value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_scalars() {
        let v = from_yaml(serde_yaml::from_str("true").unwrap());
        assert_eq!(v.as_bool(), Some(true));

        let v = from_yaml(serde_yaml::from_str("\"hello\"").unwrap());
        assert_eq!(v.as_str(), Some("hello"));
    }

    #[test]
    fn converts_nested_mapping_and_sequence() {
        let yaml = serde_yaml::from_str(
            r#"
tags: [a, b]
nested:
  inner: value
"#,
        )
        .unwrap();
        let v = from_yaml(yaml);
        let map = v.as_mapping().unwrap();
        let tags = map.get("tags").unwrap().as_sequence().unwrap();
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].as_str(), Some("a"));

        let inner = map.get("nested").unwrap().as_mapping().unwrap();
        assert_eq!(inner.get("inner").unwrap().as_str(), Some("value"));
    }

    #[test]
    fn collect_strings_walks_everything() {
        let yaml = serde_yaml::from_str(
            r#"
title: See [[Other]]
related: ["[[A]]", "[[B|alt]]"]
box:
  note: "[[C]]"
"#,
        )
        .unwrap();
        let v = from_yaml(yaml);
        let mut out = Vec::new();
        v.collect_strings(&mut out);
        assert_eq!(out.len(), 4);
    }
}
