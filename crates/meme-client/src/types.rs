//! Catalog and render-call types shared by both adapters.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Scalar option value passed to a meme (`key=value` from chat arrives as `Str`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl From<&str> for OptionValue {
    fn from(s: &str) -> Self {
        OptionValue::Str(s.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(s: String) -> Self {
        OptionValue::Str(s)
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Bool(b) => write!(f, "{}", b),
            OptionValue::Int(i) => write!(f, "{}", i),
            OptionValue::Float(x) => write!(f, "{}", x),
            OptionValue::Str(s) => f.write_str(s),
        }
    }
}

pub type MemeOptions = BTreeMap<String, OptionValue>;

/// A labeled input image: `name` is the display name of whoever the image stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemeImage {
    pub name: String,
    pub data: Vec<u8>,
}

impl MemeImage {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}

/// Named option a meme accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemeOptionSpec {
    pub name: String,
    pub description: Option<String>,
}

/// Parameter constraints of one meme.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MemeParams {
    pub min_images: usize,
    pub max_images: usize,
    pub min_texts: usize,
    pub max_texts: usize,
    pub default_texts: Vec<String>,
    pub options: Vec<MemeOptionSpec>,
}

/// Catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemeInfo {
    pub key: String,
    pub keywords: Vec<String>,
    pub tags: Vec<String>,
    pub params: MemeParams,
}

impl MemeInfo {
    /// True when `keyword` is the meme key or one of its aliases.
    pub fn answers_to(&self, keyword: &str) -> bool {
        self.key == keyword || self.keywords.iter().any(|k| k == keyword)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_value_untagged_json() {
        let options: MemeOptions = [
            ("circle".to_string(), OptionValue::Bool(true)),
            ("name".to_string(), OptionValue::from("Alice")),
            ("size".to_string(), OptionValue::Int(3)),
        ]
        .into_iter()
        .collect();
        let json = serde_json::to_string(&options).unwrap();
        assert_eq!(json, r#"{"circle":true,"name":"Alice","size":3}"#);
    }

    #[test]
    fn test_answers_to_key_or_keyword() {
        let info = MemeInfo {
            key: "petpet".to_string(),
            keywords: vec!["摸".to_string(), "摸摸".to_string()],
            tags: vec![],
            params: MemeParams::default(),
        };
        assert!(info.answers_to("petpet"));
        assert!(info.answers_to("摸摸"));
        assert!(!info.answers_to("摸摸摸"));
    }
}
