//! Dataset document shapes and country token extraction
//!
//! Supports:
//! - Quiz collections: `{"quizzes": {"<id>": {"countries": {"<token>": ...}}}}`
//! - Record arrays: `{"data": [{"country": "<token>", ...}, ...]}`
//! - Flat maps: `{"<token>": <value>, ...}` minus a few metadata keys
//!
//! A document is classified once; extraction then works off the classified shape.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Top-level keys of a flat map that describe the dataset rather than name a country.
pub const RESERVED_KEYS: &[&str] = &["title", "description", "category", "tags"];

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    QuizCollection,
    RecordArray,
    FlatMap,
}

/// A dataset document, classified by structure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DocumentShape<'a> {
    QuizCollection(&'a Map<String, Value>),
    RecordArray(&'a [Value]),
    FlatMap(&'a Map<String, Value>),
    /// Not an object at all; carries no tokens.
    Empty,
}

impl<'a> DocumentShape<'a> {
    pub fn classify(document: &'a Value) -> Self {
        let Value::Object(root) = document else {
            return DocumentShape::Empty;
        };
        if let Some(Value::Object(quizzes)) = root.get("quizzes") {
            return DocumentShape::QuizCollection(quizzes);
        }
        if let Some(Value::Array(records)) = root.get("data") {
            return DocumentShape::RecordArray(records.as_slice());
        }
        DocumentShape::FlatMap(root)
    }

    pub fn kind(&self) -> ShapeKind {
        match self {
            DocumentShape::QuizCollection(_) => ShapeKind::QuizCollection,
            DocumentShape::RecordArray(_) => ShapeKind::RecordArray,
            DocumentShape::FlatMap(_) | DocumentShape::Empty => ShapeKind::FlatMap,
        }
    }

    /// Distinct raw country tokens in this document.
    pub fn tokens(&self) -> BTreeSet<String> {
        match self {
            DocumentShape::QuizCollection(quizzes) => quizzes
                .values()
                .filter_map(|quiz| quiz.get("countries").and_then(Value::as_object))
                .flat_map(|countries| countries.keys().cloned())
                .collect(),
            DocumentShape::RecordArray(records) => records
                .iter()
                .filter_map(|record| record.get("country").and_then(Value::as_str))
                .map(str::to_string)
                .collect(),
            DocumentShape::FlatMap(root) => root
                .keys()
                .filter(|key| !RESERVED_KEYS.contains(&key.as_str()))
                .cloned()
                .collect(),
            DocumentShape::Empty => BTreeSet::new(),
        }
    }
}

pub fn extract_country_tokens(document: &Value) -> BTreeSet<String> {
    DocumentShape::classify(document).tokens()
}
