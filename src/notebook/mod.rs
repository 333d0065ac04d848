//! Notebook documents
//!
//! A minimal serde model of the notebook JSON format: enough to read
//! template and submission documents, slice their cells, and write a
//! combined document that reuses the template's metadata. Fields this model
//! does not know about (outputs, execution counts) ride along untouched.

pub mod extract;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// Cell source: the format allows either one string or a list of lines
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Source {
    Text(String),
    Lines(Vec<String>),
}

impl Default for Source {
    fn default() -> Self {
        Source::Text(String::new())
    }
}

impl Source {
    /// The source as one string
    pub fn text(&self) -> String {
        match self {
            Source::Text(text) => text.clone(),
            Source::Lines(lines) => lines.concat(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Source::Text(text) => text.is_empty(),
            Source::Lines(lines) => lines.iter().all(|line| line.is_empty()),
        }
    }
}

/// One notebook cell
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cell {
    pub cell_type: String,
    #[serde(default = "empty_object")]
    pub metadata: Value,
    #[serde(default)]
    pub source: Source,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Cell {
    /// The cell source as one string
    pub fn text(&self) -> String {
        self.source.text()
    }

    /// A metadata flag, with Python-style truthiness
    pub fn flag(&self, key: &str) -> bool {
        self.metadata.get(key).map(truthy).unwrap_or(false)
    }

    /// A string-valued metadata entry
    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }

    pub fn is_question(&self) -> bool {
        self.flag("is_question")
    }
}

/// A notebook document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notebook {
    #[serde(default)]
    pub cells: Vec<Cell>,
    #[serde(default = "empty_object")]
    pub metadata: Value,
    #[serde(default = "default_nbformat")]
    pub nbformat: u32,
    #[serde(default)]
    pub nbformat_minor: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Notebook {
    pub fn parse(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse notebook JSON")
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read notebook: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse notebook: {}", path.display()))
    }

    /// A copy of this notebook with a different cell list
    pub fn with_cells(&self, cells: Vec<Cell>) -> Self {
        Self {
            cells,
            metadata: self.metadata.clone(),
            nbformat: self.nbformat,
            nbformat_minor: self.nbformat_minor,
            extra: self.extra.clone(),
        }
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize notebook")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write notebook: {}", path.display()))
    }
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

fn default_nbformat() -> u32 {
    4
}

/// Python-style truthiness for metadata values
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// A markdown cell holding a heading at the given level
pub fn markdown_heading_cell(text: &str, level: usize) -> Cell {
    Cell {
        cell_type: "markdown".to_string(),
        metadata: empty_object(),
        source: Source::Text(format!("{} {}", "#".repeat(level), text)),
        extra: Map::new(),
    }
}

/// Concatenated, trimmed source text of a cell list
pub fn cells_text(cells: &[Cell]) -> String {
    cells
        .iter()
        .map(|cell| cell.text())
        .collect::<String>()
        .trim()
        .to_string()
}
