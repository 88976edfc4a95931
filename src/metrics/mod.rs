pub mod events;
pub mod scraper;

pub use events::EventProcessorScraper;
pub use scraper::{MetricScraper, StatusClient};

use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

use crate::error::ProbeError;

/// A single metric reading as exposed by a status page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricValue {
    Int(i64),
    Str(String),
}

impl MetricValue {
    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Number(n) => Some(match n.as_i64() {
                Some(i) => MetricValue::Int(i),
                None => MetricValue::Str(n.to_string()),
            }),
            Value::String(s) => Some(MetricValue::Str(s.clone())),
            other => Some(MetricValue::Str(other.to_string())),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            MetricValue::Int(i) => Some(*i),
            MetricValue::Str(s) => s.trim().parse().ok(),
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Int(i) => write!(f, "{i}"),
            MetricValue::Str(s) => f.write_str(s),
        }
    }
}

/// Point-in-time view of a status page. Built once per fetch, never updated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricSnapshot {
    values: HashMap<String, MetricValue>,
}

impl MetricSnapshot {
    /// Builds a snapshot from a flat JSON object. `null` entries are dropped.
    pub fn from_json(document: &Value) -> Result<Self, ProbeError> {
        let object = document.as_object().ok_or_else(|| {
            ProbeError::InvalidDocument("metrics document is not a JSON object".to_string())
        })?;

        let values = object
            .iter()
            .filter_map(|(name, value)| {
                MetricValue::from_json(value).map(|v| (name.clone(), v))
            })
            .collect();
        Ok(Self { values })
    }

    /// Builds a snapshot from a `key: value` text blob; all values are strings.
    pub fn from_text(text: &str) -> Self {
        let values = parse_metric_text(text)
            .into_iter()
            .map(|(k, v)| (k, MetricValue::Str(v)))
            .collect();
        Self { values }
    }

    pub fn get(&self, name: &str) -> Result<&MetricValue, ProbeError> {
        self.values
            .get(name)
            .ok_or_else(|| ProbeError::MetricNotFound(name.to_string()))
    }

    pub fn get_i64(&self, name: &str) -> Result<i64, ProbeError> {
        let value = self.get(name)?;
        value.as_i64().ok_or_else(|| ProbeError::MetricParse {
            name: name.to_string(),
            value: value.to_string(),
        })
    }

    pub fn get_string(&self, name: &str) -> Result<String, ProbeError> {
        self.get(name).map(|v| v.to_string())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Entries sorted by name.
    pub fn sorted(&self) -> Vec<(&str, &MetricValue)> {
        let mut entries: Vec<_> = self
            .values
            .iter()
            .map(|(k, v)| (k.as_str(), v))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }
}

/// Parses newline-delimited `key: value` pairs, splitting each line on its
/// first colon. Blank lines and lines without a colon are skipped.
pub fn parse_metric_text(text: &str) -> HashMap<String, String> {
    text.trim()
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match line.split_once(':') {
            Some((key, value)) => Some((key.trim().to_string(), value.trim().to_string())),
            None => {
                log::debug!("Skipping metric line without separator: {line:?}");
                None
            }
        })
        .collect()
}
