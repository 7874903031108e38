//! Visit durations per POI category.
//!
//! The reference data itself lives outside this crate; callers hand in any
//! [`VisitDurationTable`]. [`CategoryDurations`] is the in-memory table used by
//! the command line and the tests.

use crate::error::{PlannerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Fallback visit duration, in minutes, for unknown or missing categories.
pub const DEFAULT_VISIT_MINUTES: f64 = 30.0;

/// Category metadata attached to a POI (parallel to the POI list)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoiMetadata {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub sub_category: Option<String>,
}

impl PoiMetadata {
    pub fn new(category: Option<&str>, sub_category: Option<&str>) -> Self {
        PoiMetadata {
            category: category.map(str::to_string),
            sub_category: sub_category.map(str::to_string),
        }
    }
}

pub trait VisitDurationTable {
    /// Visit duration in minutes
    fn visit_minutes(&self, category: Option<&str>, sub_category: Option<&str>) -> f64;

    fn visit_seconds(&self, metadata: Option<&PoiMetadata>) -> f64 {
        let minutes = match metadata {
            Some(m) => self.visit_minutes(m.category.as_deref(), m.sub_category.as_deref()),
            None => self.visit_minutes(None, None),
        };
        minutes * 60.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DurationEntry {
    category: String,
    #[serde(default, rename = "subCategory")]
    sub_category: Option<String>,
    minutes: f64,
}

/// Category → minutes table with a shared default.
///
/// Lookup order: exact (category, sub-category), then (category, any), then
/// the default. Keys are case-insensitive.
#[derive(Debug, Clone)]
pub struct CategoryDurations {
    entries: HashMap<(String, Option<String>), f64>,
    default_minutes: f64,
}

impl Default for CategoryDurations {
    fn default() -> Self {
        CategoryDurations {
            entries: HashMap::new(),
            default_minutes: DEFAULT_VISIT_MINUTES,
        }
    }
}

impl CategoryDurations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, category: &str, sub_category: Option<&str>, minutes: f64) -> Self {
        self.insert(category, sub_category, minutes);
        self
    }

    pub fn with_default(mut self, minutes: f64) -> Self {
        self.default_minutes = minutes;
        self
    }

    pub fn insert(&mut self, category: &str, sub_category: Option<&str>, minutes: f64) {
        self.entries.insert(
            (category.to_lowercase(), sub_category.map(str::to_lowercase)),
            minutes,
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Load a JSON array of `{category, subCategory?, minutes}` objects
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(&path)?;
        let entries: Vec<DurationEntry> = serde_json::from_str(&raw)?;

        let mut table = Self::new();
        for entry in entries {
            if !entry.minutes.is_finite() || entry.minutes < 0.0 {
                return Err(PlannerError::validation(format!(
                    "invalid visit duration {} for category '{}'",
                    entry.minutes, entry.category
                )));
            }
            table.insert(&entry.category, entry.sub_category.as_deref(), entry.minutes);
        }
        Ok(table)
    }
}

impl VisitDurationTable for CategoryDurations {
    fn visit_minutes(&self, category: Option<&str>, sub_category: Option<&str>) -> f64 {
        let Some(category) = category else {
            return self.default_minutes;
        };
        let category = category.to_lowercase();

        if let Some(sub) = sub_category {
            if let Some(&m) = self.entries.get(&(category.clone(), Some(sub.to_lowercase()))) {
                return m;
            }
        }

        self.entries
            .get(&(category, None))
            .copied()
            .unwrap_or(self.default_minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_order() {
        let table = CategoryDurations::new()
            .with_entry("museum", Some("art"), 45.0)
            .with_entry("museum", None, 60.0);

        assert_eq!(table.visit_minutes(Some("museum"), Some("art")), 45.0);
        assert_eq!(table.visit_minutes(Some("Museum"), Some("ART")), 45.0);
        assert_eq!(table.visit_minutes(Some("museum"), Some("history")), 60.0);
        assert_eq!(table.visit_minutes(Some("park"), None), DEFAULT_VISIT_MINUTES);
        assert_eq!(table.visit_minutes(None, None), DEFAULT_VISIT_MINUTES);
    }

    #[test]
    fn test_visit_seconds() {
        let table = CategoryDurations::new().with_entry("museum", Some("art"), 45.0);
        let meta = PoiMetadata::new(Some("museum"), Some("art"));
        assert_eq!(table.visit_seconds(Some(&meta)), 2700.0);
        assert_eq!(table.visit_seconds(None), 1800.0);
    }
}
