use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Category sentinel that disables category filtering.
pub const ALL_CATEGORIES: &str = "all";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosisTemplate {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub content: String,
}

impl DiagnosisTemplate {
    /// Creates a template whose id is the current epoch millisecond.
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self::with_id(Utc::now().timestamp_millis(), name, category, content)
    }

    pub fn with_id(
        id: i64,
        name: impl Into<String>,
        category: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            category: category.into(),
            content: content.into(),
        }
    }

    /// Substring match on name, content or category. Case-sensitive.
    pub fn contains_text(&self, needle: &str) -> bool {
        self.name.contains(needle) || self.content.contains(needle) || self.category.contains(needle)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryFilter {
    All,
    Only(String),
}

impl CategoryFilter {
    pub fn admits(&self, category: &str) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(wanted) => wanted == category,
        }
    }
}

impl From<&str> for CategoryFilter {
    fn from(value: &str) -> Self {
        if value.eq_ignore_ascii_case(ALL_CATEGORIES) {
            CategoryFilter::All
        } else {
            CategoryFilter::Only(value.to_string())
        }
    }
}

/// The set written on first run, before the user has any templates.
pub fn default_templates() -> Vec<DiagnosisTemplate> {
    vec![
        DiagnosisTemplate::with_id(
            1,
            "Pneumonia",
            "Respiratory",
            "Pneumonia in the right lung with elevated temperature and a dry cough.",
        ),
        DiagnosisTemplate::with_id(
            2,
            "Hypertension",
            "Cardiovascular",
            "Stage two hypertension; requires regular follow-up.",
        ),
        DiagnosisTemplate::with_id(
            3,
            "Type 2 diabetes",
            "Endocrine",
            "Type 2 diabetes with elevated HbA1c; medication doses need adjustment.",
        ),
        DiagnosisTemplate::with_id(
            4,
            "Arthritis",
            "Orthopedics",
            "Arthritis in both knees with limited mobility.",
        ),
        DiagnosisTemplate::with_id(
            5,
            "Migraine",
            "Neurology",
            "Chronic migraine with sensitivity to light and noise.",
        ),
        DiagnosisTemplate::with_id(
            6,
            "Skin allergy",
            "Dermatology",
            "Skin allergy with itching and rash; needs moisturizing creams.",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn all_sentinel_is_case_insensitive() {
        assert_eq!(CategoryFilter::from("all"), CategoryFilter::All);
        assert_eq!(CategoryFilter::from("All"), CategoryFilter::All);
        assert_eq!(
            CategoryFilter::from("Neurology"),
            CategoryFilter::Only("Neurology".to_string())
        );
    }

    #[test]
    fn category_match_is_exact() {
        let filter = CategoryFilter::from("Neuro");
        assert!(!filter.admits("Neurology"));
        assert!(CategoryFilter::All.admits("anything"));
    }

    #[test]
    fn default_ids_are_distinct() {
        let defaults = default_templates();
        let ids: HashSet<i64> = defaults.iter().map(|t| t.id).collect();
        assert_eq!(ids.len(), defaults.len());
    }

    #[test]
    fn template_serializes_with_plain_field_names() {
        let template = DiagnosisTemplate::with_id(7, "Flu", "General", "Seasonal flu.");
        let json = serde_json::to_value(&template).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["category"], "General");
    }
}
