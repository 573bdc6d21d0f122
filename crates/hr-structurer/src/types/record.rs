//! Structured per-document record and its field types

use serde::{Deserialize, Serialize};

/// HR document category (closed set with a fallback)
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum HrCategory {
    #[serde(rename = "Rekruttering")]
    Recruitment,
    #[serde(rename = "Onboarding")]
    Onboarding,
    #[serde(rename = "Opplæring")]
    Training,
    #[serde(rename = "Ytelsesstyring")]
    PerformanceManagement,
    #[serde(rename = "Kompensasjon og fordeler")]
    CompensationBenefits,
    #[serde(rename = "Arbeidsmiljø")]
    WorkEnvironment,
    #[serde(rename = "Personaladministrasjon")]
    PersonnelAdministration,
    #[serde(rename = "Organisasjonsutvikling")]
    OrganizationalDevelopment,
    #[serde(rename = "HMS")]
    HealthSafetyEnvironment,
    #[default]
    #[serde(rename = "Annet")]
    Other,
}

impl HrCategory {
    /// All categories, fallback last
    pub const ALL: [HrCategory; 10] = [
        Self::Recruitment,
        Self::Onboarding,
        Self::Training,
        Self::PerformanceManagement,
        Self::CompensationBenefits,
        Self::WorkEnvironment,
        Self::PersonnelAdministration,
        Self::OrganizationalDevelopment,
        Self::HealthSafetyEnvironment,
        Self::Other,
    ];

    /// Norwegian label, as used in prompts and output
    pub fn label(&self) -> &'static str {
        match self {
            Self::Recruitment => "Rekruttering",
            Self::Onboarding => "Onboarding",
            Self::Training => "Opplæring",
            Self::PerformanceManagement => "Ytelsesstyring",
            Self::CompensationBenefits => "Kompensasjon og fordeler",
            Self::WorkEnvironment => "Arbeidsmiljø",
            Self::PersonnelAdministration => "Personaladministrasjon",
            Self::OrganizationalDevelopment => "Organisasjonsutvikling",
            Self::HealthSafetyEnvironment => "HMS",
            Self::Other => "Annet",
        }
    }

    /// English label
    pub fn english_label(&self) -> &'static str {
        match self {
            Self::Recruitment => "Recruitment",
            Self::Onboarding => "Onboarding",
            Self::Training => "Training",
            Self::PerformanceManagement => "Performance Management",
            Self::CompensationBenefits => "Compensation & Benefits",
            Self::WorkEnvironment => "Work Environment",
            Self::PersonnelAdministration => "Personnel Administration",
            Self::OrganizationalDevelopment => "Organizational Development",
            Self::HealthSafetyEnvironment => "Health/Safety/Environment",
            Self::Other => "Other",
        }
    }

    /// Comma-separated Norwegian labels for prompts
    pub fn prompt_list() -> String {
        Self::ALL
            .iter()
            .map(|c| c.label())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for HrCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Named entities grouped by HR entity type
///
/// All four lists are always serialized. `raw` carries the unparsed model
/// response when it could not be read as JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Entities {
    #[serde(rename = "ansatte", default)]
    pub employees: Vec<String>,
    #[serde(rename = "avdelinger", default)]
    pub departments: Vec<String>,
    #[serde(rename = "stillinger", default)]
    pub positions: Vec<String>,
    #[serde(rename = "kompetanser", default)]
    pub competencies: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

impl Entities {
    /// JSON keys of the entity types, in output order
    pub const KEYS: [&'static str; 4] = ["ansatte", "avdelinger", "stillinger", "kompetanser"];

    /// Empty entity lists wrapping an unparsed response
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self {
            raw: Some(raw.into()),
            ..Self::default()
        }
    }

    /// Total number of entities across all types
    pub fn len(&self) -> usize {
        self.employees.len() + self.departments.len() + self.positions.len() + self.competencies.len()
    }

    /// Whether no entity was found
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Sentiment-bearing keywords
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SentimentKeywords {
    #[serde(default)]
    pub positive: Vec<String>,
    #[serde(default)]
    pub negative: Vec<String>,
}

/// Outcome of one field extraction
///
/// A degraded field still carries a usable default value, so the record can
/// be assembled without treating the mismatch as a document failure.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOutcome<T> {
    /// Parsed as expected
    Extracted(T),
    /// Fell back to a default value
    Degraded { value: T, reason: String },
}

impl<T> FieldOutcome<T> {
    /// Build a degraded outcome
    pub fn degraded(value: T, reason: impl Into<String>) -> Self {
        Self::Degraded {
            value,
            reason: reason.into(),
        }
    }

    /// Borrow the carried value
    pub fn value(&self) -> &T {
        match self {
            Self::Extracted(value) | Self::Degraded { value, .. } => value,
        }
    }

    /// Take the carried value
    pub fn into_value(self) -> T {
        match self {
            Self::Extracted(value) | Self::Degraded { value, .. } => value,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    /// Reason for degradation, if any
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Extracted(_) => None,
            Self::Degraded { reason, .. } => Some(reason),
        }
    }
}

/// Structured record produced for one document
///
/// Every key is always present in the JSON form; `url` is `null` when the
/// text carried no leading URL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StructuredDocument {
    pub title: String,
    pub body: String,
    pub summary: String,
    pub tags: Vec<String>,
    pub url: Option<String>,
    pub category: HrCategory,
    pub entities: Entities,
    pub positive: Vec<String>,
    pub negative: Vec<String>,
}

/// A field that fell back to its default during structuring
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DegradedField {
    pub field: String,
    pub reason: String,
}

/// Structured record plus diagnostics gathered while producing it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructureReport {
    pub document: StructuredDocument,
    /// ISO 639-3 code of the detected language
    pub language: Option<String>,
    /// Set when the text does not look like the expected language
    pub language_warning: bool,
    pub degraded: Vec<DegradedField>,
}

impl StructureReport {
    /// Names of degraded fields
    pub fn degraded_fields(&self) -> Vec<String> {
        self.degraded.iter().map(|d| d.field.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn sample() -> StructuredDocument {
        StructuredDocument {
            title: "Permisjon".to_string(),
            body: "Ansatte har rett til permisjon.".to_string(),
            summary: "Kort om permisjon.".to_string(),
            tags: vec!["permisjon".to_string()],
            url: None,
            category: HrCategory::PersonnelAdministration,
            entities: Entities::default(),
            positive: vec![],
            negative: vec![],
        }
    }

    #[test]
    fn test_all_keys_present() {
        let value = serde_json::to_value(sample()).unwrap();
        let obj = value.as_object().unwrap();
        for key in [
            "title", "body", "summary", "tags", "url", "category", "entities", "positive",
            "negative",
        ] {
            assert!(obj.contains_key(key), "missing key {}", key);
        }
        assert_eq!(obj["url"], Value::Null);
        assert_eq!(obj["category"], "Personaladministrasjon");

        let entities = obj["entities"].as_object().unwrap();
        for key in Entities::KEYS {
            assert_eq!(entities[key], Value::Array(vec![]));
        }
        assert!(!entities.contains_key("raw"));
    }

    #[test]
    fn test_key_order_matches_record_layout() {
        let json = serde_json::to_string(&sample()).unwrap();
        let title = json.find("\"title\"").unwrap();
        let summary = json.find("\"summary\"").unwrap();
        let negative = json.find("\"negative\"").unwrap();
        assert!(title < summary && summary < negative);
    }

    #[test]
    fn test_raw_entities_wrapper() {
        let entities = Entities::from_raw("ikke json");
        let value = serde_json::to_value(&entities).unwrap();
        assert_eq!(value["raw"], "ikke json");
        assert_eq!(value["ansatte"], Value::Array(vec![]));
        assert!(entities.is_empty());
    }

    #[test]
    fn test_category_serializes_norwegian_label() {
        for category in HrCategory::ALL {
            let json = serde_json::to_string(&category).unwrap();
            assert_eq!(json, format!("\"{}\"", category.label()));
        }
        assert_eq!(HrCategory::default(), HrCategory::Other);
        assert!(HrCategory::prompt_list().starts_with("Rekruttering, Onboarding"));
    }

    #[test]
    fn test_field_outcome() {
        let ok = FieldOutcome::Extracted(3);
        assert!(!ok.is_degraded());
        assert_eq!(ok.reason(), None);

        let degraded = FieldOutcome::degraded(0, "bad shape");
        assert!(degraded.is_degraded());
        assert_eq!(degraded.reason(), Some("bad shape"));
        assert_eq!(*degraded.value(), 0);
        assert_eq!(degraded.into_value(), 0);
    }
}
