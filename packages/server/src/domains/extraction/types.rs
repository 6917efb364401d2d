//! Structured output of report extraction.
//!
//! LLM output is loosely typed: fields go missing, come back `null`, or hold
//! numbers as strings. Deserialization here tolerates all of that instead of
//! failing the whole report over one odd field.

use serde::{Deserialize, Deserializer, Serialize};

use crate::domains::reports::models::Urgency;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Korban,
    Kebutuhan,
    #[default]
    Unknown,
}

impl Intent {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "korban" => Intent::Korban,
            "kebutuhan" => Intent::Kebutuhan,
            _ => Intent::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Korban => "korban",
            Intent::Kebutuhan => "kebutuhan",
            Intent::Unknown => "unknown",
        }
    }
}

impl<'de> Deserialize<'de> for Intent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(serde_json::Value::String(s)) => Intent::parse(&s),
            _ => Intent::Unknown,
        })
    }
}

fn default_urgency() -> Urgency {
    Urgency::Medium
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedReport {
    #[serde(default)]
    pub intent: Intent,
    #[serde(default = "default_urgency", deserialize_with = "lenient::urgency")]
    pub urgency: Urgency,
    #[serde(default, deserialize_with = "lenient::string")]
    pub location: String,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub location_detail: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub longitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub summary: String,
    #[serde(default, deserialize_with = "lenient::vec")]
    pub persons: Vec<ExtractedPerson>,
    #[serde(default, deserialize_with = "lenient::vec")]
    pub needs: Vec<ExtractedNeed>,
    #[serde(default, deserialize_with = "lenient::vec")]
    pub missing_fields: Vec<String>,
    /// Set when produced by keyword matching rather than the LLM
    #[serde(default)]
    pub fallback: bool,
}

impl Default for ExtractedReport {
    fn default() -> Self {
        Self {
            intent: Intent::Unknown,
            urgency: Urgency::Medium,
            location: String::new(),
            location_detail: None,
            latitude: None,
            longitude: None,
            summary: String::new(),
            persons: Vec::new(),
            needs: Vec::new(),
            missing_fields: Vec::new(),
            fallback: false,
        }
    }
}

impl ExtractedReport {
    pub fn remove_missing(&mut self, field: &str) {
        self.missing_fields.retain(|f| f != field);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedPerson {
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_i32")]
    pub age: Option<i32>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub gender: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub condition: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub last_seen_location: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub current_location: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub notes: Option<String>,
}

impl ExtractedPerson {
    pub fn unnamed(index: usize, status: &str) -> Self {
        Self {
            name: format!("Korban {} (tidak disebutkan nama)", index),
            status: Some(status.to_string()),
            age: None,
            gender: None,
            condition: None,
            last_seen_location: None,
            current_location: None,
            notes: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedNeed {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient::opt_i32")]
    pub quantity: Option<i32>,
    #[serde(default, deserialize_with = "lenient::opt_i32")]
    pub people_affected: Option<i32>,
}

mod lenient {
    use serde::de::DeserializeOwned;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use crate::domains::reports::models::Urgency;

    pub fn urgency<'de, D: Deserializer<'de>>(d: D) -> Result<Urgency, D::Error> {
        Ok(match Option::<Value>::deserialize(d)? {
            Some(Value::String(s)) => Urgency::from_extracted(&s),
            _ => Urgency::Medium,
        })
    }

    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(opt_string(d)?.unwrap_or_default())
    }

    pub fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(match Option::<Value>::deserialize(d)? {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
    }

    pub fn opt_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        Ok(match Option::<Value>::deserialize(d)? {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        })
    }

    pub fn opt_i32<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i32>, D::Error> {
        Ok(match Option::<Value>::deserialize(d)? {
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f.round() as i64))
                .and_then(|v| i32::try_from(v).ok()),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        })
    }

    /// Null becomes empty; malformed elements are skipped.
    pub fn vec<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        Ok(match Option::<Value>::deserialize(d)? {
            Some(Value::Array(items)) => items
                .into_iter()
                .filter_map(|item| serde_json::from_value(item).ok())
                .collect(),
            _ => Vec::new(),
        })
    }
}
