//! Payloads produced by the AI provider.
//!
//! Shapes are loosely enforced: scalar fields default to empty strings and
//! numbers or booleans are accepted where text is expected, since the model
//! does not always honour the requested schema.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One AI-generated follow-up question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DynamicQuestion {
    #[serde(deserialize_with = "lenient_string")]
    pub question: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UniversityRecommendation {
    #[serde(default, deserialize_with = "lenient_string")]
    pub country: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub university: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub major: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub ranking: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub tuition_fees: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub why_this_choice: String,
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub risk_flags: Vec<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub admission_probability: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Scholarship {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub amount: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub deadline: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub eligibility: String,
}

/// The recommendation step's output. `recommendations` is the only field the
/// flow depends on; a reply without a list or object there is rejected by the
/// caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RecommendationSet {
    #[serde(default, deserialize_with = "lenient_string")]
    pub summary: String,
    #[serde(default, deserialize_with = "lenient_optional_list")]
    pub recommendations: Option<Vec<UniversityRecommendation>>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub top_scholarships: Vec<Scholarship>,
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub risks: Vec<String>,
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub alternatives: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RoadmapPhase {
    #[serde(default, deserialize_with = "lenient_string")]
    pub phase: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub actions: Vec<String>,
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub exams: Vec<String>,
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub skills_to_learn: Vec<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub cost_estimate: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub timeline: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RoadmapPlan {
    #[serde(default, deserialize_with = "lenient_list")]
    pub roadmap: Vec<RoadmapPhase>,
}

fn scalar_to_string(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        Value::Array(items) => items
            .into_iter()
            .map(scalar_to_string)
            .collect::<Vec<_>>()
            .join("\n"),
        other => other.to_string(),
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_to_string(Value::deserialize(deserializer)?))
}

/// Accepts a list of scalars, a single scalar, or null.
fn lenient_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => Vec::new(),
        Value::Array(items) => items.into_iter().map(scalar_to_string).collect(),
        other => vec![scalar_to_string(other)],
    })
}

/// Array items, or a lone object as a one-item list. Anything else is `None`.
fn list_items(value: Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        object @ Value::Object(_) => Some(vec![object]),
        _ => None,
    }
}

/// Keeps the object entries that fit `T`, dropping the rest.
fn objects_of<T: DeserializeOwned>(items: Vec<Value>) -> Vec<T> {
    items
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect()
}

/// A list of records; null or scalars read as empty.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(list_items(Value::deserialize(deserializer)?)
        .map(objects_of)
        .unwrap_or_default())
}

/// Like `lenient_list`, but null or scalars read as absent.
fn lenient_optional_list<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(list_items(Value::deserialize(deserializer)?).map(objects_of))
}
