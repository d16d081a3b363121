use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::advisor::models::UniversityRecommendation;
use crate::errors::AppError;

/// Shallow partial update: top-level keys replace the stored values wholesale.
pub type ProfilePatch = Map<String, Value>;

/// Keys a patch may never overwrite.
const PROTECTED_KEYS: &[&str] = &["id", "lastUpdated"];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EnglishProficiency {
    Native,
    Advanced,
    Intermediate,
    Beginner,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RiskTolerance {
    Low,
    Medium,
    High,
}

/// The persisted record for one student: stated preferences plus flow progress.
///
/// Keys the server does not know about are kept in `extra` and round-trip
/// through the store untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StudentProfile {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub education_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub english_proficiency: Option<EnglishProficiency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intended_major: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub career_goal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_preference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_tolerance: Option<RiskTolerance>,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpa: Option<f64>,
    #[serde(default)]
    pub academic_strengths: Vec<String>,
    #[serde(default)]
    pub academic_weaknesses: Vec<String>,
    /// Opaque `Q: ...\nA: ...` transcript, re-sent in full by the client.
    #[serde(default)]
    pub additional_info: String,
    /// Answers submitted through the next-question step, in order.
    #[serde(default)]
    pub answers: Vec<String>,
    #[serde(default)]
    pub question_count: u32,
    #[serde(default)]
    pub questions_completed: bool,
    #[serde(default)]
    pub report_generated: bool,
    #[serde(
        default,
        rename = "lastRecommendations",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_recommendations: Option<Vec<UniversityRecommendation>>,
    #[serde(rename = "lastUpdated", default = "Utc::now")]
    pub last_updated: DateTime<Utc>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StudentProfile {
    /// A blank record: no preferences, counters at zero, flags false.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            age: None,
            education_level: None,
            english_proficiency: None,
            intended_major: None,
            career_goal: None,
            country_preference: None,
            budget_range: None,
            risk_tolerance: None,
            interests: Vec::new(),
            gpa: None,
            academic_strengths: Vec::new(),
            academic_weaknesses: Vec::new(),
            additional_info: String::new(),
            answers: Vec::new(),
            question_count: 0,
            questions_completed: false,
            report_generated: false,
            last_recommendations: None,
            last_updated: Utc::now(),
            extra: Map::new(),
        }
    }

    /// Returns a copy with `patch` shallow-merged in and `lastUpdated` stamped.
    ///
    /// Fails if a patched value does not fit its field's type; `self` is
    /// never modified.
    pub fn merged(&self, patch: &ProfilePatch) -> Result<StudentProfile, serde_json::Error> {
        let mut record: Map<String, Value> = serde_json::from_value(serde_json::to_value(self)?)?;
        for (key, value) in patch {
            if PROTECTED_KEYS.contains(&key.as_str()) {
                continue;
            }
            record.insert(key.clone(), value.clone());
        }
        record.insert(
            "lastUpdated".to_string(),
            serde_json::to_value(Utc::now())?,
        );
        serde_json::from_value(Value::Object(record))
    }
}

/// Body of the create-profile call. Required fields mirror the static intake form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateProfileRequest {
    pub id: String,
    pub intended_major: String,
    pub career_goal: String,
    pub country_preference: String,
    pub budget_range: String,
    pub english_proficiency: EnglishProficiency,
    pub interests: Vec<String>,
    pub risk_tolerance: RiskTolerance,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub education_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpa: Option<f64>,
    #[serde(default)]
    pub academic_strengths: Vec<String>,
    #[serde(default)]
    pub academic_weaknesses: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<String>,
}

impl CreateProfileRequest {
    /// Parses and validates a raw JSON body, collecting every problem found.
    pub fn from_json(body: Value) -> Result<Self, AppError> {
        let request: CreateProfileRequest = serde_json::from_value(body)
            .map_err(|e| AppError::Validation(e.to_string()))?;
        request.validate()?;
        Ok(request)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        let mut problems = Vec::new();

        for (field, value) in [
            ("id", &self.id),
            ("intended_major", &self.intended_major),
            ("career_goal", &self.career_goal),
            ("country_preference", &self.country_preference),
            ("budget_range", &self.budget_range),
        ] {
            if value.trim().is_empty() {
                problems.push(format!("\"{field}\" is not allowed to be empty"));
            }
        }

        if let Some(gpa) = self.gpa {
            if !(0.0..=4.0).contains(&gpa) {
                problems.push("\"gpa\" must be between 0 and 4.0".to_string());
            }
        }

        if let Some(age) = self.age {
            if !(10..=100).contains(&age) {
                problems.push("\"age\" must be between 10 and 100".to_string());
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(problems.join(", ")))
        }
    }

    /// The request as a store patch.
    pub fn into_patch(self) -> Result<ProfilePatch, AppError> {
        match serde_json::to_value(self).map_err(|e| AppError::Internal(e.into()))? {
            Value::Object(map) => Ok(map),
            _ => Err(AppError::Internal(anyhow::anyhow!(
                "profile request did not serialize to an object"
            ))),
        }
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use serde_json::json;

    /// The canonical test student: CS, $10k-$30k, Advanced English, interested in AI.
    pub fn sample_profile(id: &str) -> StudentProfile {
        StudentProfile {
            intended_major: Some("CS".into()),
            career_goal: Some("ML Engineer".into()),
            country_preference: Some("Germany".into()),
            budget_range: Some("$10k-$30k".into()),
            english_proficiency: Some(EnglishProficiency::Advanced),
            risk_tolerance: Some(RiskTolerance::Medium),
            interests: vec!["AI".into()],
            ..StudentProfile::new(id)
        }
    }

    pub fn sample_create_body(id: &str) -> Value {
        json!({
            "id": id,
            "intended_major": "CS",
            "career_goal": "ML Engineer",
            "country_preference": "Germany",
            "budget_range": "$10k-$30k",
            "english_proficiency": "Advanced",
            "interests": ["AI"],
            "risk_tolerance": "Medium"
        })
    }

    #[test]
    fn test_new_profile_flags_start_cleared() {
        let p = StudentProfile::new("student_x");
        assert_eq!(p.question_count, 0);
        assert!(!p.questions_completed);
        assert!(!p.report_generated);
        assert!(p.last_recommendations.is_none());
    }

    #[test]
    fn test_merge_keeps_absent_fields() {
        let base = sample_profile("student_x");
        let patch: ProfilePatch = serde_json::from_value(json!({"career_goal": "Researcher"})).unwrap();
        let merged = base.merged(&patch).unwrap();
        assert_eq!(merged.career_goal.as_deref(), Some("Researcher"));
        assert_eq!(merged.intended_major.as_deref(), Some("CS"));
        assert_eq!(merged.interests, vec!["AI".to_string()]);
    }

    #[test]
    fn test_merge_replaces_arrays_wholesale() {
        let base = sample_profile("student_x");
        let patch: ProfilePatch =
            serde_json::from_value(json!({"interests": ["Robotics", "Ethics"]})).unwrap();
        let merged = base.merged(&patch).unwrap();
        assert_eq!(merged.interests, vec!["Robotics".to_string(), "Ethics".to_string()]);
    }

    #[test]
    fn test_merge_ignores_protected_keys_and_keeps_unknown() {
        let base = sample_profile("student_x");
        let patch: ProfilePatch =
            serde_json::from_value(json!({"id": "hijack", "favourite_color": "blue"})).unwrap();
        let merged = base.merged(&patch).unwrap();
        assert_eq!(merged.id, "student_x");
        assert_eq!(merged.extra.get("favourite_color"), Some(&json!("blue")));

        let round_trip: StudentProfile =
            serde_json::from_value(serde_json::to_value(&merged).unwrap()).unwrap();
        assert_eq!(round_trip, merged);
    }

    #[test]
    fn test_merge_rejects_type_mismatch() {
        let base = sample_profile("student_x");
        let patch: ProfilePatch =
            serde_json::from_value(json!({"question_count": "four"})).unwrap();
        assert!(base.merged(&patch).is_err());
    }

    #[test]
    fn test_create_request_valid() {
        let req = CreateProfileRequest::from_json(sample_create_body("student_a")).unwrap();
        assert_eq!(req.english_proficiency, EnglishProficiency::Advanced);
        let patch = req.into_patch().unwrap();
        assert_eq!(patch.get("budget_range"), Some(&json!("$10k-$30k")));
        assert!(!patch.contains_key("gpa"));
    }

    #[test]
    fn test_create_request_missing_field() {
        let mut body = sample_create_body("student_a");
        body.as_object_mut().unwrap().remove("career_goal");
        let err = CreateProfileRequest::from_json(body).unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("career_goal")));
    }

    #[test]
    fn test_create_request_bad_enum_and_range() {
        let mut body = sample_create_body("student_a");
        body["english_proficiency"] = json!("Fluent");
        assert!(CreateProfileRequest::from_json(body).is_err());

        let mut body = sample_create_body("student_a");
        body["gpa"] = json!(4.5);
        body["intended_major"] = json!("  ");
        let err = CreateProfileRequest::from_json(body).unwrap_err();
        match err {
            AppError::Validation(msg) => {
                assert!(msg.contains("gpa"));
                assert!(msg.contains("intended_major"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_create_request_rejects_unknown_fields() {
        let mut body = sample_create_body("student_a");
        body["question_count"] = json!(4);
        assert!(CreateProfileRequest::from_json(body).is_err());
    }
}
