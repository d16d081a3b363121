//! The fixed static intake form asked before any AI question.

use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    Text,
    /// Comma-separated free text, stored as a list.
    List,
    Number { min: f64, max: f64 },
    Select(&'static [&'static str]),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StaticQuestion {
    pub key: &'static str,
    pub label: &'static str,
    pub placeholder: &'static str,
    pub kind: FieldKind,
    pub min_len: usize,
    pub max_len: usize,
}

/// An inline, per-field validation problem.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{field}: {message}")]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub const EDUCATION_LEVELS: &[&str] = &[
    "High School",
    "Undergraduate",
    "Postgraduate",
    "Working Professional",
];
pub const ENGLISH_LEVELS: &[&str] = &["Native", "Advanced", "Intermediate", "Beginner"];
pub const BUDGET_RANGES: &[&str] = &["Less than $10k", "$10k - $30k", "$30k - $50k", "$50k+"];
pub const RISK_LEVELS: &[&str] = &["Low", "Medium", "High"];

const fn text(key: &'static str, label: &'static str, placeholder: &'static str) -> StaticQuestion {
    StaticQuestion {
        key,
        label,
        placeholder,
        kind: FieldKind::Text,
        min_len: 2,
        max_len: 100,
    }
}

const fn select(key: &'static str, label: &'static str, options: &'static [&'static str]) -> StaticQuestion {
    StaticQuestion {
        key,
        label,
        placeholder: "",
        kind: FieldKind::Select(options),
        min_len: 0,
        max_len: 0,
    }
}

pub const STATIC_QUESTIONS: &[StaticQuestion] = &[
    text("name", "Full Name", "e.g. Alex Johnson"),
    StaticQuestion {
        key: "age",
        label: "Age",
        placeholder: "e.g. 18",
        kind: FieldKind::Number {
            min: 10.0,
            max: 100.0,
        },
        min_len: 0,
        max_len: 0,
    },
    select("education_level", "Current Education Level", EDUCATION_LEVELS),
    select("english_proficiency", "English Proficiency", ENGLISH_LEVELS),
    text("intended_major", "Preferred Major", "e.g. Computer Science"),
    StaticQuestion {
        key: "interests",
        label: "Specific Interests (comma separated)",
        placeholder: "e.g. AI, Robotics, Ethics",
        kind: FieldKind::List,
        min_len: 2,
        max_len: 200,
    },
    text(
        "country_preference",
        "Preferred Countries (comma separated)",
        "e.g. USA, Germany",
    ),
    text("career_goal", "Dream Career / Goal", "e.g. AI Researcher"),
    select("budget_range", "Annual Budget", BUDGET_RANGES),
    select("risk_tolerance", "Risk Tolerance", RISK_LEVELS),
];

impl StaticQuestion {
    /// Validates raw input and converts it to the JSON value stored on the profile.
    pub fn parse(&self, raw: &str) -> Result<Value, FieldError> {
        let input = raw.trim();
        match self.kind {
            FieldKind::Text => {
                self.check_length(input)?;
                Ok(Value::String(input.to_string()))
            }
            FieldKind::List => {
                self.check_length(input)?;
                let items: Vec<Value> = input
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(|s| Value::String(s.to_string()))
                    .collect();
                if items.is_empty() {
                    return Err(FieldError::new(self.key, "enter at least one item"));
                }
                Ok(Value::Array(items))
            }
            FieldKind::Number { min, max } => {
                let n: f64 = input
                    .parse()
                    .map_err(|_| FieldError::new(self.key, "must be a number"))?;
                if !(min..=max).contains(&n) || n.fract() != 0.0 {
                    return Err(FieldError::new(
                        self.key,
                        format!("must be a whole number between {min} and {max}"),
                    ));
                }
                Ok(Value::from(n as u64))
            }
            FieldKind::Select(options) => options
                .iter()
                .find(|o| o.eq_ignore_ascii_case(input))
                .or_else(|| {
                    // Allow picking by 1-based position.
                    input
                        .parse::<usize>()
                        .ok()
                        .and_then(|i| i.checked_sub(1))
                        .and_then(|i| options.get(i))
                })
                .map(|o| Value::String(o.to_string()))
                .ok_or_else(|| {
                    FieldError::new(self.key, format!("choose one of: {}", options.join(", ")))
                }),
        }
    }

    fn check_length(&self, input: &str) -> Result<(), FieldError> {
        let len = input.chars().count();
        if len < self.min_len {
            return Err(FieldError::new(
                self.key,
                format!("must be at least {} characters", self.min_len),
            ));
        }
        if len > self.max_len {
            return Err(FieldError::new(
                self.key,
                format!("must be at most {} characters", self.max_len),
            ));
        }
        Ok(())
    }
}

/// Builds the create-profile body from collected static answers.
pub fn profile_body(id: &str, answers: &Map<String, Value>) -> Value {
    let mut body = answers.clone();
    body.insert("id".to_string(), Value::String(id.to_string()));
    Value::Object(body)
}
