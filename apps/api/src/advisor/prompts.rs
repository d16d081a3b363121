// Prompt Builder: LLM prompt templates for the advisor flow.
// Builders are pure; output schema compliance is requested, never checked here.

use serde::Serialize;

use crate::advisor::models::UniversityRecommendation;
use crate::llm_client::prompts::STRICT_JSON_RULE;
use crate::profile::models::StudentProfile;

/// Follow-up question prompt. Replace `{profile_json}` and `{strict_json}`.
pub const NEXT_QUESTION_TEMPLATE: &str = r#"You are an expert academic advisor and career counselor.
**Goal:** Ask ONE high-impact question to clarify the student's academic path or preferences.

**Student Profile:**
{profile_json}

**Constraints:**
- Ask only ONE question.
- Keep it short (max 1-2 lines).
- Focus on career clarity, specific skills, or learning style.
- Avoid repetitive cost questions if budget is already set.
- Do not repeat a question already answered in additional_info.
{strict_json}

**Output JSON:**
{
  "question": "The question string",
  "reason": "Brief reason why this helps"
}"#;

/// Recommendation prompt. Replace `{profile_json}` and `{strict_json}`.
pub const RECOMMENDATION_TEMPLATE: &str = r#"You are a senior academic decision engine.
**Goal:** Generate 3 top university/major recommendations based on the profile.

**Profile:**
{profile_json}

**Formatting Rules:**
- Use **bullet points** only (no paragraphs).
- **Bold** key insights.
- Keep answers concise and actionable.
{strict_json}

**Output JSON Structure:**
{
  "summary": "Brief executive summary (bullet points preferred).",
  "recommendations": [
    {
      "country": "Country",
      "university": "University Name",
      "major": "Major",
      "ranking": "Global Ranking (e.g. #45)",
      "tuition_fees": "Approx Tuition (e.g. $20k/year)",
      "why_this_choice": "Short bullet points with **bold** highlights.",
      "risk_flags": ["Risk 1", "Risk 2"],
      "admission_probability": "High/Medium/Low"
    }
  ],
  "top_scholarships": [
    {
      "name": "Scholarship Name",
      "amount": "Amount",
      "deadline": "Deadline",
      "eligibility": "Criteria (brief)"
    }
  ],
  "risks": ["General risk 1"],
  "alternatives": ["Alternative path 1"]
}"#;

/// Roadmap prompt. Replace `{target_json}`, `{profile_json}` and `{strict_json}`.
pub const ROADMAP_TEMPLATE: &str = r#"**Goal:** Create a detailed 12-18 month academic roadmap.
**Target:** {target_json}

**Student Profile:**
{profile_json}

**Rules:**
- Divide into structured phases (e.g., Immediate, Short-term, Long-term).
- **Highlight costs** in bold (e.g. "**$150 USD**").
- Use bullet points for actions.
{strict_json}

**Output JSON Structure:**
{
  "roadmap": [
    {
      "phase": "Phase Name (e.g. Month 1-3: Foundation)",
      "description": "Short description of this phase.",
      "actions": ["Action 1 (bold important parts)", "Action 2"],
      "exams": ["IELTS", "SAT"],
      "skills_to_learn": ["Skill 1", "Skill 2"],
      "cost_estimate": "Estimated cost (e.g. **$500 USD**)",
      "timeline": "Month X-Y"
    }
  ]
}"#;

const GENERAL_PATH: &str = "General Path";

fn pretty<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

/// Substitutes `{name}` placeholders in one pass over the template, so
/// substituted text is never scanned for further placeholders.
fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    'scan: while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 1..];
        for (name, value) in vars {
            if let Some(after) = tail.strip_prefix(name).and_then(|t| t.strip_prefix('}')) {
                out.push_str(value);
                rest = after;
                continue 'scan;
            }
        }
        out.push('{');
        rest = tail;
    }
    out.push_str(rest);
    out
}

fn fill(template: &str, profile: &StudentProfile) -> String {
    let profile_json = pretty(profile);
    render(
        template,
        &[
            ("strict_json", STRICT_JSON_RULE),
            ("profile_json", profile_json.as_str()),
        ],
    )
}

pub fn next_question_prompt(profile: &StudentProfile) -> String {
    fill(NEXT_QUESTION_TEMPLATE, profile)
}

pub fn recommendation_prompt(profile: &StudentProfile) -> String {
    fill(RECOMMENDATION_TEMPLATE, profile)
}

/// Targets the first recommendation, or a general path when the list is empty.
pub fn roadmap_prompt(
    profile: &StudentProfile,
    recommendations: &[UniversityRecommendation],
) -> String {
    let target = match recommendations.first() {
        Some(top) => serde_json::to_string(top).unwrap_or_else(|_| pretty(&GENERAL_PATH)),
        None => pretty(&GENERAL_PATH),
    };
    let profile_json = pretty(profile);
    render(
        ROADMAP_TEMPLATE,
        &[
            ("strict_json", STRICT_JSON_RULE),
            ("target_json", target.as_str()),
            ("profile_json", profile_json.as_str()),
        ],
    )
}
