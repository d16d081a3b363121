//! Plain-text rendering of questionnaire results for the terminal.

use std::fmt::Write;

use crate::advisor::models::{RecommendationSet, RoadmapPlan};
use crate::client::flow::{FlowResults, Phase};

pub const SERVICE_BUSY_MESSAGE: &str = "Our AI advisor is handling too many requests right now. \
Your answers are saved; please try again in a few minutes.";

/// Renders a terminal phase. Non-terminal phases render as an empty string.
pub fn render_phase(phase: &Phase) -> String {
    match phase {
        Phase::Results(results) => render_results(results),
        Phase::ServiceBusy => format!("Service busy\n\n{SERVICE_BUSY_MESSAGE}\n"),
        Phase::Failed(message) => {
            format!("Something went wrong generating your report.\n\n{message}\n")
        }
        _ => String::new(),
    }
}

pub fn render_results(results: &FlowResults) -> String {
    let mut out = String::new();
    render_recommendations(&mut out, &results.recommendations);
    render_roadmap(&mut out, &results.roadmap);
    out
}

fn render_recommendations(out: &mut String, set: &RecommendationSet) {
    heading(out, "Your Study Abroad Report");
    if !set.summary.is_empty() {
        let _ = writeln!(out, "{}\n", set.summary);
    }

    heading(out, "Recommended Universities");
    let recommendations = set.recommendations.as_deref().unwrap_or_default();
    if recommendations.is_empty() {
        let _ = writeln!(out, "No recommendations available.\n");
    }
    for (i, rec) in recommendations.iter().enumerate() {
        let _ = writeln!(out, "{}. {} ({})", i + 1, rec.university, rec.country);
        field(out, "Major", &rec.major);
        field(out, "Ranking", &rec.ranking);
        field(out, "Tuition", &rec.tuition_fees);
        field(out, "Admission chance", &rec.admission_probability);
        field(out, "Why", &rec.why_this_choice);
        for flag in &rec.risk_flags {
            let _ = writeln!(out, "   ! {flag}");
        }
        out.push('\n');
    }

    if !set.top_scholarships.is_empty() {
        heading(out, "Scholarships");
        for s in &set.top_scholarships {
            let _ = writeln!(out, "- {}", s.name);
            field(out, "Amount", &s.amount);
            field(out, "Deadline", &s.deadline);
            field(out, "Eligibility", &s.eligibility);
        }
        out.push('\n');
    }

    bullets(out, "Risks", &set.risks);
    bullets(out, "Alternatives", &set.alternatives);
}

fn render_roadmap(out: &mut String, plan: &RoadmapPlan) {
    heading(out, "Roadmap");
    if plan.roadmap.is_empty() {
        let _ = writeln!(out, "No roadmap available.");
        return;
    }
    for phase in &plan.roadmap {
        let title = if phase.timeline.is_empty() {
            phase.phase.clone()
        } else {
            format!("{} [{}]", phase.phase, phase.timeline)
        };
        let _ = writeln!(out, "* {title}");
        field(out, "", &phase.description);
        for action in &phase.actions {
            let _ = writeln!(out, "   - {action}");
        }
        if !phase.exams.is_empty() {
            field(out, "Exams", &phase.exams.join(", "));
        }
        if !phase.skills_to_learn.is_empty() {
            field(out, "Skills", &phase.skills_to_learn.join(", "));
        }
        field(out, "Cost", &phase.cost_estimate);
        out.push('\n');
    }
}

fn heading(out: &mut String, title: &str) {
    let _ = writeln!(out, "{title}\n{}", "=".repeat(title.len()));
}

/// Writes an indented `label: value` line; skipped when the value is empty.
fn field(out: &mut String, label: &str, value: &str) {
    if value.is_empty() {
        return;
    }
    if label.is_empty() {
        let _ = writeln!(out, "   {value}");
    } else {
        let _ = writeln!(out, "   {label}: {value}");
    }
}

fn bullets(out: &mut String, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    heading(out, title);
    for item in items {
        let _ = writeln!(out, "- {item}");
    }
    out.push('\n');
}
