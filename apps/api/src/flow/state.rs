//! Flow state machine: where a profile stands in the advisor conversation.
//!
//! The state is derived from the counters and flags stored on the profile,
//! computed once per request and handed to the guards below.

use crate::advisor::models::UniversityRecommendation;
use crate::errors::AppError;
use crate::profile::models::StudentProfile;

/// Dynamic questions asked before recommendations unlock.
pub const QUESTION_BUDGET: u32 = 4;

/// Progresses linearly: New → Collecting → QuestionsDone → Recommended → Roadmapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    /// Static intake stored, no dynamic question asked yet.
    New,
    Collecting { asked: u32 },
    QuestionsDone,
    Recommended,
    Roadmapped,
}

impl FlowState {
    pub fn of(profile: &StudentProfile) -> Self {
        if profile.report_generated {
            Self::Roadmapped
        } else if profile.last_recommendations.is_some() {
            Self::Recommended
        } else if profile.questions_completed || profile.question_count >= QUESTION_BUDGET {
            Self::QuestionsDone
        } else if profile.question_count == 0 {
            Self::New
        } else {
            Self::Collecting {
                asked: profile.question_count,
            }
        }
    }

    /// Whether the dynamic question phase is over.
    pub fn questions_complete(&self) -> bool {
        !matches!(self, Self::New | Self::Collecting { .. })
    }
}

impl std::fmt::Display for FlowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::New => write!(f, "new"),
            Self::Collecting { asked } => write!(f, "collecting({asked}/{QUESTION_BUDGET})"),
            Self::QuestionsDone => write!(f, "questions_done"),
            Self::Recommended => write!(f, "recommended"),
            Self::Roadmapped => write!(f, "roadmapped"),
        }
    }
}

/// Recommendations stay locked until the question phase is over.
pub fn require_questions_complete(state: FlowState) -> Result<(), AppError> {
    if state.questions_complete() {
        Ok(())
    } else {
        Err(AppError::PreconditionFailed(
            "You must complete the questionnaire first.".to_string(),
        ))
    }
}

/// The recommendations a roadmap should target: the stored set first, then
/// whatever the caller supplied. Empty lists count as missing.
pub fn require_recommendations(
    profile: &StudentProfile,
    supplied: Option<Vec<UniversityRecommendation>>,
) -> Result<Vec<UniversityRecommendation>, AppError> {
    profile
        .last_recommendations
        .clone()
        .filter(|recs| !recs.is_empty())
        .or_else(|| supplied.filter(|recs| !recs.is_empty()))
        .ok_or_else(|| {
            AppError::BadRequest(
                "No recommendations found. Generate recommendations first.".to_string(),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::models::tests::sample_profile;

    fn rec(name: &str) -> UniversityRecommendation {
        UniversityRecommendation {
            university: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_state_derivation() {
        let mut p = sample_profile("s");
        assert_eq!(FlowState::of(&p), FlowState::New);

        p.question_count = 2;
        assert_eq!(FlowState::of(&p), FlowState::Collecting { asked: 2 });

        p.question_count = QUESTION_BUDGET;
        assert_eq!(FlowState::of(&p), FlowState::QuestionsDone);

        p.last_recommendations = Some(vec![rec("ETH")]);
        assert_eq!(FlowState::of(&p), FlowState::Recommended);

        p.report_generated = true;
        assert_eq!(FlowState::of(&p), FlowState::Roadmapped);
    }

    #[test]
    fn test_completion_flag_ends_collection_early() {
        let mut p = sample_profile("s");
        p.question_count = 1;
        p.questions_completed = true;
        assert_eq!(FlowState::of(&p), FlowState::QuestionsDone);
        assert!(require_questions_complete(FlowState::of(&p)).is_ok());
    }

    #[test]
    fn test_recommend_guard_blocks_every_unmet_count() {
        for count in 0..QUESTION_BUDGET {
            let mut p = sample_profile("s");
            p.question_count = count;
            p.questions_completed = false;
            let err = require_questions_complete(FlowState::of(&p)).unwrap_err();
            assert!(
                matches!(err, AppError::PreconditionFailed(_)),
                "count {count} should be blocked"
            );
        }
    }

    #[test]
    fn test_roadmap_guard_prefers_stored() {
        let mut p = sample_profile("s");
        p.last_recommendations = Some(vec![rec("Stored")]);
        let recs = require_recommendations(&p, Some(vec![rec("Supplied")])).unwrap();
        assert_eq!(recs[0].university, "Stored");
    }

    #[test]
    fn test_roadmap_guard_falls_back_to_supplied() {
        let mut p = sample_profile("s");
        p.last_recommendations = Some(vec![]);
        let recs = require_recommendations(&p, Some(vec![rec("Supplied")])).unwrap();
        assert_eq!(recs[0].university, "Supplied");
    }

    #[test]
    fn test_roadmap_guard_rejects_missing() {
        let p = sample_profile("s");
        assert!(matches!(
            require_recommendations(&p, None),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            require_recommendations(&p, Some(vec![])),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(FlowState::Collecting { asked: 3 }.to_string(), "collecting(3/4)");
        assert_eq!(FlowState::Roadmapped.to_string(), "roadmapped");
    }
}
