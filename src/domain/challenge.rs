use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::student::StudentId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeKind {
    Quiz,
    Explain,
    Apply,
    Debate,
}

impl ChallengeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Quiz => "quiz",
            Self::Explain => "explain",
            Self::Apply => "apply",
            Self::Debate => "debate",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "quiz" => Some(Self::Quiz),
            "explain" => Some(Self::Explain),
            "apply" => Some(Self::Apply),
            "debate" => Some(Self::Debate),
            _ => None,
        }
    }
}

/// The challenge published for one calendar date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Challenge {
    /// `ch-YYYY-MM-DD`
    pub id: String,
    pub date: NaiveDate,
    pub kind: ChallengeKind,
    pub boss: bool,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeResponse {
    pub student_id: StudentId,
    pub challenge_id: String,
    pub date: NaiveDate,
    pub response: String,
    pub completed: bool,
    pub xp_earned: u64,
    pub submitted_at: i64,
}

/// Today's challenge together with the student's response, if any
#[derive(Debug, Clone, Serialize)]
pub struct DailyChallenge {
    pub challenge: Challenge,
    pub response: Option<ChallengeResponse>,
}
