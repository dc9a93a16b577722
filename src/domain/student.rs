use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::progress::gamification::StreakState;
use crate::progress::time_bucket;

pub type StudentId = i64;

/// Curriculum path a student is enrolled in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Track {
    Gaming,
    Business,
    Developer,
    AiEnthusiast,
}

impl Track {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gaming => "gaming",
            Self::Business => "business",
            Self::Developer => "developer",
            Self::AiEnthusiast => "ai_enthusiast",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "gaming" => Some(Self::Gaming),
            "business" => Some(Self::Business),
            "developer" => Some(Self::Developer),
            "ai_enthusiast" => Some(Self::AiEnthusiast),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Gaming => "Gaming",
            Self::Business => "Business",
            Self::Developer => "Developer",
            Self::AiEnthusiast => "AI Enthusiast",
        }
    }

    pub fn all() -> &'static [Track] {
        &[Self::Gaming, Self::Business, Self::Developer, Self::AiEnthusiast]
    }
}

impl std::fmt::Display for Track {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Student,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Admin => "admin",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "student" => Some(Self::Student),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

/// A learner (or supervisor) as seen by callers.
///
/// `total_xp`, `level` and the streak fields are derived state. They are
/// written only by the engine and can always be rebuilt from the ledger and
/// the event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub name: String,
    pub role: Role,
    /// None for admins
    pub track: Option<Track>,
    pub avatar: String,
    pub total_xp: u64,
    pub level: String,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub streak_freezes: u32,
    pub last_active_day: Option<NaiveDate>,
    /// Offset applied to UTC instants to get the student's calendar day
    pub utc_offset_minutes: i32,
    /// Enrollment time (ms since epoch)
    pub created_at: i64,
}

impl Student {
    /// The student's calendar day at a given instant
    pub fn local_day(&self, at: DateTime<Utc>) -> NaiveDate {
        time_bucket::local_day(at.timestamp_millis(), self.utc_offset_minutes)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn streak_state(&self) -> StreakState {
        StreakState {
            current: self.current_streak,
            longest: self.longest_streak,
            freezes: self.streak_freezes,
            last_day: self.last_active_day,
        }
    }

    /// Streak on the student's calendar day at `now`. The stored value only
    /// moves on activity, so a lapsed streak still reads as its old length
    /// until this is applied.
    pub fn streak_as_of(&self, now: DateTime<Utc>) -> u32 {
        self.streak_state().current_as_of(self.local_day(now))
    }

    /// The same student with `current_streak` brought up to `now`
    pub fn settled(mut self, now: DateTime<Utc>) -> Self {
        self.current_streak = self.streak_as_of(now);
        self
    }
}

/// Enrollment request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStudent {
    pub name: String,
    pub pin: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub track: Option<Track>,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub utc_offset_minutes: Option<i32>,
    #[serde(default)]
    pub starting_freezes: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_track_roundtrip_strings() {
        for track in Track::all() {
            assert_eq!(Track::from_str(track.as_str()), Some(*track));
        }
        assert_eq!(Track::from_str("admin"), None);
    }

    #[test]
    fn test_local_day_uses_offset() {
        let student = Student {
            id: 1,
            name: "Aalam".to_string(),
            role: Role::Student,
            track: Some(Track::Gaming),
            avatar: String::new(),
            total_xp: 0,
            level: "Explorer".to_string(),
            current_streak: 0,
            longest_streak: 0,
            streak_freezes: 0,
            last_active_day: None,
            utc_offset_minutes: 330,
            created_at: 0,
        };
        // 20:00 UTC is already the next day at +05:30
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 20, 0, 0).unwrap();
        assert_eq!(
            student.local_day(at),
            NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
        );
    }

    #[test]
    fn test_settled_streak_lapses() {
        let student = Student {
            id: 2,
            name: "Zoya".to_string(),
            role: Role::Student,
            track: Some(Track::Developer),
            avatar: String::new(),
            total_xp: 40,
            level: "Explorer".to_string(),
            current_streak: 2,
            longest_streak: 2,
            streak_freezes: 0,
            last_active_day: NaiveDate::from_ymd_opt(2026, 3, 2),
            utc_offset_minutes: 0,
            created_at: 0,
        };
        let next_day = Utc.with_ymd_and_hms(2026, 3, 3, 12, 0, 0).unwrap();
        assert_eq!(student.streak_as_of(next_day), 2);

        let later = Utc.with_ymd_and_hms(2026, 3, 12, 12, 0, 0).unwrap();
        let settled = student.settled(later);
        assert_eq!(settled.current_streak, 0);
        assert_eq!(settled.longest_streak, 2);
    }
}
