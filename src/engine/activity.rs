//! Event-reporting operations: login, topic completion, daily challenge,
//! tutor chat turns and flashcard sessions

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use super::auth::{Session, pin_digest, validate_pin};
use super::{Engine, load_student, load_topic};
use crate::domain::{
    ChallengeResponse, EventKind, NewEvent, NewStudent, Role, Student, StudentId, Topic, TopicId,
};
use crate::error::{EngineError, EngineResult};
use crate::progress::gamification::{BadgeEvaluator, DailyChallengeScheduler, EarnedBadge, StreakTracker};
use crate::progress::ledger::{CHALLENGE_XP, XpLedger, XpSource};
use crate::progress::time_bucket::{day_bucket, local_hour};
use crate::progress::{EventLog, StudentRecord, StudentStore, TopicStore};

const MAX_NAME_CHARS: usize = 40;
const MAX_RESPONSE_CHARS: usize = 5000;
/// Widest real-world UTC offsets are -12:00 and +14:00
const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;
/// Cards a flashcard session must cover to earn XP
pub const MIN_FLASHCARD_CARDS: u32 = 10;

/// Result of any event-reporting call
#[derive(Debug, Clone, Serialize)]
pub struct ActivityOutcome {
    /// XP credited by this call, streak bonuses included
    pub xp_earned: u64,
    pub total_xp: u64,
    pub level: String,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub streak_freezes: u32,
    pub new_badges: Vec<EarnedBadge>,
    /// The event had already been recorded; nothing changed
    pub duplicate: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginOutcome {
    pub token: String,
    pub student: Student,
    /// Daily login effects; None for admins
    pub activity: Option<ActivityOutcome>,
}

/// One scoring-relevant occurrence
pub(super) struct Activity {
    pub kind: EventKind,
    pub source_key: String,
    pub payload: serde_json::Value,
    pub award: Option<XpSource>,
}

fn snapshot(
    conn: &Connection,
    student_id: StudentId,
    xp_earned: u64,
    new_badges: Vec<EarnedBadge>,
    duplicate: bool,
    now: DateTime<Utc>,
) -> EngineResult<ActivityOutcome> {
    let student = load_student(conn, student_id)?;
    Ok(ActivityOutcome {
        xp_earned,
        total_xp: student.total_xp,
        current_streak: student.streak_as_of(now),
        level: student.level,
        longest_streak: student.longest_streak,
        streak_freezes: student.streak_freezes,
        new_badges,
        duplicate,
    })
}

/// Append the event and apply its consequences. Must run inside a write
/// transaction.
pub(super) fn record_activity(
    conn: &Connection,
    student: &Student,
    activity: Activity,
    now: DateTime<Utc>,
) -> EngineResult<ActivityOutcome> {
    let at = now.timestamp_millis();
    let day = student.local_day(now);
    let event = NewEvent {
        student_id: student.id,
        kind: activity.kind,
        source_key: activity.source_key,
        payload: activity.payload,
        occurred_at: at,
        day,
        hour: local_hour(at, student.utc_offset_minutes),
    };

    if EventLog::append(conn, &event)?.is_none() {
        debug!(
            "[learnforge:engine] duplicate {} for student {}",
            event.source_key, student.id
        );
        return snapshot(conn, student.id, 0, Vec::new(), true, now);
    }

    let mut xp_earned = 0;
    if let Some(source) = &activity.award {
        xp_earned += XpLedger::award(conn, student.id, source, at, day)?.awarded;
    }

    let streak = StreakTracker::record_activity(conn, student.id, day)?;
    if let Some(days) = streak.reached() {
        let milestone = XpSource::StreakMilestone { days, day };
        if milestone.amount() > 0 {
            let bonus = XpLedger::award(conn, student.id, &milestone, at, day)?.awarded;
            if bonus > 0 {
                info!(
                    "[learnforge:streak] student {} reached a {}-day streak (+{} XP)",
                    student.id, days, bonus
                );
            }
            xp_earned += bonus;
        }
    }
    if streak.freeze_earned {
        debug!("[learnforge:streak] student {} earned a freeze", student.id);
    }

    let new_badges = BadgeEvaluator::refresh(conn, student.id, at)?;
    snapshot(conn, student.id, xp_earned, new_badges, false, now)
}

/// Students only work on topics of their own track
pub(super) fn ensure_on_track(student: &Student, topic: &Topic) -> EngineResult<()> {
    if student.track != Some(topic.track) {
        return Err(EngineError::validation(format!(
            "topic {} belongs to the {} track",
            topic.id, topic.track
        )));
    }
    Ok(())
}

fn ensure_learner(student: &Student) -> EngineResult<()> {
    if student.is_admin() {
        return Err(EngineError::validation("admins do not record learning activity"));
    }
    Ok(())
}

impl Engine {
    /// Create a student or admin account
    pub fn enroll(&self, new: &NewStudent) -> EngineResult<Student> {
        let name = new.name.trim();
        if name.is_empty() || name.chars().count() > MAX_NAME_CHARS {
            return Err(EngineError::validation(format!(
                "name must be 1-{MAX_NAME_CHARS} characters"
            )));
        }
        validate_pin(&new.pin)?;
        let track = match (new.role, new.track) {
            (Role::Student, None) => {
                return Err(EngineError::validation("students need a track"));
            }
            (Role::Student, track) => track,
            (Role::Admin, _) => None,
        };
        let utc_offset_minutes = new
            .utc_offset_minutes
            .unwrap_or(self.settings.default_utc_offset_minutes);
        if utc_offset_minutes.abs() > MAX_UTC_OFFSET_MINUTES {
            return Err(EngineError::validation(format!(
                "UTC offset must be within ±{MAX_UTC_OFFSET_MINUTES} minutes"
            )));
        }
        let digest = pin_digest(name, &new.pin);
        let record = StudentRecord {
            name,
            pin_digest: &digest,
            role: new.role,
            track,
            avatar: new.avatar.trim(),
            utc_offset_minutes,
            starting_freezes: new.starting_freezes.unwrap_or(self.settings.starting_freezes),
            created_at: self.now().timestamp_millis(),
        };

        let student = self.db.write(|conn| {
            let id = StudentStore::insert(conn, &record)?
                .ok_or_else(|| EngineError::conflict(format!("name \"{name}\" is taken")))?;
            load_student(conn, id)
        })?;
        info!(
            "[learnforge:engine] enrolled {} ({}) as #{}",
            student.name,
            student.role.as_str(),
            student.id
        );
        Ok(student)
    }

    /// Validate a name/PIN pair and open a session. The first login of a
    /// calendar day counts as activity and earns the daily bonus.
    pub fn identify(&self, name: &str, pin: &str) -> EngineResult<LoginOutcome> {
        let now = self.now();
        let (student, activity) = self.db.write(|conn| {
            let Some((student, digest)) = StudentStore::find_by_name(conn, name.trim())? else {
                return Err(EngineError::InvalidCredential);
            };
            if digest != pin_digest(&student.name, pin) {
                return Err(EngineError::InvalidCredential);
            }
            if student.is_admin() {
                return Ok((student, None));
            }

            let day = student.local_day(now);
            let activity = record_activity(
                conn,
                &student,
                Activity {
                    kind: EventKind::Login,
                    source_key: format!("login:{}", day_bucket(day)),
                    payload: serde_json::json!({}),
                    award: Some(XpSource::DailyLogin(day)),
                },
                now,
            )?;
            Ok((load_student(conn, student.id)?, Some(activity)))
        })?;
        let student = student.settled(now);

        let token = self.sessions.issue(Session {
            student_id: student.id,
            role: student.role,
        });
        info!("[learnforge:engine] {} logged in", student.name);
        Ok(LoginOutcome {
            token,
            student,
            activity,
        })
    }

    /// Mark a topic complete. Completing it again is a no-op reported as a
    /// duplicate.
    pub fn complete_topic(&self, student_id: StudentId, topic_id: TopicId) -> EngineResult<ActivityOutcome> {
        let now = self.now();
        self.db.write(|conn| {
            let student = load_student(conn, student_id)?;
            ensure_learner(&student)?;
            let topic = load_topic(conn, topic_id)?;
            ensure_on_track(&student, &topic)?;

            if !TopicStore::mark_completed(conn, student_id, topic_id, now.timestamp_millis())? {
                return snapshot(conn, student_id, 0, Vec::new(), true, now);
            }

            record_activity(
                conn,
                &student,
                Activity {
                    kind: EventKind::TopicCompleted,
                    source_key: format!("topic:{topic_id}"),
                    payload: serde_json::json!({ "topic_id": topic_id, "title": topic.title }),
                    award: Some(XpSource::TopicCompleted(topic_id)),
                },
                now,
            )
        })
    }

    /// Answer today's challenge. At most one response per student per day.
    pub fn submit_challenge(
        &self,
        student_id: StudentId,
        challenge_id: &str,
        response: &str,
    ) -> EngineResult<ActivityOutcome> {
        let response = response.trim();
        if response.is_empty() {
            return Err(EngineError::validation("response is empty"));
        }
        if response.chars().count() > MAX_RESPONSE_CHARS {
            return Err(EngineError::validation(format!(
                "response is longer than {MAX_RESPONSE_CHARS} characters"
            )));
        }

        let now = self.now();
        self.db.write(|conn| {
            let student = load_student(conn, student_id)?;
            ensure_learner(&student)?;
            let today = student.local_day(now);
            let date = DailyChallengeScheduler::parse_id(challenge_id)
                .filter(|d| *d == today)
                .ok_or_else(|| EngineError::not_found(format!("Challenge {challenge_id}")))?;

            let challenge = DailyChallengeScheduler::for_date(date);
            let stored = ChallengeResponse {
                student_id,
                challenge_id: challenge.id.clone(),
                date,
                response: response.to_string(),
                completed: true,
                xp_earned: CHALLENGE_XP,
                submitted_at: now.timestamp_millis(),
            };
            if !DailyChallengeScheduler::record(conn, &challenge, &stored)? {
                return Err(EngineError::conflict(format!(
                    "challenge for {} already answered",
                    day_bucket(date)
                )));
            }

            record_activity(
                conn,
                &student,
                Activity {
                    kind: EventKind::ChallengeSubmitted,
                    source_key: format!("challenge:{}", day_bucket(date)),
                    payload: serde_json::json!({
                        "challenge_id": challenge.id,
                        "kind": challenge.kind,
                        "boss": challenge.boss,
                    }),
                    award: Some(XpSource::Challenge(date)),
                },
                now,
            )
        })
    }

    /// Count one question asked to the tutor. `turn_id` lets the caller make
    /// retries idempotent; without it every call counts.
    pub fn record_chat_turn(&self, student_id: StudentId, turn_id: Option<&str>) -> EngineResult<ActivityOutcome> {
        let key = match turn_id.map(str::trim) {
            Some("") => return Err(EngineError::validation("turn id is empty")),
            Some(id) => id.to_string(),
            None => Uuid::new_v4().to_string(),
        };
        let now = self.now();
        self.db.write(|conn| {
            let student = load_student(conn, student_id)?;
            ensure_learner(&student)?;
            record_activity(
                conn,
                &student,
                Activity {
                    kind: EventKind::ChatTurn,
                    source_key: format!("chat:{key}"),
                    payload: serde_json::json!({}),
                    award: None,
                },
                now,
            )
        })
    }

    /// Record a flashcard review session. A session covering at least
    /// [`MIN_FLASHCARD_CARDS`] cards earns XP once per deck per day.
    pub fn record_flashcard_session(
        &self,
        student_id: StudentId,
        deck: &str,
        cards_reviewed: u32,
    ) -> EngineResult<ActivityOutcome> {
        let deck = deck.trim();
        if deck.is_empty() {
            return Err(EngineError::validation("deck is empty"));
        }
        let now = self.now();
        self.db.write(|conn| {
            let student = load_student(conn, student_id)?;
            ensure_learner(&student)?;
            let day = student.local_day(now);
            let award = (cards_reviewed >= MIN_FLASHCARD_CARDS).then(|| XpSource::Flashcards {
                deck: deck.to_string(),
                day,
            });
            record_activity(
                conn,
                &student,
                Activity {
                    kind: EventKind::FlashcardSession,
                    source_key: format!("flashcards:{}", Uuid::new_v4()),
                    payload: serde_json::json!({ "deck": deck, "cards_reviewed": cards_reviewed }),
                    award,
                },
                now,
            )
        })
    }
}
