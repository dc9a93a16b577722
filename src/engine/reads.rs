//! Read-side operations and maintenance

use serde::Serialize;
use tracing::info;

use super::{Engine, load_student, load_topic};
use crate::domain::{DailyChallenge, LearningEvent, Student, StudentId, Topic, TopicId, Track};
use crate::error::{EngineError, EngineResult};
use crate::progress::gamification::{
    BADGES, Badge, BadgeEvaluator, DailyChallengeScheduler, EarnedBadge, LeaderboardEntry,
    LeaderboardPeriod, LeaderboardRanker, LevelProgress, StreakTracker,
};
use crate::progress::{
    AdminOverview, EventLog, HistoryBucket, ProgressQuery, StudentAnalytics, StudentStore, TopicStore, XpEntry,
    XpLedger, XpPoint,
};

/// A topic with the student's progress on it
#[derive(Debug, Clone, Serialize)]
pub struct TopicStatus {
    #[serde(flatten)]
    pub topic: Topic,
    pub completed: bool,
    pub completed_at: Option<i64>,
    pub best_quiz_score: Option<f64>,
    pub quiz_attempts: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressReport {
    pub student: Student,
    pub level: LevelProgress,
    /// Streak as of the student's today (0 once it has lapsed)
    pub current_streak: u32,
    pub topics_completed: u32,
    pub topics_total: u32,
    pub topics: Vec<TopicStatus>,
    /// Newest first
    pub recent_events: Vec<LearningEvent>,
}

const RECENT_EVENTS: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct StudentBadges {
    pub earned: Vec<EarnedBadge>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct XpLog {
    pub total_xp: u64,
    pub entries: Vec<XpEntry>,
    pub bucket: HistoryBucket,
    pub history: Vec<XpPoint>,
}

/// What `repair` changed for one student
#[derive(Debug, Clone, Serialize)]
pub struct RepairReport {
    pub student_id: StudentId,
    pub name: String,
    pub streak_before: u32,
    pub streak_after: u32,
    pub longest_before: u32,
    pub longest_after: u32,
    pub xp_before: u64,
    pub xp_after: u64,
}

impl RepairReport {
    pub fn changed(&self) -> bool {
        self.streak_before != self.streak_after
            || self.longest_before != self.longest_after
            || self.xp_before != self.xp_after
    }
}

impl Engine {
    pub fn get_student(&self, id: StudentId) -> EngineResult<Student> {
        let now = self.now();
        self.db.read(|conn| Ok(load_student(conn, id)?.settled(now)))
    }

    pub fn find_student(&self, name: &str) -> EngineResult<Student> {
        let now = self.now();
        self.db.read(|conn| {
            StudentStore::find_by_name(conn, name.trim())?
                .map(|(student, _)| student.settled(now))
                .ok_or_else(|| EngineError::not_found(format!("Student \"{}\"", name.trim())))
        })
    }

    /// Learners by XP, highest first
    pub fn list_students(&self) -> EngineResult<Vec<Student>> {
        let now = self.now();
        self.db.read(|conn| {
            Ok(StudentStore::list(conn)?
                .into_iter()
                .map(|s| s.settled(now))
                .collect())
        })
    }

    pub fn list_topics(&self, track: Track) -> EngineResult<Vec<Topic>> {
        self.db.read(|conn| Ok(TopicStore::list_by_track(conn, track)?))
    }

    pub fn get_topic(&self, id: TopicId) -> EngineResult<Topic> {
        self.db.read(|conn| load_topic(conn, id))
    }

    pub fn get_progress(&self, student_id: StudentId) -> EngineResult<ProgressReport> {
        let now = self.now();
        self.db.read(|conn| {
            let student = load_student(conn, student_id)?.settled(now);
            let topics = match student.track {
                Some(track) => TopicStore::list_by_track(conn, track)?,
                None => Vec::new(),
            };
            let progress = TopicStore::progress_for_student(conn, student_id)?;

            let topics: Vec<TopicStatus> = topics
                .into_iter()
                .map(|topic| {
                    let row = progress.iter().find(|p| p.topic_id == topic.id);
                    TopicStatus {
                        completed: row.is_some_and(|p| p.completed),
                        completed_at: row.and_then(|p| p.completed_at),
                        best_quiz_score: row.and_then(|p| p.best_quiz_score),
                        quiz_attempts: row.map(|p| p.quiz_attempts).unwrap_or(0),
                        topic,
                    }
                })
                .collect();

            Ok(ProgressReport {
                level: LevelProgress::for_xp(student.total_xp),
                current_streak: student.current_streak,
                topics_completed: topics.iter().filter(|t| t.completed).count() as u32,
                topics_total: topics.len() as u32,
                topics,
                recent_events: EventLog::recent(conn, student_id, RECENT_EVENTS)?,
                student,
            })
        })
    }

    /// Today's challenge in the student's calendar, with their response
    pub fn today_challenge(&self, student_id: StudentId) -> EngineResult<DailyChallenge> {
        let now = self.now();
        self.db.read(|conn| {
            let student = load_student(conn, student_id)?;
            let today = student.local_day(now);
            Ok(DailyChallenge {
                challenge: DailyChallengeScheduler::for_date(today),
                response: DailyChallengeScheduler::response_for(conn, student_id, today)?,
            })
        })
    }

    pub fn leaderboard(&self, period: LeaderboardPeriod) -> EngineResult<Vec<LeaderboardEntry>> {
        let now = self.now();
        let window = period.window(self.calendar_today());
        self.db.read(|conn| Ok(LeaderboardRanker::rank(conn, window, now)?))
    }

    pub fn list_badges(&self) -> &'static [Badge] {
        BADGES
    }

    pub fn student_badges(&self, student_id: StudentId) -> EngineResult<StudentBadges> {
        self.db.read(|conn| {
            load_student(conn, student_id)?;
            Ok(StudentBadges {
                earned: BadgeEvaluator::earned(conn, student_id)?,
                total: BADGES.len(),
            })
        })
    }

    pub fn xp_log(&self, student_id: StudentId, bucket: HistoryBucket) -> EngineResult<XpLog> {
        self.db.read(|conn| {
            let student = load_student(conn, student_id)?;
            let history = XpLedger::history(conn, student_id, bucket)?
                .iter()
                .map(|(date, xp)| XpPoint { date, xp })
                .collect();
            Ok(XpLog {
                total_xp: student.total_xp,
                entries: XpLedger::recent(conn, student_id, self.settings.history_limit)?,
                bucket,
                history,
            })
        })
    }

    pub fn analytics(&self, student_id: StudentId) -> EngineResult<StudentAnalytics> {
        let now = self.now();
        self.db.read(|conn| {
            let student = load_student(conn, student_id)?;
            Ok(ProgressQuery::analytics(conn, &student, student.local_day(now))?)
        })
    }

    pub fn admin_overview(&self) -> EngineResult<AdminOverview> {
        let now = self.now();
        let today = self.calendar_today();
        self.db.read(|conn| Ok(ProgressQuery::admin_overview(conn, now, today)?))
    }

    /// Rebuild cached streaks and XP totals from history, for one student
    /// or everyone. Badges are re-evaluated but never removed.
    pub fn repair(&self, student_id: Option<StudentId>) -> EngineResult<Vec<RepairReport>> {
        let at = self.now().timestamp_millis();
        let reports = self.db.write(|conn| {
            let ids = match student_id {
                Some(id) => vec![load_student(conn, id)?.id],
                None => StudentStore::all_ids(conn)?,
            };
            let mut reports = Vec::with_capacity(ids.len());
            for id in ids {
                let student = load_student(conn, id)?;
                let (cached, replayed) = StreakTracker::repair(conn, id)?;
                let (xp_before, xp_after) = XpLedger::reconcile(conn, id)?;
                if !student.is_admin() {
                    BadgeEvaluator::refresh(conn, id, at)?;
                }
                reports.push(RepairReport {
                    student_id: id,
                    name: student.name,
                    streak_before: cached.current,
                    streak_after: replayed.current,
                    longest_before: cached.longest,
                    longest_after: replayed.longest,
                    xp_before,
                    xp_after,
                });
            }
            Ok::<_, EngineError>(reports)
        })?;

        for report in reports.iter().filter(|r| r.changed()) {
            info!(
                "[learnforge:repair] {}: streak {} -> {}, xp {} -> {}",
                report.name,
                report.streak_before,
                report.streak_after,
                report.xp_before,
                report.xp_after
            );
        }
        Ok(reports)
    }
}
