//! Integration tests for event-reporting operations: login bonus, topic
//! completion, daily challenge, flashcards and streak milestones

mod common;

use common::{PIN, TestEngine};
use learnforge::domain::Track;
use learnforge::error::ErrorKind;
use learnforge::progress::gamification::{BadgeId, LeaderboardPeriod};

#[test]
fn test_topic_completion_is_credited_once() {
    let t = TestEngine::new();
    let student = t.enroll("Aalam", Track::Gaming);
    let topics = t.seed_topics(Track::Gaming, 3);

    let first = t.engine.complete_topic(student.id, topics[0]).unwrap();
    assert_eq!(first.xp_earned, 50);
    assert!(!first.duplicate);
    assert_eq!(first.total_xp, 50);
    assert_eq!(first.current_streak, 1);

    let again = t.engine.complete_topic(student.id, topics[0]).unwrap();
    assert!(again.duplicate);
    assert_eq!(again.xp_earned, 0);
    assert_eq!(again.total_xp, 50);

    let progress = t.engine.get_progress(student.id).unwrap();
    assert_eq!(progress.topics_completed, 1);
    assert_eq!(progress.topics_total, 3);
}

#[test]
fn test_topic_from_another_track_is_rejected() {
    let t = TestEngine::new();
    let student = t.enroll("Adham", Track::Business);
    let gaming = t.seed_topics(Track::Gaming, 1);

    let err = t.engine.complete_topic(student.id, gaming[0]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationError);
    assert_eq!(t.engine.get_student(student.id).unwrap().total_xp, 0);
}

#[test]
fn test_login_bonus_once_per_day() {
    let t = TestEngine::new();
    t.enroll("Irfan", Track::Business);

    let first = t.engine.identify("Irfan", PIN).unwrap();
    let activity = first.activity.unwrap();
    assert_eq!(activity.xp_earned, 20);
    assert!(!first.token.is_empty());

    let second = t.engine.identify(" Irfan ", PIN).unwrap();
    assert!(second.activity.unwrap().duplicate);
    assert_ne!(first.token, second.token);

    t.next_day(1);
    let next = t.engine.identify("Irfan", PIN).unwrap().activity.unwrap();
    assert_eq!(next.xp_earned, 20);
    assert_eq!(next.total_xp, 40);
    assert_eq!(next.current_streak, 2);
}

#[test]
fn test_wrong_pin_and_unknown_name_look_the_same() {
    let t = TestEngine::new();
    t.enroll("Adnan", Track::Developer);

    let wrong_pin = t.engine.identify("Adnan", "9999").unwrap_err();
    let unknown = t.engine.identify("Nobody", PIN).unwrap_err();
    assert_eq!(wrong_pin.kind(), ErrorKind::InvalidCredential);
    assert_eq!(unknown.kind(), ErrorKind::InvalidCredential);
    assert_eq!(wrong_pin.to_string(), unknown.to_string());
}

#[test]
fn test_enrollment_rules() {
    let t = TestEngine::new();
    t.enroll("Arshad", Track::AiEnthusiast);

    let mut duplicate = learnforge::domain::NewStudent {
        name: "Arshad".to_string(),
        pin: PIN.to_string(),
        role: Default::default(),
        track: Some(Track::Gaming),
        avatar: String::new(),
        utc_offset_minutes: None,
        starting_freezes: None,
    };
    assert_eq!(t.engine.enroll(&duplicate).unwrap_err().kind(), ErrorKind::Conflict);

    duplicate.name = "Zed".to_string();
    duplicate.pin = "12a4".to_string();
    assert_eq!(
        t.engine.enroll(&duplicate).unwrap_err().kind(),
        ErrorKind::ValidationError
    );

    duplicate.pin = PIN.to_string();
    duplicate.track = None;
    assert_eq!(
        t.engine.enroll(&duplicate).unwrap_err().kind(),
        ErrorKind::ValidationError
    );

    duplicate.track = Some(Track::Gaming);
    duplicate.utc_offset_minutes = Some(60 * 24 * 365);
    assert_eq!(
        t.engine.enroll(&duplicate).unwrap_err().kind(),
        ErrorKind::ValidationError
    );
    duplicate.utc_offset_minutes = Some(-841);
    assert_eq!(
        t.engine.enroll(&duplicate).unwrap_err().kind(),
        ErrorKind::ValidationError
    );
    duplicate.utc_offset_minutes = Some(-720);
    assert_eq!(t.engine.enroll(&duplicate).unwrap().utc_offset_minutes, -720);
}

#[test]
fn test_login_again_retires_previous_token() {
    let t = TestEngine::new();
    t.enroll("Zoya", Track::Developer);
    let first = t.engine.identify("Zoya", PIN).unwrap().token;
    let second = t.engine.identify("Zoya", PIN).unwrap().token;

    assert_eq!(
        t.engine.authorize(&first).unwrap_err().kind(),
        ErrorKind::InvalidCredential
    );
    assert!(t.engine.authorize(&second).is_ok());
    assert_eq!(t.engine.sessions().len(), 1);
}

#[test]
fn test_admin_records_no_activity() {
    let t = TestEngine::new();
    let admin = t.enroll_admin("Uncle");
    let topics = t.seed_topics(Track::Gaming, 1);

    let login = t.engine.identify("Uncle", PIN).unwrap();
    assert!(login.activity.is_none());
    assert_eq!(login.student.total_xp, 0);

    let err = t.engine.complete_topic(admin.id, topics[0]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationError);

    let board = t.engine.leaderboard(Default::default()).unwrap();
    assert!(board.iter().all(|e| e.student_id != admin.id));
}

#[test]
fn test_daily_challenge_accepts_one_response() {
    let t = TestEngine::new();
    let student = t.enroll("Aalam", Track::Gaming);

    let today = t.engine.today_challenge(student.id).unwrap();
    assert!(today.response.is_none());
    let id = today.challenge.id.clone();

    let outcome = t
        .engine
        .submit_challenge(student.id, &id, "An NPC follows a behaviour tree.")
        .unwrap();
    assert_eq!(outcome.xp_earned, 100);

    let err = t
        .engine
        .submit_challenge(student.id, &id, "Second try")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(t.engine.get_student(student.id).unwrap().total_xp, 100);

    let answered = t.engine.today_challenge(student.id).unwrap();
    assert_eq!(
        answered.response.unwrap().response,
        "An NPC follows a behaviour tree."
    );
}

#[test]
fn test_challenge_for_another_day_is_not_found() {
    let t = TestEngine::new();
    let student = t.enroll("Aalam", Track::Gaming);
    let yesterday = t.engine.today_challenge(student.id).unwrap().challenge.id;

    t.next_day(1);
    let err = t
        .engine
        .submit_challenge(student.id, &yesterday, "late answer")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let blank = t.engine.submit_challenge(student.id, "whatever", "   ").unwrap_err();
    assert_eq!(blank.kind(), ErrorKind::ValidationError);
}

#[test]
fn test_flashcard_sessions_need_enough_cards() {
    let t = TestEngine::new();
    let student = t.enroll("Adnan", Track::Developer);

    let short = t.engine.record_flashcard_session(student.id, "basics", 4).unwrap();
    assert_eq!(short.xp_earned, 0);
    assert!(!short.duplicate);

    let full = t.engine.record_flashcard_session(student.id, "basics", 12).unwrap();
    assert_eq!(full.xp_earned, 30);

    let repeat = t.engine.record_flashcard_session(student.id, "basics", 15).unwrap();
    assert_eq!(repeat.xp_earned, 0);

    let other_deck = t.engine.record_flashcard_session(student.id, "prompts", 10).unwrap();
    assert_eq!(other_deck.xp_earned, 30);
    assert_eq!(other_deck.total_xp, 60);
}

#[test]
fn test_chat_turn_ids_make_retries_idempotent() {
    let t = TestEngine::new();
    let student = t.enroll("Arshad", Track::AiEnthusiast);

    let first = t.engine.record_chat_turn(student.id, Some("turn-1")).unwrap();
    assert!(!first.duplicate);
    assert_eq!(first.xp_earned, 0);
    assert!(t.engine.record_chat_turn(student.id, Some("turn-1")).unwrap().duplicate);
    assert!(!t.engine.record_chat_turn(student.id, None).unwrap().duplicate);

    let stats = t.engine.analytics(student.id).unwrap();
    assert_eq!(stats.tutor_questions, 2);
}

#[test]
fn test_seven_day_streak_pays_milestone_and_freeze() {
    let t = TestEngine::new();
    t.enroll("Adnan", Track::Developer);

    let mut last = None;
    for day in 0..7 {
        if day > 0 {
            t.next_day(1);
        }
        last = t.engine.identify("Adnan", PIN).unwrap().activity;
    }
    let last = last.unwrap();
    assert_eq!(last.current_streak, 7);
    assert_eq!(last.xp_earned, 20 + 200);
    assert_eq!(last.streak_freezes, 1);
    assert!(last.new_badges.iter().any(|b| b.id == BadgeId::WeekWarrior));

    // the freeze bridges a missed day
    t.next_day(2);
    let bridged = t.engine.identify("Adnan", PIN).unwrap().activity.unwrap();
    assert_eq!(bridged.current_streak, 8);
    assert_eq!(bridged.streak_freezes, 0);
    assert_eq!(bridged.longest_streak, 8);

    // no freeze left: the streak restarts
    t.next_day(3);
    let reset = t.engine.identify("Adnan", PIN).unwrap().activity.unwrap();
    assert_eq!(reset.current_streak, 1);
    assert_eq!(reset.longest_streak, 8);
}

#[test]
fn test_backfilled_day_replays_streak() {
    let t = TestEngine::new();
    let student = t.enroll("Adham", Track::Gaming);
    t.engine.identify("Adham", PIN).unwrap();
    t.next_day(2);
    let gap = t.engine.identify("Adham", PIN).unwrap().activity.unwrap();
    assert_eq!(gap.current_streak, 1);

    // a login stamped with the day in between arrives late
    t.clock.advance(chrono::Duration::days(-1));
    let backfill = t.engine.identify("Adham", PIN).unwrap().activity.unwrap();
    assert!(!backfill.duplicate);
    assert_eq!(backfill.current_streak, 3);
    assert_eq!(backfill.longest_streak, 3);

    let reports = t.engine.repair(Some(student.id)).unwrap();
    assert!(!reports[0].changed());
    assert_eq!(reports[0].streak_after, 3);
}

#[test]
fn test_lapsed_streak_reads_as_zero_everywhere() {
    let t = TestEngine::new();
    let student = t.enroll("Irfan", Track::Business);
    t.engine.identify("Irfan", PIN).unwrap();
    t.next_day(1);
    let login = t.engine.identify("Irfan", PIN).unwrap();
    assert_eq!(login.student.current_streak, 2);
    assert_eq!(t.engine.get_student(student.id).unwrap().current_streak, 2);

    t.next_day(10);
    let progress = t.engine.get_progress(student.id).unwrap();
    assert_eq!(progress.current_streak, 0);
    assert_eq!(progress.student.current_streak, 0);
    assert_eq!(t.engine.analytics(student.id).unwrap().current_streak, 0);
    assert_eq!(t.engine.get_student(student.id).unwrap().current_streak, 0);
    assert_eq!(t.engine.find_student("Irfan").unwrap().current_streak, 0);

    let listed = t.engine.list_students().unwrap();
    assert_eq!(listed[0].current_streak, 0);
    let board = t.engine.leaderboard(LeaderboardPeriod::All).unwrap();
    assert_eq!(board[0].current_streak, 0);
    let overview = t.engine.admin_overview().unwrap();
    assert_eq!(overview.students[0].current_streak, 0);

    // the longest streak is history and stays
    assert_eq!(progress.student.longest_streak, 2);
}

#[test]
fn test_badges_are_never_revoked() {
    let t = TestEngine::new();
    let student = t.enroll("Aalam", Track::Gaming);
    let login = t.engine.identify("Aalam", PIN).unwrap().activity.unwrap();
    assert!(login.new_badges.iter().any(|b| b.id == BadgeId::FirstSteps));

    let before = t.engine.student_badges(student.id).unwrap();
    t.engine.repair(Some(student.id)).unwrap();
    t.next_day(10);
    t.engine.identify("Aalam", PIN).unwrap();

    let after = t.engine.student_badges(student.id).unwrap();
    for badge in &before.earned {
        let kept = after.earned.iter().find(|b| b.id == badge.id).unwrap();
        assert_eq!(kept.earned_at, badge.earned_at);
    }
    assert_eq!(after.total, t.engine.list_badges().len());
}
