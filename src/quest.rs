//! Write and read paths of the study log.
//!
//! Every entry point takes the logged-in user explicitly; aggregates are
//! always recomputed from the stored events.

use chrono::NaiveDateTime;
use rusqlite::{Connection, TransactionBehavior};
use serde::Serialize;

use crate::auth::AuthenticatedUser;
use crate::db;
use crate::error::{Error, Field, Result, ValidationErrors};
use crate::form::StudyLogForm;
use crate::milestone::{self, Before, Milestone};
use crate::progress::{self, SubjectProgress};
use crate::stats::{self, StatsView};
use crate::xp;

/// what a successful log hands back to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordOutcome {
    pub event_id: i64,
    pub gained_xp: u64,
    pub milestones: Vec<Milestone>,
    pub total_xp: u64,
    pub level: u32,
    pub next_level_threshold: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordView {
    pub username: String,
    pub subjects: Vec<SubjectProgress>,
    pub total_xp: u64,
    pub level: u32,
    pub next_level_threshold: u64,
}

/// validate, detect milestones against the pre-insert totals, then append the event
///
/// The snapshot reads and the insert share one immediate transaction, so two
/// concurrent logs by the same user cannot both see the same "before" totals.
/// `now` is clamped to the newest stored timestamp to keep insertion order.
pub fn record_study(
    conn: &mut Connection,
    user: &AuthenticatedUser,
    form: &StudyLogForm,
    now: NaiveDateTime,
) -> Result<RecordOutcome> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let catalog = db::list_subjects(&tx)?;
    let event = form.validate(&catalog).map_err(Error::Validation)?;
    let Some(subject) = catalog.iter().find(|s| s.id == event.subject_id) else {
        let mut errors = ValidationErrors::default();
        errors.push(Field::Subject, "unknown subject");
        return Err(Error::Validation(errors));
    };

    let totals = db::user_totals(&tx, user.id())?;
    let old_xp = xp::calculate_xp(totals.video_count, totals.solve_count, totals.minutes);
    let before = Before {
        total_xp: old_xp,
        subject_videos: db::subject_video_total(&tx, user.id(), subject.id)?,
    };
    let milestones = milestone::detect(before, &event, subject);

    let created_at = match db::latest_event_time(&tx)? {
        Some(latest) if latest > now => latest,
        _ => now,
    };
    let stored = db::insert_event(&tx, user.id(), &event, created_at)?;
    tx.commit()?;

    let gained_xp = xp::calculate_xp(
        event.video_count as u64,
        event.solve_count as u64,
        event.minutes as u64,
    );
    let total_xp = old_xp.saturating_add(gained_xp);
    let level = xp::calculate_level(total_xp);

    tracing::info!(
        user = %user.username(),
        subject = %subject.code,
        gained_xp,
        total_xp,
        milestones = milestones.len(),
        "study logged"
    );

    Ok(RecordOutcome {
        event_id: stored.id,
        gained_xp,
        milestones,
        total_xp,
        level,
        next_level_threshold: xp::xp_for_next_level(level),
    })
}

/// every subject with the user's progress plus the XP header
pub fn record_view(conn: &Connection, user: &AuthenticatedUser) -> Result<RecordView> {
    let subjects = db::list_subjects(conn)?;
    let events = db::events_for_user(conn, user.id())?;
    let total_xp = stats::total_xp(user.id(), &events);
    let level = xp::calculate_level(total_xp);

    Ok(RecordView {
        username: user.username().to_string(),
        subjects: progress::subject_progress(user.id(), &subjects, &events),
        total_xp,
        level,
        next_level_threshold: xp::xp_for_next_level(level),
    })
}

pub fn stats_view(conn: &Connection, user: &AuthenticatedUser) -> Result<StatsView> {
    let subjects = db::list_subjects(conn)?;
    let events = db::events_for_user(conn, user.id())?;
    Ok(stats::summarize(user.id(), &subjects, &events))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth;
    use crate::db::tests::{at, in_memory_db, insert_subject, sample_subject};

    struct Fixture {
        conn: Connection,
        alice: AuthenticatedUser,
        bob: AuthenticatedUser,
    }

    fn fixture() -> Fixture {
        let conn = in_memory_db();
        db::insert_user(&conn, "alice").unwrap();
        db::insert_user(&conn, "bob").unwrap();
        insert_subject(&conn, &sample_subject("ANA", 10, 100)).unwrap();
        insert_subject(&conn, &sample_subject("PHY", 0, 40)).unwrap();
        let alice = auth::login(&conn, "alice").unwrap();
        let bob = auth::login(&conn, "bob").unwrap();
        Fixture { conn, alice, bob }
    }

    fn form(subject: &str, videos: u32, solves: u32, minutes: u32) -> StudyLogForm {
        StudyLogForm {
            subject: subject.to_string(),
            material: "QA".to_string(),
            video_count: videos.to_string(),
            solve_count: solves.to_string(),
            minutes: minutes.to_string(),
        }
    }

    #[test]
    fn records_xp_and_level() {
        let mut f = fixture();
        let outcome = record_study(&mut f.conn, &f.alice, &form("ANA", 3, 2, 10), at(19, 9)).unwrap();
        assert_eq!(outcome.gained_xp, 60);
        assert_eq!(outcome.total_xp, 60);
        assert_eq!(outcome.level, 1);
        assert_eq!(outcome.next_level_threshold, 500);
        assert!(outcome.milestones.is_empty());
    }

    #[test]
    fn level_up_across_logs() {
        let mut f = fixture();
        // 48 minutes = 96 xp, five logs = 480 xp
        for hour in 0..5 {
            record_study(&mut f.conn, &f.alice, &form("PHY", 0, 0, 48), at(18, hour)).unwrap();
        }
        // 8 problems = 40 xp, crosses 500
        let outcome = record_study(&mut f.conn, &f.alice, &form("PHY", 0, 8, 0), at(19, 9)).unwrap();
        assert_eq!(outcome.milestones, vec![Milestone::LevelUp { from: 1, to: 2 }]);
        assert_eq!(outcome.total_xp, 520);
        assert_eq!(outcome.next_level_threshold, 1000);
    }

    #[test]
    fn mastery_fires_once_per_user() {
        let mut f = fixture();
        let first = record_study(&mut f.conn, &f.alice, &form("ANA", 6, 0, 0), at(18, 9)).unwrap();
        assert!(first.milestones.is_empty());

        let second = record_study(&mut f.conn, &f.alice, &form("ANA", 5, 0, 0), at(18, 10)).unwrap();
        assert!(matches!(
            second.milestones.as_slice(),
            [Milestone::SubjectMastered { name, .. }] if name == "Subject ANA"
        ));

        let third = record_study(&mut f.conn, &f.alice, &form("ANA", 5, 0, 0), at(18, 11)).unwrap();
        assert!(third.milestones.is_empty());

        // bob's history is his own
        let bobs = record_study(&mut f.conn, &f.bob, &form("ANA", 10, 0, 0), at(18, 12)).unwrap();
        assert_eq!(bobs.milestones.len(), 1);
    }

    #[test]
    fn invalid_form_writes_nothing() {
        let mut f = fixture();
        let mut bad = form("ANA", 1, 1, 1);
        bad.video_count = "-3".to_string();
        let err = record_study(&mut f.conn, &f.alice, &bad, at(19, 9)).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let unknown = form("BIO", 1, 1, 1);
        assert!(matches!(
            record_study(&mut f.conn, &f.alice, &unknown, at(19, 9)),
            Err(Error::Validation(_))
        ));
        assert!(db::events_for_user(&f.conn, f.alice.id()).unwrap().is_empty());
    }

    #[test]
    fn timestamps_never_go_backwards() {
        let mut f = fixture();
        record_study(&mut f.conn, &f.alice, &form("ANA", 1, 0, 0), at(19, 12)).unwrap();
        record_study(&mut f.conn, &f.alice, &form("ANA", 1, 0, 0), at(19, 8)).unwrap();
        let events = db::events_for_user(&f.conn, f.alice.id()).unwrap();
        assert_eq!(events[1].created_at, at(19, 12));
    }

    #[test]
    fn record_view_lists_every_subject() {
        let mut f = fixture();
        record_study(&mut f.conn, &f.alice, &form("ANA", 4, 0, 0), at(19, 9)).unwrap();
        record_study(&mut f.conn, &f.bob, &form("ANA", 9, 0, 0), at(19, 9)).unwrap();

        let view = record_view(&f.conn, &f.alice).unwrap();
        assert_eq!(view.username, "alice");
        assert_eq!(view.subjects.len(), 2);
        assert_eq!(view.subjects[0].current_video_count, 4);
        assert_eq!(view.subjects[0].progress_percent, 40);
        assert_eq!(view.subjects[1].progress_percent, 0);
        assert_eq!(view.total_xp, 40);
        assert_eq!(view, record_view(&f.conn, &f.alice).unwrap());
    }

    #[test]
    fn stats_view_is_isolated() {
        let mut f = fixture();
        record_study(&mut f.conn, &f.alice, &form("ANA", 0, 3, 0), at(18, 9)).unwrap();
        record_study(&mut f.conn, &f.alice, &form("PHY", 0, 5, 0), at(19, 9)).unwrap();
        record_study(&mut f.conn, &f.bob, &form("PHY", 0, 50, 0), at(19, 9)).unwrap();

        let view = stats_view(&f.conn, &f.alice).unwrap();
        assert_eq!(view.daily.cumulative_solved.values, vec![3, 8]);
        assert_eq!(view.subjects.solved.values, vec![3, 5]);
        assert_eq!(view.summary.total_solved, 8);
        assert_eq!(view.summary.total_goal_questions, 140);
        assert_eq!(view.summary.total_xp, 40);
    }
}
