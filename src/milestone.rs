use serde::Serialize;

use crate::models::{NewStudyEvent, Subject, SubjectId};
use crate::xp;

/// one-shot notification produced while a log is accepted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Milestone {
    LevelUp { from: u32, to: u32 },
    SubjectMastered { subject_id: SubjectId, name: String },
}

impl Milestone {
    pub fn title(&self) -> String {
        match self {
            Milestone::LevelUp { to, .. } => format!("🎉 Level Up! Level {}", to),
            Milestone::SubjectMastered { name, .. } => format!("🏆 {} mastered!", name),
        }
    }

    pub fn body(&self) -> String {
        match self {
            Milestone::LevelUp { from, to } if to - from > 1 => {
                format!("Huge session! You jumped from level {} to level {}.", from, to)
            }
            Milestone::LevelUp { from, to } => {
                format!("You climbed from level {} to level {}.", from, to)
            }
            Milestone::SubjectMastered { name, .. } => {
                format!("Every video of {} is done. On to the next one!", name)
            }
        }
    }
}

/// the store as it looked right before the event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Before {
    pub total_xp: u64,
    pub subject_videos: u64,
}

pub fn level_up(old_xp: u64, gained_xp: u64) -> Option<Milestone> {
    let from = xp::calculate_level(old_xp);
    let to = xp::calculate_level(old_xp.saturating_add(gained_xp));
    (to > from).then_some(Milestone::LevelUp { from, to })
}

/// fires only on the event that first reaches the goal
pub fn subject_mastered(subject: &Subject, prev_videos: u64, added_videos: u32) -> Option<Milestone> {
    let goal = subject.goal_video_count as u64;
    let new_videos = prev_videos + added_videos as u64;
    (goal > 0 && new_videos >= goal && prev_videos < goal).then(|| Milestone::SubjectMastered {
        subject_id: subject.id,
        name: subject.name.clone(),
    })
}

/// everything `event` unlocks, level-up first
pub fn detect(before: Before, event: &NewStudyEvent, subject: &Subject) -> Vec<Milestone> {
    let gained = xp::calculate_xp(
        event.video_count as u64,
        event.solve_count as u64,
        event.minutes as u64,
    );
    level_up(before.total_xp, gained)
        .into_iter()
        .chain(subject_mastered(subject, before.subject_videos, event.video_count))
        .collect()
}
