use std::collections::HashMap;

use serde::Serialize;

use crate::models::{StudyEvent, Subject, SubjectId, UserId};

/// one row of the record view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubjectProgress {
    pub subject_id: SubjectId,
    pub name: String,
    pub code: String,
    pub current_video_count: u64,
    pub goal_video_count: u32,
    pub progress_percent: u8,
    pub current_question_count: u64,
    pub goal_question_count: u32,
    pub image: Option<String>,
}

/// floor(current / goal * 100) clamped to 0..=100, 0 when there is no goal
pub fn progress_percent(current: u64, goal: u32) -> u8 {
    if goal == 0 {
        return 0;
    }
    let percent = current.saturating_mul(100) / goal as u64;
    percent.min(100) as u8
}

#[derive(Debug, Default, Clone, Copy)]
struct SubjectSums {
    videos: u64,
    questions: u64,
}

/// per-subject progress for `user_id`, one entry per catalog subject in catalog order
pub fn subject_progress(
    user_id: UserId,
    subjects: &[Subject],
    events: &[StudyEvent],
) -> Vec<SubjectProgress> {
    let mut sums: HashMap<SubjectId, SubjectSums> = HashMap::new();
    for event in events.iter().filter(|e| e.user_id == user_id) {
        let entry = sums.entry(event.subject_id).or_default();
        entry.videos += event.video_count as u64;
        entry.questions += event.solve_count as u64;
    }

    subjects
        .iter()
        .map(|subject| {
            let sums = sums.get(&subject.id).copied().unwrap_or_default();
            SubjectProgress {
                subject_id: subject.id,
                name: subject.name.clone(),
                code: subject.code.clone(),
                current_video_count: sums.videos,
                goal_video_count: subject.goal_video_count,
                progress_percent: progress_percent(sums.videos, subject.goal_video_count),
                current_question_count: sums.questions,
                goal_question_count: subject.goal_question_count,
                image: subject.image.clone(),
            }
        })
        .collect()
}
