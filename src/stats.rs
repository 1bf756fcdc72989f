//! Chart-ready summaries of a user's study history.
//!
//! Every series is a pair of parallel vectors (`labels`, `values`) so that any
//! chart front-end can draw it without knowing how it was aggregated.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{StudyEvent, Subject, SubjectId, UserId};
use crate::xp;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub values: Vec<u64>,
}

impl ChartSeries {
    pub fn push(&mut self, label: impl Into<String>, value: u64) {
        self.labels.push(label.into());
        self.values.push(value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn max(&self) -> u64 {
        self.values.iter().copied().max().unwrap_or(0)
    }
}

/// one bucket per calendar day that has events, oldest first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DailySeries {
    pub solved: ChartSeries,
    pub videos: ChartSeries,
    pub cumulative_solved: ChartSeries,
}

/// one entry per catalog subject, ordered by code
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubjectSeries {
    pub solved: ChartSeries,
    pub goals: ChartSeries,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total_solved: u64,
    pub total_goal_questions: u64,
    pub total_xp: u64,
    pub level: u32,
    pub next_level_threshold: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatsView {
    pub daily: DailySeries,
    pub subjects: SubjectSeries,
    pub summary: Summary,
}

#[derive(Debug, Default, Clone, Copy)]
struct DayBucket {
    solved: u64,
    videos: u64,
}

pub fn daily_series(user_id: UserId, events: &[StudyEvent]) -> DailySeries {
    let mut days: BTreeMap<NaiveDate, DayBucket> = BTreeMap::new();
    for event in events.iter().filter(|e| e.user_id == user_id) {
        let bucket = days.entry(event.created_at.date()).or_default();
        bucket.solved += event.solve_count as u64;
        bucket.videos += event.video_count as u64;
    }

    let mut series = DailySeries::default();
    let mut running = 0u64;
    for (day, bucket) in days {
        let label = day.format("%Y-%m-%d").to_string();
        running += bucket.solved;
        series.solved.push(label.clone(), bucket.solved);
        series.videos.push(label.clone(), bucket.videos);
        series.cumulative_solved.push(label, running);
    }
    series
}

/// `subjects` must already be in code order, as `db::list_subjects` returns them
pub fn subject_series(user_id: UserId, subjects: &[Subject], events: &[StudyEvent]) -> SubjectSeries {
    let mut solved: HashMap<SubjectId, u64> = HashMap::new();
    for event in events.iter().filter(|e| e.user_id == user_id) {
        *solved.entry(event.subject_id).or_default() += event.solve_count as u64;
    }

    let mut series = SubjectSeries::default();
    for subject in subjects {
        series
            .solved
            .push(subject.code.clone(), solved.get(&subject.id).copied().unwrap_or(0));
        series
            .goals
            .push(subject.code.clone(), subject.goal_question_count as u64);
    }
    series
}

pub fn total_xp(user_id: UserId, events: &[StudyEvent]) -> u64 {
    events
        .iter()
        .filter(|e| e.user_id == user_id)
        .map(|e| xp::calculate_xp(e.video_count as u64, e.solve_count as u64, e.minutes as u64))
        .sum()
}

pub fn summarize(user_id: UserId, subjects: &[Subject], events: &[StudyEvent]) -> StatsView {
    let daily = daily_series(user_id, events);
    let subjects = subject_series(user_id, subjects, events);
    let total_xp = total_xp(user_id, events);
    let level = xp::calculate_level(total_xp);

    let summary = Summary {
        total_solved: subjects.solved.values.iter().sum(),
        total_goal_questions: subjects.goals.values.iter().sum(),
        total_xp,
        level,
        next_level_threshold: xp::xp_for_next_level(level),
    };

    StatsView {
        daily,
        subjects,
        summary,
    }
}
