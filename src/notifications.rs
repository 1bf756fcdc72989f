use crate::milestone::Milestone;

pub fn notify_milestone(milestone: &Milestone) {
    let timeout = match milestone {
        Milestone::LevelUp { .. } => 8000,
        Milestone::SubjectMastered { .. } => 10000,
    };

    if let Err(e) = notify_rust::Notification::new()
        .summary(&milestone.title())
        .body(&milestone.body())
        .appname("Study Quest")
        .timeout(timeout)
        .show()
    {
        tracing::warn!(error = %e, "failed to send milestone notification");
    }
}

pub fn notify_study_logged(gained_xp: u64) {
    if let Err(e) = notify_rust::Notification::new()
        .summary("📚 Study logged!")
        .body(&format!("Nice work! +{} XP", gained_xp))
        .appname("Study Quest")
        .timeout(5000)
        .show()
    {
        tracing::warn!(error = %e, "failed to send notification");
    }
}

/// desktop delivery of everything a log produced
pub fn deliver(gained_xp: u64, milestones: &[Milestone]) {
    if milestones.is_empty() {
        notify_study_logged(gained_xp);
    }
    for milestone in milestones {
        notify_milestone(milestone);
    }
}
