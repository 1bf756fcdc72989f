const XP_PER_VIDEO: u64 = 10;
const XP_PER_SOLVE: u64 = 5;
const XP_PER_MINUTE: u64 = 2;
const XP_PER_LEVEL: u64 = 500;

pub fn calculate_xp(video_count: u64, solve_count: u64, minutes: u64) -> u64 {
    video_count * XP_PER_VIDEO + solve_count * XP_PER_SOLVE + minutes * XP_PER_MINUTE
}

/// saturates at u32::MAX so the level never wraps
pub fn calculate_level(total_xp: u64) -> u32 {
    u32::try_from(total_xp / XP_PER_LEVEL)
        .unwrap_or(u32::MAX)
        .saturating_add(1)
}

/// xp at which the next level begins, not the xp still missing
pub fn xp_for_next_level(level: u32) -> u64 {
    level as u64 * XP_PER_LEVEL
}

/// 0.0..1.0 progress within current level
pub fn level_progress(total_xp: u64) -> f32 {
    let xp_in_level = total_xp % XP_PER_LEVEL;
    xp_in_level as f32 / XP_PER_LEVEL as f32
}
