use crate::domain::model::{GenerationResult, PostStatus, ScheduledPost};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;

pub const SCHEDULE_WINDOW_HOURS: i64 = 48;

/// 在 [0, 48) 小時內隨機挑一個整點偏移
pub fn schedule<R: Rng + ?Sized>(
    result: &GenerationResult,
    now: DateTime<Utc>,
    rng: &mut R,
) -> ScheduledPost {
    let offset_hours = rng.gen_range(0..SCHEDULE_WINDOW_HOURS);
    let scheduled_for = now + Duration::hours(offset_hours);

    tracing::info!(
        "📅 Scheduled {} for {} on {} platform(s)",
        result.id,
        scheduled_for.to_rfc3339(),
        result.target_platforms.len()
    );

    ScheduledPost {
        result: result.clone(),
        scheduled_for,
        status: PostStatus::Scheduled,
    }
}
