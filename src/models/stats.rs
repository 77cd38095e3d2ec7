use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 按用户缓存的聚合统计，可随时由边集合重建
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphStats {
    pub user_id: i64,
    pub follower_count: i64,
    pub following_count: i64,
    pub refreshed_at: DateTime<Utc>,
}
