use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 二度连接推荐结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestedConnection {
    pub user_id: i64,
    /// 所有连接路径的权重之和
    pub score: f64,
    /// 连接路径上最近一次交互时间
    pub last_interaction_at: DateTime<Utc>,
}
