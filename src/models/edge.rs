use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 有向关系边，按 (source_user_id, target_user_id) 唯一
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub source_user_id: i64,
    pub target_user_id: i64,
    pub interaction_weight: f64,
    pub last_interaction_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Edge {
    pub fn new(source_user_id: i64, target_user_id: i64, interaction_weight: f64) -> Self {
        let now = Utc::now();
        Self {
            source_user_id,
            target_user_id,
            interaction_weight,
            last_interaction_at: now,
            created_at: now,
        }
    }
}

/// 单个方向上的边摘要
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeSummary {
    pub interaction_weight: f64,
    pub last_interaction_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<Edge> for EdgeSummary {
    fn from(edge: Edge) -> Self {
        Self {
            interaction_weight: edge.interaction_weight,
            last_interaction_at: edge.last_interaction_at,
            created_at: edge.created_at,
        }
    }
}

/// 两个用户之间的双向关系状态
#[derive(Debug, Clone, Serialize)]
pub struct RelationshipStatus {
    pub following: bool,
    pub followed_by: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outgoing: Option<EdgeSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incoming: Option<EdgeSummary>,
}

impl RelationshipStatus {
    pub fn new(outgoing: Option<Edge>, incoming: Option<Edge>) -> Self {
        Self {
            following: outgoing.is_some(),
            followed_by: incoming.is_some(),
            outgoing: outgoing.map(EdgeSummary::from),
            incoming: incoming.map(EdgeSummary::from),
        }
    }

    pub fn is_mutual(&self) -> bool {
        self.following && self.followed_by
    }
}

/// 关注/粉丝列表的条目
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowEntry {
    pub user_id: i64,
    pub weight: f64,
    pub since: DateTime<Utc>,
    pub last_interaction_at: DateTime<Utc>,
}

impl FollowEntry {
    /// 粉丝列表条目 (边的来源侧)
    pub fn follower(edge: Edge) -> Self {
        Self {
            user_id: edge.source_user_id,
            weight: edge.interaction_weight,
            since: edge.created_at,
            last_interaction_at: edge.last_interaction_at,
        }
    }

    /// 关注列表条目 (边的目标侧)
    pub fn following(edge: Edge) -> Self {
        Self {
            user_id: edge.target_user_id,
            weight: edge.interaction_weight,
            since: edge.created_at,
            last_interaction_at: edge.last_interaction_at,
        }
    }
}
