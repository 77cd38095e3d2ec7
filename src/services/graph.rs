use crate::{
    error::{AppError, Result},
    models::edge::{Edge, RelationshipStatus},
    models::stats::GraphStats,
    models::suggestion::SuggestedConnection,
    services::Database,
};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

const EDGE_FIELDS: &str =
    "source_user_id, target_user_id, interaction_weight, last_interaction_at, created_at";

/// 社交图谱边存储服务
///
/// 所有操作都是单文档原子操作; 顺序对唯一性约束的并发竞争是安全的,
/// 失败一方观察到的约束冲突被映射为幂等成功。
#[derive(Clone)]
pub struct GraphService {
    db: Arc<Database>,
}

impl GraphService {
    pub async fn new(db: Arc<Database>) -> Result<Self> {
        Ok(Self { db })
    }

    /// 初始化边集合的表结构和索引集合
    ///
    /// 一次性管理操作, 在部署/启动时执行, 不在请求路径上。
    /// 四种访问模式各有专用索引: 出边、入边、按源的权重排序、按时间。
    pub async fn ensure_schema(&self) -> Result<()> {
        info!("Ensuring graph schema and indexes");

        self.db
            .query(
                r#"
                DEFINE TABLE edge SCHEMAFULL;
                DEFINE FIELD source_user_id ON edge TYPE int ASSERT $value > 0;
                DEFINE FIELD target_user_id ON edge TYPE int ASSERT $value > 0;
                DEFINE FIELD interaction_weight ON edge TYPE number ASSERT $value >= 0;
                DEFINE FIELD last_interaction_at ON edge TYPE string;
                DEFINE FIELD created_at ON edge TYPE string;
                DEFINE INDEX edge_pair_unique ON TABLE edge COLUMNS source_user_id, target_user_id UNIQUE;
                DEFINE INDEX edge_source ON TABLE edge COLUMNS source_user_id;
                DEFINE INDEX edge_target ON TABLE edge COLUMNS target_user_id;
                DEFINE INDEX edge_source_weight ON TABLE edge COLUMNS source_user_id, interaction_weight;
                DEFINE INDEX edge_recency ON TABLE edge COLUMNS last_interaction_at;
                DEFINE TABLE graph_stats SCHEMAFULL;
                DEFINE FIELD user_id ON graph_stats TYPE int;
                DEFINE FIELD follower_count ON graph_stats TYPE int;
                DEFINE FIELD following_count ON graph_stats TYPE int;
                DEFINE FIELD refreshed_at ON graph_stats TYPE string;
                DEFINE TABLE counter SCHEMAFULL;
                DEFINE FIELD value ON counter TYPE int;
                "#,
            )
            .await?
            .check()?;

        Ok(())
    }

    /// 建立 source → target 的关注边
    ///
    /// 不做存在性预检查, 直接插入并依赖唯一索引仲裁并发:
    /// 约束冲突表示边已存在, 按幂等成功处理, 返回 false。
    pub async fn create_edge(&self, source_user_id: i64, target_user_id: i64) -> Result<bool> {
        debug!("User {} following user {}", source_user_id, target_user_id);
        Self::validate_pair(source_user_id, target_user_id)?;

        let edge = Edge::new(source_user_id, target_user_id, 0.0);
        let id = Uuid::new_v4().to_string();

        match self.db.create::<Edge>("edge", &id, edge).await {
            Ok(_) => {
                info!("User {} followed user {}", source_user_id, target_user_id);
                self.refresh_stats_pair(source_user_id, target_user_id).await;
                Ok(true)
            }
            Err(err) if err.is_constraint_violation() => {
                debug!(
                    "Edge {} -> {} already exists",
                    source_user_id, target_user_id
                );
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    /// 删除 source → target 的边; 边不存在时是无操作, 不算错误
    pub async fn delete_edge(&self, source_user_id: i64, target_user_id: i64) -> Result<bool> {
        debug!("User {} unfollowing user {}", source_user_id, target_user_id);
        Self::validate_pair(source_user_id, target_user_id)?;

        let mut response = self
            .db
            .query_with_params(
                r#"
                DELETE edge
                WHERE source_user_id = $source AND target_user_id = $target
                RETURN BEFORE
                "#,
                json!({
                    "source": source_user_id,
                    "target": target_user_id
                }),
            )
            .await?;
        let removed: Vec<Edge> = response.take(0)?;

        if removed.is_empty() {
            return Ok(false);
        }

        info!("User {} unfollowed user {}", source_user_id, target_user_id);
        self.refresh_stats_pair(source_user_id, target_user_id).await;
        Ok(true)
    }

    /// 出边列表 (关注的人), 按权重降序、建立时间降序分页
    pub async fn list_outgoing(
        &self,
        source_user_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Edge>> {
        debug!("Listing outgoing edges for user {}", source_user_id);
        Self::validate_user(source_user_id)?;
        let limit = limit.clamp(1, self.db.config.max_page_size);
        let offset = offset.max(0);

        let query = format!(
            r#"
            SELECT {EDGE_FIELDS}
            FROM edge
            WHERE source_user_id = $source
            ORDER BY interaction_weight DESC, created_at DESC
            LIMIT $limit
            START $offset
            "#
        );

        let mut response = self
            .db
            .query_with_params(
                &query,
                json!({
                    "source": source_user_id,
                    "limit": limit,
                    "offset": offset
                }),
            )
            .await?;
        let edges: Vec<Edge> = response.take(0)?;

        Ok(edges)
    }

    /// 入边列表 (粉丝), 与出边对称
    pub async fn list_incoming(
        &self,
        target_user_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Edge>> {
        debug!("Listing incoming edges for user {}", target_user_id);
        Self::validate_user(target_user_id)?;
        let limit = limit.clamp(1, self.db.config.max_page_size);
        let offset = offset.max(0);

        let query = format!(
            r#"
            SELECT {EDGE_FIELDS}
            FROM edge
            WHERE target_user_id = $target
            ORDER BY interaction_weight DESC, created_at DESC
            LIMIT $limit
            START $offset
            "#
        );

        let mut response = self
            .db
            .query_with_params(
                &query,
                json!({
                    "target": target_user_id,
                    "limit": limit,
                    "offset": offset
                }),
            )
            .await?;
        let edges: Vec<Edge> = response.take(0)?;

        Ok(edges)
    }

    /// 两个用户之间双向的关系状态
    pub async fn get_relationship(&self, a: i64, b: i64) -> Result<RelationshipStatus> {
        debug!("Getting relationship between {} and {}", a, b);
        Self::validate_user(a)?;
        Self::validate_user(b)?;

        let query = format!(
            r#"
            SELECT {EDGE_FIELDS} FROM edge WHERE source_user_id = $a AND target_user_id = $b;
            SELECT {EDGE_FIELDS} FROM edge WHERE source_user_id = $b AND target_user_id = $a;
            "#
        );

        let mut response = self
            .db
            .query_with_params(&query, json!({ "a": a, "b": b }))
            .await?;
        let outgoing: Vec<Edge> = response.take(0)?;
        let incoming: Vec<Edge> = response.take(1)?;

        Ok(RelationshipStatus::new(
            outgoing.into_iter().next(),
            incoming.into_iter().next(),
        ))
    }

    /// 共同关注: 同时出现在两个用户出边目标集合中的用户, 按ID升序
    pub async fn list_mutual(&self, a: i64, b: i64, limit: usize) -> Result<Vec<i64>> {
        debug!("Getting mutual connections between {} and {}", a, b);
        Self::validate_user(a)?;
        Self::validate_user(b)?;

        let mut response = self
            .db
            .query_with_params(
                r#"
                SELECT VALUE target_user_id FROM edge WHERE source_user_id = $a;
                SELECT VALUE target_user_id FROM edge WHERE source_user_id = $b;
                "#,
                json!({ "a": a, "b": b }),
            )
            .await?;
        let a_targets: Vec<i64> = response.take(0)?;
        let b_targets: Vec<i64> = response.take(1)?;

        let mut mutual = intersect(&a_targets, &b_targets);
        mutual.truncate(limit);
        Ok(mutual)
    }

    /// 记录一次交互: 原子地累加权重并刷新交互时间
    ///
    /// 边不存在时补建 (有交互意味着至少存在弱关系);
    /// 补建输掉并发竞争时回退到累加路径。
    pub async fn record_interaction(
        &self,
        source_user_id: i64,
        target_user_id: i64,
        delta: f64,
    ) -> Result<Edge> {
        debug!(
            "Recording interaction {} -> {} (delta {})",
            source_user_id, target_user_id, delta
        );
        Self::validate_pair(source_user_id, target_user_id)?;
        Self::validate_delta(delta)?;

        if let Some(edge) = self
            .increment_weight(source_user_id, target_user_id, delta)
            .await?
        {
            return Ok(edge);
        }

        let edge = Edge::new(source_user_id, target_user_id, delta);
        let id = Uuid::new_v4().to_string();

        match self.db.create::<Edge>("edge", &id, edge).await {
            Ok(created) => {
                self.refresh_stats_pair(source_user_id, target_user_id).await;
                Ok(created)
            }
            Err(err) if err.is_constraint_violation() => self
                .increment_weight(source_user_id, target_user_id, delta)
                .await?
                .ok_or_else(|| {
                    AppError::Internal("Edge disappeared during interaction upsert".to_string())
                }),
            Err(err) => Err(err),
        }
    }

    async fn increment_weight(
        &self,
        source_user_id: i64,
        target_user_id: i64,
        delta: f64,
    ) -> Result<Option<Edge>> {
        let mut response = self
            .db
            .query_with_params(
                r#"
                UPDATE edge
                SET interaction_weight += $delta, last_interaction_at = $now
                WHERE source_user_id = $source AND target_user_id = $target
                RETURN AFTER
                "#,
                json!({
                    "source": source_user_id,
                    "target": target_user_id,
                    "delta": delta,
                    "now": Utc::now()
                }),
            )
            .await?;
        let updated: Vec<Edge> = response.take(0)?;

        Ok(updated.into_iter().next())
    }

    /// 二度连接推荐
    ///
    /// 候选是出边目标的出边目标, 排除自己和任一方向上已直连的用户。
    /// 高出度节点的组合爆炸用可配置的扇出上限约束:
    /// 一度边取权重最高的前 N 条, 二度扫描不超过 N² 条。
    pub async fn suggest_connections(
        &self,
        user_id: i64,
        limit: usize,
    ) -> Result<Vec<SuggestedConnection>> {
        debug!("Generating connection suggestions for user {}", user_id);
        Self::validate_user(user_id)?;

        let limit = limit.clamp(1, self.db.config.suggestion_max_limit);
        let fanout = self.db.config.suggestion_fanout_limit.max(1);

        let firsts = self.list_outgoing(user_id, fanout as i64, 0).await?;
        if firsts.is_empty() {
            return Ok(Vec::new());
        }

        // 排除集合必须覆盖完整的直连关系, 不受扇出截断影响
        let mut response = self
            .db
            .query_with_params(
                r#"
                SELECT VALUE target_user_id FROM edge WHERE source_user_id = $user;
                SELECT VALUE source_user_id FROM edge WHERE target_user_id = $user;
                "#,
                json!({ "user": user_id }),
            )
            .await?;
        let direct: Vec<i64> = response.take(0)?;
        let inbound: Vec<i64> = response.take(1)?;

        let first_ids: Vec<i64> = firsts.iter().map(|e| e.target_user_id).collect();
        let scan_limit = (fanout * fanout) as i64;

        let query = format!(
            r#"
            SELECT {EDGE_FIELDS}
            FROM edge
            WHERE source_user_id IN $sources
            ORDER BY interaction_weight DESC
            LIMIT $limit
            "#
        );

        let mut response = self
            .db
            .query_with_params(
                &query,
                json!({
                    "sources": first_ids,
                    "limit": scan_limit
                }),
            )
            .await?;
        let seconds: Vec<Edge> = response.take(0)?;

        Ok(rank_candidates(
            user_id, &firsts, &seconds, &direct, &inbound, limit,
        ))
    }

    /// 用户的聚合统计, 优先读缓存, 未命中时实时计数
    pub async fn get_stats(&self, user_id: i64) -> Result<GraphStats> {
        debug!("Getting graph stats for user {}", user_id);
        Self::validate_user(user_id)?;

        let mut response = self
            .db
            .query_with_params(
                r#"
                SELECT user_id, follower_count, following_count, refreshed_at
                FROM type::thing('graph_stats', $user)
                "#,
                json!({ "user": user_id }),
            )
            .await?;
        let cached: Vec<GraphStats> = response.take(0)?;

        if let Some(stats) = cached.into_iter().next() {
            return Ok(stats);
        }

        self.compute_stats(user_id).await
    }

    async fn compute_stats(&self, user_id: i64) -> Result<GraphStats> {
        let mut response = self
            .db
            .query_with_params(
                r#"
                SELECT count() AS count FROM edge WHERE target_user_id = $user GROUP ALL;
                SELECT count() AS count FROM edge WHERE source_user_id = $user GROUP ALL;
                "#,
                json!({ "user": user_id }),
            )
            .await?;
        let follower_rows: Vec<Value> = response.take(0)?;
        let following_rows: Vec<Value> = response.take(1)?;

        let follower_count = follower_rows
            .first()
            .and_then(|v| v.get("count"))
            .and_then(|v| v.as_i64())
            .unwrap_or(0);
        let following_count = following_rows
            .first()
            .and_then(|v| v.get("count"))
            .and_then(|v| v.as_i64())
            .unwrap_or(0);

        Ok(GraphStats {
            user_id,
            follower_count,
            following_count,
            refreshed_at: Utc::now(),
        })
    }

    /// 重写缓存的聚合记录; 缓存是派生数据, 失败只记警告不影响写路径
    async fn refresh_stats(&self, user_id: i64) -> Result<()> {
        let stats = self.compute_stats(user_id).await?;

        self.db
            .query_with_params(
                r#"
                UPDATE type::thing('graph_stats', $user) CONTENT {
                    user_id: $user,
                    follower_count: $followers,
                    following_count: $following,
                    refreshed_at: $now
                }
                "#,
                json!({
                    "user": user_id,
                    "followers": stats.follower_count,
                    "following": stats.following_count,
                    "now": stats.refreshed_at
                }),
            )
            .await?
            .check()?;

        Ok(())
    }

    async fn refresh_stats_pair(&self, source_user_id: i64, target_user_id: i64) {
        for user_id in [source_user_id, target_user_id] {
            if let Err(e) = self.refresh_stats(user_id).await {
                warn!("Failed to refresh graph stats for user {}: {}", user_id, e);
            }
        }
    }

    fn validate_user(user_id: i64) -> Result<()> {
        if user_id <= 0 {
            return Err(AppError::Validation(format!(
                "Invalid user id: {}",
                user_id
            )));
        }
        Ok(())
    }

    fn validate_pair(source_user_id: i64, target_user_id: i64) -> Result<()> {
        Self::validate_user(source_user_id)?;
        Self::validate_user(target_user_id)?;
        if source_user_id == target_user_id {
            return Err(AppError::Validation(
                "Cannot create a relationship with yourself".to_string(),
            ));
        }
        Ok(())
    }

    fn validate_delta(delta: f64) -> Result<()> {
        if !delta.is_finite() || delta <= 0.0 {
            return Err(AppError::Validation(format!(
                "Interaction delta must be a positive number, got {}",
                delta
            )));
        }
        Ok(())
    }
}

/// 两个目标集合的交集, 按ID升序保证确定性
fn intersect(a: &[i64], b: &[i64]) -> Vec<i64> {
    let b_set: HashSet<i64> = b.iter().copied().collect();
    let mut mutual: Vec<i64> = a.iter().copied().filter(|id| b_set.contains(id)).collect();
    mutual.sort_unstable();
    mutual.dedup();
    mutual
}

/// 对二度候选打分排序
///
/// 每条连接路径的权重 = 一度边权重 + 二度边权重; 候选得分是其所有
/// 路径权重之和, 新近度取路径上最近的交互时间。
/// 排序: 得分降序 → 新近度降序 → 候选ID升序。
fn rank_candidates(
    user_id: i64,
    firsts: &[Edge],
    seconds: &[Edge],
    direct: &[i64],
    inbound: &[i64],
    limit: usize,
) -> Vec<SuggestedConnection> {
    let first_by_target: HashMap<i64, &Edge> =
        firsts.iter().map(|e| (e.target_user_id, e)).collect();
    let excluded: HashSet<i64> = direct.iter().chain(inbound.iter()).copied().collect();

    let mut candidates: HashMap<i64, (f64, DateTime<Utc>)> = HashMap::new();
    for second in seconds {
        let candidate = second.target_user_id;
        if candidate == user_id || excluded.contains(&candidate) {
            continue;
        }
        let first = match first_by_target.get(&second.source_user_id) {
            Some(first) => first,
            None => continue,
        };

        let path_weight = first.interaction_weight + second.interaction_weight;
        let path_last = first.last_interaction_at.max(second.last_interaction_at);

        let entry = candidates
            .entry(candidate)
            .or_insert((0.0, path_last));
        entry.0 += path_weight;
        entry.1 = entry.1.max(path_last);
    }

    let mut ranked: Vec<SuggestedConnection> = candidates
        .into_iter()
        .map(|(user_id, (score, last_interaction_at))| SuggestedConnection {
            user_id,
            score,
            last_interaction_at,
        })
        .collect();

    ranked.sort_by(|x, y| {
        y.score
            .partial_cmp(&x.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| y.last_interaction_at.cmp(&x.last_interaction_at))
            .then_with(|| x.user_id.cmp(&y.user_id))
    });
    ranked.truncate(limit);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use proptest::prelude::*;

    async fn test_service() -> GraphService {
        let config = Config::default();
        let db = Arc::new(Database::new(&config).await.expect("in-memory database"));
        let service = GraphService::new(db).await.expect("graph service");
        service.ensure_schema().await.expect("graph schema");
        service
    }

    #[tokio::test]
    async fn follow_then_relationship_is_visible() {
        let service = test_service().await;

        assert!(service.create_edge(1, 2).await.unwrap());

        let relationship = service.get_relationship(1, 2).await.unwrap();
        assert!(relationship.following);
        assert!(!relationship.followed_by);
        assert!(!relationship.is_mutual());

        let reverse = service.get_relationship(2, 1).await.unwrap();
        assert!(!reverse.following);
        assert!(reverse.followed_by);
    }

    #[tokio::test]
    async fn create_edge_is_idempotent() {
        let service = test_service().await;

        assert!(service.create_edge(1, 2).await.unwrap());
        // 第二次是无操作的成功, 不是错误
        assert!(!service.create_edge(1, 2).await.unwrap());

        let outgoing = service.list_outgoing(1, 10, 0).await.unwrap();
        assert_eq!(outgoing.len(), 1);
        assert_eq!(outgoing[0].target_user_id, 2);
    }

    #[tokio::test]
    async fn delete_edge_is_idempotent() {
        let service = test_service().await;

        assert!(!service.delete_edge(1, 2).await.unwrap());

        service.create_edge(1, 2).await.unwrap();
        assert!(service.delete_edge(1, 2).await.unwrap());
        assert!(!service.delete_edge(1, 2).await.unwrap());

        let relationship = service.get_relationship(1, 2).await.unwrap();
        assert!(!relationship.following);
    }

    #[tokio::test]
    async fn self_edge_is_rejected() {
        let service = test_service().await;

        let err = service.create_edge(5, 5).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = service.record_interaction(5, 5, 1.0).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn invalid_ids_are_rejected() {
        let service = test_service().await;

        assert!(matches!(
            service.create_edge(0, 2).await.unwrap_err(),
            AppError::Validation(_)
        ));
        assert!(matches!(
            service.create_edge(1, -3).await.unwrap_err(),
            AppError::Validation(_)
        ));
        assert!(matches!(
            service.record_interaction(1, 2, f64::NAN).await.unwrap_err(),
            AppError::Validation(_)
        ));
        assert!(matches!(
            service.record_interaction(1, 2, -1.0).await.unwrap_err(),
            AppError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn concurrent_create_leaves_one_edge() {
        let service = test_service().await;
        let a = service.clone();
        let b = service.clone();

        let (first, second) = tokio::join!(a.create_edge(6, 7), b.create_edge(6, 7));
        // 双方都观察到成功, 唯一索引保证只有一条边
        assert!(first.is_ok());
        assert!(second.is_ok());

        let outgoing = service.list_outgoing(6, 10, 0).await.unwrap();
        assert_eq!(outgoing.len(), 1);
    }

    #[tokio::test]
    async fn record_interaction_accumulates_weight() {
        let service = test_service().await;
        service.create_edge(1, 2).await.unwrap();

        for _ in 0..4 {
            service.record_interaction(1, 2, 2.5).await.unwrap();
        }

        let relationship = service.get_relationship(1, 2).await.unwrap();
        let outgoing = relationship.outgoing.unwrap();
        assert!((outgoing.interaction_weight - 10.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn record_interaction_upserts_missing_edge() {
        let service = test_service().await;

        let edge = service.record_interaction(5, 6, 1.5).await.unwrap();
        assert!((edge.interaction_weight - 1.5).abs() < f64::EPSILON);

        let relationship = service.get_relationship(5, 6).await.unwrap();
        assert!(relationship.following);
    }

    #[tokio::test]
    async fn concurrent_interactions_lose_no_updates() {
        let service = test_service().await;
        service.create_edge(1, 2).await.unwrap();

        let (a, b, c, d) = tokio::join!(
            service.record_interaction(1, 2, 1.0),
            service.record_interaction(1, 2, 1.0),
            service.record_interaction(1, 2, 1.0),
            service.record_interaction(1, 2, 1.0)
        );
        a.unwrap();
        b.unwrap();
        c.unwrap();
        d.unwrap();

        let relationship = service.get_relationship(1, 2).await.unwrap();
        let outgoing = relationship.outgoing.unwrap();
        assert!((outgoing.interaction_weight - 4.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn mutual_is_intersection_of_outgoing_sets() {
        let service = test_service().await;
        // 1→2, 1→4, 3→4, 3→5: 交集 {4}
        service.create_edge(1, 2).await.unwrap();
        service.create_edge(1, 4).await.unwrap();
        service.create_edge(3, 4).await.unwrap();
        service.create_edge(3, 5).await.unwrap();

        assert_eq!(service.list_mutual(1, 3, 10).await.unwrap(), vec![4]);
        assert_eq!(service.list_mutual(3, 1, 10).await.unwrap(), vec![4]);
    }

    #[tokio::test]
    async fn spec_scenario_mutual_and_suggestions() {
        let service = test_service().await;
        // 用户 {1,2,3,4}; 边 1→2, 2→3, 2→4, 3→4
        service.create_edge(1, 2).await.unwrap();
        service.create_edge(2, 3).await.unwrap();
        service.create_edge(2, 4).await.unwrap();
        service.create_edge(3, 4).await.unwrap();

        // outgoing(1)={2}, outgoing(3)={4}, 交集为空
        assert!(service.list_mutual(1, 3, 10).await.unwrap().is_empty());

        // 经由 2 的二度候选 {3,4}, 排除 2 自身
        let suggestions = service.suggest_connections(1, 10).await.unwrap();
        let mut ids: Vec<i64> = suggestions.iter().map(|s| s.user_id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![3, 4]);
    }

    #[tokio::test]
    async fn suggestions_exclude_self_and_direct_connections() {
        let service = test_service().await;
        // 1→2, 2→3, 1→3 (直连), 2→1 (回指自己)
        service.create_edge(1, 2).await.unwrap();
        service.create_edge(2, 3).await.unwrap();
        service.create_edge(1, 3).await.unwrap();
        service.create_edge(2, 1).await.unwrap();

        let suggestions = service.suggest_connections(1, 10).await.unwrap();
        assert!(suggestions.is_empty());
    }

    #[tokio::test]
    async fn suggestions_exclude_inbound_connections() {
        let service = test_service().await;
        // 3→1 已经关注了 1, 即使 3 是二度候选也不再推荐
        service.create_edge(1, 2).await.unwrap();
        service.create_edge(2, 3).await.unwrap();
        service.create_edge(3, 1).await.unwrap();

        let suggestions = service.suggest_connections(1, 10).await.unwrap();
        assert!(suggestions.is_empty());
    }

    #[tokio::test]
    async fn suggestions_rank_by_path_weight() {
        let service = test_service().await;
        service.create_edge(1, 2).await.unwrap();
        service.create_edge(2, 3).await.unwrap();
        service.create_edge(2, 4).await.unwrap();
        // 加重通往 4 的路径
        service.record_interaction(2, 4, 5.0).await.unwrap();

        let suggestions = service.suggest_connections(1, 10).await.unwrap();
        let ids: Vec<i64> = suggestions.iter().map(|s| s.user_id).collect();
        assert_eq!(ids, vec![4, 3]);
        assert!(suggestions[0].score > suggestions[1].score);
    }

    #[tokio::test]
    async fn list_outgoing_orders_by_weight_and_paginates() {
        let service = test_service().await;
        service.create_edge(1, 2).await.unwrap();
        service.create_edge(1, 3).await.unwrap();
        service.create_edge(1, 4).await.unwrap();
        service.record_interaction(1, 3, 5.0).await.unwrap();
        service.record_interaction(1, 4, 2.0).await.unwrap();

        let page_one = service.list_outgoing(1, 2, 0).await.unwrap();
        let ids: Vec<i64> = page_one.iter().map(|e| e.target_user_id).collect();
        assert_eq!(ids, vec![3, 4]);

        let page_two = service.list_outgoing(1, 2, 2).await.unwrap();
        let ids: Vec<i64> = page_two.iter().map(|e| e.target_user_id).collect();
        assert_eq!(ids, vec![2]);
    }

    #[tokio::test]
    async fn stats_track_edge_mutations() {
        let service = test_service().await;
        service.create_edge(1, 2).await.unwrap();
        service.create_edge(3, 2).await.unwrap();

        let stats = service.get_stats(2).await.unwrap();
        assert_eq!(stats.follower_count, 2);
        assert_eq!(stats.following_count, 0);

        service.delete_edge(1, 2).await.unwrap();
        let stats = service.get_stats(2).await.unwrap();
        assert_eq!(stats.follower_count, 1);

        // 没有任何边的用户回退到实时计数
        let stats = service.get_stats(99).await.unwrap();
        assert_eq!(stats.follower_count, 0);
        assert_eq!(stats.following_count, 0);
    }

    #[test]
    fn intersect_is_sorted_and_deduplicated() {
        assert_eq!(intersect(&[3, 1, 2], &[2, 3, 5]), vec![2, 3]);
        assert_eq!(intersect(&[], &[1, 2]), Vec::<i64>::new());
        assert_eq!(intersect(&[1, 2], &[]), Vec::<i64>::new());
    }

    #[test]
    fn rank_candidates_breaks_ties_by_ascending_id() {
        // 相同的权重和时间戳, 只剩候选ID决定顺序
        let now = Utc::now();
        let edge = |source, target| Edge {
            source_user_id: source,
            target_user_id: target,
            interaction_weight: 0.0,
            last_interaction_at: now,
            created_at: now,
        };
        let firsts = vec![edge(1, 2)];
        let seconds = vec![edge(2, 9), edge(2, 3)];
        let ranked = rank_candidates(1, &firsts, &seconds, &[2], &[], 10);
        let ids: Vec<i64> = ranked.iter().map(|s| s.user_id).collect();
        assert_eq!(ids, vec![3, 9]);
    }

    proptest! {
        #[test]
        fn rank_candidates_never_suggests_self_or_direct(
            first_targets in proptest::collection::vec(2i64..20, 0..8),
            raw_seconds in proptest::collection::vec((2i64..20, 1i64..20, 0.0f64..10.0), 0..40),
        ) {
            let user_id = 1i64;
            let firsts: Vec<Edge> = first_targets
                .iter()
                .map(|t| Edge::new(user_id, *t, 1.0))
                .collect();
            let seconds: Vec<Edge> = raw_seconds
                .iter()
                .map(|(s, t, w)| Edge::new(*s, *t, *w))
                .collect();
            let direct: Vec<i64> = first_targets.clone();

            let ranked = rank_candidates(user_id, &firsts, &seconds, &direct, &[], 10);
            for suggestion in &ranked {
                prop_assert_ne!(suggestion.user_id, user_id);
                prop_assert!(!direct.contains(&suggestion.user_id));
            }
        }
    }
}
