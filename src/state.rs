use crate::{
    config::Config,
    services::{database::Database, graph::GraphService, id::IdAllocator},
};

/// 应用程序的共享状态
/// 包含所有服务和配置的引用
#[derive(Clone)]
pub struct AppState {
    /// 应用配置
    pub config: Config,

    /// 数据库连接
    pub db: Database,

    /// 社交图谱服务
    pub graph_service: GraphService,

    /// ID分配服务
    pub id_allocator: IdAllocator,
}

impl AppState {
    /// 检查是否为生产环境
    pub fn is_production(&self) -> bool {
        self.config.is_production()
    }

    /// 检查是否为开发环境
    pub fn is_development(&self) -> bool {
        self.config.is_development()
    }
}
