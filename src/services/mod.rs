pub mod database;
pub mod graph;
pub mod id;

// 重新导出常用类型
pub use database::Database;
pub use graph::GraphService;
pub use id::IdAllocator;
