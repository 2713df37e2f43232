// 缓存模块
// 包含限流窗口的数据结构和操作逻辑

pub mod keys;
pub mod models;
pub mod operations;

// 重新导出常用类型，方便其他模块使用
pub use models::rate_limit::ClientWindow;
pub use operations::rate_limit::{Admission, RateLimitCacheOperations};
