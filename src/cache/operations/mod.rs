/// 缓存操作
/// 提供缓存操作的功能实现

pub mod rate_limit;

pub use rate_limit::*;
