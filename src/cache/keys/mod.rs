/// 缓存键模块
/// 提供各种缓存键生成函数

/// 限流计数的缓存键
pub fn rate_limit_key(client_id: &str) -> String {
    format!("rate_limit:{}", client_id)
}
