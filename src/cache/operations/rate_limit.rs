use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::time::Instant;

use crate::cache::keys::rate_limit_key;
use crate::cache::models::rate_limit::ClientWindow;
use crate::config::ConfigError;

/// 窗口上限，超出后 `Instant` 加法可能溢出
pub const MAX_WINDOW: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// 一次准入判断的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// 放行，`count` 为本窗口内的第几次请求
    Allowed { count: u32 },
    /// 拒绝，`retry_after` 为窗口剩余时间
    Rejected { retry_after: Duration },
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Admission::Allowed { .. })
    }
}

/// 速率限制缓存操作
///
/// 每个客户端一个计数窗口。判断与自增在同一个分片写锁内完成，
/// 同一客户端的并发请求不会丢失计数，也不会同时占用最后一个名额。
/// 过期条目不主动删除，下次访问时视为不存在。
#[derive(Debug)]
pub struct RateLimitCacheOperations {
    request_limit: u32,
    window: Duration,
    windows: DashMap<String, ClientWindow>,
}

impl RateLimitCacheOperations {
    pub fn new(request_limit: u32, window: Duration) -> Result<Self, ConfigError> {
        if request_limit == 0 {
            return Err(ConfigError::Invalid {
                name: "request_limit",
                value: request_limit.to_string(),
            });
        }
        if window.is_zero() || window > MAX_WINDOW || Instant::now().checked_add(window).is_none() {
            return Err(ConfigError::Invalid {
                name: "window",
                value: format!("{:?}", window),
            });
        }

        Ok(Self {
            request_limit,
            window,
            windows: DashMap::new(),
        })
    }

    pub fn request_limit(&self) -> u32 {
        self.request_limit
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// 检查并记录一次请求
    pub fn admit(&self, client_id: &str) -> Admission {
        let now = Instant::now();

        match self.windows.entry(rate_limit_key(client_id)) {
            Entry::Vacant(vacant) => {
                vacant.insert(ClientWindow::start(now, self.window));
                Admission::Allowed { count: 1 }
            }
            Entry::Occupied(mut occupied) => {
                let state = occupied.get_mut();
                if !state.is_live(now) {
                    *state = ClientWindow::start(now, self.window);
                    return Admission::Allowed { count: 1 };
                }
                if state.count >= self.request_limit {
                    return Admission::Rejected {
                        retry_after: state.remaining(now),
                    };
                }
                // 放行的请求会重新开始计时
                state.count += 1;
                state.expires_at = ClientWindow::expiry(now, self.window);
                Admission::Allowed { count: state.count }
            }
        }
    }

    /// 当前窗口内的计数，过期或不存在时为 None
    pub fn current(&self, client_id: &str) -> Option<ClientWindow> {
        let now = Instant::now();
        self.windows
            .get(&rate_limit_key(client_id))
            .map(|entry| *entry.value())
            .filter(|state| state.is_live(now))
    }

    /// 清理已过期的条目，返回清理数量
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.windows.len();
        self.windows.retain(|_, state| state.is_live(now));
        before.saturating_sub(self.windows.len())
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn limiter(limit: u32, window_secs: u64) -> RateLimitCacheOperations {
        RateLimitCacheOperations::new(limit, Duration::from_secs(window_secs)).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejects_request_after_limit() {
        let ops = limiter(3, 60);

        assert_eq!(ops.admit("10.0.0.1"), Admission::Allowed { count: 1 });
        assert_eq!(ops.admit("10.0.0.1"), Admission::Allowed { count: 2 });
        assert_eq!(ops.admit("10.0.0.1"), Admission::Allowed { count: 3 });
        assert!(!ops.admit("10.0.0.1").is_allowed());
        assert!(!ops.admit("10.0.0.1").is_allowed());

        // 拒绝不计数
        assert_eq!(ops.current("10.0.0.1").map(|w| w.count), Some(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_resets_after_expiry() {
        let ops = limiter(2, 10);

        assert!(ops.admit("a").is_allowed());
        assert!(ops.admit("a").is_allowed());
        assert!(!ops.admit("a").is_allowed());

        tokio::time::advance(Duration::from_secs(10)).await;

        assert!(ops.current("a").is_none());
        assert_eq!(ops.admit("a"), Admission::Allowed { count: 1 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_admitted_request_refreshes_expiry() {
        let ops = limiter(3, 10);

        assert!(ops.admit("a").is_allowed());
        tokio::time::advance(Duration::from_secs(8)).await;
        assert_eq!(ops.admit("a"), Admission::Allowed { count: 2 });

        // 距第一次请求已超过窗口，但第二次请求刷新了过期时间
        tokio::time::advance(Duration::from_secs(8)).await;
        assert_eq!(ops.admit("a"), Admission::Allowed { count: 3 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejection_does_not_refresh_expiry() {
        let ops = limiter(1, 10);

        assert!(ops.admit("a").is_allowed());
        tokio::time::advance(Duration::from_secs(4)).await;
        assert_eq!(
            ops.admit("a"),
            Admission::Rejected {
                retry_after: Duration::from_secs(6)
            }
        );

        tokio::time::advance(Duration::from_secs(6)).await;
        assert_eq!(ops.admit("a"), Admission::Allowed { count: 1 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_clients_are_independent() {
        let ops = limiter(1, 60);

        assert!(ops.admit("a").is_allowed());
        assert!(!ops.admit("a").is_allowed());
        assert!(ops.admit("b").is_allowed());
        assert!(!ops.admit("b").is_allowed());
        assert_eq!(ops.current("a").map(|w| w.count), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_drops_only_expired_entries() {
        let ops = limiter(5, 10);

        ops.admit("old");
        tokio::time::advance(Duration::from_secs(6)).await;
        ops.admit("new");
        tokio::time::advance(Duration::from_secs(5)).await;

        assert_eq!(ops.len(), 2);
        assert_eq!(ops.purge_expired(), 1);
        assert_eq!(ops.len(), 1);
        assert!(ops.current("new").is_some());
    }

    #[test]
    fn test_zero_limit_or_window_rejected() {
        assert!(RateLimitCacheOperations::new(0, Duration::from_secs(1)).is_err());
        assert!(RateLimitCacheOperations::new(1, Duration::ZERO).is_err());
    }

    #[test]
    fn test_huge_window_rejected() {
        assert!(RateLimitCacheOperations::new(1, Duration::from_secs(u64::MAX)).is_err());
        assert!(RateLimitCacheOperations::new(1, MAX_WINDOW + Duration::from_secs(1)).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_longest_window_admits_without_overflow() {
        let ops = RateLimitCacheOperations::new(1, MAX_WINDOW).unwrap();

        assert_eq!(ops.admit("a"), Admission::Allowed { count: 1 });
        assert!(!ops.admit("a").is_allowed());
        assert!(ops.current("a").is_some());
    }

    #[test]
    fn test_two_racing_callers_with_one_slot() {
        for _ in 0..200 {
            let ops = Arc::new(limiter(1, 60));
            let barrier = Arc::new(std::sync::Barrier::new(2));

            let handles: Vec<_> = (0..2)
                .map(|_| {
                    let ops = Arc::clone(&ops);
                    let barrier = Arc::clone(&barrier);
                    std::thread::spawn(move || {
                        barrier.wait();
                        ops.admit("same-client").is_allowed()
                    })
                })
                .collect();

            let allowed = handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .filter(|allowed| *allowed)
                .count();
            assert_eq!(allowed, 1);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_tasks_never_exceed_limit() {
        let ops = Arc::new(limiter(10, 60));

        let tasks = (0..100).map(|_| {
            let ops = Arc::clone(&ops);
            tokio::spawn(async move { ops.admit("burst").is_allowed() })
        });
        let results = futures_util::future::join_all(tasks).await;

        let allowed = results
            .into_iter()
            .map(|r| r.unwrap())
            .filter(|allowed| *allowed)
            .count();
        assert_eq!(allowed, 10);
        assert_eq!(ops.current("burst").map(|w| w.count), Some(10));
    }
}
