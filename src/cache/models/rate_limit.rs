use std::time::Duration;

use tokio::time::Instant;

/// 单个客户端在当前窗口内的计数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientWindow {
    pub count: u32,
    pub expires_at: Instant,
}

impl ClientWindow {
    pub fn start(now: Instant, window: Duration) -> Self {
        Self {
            count: 1,
            expires_at: Self::expiry(now, window),
        }
    }

    /// 计算到期时刻，溢出时取 `Instant` 能表示的最远值
    pub fn expiry(now: Instant, window: Duration) -> Instant {
        now.checked_add(window).unwrap_or_else(|| far_future(now))
    }

    /// 到期时刻及之后的条目视为不存在
    pub fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }

    pub fn remaining(&self, now: Instant) -> Duration {
        self.expires_at.saturating_duration_since(now)
    }
}

fn far_future(now: Instant) -> Instant {
    // 逐级减半直到加法不再溢出
    let mut step = Duration::from_secs(u64::MAX / 2);
    loop {
        if let Some(at) = now.checked_add(step) {
            return at;
        }
        step /= 2;
    }
}
