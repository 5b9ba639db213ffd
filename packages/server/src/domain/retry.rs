//! Delivery state machine for broadcasting to a single connection.
//!
//! The first attempt sends the incremental event. A failed write may have left
//! the client with a partial view, so every later attempt sends the full
//! snapshot instead. After the last attempt fails the connection is given up on.
//!
//! ```text
//! FirstAttempt --fail--> ResyncRetry(2) --fail--> ... ResyncRetry(max) --fail--> Failed
//! ```

use std::time::Duration;

/// Which frame an attempt sends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePlan {
    /// The single chat event being broadcast
    Incremental,
    /// The whole current history
    Snapshot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryState {
    FirstAttempt,
    /// 1-based attempt number, always >= 2
    ResyncRetry(u32),
    Failed,
}

impl DeliveryState {
    pub fn start() -> Self {
        Self::FirstAttempt
    }

    /// 1-based attempt number, `None` once failed
    pub fn attempt(&self) -> Option<u32> {
        match self {
            Self::FirstAttempt => Some(1),
            Self::ResyncRetry(attempt) => Some(*attempt),
            Self::Failed => None,
        }
    }

    pub fn frame(&self) -> Option<FramePlan> {
        match self {
            Self::FirstAttempt => Some(FramePlan::Incremental),
            Self::ResyncRetry(_) => Some(FramePlan::Snapshot),
            Self::Failed => None,
        }
    }

    /// Transition after the current attempt failed.
    pub fn on_failure(self, policy: &RetryPolicy) -> Self {
        match self.attempt() {
            Some(attempt) if attempt < policy.max_attempts => Self::ResyncRetry(attempt + 1),
            _ => Self::Failed,
        }
    }
}

/// Attempt budget and back-off for broadcasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// After failed attempt N the next attempt waits N units
    pub backoff_unit: Duration,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
    pub const DEFAULT_BACKOFF_UNIT: Duration = Duration::from_secs(1);

    pub fn new(max_attempts: u32, backoff_unit: Duration) -> Self {
        Self {
            max_attempts,
            backoff_unit,
        }
    }

    pub fn with_backoff_unit(backoff_unit: Duration) -> Self {
        Self::new(Self::DEFAULT_MAX_ATTEMPTS, backoff_unit)
    }

    /// Wait after failed attempt `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_unit * attempt
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ATTEMPTS, Self::DEFAULT_BACKOFF_UNIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_attempt_sends_incremental_event() {
        // テスト項目: 1 回目の試行では差分イベントを送る
        // given (前提条件):
        let state = DeliveryState::start();

        // when (操作):

        // then (期待する結果):
        assert_eq!(state.attempt(), Some(1));
        assert_eq!(state.frame(), Some(FramePlan::Incremental));
    }

    #[test]
    fn test_retries_send_snapshot_until_budget_exhausted() {
        // テスト項目: 2 回目以降は全件スナップショットを送り、3 回失敗で Failed になる
        // given (前提条件):
        let policy = RetryPolicy::default();
        let state = DeliveryState::start();

        // when (操作):
        let second = state.on_failure(&policy);
        let third = second.on_failure(&policy);
        let exhausted = third.on_failure(&policy);

        // then (期待する結果):
        assert_eq!(second, DeliveryState::ResyncRetry(2));
        assert_eq!(second.frame(), Some(FramePlan::Snapshot));
        assert_eq!(third, DeliveryState::ResyncRetry(3));
        assert_eq!(third.frame(), Some(FramePlan::Snapshot));
        assert_eq!(exhausted, DeliveryState::Failed);
        assert_eq!(exhausted.frame(), None);
        assert_eq!(exhausted.attempt(), None);
    }

    #[test]
    fn test_failed_state_is_terminal() {
        // テスト項目: Failed 状態からはそれ以上遷移しない
        // given (前提条件):
        let policy = RetryPolicy::default();

        // when (操作):
        let state = DeliveryState::Failed.on_failure(&policy);

        // then (期待する結果):
        assert_eq!(state, DeliveryState::Failed);
    }

    #[test]
    fn test_single_attempt_policy_fails_immediately() {
        // テスト項目: 試行回数 1 のポリシーでは 1 回の失敗で Failed になる
        // given (前提条件):
        let policy = RetryPolicy::new(1, Duration::from_millis(1));

        // when (操作):
        let state = DeliveryState::start().on_failure(&policy);

        // then (期待する結果):
        assert_eq!(state, DeliveryState::Failed);
    }

    #[test]
    fn test_backoff_grows_linearly() {
        // テスト項目: 待機時間は試行回数に比例して増える
        // given (前提条件):
        let policy = RetryPolicy::with_backoff_unit(Duration::from_millis(100));

        // when (操作):

        // then (期待する結果):
        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(200));
        assert_eq!(policy.backoff(3), Duration::from_millis(300));
    }
}
