//! Context - キャンセルと期限
//!
//! execute の呼び出し側が渡し、handler にもそのまま渡されます。
//! キャンセルは協調的: registry は待つのをやめるだけで、handler を止めません。
//! handler は `ctx.done()` を見て自分で終了してください。

use std::fmt;
use std::time::Duration;

use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;

use super::errors::PasserError;

/// context が終了した理由
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoneReason {
    Canceled,
    DeadlineExceeded,
}

impl From<DoneReason> for PasserError {
    fn from(reason: DoneReason) -> Self {
        match reason {
            DoneReason::Canceled => PasserError::Canceled,
            DoneReason::DeadlineExceeded => PasserError::DeadlineExceeded,
        }
    }
}

impl fmt::Display for DoneReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DoneReason::Canceled => f.write_str("canceled"),
            DoneReason::DeadlineExceeded => f.write_str("deadline exceeded"),
        }
    }
}

/// Context はキャンセル信号と任意の期限を運ぶ
///
/// # 使用例
/// ```ignore
/// let ctx = Context::background().with_timeout(Duration::from_secs(1));
/// let result = registry.execute(&ctx, &data).await;
/// ```
///
/// - clone は同じ信号を共有する
/// - 子 context は親のキャンセルを受け取るが、子のキャンセルは親に伝わらない
/// - 子の期限は親の期限より後にはならない
#[derive(Clone, Debug)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// 期限もキャンセルも無い root context
    pub fn background() -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: None,
        }
    }

    /// 親と同じ期限を持つ子 context
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(parent) if parent < deadline => parent,
            _ => deadline,
        };
        Self {
            token: self.token.child_token(),
            deadline: Some(deadline),
        }
    }

    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// この context と子 context をすべてキャンセル
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// 終了していればその理由
    ///
    /// キャンセルと期限切れが両方成立している場合は Canceled を優先します。
    pub fn err(&self) -> Option<DoneReason> {
        if self.token.is_cancelled() {
            return Some(DoneReason::Canceled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(DoneReason::DeadlineExceeded),
            _ => None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// 終了するまで待つ
    pub async fn done(&self) -> DoneReason {
        if let Some(reason) = self.err() {
            return reason;
        }
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    biased;
                    _ = self.token.cancelled() => DoneReason::Canceled,
                    _ = sleep_until(deadline) => DoneReason::DeadlineExceeded,
                }
            }
            None => {
                self.token.cancelled().await;
                DoneReason::Canceled
            }
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn background_is_not_done() {
        let ctx = Context::background();
        assert!(!ctx.is_done());
        assert_eq!(ctx.deadline(), None);
    }

    #[test]
    fn cancel_reaches_children_but_not_parent() {
        let parent = Context::background();
        let child = parent.child();
        let grandchild = child.child();

        child.cancel();
        assert_eq!(child.err(), Some(DoneReason::Canceled));
        assert_eq!(grandchild.err(), Some(DoneReason::Canceled));
        assert_eq!(parent.err(), None);

        let other = parent.child();
        parent.cancel();
        assert_eq!(other.err(), Some(DoneReason::Canceled));
    }

    #[tokio::test(start_paused = true)]
    async fn child_deadline_never_exceeds_parent() {
        let parent = Context::background().with_timeout(Duration::from_millis(10));
        let child = parent.with_timeout(Duration::from_secs(60));
        assert_eq!(child.deadline(), parent.deadline());

        let shorter = parent.with_timeout(Duration::from_millis(1));
        assert!(shorter.deadline() < parent.deadline());
    }

    #[tokio::test(start_paused = true)]
    async fn done_resolves_at_deadline() {
        let ctx = Context::background().with_timeout(Duration::from_millis(50));
        let start = Instant::now();

        assert_eq!(ctx.done().await, DoneReason::DeadlineExceeded);
        assert!(start.elapsed() >= Duration::from_millis(50));
        assert_eq!(ctx.err(), Some(DoneReason::DeadlineExceeded));
    }

    #[tokio::test]
    async fn done_resolves_on_cancel() {
        let ctx = Context::background().with_timeout(Duration::from_secs(60));
        let waiter = ctx.clone();
        let handle = tokio::spawn(async move { waiter.done().await });

        ctx.cancel();
        assert_eq!(handle.await.unwrap(), DoneReason::Canceled);
    }

    #[test]
    fn done_reason_maps_to_passer_error() {
        assert!(matches!(
            PasserError::from(DoneReason::Canceled),
            PasserError::Canceled
        ));
        assert!(matches!(
            PasserError::from(DoneReason::DeadlineExceeded),
            PasserError::DeadlineExceeded
        ));
    }
}
