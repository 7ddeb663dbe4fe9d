// src/types.rs

use std::fmt;
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by the collaborator traits.
///
/// The traits are used as `dyn` objects by the orchestrator, so their async
/// methods hand back a pinned, boxed future instead of using `async fn`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Why a run stopped early without being an error.
///
/// - `LockBusy`: another instance holds the instance lock.
/// - `OnBattery`: AC power is required but the host runs on battery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    LockBusy,
    OnBattery,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::LockBusy => f.write_str("another instance is already running"),
            SkipReason::OnBattery => f.write_str("the system is not running on AC power"),
        }
    }
}
