use rest_client::RestError;
use thiserror::Error;

/// Why a notification was not delivered. Logged, never returned to callers
/// of [`NotificationSink::send`](strategy_core::NotificationSink::send).
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification request failed: {0}")]
    Rest(#[from] RestError),

    #[error("failed to encode message template: {0}")]
    Template(#[from] serde_json::Error),

    #[error("kakao answered result_code {0}")]
    Refused(i64),
}
