//! Push notifications for order fills.
//!
//! `KakaoNotifier` posts a text memo through the Kakao REST API;
//! `NoopNotifier` stands in when no Kakao token is configured. Both
//! implement `strategy_core::NotificationSink` and never fail the caller.

mod error;
mod kakao;

use async_trait::async_trait;
use strategy_core::NotificationSink;

pub use error::NotifyError;
pub use kakao::{KakaoNotifier, KAKAO_API_BASE_URL};

/// Discards every message.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

#[async_trait]
impl NotificationSink for NoopNotifier {
    async fn send(&self, text: &str) -> bool {
        tracing::debug!(text = %text, "Notification dropped (no notifier configured)");
        true
    }
}
