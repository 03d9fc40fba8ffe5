//! Outbound chat notifications.

pub mod recording;
pub mod telegram;

use async_trait::async_trait;

pub use recording::RecordingNotifier;
pub use telegram::TelegramNotifier;

/// Delivers a rendered message to the configured chat.
///
/// Implementations log their own failures and never propagate them; the
/// caller only learns whether the message was accepted.
#[async_trait]
pub trait Notifier {
    async fn send(&self, message: &str) -> bool;
}
