//! services/api/src/adapters/notifier.rs
//!
//! `ResetNotifier` that writes the reset link to the service log instead of
//! sending mail. Operators relay the link until a mail transport is wired in.

use async_trait::async_trait;
use study_notes_core::ports::{PortResult, ResetNotifier};
use tracing::info;

#[derive(Clone, Default)]
pub struct LogResetNotifier;

#[async_trait]
impl ResetNotifier for LogResetNotifier {
    async fn send_reset_link(&self, email: &str, reset_link: &str) -> PortResult<()> {
        info!(%email, %reset_link, "Password reset requested");
        Ok(())
    }
}
