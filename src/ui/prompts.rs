//! Confirmation prompts that degrade to a default off-terminal

use super::context::UiContext;
use crate::error::{DotpulseError, DotpulseResult};

/// Ask a yes/no question.
///
/// `--yes` answers true; without a terminal the default is returned unasked.
pub async fn confirm(ctx: &UiContext, message: &str, default: bool) -> DotpulseResult<bool> {
    if ctx.auto_yes() {
        return Ok(true);
    }
    if !ctx.is_interactive() {
        return Ok(default);
    }

    let message = message.to_string();
    // cliclack blocks on stdin
    tokio::task::spawn_blocking(move || cliclack::confirm(message).initial_value(default).interact())
        .await
        .map_err(|e| DotpulseError::Internal(format!("prompt task failed: {}", e)))?
        .map_err(|e| DotpulseError::User(format!("Prompt cancelled: {}", e)))
}
