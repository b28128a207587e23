use anyhow::Result;

/// Speaks a backend reply. Returning means playback finished.
pub trait ReplyPlayer: Send {
    fn play(&mut self, text: &str) -> Result<()>;
}

/// Stand-in player for headless setups: logs the reply and returns at once.
#[derive(Debug, Default)]
pub struct LogReplyPlayer;

impl ReplyPlayer for LogReplyPlayer {
    fn play(&mut self, text: &str) -> Result<()> {
        tracing::info!(reply = %text, "reply");
        Ok(())
    }
}
