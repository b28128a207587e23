use crate::assistant::StateSnapshot;
use anyhow::{Context, Result};
use std::io::Write;

pub trait StatusRelay: Send {
    fn publish(&mut self, snapshot: &StateSnapshot) -> Result<()>;
}

/// Writes one JSON object per snapshot, newline-terminated.
pub struct JsonLineRelay<W> {
    writer: W,
}

impl<W: Write + Send> JsonLineRelay<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl JsonLineRelay<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> StatusRelay for JsonLineRelay<W> {
    fn publish(&mut self, snapshot: &StateSnapshot) -> Result<()> {
        serde_json::to_writer(&mut self.writer, snapshot).context("failed to encode snapshot")?;
        self.writer.write_all(b"\n")?;
        self.writer.flush().context("failed to flush status relay")?;
        Ok(())
    }
}
