//! Progress reporting while waiting on a workflow.

use std::io::{self, Write};

/// Receives one tick per completed poll and a single call when waiting ends.
pub trait ProgressSink {
    fn tick(&mut self);
    fn finish(&mut self);
}

/// Writes a `.` per tick and a newline on finish.
///
/// Write errors are ignored; progress output is cosmetic.
#[derive(Debug)]
pub struct WriterProgress<W: Write> {
    writer: W,
}

impl WriterProgress<io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write> WriterProgress<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ProgressSink for WriterProgress<W> {
    fn tick(&mut self) {
        let _ = self.writer.write_all(b".");
        let _ = self.writer.flush();
    }

    fn finish(&mut self) {
        let _ = self.writer.write_all(b"\n");
        let _ = self.writer.flush();
    }
}

/// Discards all progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentProgress;

impl ProgressSink for SilentProgress {
    fn tick(&mut self) {}
    fn finish(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dots_then_newline() {
        let mut progress = WriterProgress::new(Vec::new());
        progress.tick();
        progress.tick();
        progress.finish();
        assert_eq!(progress.into_inner(), b"..\n");
    }
}
