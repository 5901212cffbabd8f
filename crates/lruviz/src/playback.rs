//! Trace replay
//!
//! The cache has already applied every mutation by the time a trace reaches
//! this module, so replay only paces and prints. Skipping pauses (Ctrl+C
//! during `run`) can never leave the cache in a half-updated state.

use std::io::Write;
use std::time::Duration;

use anyhow::Result;
use lrutrace::StepRecord;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::render::{render_list, render_listing, render_step};

/// Cursor over the steps of one operation
#[derive(Debug, Clone, Default)]
pub struct Playback {
    records: Vec<StepRecord<String, String>>,
    cursor: usize,
}

impl Playback {
    pub fn new(records: Vec<StepRecord<String, String>>) -> Self {
        Self { records, cursor: 0 }
    }

    /// Advance, returning the step's position and record
    pub fn next_step(&mut self) -> Option<(usize, &StepRecord<String, String>)> {
        let position = self.cursor;
        let record = self.records.get(position)?;
        self.cursor += 1;
        Some((position, record))
    }

    /// Record the next call to `next_step` would return
    pub fn peek(&self) -> Option<&StepRecord<String, String>> {
        self.records.get(self.cursor)
    }

    pub fn remaining(&self) -> usize {
        self.records.len() - self.cursor
    }

    pub fn total(&self) -> usize {
        self.records.len()
    }

    pub fn is_done(&self) -> bool {
        self.cursor >= self.records.len()
    }
}

/// Running count of Ctrl+C presses.
///
/// Handles are cheap to clone. Each handle remembers which presses it has
/// already reported through [`next`](Self::next).
#[derive(Debug, Clone)]
pub struct Interrupts {
    presses: watch::Receiver<u64>,
}

impl Interrupts {
    /// Count Ctrl+C presses for the rest of the process
    pub fn listen() -> Self {
        let (tx, presses) = watch::channel(0);
        tokio::spawn(async move {
            loop {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!("Ctrl+C handler unavailable: {}", e);
                    break;
                }
                tx.send_modify(|n| *n += 1);
            }
        });
        Self { presses }
    }

    /// Presses fed through the returned sender instead of the signal handler
    pub fn manual() -> (watch::Sender<u64>, Self) {
        let (tx, presses) = watch::channel(0);
        (tx, Self { presses })
    }

    /// Presses that will never arrive
    pub fn none() -> Self {
        Self::manual().1
    }

    /// Total presses so far
    pub fn count(&self) -> u64 {
        *self.presses.borrow()
    }

    /// A handle that only reports presses made after this call
    pub fn subscribe(&self) -> Self {
        let mut presses = self.presses.clone();
        presses.borrow_and_update();
        Self { presses }
    }

    /// Wait for a press this handle has not reported yet
    pub async fn next(&mut self) {
        if self.presses.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Output format for replayed steps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Human-readable step lines plus list view
    Text,
    /// One `StepRecord` JSON object per line
    Json,
}

/// Paces and prints steps
#[derive(Debug, Clone)]
pub struct Player {
    delay: Duration,
    format: Format,
    listing: bool,
    interrupts: Interrupts,
}

impl Player {
    pub fn new(delay: Duration, format: Format, listing: bool) -> Self {
        Self {
            delay,
            format,
            listing,
            interrupts: Interrupts::none(),
        }
    }

    /// Skip pauses on presses counted by `interrupts`
    pub fn with_interrupts(mut self, interrupts: Interrupts) -> Self {
        self.interrupts = interrupts;
        self
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn interrupts(&self) -> &Interrupts {
        &self.interrupts
    }

    /// Print the next pending step, without pausing
    pub fn step<W: Write>(
        &self,
        playback: &mut Playback,
        snapshot: &[(String, String)],
        out: &mut W,
    ) -> Result<bool> {
        let total = playback.total();
        match playback.next_step() {
            Some((position, record)) => {
                self.emit(position, total, record, snapshot, out)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Print every remaining step, pausing between them.
    ///
    /// Ctrl+C while paused drops the remaining pauses and finishes at once.
    pub async fn run<W: Write>(
        &self,
        playback: &mut Playback,
        snapshot: &[(String, String)],
        out: &mut W,
    ) -> Result<()> {
        let total = playback.total();
        let mut skip = self.delay.is_zero();
        let mut interrupts = self.interrupts.subscribe();

        while let Some((position, record)) = playback.next_step() {
            self.emit(position, total, record, snapshot, out)?;
            out.flush()?;

            if skip || playback.is_done() {
                continue;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.delay) => {}
                _ = interrupts.next() => {
                    info!("Running remaining {} steps immediately", playback.remaining());
                    skip = true;
                }
            }
        }

        Ok(())
    }

    fn emit<W: Write>(
        &self,
        position: usize,
        total: usize,
        record: &StepRecord<String, String>,
        snapshot: &[(String, String)],
        out: &mut W,
    ) -> Result<()> {
        match self.format {
            Format::Json => {
                writeln!(out, "{}", serde_json::to_string(record)?)?;
            }
            Format::Text => {
                writeln!(out, "{}", render_step(position, total, record))?;
                writeln!(out, "         {}", render_list(snapshot, record.key.as_deref()))?;
                if self.listing {
                    writeln!(out, "{}", render_listing(Some(record.line)))?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lrutrace::LruCache;

    fn playback_for_miss() -> Playback {
        let mut cache: LruCache<String, String> = LruCache::new(2).unwrap();
        Playback::new(cache.get(&"x".to_string()).trace.to_records())
    }

    #[test]
    fn test_playback_cursor() {
        let mut playback = playback_for_miss();

        assert_eq!(playback.total(), 2);
        assert_eq!(playback.remaining(), 2);
        assert_eq!(playback.next_step().map(|(p, _)| p), Some(0));
        assert_eq!(playback.remaining(), 1);
        assert!(playback.peek().is_some());
        assert_eq!(playback.next_step().map(|(p, _)| p), Some(1));
        assert!(playback.is_done());
        assert!(playback.next_step().is_none());
        assert!(playback.peek().is_none());
    }

    #[test]
    fn test_step_prints_one_record() {
        let player = Player::new(Duration::ZERO, Format::Text, false);
        let mut playback = playback_for_miss();
        let mut out = Vec::new();

        assert!(player.step(&mut playback, &[], &mut out).unwrap());
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("[ 1/2] ln2  CHECK   get(x) called, check map"));
        assert_eq!(playback.remaining(), 1);
    }

    #[tokio::test]
    async fn test_run_json_emits_every_remaining_step() {
        let player = Player::new(Duration::ZERO, Format::Json, false);
        let mut cache: LruCache<String, String> = LruCache::new(1).unwrap();
        cache.put("a".to_string(), "1".to_string());
        let mut playback = Playback::new(
            cache
                .put("b".to_string(), "2".to_string())
                .trace
                .to_records(),
        );
        playback.next_step();

        let mut out = Vec::new();
        player
            .run(&mut playback, &cache.ordered_snapshot(), &mut out)
            .await
            .unwrap();

        let lines: Vec<serde_json::Value> = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[1]["action"], "evict");
        assert_eq!(lines[1]["evictedKey"], "a");
        assert!(playback.is_done());
    }

    #[tokio::test]
    async fn test_interrupt_skips_remaining_pauses() {
        let (tx, interrupts) = Interrupts::manual();
        let player =
            Player::new(Duration::from_secs(30), Format::Text, false).with_interrupts(interrupts);
        let mut playback = playback_for_miss();
        let mut out = Vec::new();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            tx.send_modify(|n| *n += 1);
        });
        tokio::time::timeout(
            Duration::from_secs(5),
            player.run(&mut playback, &[], &mut out),
        )
        .await
        .expect("pause was not skipped")
        .unwrap();

        assert!(playback.is_done());
        assert_eq!(player.interrupts().count(), 1);
    }

    #[tokio::test]
    async fn test_subscribe_ignores_earlier_presses() {
        let (tx, interrupts) = Interrupts::manual();
        tx.send_modify(|n| *n += 1);

        let mut fresh = interrupts.subscribe();
        let waited = tokio::time::timeout(Duration::from_millis(20), fresh.next()).await;
        assert!(waited.is_err());

        tx.send_modify(|n| *n += 1);
        fresh.next().await;
        assert_eq!(fresh.count(), 2);
    }

    #[tokio::test]
    async fn test_run_with_pause_completes() {
        let player = Player::new(Duration::from_millis(1), Format::Text, true);
        let mut playback = playback_for_miss();
        let mut out = Vec::new();

        player.run(&mut playback, &[], &mut out).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("MISS"));
        assert!(text.contains("→  3 │         return None"));
    }
}
