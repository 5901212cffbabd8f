//! Interactive session: owns one cache and the trace being replayed

use std::io::Write;

use anyhow::Result;
use lrutrace::{execute, parse_batch, parse_command, BatchItem, Command, LruCache};
use tracing::{debug, info, warn};

use crate::playback::{Format, Playback, Player};

/// Ctrl+C presses during one batch that abort it
const BATCH_ABORT_PRESSES: u64 = 2;
use crate::render::{render_index, render_list, render_listing, render_stats};

const HELP: &str = "\
Commands:
  put <key> [value...]   compute a put; replay with `step` or `run`
  get <key>              compute a get; replay with `step` or `run`
  step                   show the next step of the pending operation
  run                    replay the remaining steps (Ctrl+C skips the pauses)
  batch <cmds>           run comma-separated put/get commands, replaying each
                         (Ctrl+C skips pauses, a second Ctrl+C aborts the batch)
  capacity <n>           replace the cache with an empty one of capacity n
  reset                  replace the cache with an empty one of the same capacity
  show                   print the list and the map
  stats                  print hit/miss/eviction counters
  listing                print the algorithm, marking the pending step's line
  help                   this text
  quit                   leave";

/// Whether the REPL should keep reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Controller owning exactly one cache; reconfiguring replaces it wholesale
pub struct Session {
    cache: LruCache<String, String>,
    pending: Playback,
    player: Player,
}

impl Session {
    pub fn new(capacity: usize, player: Player) -> Result<Self> {
        Ok(Self {
            cache: LruCache::new(capacity)?,
            pending: Playback::default(),
            player,
        })
    }

    pub fn cache(&self) -> &LruCache<String, String> {
        &self.cache
    }

    /// Handle one REPL line
    pub async fn handle<W: Write>(&mut self, line: &str, out: &mut W) -> Result<Flow> {
        let line = line.trim();
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };

        match command.to_uppercase().as_str() {
            "" => {}
            "PUT" | "GET" => self.handle_operation(line, out)?,
            "STEP" => self.handle_step(out)?,
            "RUN" => self.handle_run(out).await?,
            "BATCH" => {
                self.run_batch(rest, out).await?;
            }
            "CAPACITY" => self.handle_capacity(rest, out)?,
            "RESET" => self.handle_reset(out)?,
            "SHOW" => self.handle_show(out)?,
            "STATS" => match self.player.format() {
                Format::Json => writeln!(out, "{}", serde_json::to_string(self.cache.stats())?)?,
                Format::Text => {
                    let stats =
                        render_stats(self.cache.stats(), self.cache.len(), self.cache.capacity());
                    writeln!(out, "{}", stats)?;
                }
            },
            "LISTING" => {
                let current = self.pending.peek().map(|r| r.line);
                writeln!(out, "{}", render_listing(current))?;
            }
            "HELP" => writeln!(out, "{}", HELP)?,
            "QUIT" | "EXIT" => return Ok(Flow::Quit),
            _ => {
                warn!("Unknown command: {}", command);
                writeln!(out, "Unknown/invalid command: \"{}\" (try `help`)", line)?;
            }
        }

        Ok(Flow::Continue)
    }

    /// Execute every command in `text`, replaying each trace before the next
    /// command runs. Bad tokens are reported and skipped.
    ///
    /// The first Ctrl+C skips the current command's pauses; a second one stops
    /// the batch before its next command. Commands already run stay applied.
    pub async fn run_batch<W: Write>(&mut self, text: &str, out: &mut W) -> Result<usize> {
        if text.trim().is_empty() {
            writeln!(out, "Please enter batch commands")?;
            return Ok(0);
        }

        self.say(out, "Starting batch execution...")?;
        let mut operations = 0;
        let presses_at_start = self.player.interrupts().count();

        for parsed in parse_batch(text) {
            if self.player.interrupts().count() - presses_at_start >= BATCH_ABORT_PRESSES {
                info!("Batch aborted after {} operations", operations);
                self.say(
                    out,
                    &format!("Batch aborted! {} operations processed.", operations),
                )?;
                return Ok(operations);
            }

            let command = match parsed {
                Ok(command) => command,
                Err(e) => {
                    warn!("{}", e);
                    self.say(out, &e.to_string())?;
                    continue;
                }
            };

            self.say(out, &format!("Executing: {}", command))?;
            let item = execute(&mut self.cache, command);
            if let BatchItem::Executed {
                command,
                value,
                trace,
            } = item
            {
                self.pending = Playback::new(trace.to_records());
                self.player
                    .run(&mut self.pending, &self.cache.ordered_snapshot(), out)
                    .await?;

                if let Command::Get { key } = command {
                    match value {
                        Some(v) => self.say(out, &format!("get({}) returned {}", key, v))?,
                        None => self.say(out, &format!("get({}) returned nothing", key))?,
                    }
                }
                operations += 1;
            }
        }

        self.say(
            out,
            &format!("Batch execution completed! {} operations processed.", operations),
        )?;
        Ok(operations)
    }

    fn handle_operation<W: Write>(&mut self, line: &str, out: &mut W) -> Result<()> {
        let command = match parse_command(line) {
            Ok(command) => command,
            Err(e) => {
                writeln!(out, "{}", e)?;
                return Ok(());
            }
        };
        debug!("Computing {}", command);

        let message = match execute(&mut self.cache, command) {
            BatchItem::Executed {
                command: Command::Put { .. },
                trace,
                ..
            } => {
                let message = format!("PUT operation ready - {} steps", trace.len());
                self.pending = Playback::new(trace.to_records());
                message
            }
            BatchItem::Executed {
                command: Command::Get { .. },
                value,
                trace,
            } => {
                self.pending = Playback::new(trace.to_records());
                match value {
                    Some(v) => format!("GET operation ready - will return {}", v),
                    None => "GET operation ready - key not found".to_string(),
                }
            }
            BatchItem::Rejected { error, .. } => error.to_string(),
        };

        self.say(out, &message)
    }

    fn handle_step<W: Write>(&mut self, out: &mut W) -> Result<()> {
        let snapshot = self.cache.ordered_snapshot();
        if !self.player.step(&mut self.pending, &snapshot, out)? {
            return self.say(out, "No more steps to execute for current operation.");
        }
        if self.pending.is_done() {
            self.say(out, "Operation completed!")?;
        }
        Ok(())
    }

    async fn handle_run<W: Write>(&mut self, out: &mut W) -> Result<()> {
        if self.pending.is_done() {
            return self.say(out, "No more steps to execute for current operation.");
        }

        self.say(out, "Running remaining steps...")?;
        self.player
            .run(&mut self.pending, &self.cache.ordered_snapshot(), out)
            .await?;
        self.say(out, "Operation completed!")
    }

    fn handle_capacity<W: Write>(&mut self, arg: &str, out: &mut W) -> Result<()> {
        let capacity = match arg.parse::<usize>() {
            Ok(n) => n,
            Err(_) => {
                writeln!(out, "Usage: capacity <n> (n >= 1)")?;
                return Ok(());
            }
        };

        match LruCache::new(capacity) {
            Ok(cache) => {
                self.cache = cache;
                self.pending = Playback::default();
                self.say(out, &format!("Cache capacity set to {}", capacity))
            }
            Err(e) => {
                writeln!(out, "{}", e)?;
                Ok(())
            }
        }
    }

    fn handle_reset<W: Write>(&mut self, out: &mut W) -> Result<()> {
        self.cache = LruCache::new(self.cache.capacity())?;
        self.pending = Playback::default();
        self.say(out, "Cache has been reset")
    }

    fn handle_show<W: Write>(&mut self, out: &mut W) -> Result<()> {
        writeln!(out, "{}", render_list(&self.cache.ordered_snapshot(), None))?;
        writeln!(out, "{}", render_index(&self.cache.keys_snapshot()))?;
        Ok(())
    }

    /// Status line; suppressed in JSON mode so stdout stays machine-readable
    fn say<W: Write>(&self, out: &mut W, message: &str) -> Result<()> {
        if self.player.format() == Format::Text {
            writeln!(out, "{}", message)?;
        }
        Ok(())
    }
}
