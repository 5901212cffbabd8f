//! lruviz - step-by-step terminal visualizer for an LRU cache

mod playback;
mod render;
mod session;

use std::borrow::Cow;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::playback::{Format, Interrupts, Player};
use crate::session::{Flow, Session};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Cache capacity (number of entries, at least 1)
    #[arg(short, long, default_value_t = 3)]
    capacity: usize,

    /// Pause between replayed steps in milliseconds (0 disables pausing)
    #[arg(short, long, default_value_t = 600)]
    speed: u64,

    /// Run a batch such as "put 1 100, get 1" and exit
    #[arg(short, long)]
    batch: Option<String>,

    /// Read a batch from a file and exit
    #[arg(short, long, conflicts_with = "batch")]
    file: Option<PathBuf>,

    /// Print each step as a JSON record instead of text
    #[arg(long)]
    json: bool,

    /// Print the algorithm listing with the current line marked at every step
    #[arg(long)]
    listing: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing; stdout is reserved for rendered output
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    info!("Starting lruviz v{}", env!("CARGO_PKG_VERSION"));
    info!("Cache capacity: {}", args.capacity);
    info!("Step delay: {} ms", args.speed);

    let format = if args.json { Format::Json } else { Format::Text };
    let interrupts = Interrupts::listen();
    let player = Player::new(Duration::from_millis(args.speed), format, args.listing)
        .with_interrupts(interrupts.clone());
    let mut session = Session::new(args.capacity, player)?;
    let mut stdout = std::io::stdout();

    let script = match (&args.batch, &args.file) {
        (Some(batch), _) => Some(batch.clone()),
        (None, Some(path)) => Some(
            std::fs::read_to_string(path)
                .with_context(|| format!("reading batch file {}", path.display()))?,
        ),
        (None, None) => None,
    };

    if let Some(script) = script {
        let operations = session.run_batch(&script, &mut stdout).await?;
        info!("Batch finished: {} operations", operations);
        return Ok(());
    }

    let stdin = BufReader::new(tokio::io::stdin());
    repl(session, format, stdin, &interrupts, &mut stdout).await
}

/// Read commands until EOF, `quit`, or Ctrl+C at the prompt.
///
/// Input that is not valid UTF-8 is decoded lossily rather than ending the session.
async fn repl<R, W>(
    mut session: Session,
    format: Format,
    mut input: R,
    interrupts: &Interrupts,
    out: &mut W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    if format == Format::Text {
        writeln!(out, "LRU Cache Visualizer ready! Capacity {}.", session.cache().capacity())?;
        writeln!(out, "Try: put 1 100, put 2 200, get 1, put 3 300 to see eviction in action.")?;
        writeln!(out, "Type `help` for all commands.")?;
    }

    let mut buf = Vec::new();

    loop {
        if format == Format::Text {
            write!(out, "lru> ")?;
            out.flush()?;
        }

        buf.clear();
        let mut interrupted = interrupts.subscribe();
        let read = tokio::select! {
            read = input.read_until(b'\n', &mut buf) => read?,
            _ = interrupted.next() => 0,
        };
        if read == 0 {
            break;
        }

        let line = String::from_utf8_lossy(&buf);
        if matches!(line, Cow::Owned(_)) {
            warn!("Input line was not valid UTF-8; invalid bytes replaced");
        }

        if session.handle(&line, out).await? == Flow::Quit {
            break;
        }
        out.flush()?;
    }

    info!("Session closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(2, Player::new(Duration::ZERO, Format::Text, false)).unwrap()
    }

    #[tokio::test]
    async fn test_repl_survives_invalid_utf8() {
        let input: &[u8] = b"put 1 100\nput \xff\xfe 2\nget 1\nshow\n";
        let mut out = Vec::new();

        repl(session(), Format::Text, input, &Interrupts::none(), &mut out)
            .await
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("GET operation ready - will return 100"));
        assert!(text.contains("[1:100]"));
        assert!(text.contains("[\u{fffd}\u{fffd}:2]"));
    }

    #[tokio::test]
    async fn test_repl_stops_on_quit_and_unterminated_last_line() {
        let input: &[u8] = b"put 1 100\nquit\nput 2 200\n";
        let mut out = Vec::new();

        repl(session(), Format::Json, input, &Interrupts::none(), &mut out)
            .await
            .unwrap();
        assert!(String::from_utf8(out).unwrap().is_empty());

        let input: &[u8] = b"get 7";
        let mut out = Vec::new();
        repl(session(), Format::Text, input, &Interrupts::none(), &mut out)
            .await
            .unwrap();
        assert!(String::from_utf8(out)
            .unwrap()
            .contains("GET operation ready - key not found"));
    }
}
