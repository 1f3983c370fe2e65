//! JSON-lines driver for the casino core.
//!
//! Reads one `CommandRequest` per line on stdin and writes one
//! `CommandOutcome` per line on stdout. Abandoned blackjack hands are
//! announced as `{"event":"blackjack_timeout",...}` lines.
//!
//! Usage: cargo run -p casino-bot -- --seed 42 --admin 1234

use casino_bot::logging::{init_logging, LogFormat};
use casino_bot::settings::{load_with_sources, parse_id_list};
use casino_bot::{Casino, CommandOutcome, CommandRequest, ErrorKind};
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "casino-bot", about = "Virtual casino command processor")]
struct Args {
    /// TOML settings file (overrides CASINO_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,
    /// RNG seed for reproducible runs (overrides CASINO_SEED)
    #[arg(long)]
    seed: Option<u64>,
    /// Comma-separated admin player ids (overrides CASINO_ADMINS)
    #[arg(long)]
    admin: Option<String>,
    /// Seconds between sweeps for idle blackjack hands
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..))]
    reap_every: u64,
    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

#[derive(Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum Notice<'a> {
    BlackjackTimeout { player_id: &'a str, bet: i64 },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(if args.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    })?;

    let mut resolved = load_with_sources(args.config.as_deref())?;
    if let Some(seed) = args.seed {
        resolved.override_seed(seed);
    }
    if let Some(admins) = args.admin.as_deref() {
        resolved.override_admins(parse_id_list(admins));
    }
    resolved.settings.validate()?;
    tracing::info!(sources = ?resolved.sources, "settings loaded");

    let casino = Arc::new(Casino::new(resolved.settings)?);
    let (notice_tx, mut notices) = mpsc::unbounded_channel();
    let reaper = Arc::clone(&casino).spawn_reaper(Duration::from_secs(args.reap_every), notice_tx);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                let outcome = handle_line(&casino, &line);
                write_json(&mut stdout, &outcome).await?;
            }
            Some(expired) = notices.recv() => {
                let notice = Notice::BlackjackTimeout {
                    player_id: &expired.player_id,
                    bet: expired.bet,
                };
                write_json(&mut stdout, &notice).await?;
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted, shutting down");
                break;
            }
        }
    }

    reaper.abort();
    tracing::info!("casino stopped");
    Ok(())
}

fn handle_line(casino: &Casino, line: &str) -> CommandOutcome {
    let request_id = Uuid::new_v4();
    let span = tracing::debug_span!("request", %request_id);
    let _entered = span.enter();

    match serde_json::from_str::<CommandRequest>(line) {
        Ok(request) => casino.execute(request),
        Err(err) => {
            tracing::debug!(error = %err, "malformed command line");
            CommandOutcome::failure(ErrorKind::Validation, format!("Malformed command: {err}"))
        }
    }
}

async fn write_json<T: Serialize>(
    out: &mut tokio::io::Stdout,
    value: &T,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut line = serde_json::to_vec(value)?;
    line.push(b'\n');
    out.write_all(&line).await?;
    out.flush().await?;
    Ok(())
}
