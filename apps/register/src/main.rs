//! # Tally Register
//!
//! Reads one command per line from stdin and prints the reply.
//!
//! ```text
//! $ tally-register --server-url http://localhost:5000 --store <store-id>
//! > login ada@example.com secret1
//! > add 1
//! > pay cash 20
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tally_core::session::Session;
use tally_register::{
    Command, ConfigOverrides, FileSessionStorage, HttpGateway, RegisterConfig, RegisterError,
    Terminal,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "tally-register", about = "Terminal register for Tally POS")]
struct Cli {
    /// Path to register.toml (defaults to the platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Base URL of tally-server
    #[arg(long, env = "TALLY_SERVER_URL")]
    server_url: Option<String>,

    /// Store to sell for
    #[arg(long)]
    store: Option<String>,

    /// Where to keep the login session between runs
    #[arg(long)]
    session_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so they never mix with receipts on stdout.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(Cli::parse()).await {
        error!(error = %e, "Register stopped");
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), RegisterError> {
    let overrides = ConfigOverrides {
        server_url: cli.server_url,
        store_id: cli.store,
        session_file: cli.session_file,
    };
    let config = RegisterConfig::load(cli.config, &overrides)?;
    info!(server = %config.server_url, "Register starting");

    let gateway = HttpGateway::new(
        &config.server_url,
        Duration::from_secs(config.request_timeout_secs),
    )?;
    let session_path = config.session_path().ok_or_else(|| {
        RegisterError::Config("no home directory; pass --session-file".to_string())
    })?;
    let session = Session::hydrate(FileSessionStorage::new(session_path));

    let mut terminal = Terminal::new(gateway, session).with_store(config.store_id.clone());

    let mut stdout = tokio::io::stdout();
    let greeting = match terminal.start().await {
        Ok(text) => text,
        Err(e) => format!("Error: {}", e),
    };
    write_reply(&mut stdout, &greeting).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let reply = match line.parse::<Command>() {
            Ok(Command::Quit) => break,
            Ok(command) => terminal.execute(command).await,
            Err(e) => Err(e),
        };
        let text = match reply {
            Ok(text) => text,
            Err(e) => format!("Error: {}", e),
        };
        write_reply(&mut stdout, &text).await?;
    }

    Ok(())
}

async fn write_reply(stdout: &mut tokio::io::Stdout, text: &str) -> std::io::Result<()> {
    stdout.write_all(text.as_bytes()).await?;
    stdout.write_all(b"\n> ").await?;
    stdout.flush().await
}
