//! Strike Mentor terminal client.
//!
//! Reads lines from stdin and prints the transcript as it grows. Logs go to
//! stderr.

use mentor_client::config::{self, Config};
use mentor_client::repl::{self, Command};
use mentor_client::ConversationClient;
use mentor_transport::{HttpFallback, WsTransport};
use mentor_voice::{AudioRecorder, FilePlayer, FileRecorder};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

type Client = ConversationClient<WsTransport, HttpFallback>;

fn resolve_config_path() -> (Option<String>, &'static str) {
    if let Some(path) = std::env::args()
        .nth(1)
        .filter(|value| !value.trim().is_empty())
    {
        return (Some(path), "cli-arg");
    }

    if let Ok(path) = std::env::var("MENTOR_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (Some(path), "env-var");
        }
    }

    (None, "default")
}

fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

#[tokio::main]
async fn main() {
    let (resolved_config_path, config_source) = resolve_config_path();
    let selected_config_path = resolved_config_path.as_deref().or(Some("mentor.toml"));

    let config = config::load_config(selected_config_path)
        .expect("failed to load configuration; fix the config file or unset MENTOR_CONFIG_PATH");

    init_tracing(&config);

    tracing::info!(
        source = config_source,
        path = selected_config_path.unwrap_or("<none>"),
        "resolved startup configuration path"
    );

    let transport = WsTransport::new(config.endpoint.ws_config());
    let fallback = HttpFallback::new(&config.endpoint.http_url, config.endpoint.request_timeout())
        .expect("failed to build HTTP client for the fallback channel");
    let client = Arc::new(ConversationClient::new(
        config.conversation.identity.clone(),
        transport,
        fallback,
    ));
    let player = FilePlayer::new(&config.audio.output_dir);

    let printer = tokio::spawn(print_transcript(client.clone()));

    let connectivity = client.start().await;
    println!("Strike Mentor ({})", connectivity);
    if client.transcript_len() == 0 {
        println!("Try one of these (/ask <n>):\n{}", repl::render_suggestions());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        let line = tokio::select! {
            _ = &mut ctrl_c => break,
            line = lines.next_line() => line,
        };
        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::error!(error = %e, "failed to read stdin");
                break;
            }
        };

        if !handle(&client, &player, Command::parse(&line)).await {
            break;
        }
    }

    client.shutdown();
    printer.abort();
    tracing::info!("strike-mentor exited");
}

/// Runs one command. Returns `false` when the user asked to quit.
async fn handle(client: &Client, player: &FilePlayer, command: Command) -> bool {
    // Send failures are already in the transcript; the log line is enough here.
    let result = match command {
        Command::Empty => Ok(()),
        Command::Quit => return false,
        Command::Say(text) => client.send_text(&text).await,
        Command::Ask(n) => match repl::suggested(n) {
            Some(question) => client.send_text(question).await,
            None => Ok(()),
        },
        Command::Voice(path) => match FileRecorder::new(&path).record().await {
            Ok(capture) => client.send_voice(&capture).await,
            Err(e) => {
                eprintln!("could not record from {}: {}", path.display(), e);
                Ok(())
            }
        },
        Command::Play(index) => {
            let result = client.play(index, player).await;
            if result.is_ok() {
                println!("saved to {}", player.output_dir().display());
            }
            result
        }
        Command::Suggest => {
            println!("{}", repl::render_suggestions());
            Ok(())
        }
        Command::Status => {
            println!(
                "{} as {} ({} entries)",
                client.connectivity(),
                client.identity(),
                client.transcript_len()
            );
            Ok(())
        }
        Command::Invalid(usage) => {
            eprintln!("{}", usage);
            Ok(())
        }
    };

    if let Err(e) = result {
        tracing::warn!(error = %e, "command failed");
    }
    true
}

async fn print_transcript(client: Arc<Client>) {
    let mut updates = client.subscribe();
    let mut index = client.transcript_len();
    loop {
        match updates.recv().await {
            Ok(entry) => {
                println!("{}", repl::render_entry(index, &entry));
                index += 1;
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "transcript printer fell behind");
                index += skipped as usize;
            }
            Err(RecvError::Closed) => break,
        }
    }
}
