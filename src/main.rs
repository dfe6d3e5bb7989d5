mod chat;
mod config;
mod instrumentation;
mod llm;
mod lookup;
mod relay;
mod voice;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};

use chat::ChatSession;
use config::Config;
use voice::VoiceInput;

#[derive(Parser)]
#[command(
    name = "di-assistant",
    about = "Drug-information chat assistant with literature and drug-reference enrichment"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Print per-turn lookup and model statistics
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a single question
    Ask {
        /// The question to answer
        question: String,
    },
    /// Interactive conversation (:voice to dictate, exit to quit)
    Chat,
    /// Run the cross-origin relay forwarder for browser clients
    Relay,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Commands::Ask { question } => {
            let mut session = ChatSession::new(&config)?;
            if let Some(turn_log) = session.submit(&question).await {
                println!("\n{}\n", session.last_reply());
                if cli.verbose {
                    println!("{}", turn_log.summary());
                }
            }
        }
        Commands::Chat => run_repl(&config, cli.verbose).await?,
        Commands::Relay => relay::serve(&config).await?,
    }

    Ok(())
}

async fn run_repl(config: &Config, verbose: bool) -> Result<()> {
    let mut session = ChatSession::new(config)?;
    let voice = VoiceInput::new(config.voice_capture_cmd.clone());

    println!("{}", session.last_reply());

    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let utterance = match line.trim() {
            "" => continue,
            "exit" | "quit" => break,
            ":voice" => {
                if !voice.is_available() {
                    // Capability absent: the trigger is a no-op.
                    continue;
                }
                match voice.capture().await {
                    Some(text) => {
                        println!("🎤 {}", text);
                        text
                    }
                    // Capture failed; already logged.
                    None => continue,
                }
            }
            text => text.to_string(),
        };

        if let Some(turn_log) = session.submit(&utterance).await {
            println!("{}", session.last_reply());
            if verbose {
                eprintln!("{}", turn_log.summary());
            }
        }
    }

    Ok(())
}
