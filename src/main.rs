use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use soulmate_gateway::api::{ApiServer, ApiState};
use soulmate_gateway::{ChatOrchestrator, Config, VoicePipeline, VoiceSelector};

/// SoulMate - conversational companion with voice replies
#[derive(Parser)]
#[command(name = "soulmate", version, about)]
struct Cli {
    /// Port to listen on (overrides config)
    #[arg(long, env = "SOULMATE_PORT")]
    port: Option<u16>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable spoken replies
    #[arg(long)]
    disable_voice: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Send one message and print the reply
    Chat {
        /// Message text
        message: String,
    },
    /// Synthesize text in the voice matching its language
    Say {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the voice reply system.")]
        text: String,
        /// Output file for the MP3 audio
        #[arg(short, long, default_value = "reply.mp3")]
        output: PathBuf,
        /// Language tag to use instead of detection
        #[arg(short, long)]
        language: Option<String>,
    },
    /// Print the language to voice table
    Voices,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,soulmate_gateway=info",
        1 => "info,soulmate_gateway=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load_with_options(cli.disable_voice)?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(cmd) = cli.command {
        return match cmd {
            Command::Chat { message } => cmd_chat(&config, &message).await,
            Command::Say {
                text,
                output,
                language,
            } => cmd_say(&config, &text, &output, language.as_deref()).await,
            Command::Voices => {
                cmd_voices(&config);
                Ok(())
            }
        };
    }

    let port = cli.port.unwrap_or(config.server.port);
    tracing::info!(
        persona = %config.persona.name,
        port,
        voice = config.voice.enabled,
        "starting soulmate gateway"
    );

    let chat = ChatOrchestrator::from_config(&config);
    let voices = VoiceSelector::with_overrides(&config.voice.profiles);
    let state = ApiState::new(chat, config.persona.id.clone(), config.persona.name.clone())
        .with_voices(voices);

    ApiServer::new(state, port)
        .static_dir(config.server.static_dir.clone())
        .run()
        .await?;

    Ok(())
}

/// Run a single chat turn
async fn cmd_chat(config: &Config, message: &str) -> anyhow::Result<()> {
    let chat = ChatOrchestrator::from_config(config);
    let result = chat.submit_message(message).await;

    println!("{}", result.reply_text);
    match &result.synthesis {
        Some(s) => println!(
            "\n[audio: {} bytes, language {}, voice {}]",
            s.audio_bytes.len(),
            s.language,
            s.voice_id
        ),
        None => println!("\n[no audio]"),
    }

    Ok(())
}

/// Synthesize text to an MP3 file
async fn cmd_say(
    config: &Config,
    text: &str,
    output: &std::path::Path,
    language: Option<&str>,
) -> anyhow::Result<()> {
    let pipeline = VoicePipeline::from_config(&config.voice, &config.api_keys).ok_or_else(|| {
        anyhow::anyhow!("voice synthesis is not configured (set SOULMATE_TTS_ENDPOINT or SOULMATE_TTS_PROVIDER=openai)")
    })?;

    let spoken = match language {
        Some(tag) => pipeline.speak_as(text, tag).await?,
        None => pipeline.speak(text).await?,
    };

    tokio::fs::write(output, &spoken.audio).await?;
    println!(
        "Wrote {} bytes ({} / {}) to {}",
        spoken.audio.len(),
        spoken.language,
        spoken.voice.voice_id,
        output.display()
    );

    Ok(())
}

/// Print the resolved voice table
fn cmd_voices(config: &Config) {
    let selector = VoiceSelector::with_overrides(&config.voice.profiles);

    for profile in selector.profiles() {
        println!("{:<6} {}", profile.language, profile.voice_id);
    }
    println!(
        "\nunrecognized languages use {} ({}), fallback tag {}",
        selector.default_profile().voice_id,
        selector.default_profile().language,
        config.voice.fallback_language
    );
}
