use rgenai_slackbot::{
    logger::{self, LoggerConfig},
    BridgeConfig, EventOrchestrator, OpenAiImageClient, SlackWebClient, SocketModeListener,
};
use std::sync::Arc;

const LOG_FILE_MAX_BYTES: u64 = 10 * 1024 * 1024;
const LOG_FILE_BACKUPS: u32 = 5;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // config.env first so it wins over a stray .env
    let _ = dotenv::from_filename("config.env");
    let _ = dotenv::dotenv();

    let config = match BridgeConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    logger::init_with_config(
        LoggerConfig::development()
            .with_level(config.logging.level)
            .with_colors(!config.logging.json)
            .with_json_output(config.logging.json)
            .with_rotating_files(&config.logging.directory)
            .with_rotation(LOG_FILE_MAX_BYTES, LOG_FILE_BACKUPS),
    )?;

    logger::log_startup_info(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    logger::log_config_info(&config);
    if config.image_count > 1 {
        log::warn!(
            "⚠️  OPENAI_IMAGE_COUNT is {}, only the first image of each response is posted",
            config.image_count
        );
    }

    let provider = Arc::new(OpenAiImageClient::new(&config.openai));
    let chat = Arc::new(SlackWebClient::new(&config.slack));
    let orchestrator = Arc::new(EventOrchestrator::from_config(&config, provider, chat));
    let listener = SocketModeListener::new(&config.slack, orchestrator);

    log::info!("🔌 Listening for Slack events over Socket Mode");
    tokio::select! {
        result = listener.run() => {
            if let Err(e) = result {
                log::error!("❌ Socket Mode listener stopped: {}", e);
                return Err(e.into());
            }
        }
        _ = tokio::signal::ctrl_c() => {
            log::info!("👋 Shutting down");
        }
    }

    Ok(())
}
