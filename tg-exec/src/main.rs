use std::process;

use clap::Parser;
use tracing::debug;

use tg_exec::cli::Args;
use tg_exec::config::AppConfig;
use tg_exec::logging::{LoggingConfig, init_logging};
use tg_exec::notification::TelegramChannel;
use tg_exec::runner::Runner;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let logging = match init_logging() {
        Ok(logging) => Some(logging),
        Err(e) => {
            eprintln!("tg-exec: {e}");
            None
        }
    };

    process::exit(run(args, logging.as_ref()).await);
}

async fn run(args: Args, logging: Option<&LoggingConfig>) -> i32 {
    let mut config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("tg-exec: {e}");
            return e.exit_code();
        }
    };
    args.apply(&mut config);

    if let (true, Some(logging)) = (config.debug, logging) {
        if let Err(e) = logging.enable_debug() {
            eprintln!("tg-exec: {e}");
        }
    }
    debug!(?config, "Configuration resolved");

    let channel = TelegramChannel::new(config.telegram_config()).with_api_base(&config.api_base);
    debug!(
        chat_id = %config.chat_id,
        token = %format_args!("{}...", config.token_hint()),
        "Reporting to Telegram"
    );

    Runner::from_config(&config, channel)
        .run(&args.command_line())
        .await
}
