pub mod action;
pub mod config;
pub mod logger;
pub mod tunnel;

use clap::Parser;

// ntex runtime so `serve` can run the web server
#[ntex::main]
async fn main() -> anyhow::Result<()> {
    let args = action::AppArgs::parse();

    // `serve` logs through logfire, which also takes over `log`
    if !matches!(args.action, action::Action::Serve) {
        logger::setup_simple_logger()?;
    }

    args.run().await
}
