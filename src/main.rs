use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "translate-portal",
    version,
    about = "Text, PDF and voice translation over hosted inference models"
)]
struct Cli {
    /// Listen address (overrides [server] addr)
    #[arg(short = 'a', long = "addr")]
    addr: Option<String>,

    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "settings")]
    settings: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long = "verbose")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    translate_portal::logging::init(cli.verbose)?;
    let mut settings = translate_portal::settings::load_settings(cli.settings.as_deref())?;
    if let Some(addr) = cli.addr {
        settings.addr = addr;
    }
    translate_portal::server::run_server(settings).await
}
