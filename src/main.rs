use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use trainz_config::Config;
use trainz_dl::logging;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Settings file (TOML, YAML or JSON)
    #[arg(short, long, value_name = "FILE", env = "TRAINZ_DL_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on, overriding the configured one
    #[arg(short, long)]
    bind: Option<SocketAddr>,

    /// Verbose logging
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err:?}");
            return ExitCode::FAILURE;
        },
    };
    if let Some(bind) = cli.bind {
        config.bind = bind;
    }
    config.debug |= cli.debug;

    logging::init(config.debug);
    match trainz_dl::run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = ?err, "server failed");
            ExitCode::FAILURE
        },
    }
}
