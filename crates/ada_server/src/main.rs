use std::process::ExitCode;

use ada_core::{init_logging, open_db};
use ada_server::{config::Config, seed_store, serve, state::AppState, StartupError};
use log::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=startup module=main status=error detail={err}");
            eprintln!("ada-server: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), StartupError> {
    let config = Config::load()?;

    init_logging(config.log_level, &config.log_dir)?;
    config.log_summary();

    let conn = open_db(&config.db_path)?;
    if let Some(path) = config.store_seed.clone() {
        let inserted = seed_store(&conn, &path)?;
        info!(
            "event=store_seed module=main status=ok path={} inserted={inserted}",
            path.display()
        );
    }

    serve(AppState::new(conn, config)).await
}
