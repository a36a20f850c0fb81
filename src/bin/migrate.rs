//! Standalone migration runner.
//!
//! Reads the same configuration as the application and brings the schema to
//! the latest version:
//!
//! ```text
//! APP__DATABASE_URL=postgres://... cargo run --bin migrate
//! ```

use forgeline_api::{config, db, logging};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let cfg = match config::load_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    logging::init_tracing(&cfg);

    let pool = match db::establish_connection_from_app_config(&cfg).await {
        Ok(pool) => pool,
        Err(e) => {
            error!(error = %e, "failed to connect to database");
            std::process::exit(1);
        }
    };

    if let Err(e) = db::run_migrations(&pool).await {
        error!(error = %e, "migrations failed");
        std::process::exit(1);
    }

    info!("schema is up to date");
}
