use anyhow::Result;
use clap::Parser;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::fs;
use std::path::Path;
use std::str::FromStr;

use waitlist_service::{repositories, services, settings};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "config.toml")]
    config: String,
    #[arg(long, default_value = "log4rs.yaml")]
    log4rs: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let args = Args::parse();
    let config = settings::Settings::load(&args.config).expect("Could not load config file.");

    init_logging(&args.log4rs).expect("Failed to initialize logging.");
    log::info!("Starting waitlist service.");

    let options = SqliteConnectOptions::from_str(&config.sqlite.url)
        .expect("Invalid database URL.")
        .create_if_missing(true);
    let conn = SqlitePoolOptions::new()
        .max_connections(config.sqlite.max_connections)
        .connect_with(options)
        .await
        .expect("Could not connect to database.");

    repositories::customers::prepare_schema(&conn)
        .await
        .expect("Could not prepare database schema.");

    services::start_services(conn, config)
        .await
        .expect("Could not start services.");

    Ok(())
}

fn init_logging(path: &str) -> Result<(), anyhow::Error> {
    if !Path::new("logs").exists() {
        fs::create_dir("logs")?;
    }

    match log4rs::init_file(path, Default::default()) {
        Ok(_) => {
            println!("[*] Logging initialized successfully.");
            Ok(())
        }
        Err(e) => {
            println!("[ERROR] Failed to initialize logging: {}", e);
            Err(anyhow::anyhow!("Could not initialize logging: {}", e))
        }
    }
}
