// src/main.rs
mod api;
mod config;
mod model;
mod optimizer;
mod types;
mod volume;

use config::AppConfig;

#[tokio::main]
async fn main() {
    if let Err(err) = dotenvy::dotenv() {
        if !matches!(err, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            eprintln!("⚠️ Could not load .env: {}", err);
        }
    }

    let AppConfig {
        api,
        fleet,
        optimizer,
    } = AppConfig::from_env();

    println!("🚀 Loading plan service starting...");
    api::start_api_server(api, fleet, optimizer).await;
}
