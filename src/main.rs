// src/main.rs

use env_logger::Env;
use log::error;

use taskline_board::config::Config;
use taskline_board::{server, AppState};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
        }
    };

    let state = match AppState::init(config).await {
        Ok(state) => state,
        Err(e) => {
            error!("Could not open the task store: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()));
        }
    };

    server::serve(state).await
}
