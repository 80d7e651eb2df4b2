use crate::api::{ApiServer, AppState};
use crate::config::Config;
use anyhow::Result;
use tracing::{info, warn};

pub async fn run_service(config: Config) -> Result<()> {
    info!("Starting Meetdesk service");

    if !config.email.enabled {
        warn!("Email delivery is disabled, notifications will only be logged");
    }
    if let Some(max) = config.otp.max_attempts {
        info!("OTP verification limited to {} failed attempts per code", max);
    }

    let state = AppState::from_config(&config)?;
    let api_server = ApiServer::new(&config, state);

    info!("Meetdesk is ready at {}", config.server.base_url());
    api_server.start().await
}
