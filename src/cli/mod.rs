pub mod args;
pub mod config;
pub mod doctor;

pub use args::{Cli, CliCommand, ConfigCliArgs, ConfigCommand, DoctorCliArgs, ServeCliArgs};
pub use config::handle_config_command;
pub use doctor::handle_doctor_command;

use crate::app;
use crate::config::Config;
use anyhow::Result;

/// Load configuration, apply command-line overrides and serve.
pub async fn handle_serve_command(args: ServeCliArgs) -> Result<()> {
    let mut config = Config::load()?;

    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(host) = args.host {
        config.server.host = host;
    }

    app::run_service(config).await
}
