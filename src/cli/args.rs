use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "recap")]
#[command(about = "AI meeting notes summarizer backend", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Run the HTTP server (default when no command is given)
    Serve(ServeCliArgs),
    /// Check credentials and provider connectivity
    Doctor(DoctorCliArgs),
    /// Create or inspect the config file
    Config(ConfigCliArgs),
    /// Print version information
    Version,
}

#[derive(ClapArgs, Debug, Default)]
pub struct ServeCliArgs {
    /// Override the listening port
    #[arg(short, long)]
    pub port: Option<u16>,
    /// Override the listening address
    #[arg(long)]
    pub host: Option<String>,
}

#[derive(ClapArgs, Debug)]
pub struct DoctorCliArgs {
    /// Skip the live test generation (only probe connectivity)
    #[arg(long)]
    pub skip_generation: bool,
}

#[derive(ClapArgs, Debug)]
pub struct ConfigCliArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Write a config file with default values
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration with secrets masked
    Show,
}
