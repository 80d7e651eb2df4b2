use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "meetdesk")]
#[command(about = "Meeting scheduling with OTP-confirmed completion", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Run the HTTP service (default)
    Serve,
    /// Print version information
    Version,
    /// Log in against a running service and print tokens
    Login(LoginCliArgs),
    /// Inspect and change meetings through a running service
    Meeting(MeetingCliArgs),
}

#[derive(ClapArgs, Debug)]
pub struct LoginCliArgs {
    pub username: String,
    #[arg(long, env = "MEETDESK_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(ClapArgs, Debug)]
pub struct MeetingCliArgs {
    /// Access token from `meetdesk login`
    #[arg(long, env = "MEETDESK_TOKEN", hide_env_values = true)]
    pub token: String,

    #[command(subcommand)]
    pub command: MeetingCommand,
}

#[derive(Subcommand, Debug)]
pub enum MeetingCommand {
    /// List meetings, newest first
    List {
        /// Only show meetings in this status
        #[arg(short, long)]
        status: Option<String>,
        /// Maximum number of results to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
    /// Show one meeting
    Show { uid: String },
    /// Mark a meeting as in progress
    Start { uid: String },
    /// Complete a meeting. Without --otp a code is emailed to the recipients
    Complete {
        uid: String,
        #[arg(long)]
        otp: Option<String>,
    },
    /// Cancel a meeting
    Cancel { uid: String },
    /// Attach a photo to a meeting
    Photo { uid: String, path: PathBuf },
}
