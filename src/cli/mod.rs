pub mod args;
pub mod client;
pub mod meeting;

pub use args::{Cli, CliCommand, LoginCliArgs, MeetingCliArgs, MeetingCommand};
pub use meeting::handle_meeting_command;

use anyhow::Result;
use serde_json::json;

use client::MeetdeskClient;

pub async fn handle_login_command(args: LoginCliArgs, base_url: &str) -> Result<()> {
    let client = MeetdeskClient::new(base_url);
    let json = client
        .post(
            "/auth/login",
            &json!({ "username": args.username, "password": args.password }),
        )
        .await?;

    let access = json.get("access").and_then(|v| v.as_str()).unwrap_or("");
    let refresh = json.get("refresh").and_then(|v| v.as_str()).unwrap_or("");

    println!("Logged in as {}", args.username);
    println!("Access token:  {}", access);
    println!("Refresh token: {}", refresh);
    println!();
    println!("export MEETDESK_TOKEN={}", access);

    Ok(())
}
