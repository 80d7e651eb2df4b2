//! CLI handler for meeting commands.
//!
//! All commands communicate via the HTTP API.

use anyhow::Result;
use serde_json::{json, Value};

use crate::cli::args::{MeetingCliArgs, MeetingCommand};
use crate::cli::client::MeetdeskClient;

pub async fn handle_meeting_command(args: MeetingCliArgs, base_url: &str) -> Result<()> {
    let client = MeetdeskClient::new(base_url).with_token(args.token);

    match args.command {
        MeetingCommand::List { status, limit } => list_meetings(&client, status, limit).await,
        MeetingCommand::Show { uid } => show_meeting(&client, &uid).await,
        MeetingCommand::Start { uid } => change_status(&client, &uid, "mark-in-progress").await,
        MeetingCommand::Complete { uid, otp } => complete_meeting(&client, &uid, otp).await,
        MeetingCommand::Cancel { uid } => change_status(&client, &uid, "mark-cancelled").await,
        MeetingCommand::Photo { uid, path } => {
            let json = client
                .upload(&format!("/meetings/{}/upload-photo", uid), &path)
                .await?;
            println!(
                "Photo uploaded (id: {})",
                json.get("photo_id").and_then(|v| v.as_i64()).unwrap_or(0)
            );
            Ok(())
        }
    }
}

fn field<'a>(meeting: &'a Value, key: &str) -> &'a str {
    meeting.get(key).and_then(|v| v.as_str()).unwrap_or("")
}

fn summary_line(meeting: &Value) -> String {
    format!(
        "{} {} [{}] {} ({} min)",
        field(meeting, "uid"),
        field(meeting, "title"),
        field(meeting, "status"),
        field(meeting, "start_time"),
        meeting
            .get("duration_minutes")
            .and_then(|v| v.as_u64())
            .unwrap_or(0)
    )
}

fn print_meeting(meeting: &Value) {
    println!("Meeting: {}", field(meeting, "title"));
    println!("UID: {}", field(meeting, "uid"));
    println!("Status: {}", field(meeting, "status"));
    println!("Type: {}", field(meeting, "meeting_type"));
    println!("Location: {}", field(meeting, "location"));
    println!("Start: {}", field(meeting, "start_time"));
    println!(
        "Duration: {} min",
        meeting
            .get("duration_minutes")
            .and_then(|v| v.as_u64())
            .unwrap_or(0)
    );

    let description = field(meeting, "description");
    if !description.is_empty() {
        println!("Description: {}", description);
    }

    let list = |key: &str| -> Vec<String> {
        meeting
            .get(key)
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    };
    println!("Recipients: {}", list("recipient_emails").join(", "));

    let next = list("next_status");
    if next.is_empty() {
        println!("Next: (final)");
    } else {
        println!("Next: {}", next.join(", "));
    }

    if let Some(photos) = meeting.get("photos").and_then(|v| v.as_array()) {
        for photo in photos {
            println!(
                "Photo #{}: {}",
                photo.get("id").and_then(|v| v.as_i64()).unwrap_or(0),
                field(photo, "file")
            );
        }
    }
}

async fn list_meetings(client: &MeetdeskClient, status: Option<String>, limit: usize) -> Result<()> {
    let mut path = format!("/meetings?limit={}", limit);
    if let Some(status) = status {
        path.push_str(&format!("&status={}", status));
    }

    let json = client.get(&path).await?;
    let meetings = json
        .get("data")
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();

    if meetings.is_empty() {
        println!("No meetings found.");
        return Ok(());
    }

    for meeting in &meetings {
        println!("{}", summary_line(meeting));
    }

    Ok(())
}

async fn show_meeting(client: &MeetdeskClient, uid: &str) -> Result<()> {
    let json = client.get(&format!("/meetings/{}", uid)).await?;
    if let Some(meeting) = json.get("data") {
        print_meeting(meeting);
    }
    Ok(())
}

async fn change_status(client: &MeetdeskClient, uid: &str, action: &str) -> Result<()> {
    let json = client
        .post(&format!("/meetings/{}/{}", uid, action), &json!({}))
        .await?;
    println!("{}", field(&json, "message"));
    Ok(())
}

async fn complete_meeting(client: &MeetdeskClient, uid: &str, otp: Option<String>) -> Result<()> {
    let body = match &otp {
        Some(code) => json!({ "otp_code": code }),
        None => json!({}),
    };

    let json = client
        .post(&format!("/meetings/{}/mark-completed", uid), &body)
        .await?;
    println!("{}", field(&json, "message"));

    if otp.is_none() {
        println!("Run again with --otp <CODE> once a recipient shares the code.");
    }

    Ok(())
}
