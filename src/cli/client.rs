//! HTTP client for a running Meetdesk service.

use anyhow::{bail, Context, Result};
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response};
use serde_json::Value;
use std::path::Path;
use tokio::fs;

pub struct MeetdeskClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

/// Pull the `error` message out of a failure body.
pub fn error_message(body: &Value) -> &str {
    body.get("error")
        .and_then(|m| m.as_str())
        .unwrap_or("Unknown error")
}

impl MeetdeskClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn read(response: Response) -> Result<Value> {
        let status = response.status();
        let body: Value = if status == reqwest::StatusCode::NO_CONTENT {
            Value::Null
        } else {
            response
                .json()
                .await
                .context("Service returned a non-JSON response")?
        };

        if !status.is_success() {
            bail!("{} ({})", error_message(&body), status);
        }
        Ok(body)
    }

    pub async fn get(&self, path: &str) -> Result<Value> {
        let response = self
            .authorize(self.client.get(self.url(path)))
            .send()
            .await
            .context("Failed to connect to Meetdesk service. Is it running?")?;
        Self::read(response).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        let response = self
            .authorize(self.client.post(self.url(path)))
            .json(body)
            .send()
            .await
            .context("Failed to connect to Meetdesk service. Is it running?")?;
        Self::read(response).await
    }

    pub async fn upload(&self, path: &str, file_path: &Path) -> Result<Value> {
        let data = fs::read(file_path)
            .await
            .with_context(|| format!("Failed to read {:?}", file_path))?;

        let filename = file_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("photo")
            .to_string();

        let mime_type = match file_path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("png") => "image/png",
            Some("gif") => "image/gif",
            Some("webp") => "image/webp",
            Some("heic") => "image/heic",
            _ => "application/octet-stream",
        };

        let form = Form::new().part(
            "file",
            Part::bytes(data).file_name(filename).mime_str(mime_type)?,
        );

        let response = self
            .authorize(self.client.post(self.url(path)))
            .multipart(form)
            .send()
            .await
            .context("Failed to upload photo")?;
        Self::read(response).await
    }
}
