//! Registration, login and token refresh.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::password::{hash_password, verify_password, MIN_PASSWORD_LENGTH};
use super::token::{TokenIssuer, TokenPair, TokenType};
use crate::db::{Database, NewUser, UserRecord, UserRepository};
use crate::error::{FieldErrors, MeetError, MeetResult};
use crate::meeting::model::is_valid_email;
use crate::meeting::UserSummary;

const MAX_USERNAME: usize = 150;

/// Public representation of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub full_name: String,
    pub username: String,
    pub email: String,
    /// 1 for staff and superusers, 0 otherwise.
    pub role: u8,
}

impl From<&UserRecord> for UserProfile {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name(),
            username: user.username.clone(),
            email: user.email.clone(),
            role: u8::from(user.is_staff || user.is_superuser),
        }
    }
}

impl UserProfile {
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

fn valid_username(username: &str) -> bool {
    username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
}

impl RegisterRequest {
    fn validate(self) -> MeetResult<(NewUser, String)> {
        let mut errors = FieldErrors::new();

        let username = self.username.unwrap_or_default().trim().to_string();
        if username.is_empty() {
            errors.add("username", "This field may not be blank.");
        } else if username.chars().count() > MAX_USERNAME {
            errors.add(
                "username",
                format!("Ensure this field has no more than {MAX_USERNAME} characters."),
            );
        } else if !valid_username(&username) {
            errors.add(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            );
        }

        let email = self.email.unwrap_or_default().trim().to_string();
        if email.is_empty() {
            errors.add("email", "This field may not be blank.");
        } else if !is_valid_email(&email) {
            errors.add("email", "Enter a valid email address.");
        }

        let password = self.password.unwrap_or_default();
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            errors.add(
                "password",
                format!("Ensure this field has at least {MIN_PASSWORD_LENGTH} characters."),
            );
        }

        errors.into_result()?;

        Ok((
            NewUser {
                username,
                email,
                password_hash: String::new(),
                first_name: self.first_name.unwrap_or_default().trim().to_string(),
                last_name: self.last_name.unwrap_or_default().trim().to_string(),
            },
            password,
        ))
    }
}

pub struct AccountService {
    db: Database,
    tokens: Arc<TokenIssuer>,
}

impl AccountService {
    pub fn new(db: Database, tokens: Arc<TokenIssuer>) -> Self {
        Self { db, tokens }
    }

    pub fn tokens(&self) -> &Arc<TokenIssuer> {
        &self.tokens
    }

    pub async fn register(&self, request: RegisterRequest) -> MeetResult<(UserProfile, TokenPair)> {
        let (mut user, password) = request.validate()?;

        let profile = self
            .db
            .run(move |conn| {
                let mut errors = FieldErrors::new();
                if UserRepository::username_exists(conn, &user.username)? {
                    errors.add("username", "A user with that username already exists.");
                }
                if UserRepository::email_exists(conn, &user.email)? {
                    errors.add("email", "Email already exists.");
                }
                errors.into_result()?;

                user.password_hash = hash_password(&password)?;
                let id = UserRepository::insert(conn, &user)?;
                let record = UserRepository::get(conn, id)?.ok_or(MeetError::NotFound("User"))?;
                Ok(UserProfile::from(&record))
            })
            .await?;

        let pair = self.tokens.issue_pair(&profile.summary())?;
        info!("Registered user {} ({})", profile.username, profile.id);
        Ok((profile, pair))
    }

    pub async fn login(&self, username: &str, password: &str) -> MeetResult<(UserProfile, TokenPair)> {
        let username = username.trim().to_string();
        let password = password.to_string();

        let profile = self
            .db
            .run(move |conn| {
                match UserRepository::find_by_username(conn, &username)? {
                    Some(user) if verify_password(&password, &user.password_hash) => {
                        Ok(UserProfile::from(&user))
                    }
                    _ => {
                        warn!("Failed login for {:?}", username);
                        Err(MeetError::unauthorized("Invalid credentials"))
                    }
                }
            })
            .await?;

        let pair = self.tokens.issue_pair(&profile.summary())?;
        info!("User {} logged in", profile.username);
        Ok((profile, pair))
    }

    /// New access token for a valid refresh token whose user still exists.
    pub async fn refresh(&self, refresh_token: &str) -> MeetResult<String> {
        let claims = self.tokens.verify(refresh_token, TokenType::Refresh)?;
        let profile = self.profile(claims.sub).await?;
        Ok(self.tokens.issue(&profile.summary(), TokenType::Access)?)
    }

    pub async fn profile(&self, user_id: i64) -> MeetResult<UserProfile> {
        self.db
            .run(move |conn| match UserRepository::get(conn, user_id)? {
                Some(user) => Ok(UserProfile::from(&user)),
                None => Err(MeetError::unauthorized("User not found")),
            })
            .await
    }
}
