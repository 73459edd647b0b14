// src/models/user.rs

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9]+$").expect("valid username regex"));

/// Words a username may not contain.
const RESTRICTED_USERNAMES: [&str; 7] = [
    "admin",
    "root",
    "support",
    "moderator",
    "system",
    "dirkhir",
    "staff",
];

/// Role assigned to every self-registered account.
pub const DEFAULT_ROLE: &str = "member";

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,

    /// Unique, lower-cased username.
    pub username: String,

    /// Unique, lower-cased email.
    pub email: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    pub email_verified: bool,
    pub gender: bool,

    /// User role, 'member' unless changed by an operator.
    pub role: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Values for inserting a user. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub gender: bool,
}

fn validate_username_words(username: &str) -> Result<(), ValidationError> {
    let lowered = username.to_lowercase();
    if RESTRICTED_USERNAMES.iter().any(|word| lowered.contains(word)) {
        return Err(ValidationError::new("username")
            .with_message("Username contains disallowed words".into()));
    }
    Ok(())
}

fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    let checks: [(fn(char) -> bool, &'static str); 4] = [
        (|c| c.is_ascii_uppercase(), "Password must contain at least one uppercase letter."),
        (|c| c.is_ascii_lowercase(), "Password must contain at least one lowercase letter."),
        (|c| c.is_ascii_digit(), "Password must contain at least one number."),
        (|c| !c.is_ascii_alphanumeric(), "Password must contain at least one symbol."),
    ];

    for (check, message) in checks {
        if !password.chars().any(check) {
            return Err(ValidationError::new("password").with_message(message.into()));
        }
    }
    Ok(())
}

/// DTO for creating a new user (Registration).
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(length(min = 4, max = 100, message = "Name must be at least 4 characters"))]
    pub name: String,

    #[validate(
        length(min = 4, max = 10, message = "Username must be between 4 and 10 characters"),
        regex(path = *USERNAME_RE, message = "Only letters and numbers allowed"),
        custom(function = validate_username_words)
    )]
    pub username: String,

    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(
        length(min = 8, max = 128, message = "Password must be at least 8 characters long."),
        custom(function = validate_password_strength)
    )]
    pub password: String,

    #[validate(must_match(other = "password", message = "Passwords don't match"))]
    pub confirm_password: String,

    pub gender: bool,
}

/// DTO for user login. `login` accepts either the username or the email.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(alias = "username", alias = "email")]
    #[validate(length(min = 1, max = 255))]
    pub login: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreateUserRequest {
        CreateUserRequest {
            name: "Amina Idrissi".into(),
            username: "amina".into(),
            email: "amina@example.com".into(),
            password: "Str0ng!pass".into(),
            confirm_password: "Str0ng!pass".into(),
            gender: false,
        }
    }

    #[test]
    fn valid_registration_passes() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn rejects_restricted_username() {
        let req = CreateUserRequest {
            username: "theadmin".into(),
            ..request()
        };
        assert!(req.validate().unwrap_err().field_errors().contains_key("username"));
    }

    #[test]
    fn rejects_weak_password_and_mismatch() {
        let req = CreateUserRequest {
            password: "alllowercase1".into(),
            confirm_password: "different".into(),
            ..request()
        };
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("password"));
        assert!(fields.contains_key("confirm_password"));
    }
}
