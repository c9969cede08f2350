use std::fmt;

use serde::Deserialize;
use validator::Validate;

use crate::account::validation::{email_rules, not_blank};

/// Candidate record for registration, password still in plaintext.
///
/// Missing JSON fields deserialize as empty strings so they are reported by
/// validation alongside every other rejected field.
#[derive(Clone, Default, Deserialize, Validate)]
pub struct NewAccount {
    #[serde(default)]
    #[validate(
        custom(function = "not_blank"),
        length(max = 255, message = "must be at most 255 characters")
    )]
    pub username: String,
    #[serde(default)]
    #[validate(
        email(message = "must be a valid email address"),
        custom(function = "email_rules"),
        length(max = 255, message = "must be at most 255 characters")
    )]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 4, message = "must be at least 4 characters"))]
    pub password: String,
}

impl NewAccount {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for NewAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewAccount")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Partial update. Absent fields are left untouched.
#[derive(Clone, Default, Deserialize, Validate)]
pub struct AccountChanges {
    #[validate(
        custom(function = "not_blank"),
        length(max = 255, message = "must be at most 255 characters")
    )]
    pub username: Option<String>,
    #[validate(
        email(message = "must be a valid email address"),
        custom(function = "email_rules"),
        length(max = 255, message = "must be at most 255 characters")
    )]
    pub email: Option<String>,
    #[validate(length(min = 4, message = "must be at least 4 characters"))]
    pub password: Option<String>,
}

impl AccountChanges {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.email.is_none() && self.password.is_none()
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }
}

impl fmt::Debug for AccountChanges {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountChanges")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
