//! Form validation
//!
//! Field-level checks for user-submitted forms. Errors are collected per
//! field so a front end can render each message next to its input instead
//! of failing on the first problem.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{ClientError, ClientResult};

/// Minimum password length accepted at registration and reset
pub const MIN_PASSWORD_LEN: usize = 8;

/// Maximum length for post bodies
pub const MAX_POST_LEN: usize = 2000;

/// Maximum length for group and event titles
pub const MAX_TITLE_LEN: usize = 120;

/// Validation messages keyed by field name.
///
/// Keys iterate in sorted order so rendered output is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    fields: BTreeMap<String, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for `field`. The first message for a field wins.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    /// Message for a field, if it failed
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `Ok(())` when nothing failed, otherwise `ClientError::Validation`
    pub fn into_result(self) -> ClientResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ClientError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.fields {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", field, message)?;
            first = false;
        }
        Ok(())
    }
}

/// Loose email shape check: one `@`, non-empty local part, dotted domain
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.contains(char::is_whitespace)
}

fn check_required(errors: &mut ValidationErrors, field: &str, value: &str, label: &str) {
    if value.trim().is_empty() {
        errors.add(field, format!("{} is required", label));
    }
}

fn check_password(errors: &mut ValidationErrors, field: &str, password: &str) {
    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.add(
            field,
            format!("Password must be at least {} characters", MIN_PASSWORD_LEN),
        );
    }
}

pub fn validate_login(email: &str, password: &str) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    if !is_valid_email(email) {
        errors.add("email", "Enter a valid email address");
    }
    check_required(&mut errors, "password", password, "Password");
    errors
}

pub fn validate_registration(
    first_name: &str,
    last_name: &str,
    email: &str,
    password: &str,
    confirm_password: &str,
) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    check_required(&mut errors, "firstName", first_name, "First name");
    check_required(&mut errors, "lastName", last_name, "Last name");
    if !is_valid_email(email) {
        errors.add("email", "Enter a valid email address");
    }
    check_password(&mut errors, "password", password);
    if password != confirm_password {
        errors.add("confirmPassword", "Passwords do not match");
    }
    errors
}

pub fn validate_password_reset(password: &str, confirm_password: &str) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    check_password(&mut errors, "password", password);
    if password != confirm_password {
        errors.add("confirmPassword", "Passwords do not match");
    }
    errors
}

/// A post needs text or at least one attachment
pub fn validate_post(content: &str, attachment_count: usize) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    if content.trim().is_empty() && attachment_count == 0 {
        errors.add("content", "Write something or attach a photo");
    }
    if content.chars().count() > MAX_POST_LEN {
        errors.add(
            "content",
            format!("Posts are limited to {} characters", MAX_POST_LEN),
        );
    }
    errors
}

pub fn validate_event(
    title: &str,
    location: &str,
    starts_at: DateTime<Utc>,
    ends_at: Option<DateTime<Utc>>,
) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    check_required(&mut errors, "title", title, "Title");
    if title.chars().count() > MAX_TITLE_LEN {
        errors.add("title", format!("Title is limited to {} characters", MAX_TITLE_LEN));
    }
    check_required(&mut errors, "location", location, "Location");
    if let Some(end) = ends_at {
        if end <= starts_at {
            errors.add("endsAt", "End time must be after the start time");
        }
    }
    errors
}

pub fn validate_group(name: &str, description: &str) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    check_required(&mut errors, "name", name, "Group name");
    if name.chars().count() > MAX_TITLE_LEN {
        errors.add("name", format!("Group name is limited to {} characters", MAX_TITLE_LEN));
    }
    check_required(&mut errors, "description", description, "Description");
    errors
}
