//! Input validation functions
//!
//! Field validators return `Err(message)` with a user-facing message; callers
//! collect them into [`crate::errors::ValidationErrors`].

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;

static EMAIL_RE: Lazy<regex_lite::Regex> =
    Lazy::new(|| regex_lite::Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

static PHONE_RE: Lazy<regex_lite::Regex> =
    Lazy::new(|| regex_lite::Regex::new(r"^[\d\s\-\+\(\)]+$").expect("valid phone regex"));

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MAX_NAME_LEN: usize = 100;
pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_DESCRIPTION_LEN: usize = 1000;
pub const MAX_NOTES_LEN: usize = 1000;
pub const MAX_PROGRESS_NOTES_LEN: usize = 500;
pub const MAX_MEDICAL_CONDITIONS_LEN: usize = 500;

/// Lowercase and trim an email address for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate email format
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email cannot be empty".to_string());
    }
    if email.len() > 255 {
        return Err("Email too long".to_string());
    }
    if !EMAIL_RE.is_match(email) {
        return Err("Invalid email format".to_string());
    }
    Ok(())
}

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        ));
    }
    if password.len() > 128 {
        return Err("Password too long".to_string());
    }
    Ok(())
}

/// Validate a required, length-bounded text field
pub fn validate_required_text(value: &str, max_len: usize) -> Result<(), String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("This field is required".to_string());
    }
    validate_max_len(trimmed, max_len)
}

/// Validate an optional text field's length (character count)
pub fn validate_max_len(value: &str, max_len: usize) -> Result<(), String> {
    if value.chars().count() > max_len {
        return Err(format!("Cannot exceed {} characters", max_len));
    }
    Ok(())
}

/// Validate age in years (1-150)
pub fn validate_age(age: i32) -> Result<(), String> {
    if !(1..=150).contains(&age) {
        return Err("Age must be between 1 and 150".to_string());
    }
    Ok(())
}

/// Validate body weight (in kg)
pub fn validate_weight_kg(weight_kg: f64) -> Result<(), String> {
    if weight_kg.is_nan() || weight_kg.is_infinite() {
        return Err("Weight must be a valid number".to_string());
    }
    if weight_kg < 1.0 {
        return Err("Weight must be at least 1 kg".to_string());
    }
    if weight_kg > 500.0 {
        return Err("Weight must be at most 500 kg".to_string());
    }
    Ok(())
}

/// Validate height value (in cm)
/// Valid range: 50-300 cm
pub fn validate_height_cm(height_cm: f64) -> Result<(), String> {
    if height_cm.is_nan() || height_cm.is_infinite() {
        return Err("Height must be a valid number".to_string());
    }
    if height_cm < 50.0 {
        return Err("Height must be at least 50 cm".to_string());
    }
    if height_cm > 300.0 {
        return Err("Height must be at most 300 cm".to_string());
    }
    Ok(())
}

/// Validate a contact phone number (digits, spaces and `-+()`)
pub fn validate_phone(phone: &str) -> Result<(), String> {
    let trimmed = phone.trim();
    if trimmed.is_empty() || !PHONE_RE.is_match(trimmed) {
        return Err("Invalid phone number".to_string());
    }
    Ok(())
}

/// Validate a strictly positive integer quantity
pub fn validate_positive(value: i32) -> Result<(), String> {
    if value <= 0 {
        return Err("Must be greater than 0".to_string());
    }
    Ok(())
}

/// Validate a progress completion percentage (0-100)
pub fn validate_completion(completion: i32) -> Result<(), String> {
    if !(0..=100).contains(&completion) {
        return Err("Completion must be between 0 and 100".to_string());
    }
    Ok(())
}

/// Validate calendar event duration in minutes (1-480)
pub fn validate_event_duration(minutes: i32) -> Result<(), String> {
    if !(1..=480).contains(&minutes) {
        return Err("Duration must be between 1 and 480 minutes".to_string());
    }
    Ok(())
}

/// Validate reminder lead time in minutes (1-1440)
pub fn validate_reminder_minutes(minutes: i32) -> Result<(), String> {
    if !(1..=1440).contains(&minutes) {
        return Err("Reminder must be between 1 and 1440 minutes".to_string());
    }
    Ok(())
}

/// Validate that an optional end date falls strictly after the start date
pub fn validate_date_order(
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
) -> Result<(), String> {
    match end {
        Some(end) if end <= start => Err("End date must be after the start date".to_string()),
        _ => Ok(()),
    }
}

/// Validate a list that must contain at least one entry
pub fn validate_non_empty<T>(items: &[T], what: &str) -> Result<(), String> {
    if items.is_empty() {
        return Err(format!("At least one {} is required", what));
    }
    Ok(())
}
