//! Helper functions and utilities
//!
//! This module contains common helper functions used throughout the application.

use std::sync::OnceLock;
use rand::Rng;
use regex::Regex;
use crate::utils::errors::{StudyBuddyError, Result};

/// Truncate text to a maximum number of characters with ellipsis
pub fn truncate_text(text: &str, max_length: usize) -> String {
    if text.chars().count() <= max_length {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_length.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Build a URL slug: lower-case ASCII alphanumerics joined by single dashes
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;

    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// Generate a random lower-case hex token
pub fn generate_token(length: usize) -> String {
    const CHARSET: &[u8] = b"0123456789abcdef";
    let mut rng = rand::thread_rng();

    (0..length)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

/// Subject part of a session topic such as "Physics: Optics" or "Math - Algebra"
pub fn extract_subject(topic: &str) -> String {
    if let Some((subject, _)) = topic.split_once(':') {
        return subject.trim().to_string();
    }
    if let Some((subject, _)) = topic.split_once('-') {
        return subject.trim().to_string();
    }
    topic.trim().to_string()
}

/// Minutes from a free-form duration such as "90 minutes"; 60 when no positive number leads
pub fn parse_duration_minutes(duration: &str) -> i64 {
    let digits: String = duration
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();

    match digits.parse::<i64>() {
        Ok(minutes) if minutes > 0 => minutes,
        _ => 60,
    }
}

/// Reject values longer than `max` characters
pub fn ensure_max_length(value: &str, max: usize, field: &str) -> Result<()> {
    if value.chars().count() > max {
        return Err(StudyBuddyError::InvalidInput(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(())
}

/// Strip a surrounding markdown code fence (```json ... ```) from model output
pub fn strip_code_fences(text: &str) -> &str {
    static FENCE: OnceLock<Option<Regex>> = OnceLock::new();
    let fence = FENCE.get_or_init(|| Regex::new(r"(?s)^\s*```[a-zA-Z]*\s*\n?(.*?)\s*```\s*$").ok());

    let inner = fence
        .as_ref()
        .and_then(|re| re.captures(text))
        .and_then(|c| c.get(1));

    match inner {
        Some(inner) => inner.as_str(),
        None => text.trim(),
    }
}
