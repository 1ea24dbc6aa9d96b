//! Helper functions and utilities
//!
//! This module contains common helper functions used throughout the application.

use std::sync::OnceLock;
use base64::Engine;
use regex::Regex;
use uuid::Uuid;

/// Gateway limit on the length of an order receipt
pub const MAX_RECEIPT_LEN: usize = 40;

/// Generate a new UUID v4
pub fn generate_uuid() -> String {
    Uuid::new_v4().to_string()
}

/// Create a URL-safe slug: lowercase ASCII alphanumerics joined by single dashes
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_dash = false;

    for c in value.trim().chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }

    if slug.is_empty() {
        "event".to_string()
    } else {
        slug
    }
}

fn email_regex() -> Option<&'static Regex> {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").ok())
        .as_ref()
}

/// Validate email format (local@domain.tld)
pub fn is_valid_email(email: &str) -> bool {
    email_regex().map_or(false, |re| re.is_match(email))
}

/// Lowercased domain part of an address
pub fn email_domain(email: &str) -> Option<String> {
    email.rsplit_once('@').map(|(_, domain)| domain.to_lowercase())
}

/// Check an address's domain against an allow-list, case-insensitively
pub fn is_allowed_domain(email: &str, allowed: &[String]) -> bool {
    match email_domain(email) {
        Some(domain) => allowed.iter().any(|d| d.trim().eq_ignore_ascii_case(&domain)),
        None => false,
    }
}

/// True for empty or whitespace-only strings
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Escape text for inclusion in an HTML body
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Build a gateway order receipt `ORD_{slug}_{credential prefix}_{unix ts}`
pub fn order_receipt(slug: &str, credential: &str, unix_ts: i64) -> String {
    let prefix: String = credential.chars().take(8).collect();
    let receipt = format!("ORD_{}_{}_{}", slug, prefix, unix_ts);
    truncate_chars(&receipt, MAX_RECEIPT_LEN)
}

/// Truncate to at most `max` characters without splitting a char
pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Generate a random URL-safe token from `bytes` bytes of entropy
pub fn generate_token(bytes: usize) -> String {
    use rand::RngCore;
    let mut buf = vec![0u8; bytes];
    rand::thread_rng().fill_bytes(&mut buf);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buf)
}
