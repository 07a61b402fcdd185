//! User-field normalization for ad-platform matching.
//!
//! Match quality depends on both dispatch paths hashing the exact same bytes,
//! so every normalizer here is pure, total and idempotent: feeding a
//! normalizer its own output returns it unchanged. Blank input normalizes to
//! `None` rather than an empty string so absent fields stay absent on the
//! wire.

use serde::{Deserialize, Serialize};
use url::Url;

/// Query parameter names stripped from source URLs before storage/forwarding.
const SENSITIVE_QUERY_KEYS: [&str; 5] = ["token", "password", "secret", "key", "auth"];

/// Trim and lowercase an email address.
///
/// Values without an `@` are discarded; the ad platform cannot match them and
/// hashing garbage only pollutes the audit trail.
pub fn normalize_email(raw: &str) -> Option<String> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return None;
    }
    Some(email)
}

/// Reduce a phone number to its digits.
///
/// `"(11) 91234-5678"` becomes `"11912345678"`. Formatting, spaces and the
/// leading `+` all vanish; country codes are kept as plain digits.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() { None } else { Some(digits) }
}

/// Trim and lowercase a personal name component.
pub fn normalize_name(raw: &str) -> Option<String> {
    let name = raw.trim().to_lowercase();
    if name.is_empty() { None } else { Some(name) }
}

/// Reduce an external id (CPF in practice) to its digits.
pub fn normalize_external_id(raw: &str) -> Option<String> {
    normalize_phone(raw)
}

/// Scrub a page URL for storage and forwarding.
///
/// Drops the fragment and removes query parameters carrying secrets
/// (`token`, `password`, `secret`, `key`, `auth`, matched case-insensitively).
/// Input that does not parse as an absolute URL is passed through unchanged;
/// a mangled referrer is still better audit data than none.
pub fn normalize_source_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let mut url = match Url::parse(trimmed) {
        Ok(url) => url,
        Err(_) => return Some(raw.to_owned()),
    };
    url.set_fragment(None);

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(name, _)| {
            !SENSITIVE_QUERY_KEYS
                .iter()
                .any(|sensitive| name.eq_ignore_ascii_case(sensitive))
        })
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect();

    if kept.is_empty() {
        url.set_query(None);
    } else {
        let mut pairs = url.query_pairs_mut();
        pairs.clear();
        for (name, value) in &kept {
            pairs.append_pair(name, value);
        }
    }
    Some(url.to_string())
}

/// User fields as submitted by the page snippet or the bot, pre-normalization.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawUserData {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub external_id: Option<String>,
}

/// The normalized counterpart of [`RawUserData`].
///
/// Fields hold plaintext normalized values; hashing is a wire concern of the
/// Conversions API client, not of the domain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedUserData {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub external_id: Option<String>,
}

impl NormalizedUserData {
    pub fn from_raw(raw: &RawUserData) -> Self {
        Self {
            email: raw.email.as_deref().and_then(normalize_email),
            phone: raw.phone.as_deref().and_then(normalize_phone),
            first_name: raw.first_name.as_deref().and_then(normalize_name),
            last_name: raw.last_name.as_deref().and_then(normalize_name),
            external_id: raw.external_id.as_deref().and_then(normalize_external_id),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.phone.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.external_id.is_none()
    }

    /// Last-write-wins field merge; `newer` fields override where present.
    pub fn merged_with(self, newer: Self) -> Self {
        Self {
            email: newer.email.or(self.email),
            phone: newer.phone.or(self.phone),
            first_name: newer.first_name.or(self.first_name),
            last_name: newer.last_name.or(self.last_name),
            external_id: newer.external_id.or(self.external_id),
        }
    }
}
