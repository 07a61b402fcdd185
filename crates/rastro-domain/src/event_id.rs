//! Deterministic event identifiers.
//!
//! Pixel and server-side submissions of the same conversion must agree on the
//! event id byte-for-byte, with no coordination beyond sharing the same
//! inputs. Both generators here are pure functions of their inputs so the two
//! paths can compute the id independently.

use std::time::{SystemTime, UNIX_EPOCH};

/// Prefix for purchase event ids.
pub const PURCHASE_ID_PREFIX: &str = "pur:";

/// Event id for a purchase conversion.
///
/// `pur:` followed by the trimmed transaction id. A missing or blank
/// transaction id falls back to `pur:` + current unix milliseconds, which
/// defeats cross-channel deduplication; callers should log that case.
pub fn purchase_event_id(transaction_id: Option<&str>) -> String {
    match transaction_id.map(str::trim).filter(|t| !t.is_empty()) {
        Some(t) => format!("{PURCHASE_ID_PREFIX}{t}"),
        None => format!("{PURCHASE_ID_PREFIX}{}", now_millis()),
    }
}

/// Event id for a non-purchase event.
///
/// `e` followed by the lowercase hex rendering of a 32-bit rolling hash over
/// the UTF-16 code units of `event_name + user_id + timestamp_ms`, with a
/// multiplier of 31 and two's-complement wrapping. `user_id` defaults to the
/// empty string and `timestamp_ms` to the current unix milliseconds.
pub fn named_event_id(event_name: &str, user_id: Option<&str>, timestamp_ms: Option<i64>) -> String {
    let ts = timestamp_ms.unwrap_or_else(now_millis);
    let seed = format!("{event_name}{}{ts}", user_id.unwrap_or_default());

    let mut hash: i32 = 0;
    for unit in seed.encode_utf16() {
        hash = hash.wrapping_mul(31).wrapping_add(i32::from(unit));
    }
    format!("e{:x}", hash as u32)
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
