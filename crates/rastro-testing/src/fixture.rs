//! Access to the published HTTP contract fixtures.
//!
//! The files under `contracts/http/` are the source of truth for what the
//! tracking endpoints promise. Integration tests load them through these
//! helpers and replay their request bodies against the usecases, so a drift
//! between handler behavior and the published contract fails a test instead
//! of a deployment.

use std::path::{Path, PathBuf};

use serde_json::Value;

/// Workspace root, found by walking up from the compiling crate's manifest
/// directory to the first ancestor that carries `contracts/`.
///
/// Panics when no ancestor qualifies; the fixtures ship with the repository,
/// so that only happens outside a checkout.
pub fn workspace_root() -> PathBuf {
    let start = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    start
        .ancestors()
        .find(|dir| dir.join("contracts").is_dir())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| panic!("no contracts/ directory above {}", start.display()))
}

/// Load and parse `contracts/http/{service}/{id}.json`.
///
/// Panics on a missing file or invalid JSON, with the offending path.
pub fn contract(service: &str, id: &str) -> Value {
    let path = workspace_root().join(format!("contracts/http/{service}/{id}.json"));
    let contents = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("cannot read fixture {}: {e}", path.display()));
    serde_json::from_str(&contents)
        .unwrap_or_else(|e| panic!("invalid JSON in fixture {}: {e}", path.display()))
}

/// The fixture's request body. Panics when the fixture has none.
pub fn request_body(fixture: &Value) -> Value {
    non_null(&fixture["request"]["body"], "request.body")
}

/// The fixture's expected response body. Panics when the fixture has none.
pub fn expected_body(fixture: &Value) -> Value {
    non_null(&fixture["expect"]["body"], "expect.body")
}

fn non_null(value: &Value, field: &str) -> Value {
    if value.is_null() {
        panic!("fixture has no {field}");
    }
    value.clone()
}
