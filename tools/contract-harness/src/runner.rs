//! HTTP request runner — sends one fixture request and checks the response.

use reqwest::Client;

use crate::fixture::Fixture;

/// Result of running a single fixture assertion.
pub struct RunResult {
    pub expected_status: u16,
    pub actual_status: Option<u16>,
    /// Headers that were expected but missing or carrying the wrong value.
    pub header_mismatches: Vec<String>,
    /// Set when `expect.body` was provided and the actual body differed.
    pub body_mismatch: Option<String>,
    /// Set when the request could not be sent at all (connection refused,
    /// malformed method, …).
    pub error: Option<String>,
}

impl RunResult {
    pub fn passed(&self) -> bool {
        self.error.is_none()
            && self.actual_status == Some(self.expected_status)
            && self.header_mismatches.is_empty()
            && self.body_mismatch.is_none()
    }

    fn unsendable(expected_status: u16, error: String) -> Self {
        Self {
            expected_status,
            actual_status: None,
            header_mismatches: Vec::new(),
            body_mismatch: None,
            error: Some(error),
        }
    }
}

pub struct Runner {
    client: Client,
    base_url: String,
}

impl Runner {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    pub async fn run(&self, fixture: &Fixture) -> RunResult {
        let url = format!("{}{}", self.base_url, fixture.request.path);
        let expected_status = fixture.expect.status;

        let method =
            match reqwest::Method::from_bytes(fixture.request.method.to_uppercase().as_bytes()) {
                Ok(m) => m,
                Err(_) => {
                    return RunResult::unsendable(
                        expected_status,
                        format!("unknown HTTP method: {}", fixture.request.method),
                    );
                }
            };

        let mut req = self.client.request(method, &url);
        for (name, value) in &fixture.request.headers {
            req = req.header(name, value);
        }
        if let Some(body) = &fixture.request.body {
            req = req.json(body);
        }

        let resp = match req.send().await {
            Ok(resp) => resp,
            Err(e) => return RunResult::unsendable(expected_status, e.to_string()),
        };

        let actual_status = resp.status().as_u16();
        let headers = resp.headers().clone();

        // Expected headers are a subset match: extras are fine, absences and
        // wrong values are not.
        let mut header_mismatches = Vec::new();
        for (name, expected_val) in &fixture.expect.headers {
            match headers.get(name.as_str()) {
                Some(actual_val) if actual_val.to_str().unwrap_or("") == expected_val => {}
                Some(actual_val) => {
                    header_mismatches.push(format!(
                        "{name}: expected {:?}, got {:?}",
                        expected_val,
                        actual_val.to_str().unwrap_or("<non-utf8>")
                    ));
                }
                None => {
                    header_mismatches.push(format!("{name}: missing (expected {expected_val:?})"));
                }
            }
        }

        // Expected body is an exact JSON match; fixtures omit it for
        // responses with run-dependent fields.
        let body_mismatch = match &fixture.expect.body {
            Some(expected_body) => {
                let body_text = resp.text().await.unwrap_or_default();
                let actual_body: serde_json::Value =
                    serde_json::from_str(&body_text).unwrap_or(serde_json::Value::Null);
                (&actual_body != expected_body)
                    .then(|| format!("body: expected {expected_body}, got {actual_body}"))
            }
            None => None,
        };

        RunResult {
            expected_status,
            actual_status: Some(actual_status),
            header_mismatches,
            body_mismatch,
            error: None,
        }
    }
}
