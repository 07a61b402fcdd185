use anyhow::Context as _;
use serde_json::{Value, json};
use sha2::{Digest, Sha256};

use crate::domain::repository::ConversionsPort;
use crate::domain::types::ConversionEvent;
use crate::error::TrackingServiceError;

/// Dispatch is best effort; a slow ad platform must not hold the caller's
/// request open much longer than this.
const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

/// HTTP client for the ad platform's Conversions API.
#[derive(Clone)]
pub struct HttpConversionsClient {
    client: reqwest::Client,
    base_url: String,
    pixel_id: String,
    access_token: String,
    test_event_code: Option<String>,
}

impl HttpConversionsClient {
    pub fn new(
        base_url: &str,
        pixel_id: &str,
        access_token: &str,
        test_event_code: Option<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build reqwest client");
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            pixel_id: pixel_id.to_owned(),
            access_token: access_token.to_owned(),
            test_event_code: test_event_code.filter(|code| !code.is_empty()),
        }
    }
}

impl ConversionsPort for HttpConversionsClient {
    async fn send(&self, event: &ConversionEvent) -> Result<(), TrackingServiceError> {
        let url = format!("{}/{}/events", self.base_url, self.pixel_id);
        let mut body = json!({ "data": [event_payload(event)] });
        if let Some(code) = &self.test_event_code {
            body["test_event_code"] = json!(code);
        }

        let response = self
            .client
            .post(&url)
            .query(&[("access_token", self.access_token.as_str())])
            .json(&body)
            .send()
            .await
            .context("failed to reach the conversions api")?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(TrackingServiceError::Internal(anyhow::anyhow!(
                "conversions api returned {status}: {detail}"
            )));
        }
        Ok(())
    }
}

fn event_payload(event: &ConversionEvent) -> Value {
    let mut user_data = json!({});
    set_hashed(&mut user_data, "em", event.user.email.as_deref());
    set_hashed(&mut user_data, "ph", event.user.phone.as_deref());
    set_hashed(&mut user_data, "fn", event.user.first_name.as_deref());
    set_hashed(&mut user_data, "ln", event.user.last_name.as_deref());
    set_hashed(&mut user_data, "external_id", event.user.external_id.as_deref());
    // Browser ids and connection data travel unhashed per protocol.
    set_plain(&mut user_data, "fbp", event.fbp.as_deref());
    set_plain(&mut user_data, "fbc", event.fbc.as_deref());
    set_plain(&mut user_data, "client_ip_address", event.ip_address.as_deref());
    set_plain(&mut user_data, "client_user_agent", event.user_agent.as_deref());

    let mut custom_data = json!({ "currency": event.currency });
    if let Some(value) = event.value {
        custom_data["value"] = json!(value);
    }

    let mut payload = json!({
        "event_name": event.event_name,
        "event_time": event.event_time,
        "event_id": event.event_id,
        "action_source": event.source.action_source(),
        "user_data": user_data,
        "custom_data": custom_data,
    });
    if let Some(url) = &event.event_source_url {
        payload["event_source_url"] = json!(url);
    }
    payload
}

fn set_hashed(target: &mut Value, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        target[key] = Value::String(sha256_hex(value));
    }
}

fn set_plain(target: &mut Value, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        target[key] = Value::String(value.to_owned());
    }
}

/// Lowercase hex SHA-256, the only form the Conversions API accepts for user
/// match keys.
fn sha256_hex(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{:02x}", byte));
    }
    out
}
