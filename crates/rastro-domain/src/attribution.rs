//! Campaign attribution parameters.

use serde::{Deserialize, Serialize};
use url::Url;

/// The five standard UTM query parameters of a landing-page URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UtmParams {
    pub source: Option<String>,
    pub medium: Option<String>,
    pub campaign: Option<String>,
    pub term: Option<String>,
    pub content: Option<String>,
}

impl UtmParams {
    /// Extract `utm_*` parameters from a landing-page URL.
    ///
    /// Unparseable input yields an empty set; attribution capture is best
    /// effort and never fails a request.
    pub fn from_url(raw: &str) -> Self {
        let Ok(url) = Url::parse(raw.trim()) else {
            return Self::default();
        };
        let mut utm = Self::default();
        for (name, value) in url.query_pairs() {
            if value.is_empty() {
                continue;
            }
            let value = value.into_owned();
            match name.to_ascii_lowercase().as_str() {
                "utm_source" => utm.source = Some(value),
                "utm_medium" => utm.medium = Some(value),
                "utm_campaign" => utm.campaign = Some(value),
                "utm_term" => utm.term = Some(value),
                "utm_content" => utm.content = Some(value),
                _ => {}
            }
        }
        utm
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_none()
            && self.medium.is_none()
            && self.campaign.is_none()
            && self.term.is_none()
            && self.content.is_none()
    }

    /// Last-write-wins field merge; `newer` fields override where present.
    pub fn merged_with(self, newer: Self) -> Self {
        Self {
            source: newer.source.or(self.source),
            medium: newer.medium.or(self.medium),
            campaign: newer.campaign.or(self.campaign),
            term: newer.term.or(self.term),
            content: newer.content.or(self.content),
        }
    }
}
