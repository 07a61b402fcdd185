#![allow(async_fn_in_trait)]

//! Pixel call dispatch: the `/collect` endpoint hands batches of raw pixel
//! calls to a [`PixelSink`]; the production sink chain is
//! [`SanitizedSink`] wrapping [`TrackingPixelSink`].

use serde_json::Value;

use crate::error::TrackingServiceError;

pub mod pipeline;
pub mod sanitizer;

pub use pipeline::TrackingPixelSink;
pub use sanitizer::SanitizedSink;

/// One pixel invocation as captured by the page snippet: the positional
/// argument list of the original `fbq(...)` call, JSON-encoded.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelCall {
    pub args: Vec<Value>,
}

impl PixelCall {
    pub fn new(args: Vec<Value>) -> Self {
        Self { args }
    }

    /// The command name (`"init"`, `"set"`, `"track"`, …) if the call is well
    /// formed.
    pub fn command(&self) -> Option<&str> {
        self.args.first().and_then(Value::as_str)
    }
}

/// Request-scoped context shared by every call in a `/collect` batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallContext {
    pub visitor_id: Option<String>,
    pub fbp: Option<String>,
    pub fbc: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub source_url: Option<String>,
}

/// Destination of pixel calls. Implemented by the routing pipeline and, as a
/// decorator, by the sanitizer.
pub trait PixelSink: Send + Sync {
    async fn send(&self, call: PixelCall, ctx: &CallContext) -> Result<(), TrackingServiceError>;
}
