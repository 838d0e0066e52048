use super::{Translator, send_for_body};
use crate::error::Result;
use serde_json::Value;

pub const GOOGLE_ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";

/// Anonymous `client=gtx` endpoint.
pub struct GoogleTranslator {
    client: reqwest::blocking::Client,
    endpoint: String,
    source: String,
    target: String,
}

impl GoogleTranslator {
    pub fn new(client: reqwest::blocking::Client) -> Self {
        Self {
            client,
            endpoint: GOOGLE_ENDPOINT.to_string(),
            source: "en".to_string(),
            target: "zh-CN".to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn request_url(&self, text: &str) -> String {
        format!(
            "{}?client=gtx&sl={}&tl={}&dt=t&q={}",
            self.endpoint,
            self.source,
            self.target,
            urlencoding::encode(text)
        )
    }
}

/// The body is a nested array; `[0]` lists `[translated, source, ...]`
/// segments, one per sentence.
fn parse_response(body: &str) -> Result<Option<String>> {
    let root: Value = serde_json::from_str(body)?;
    let Some(segments) = root.get(0).and_then(|v| v.as_array()) else {
        return Ok(None);
    };
    let joined: String = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(|v| v.as_str()))
        .collect();
    Ok(Some(joined).filter(|s| !s.is_empty()))
}

impl Translator for GoogleTranslator {
    fn name(&self) -> &'static str {
        "google"
    }

    fn endpoint(&self) -> Option<&str> {
        Some(&self.endpoint)
    }

    fn translate(&self, text: &str) -> Result<Option<String>> {
        let body = send_for_body(self.name(), self.client.get(self.request_url(text)))?;
        parse_response(&body)
    }
}
