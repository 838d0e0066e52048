use super::{Translator, send_for_body};
use crate::error::Result;
use serde_json::Value;

pub const MYMEMORY_ENDPOINT: &str = "https://api.mymemory.translated.net/get";

/// Anonymous MyMemory endpoint. An answer equal to the input is treated as
/// "no translation".
pub struct MyMemoryTranslator {
    client: reqwest::blocking::Client,
    endpoint: String,
    langpair: String,
}

impl MyMemoryTranslator {
    pub fn new(client: reqwest::blocking::Client) -> Self {
        Self {
            client,
            endpoint: MYMEMORY_ENDPOINT.to_string(),
            langpair: "en|zh".to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn request_url(&self, text: &str) -> String {
        format!(
            "{}?q={}&langpair={}",
            self.endpoint,
            urlencoding::encode(text),
            urlencoding::encode(&self.langpair)
        )
    }
}

fn parse_response(text: &str, body: &str) -> Result<Option<String>> {
    let root: Value = serde_json::from_str(body)?;
    Ok(root
        .pointer("/responseData/translatedText")
        .and_then(|v| v.as_str())
        .filter(|translated| *translated != text)
        .map(str::to_string))
}

impl Translator for MyMemoryTranslator {
    fn name(&self) -> &'static str {
        "mymemory"
    }

    fn endpoint(&self) -> Option<&str> {
        Some(&self.endpoint)
    }

    fn translate(&self, text: &str) -> Result<Option<String>> {
        let body = send_for_body(self.name(), self.client.get(self.request_url(text)))?;
        parse_response(text, &body)
    }
}
