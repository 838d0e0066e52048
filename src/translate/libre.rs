use super::{Translator, send_for_body};
use crate::error::Result;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;

pub const LIBRE_ENDPOINT: &str = "https://libretranslate.com/translate";

/// LibreTranslate instance, form-encoded POST.
pub struct LibreTranslator {
    client: reqwest::blocking::Client,
    endpoint: String,
    source: String,
    target: String,
}

impl LibreTranslator {
    pub fn new(client: reqwest::blocking::Client) -> Self {
        Self {
            client,
            endpoint: LIBRE_ENDPOINT.to_string(),
            source: "en".to_string(),
            target: "zh".to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn form_body(&self, text: &str) -> String {
        format!(
            "q={}&source={}&target={}&format=text",
            urlencoding::encode(text),
            self.source,
            self.target
        )
    }
}

fn parse_response(body: &str) -> Result<Option<String>> {
    let root: Value = serde_json::from_str(body)?;
    Ok(root
        .get("translatedText")
        .and_then(|v| v.as_str())
        .map(str::to_string))
}

impl Translator for LibreTranslator {
    fn name(&self) -> &'static str {
        "libre"
    }

    fn endpoint(&self) -> Option<&str> {
        Some(&self.endpoint)
    }

    fn translate(&self, text: &str) -> Result<Option<String>> {
        let request = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(self.form_body(text));
        let body = send_for_body(self.name(), request)?;
        parse_response(&body)
    }
}
