use super::{Translator, send_for_body};
use crate::config::BaiduCredentials;
use crate::error::{HarvestError, Result};
use rand::Rng;
use serde_json::Value;

pub const BAIDU_ENDPOINT: &str = "https://fanyi-api.baidu.com/api/trans/vip/translate";

/// `md5(app_id + text + salt + secret)` as lowercase hex.
pub fn baidu_sign(app_id: &str, text: &str, salt: &str, secret: &str) -> String {
    let payload = format!("{}{}{}{}", app_id, text, salt, secret);
    format!("{:x}", md5::compute(payload.as_bytes()))
}

/// Signed Baidu general translation API.
pub struct BaiduTranslator {
    client: reqwest::blocking::Client,
    endpoint: String,
    credentials: BaiduCredentials,
    from: String,
    to: String,
}

impl BaiduTranslator {
    pub fn new(client: reqwest::blocking::Client, credentials: BaiduCredentials) -> Self {
        Self {
            client,
            endpoint: BAIDU_ENDPOINT.to_string(),
            credentials,
            from: "en".to_string(),
            to: "zh".to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn request_url(&self, text: &str, salt: &str) -> String {
        let sign = baidu_sign(&self.credentials.app_id, text, salt, &self.credentials.secret);
        format!(
            "{}?q={}&from={}&to={}&appid={}&salt={}&sign={}",
            self.endpoint,
            urlencoding::encode(text),
            self.from,
            self.to,
            urlencoding::encode(&self.credentials.app_id),
            salt,
            sign
        )
    }
}

fn parse_response(body: &str) -> Result<Option<String>> {
    let root: Value = serde_json::from_str(body)?;
    if let Some(code) = root.get("error_code") {
        let message = root
            .get("error_msg")
            .and_then(|m| m.as_str())
            .unwrap_or("unknown error");
        return Err(HarvestError::Translate(format!(
            "baidu error {}: {}",
            code, message
        )));
    }
    Ok(root
        .pointer("/trans_result/0/dst")
        .and_then(|v| v.as_str())
        .map(str::to_string))
}

impl Translator for BaiduTranslator {
    fn name(&self) -> &'static str {
        "baidu"
    }

    fn endpoint(&self) -> Option<&str> {
        Some(&self.endpoint)
    }

    fn translate(&self, text: &str) -> Result<Option<String>> {
        let salt = rand::thread_rng().gen_range(32768..=65536).to_string();
        let url = self.request_url(text, &salt);
        let body = send_for_body(self.name(), self.client.get(&url))?;
        parse_response(&body)
    }
}
