//! Best-effort name translation over interchangeable providers.
//!
//! Providers are tried in order and the first non-empty answer wins. When
//! every provider fails the original text is kept, so a translation run never
//! drops an item.

mod baidu;
mod google;
mod libre;
mod mymemory;

pub use baidu::{BAIDU_ENDPOINT, BaiduTranslator, baidu_sign};
pub use google::{GOOGLE_ENDPOINT, GoogleTranslator};
pub use libre::{LIBRE_ENDPOINT, LibreTranslator};
pub use mymemory::{MYMEMORY_ENDPOINT, MyMemoryTranslator};

use crate::batch::{ItemOutcome, ItemProcessor};
use crate::config::{ProviderKind, TranslateConfig};
use crate::error::{HarvestError, Result};
use crate::fetch::http_client;
use crate::model::{AppId, NameToTranslate, TranslatedName};
use tracing::{debug, warn};

pub trait Translator {
    fn name(&self) -> &'static str;

    /// `Ok(None)` means the provider answered without a usable translation.
    fn translate(&self, text: &str) -> Result<Option<String>>;

    /// URL requests are sent to, for remote providers.
    fn endpoint(&self) -> Option<&str> {
        None
    }
}

/// Ordered list of providers.
pub struct TranslatorChain {
    providers: Vec<Box<dyn Translator>>,
}

impl TranslatorChain {
    pub fn new(providers: Vec<Box<dyn Translator>>) -> Self {
        Self { providers }
    }

    pub fn from_config(config: &TranslateConfig) -> Result<Self> {
        config.validate()?;
        let client = http_client(config.timeout)?;

        let mut providers: Vec<Box<dyn Translator>> = Vec::with_capacity(config.providers.len());
        for &kind in &config.providers {
            let provider: Box<dyn Translator> = match kind {
                ProviderKind::Baidu => {
                    let credentials = config.baidu.clone().ok_or_else(|| {
                        HarvestError::Config("baidu credentials missing".to_string())
                    })?;
                    let translator = BaiduTranslator::new(client.clone(), credentials);
                    Box::new(match config.endpoint(kind) {
                        Some(url) => translator.with_endpoint(url),
                        None => translator,
                    })
                }
                ProviderKind::Google => {
                    let translator = GoogleTranslator::new(client.clone());
                    Box::new(match config.endpoint(kind) {
                        Some(url) => translator.with_endpoint(url),
                        None => translator,
                    })
                }
                ProviderKind::Mymemory => {
                    let translator = MyMemoryTranslator::new(client.clone());
                    Box::new(match config.endpoint(kind) {
                        Some(url) => translator.with_endpoint(url),
                        None => translator,
                    })
                }
                ProviderKind::Libre => {
                    let translator = LibreTranslator::new(client.clone());
                    Box::new(match config.endpoint(kind) {
                        Some(url) => translator.with_endpoint(url),
                        None => translator,
                    })
                }
            };
            debug!(provider = %kind, endpoint = ?provider.endpoint(), "Provider ready");
            providers.push(provider);
        }
        Ok(Self::new(providers))
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub fn provider_endpoints(&self) -> Vec<Option<&str>> {
        self.providers.iter().map(|p| p.endpoint()).collect()
    }

    /// First non-empty translation, or `None` if every provider came up empty.
    pub fn translate(&self, text: &str) -> Option<String> {
        for provider in &self.providers {
            match provider.translate(text) {
                Ok(Some(translated)) if !translated.trim().is_empty() => {
                    debug!(
                        provider = provider.name(),
                        text,
                        translated = %translated,
                        "Translated"
                    );
                    return Some(translated.trim().to_string());
                }
                Ok(_) => debug!(provider = provider.name(), text, "No translation"),
                Err(err) => warn!(
                    provider = provider.name(),
                    text,
                    error = %err,
                    "Translation failed"
                ),
            }
        }
        None
    }

    /// Like [`translate`](Self::translate) but falls back to `text` itself.
    pub fn translate_or_original(&self, text: &str) -> String {
        self.translate(text).unwrap_or_else(|| text.to_string())
    }
}

/// Batch adapter: one [`NameToTranslate`] in, one [`TranslatedName`] out.
pub struct TranslateProcessor {
    chain: TranslatorChain,
    fallbacks: usize,
}

impl TranslateProcessor {
    pub fn new(chain: TranslatorChain) -> Self {
        Self {
            chain,
            fallbacks: 0,
        }
    }

    /// How many names kept their original text.
    pub fn fallbacks(&self) -> usize {
        self.fallbacks
    }
}

impl ItemProcessor<NameToTranslate> for TranslateProcessor {
    type Record = TranslatedName;

    fn key(&self, item: &NameToTranslate) -> AppId {
        item.app_id
    }

    fn process(&mut self, item: &NameToTranslate) -> ItemOutcome<TranslatedName> {
        let name_zh = match self.chain.translate(&item.name_en) {
            Some(translated) => translated,
            None => {
                self.fallbacks += 1;
                warn!(app_id = item.app_id, name = %item.name_en, "Keeping original name");
                item.name_en.clone()
            }
        };
        ItemOutcome::Record(TranslatedName {
            app_id: item.app_id,
            name_en: item.name_en.clone(),
            name_zh,
        })
    }
}

/// Sends a prepared request and returns the body of a 2xx response.
pub(crate) fn send_for_body(
    provider: &str,
    request: reqwest::blocking::RequestBuilder,
) -> Result<String> {
    let response = request.send()?;
    let status = response.status();
    if !status.is_success() {
        return Err(HarvestError::Translate(format!(
            "{} returned HTTP {}",
            provider, status
        )));
    }
    Ok(response.text()?)
}
