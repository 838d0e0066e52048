//! Record types shared by the fetch and translate pipelines.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};

/// Storefront application identifier.
pub type AppId = u64;

/// Records that are keyed by an application id inside a result set.
pub trait Keyed {
    fn key(&self) -> AppId;
}

/// Price block as reported by the storefront (`price_overview`).
/// Amounts are in the smallest currency unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub currency: String,
    pub initial: i64,
    #[serde(rename = "final")]
    pub final_price: i64,
    pub discount_percent: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_formatted: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_formatted: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metacritic {
    pub score: i64,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Platforms {
    #[serde(default)]
    pub windows: bool,
    #[serde(default)]
    pub mac: bool,
    #[serde(default)]
    pub linux: bool,
}

/// Hardware requirement tier. Every field is nullable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequirementSpec {
    pub cpu: Option<String>,
    pub gpu: Option<String>,
    pub ram_gb: Option<Number>,
    pub storage: Option<String>,
    pub directx: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Requirements {
    #[serde(default)]
    pub minimum: RequirementSpec,
    #[serde(default)]
    pub recommended: RequirementSpec,
}

/// Normalized game record produced by a fetch. Records from earlier runs are
/// not decoded into this type (see [`crate::store::Stored`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    pub app_id: AppId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(rename = "type", default = "default_app_type")]
    pub app_type: String,
    #[serde(default)]
    pub is_free: bool,
    #[serde(default)]
    pub header_image: String,
    #[serde(default)]
    pub developers: Vec<String>,
    #[serde(default)]
    pub publishers: Vec<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub content_descriptors: Vec<String>,
    #[serde(default)]
    pub content_descriptors_en: Vec<String>,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub platforms: Platforms,
    #[serde(default)]
    pub price: Option<Price>,
    #[serde(default)]
    pub metacritic: Option<Metacritic>,
    #[serde(default)]
    pub recommendations: u64,
    #[serde(default)]
    pub requirements: Requirements,
    #[serde(default)]
    pub coming_soon: bool,
}

fn default_app_type() -> String {
    "game".to_string()
}

impl Keyed for GameRecord {
    fn key(&self) -> AppId {
        self.app_id
    }
}

/// One translated display name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslatedName {
    pub app_id: AppId,
    pub name_en: String,
    pub name_zh: String,
}

impl Keyed for TranslatedName {
    fn key(&self) -> AppId {
        self.app_id
    }
}

/// A name waiting for translation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NameToTranslate {
    pub app_id: AppId,
    pub name_en: String,
}

impl Keyed for NameToTranslate {
    fn key(&self) -> AppId {
        self.app_id
    }
}

/// Raw `data` payload of an app-details response, flattened into the fields
/// the transformer needs. Missing or oddly-typed fields fall back to defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppDetails {
    pub name: String,
    pub app_type: Option<String>,
    pub is_free: bool,
    pub header_image: String,
    pub developers: Vec<String>,
    pub publishers: Vec<String>,
    pub genres: Vec<String>,
    pub categories: Vec<String>,
    pub release_date: String,
    pub coming_soon: bool,
    pub platforms: Platforms,
    pub price: Option<Price>,
    pub metacritic: Option<Metacritic>,
    pub recommendations: u64,
}

impl<'de> Deserialize<'de> for AppDetails {
    /// Flattens the nested storefront shapes (`genres[].description`,
    /// `release_date.date`, `recommendations.total`) into plain fields.
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Proxy {
            name: Option<String>,
            #[serde(rename = "type")]
            app_type: Option<String>,
            is_free: Option<bool>,
            header_image: Option<String>,
            developers: Option<Value>,
            publishers: Option<Value>,
            genres: Option<Value>,
            categories: Option<Value>,
            release_date: Option<Value>,
            platforms: Option<Value>,
            price_overview: Option<Value>,
            metacritic: Option<Value>,
            recommendations: Option<Value>,
        }

        let proxy = Proxy::deserialize(deserializer)?;

        let (release_date, coming_soon) = match &proxy.release_date {
            Some(release) => (
                release
                    .get("date")
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_string(),
                release
                    .get("coming_soon")
                    .and_then(|v| v.as_bool())
                    .unwrap_or(false),
            ),
            None => (String::new(), false),
        };

        let recommendations = proxy
            .recommendations
            .as_ref()
            .and_then(|r| r.get("total"))
            .and_then(|v| v.as_u64())
            .unwrap_or(0);

        Ok(AppDetails {
            name: proxy.name.unwrap_or_default(),
            app_type: proxy.app_type,
            is_free: proxy.is_free.unwrap_or(false),
            header_image: proxy.header_image.unwrap_or_default(),
            developers: string_list(proxy.developers.as_ref()),
            publishers: string_list(proxy.publishers.as_ref()),
            genres: descriptions(proxy.genres.as_ref()),
            categories: descriptions(proxy.categories.as_ref()),
            release_date,
            coming_soon,
            platforms: lenient(proxy.platforms).unwrap_or_default(),
            price: lenient(proxy.price_overview),
            metacritic: lenient(proxy.metacritic),
            recommendations,
        })
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn descriptions(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("description").and_then(|d| d.as_str()))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Decodes an optional sub-object, treating a shape mismatch as absent.
fn lenient<T: DeserializeOwned>(value: Option<Value>) -> Option<T> {
    value.and_then(|v| serde_json::from_value(v).ok())
}
