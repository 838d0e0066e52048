//! Raw storefront payload → normalized [`GameRecord`].

use crate::model::{AppDetails, AppId, GameRecord, Requirements};
use crate::slug::slugify;

/// Builds the output record for a fetched app. Pure and infallible.
pub fn to_game_record(app_id: AppId, details: AppDetails) -> GameRecord {
    let slug = slugify(&details.name);
    GameRecord {
        app_id,
        slug,
        name: details.name,
        app_type: details.app_type.unwrap_or_else(|| "game".to_string()),
        is_free: details.is_free,
        header_image: details.header_image,
        developers: details.developers,
        publishers: details.publishers,
        genres: details.genres,
        categories: details.categories,
        content_descriptors: Vec::new(),
        content_descriptors_en: Vec::new(),
        release_date: details.release_date,
        platforms: details.platforms,
        price: details.price,
        metacritic: details.metacritic,
        recommendations: details.recommendations,
        requirements: Requirements::default(),
        coming_soon: details.coming_soon,
    }
}
