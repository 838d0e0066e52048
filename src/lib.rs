//! steam-harvest library: a resilient, strictly sequential batch fetcher for
//! storefront game metadata, plus a name translator built on the same loop.

pub mod batch;
pub mod config;
pub mod display;
pub mod error;
pub mod fetch;
pub mod input;
pub mod logging;
pub mod model;
pub mod pacing;
pub mod pipeline;
pub mod slug;
pub mod store;
pub mod transform;
pub mod translate;

pub use error::{HarvestError, Result};
