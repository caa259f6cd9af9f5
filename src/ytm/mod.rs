//! YouTube Music provider: innertube search, home-feed recommendations,
//! and audio stream resolution.

pub mod api;
pub mod resolve;

pub use api::YtmClient;
