//! Live TV channel resolution for the iptv-org directory
//!
//! Fetches the channel and stream directories, keeps one playable stream per
//! channel, and falls back to a curated list when live data is thin, late or
//! broken.

pub mod api;
pub mod classifier;
pub mod config;
pub mod error;
pub mod fallback;
pub mod models;
pub mod resolver;
pub mod session;

pub use api::{CancelToken, CatalogSource, IptvClient};
pub use classifier::{is_playable, looks_playable};
pub use config::AppConfig;
pub use error::{ConfigError, FetchError};
pub use fallback::{apply_fallback, fallback_catalog, Warning};
pub use models::{Channel, ChannelEntry, PlaybackRequest, Stream};
pub use resolver::{resolve, resolve_with_stats, ResolveOptions, ResolveStats};
pub use session::{LiveTvSession, LoadState, Outcome, PendingCycle, Settlement};
