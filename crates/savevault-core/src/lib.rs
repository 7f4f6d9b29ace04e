pub mod cancel;
pub mod catalog;
pub mod classify;
pub mod config;
pub mod dedup;
pub mod engine;
pub mod env;
pub mod error;
pub mod model;
pub mod platform;
pub mod progress;
pub mod registry;
pub mod scanner;

pub use cancel::CancellationToken;
pub use config::DiscoveryConfig;
pub use engine::{DiscoveryEngine, DiscoveryHandle, DiscoveryOutcome, DiscoverySummary};
pub use error::{Cancelled, Error};
pub use model::{DiscoveredApplication, KnownGameDescriptor, SavePath, Source};
pub use progress::{DiscoveryEvent, DiscoverySink, SilentSink};
