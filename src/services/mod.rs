pub mod admin;
pub mod aggregator;
pub mod bulk;
pub mod cache;
pub mod coalesce;
pub mod explorer;
pub mod retry;
pub mod stats;
pub mod timestamp;
pub mod verification;

pub use bulk::{settle_all, BulkResult};
pub use cache::RequestCache;
pub use explorer::{ExplorerLinkResolver, Network};
pub use retry::RetryPolicy;
pub use stats::StatsService;
pub use timestamp::{normalize, NormalizedTimestamp, RawTimestamp};
pub use verification::VerificationOrchestrator;
