pub mod admin;
pub mod donation;
pub mod response;
pub mod stats;
pub mod verification;

pub use admin::*;
pub use donation::*;
pub use response::*;
pub use stats::*;
pub use verification::*;
