pub mod error;
pub mod score;
pub mod snapshot;

pub use error::AssetError;
pub use score::{Alert, Recommendation, ScoreBreakdown, ScoreResult};
pub use snapshot::{AssetSnapshot, Bar};
