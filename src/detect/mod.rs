mod backend;
mod backends;
mod filter;
mod result;

pub use backend::PersonDetector;
pub use backends::{ScriptedDetector, SyntheticCrowdDetector};
#[cfg(feature = "backend-tract")]
pub use backends::TractDetector;
pub use filter::DetectionFilter;
pub use result::{BoundingBox, DetectionSet, ScoredBox};
