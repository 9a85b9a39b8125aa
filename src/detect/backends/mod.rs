pub mod stub;
pub mod synthetic;

#[cfg(feature = "backend-tract")]
pub mod tract;

pub use stub::ScriptedDetector;
pub use synthetic::SyntheticCrowdDetector;

#[cfg(feature = "backend-tract")]
pub use tract::TractDetector;
