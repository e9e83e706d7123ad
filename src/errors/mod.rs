pub mod types;
pub mod classification;

pub use types::VulnscanError;
pub use classification::ErrorClassification;
