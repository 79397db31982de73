//! Data preprocessing module
//!
//! Turns the raw observation table into a numeric feature matrix:
//! - Categorical encoding (one-hot with a dropped reference category)
//! - Feature table assembly (numeric columns followed by indicator columns)

mod encoder;
mod features;

pub use encoder::OneHotEncoder;
pub use features::FeatureTable;
