//! Utility functions and types

pub mod data_loader;

pub use data_loader::{columns_to_array2, drop_columns, split_target, DataLoader};
