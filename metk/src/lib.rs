//! Agreement statistics and diagnostic plots for predicted vs experimental
//! binding affinities.

pub mod analysis;
pub mod config;
pub mod data_handling;
pub mod error;
pub mod helper_functions;
pub mod models;

pub use error::{MetkError, Result};
