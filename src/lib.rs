pub mod analyzer;
pub mod changelog;
pub mod config;
pub mod domain;
pub mod error;
pub mod git;
pub mod notice;
pub mod provider;
pub mod ui;
pub mod workflow;

pub use error::{GitflowError, Result};
