//! Configuration module for scraping
//!
//! This module provides the `ScrapeConfig` struct and its builder for
//! configuring fetch budgets, pacing and the browser session.

// Sub-modules
pub mod builder;
pub mod getters;
pub mod types;

// Re-exports for public API
pub use builder::ScrapeConfigBuilder;
pub use types::ScrapeConfig;
