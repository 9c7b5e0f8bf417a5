//! # Configuration Module
//!
//! This module provides the fitting and grid configuration with validation.

pub mod config;

pub use config::FitConfig;
