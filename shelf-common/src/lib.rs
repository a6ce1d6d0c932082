//! # Shelf Common Library
//!
//! Shared code for the shelf services including:
//! - Error taxonomy shared by every layer
//! - Domain models (books, reviews, ratings)
//! - Database initialization and schema
//! - Configuration loading and root folder resolution
//! - Identifier utilities

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod uuid_utils;

pub use error::{Error, Result};
