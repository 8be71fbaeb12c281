//! Shared utilities, configuration, and encoding helpers for Hyuga
//!
//! This crate provides common functionality used across the Hyuga engine:
//! - Configuration management following 12-factor principles
//! - Content digests for asset identity
//! - Base64 / data-URL payload helpers
//! - State machine error types

pub mod config;
pub mod crypto;
pub mod data_url;
pub mod state;

pub use config::{Config, LogFormat};
pub use crypto::{is_digest, joined_digest};
pub use data_url::{
    data_url_mime, decode_payload, encode_payload, strip_data_url_prefix, to_data_url,
    DEFAULT_IMAGE_MIME,
};
pub use state::StateError;
