//! Core domain model for soundprint.
//!
//! This crate defines the fingerprint data model (tracks, hashed
//! fingerprints, sub-fingerprints, coarse fingerprints, spectral images),
//! the reference types and their allocators, and the SQLite schema.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod error;
pub mod model;
pub mod schema;

pub use error::{Error, Result};
