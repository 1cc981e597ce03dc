//! Core domain kernel.
//!
//! Data types, error taxonomy and cryptographic primitives shared by every
//! other module. Nothing in here performs I/O.

pub mod crypto;
pub mod errors;
pub mod models;
