//! Interbank Ledger - an append-only, tamper-evident ledger of transfers
//!
//! # Architecture
//!
//! The crate is organized into logical modules:
//!
//! ## Core Ledger
//! - [`blockchain`] - Blocks, the ledger, hashing and chain validation
//! - [`transaction`] - Transfer records and their validation
//!
//! ## Audit Store
//! - [`persistence`] - SQLite and in-memory audit backends
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types
//! - [`cli`] - Interactive driver

#![forbid(unsafe_code)]

// ============================================================================
// Core Ledger
// ============================================================================
pub mod blockchain;
pub mod transaction;

// ============================================================================
// Audit Store
// ============================================================================
pub mod persistence;

// ============================================================================
// Configuration & Utilities
// ============================================================================
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
