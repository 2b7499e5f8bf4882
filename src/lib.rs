//! Sprint Poker - Session synchronization and consensus engine.
//!
//! This crate implements the core of collaborative story estimation:
//! sessions, stories, and votes materialized locally from an external
//! durable store, kept eventually consistent through the store's change
//! feed, and aggregated into consensus statistics on demand.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
