//! # Pushcast Core Library
//!
//! Shared core functionality for pushcast: data models, token and payload
//! loading, the messaging provider client, the template store and the web UI
//! server.

pub mod models;
pub mod payload;
pub mod provider;
pub mod server;
pub mod services;
pub mod store;
