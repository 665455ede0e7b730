//! Data models for pushcast

pub mod configuration;
pub mod message;
pub mod template;

pub use configuration::*;
pub use message::*;
pub use template::*;
