pub mod api;
pub mod assets;
pub mod core;
pub mod rejection;

pub use self::core::{create_routes, PushcastServer};
