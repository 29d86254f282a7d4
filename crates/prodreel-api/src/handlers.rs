//! Request handlers.

pub mod credits;
pub mod health;
pub mod products;
pub mod upload;
pub mod videos;

pub use credits::*;
pub use health::*;
pub use products::*;
pub use upload::*;
pub use videos::*;
