//! Request handlers.

pub mod catalog;
pub mod generate;
pub mod health;
pub mod progress;

pub use catalog::*;
pub use generate::*;
pub use health::*;
pub use progress::*;
