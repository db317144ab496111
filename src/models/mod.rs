pub mod account;
pub mod application;

// Re-export the core resource types so we can do "use crate::models::*;"
pub use account::{Account, NewAccount};
pub use application::Application;
