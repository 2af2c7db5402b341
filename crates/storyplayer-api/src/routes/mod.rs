//! Route modules.

pub mod health;
pub mod layout;
pub mod sessions;
