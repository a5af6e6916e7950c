//! Session audit entities.

pub mod model;

pub use model::{SessionEndReason, SessionRecord};
