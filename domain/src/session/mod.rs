//! Conversation messages exchanged with a language model

pub mod entities;

pub use entities::{Message, Role};
