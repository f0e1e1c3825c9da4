//! Client for the language-model assistant proxy.
//!
//! One endpoint serves every assistant feature; the request's `mode` picks
//! the behavior. Replies are parsed leniently, so only transport failures
//! and error statuses surface as `AssistantError`.

pub mod client;

pub use client::{AssistantClient, AssistantError, DEFAULT_ASSISTANT_URL};
