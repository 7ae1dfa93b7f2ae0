//! Messaging infrastructure adapter.
//!
//! Implements [`tracker::MessageSink`] by posting block messages through the
//! messaging service's `chat.postMessage` Web API method with a bot token.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Request framing, bot-token authentication and the
//! service's `ok: false` error envelope are handled here. The [`tracker`]
//! crate sees only [`tracker::MessageSink`] and
//! [`tracker::WatchError::NotificationDelivery`].

pub mod client;

pub use client::{SlackClient, SlackConfig, DEFAULT_BASE_URL};
