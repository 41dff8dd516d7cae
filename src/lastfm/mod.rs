//! Talking to the scrobbling service: the raw HTTP client and the two API calls built on it

pub mod api;
pub mod client;
pub mod error;
