//! LLM session domain.
//!
//! - [`config::SessionConfig`] — model a session is scoped to
//! - [`request::Request`] — a prompt plus its timeout
//! - [`response::Response`] — the completed reply

pub mod config;
pub mod request;
pub mod response;
