//! HTTP transport for Tourdesk.
//!
//! Provides the [`ApiClient`] every collaborator uses to talk to the
//! back-office API, and the [`AuthorizationSlot`] whose single writer (the
//! session manager) decides which bearer token those requests carry.

mod authorization;
mod client;
mod error;

pub use authorization::{
    AuthorizationReader, AuthorizationSlot, AuthorizationWriter,
};
pub use client::ApiClient;
pub use error::TransportError;

pub use reqwest::{Method, RequestBuilder, Response, StatusCode};
