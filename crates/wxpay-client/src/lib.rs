//! wxpay client
//!
//! Talks to the merchant API: [`RequestDispatcher`] signs, posts and
//! verifies every call, [`PayClient`] wraps it with one typed method per
//! operation.

pub mod error;
pub mod transport;
pub mod sandbox;
pub mod report;
pub mod dispatcher;
pub mod cache;
pub mod ticket;
pub mod client;

#[cfg(test)]
pub(crate) mod testing;

pub use error::ClientError;
pub use transport::{ReqwestTransport, Transport};
pub use sandbox::SandboxKeyManager;
pub use dispatcher::{CallOptions, RequestDispatcher};
pub use cache::{InMemoryTokenCache, TokenCache};
pub use ticket::JsapiTicketSource;
pub use client::{JsapiPayInfo, PayClient};
