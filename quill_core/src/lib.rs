//! Request, response and route dispatch core for the quill JSON API.
//!
//! This crate carries the protocol-neutral pieces: the canonical request and
//! response envelope, the ordered route table with method negotiation, and
//! the authentication provider chain that runs ahead of dispatch. Concrete
//! authenticators (such as the OAuth 1.0a provider in `quill_oauth1`) plug in
//! through the [`auth::Authenticator`] trait.

pub mod auth;
pub mod error;
pub mod http;
pub mod router;
pub mod server;
pub mod urlenc;

pub use auth::{AuthChain, AuthOutcome, Authenticator, Principal};
pub use error::ApiError;
pub use http::method::{HttpMethod, MethodSet};
pub use http::request::{ParamSource, Request};
pub use http::response::{Body, Response};
pub use http::status::StatusCode;
pub use router::{Endpoint, Handler, RouteTable};
pub use server::RestServer;
