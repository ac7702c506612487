//! External collaborators: token exchange and the HTTP transport

pub mod auth;
pub mod transport;

pub use auth::{AuthToken, OAuthClient, TokenProvider};
pub use transport::{HttpTransport, Method, Transport, AUTH_HEADER};
