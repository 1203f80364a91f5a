//! Identity Provider Clients

mod http;

pub use http::HttpIdentityProvider;
