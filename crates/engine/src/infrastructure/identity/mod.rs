//! Identity verification adapters.

mod jwt;

pub use jwt::JwtIdentityVerifier;
