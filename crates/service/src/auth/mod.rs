//! Auth module: bearer token verification against the issuer's published key set.
//!
//! Every verification fetches the key set anew; nothing is cached between calls.

pub mod domain;
pub mod errors;
pub mod jwks;
pub mod verifier;

pub use domain::VerifiedIdentity;
pub use verifier::{TokenVerifier, VerifierConfig};
