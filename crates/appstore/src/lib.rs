//! Release-management provider infrastructure adapter.
//!
//! Implements [`tracker::ReleaseStatusSource`] over the provider's REST API.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Token signing, HTTP transport, JSON:API decoding and
//! error translation all live here. The [`tracker`] crate sees only
//! [`tracker::ReleaseStatusSource`] and the domain types it returns.
//!
//! ## Authentication
//!
//! Every authenticated call carries a short-lived ES256 token minted by
//! [`TokenSigner`] from a [`Credential`]. A single token is shared by the two
//! requests that make up one status fetch.

pub mod client;
pub mod token;
pub mod wire;

pub use client::{AuthHeaders, ClientConfig, ReleaseStatusClient, DEFAULT_BASE_URL};
pub use token::{
    import_signing_key, Credential, SignedToken, TokenSigner, AUDIENCE, TOKEN_LIFETIME_SECS,
};
