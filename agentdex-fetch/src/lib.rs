//! Source content fetching for agentdex.
//!
//! - [`github`] — [`ContentFetcher`]: listing, branch fallback, downloads
//! - [`retry`] — [`RetryPolicy`] exponential backoff
//! - [`transport`] — [`Transport`] seam and the `reqwest` implementation
//! - [`credentials`] — token providers
//! - [`error`] — [`FetchError`]

pub mod credentials;
pub mod error;
pub mod github;
pub mod retry;
pub mod transport;

pub use credentials::{CredentialProvider, EnvCredentials, StaticCredentials};
pub use error::FetchError;
pub use github::{branch_candidates, ContentFetcher};
pub use retry::{RetryPolicy, Retryable};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportError};
