/**
 * Backend REST client: request types and the bearer-token
 *  aware `ApiClient`.
 */
pub mod api;
pub mod backend;
pub mod chain;

pub use api::{ApiClient, ApiError};
pub use backend::{HttpAuth, HttpBackend};
pub use chain::RpcChainClient;
