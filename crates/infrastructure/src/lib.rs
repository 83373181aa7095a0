//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod file_credential_store;
mod http_auth_gateway;
mod in_memory_credential_store;

pub use file_credential_store::FileCredentialStore;
pub use http_auth_gateway::HttpAuthGateway;
pub use in_memory_credential_store::InMemoryCredentialStore;
