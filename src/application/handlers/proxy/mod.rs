//! Proxy configuration handlers - the privileged operations.
//!
//! Both handlers here pass the access gate before touching the credential
//! issuer. That composition is a hard contract (see `access_gate`).

mod credential_view;
mod get_config;
mod refresh_config;

pub use credential_view::CredentialView;
pub use get_config::{GetConfigCommand, GetConfigHandler, GetConfigResult};
pub use refresh_config::{RefreshConfigCommand, RefreshConfigHandler, RefreshConfigResult};
