pub mod peer;
pub mod provision;

pub use peer::{resolve_endpoint, PeerConfigurator, ServerCredentials};
pub use provision::{Provisioner, TunnelInterface};
