use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WgError {
    #[error("Usage error: {0}")]
    Usage(#[from] UsageError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Interface error: {0}")]
    Interface(#[from] InterfaceError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Address resolution error: {0}")]
    Resolve(#[from] ResolveError),

    #[error("Workload error: {0}")]
    Workload(#[from] WorkloadError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl WgError {
    /// Process exit status for this error.
    ///
    /// Usage and configuration problems are detected before any system state
    /// is touched and get their own status so scripts can tell them apart.
    pub fn exit_code(&self) -> i32 {
        match self {
            WgError::Usage(_) | WgError::Config(_) => 2,
            _ => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum UsageError {
    #[error("expected 0 or 3 arguments, got {0}")]
    ArgumentCount(usize),

    #[error("invalid {which}: {reason}")]
    InvalidKey { which: &'static str, reason: String },

    #[error("server address must not be empty")]
    EmptyAddress,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid port: {0}")]
    InvalidPort(String),

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

#[derive(Error, Debug)]
pub enum InterfaceError {
    #[error("Failed to create interface {name}: {reason}")]
    Create { name: String, reason: String },

    #[error("Failed to delete interface {name}: {reason}")]
    Delete { name: String, reason: String },

    #[error("Failed to add address: {0}")]
    AddAddress(String),

    #[error("Failed to set interface up: {0}")]
    SetLinkUp(String),

    #[error("Netlink error: {0}")]
    Netlink(String),
}

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Invalid interface name: {0}")]
    InterfaceName(String),

    #[error("Failed to apply configuration to {interface}: {reason}")]
    Apply { interface: String, reason: String },
}

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("cannot resolve {target}: {reason}")]
    Lookup { target: String, reason: String },

    #[error("no addresses found for {0}")]
    NoAddresses(String),
}

#[derive(Error, Debug)]
pub enum WorkloadError {
    #[error("failed to launch {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to start {name}: {output}")]
    Start { name: String, output: String },

    #[error("failed to stop {name}: {output}")]
    Stop { name: String, output: String },
}

pub type Result<T> = std::result::Result<T, WgError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_errors_exit_with_two() {
        let err: WgError = UsageError::ArgumentCount(2).into();
        assert_eq!(err.exit_code(), 2);

        let err: WgError = ConfigError::Parse("bad".to_string()).into();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_runtime_errors_exit_with_one() {
        let err: WgError = InterfaceError::SetLinkUp("eperm".to_string()).into();
        assert_eq!(err.exit_code(), 1);

        let err: WgError = WorkloadError::Start {
            name: "nginx".to_string(),
            output: "conflict".to_string(),
        }
        .into();
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_apply_error_names_interface_only() {
        let err: WgError = ProtocolError::Apply {
            interface: "wg-tunnel".to_string(),
            reason: "EPERM".to_string(),
        }
        .into();
        let message = err.to_string();
        assert!(message.contains("wg-tunnel"));
        assert!(!message.contains("server"));
        assert!(!message.contains("client"));
    }

    #[test]
    fn test_signal_listener_failure_exits_with_one() {
        let err: WgError = io::Error::other("no signal handler").into();
        assert_eq!(err.exit_code(), 1);
    }
}
