use base64::prelude::*;
use ini::Ini;
use std::path::Path;
use std::str::FromStr;
use x25519_dalek::{PublicKey, StaticSecret};

use super::types::{ClientArgs, InterfaceAddress, Invocation, TunnelSettings};
use crate::error::{ConfigError, Result, UsageError};

/// Load tunnel settings from an INI file, starting from the defaults
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<TunnelSettings> {
    let path = path.as_ref();
    let ini = Ini::load_from_file(path)
        .map_err(|e| ConfigError::Parse(format!("{}: {}", path.display(), e)))?;
    parse_settings(&ini)
}

/// Parse tunnel settings from INI text
pub fn parse_settings_str(s: &str) -> Result<TunnelSettings> {
    let ini = Ini::load_from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
    parse_settings(&ini)
}

fn parse_settings(ini: &Ini) -> Result<TunnelSettings> {
    let mut settings = TunnelSettings::default();

    for (section, props) in ini.iter() {
        match section {
            Some("Tunnel") => {
                if let Some(name) = props.get("InterfaceName") {
                    settings.interface_name = name.trim().to_string();
                }
                if let Some(port) = props.get("ListenPort") {
                    settings.listen_port = parse_port(port)?;
                }
                if let Some(addr) = props.get("ServerAddress") {
                    settings.server_address = InterfaceAddress::from_str(addr)?;
                }
                if let Some(addr) = props.get("ClientAddress") {
                    settings.client_address = InterfaceAddress::from_str(addr)?;
                }
            }
            Some("Service") => {
                if let Some(name) = props.get("Name") {
                    settings.service.name = name.trim().to_string();
                }
                if let Some(image) = props.get("Image") {
                    settings.service.image = image.trim().to_string();
                }
                if let Some(port) = props.get("PublishPort") {
                    settings.service.publish_port = parse_port(port)?;
                }
                if let Some(port) = props.get("ContainerPort") {
                    settings.service.container_port = parse_port(port)?;
                }
            }
            Some("Probe") => {
                if let Some(name) = props.get("Name") {
                    settings.probe.name = name.trim().to_string();
                }
                if let Some(image) = props.get("Image") {
                    settings.probe.image = image.trim().to_string();
                }
            }
            Some("Runtime") => {
                if let Some(binary) = props.get("Binary") {
                    settings.runtime_binary = binary.trim().to_string();
                }
            }
            _ => {
                // Ignore unknown sections
            }
        }
    }

    settings.validate()?;
    Ok(settings)
}

fn parse_port(s: &str) -> std::result::Result<u16, ConfigError> {
    s.trim()
        .parse::<u16>()
        .map_err(|_| ConfigError::InvalidPort(s.to_string()))
}

/// Decide the role from positional arguments.
///
/// Nothing here touches the system: keys are decoded and the argument count
/// checked before any interface or workload exists.
pub fn parse_invocation(args: &[String]) -> Result<Invocation> {
    match args {
        [] => Ok(Invocation::Server),
        [server_public_key, client_private_key, server_address] => {
            let server_public_key = decode_public_key(server_public_key, "server public key")?;
            let client_private_key =
                decode_private_key(client_private_key, "client private key")?;

            let server_address = server_address.trim();
            if server_address.is_empty() {
                return Err(UsageError::EmptyAddress.into());
            }

            Ok(Invocation::Client(ClientArgs {
                server_public_key,
                client_private_key,
                server_address: server_address.to_string(),
            }))
        }
        other => Err(UsageError::ArgumentCount(other.len()).into()),
    }
}

fn decode_key_bytes(s: &str, which: &'static str) -> std::result::Result<[u8; 32], UsageError> {
    let bytes = BASE64_STANDARD
        .decode(s.trim())
        .map_err(|e| UsageError::InvalidKey {
            which,
            reason: format!("invalid base64: {}", e),
        })?;

    if bytes.len() != 32 {
        return Err(UsageError::InvalidKey {
            which,
            reason: format!("must be 32 bytes, got {}", bytes.len()),
        });
    }

    let mut key_bytes = [0u8; 32];
    key_bytes.copy_from_slice(&bytes);
    Ok(key_bytes)
}

/// Decode a base64-encoded private key
pub fn decode_private_key(
    s: &str,
    which: &'static str,
) -> std::result::Result<StaticSecret, UsageError> {
    decode_key_bytes(s, which).map(StaticSecret::from)
}

/// Decode a base64-encoded public key
pub fn decode_public_key(
    s: &str,
    which: &'static str,
) -> std::result::Result<PublicKey, UsageError> {
    decode_key_bytes(s, which).map(PublicKey::from)
}

/// Encode a key to base64
pub fn encode_key(key: &[u8; 32]) -> String {
    BASE64_STANDARD.encode(key)
}

/// Generate a new private key
pub fn generate_private_key() -> StaticSecret {
    StaticSecret::random_from_rng(rand::rngs::OsRng)
}

/// Derive public key from private key
pub fn derive_public_key(private_key: &StaticSecret) -> PublicKey {
    PublicKey::from(private_key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Role;
    use crate::error::WgError;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_no_arguments_selects_server() {
        let invocation = parse_invocation(&[]).unwrap();
        assert_eq!(invocation.role(), Role::Server);
    }

    #[test]
    fn test_three_arguments_select_client() {
        let server_pub = encode_key(derive_public_key(&generate_private_key()).as_bytes());
        let client_priv = encode_key(&generate_private_key().to_bytes());

        let invocation =
            parse_invocation(&args(&[&server_pub, &client_priv, "203.0.113.7"])).unwrap();
        match invocation {
            Invocation::Client(client) => {
                assert_eq!(encode_key(client.server_public_key.as_bytes()), server_pub);
                assert_eq!(encode_key(&client.client_private_key.to_bytes()), client_priv);
                assert_eq!(client.server_address, "203.0.113.7");
            }
            Invocation::Server => panic!("expected client invocation"),
        }
    }

    #[test]
    fn test_two_arguments_is_usage_error() {
        let err = parse_invocation(&args(&["a", "b"])).unwrap_err();
        assert!(matches!(err, WgError::Usage(UsageError::ArgumentCount(2))));
    }

    #[test]
    fn test_malformed_key_is_usage_error() {
        let client_priv = encode_key(&generate_private_key().to_bytes());
        let err = parse_invocation(&args(&["not base64!", &client_priv, "203.0.113.7"]))
            .unwrap_err();
        assert!(matches!(
            err,
            WgError::Usage(UsageError::InvalidKey {
                which: "server public key",
                ..
            })
        ));
    }

    #[test]
    fn test_short_key_is_usage_error() {
        let server_pub = encode_key(derive_public_key(&generate_private_key()).as_bytes());
        let short = BASE64_STANDARD.encode([7u8; 16]);
        let err = parse_invocation(&args(&[&server_pub, &short, "203.0.113.7"])).unwrap_err();
        assert!(matches!(
            err,
            WgError::Usage(UsageError::InvalidKey {
                which: "client private key",
                ..
            })
        ));
    }

    #[test]
    fn test_blank_server_address_is_usage_error() {
        let server_pub = encode_key(derive_public_key(&generate_private_key()).as_bytes());
        let client_priv = encode_key(&generate_private_key().to_bytes());
        let err = parse_invocation(&args(&[&server_pub, &client_priv, "  "])).unwrap_err();
        assert!(matches!(err, WgError::Usage(UsageError::EmptyAddress)));
    }

    #[test]
    fn test_empty_settings_file_yields_defaults() {
        let settings = parse_settings_str("").unwrap();
        assert_eq!(settings, TunnelSettings::default());
    }

    #[test]
    fn test_settings_override_selected_keys() {
        let settings = parse_settings_str(
            "[Tunnel]\n\
             InterfaceName = wg-demo\n\
             ListenPort = 51900\n\
             ServerAddress = 10.9.0.1/24\n\
             ClientAddress = 10.9.0.2/24\n\
             [Service]\n\
             PublishPort = 9090\n\
             [Runtime]\n\
             Binary = podman\n",
        )
        .unwrap();

        assert_eq!(settings.interface_name, "wg-demo");
        assert_eq!(settings.listen_port, 51900);
        assert_eq!(settings.server_address.to_string(), "10.9.0.1/24");
        assert_eq!(settings.service.publish_port, 9090);
        assert_eq!(settings.service.image, "nginx");
        assert_eq!(settings.runtime_binary, "podman");
    }

    #[test]
    fn test_settings_reject_bad_port() {
        let err = parse_settings_str("[Tunnel]\nListenPort = 70000\n").unwrap_err();
        assert!(matches!(err, WgError::Config(ConfigError::InvalidPort(_))));
    }

    #[test]
    fn test_settings_are_validated() {
        let err = parse_settings_str("[Tunnel]\nClientAddress = 192.168.5.2/24\n").unwrap_err();
        assert!(matches!(err, WgError::Config(ConfigError::InvalidAddress(_))));
    }

    #[test]
    fn test_load_settings_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tunnel.ini");
        std::fs::write(&path, "[Probe]\nName = probe\nImage = curlimages/curl\n").unwrap();

        let settings = load_settings(&path).unwrap();
        assert_eq!(settings.probe.name, "probe");
        assert_eq!(settings.probe.image, "curlimages/curl");
    }

    #[test]
    fn test_load_settings_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_settings(dir.path().join("absent.ini")).unwrap_err();
        assert!(matches!(err, WgError::Config(ConfigError::Parse(_))));
    }

    #[test]
    fn test_generated_keys_roundtrip_through_base64() {
        let private = generate_private_key();
        let encoded = encode_key(&private.to_bytes());
        let decoded = decode_private_key(&encoded, "key").unwrap();
        assert_eq!(derive_public_key(&decoded), derive_public_key(&private));
    }
}
