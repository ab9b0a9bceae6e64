//! Configuration types for the stream client.

use crate::errors::StreamError;
use rms_common::Dimensions;
use rms_protocol::MAX_PAYLOAD_LEN;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Complete stream client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Connection settings.
    pub connection: ConnectionConfig,
    /// Stream settings.
    #[serde(default)]
    pub stream: StreamConfig,
    /// Security settings.
    #[serde(default)]
    pub security: SecurityConfig,
}

/// Connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Device hostname or IP address.
    pub host: String,
    /// Server port (the device serves on 2001 by default).
    #[serde(default = "default_port")]
    pub port: u16,
    /// Connection timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_port() -> u16 {
    2001
}

fn default_timeout_ms() -> u64 {
    10_000
}

/// Stream configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Raster width in pixels (reMarkable 2 default).
    #[serde(default = "default_width")]
    pub width: u32,
    /// Raster height in pixels (reMarkable 2 default).
    #[serde(default = "default_height")]
    pub height: u32,
    /// Requested frame interval in milliseconds (`rate` query parameter).
    #[serde(default = "default_rate_ms")]
    pub rate_ms: u32,
}

fn default_width() -> u32 {
    1872
}

fn default_height() -> u32 {
    1404
}

fn default_rate_ms() -> u32 {
    200
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            rate_ms: default_rate_ms(),
        }
    }
}

/// Security configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Bearer token sent in the Authorization header, when the server
    /// requires authentication.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    /// TLS configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls: Option<TlsSettings>,
}

/// TLS configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TlsSettings {
    /// Enable TLS.
    pub enabled: bool,
    /// Skip certificate validation. The device serves a self-signed
    /// certificate out of the box, so this is commonly needed; it still
    /// defaults to off.
    #[serde(default)]
    pub danger_accept_invalid_certs: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig {
                host: String::new(),
                port: default_port(),
                timeout_ms: default_timeout_ms(),
            },
            stream: StreamConfig {
                width: default_width(),
                height: default_height(),
                rate_ms: default_rate_ms(),
            },
            security: SecurityConfig {
                auth_token: None,
                tls: None,
            },
        }
    }
}

impl Config {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Load a configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, StreamError> {
        let text = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            StreamError::Config(format!(
                "cannot read {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        let config: Self = toml::from_str(&text)
            .map_err(|e| StreamError::Config(format!("invalid TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), StreamError> {
        if self.connection.host.is_empty() {
            return Err(StreamError::Config("Host cannot be empty".to_string()));
        }
        if self.connection.port == 0 {
            return Err(StreamError::Config("Port cannot be 0".to_string()));
        }
        let dims = self.dimensions();
        if dims.is_empty() {
            return Err(StreamError::Config(
                "Raster dimensions cannot be zero".to_string(),
            ));
        }
        if dims.raster_len() > MAX_PAYLOAD_LEN {
            return Err(StreamError::Config(format!(
                "Raster of {} bytes cannot fit the 24-bit payload length field",
                dims.raster_len()
            )));
        }
        if self.stream.rate_ms == 0 {
            return Err(StreamError::Config(
                "Frame rate interval cannot be 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the connection timeout duration.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.connection.timeout_ms)
    }

    /// The negotiated raster dimensions.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.stream.width, self.stream.height)
    }

    /// True when the connection should use TLS.
    #[must_use]
    pub fn use_tls(&self) -> bool {
        self.security.tls.as_ref().is_some_and(|t| t.enabled)
    }
}

/// Builder for creating a `Config`.
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Sets the device hostname or IP address.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.connection.host = host.into();
        self
    }

    /// Sets the server port.
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.config.connection.port = port;
        self
    }

    /// Sets the raster dimensions.
    #[must_use]
    pub fn dimensions(mut self, width: u32, height: u32) -> Self {
        self.config.stream.width = width;
        self.config.stream.height = height;
        self
    }

    /// Sets the requested frame interval in milliseconds.
    #[must_use]
    pub fn rate_ms(mut self, rate_ms: u32) -> Self {
        self.config.stream.rate_ms = rate_ms;
        self
    }

    /// Sets the bearer token for authenticated servers.
    #[must_use]
    pub fn auth_token(mut self, token: impl Into<String>) -> Self {
        self.config.security.auth_token = Some(token.into());
        self
    }

    /// Enables TLS, optionally accepting the device's self-signed
    /// certificate.
    #[must_use]
    pub fn tls(mut self, danger_accept_invalid_certs: bool) -> Self {
        self.config.security.tls = Some(TlsSettings {
            enabled: true,
            danger_accept_invalid_certs,
        });
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> Result<Config, StreamError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = Config::builder()
            .host("10.11.99.1")
            .port(2001)
            .build()
            .unwrap();

        assert_eq!(config.connection.host, "10.11.99.1");
        assert_eq!(config.connection.port, 2001);
        assert_eq!(config.stream.width, 1872);
        assert_eq!(config.stream.height, 1404);
        assert_eq!(config.stream.rate_ms, 200);
        assert!(!config.use_tls());
    }

    #[test]
    fn test_config_validation_empty_host() {
        assert!(Config::default().validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_port() {
        let mut config = Config::default();
        config.connection.host = "localhost".to_string();
        config.connection.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_dimensions() {
        let result = Config::builder().host("localhost").dimensions(0, 100).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_config_validation_oversized_raster() {
        // 4096 * 4096 * 4 = 64MiB, far past the 24-bit length field.
        let result = Config::builder()
            .host("localhost")
            .dimensions(4096, 4096)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_config_from_toml() {
        let text = r#"
            [connection]
            host = "192.168.1.20"

            [stream]
            rate_ms = 100

            [security]
            auth_token = "secret"
        "#;
        let config: Config = toml::from_str(text).unwrap();
        assert_eq!(config.connection.host, "192.168.1.20");
        assert_eq!(config.connection.port, 2001);
        assert_eq!(config.stream.rate_ms, 100);
        assert_eq!(config.security.auth_token.as_deref(), Some("secret"));
    }

    #[test]
    fn test_tls_builder() {
        let config = Config::builder().host("h").tls(true).build().unwrap();
        assert!(config.use_tls());
        assert!(config
            .security
            .tls
            .unwrap()
            .danger_accept_invalid_certs);
    }
}
