//! # Invocation Request
//!
//! The record describing one invocation: which package to compile, which method to call,
//! where the server lives and what to send. It is read once and never mutated.
//!
//! ```json
//! {
//!   "protoPackage": "order.proto",
//!   "dependentProtoPackage": ["common.proto"],
//!   "connect": { "host": "localhost", "port": "50051" },
//!   "service": "OrderService/GetOrder",
//!   "input": { "orderId": "123" }
//! }
//! ```
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: &str = "50051";

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("Failed to read invocation request '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid invocation request: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// A single invocation of one unary method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationRequest {
    /// The `.proto` file to compile, relative to the include directory.
    #[serde(rename = "protoPackage")]
    pub interface_package: String,
    /// Additional packages compiled into the same workspace, in order.
    #[serde(rename = "dependentProtoPackage", default)]
    pub dependent_packages: Vec<String>,
    #[serde(rename = "connect", default)]
    pub target: ConnectTarget,
    /// `<service>/<method>`.
    #[serde(rename = "service")]
    pub method_path: String,
    /// The request body.
    pub input: serde_json::Value,
}

impl InvocationRequest {
    pub fn from_value(value: serde_json::Value) -> Result<Self, RequestError> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, RequestError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| RequestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// The `host:port` pair of the target server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectTarget {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port", deserialize_with = "port_from_string_or_number")]
    pub port: String,
}

impl Default for ConnectTarget {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ConnectTarget {
    pub fn new(host: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: port.into(),
        }
    }

    /// The plaintext URI the channel connects to.
    pub fn uri(&self) -> String {
        format!("http://{self}")
    }
}

impl fmt::Display for ConnectTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> String {
    DEFAULT_PORT.to_string()
}

fn port_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Text(String),
        Number(u16),
    }

    Ok(match Port::deserialize(deserializer)? {
        Port::Text(port) => port,
        Port::Number(port) => port.to_string(),
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_request() {
        let request = InvocationRequest::from_value(json!({
            "protoPackage": "order.proto",
            "dependentProtoPackage": ["common.proto", "inventory.proto"],
            "connect": { "host": "10.0.0.4", "port": "6000" },
            "service": "OrderService/GetOrder",
            "input": { "orderId": "123" }
        }))
        .unwrap();

        assert_eq!(request.interface_package, "order.proto");
        assert_eq!(
            request.dependent_packages,
            vec!["common.proto".to_string(), "inventory.proto".to_string()]
        );
        assert_eq!(request.target, ConnectTarget::new("10.0.0.4", "6000"));
        assert_eq!(request.method_path, "OrderService/GetOrder");
        assert_eq!(request.input, json!({ "orderId": "123" }));
    }

    #[test]
    fn test_missing_connect_defaults_to_localhost() {
        let request = InvocationRequest::from_value(json!({
            "protoPackage": "order.proto",
            "service": "OrderService/GetOrder",
            "input": {}
        }))
        .unwrap();

        assert!(request.dependent_packages.is_empty());
        assert_eq!(request.target.to_string(), "localhost:50051");
        assert_eq!(request.target.uri(), "http://localhost:50051");
    }

    #[test]
    fn test_partial_connect_and_numeric_port() {
        let request = InvocationRequest::from_value(json!({
            "protoPackage": "order.proto",
            "connect": { "port": 7000 },
            "service": "OrderService/GetOrder",
            "input": {}
        }))
        .unwrap();

        assert_eq!(request.target, ConnectTarget::new("localhost", "7000"));
    }

    #[test]
    fn test_missing_required_fields() {
        for missing in ["protoPackage", "service", "input"] {
            let mut value = json!({
                "protoPackage": "order.proto",
                "service": "OrderService/GetOrder",
                "input": {}
            });
            value.as_object_mut().unwrap().remove(missing);

            let result = InvocationRequest::from_value(value);
            assert!(
                matches!(result, Err(RequestError::Invalid(ref e)) if e.to_string().contains(missing)),
                "expected missing field '{missing}', got {result:?}"
            );
        }
    }

    #[test]
    fn test_from_path_reports_missing_file() {
        let result = InvocationRequest::from_path("/definitely/not/here.json");
        assert!(matches!(result, Err(RequestError::Read { .. })));
    }
}
