//! # Method Resolver
//!
//! Turns a `<service>/<method>` path into a [`ResolvedMethod`]: the method's descriptor, its
//! input and output shapes, and the stub that serves it.
//!
//! The service segment is either fully qualified (`order.OrderService`) or a simple name
//! (`OrderService`) that matches exactly one service in the registry. Resolution never
//! touches the network.
use crate::registry::DescriptorRegistry;
use prost_reflect::{MessageDescriptor, MethodDescriptor, ServiceDescriptor};
use std::fmt;
use std::str::FromStr;

pub const METHOD_PATH_SEPARATOR: char = '/';

const STUB_SUFFIX: &str = "Stub";

#[derive(Debug, thiserror::Error)]
pub enum ResolutionError {
    #[error("Malformed method path '{0}', expected '<service>/<method>'")]
    MalformedPath(String),

    #[error("Service '{0}' not found")]
    ServiceNotFound(String),

    #[error("Service name '{name}' is ambiguous, candidates: {candidates:?}")]
    AmbiguousService {
        name: String,
        candidates: Vec<String>,
    },

    #[error("Method '{method}' not found in service '{service}'")]
    MethodNotFound { service: String, method: String },

    #[error("Method '{0}' is streaming, only unary methods can be invoked")]
    StreamingNotSupported(String),

    #[error("No stub '{accessor}' registered for service '{service}'")]
    StubNotFound { service: String, accessor: String },
}

/// A parsed `<service>/<method>` path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodPath {
    pub service: String,
    pub method: String,
}

impl FromStr for MethodPath {
    type Err = ResolutionError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let malformed = || ResolutionError::MalformedPath(path.to_string());

        let (service, method) = path.split_once(METHOD_PATH_SEPARATOR).ok_or_else(malformed)?;

        if service.is_empty() || method.is_empty() || method.contains(METHOD_PATH_SEPARATOR) {
            return Err(malformed());
        }

        Ok(Self {
            service: service.to_string(),
            method: method.to_string(),
        })
    }
}

impl fmt::Display for MethodPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{METHOD_PATH_SEPARATOR}{}", self.service, self.method)
    }
}

/// Derives the stub accessor name of a service.
///
/// Only the last `.` component counts. Its first character and every character following an
/// `_` are upper-cased, and each such `_` is dropped. A trailing `_` stays, and so does the
/// second of two consecutive underscores. The result is suffixed with `Stub`.
///
/// `order_service` -> `OrderServiceStub`, `order.OrderService` -> `OrderServiceStub`,
/// `order__service_` -> `Order_service_Stub`.
pub fn stub_accessor_name(service: &str) -> String {
    let simple = service.rsplit('.').next().unwrap_or(service);

    let mut accessor = String::with_capacity(simple.len() + STUB_SUFFIX.len());
    let mut chars = simple.chars();

    if let Some(first) = chars.next() {
        accessor.extend(first.to_uppercase());
    }
    while let Some(c) = chars.next() {
        if c != '_' {
            accessor.push(c);
            continue;
        }
        match chars.next() {
            Some(next) => accessor.extend(next.to_uppercase()),
            None => accessor.push('_'),
        }
    }

    accessor.push_str(STUB_SUFFIX);
    accessor
}

/// A method ready to be invoked.
#[derive(Debug, Clone)]
pub struct ResolvedMethod {
    method: MethodDescriptor,
    stub: ServiceDescriptor,
    accessor: String,
}

impl ResolvedMethod {
    pub fn method(&self) -> &MethodDescriptor {
        &self.method
    }

    pub fn full_name(&self) -> &str {
        self.method.full_name()
    }

    pub fn input(&self) -> MessageDescriptor {
        self.method.input()
    }

    pub fn output(&self) -> MessageDescriptor {
        self.method.output()
    }

    /// The service registered under [`Self::accessor`].
    pub fn stub(&self) -> &ServiceDescriptor {
        &self.stub
    }

    pub fn accessor(&self) -> &str {
        &self.accessor
    }
}

impl DescriptorRegistry {
    pub fn resolve(&self, path: &MethodPath) -> Result<ResolvedMethod, ResolutionError> {
        let service = self.find_service(&path.service)?;

        let method = service
            .methods()
            .find(|m| m.name() == path.method)
            .ok_or_else(|| ResolutionError::MethodNotFound {
                service: service.full_name().to_string(),
                method: path.method.clone(),
            })?;

        if method.is_client_streaming() || method.is_server_streaming() {
            return Err(ResolutionError::StreamingNotSupported(
                method.full_name().to_string(),
            ));
        }

        let accessor = stub_accessor_name(service.name());
        let stub = self
            .stub(&accessor)
            .cloned()
            .ok_or_else(|| ResolutionError::StubNotFound {
                service: service.full_name().to_string(),
                accessor: accessor.clone(),
            })?;

        Ok(ResolvedMethod {
            method,
            stub,
            accessor,
        })
    }

    fn find_service(&self, name: &str) -> Result<ServiceDescriptor, ResolutionError> {
        if let Some(service) = self.pool().get_service_by_name(name) {
            return Ok(service);
        }

        let mut matches: Vec<ServiceDescriptor> = self
            .pool()
            .services()
            .filter(|s| s.name() == name)
            .collect();

        match matches.len() {
            0 => Err(ResolutionError::ServiceNotFound(name.to_string())),
            1 => Ok(matches.remove(0)),
            _ => Err(ResolutionError::AmbiguousService {
                name: name.to_string(),
                candidates: matches.iter().map(|s| s.full_name().to_string()).collect(),
            }),
        }
    }
}
