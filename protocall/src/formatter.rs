use colored::*;
use protocall_core::{
    error::InvocationError,
    grpc::TransportError,
    prost_reflect::{MethodDescriptor, ServiceDescriptor},
    registry::DescriptorRegistry,
    tonic::Status,
};

/// A wrapper struct for a formatted, colored string.
///
/// Implements `Display` so it can be printed directly.
pub struct FormattedString(pub String);

/// Every service of a loaded package, with the stub serving it (if any).
pub struct ServiceTable<'a>(pub &'a DescriptorRegistry);

impl std::fmt::Display for FormattedString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f)?;
        writeln!(f, "{}", self.0)?;
        Ok(())
    }
}

impl From<serde_json::Value> for FormattedString {
    fn from(value: serde_json::Value) -> Self {
        FormattedString(serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string()))
    }
}

impl From<&Status> for FormattedString {
    fn from(status: &Status) -> Self {
        FormattedString(format!(
            "{} code={:?} message={:?}",
            "gRPC Failed:".red().bold(),
            status.code(),
            status.message()
        ))
    }
}

impl From<&InvocationError> for FormattedString {
    fn from(err: &InvocationError) -> Self {
        if let InvocationError::Transport(TransportError::Status(status)) = err {
            return FormattedString::from(status);
        }

        let title = format!("Invocation Failed ({}):", err.stage());
        FormattedString(format!("{}\n\n'{}'", title.red().bold(), err))
    }
}

impl From<anyhow::Error> for FormattedString {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<InvocationError>() {
            Some(err) => FormattedString::from(err),
            None => FormattedString(format!("{}\n\n'{:#}'", "Error:".red().bold(), err)),
        }
    }
}

impl From<ServiceTable<'_>> for FormattedString {
    fn from(ServiceTable(registry): ServiceTable<'_>) -> Self {
        let services: Vec<ServiceDescriptor> = registry.pool().services().collect();
        if services.is_empty() {
            return FormattedString("No services found.".yellow().to_string());
        }

        let mut out = String::new();
        for service in services {
            let stub = registry
                .stubs()
                .find(|(_, s)| s.full_name() == service.full_name())
                .map(|(accessor, _)| accessor.green().to_string())
                .unwrap_or_else(|| "no stub".dimmed().to_string());

            out.push_str(&format!(
                "{} {} {{ // {}\n",
                "service".cyan(),
                service.full_name().green(),
                stub
            ));
            for method in service.methods() {
                out.push_str("  ");
                out.push_str(&FormattedString::from(method).0);
                out.push('\n');
            }
            out.push_str("}\n\n");
        }
        FormattedString(out.trim_end().to_string())
    }
}

impl From<MethodDescriptor> for FormattedString {
    fn from(method: MethodDescriptor) -> Self {
        let input_stream = if method.is_client_streaming() {
            format!("{} ", "stream".cyan())
        } else {
            "".to_string()
        };
        let output_stream = if method.is_server_streaming() {
            format!("{} ", "stream".cyan())
        } else {
            "".to_string()
        };

        FormattedString(format!(
            "{} {}({}{}) {} ({}{});",
            "rpc".cyan(),
            method.name().green(),
            input_stream,
            method.input().full_name().yellow(),
            "returns".cyan(),
            output_stream,
            method.output().full_name().yellow()
        ))
    }
}
