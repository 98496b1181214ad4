//! # Dynamic Stub
//!
//! The client side of one service. A [`DynamicStub`] wraps a `tonic` client and exposes the
//! service's methods by name, the way a generated stub would, but everything it knows about
//! the service comes from a [`ServiceDescriptor`].
//!
//! The stub is generic over the transport, so it runs over a [`Channel`] in production and
//! over any in-process `GrpcService` in tests.
use super::TransportError;
use super::codec::DynamicCodec;
use crate::BoxError;
use http_body::Body as HttpBody;
use prost_reflect::{DynamicMessage, MethodDescriptor, ServiceDescriptor};
use std::str::FromStr;
use tonic::{client::GrpcService, transport::Channel};

#[derive(Debug, Clone)]
pub struct DynamicStub<S = Channel> {
    service: ServiceDescriptor,
    client: tonic::client::Grpc<S>,
}

impl<S> DynamicStub<S>
where
    S: GrpcService<tonic::body::Body>,
    S::Error: Into<BoxError>,
    S::ResponseBody: HttpBody<Data = tonic::codegen::Bytes> + Send + 'static,
    <S::ResponseBody as HttpBody>::Error: Into<BoxError> + Send,
{
    pub fn new(service: ServiceDescriptor, transport: S) -> Self {
        let client = tonic::client::Grpc::new(transport);
        Self { service, client }
    }

    pub fn service(&self) -> &ServiceDescriptor {
        &self.service
    }

    /// Looks up one of the stub's methods by its simple name.
    pub fn method(&self, name: &str) -> Option<MethodDescriptor> {
        self.service.methods().find(|m| m.name() == name)
    }

    /// Performs a Unary gRPC call (Single Request -> Single Response).
    ///
    /// A non-OK status from the server is returned as [`TransportError::Status`].
    pub async fn unary(
        &mut self,
        method: &MethodDescriptor,
        payload: DynamicMessage,
    ) -> Result<DynamicMessage, TransportError> {
        self.client
            .ready()
            .await
            .map_err(|e| TransportError::ClientNotReady(e.into()))?;

        let codec = DynamicCodec::new(method.output());
        let path = http_path(&self.service, method)?;
        let request = tonic::Request::new(payload);

        let response = self.client.unary(request, path, codec).await?;
        Ok(response.into_inner())
    }
}

/// `/<package>.<Service>/<Method>`, addressed to the stub's own service.
fn http_path(
    service: &ServiceDescriptor,
    method: &MethodDescriptor,
) -> Result<http::uri::PathAndQuery, TransportError> {
    let path = format!("/{}/{}", service.full_name(), method.name());
    http::uri::PathAndQuery::from_str(&path).map_err(|_| TransportError::InvalidPath(path))
}

#[cfg(test)]
mod test {
    use super::*;
    use prost_reflect::DescriptorPool;
    use prost_types::{
        DescriptorProto, FileDescriptorProto, FileDescriptorSet, MethodDescriptorProto,
        ServiceDescriptorProto,
    };

    fn service() -> ServiceDescriptor {
        let set = FileDescriptorSet {
            file: vec![FileDescriptorProto {
                name: Some("billing.proto".to_string()),
                package: Some("billing.v1".to_string()),
                syntax: Some("proto3".to_string()),
                message_type: vec![DescriptorProto {
                    name: Some("Invoice".to_string()),
                    ..Default::default()
                }],
                service: vec![ServiceDescriptorProto {
                    name: Some("BillingService".to_string()),
                    method: vec![MethodDescriptorProto {
                        name: Some("GetInvoice".to_string()),
                        input_type: Some(".billing.v1.Invoice".to_string()),
                        output_type: Some(".billing.v1.Invoice".to_string()),
                        ..Default::default()
                    }],
                    ..Default::default()
                }],
                ..Default::default()
            }],
        };

        DescriptorPool::from_file_descriptor_set(set)
            .unwrap()
            .get_service_by_name("billing.v1.BillingService")
            .unwrap()
    }

    #[test]
    fn test_http_path() {
        let service = service();
        let method = service.methods().next().unwrap();

        let path = http_path(&service, &method).unwrap();

        assert_eq!(path.as_str(), "/billing.v1.BillingService/GetInvoice");
    }

    #[tokio::test]
    async fn test_method_lookup() {
        let stub = DynamicStub::new(
            service(),
            Channel::from_static("http://localhost:50051").connect_lazy(),
        );

        assert!(stub.method("GetInvoice").is_some());
        assert!(stub.method("getInvoice").is_none());
    }
}
