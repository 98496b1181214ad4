use order_service::OrderServiceServer;
use order_service_impl::{CREATED_ORDER_ID, OrderServiceImpl};
use protocall_core::{
    config::EngineConfig,
    engine::InvocationEngine,
    error::{InvocationError, Stage},
    grpc::TransportError,
    marshal::MarshalError,
    request::InvocationRequest,
    resolver::ResolutionError,
};
use serde_json::json;
use std::path::Path;
use tonic::transport::Server;


async fn spawn_server() -> u16 {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();

    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        Server::builder()
            .add_service(OrderServiceServer::new(OrderServiceImpl))
            .serve_with_incoming(tokio_stream::wrappers::TcpListenerStream::new(listener))
            .await
            .unwrap();
    });

    port
}

fn engine(project_root: &Path) -> InvocationEngine {
    let config = EngineConfig::default()
        .with_project_root(project_root)
        .with_include_dir(order_service::PROTO_DIR)
        .with_protoc(protoc_bin_vendored::protoc_bin_path().unwrap());

    InvocationEngine::new(config)
}

fn request(service: &str, input: serde_json::Value) -> InvocationRequest {
    InvocationRequest::from_value(json!({
        "protoPackage": "order.proto",
        "dependentProtoPackage": ["common.proto"],
        "service": service,
        "input": input,
    }))
    .unwrap()
}

fn in_process() -> OrderServiceServer<OrderServiceImpl> {
    OrderServiceServer::new(OrderServiceImpl)
}

#[tokio::test]
async fn test_get_order_over_tcp() {
    let port = spawn_server().await;
    let root = tempfile::tempdir().unwrap();

    let request = InvocationRequest::from_value(json!({
        "protoPackage": "order.proto",
        "connect": { "host": "127.0.0.1", "port": port.to_string() },
        "service": "OrderService/GetOrder",
        "input": { "orderId": "123" }
    }))
    .unwrap();

    let response = engine(root.path()).invoke(request).await.unwrap();

    assert_eq!(response, json!({ "id": "123" }));
    assert!(!root.path().join("order_interface").exists());
}

#[tokio::test]
async fn test_create_order_round_trip() {
    let port = spawn_server().await;
    let root = tempfile::tempdir().unwrap();

    let input = json!({
        "customer": "acme",
        "items": [
            { "sku": "SKU-1", "quantity": 3 },
            { "sku": "SKU-2", "quantity": 1 }
        ],
        "total": { "currencyCode": "EUR", "units": "1999", "nanos": 500000000 },
        "priority": "PRIORITY_EXPRESS",
        "labels": { "channel": "web", "region": "eu" }
    });

    let mut request = request("order.OrderService/CreateOrder", input.clone());
    request.target.host = "127.0.0.1".to_string();
    request.target.port = port.to_string();

    let mut response = engine(root.path()).invoke(request).await.unwrap();

    let id = response.as_object_mut().unwrap().remove("id");
    assert_eq!(id, Some(json!(CREATED_ORDER_ID)));
    assert_eq!(response, input);
}

#[tokio::test]
async fn test_invoke_with_in_process_transport() {
    let root = tempfile::tempdir().unwrap();

    let response = engine(root.path())
        .invoke_with_transport(
            request("OrderService/GetOrder", json!({ "orderId": "in-process" })),
            in_process(),
        )
        .await
        .unwrap();

    assert_eq!(response["id"], "in-process");
}

#[tokio::test]
async fn test_malformed_method_path_fails_before_network() {
    let root = tempfile::tempdir().unwrap();

    // Nothing listens on the default target, so reaching the network would fail differently.
    let result = engine(root.path())
        .invoke(request("OrderServiceGetOrder", json!({ "orderId": "123" })))
        .await;

    let err = result.unwrap_err();
    assert!(matches!(
        err,
        InvocationError::Resolution(ResolutionError::MalformedPath(_))
    ));
    assert_eq!(err.stage(), Stage::Resolve);
    assert!(!root.path().join("order_interface").exists());
}

#[tokio::test]
async fn test_unknown_field_is_rejected() {
    let root = tempfile::tempdir().unwrap();

    let result = engine(root.path())
        .invoke_with_transport(
            request(
                "OrderService/GetOrder",
                json!({ "orderId": "123", "trackingCode": "x" }),
            ),
            in_process(),
        )
        .await;

    assert!(matches!(
        result,
        Err(InvocationError::Marshal(MarshalError::Mismatch { ref message, .. }))
            if message == "order.GetOrderRequest"
    ));
    assert!(!root.path().join("order_interface").exists());
}

#[tokio::test]
async fn test_type_mismatch_reports_json_path() {
    let root = tempfile::tempdir().unwrap();

    let result = engine(root.path())
        .invoke_with_transport(
            request(
                "OrderService/CreateOrder",
                json!({ "items": [{ "sku": "SKU-1", "quantity": "many" }] }),
            ),
            in_process(),
        )
        .await;

    match result {
        Err(InvocationError::Marshal(MarshalError::Mismatch { path, .. })) => {
            assert_eq!(path, "items[0].quantity")
        }
        other => panic!("expected a marshal error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_server_status_is_reported() {
    let root = tempfile::tempdir().unwrap();

    let result = engine(root.path())
        .invoke_with_transport(request("OrderService/GetOrder", json!({})), in_process())
        .await;

    let err = result.unwrap_err();
    assert!(matches!(
        err,
        InvocationError::Transport(TransportError::Status(ref status))
            if status.code() == tonic::Code::InvalidArgument
    ));
    assert_eq!(err.stage(), Stage::Invoke);
    assert!(!root.path().join("order_interface").exists());
}

#[tokio::test]
async fn test_unreachable_server() {
    let root = tempfile::tempdir().unwrap();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let mut request = request("OrderService/GetOrder", json!({ "orderId": "123" }));
    request.target.host = "127.0.0.1".to_string();
    request.target.port = port.to_string();

    let err = engine(root.path()).invoke(request).await.unwrap_err();

    assert!(matches!(err, InvocationError::Transport(_)));
    assert_eq!(err.stage(), Stage::Invoke);
    assert!(!root.path().join("order_interface").exists());
}

#[tokio::test]
async fn test_streaming_method_is_rejected() {
    let root = tempfile::tempdir().unwrap();

    let result = engine(root.path())
        .invoke_with_transport(
            request("OrderService/WatchOrders", json!({ "orderId": "123" })),
            in_process(),
        )
        .await;

    assert!(matches!(
        result,
        Err(InvocationError::Resolution(ResolutionError::StreamingNotSupported(_)))
    ));
}

#[tokio::test]
async fn test_dependent_package_services_have_no_stub() {
    let root = tempfile::tempdir().unwrap();

    let request = InvocationRequest::from_value(json!({
        "protoPackage": "order.proto",
        "dependentProtoPackage": ["inventory.proto"],
        "service": "InventoryService/CheckStock",
        "input": { "sku": "SKU-1" }
    }))
    .unwrap();

    let result = engine(root.path())
        .invoke_with_transport(request, in_process())
        .await;

    assert!(matches!(
        result,
        Err(InvocationError::Resolution(ResolutionError::StubNotFound { ref accessor, .. }))
            if accessor == "InventoryServiceStub"
    ));
}

#[tokio::test]
async fn test_missing_package_fails_to_compile() {
    let root = tempfile::tempdir().unwrap();

    let mut request = request("OrderService/GetOrder", json!({ "orderId": "123" }));
    request.interface_package = "shipping.proto".to_string();

    let err = engine(root.path())
        .invoke_with_transport(request, in_process())
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Stage::Compile);
    assert!(!root.path().join("shipping_interface").exists());
}

#[tokio::test]
async fn test_isolated_workspaces_allow_concurrent_invocations() {
    let root = tempfile::tempdir().unwrap();

    let config = EngineConfig::default()
        .with_project_root(root.path())
        .with_include_dir(order_service::PROTO_DIR)
        .with_protoc(protoc_bin_vendored::protoc_bin_path().unwrap())
        .with_isolated_workspaces(true);
    let engine = InvocationEngine::new(config);

    let (first, second) = tokio::join!(
        engine.invoke_with_transport(
            request("OrderService/GetOrder", json!({ "orderId": "first" })),
            in_process(),
        ),
        engine.invoke_with_transport(
            request("OrderService/GetOrder", json!({ "orderId": "second" })),
            in_process(),
        ),
    );

    assert_eq!(first.unwrap()["id"], "first");
    assert_eq!(second.unwrap()["id"], "second");
    assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_inspect_package() {
    let root = tempfile::tempdir().unwrap();

    let registry = engine(root.path())
        .inspect("order.proto", &["inventory.proto".to_string()])
        .await
        .unwrap();

    let stubs: Vec<_> = registry
        .stubs()
        .map(|(accessor, service)| (accessor.to_string(), service.full_name().to_string()))
        .collect();
    assert_eq!(
        stubs,
        vec![(
            "OrderServiceStub".to_string(),
            "order.OrderService".to_string()
        )]
    );

    let services = registry.list_services();
    assert!(services.contains(&"order.OrderService".to_string()));
    assert!(services.contains(&"inventory.InventoryService".to_string()));
    assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
}
