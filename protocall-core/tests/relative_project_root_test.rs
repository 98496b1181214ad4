//! Runs in its own test binary because it changes the process working directory.
use protocall_core::{config::EngineConfig, engine::InvocationEngine};

#[tokio::test]
async fn test_relative_project_root_compiles() {
    let cwd = tempfile::tempdir().unwrap();
    std::env::set_current_dir(cwd.path()).unwrap();

    let config = EngineConfig::default()
        .with_project_root("proj")
        .with_include_dir(order_service::PROTO_DIR)
        .with_protoc(protoc_bin_vendored::protoc_bin_path().unwrap());

    let registry = InvocationEngine::new(config)
        .inspect("order.proto", &["common.proto".to_string()])
        .await
        .unwrap();

    assert_eq!(
        registry.stub("OrderServiceStub").map(|s| s.full_name()),
        Some("order.OrderService")
    );
    assert!(cwd.path().join("proj").exists());
    assert!(!cwd.path().join("proj").join("order_interface").exists());
}
