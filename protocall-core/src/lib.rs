//! # Protocall Core
//!
//! `protocall-core` is a generic gRPC invocation engine. Given a `.proto` package, a
//! `<service>/<method>` path and a JSON body, it compiles the interface on demand, discovers
//! the method's request and response shapes purely from the compiled descriptors, performs a
//! single unary call and hands the response back as JSON. No generated client code is involved.
//!
//! ## Pipeline
//!
//! * **[`compiler`]:** Runs `protoc` as a subprocess and writes message and service bindings
//!   (encoded `FileDescriptorSet`s) into a disposable [`workspace::Workspace`].
//! * **[`bindings`]:** Scans the workspace and registers the selected bindings into a
//!   [`registry::DescriptorRegistry`], building the stub table on the way.
//! * **[`resolver`]:** Turns `Service/Method` into a [`resolver::ResolvedMethod`].
//! * **[`marshal`]:** Strict JSON -> `DynamicMessage` and back.
//! * **[`grpc`]:** Channel construction, the `DynamicMessage` codec and the dynamic stub.
//! * **[`engine`]:** The [`engine::InvocationEngine`] driving an [`engine::Invocation`] through
//!   its typestates, with guaranteed workspace cleanup.
//!
//! ## Example
//!
//! ```rust,no_run
//! use protocall_core::{config::EngineConfig, engine::InvocationEngine, request::InvocationRequest};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let request = InvocationRequest::from_value(serde_json::json!({
//!     "protoPackage": "order.proto",
//!     "service": "OrderService/GetOrder",
//!     "input": { "orderId": "123" }
//! }))?;
//!
//! let engine = InvocationEngine::new(EngineConfig::from_env());
//! let response = engine.invoke(request).await?;
//! println!("{response}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports `prost`, `prost-reflect`, and `tonic` to ensure that consumers
//! use compatible versions of these underlying dependencies.
pub mod bindings;
pub mod compiler;
pub mod config;
pub mod engine;
pub mod error;
pub mod grpc;
pub mod marshal;
pub mod registry;
pub mod request;
pub mod resolver;
pub mod workspace;

// Re-exports
pub use prost;
pub use prost_reflect;
pub use tonic;

/// Type alias for the standard boxed error used in generic bounds.
type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
