//! # Invocation Engine
//!
//! Drives one [`InvocationRequest`] through the whole pipeline:
//! compile -> load -> resolve -> channel -> invoke -> convert -> cleanup.
//!
//! An [`Invocation`] uses a **Typestate Pattern**: each stage is a state type, each transition
//! consumes the invocation and returns the next state or an [`InvocationError`]. Stages cannot
//! be skipped or repeated, and an invocation cannot call a method it has not resolved.
//!
//! The [`Workspace`] guard travels with the state from [`Compiled`] onwards. Whatever the
//! outcome, dropping or finishing the invocation removes the workspace.
//!
//! ## Example: Driving an invocation by hand
//!
//! ```rust,no_run
//! use protocall_core::{
//!     compiler::InterfaceCompiler, config::EngineConfig, engine::Invocation,
//!     request::InvocationRequest,
//! };
//!
//! # async fn run(request: InvocationRequest) -> Result<(), Box<dyn std::error::Error>> {
//! let config = EngineConfig::from_env();
//! let compiler = InterfaceCompiler::new(&config);
//!
//! let response = Invocation::new(request)
//!     .compile(&compiler, &config)
//!     .await?
//!     .load()?
//!     .resolve()?
//!     .open_channel()?
//!     .invoke()
//!     .await?
//!     .convert()?
//!     .finish()?;
//! # Ok(())
//! # }
//! ```
use crate::BoxError;
use crate::bindings;
use crate::compiler::{CompileError, InterfaceCompiler, root_segment};
use crate::config::EngineConfig;
use crate::error::InvocationError;
use crate::grpc::{channel, stub::DynamicStub};
use crate::marshal::{marshal, unmarshal};
use crate::registry::DescriptorRegistry;
use crate::request::InvocationRequest;
use crate::resolver::{MethodPath, ResolutionError, ResolvedMethod};
use crate::workspace::Workspace;
use http_body::Body as HttpBody;
use prost_reflect::DynamicMessage;
use std::path::Path;
use tonic::{client::GrpcService, transport::Channel};
use tracing::Instrument;
use uuid::Uuid;

/// One invocation in state `T`.
#[derive(Debug)]
pub struct Invocation<T> {
    id: Uuid,
    request: InvocationRequest,
    state: T,
}

/// State: nothing has happened yet.
#[derive(Debug)]
pub struct Idle;

/// State: bindings are generated in the workspace.
#[derive(Debug)]
pub struct Compiled {
    workspace: Workspace,
}

/// State: bindings are registered.
#[derive(Debug)]
pub struct Loaded {
    workspace: Workspace,
    registry: DescriptorRegistry,
}

/// State: the method and its stub are known.
#[derive(Debug)]
pub struct Resolved {
    workspace: Workspace,
    method: ResolvedMethod,
}

/// State: a stub is bound to a transport.
#[derive(Debug)]
pub struct Channeled<S = Channel> {
    workspace: Workspace,
    method: ResolvedMethod,
    stub: DynamicStub<S>,
}

/// State: the single response has been received.
#[derive(Debug)]
pub struct Invoked {
    workspace: Workspace,
    response: DynamicMessage,
}

/// State: the response is JSON.
#[derive(Debug)]
pub struct Converted {
    workspace: Workspace,
    output: serde_json::Value,
}

impl<T> Invocation<T> {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn request(&self) -> &InvocationRequest {
        &self.request
    }

    fn advance<N>(self, state: N) -> Invocation<N> {
        Invocation {
            id: self.id,
            request: self.request,
            state,
        }
    }
}

impl Invocation<Idle> {
    pub fn new(request: InvocationRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            request,
            state: Idle,
        }
    }

    /// Recreates the workspace and compiles the interface package and its dependents into it.
    pub async fn compile(
        self,
        compiler: &InterfaceCompiler,
        config: &EngineConfig,
    ) -> Result<Invocation<Compiled>, InvocationError> {
        let package = &self.request.interface_package;
        let root =
            root_segment(package).ok_or_else(|| CompileError::InvalidPackage(package.clone()))?;

        let workspace =
            Workspace::recreate(config.workspace_path(root, &self.id)).map_err(CompileError::from)?;

        compiler
            .compile_all(package, &self.request.dependent_packages, &workspace)
            .await?;

        tracing::debug!(workspace = %workspace.path().display(), "Compiled");
        Ok(self.advance(Compiled { workspace }))
    }
}

impl Invocation<Compiled> {
    pub fn workspace(&self) -> &Path {
        self.state.workspace.path()
    }

    pub fn load(self) -> Result<Invocation<Loaded>, InvocationError> {
        let registry = bindings::load(&self.state.workspace, &self.request.interface_package)?;
        let workspace = self.state.workspace;

        tracing::debug!(stubs = registry.stubs().count(), "Loaded");
        Ok(Invocation {
            id: self.id,
            request: self.request,
            state: Loaded {
                workspace,
                registry,
            },
        })
    }
}

impl Invocation<Loaded> {
    pub fn registry(&self) -> &DescriptorRegistry {
        &self.state.registry
    }

    pub fn resolve(self) -> Result<Invocation<Resolved>, InvocationError> {
        let path: MethodPath = self.request.method_path.parse()?;
        let method = self.state.registry.resolve(&path)?;

        tracing::debug!(
            method = method.full_name(),
            stub = method.accessor(),
            "Resolved"
        );

        let workspace = self.state.workspace;
        Ok(Invocation {
            id: self.id,
            request: self.request,
            state: Resolved { workspace, method },
        })
    }
}

impl Invocation<Resolved> {
    pub fn method(&self) -> &ResolvedMethod {
        &self.state.method
    }

    /// Opens an insecure channel to the request's target.
    pub fn open_channel(self) -> Result<Invocation<Channeled<Channel>>, InvocationError> {
        let channel = channel::open_channel(&self.request.target)?;
        Ok(self.with_transport(channel))
    }

    /// Binds the resolved stub to an existing transport.
    pub fn with_transport<S>(self, transport: S) -> Invocation<Channeled<S>>
    where
        S: GrpcService<tonic::body::Body>,
        S::Error: Into<BoxError>,
        S::ResponseBody: HttpBody<Data = tonic::codegen::Bytes> + Send + 'static,
        <S::ResponseBody as HttpBody>::Error: Into<BoxError> + Send,
    {
        let Resolved { workspace, method } = self.state;
        let stub = DynamicStub::new(method.stub().clone(), transport);

        Invocation {
            id: self.id,
            request: self.request,
            state: Channeled {
                workspace,
                method,
                stub,
            },
        }
    }
}

impl<S> Invocation<Channeled<S>>
where
    S: GrpcService<tonic::body::Body>,
    S::Error: Into<BoxError>,
    S::ResponseBody: HttpBody<Data = tonic::codegen::Bytes> + Send + 'static,
    <S::ResponseBody as HttpBody>::Error: Into<BoxError> + Send,
{
    /// Marshals the input and performs exactly one unary call.
    pub async fn invoke(self) -> Result<Invocation<Invoked>, InvocationError> {
        let Channeled {
            workspace,
            method,
            mut stub,
        } = self.state;

        let name = method.method().name();
        let descriptor = stub
            .method(name)
            .ok_or_else(|| ResolutionError::MethodNotFound {
                service: stub.service().full_name().to_string(),
                method: name.to_string(),
            })?;

        let payload = marshal(&self.request.input, &descriptor.input())?;

        tracing::debug!(
            server = %self.request.target,
            method = descriptor.full_name(),
            "Calling"
        );
        let response = stub.unary(&descriptor, payload).await?;

        Ok(Invocation {
            id: self.id,
            request: self.request,
            state: Invoked {
                workspace,
                response,
            },
        })
    }
}

impl Invocation<Invoked> {
    pub fn response(&self) -> &DynamicMessage {
        &self.state.response
    }

    pub fn convert(self) -> Result<Invocation<Converted>, InvocationError> {
        let output = unmarshal(&self.state.response)?;
        let workspace = self.state.workspace;

        Ok(Invocation {
            id: self.id,
            request: self.request,
            state: Converted { workspace, output },
        })
    }
}

impl Invocation<Converted> {
    pub fn output(&self) -> &serde_json::Value {
        &self.state.output
    }

    /// Removes the workspace and hands back the response.
    pub fn finish(self) -> Result<serde_json::Value, InvocationError> {
        let Converted { workspace, output } = self.state;
        workspace.close().map_err(InvocationError::Cleanup)?;
        Ok(output)
    }
}

/// Runs invocations with a fixed configuration.
#[derive(Debug, Clone)]
pub struct InvocationEngine {
    config: EngineConfig,
    compiler: InterfaceCompiler,
}

impl InvocationEngine {
    pub fn new(config: EngineConfig) -> Self {
        let compiler = InterfaceCompiler::new(&config);
        Self { config, compiler }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Invokes the requested method over a plaintext channel to the request's target.
    pub async fn invoke(
        &self,
        request: InvocationRequest,
    ) -> Result<serde_json::Value, InvocationError> {
        let invocation = Invocation::new(request);
        let span = invocation_span(&invocation);

        async move {
            tracing::info!(server = %invocation.request().target, "Invocation started");
            let channeled = self.prepare(invocation).await?.open_channel()?;
            complete(channeled).await
        }
        .instrument(span)
        .await
    }

    /// Same as [`Self::invoke`], but the call goes through `transport` instead of a new channel.
    pub async fn invoke_with_transport<S>(
        &self,
        request: InvocationRequest,
        transport: S,
    ) -> Result<serde_json::Value, InvocationError>
    where
        S: GrpcService<tonic::body::Body>,
        S::Error: Into<BoxError>,
        S::ResponseBody: HttpBody<Data = tonic::codegen::Bytes> + Send + 'static,
        <S::ResponseBody as HttpBody>::Error: Into<BoxError> + Send,
    {
        let invocation = Invocation::new(request);
        let span = invocation_span(&invocation);

        async move {
            tracing::info!("Invocation started");
            let channeled = self.prepare(invocation).await?.with_transport(transport);
            complete(channeled).await
        }
        .instrument(span)
        .await
    }

    /// Compiles and loads `package` with its dependents, then removes the workspace.
    ///
    /// The returned registry stays usable after the workspace is gone.
    pub async fn inspect(
        &self,
        package: &str,
        dependents: &[String],
    ) -> Result<DescriptorRegistry, InvocationError> {
        let root =
            root_segment(package).ok_or_else(|| CompileError::InvalidPackage(package.into()))?;

        let workspace = Workspace::recreate(self.config.workspace_path(root, &Uuid::new_v4()))
            .map_err(CompileError::from)?;

        self.compiler
            .compile_all(package, dependents, &workspace)
            .await?;
        let registry = bindings::load(&workspace, package)?;

        workspace.close().map_err(InvocationError::Cleanup)?;
        Ok(registry)
    }

    async fn prepare(
        &self,
        invocation: Invocation<Idle>,
    ) -> Result<Invocation<Resolved>, InvocationError> {
        invocation
            .compile(&self.compiler, &self.config)
            .await?
            .load()?
            .resolve()
    }
}

async fn complete<S>(
    invocation: Invocation<Channeled<S>>,
) -> Result<serde_json::Value, InvocationError>
where
    S: GrpcService<tonic::body::Body>,
    S::Error: Into<BoxError>,
    S::ResponseBody: HttpBody<Data = tonic::codegen::Bytes> + Send + 'static,
    <S::ResponseBody as HttpBody>::Error: Into<BoxError> + Send,
{
    let output = invocation.invoke().await?.convert()?.finish()?;
    tracing::info!("Invocation finished");
    Ok(output)
}

fn invocation_span<T>(invocation: &Invocation<T>) -> tracing::Span {
    tracing::info_span!(
        "invocation",
        invocation_id = %invocation.id(),
        package = %invocation.request().interface_package,
        method = %invocation.request().method_path,
    )
}
