//! Guardian Server - the proxy process.
//!
//! Hosts the interception middleware behind a loopback listener. Requests
//! that carry the destination marker on an AI-completion path are analyzed
//! and blocked or forwarded; everything else falls through to the inner
//! handler (by default a 404), so the listener can be shared with other
//! traffic.
//!
//! ## Endpoints
//!
//! - `GET /_guardian/health` - liveness probe, `{"status":"ok","version":...}`
//! - `POST <completion path>` with `x-guardian-original-destination` -
//!   intercepted (blocked with 403 or reverse-proxied)
//! - anything else - passed through to the inner handler
//!
//! ## Example
//!
//! ```no_run
//! use guardian_server::{Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let server = Server::new(ServerConfig::default()).unwrap();
//!     server.run().await.unwrap();
//! }
//! ```

mod handlers;

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::routing::get;
use axum::Router;
use socket2::{Domain, Protocol, Socket, Type};
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::info;

use guardian_core::{load_rules, Analyzer, AnalyzerConfig, Policy};
use guardian_proxy::{intercept, InterceptState, DEFAULT_PROXY_PORT};

pub use handlers::VERSION;

/// Default server host (localhost only: interception is a loopback
/// protocol between the client hook and this process).
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to (default: 127.0.0.1).
    pub host: String,
    /// Port to bind to (default: 8080).
    pub port: u16,
    /// Optional rules document; `None` uses the built-in rule set.
    pub rules_path: Option<PathBuf>,
    /// Composite score at or above which requests are blocked.
    pub auto_block_threshold: f64,
    /// Whether content analysis runs at all.
    pub analysis_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PROXY_PORT,
            rules_path: None,
            auto_block_threshold: guardian_core::DEFAULT_AUTO_BLOCK_THRESHOLD,
            analysis_enabled: true,
        }
    }
}

impl ServerConfig {
    /// Sets the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the rules document path.
    pub fn with_rules_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.rules_path = Some(path.into());
        self
    }

    /// Sets the auto-block threshold.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.auto_block_threshold = threshold;
        self
    }

    /// Disables content analysis (requests are still forwarded).
    pub fn without_analysis(mut self) -> Self {
        self.analysis_enabled = false;
        self
    }

    /// Builds the middleware state this configuration describes.
    pub fn build_intercept_state(&self) -> InterceptState {
        let rules = load_rules(self.rules_path.as_deref());
        let analyzer = Analyzer::new(
            AnalyzerConfig {
                enabled: self.analysis_enabled,
            },
            rules,
        );
        let policy = Policy::with_threshold(self.auto_block_threshold);
        InterceptState::new(analyzer, policy)
    }
}

/// Server error types.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind to address.
    #[error("failed to bind to {0}: {1}")]
    Bind(SocketAddr, std::io::Error),

    /// Invalid listen address.
    #[error("invalid address: {0}")]
    Address(String),

    /// Server runtime error.
    #[error("server error: {0}")]
    Runtime(String),
}

/// The proxy process.
pub struct Server {
    router: Router,
    addr: SocketAddr,
}

impl Server {
    /// Creates a server from configuration, with a 404 pass-through target.
    pub fn new(config: ServerConfig) -> Result<Self, ServerError> {
        let state = config.build_intercept_state();
        Self::with_state(config, state)
    }

    /// Creates a server around explicit middleware state (custom sink,
    /// gate, or forwarder).
    pub fn with_state(config: ServerConfig, state: InterceptState) -> Result<Self, ServerError> {
        Self::with_inner(config, state, Router::new())
    }

    /// Creates a server whose pass-through traffic lands on `inner`.
    ///
    /// `inner` is the "next handler in the hosting process": any request
    /// that is not a marked completion call reaches it unmodified.
    pub fn with_inner(
        config: ServerConfig,
        state: InterceptState,
        inner: Router,
    ) -> Result<Self, ServerError> {
        let router = inner
            .route("/_guardian/health", get(handlers::health))
            .layer(axum::middleware::from_fn_with_state(state, intercept));

        let addr = format!("{}:{}", config.host, config.port)
            .parse()
            .map_err(|e| ServerError::Address(format!("{}:{}: {e}", config.host, config.port)))?;

        Ok(Self { router, addr })
    }

    /// Returns the configured listen address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Returns the router for testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Runs the server until the process is terminated.
    pub async fn run(self) -> Result<(), ServerError> {
        let listener = self.bind()?;
        let addr = listener
            .local_addr()
            .map_err(|e| ServerError::Runtime(e.to_string()))?;
        info!("Guardian proxy listening on {addr}");

        axum::serve(
            listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .map_err(|e| ServerError::Runtime(e.to_string()))
    }

    /// Starts the server in the background and returns a lifecycle handle.
    pub fn spawn(self) -> Result<ServerHandle, ServerError> {
        let listener = self.bind()?;
        let addr = listener
            .local_addr()
            .map_err(|e| ServerError::Runtime(e.to_string()))?;
        info!("Guardian proxy listening on {addr}");

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let router = self.router;
        let task = tokio::spawn(async move {
            axum::serve(
                listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
            .map_err(|e| ServerError::Runtime(e.to_string()))
        });

        Ok(ServerHandle {
            addr,
            shutdown_tx,
            task,
        })
    }

    /// Binds the listener with address reuse, which helps restarts while
    /// sockets linger in TIME_WAIT.
    fn bind(&self) -> Result<tokio::net::TcpListener, ServerError> {
        let domain = if self.addr.is_ipv6() {
            Domain::IPV6
        } else {
            Domain::IPV4
        };
        let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))
            .map_err(|e| ServerError::Bind(self.addr, e))?;
        socket
            .set_reuse_address(true)
            .map_err(|e| ServerError::Bind(self.addr, e))?;
        socket
            .bind(&self.addr.into())
            .map_err(|e| ServerError::Bind(self.addr, e))?;
        socket
            .listen(128)
            .map_err(|e| ServerError::Bind(self.addr, e))?;
        socket
            .set_nonblocking(true)
            .map_err(|e| ServerError::Bind(self.addr, e))?;

        let std_listener: std::net::TcpListener = socket.into();
        tokio::net::TcpListener::from_std(std_listener).map_err(|e| ServerError::Bind(self.addr, e))
    }
}

/// Handle over a running server.
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown_tx: oneshot::Sender<()>,
    task: JoinHandle<Result<(), ServerError>>,
}

impl ServerHandle {
    /// The address the server is actually listening on (useful with
    /// port 0).
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Signals graceful shutdown and waits for the server to finish.
    pub async fn shutdown(self) -> Result<(), ServerError> {
        let _ = self.shutdown_tx.send(());
        self.task
            .await
            .map_err(|e| ServerError::Runtime(e.to_string()))?
    }
}
