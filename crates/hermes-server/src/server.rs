//! HTTP server.
//!
//! Accepts HTTP/1.1 connections with Hyper on Tokio, buffers each request
//! body and hands the request to the [`Dispatcher`].
//!
//! # Example
//!
//! ```rust,ignore
//! use hermes_server::{Dispatcher, Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::builder().http_addr("0.0.0.0:8080").build();
//!     let server = Server::new(config, dispatcher);
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::{Request, Response, StatusCode};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};

use hermes_core::InboundRequest;

use crate::config::ServerConfig;
use crate::dispatcher::Dispatcher;
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// Type alias for HTTP response body.
pub type ResponseBody = Full<Bytes>;

/// Type alias for the HTTP response.
pub type HttpResponse = Response<ResponseBody>;

/// Errors that stop the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The configured address is not a socket address.
    #[error("invalid address '{addr}': {source}")]
    InvalidAddress {
        /// The configured address.
        addr: String,
        /// The parse error.
        #[source]
        source: std::net::AddrParseError,
    },

    /// The listener could not be bound.
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        /// The address that was tried.
        addr: SocketAddr,
        /// The I/O error.
        #[source]
        source: std::io::Error,
    },

    /// I/O error on the listener.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The Hermes HTTP server.
pub struct Server {
    config: ServerConfig,
    dispatcher: Dispatcher,
}

impl Server {
    /// Creates a server for a dispatcher.
    #[must_use]
    pub fn new(config: ServerConfig, dispatcher: Dispatcher) -> Self {
        Self { config, dispatcher }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Runs until SIGTERM or SIGINT.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid or cannot be bound.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_with_shutdown(ShutdownSignal::with_os_signals()).await
    }

    /// Runs until `shutdown` is triggered.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid or cannot be bound.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let listener = self.bind().await?;
        self.serve(listener, shutdown).await
    }

    /// Binds the configured address.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid or cannot be bound.
    pub async fn bind(&self) -> Result<TcpListener, ServerError> {
        let addr = self
            .config
            .socket_addr()
            .map_err(|source| ServerError::InvalidAddress {
                addr: self.config.http_addr().to_string(),
                source,
            })?;
        TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })
    }

    /// Accepts connections on `listener` until `shutdown` is triggered, then
    /// waits up to the shutdown timeout for open connections.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener has no local address.
    pub async fn serve(self, listener: TcpListener, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let local_addr = listener.local_addr()?;
        tracing::info!(addr = %local_addr, prefix = %self.dispatcher.prefix(), "server listening");

        let server = Arc::new(self);
        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, remote_addr)) => {
                        let server = Arc::clone(&server);
                        let guard = tracker.acquire();
                        let shutdown = shutdown.clone();
                        tokio::spawn(async move {
                            if let Err(e) = server.handle_connection(stream, shutdown).await {
                                tracing::debug!(%remote_addr, error = %e, "connection error");
                            }
                            drop(guard);
                        });
                    }
                    Err(e) => tracing::error!(error = %e, "failed to accept connection"),
                },
                () = shutdown.recv() => {
                    tracing::info!("shutdown signal received, stopping server");
                    break;
                }
            }
        }

        let timeout = server.config.shutdown_timeout();
        tracing::info!(
            ?timeout,
            connections = tracker.active_connections(),
            "waiting for connections to close"
        );
        tokio::select! {
            () = tracker.drained() => tracing::info!("all connections closed"),
            () = tokio::time::sleep(timeout) => tracing::warn!(
                connections = tracker.active_connections(),
                "shutdown timeout reached"
            ),
        }

        tracing::info!("server stopped");
        Ok(())
    }

    async fn handle_connection(
        self: &Arc<Self>,
        stream: TcpStream,
        shutdown: ShutdownSignal,
    ) -> Result<(), hyper::Error> {
        let io = TokioIo::new(stream);
        let server = Arc::clone(self);
        let service = service_fn(move |req: Request<Incoming>| {
            let server = Arc::clone(&server);
            async move { Ok::<_, Infallible>(server.handle_request(req).await) }
        });

        let conn = http1::Builder::new().serve_connection(io, service);
        tokio::pin!(conn);

        tokio::select! {
            result = conn.as_mut() => result,
            () = shutdown.recv() => {
                conn.as_mut().graceful_shutdown();
                conn.await
            }
        }
    }

    async fn handle_request(&self, req: Request<Incoming>) -> HttpResponse {
        let (parts, body) = req.into_parts();

        let body = match read_body(body, &self.config).await {
            Ok(body) => body,
            Err(status) => return status_response(status),
        };

        let request = InboundRequest::new(parts.method, parts.uri, parts.headers, body);
        self.dispatcher.dispatch(request).await.map(Full::new)
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("config", &self.config)
            .field("dispatcher", &self.dispatcher)
            .finish()
    }
}

/// Buffers a request body within the configured time and size limits.
async fn read_body<B>(body: B, config: &ServerConfig) -> Result<Bytes, StatusCode>
where
    B: hyper::body::Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let limited = Limited::new(body, config.max_body_bytes());
    match tokio::time::timeout(config.request_timeout(), limited.collect()).await {
        Ok(Ok(collected)) => Ok(collected.to_bytes()),
        Ok(Err(e)) if e.downcast_ref::<LengthLimitError>().is_some() => {
            tracing::warn!(limit = config.max_body_bytes(), "request body too large");
            Err(StatusCode::PAYLOAD_TOO_LARGE)
        }
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "failed to read request body");
            Err(StatusCode::BAD_REQUEST)
        }
        Err(_) => {
            tracing::warn!("request body read timed out");
            Err(StatusCode::REQUEST_TIMEOUT)
        }
    }
}

fn status_response(status: StatusCode) -> HttpResponse {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = status;
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use hermes_convert::ConverterRegistry;
    use hermes_core::{Args, BoxError};
    use hermes_router::{Constructors, Param, Resource, ResourceDef, RouteTable};
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[derive(Default)]
    struct Echo;

    impl Resource for Echo {
        fn describe(def: &mut ResourceDef<Self>) {
            def.method("echo", |_: &Self, mut args: Args| {
                Ok::<_, BoxError>(args.take::<String>(0)?.unwrap_or_default())
            })
            .post()
            .param(Param::of::<String>("text"));
        }
    }

    fn dispatcher() -> Dispatcher {
        let factory = Constructors::new().with_default::<Echo>();
        let mut table = RouteTable::new(Arc::new(ConverterRegistry::new()), Arc::new(factory));
        table.add_handler_type::<Echo>().unwrap();
        Dispatcher::new(Arc::new(table))
    }

    fn server(config: ServerConfig) -> Server {
        Server::new(config, dispatcher())
    }

    async fn exchange(addr: SocketAddr, raw: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(raw.as_bytes()).await.unwrap();
        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.unwrap();
        String::from_utf8_lossy(&response).into_owned()
    }

    async fn start(config: ServerConfig) -> (SocketAddr, ShutdownSignal, tokio::task::JoinHandle<Result<(), ServerError>>) {
        let server = server(config);
        let listener = server.bind().await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = ShutdownSignal::new();
        let handle = tokio::spawn(server.serve(listener, shutdown.clone()));
        (addr, shutdown, handle)
    }

    #[tokio::test]
    async fn test_run_invalid_address() {
        let config = ServerConfig::builder().http_addr("not-a-valid-address").build();
        let result = server(config).run_with_shutdown(ShutdownSignal::new()).await;
        assert!(matches!(result, Err(ServerError::InvalidAddress { .. })));
    }

    #[tokio::test]
    async fn test_run_and_shutdown() {
        let config = ServerConfig::builder()
            .http_addr("127.0.0.1:0")
            .shutdown_timeout(Duration::from_millis(100))
            .build();
        let shutdown = ShutdownSignal::new();
        shutdown.trigger();

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            server(config).run_with_shutdown(shutdown),
        )
        .await;
        assert!(result.expect("server should stop").is_ok());
    }

    #[tokio::test]
    async fn test_serves_over_tcp() {
        let config = ServerConfig::builder().http_addr("127.0.0.1:0").build();
        let (addr, shutdown, handle) = start(config).await;

        let response = exchange(
            addr,
            "POST /echo HTTP/1.1\r\nhost: localhost\r\ncontent-length: 5\r\nconnection: close\r\n\r\nhello",
        )
        .await;
        assert!(response.starts_with("HTTP/1.1 200 OK"), "{response}");
        assert!(response.contains("content-type: text/plain"), "{response}");
        assert!(response.ends_with("hello"), "{response}");

        shutdown.trigger();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_body_too_large() {
        let config = ServerConfig::builder()
            .http_addr("127.0.0.1:0")
            .max_body_bytes(4)
            .build();
        let (addr, shutdown, handle) = start(config).await;

        let response = exchange(
            addr,
            "POST /echo HTTP/1.1\r\nhost: localhost\r\ncontent-length: 10\r\nconnection: close\r\n\r\n0123456789",
        )
        .await;
        assert!(response.starts_with("HTTP/1.1 413"), "{response}");

        shutdown.trigger();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_body_timeout() {
        let config = ServerConfig::builder()
            .http_addr("127.0.0.1:0")
            .request_timeout(Duration::from_millis(50))
            .build();
        let (addr, shutdown, handle) = start(config).await;

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"POST /echo HTTP/1.1\r\nhost: localhost\r\ncontent-length: 10\r\n\r\n01")
            .await
            .unwrap();
        let mut response = vec![0_u8; 64];
        let read = tokio::time::timeout(Duration::from_secs(5), stream.read(&mut response))
            .await
            .unwrap()
            .unwrap();
        assert!(String::from_utf8_lossy(&response[..read]).starts_with("HTTP/1.1 408"));

        shutdown.trigger();
        handle.await.unwrap().unwrap();
    }
}
