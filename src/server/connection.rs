// Connection handling module
// Accepts a single TCP connection and serves HTTP/1.1 on it

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::config::AppState;
use crate::handler;
use crate::logger;

/// Accept and process a connection, checking limits and logging.
///
/// # Arguments
///
/// * `stream` - The TCP stream to handle
/// * `peer_addr` - The peer's socket address
/// * `state` - Shared application state
/// * `conn_counter` - Active connection counter
pub fn accept_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<AppState>,
    conn_counter: &Arc<AtomicUsize>,
) {
    // Increment counter first, then check limit (prevents race condition)
    let prev_count = conn_counter.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = state.config.performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            // Exceeded limit: rollback counter and reject
            conn_counter.fetch_sub(1, Ordering::SeqCst);
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. Connection rejected."
            ));
            drop(stream);
            return;
        }
    }

    // Check if access logging is enabled (lock-free)
    if state.cached_access_log.load(Ordering::Relaxed) {
        logger::log_connection_accepted(&peer_addr);
    }

    handle_connection(
        stream,
        peer_addr,
        Arc::clone(state),
        Arc::clone(conn_counter),
    );
}

/// Serve a single connection in a spawned task.
///
/// Wraps the TCP stream in `TokioIo`, serves HTTP/1.1 with keep-alive per
/// config, bounds the whole connection by the configured timeout, and
/// decrements the connection counter when done.
fn handle_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
    conn_counter: Arc<AtomicUsize>,
) {
    tokio::spawn(async move {
        let io = TokioIo::new(stream);

        let keep_alive = state.config.performance.keep_alive_timeout > 0;
        let timeout_duration = std::time::Duration::from_secs(std::cmp::max(
            state.config.performance.read_timeout,
            state.config.performance.write_timeout,
        ));

        let mut builder = http1::Builder::new();
        builder.keep_alive(keep_alive);

        let service_state = Arc::clone(&state);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| {
                handler::handle_request(req, Arc::clone(&service_state), peer_addr)
            }),
        );

        match tokio::time::timeout(timeout_duration, conn).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => logger::log_connection_error(&err),
            Err(_) => {
                logger::log_warning(&format!(
                    "Connection timeout after {} seconds",
                    timeout_duration.as_secs()
                ));
            }
        }

        conn_counter.fetch_sub(1, Ordering::SeqCst);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, Config, LoggingConfig, PerformanceConfig, ServerConfig};
    use crate::handler::greeting::GREETING_PAGE;
    use http_body_util::{BodyExt, Empty};
    use hyper::body::Bytes;
    use hyper::{Method, Request, StatusCode};

    fn test_config() -> Config {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                workers: None,
            },
            app: AppConfig {
                path: "/hello".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                access_log: false,
                access_log_format: "combined".to_string(),
                access_log_file: None,
                error_log_file: None,
            },
            performance: PerformanceConfig {
                keep_alive_timeout: 5,
                read_timeout: 5,
                write_timeout: 5,
                max_connections: None,
            },
        }
    }

    /// Bind an ephemeral port and run the accept loop in the background
    async fn spawn_test_server() -> SocketAddr {
        let state = Arc::new(AppState::new(&test_config()));
        let conn_counter = Arc::new(AtomicUsize::new(0));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            loop {
                let Ok((stream, peer_addr)) = listener.accept().await else {
                    break;
                };
                accept_connection(stream, peer_addr, &state, &conn_counter);
            }
        });

        addr
    }

    /// Send one request over a fresh connection, return status and headers
    /// of interest plus the collected body
    async fn send(
        addr: SocketAddr,
        method: Method,
        target: &str,
    ) -> (StatusCode, Option<String>, Bytes) {
        let stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        let io = TokioIo::new(stream);
        let (mut sender, conn) = hyper::client::conn::http1::handshake(io).await.unwrap();
        tokio::spawn(conn);

        let req = Request::builder()
            .method(method)
            .uri(target)
            .header(hyper::header::HOST, "localhost")
            .body(Empty::<Bytes>::new())
            .unwrap();

        let resp = sender.send_request(req).await.unwrap();
        let status = resp.status();
        let content_type = resp
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        (status, content_type, body)
    }

    #[tokio::test]
    async fn test_get_returns_greeting() {
        let addr = spawn_test_server().await;
        let (status, content_type, body) = send(addr, Method::GET, "/hello").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("text/html"));
        assert_eq!(body, Bytes::from_static(GREETING_PAGE.as_bytes()));
    }

    #[tokio::test]
    async fn test_query_string_is_ignored() {
        let addr = spawn_test_server().await;
        let (status, content_type, body) = send(addr, Method::GET, "/hello?x=1&y=2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("text/html"));
        assert_eq!(body, Bytes::from_static(GREETING_PAGE.as_bytes()));
    }

    #[tokio::test]
    async fn test_repeated_requests_are_identical() {
        let addr = spawn_test_server().await;
        for _ in 0..3 {
            let (status, _, body) = send(addr, Method::GET, "/hello").await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, Bytes::from_static(GREETING_PAGE.as_bytes()));
        }
    }

    #[tokio::test]
    async fn test_post_is_not_the_greeting() {
        let addr = spawn_test_server().await;
        let (status, _, body) = send(addr, Method::POST, "/hello").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_ne!(body, Bytes::from_static(GREETING_PAGE.as_bytes()));
    }

    #[tokio::test]
    async fn test_unmapped_path_is_404() {
        let addr = spawn_test_server().await;
        let (status, _, _) = send(addr, Method::GET, "/nowhere").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_head_has_headers_and_no_body() {
        let addr = spawn_test_server().await;
        let (status, content_type, body) = send(addr, Method::HEAD, "/hello").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("text/html"));
        assert!(body.is_empty());
    }
}
