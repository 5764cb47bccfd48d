//! Static file server, watcher and live reload wired together.

use axum::body::{to_bytes, Body};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{middleware, Extension, Router};
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinError;
use tower_http::services::ServeDir;

use crate::build::progress::ConsoleProgress;
use crate::build::{BuildContext, BuildRunner};
use crate::config::AssetConfig;
use crate::serve::reload::{inject_client, ReloadHub, ReloadMessage, CLIENT_PATH, CLIENT_SCRIPT, RELOAD_PATH};
use crate::watch::{start_watcher, timestamp, Scheduler, WatchError};

/// Error starting or running the dev server.
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("Failed to bind {addr}: {source}")]
    Bind { addr: String, source: io::Error },
    #[error("Initial build did not finish: {0}")]
    Build(#[from] JoinError),
    #[error(transparent)]
    Watch(#[from] WatchError),
    #[error("Server error: {0}")]
    Io(#[from] io::Error),
}

/// Settings for one `serve` session.
#[derive(Debug, Clone)]
pub struct ServeOptions {
    pub host: String,
    pub port: u16,
    /// Push reload signals to connected browsers
    pub live_reload: bool,
    pub debounce: Duration,
    pub clear_screen: bool,
}

impl ServeOptions {
    pub fn from_config(config: &AssetConfig) -> Self {
        Self {
            host: config.serve.host.clone(),
            port: config.serve.port,
            live_reload: config.serve.live_reload,
            debounce: Duration::from_millis(u64::from(config.watch.debounce_ms)),
            clear_screen: config.watch.clear_screen,
        }
    }
}

/// HTTP routes for the destination root.
///
/// With a reload hub, the websocket and client script are mounted and HTML
/// responses get the client script tag injected.
pub fn router(root: &Path, reload: Option<ReloadHub>) -> Router {
    let files = ServeDir::new(root).append_index_html_on_directories(true);
    match reload {
        None => Router::new().fallback_service(files),
        Some(hub) => Router::new()
            .route(RELOAD_PATH, get(reload_socket))
            .route(CLIENT_PATH, get(client_script))
            .fallback_service(files)
            .layer(middleware::map_response(inject_into_html))
            .layer(Extension(hub)),
    }
}

async fn client_script() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/javascript; charset=utf-8")], CLIENT_SCRIPT)
}

async fn inject_into_html(response: Response) -> Response {
    let is_html = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("text/html"))
        .unwrap_or(false);
    if !is_html || response.status() != StatusCode::OK {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!("could not buffer html response: {}", e);
            return Response::from_parts(parts, Body::empty());
        }
    };
    let html = String::from_utf8_lossy(&bytes);
    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(inject_client(&html)))
}

async fn reload_socket(ws: WebSocketUpgrade, Extension(hub): Extension<ReloadHub>) -> Response {
    ws.on_upgrade(move |socket| reload_session(socket, hub))
}

async fn reload_session(mut socket: WebSocket, hub: ReloadHub) {
    let mut updates = hub.subscribe();
    loop {
        tokio::select! {
            update = updates.recv() => {
                let message = match update {
                    Ok(message) => message,
                    // Missed some updates; a full reload covers them.
                    Err(RecvError::Lagged(_)) => ReloadMessage::Reload,
                    Err(RecvError::Closed) => break,
                };
                let Ok(text) = serde_json::to_string(&message) else { continue };
                if socket.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }
}

/// Build everything, then serve the destination root and watch the sources
/// until Ctrl+C.
pub async fn serve(context: BuildContext, options: ServeOptions) -> Result<(), ServeError> {
    serve_internal(context, options, None).await
}

/// Like [`serve`], notifying once the bind address is known (test helper).
pub async fn serve_with_ready_notifier(
    context: BuildContext,
    options: ServeOptions,
    ready_notifier: oneshot::Sender<SocketAddr>,
) -> Result<(), ServeError> {
    serve_internal(context, options, Some(ready_notifier)).await
}

async fn serve_internal(
    context: BuildContext,
    options: ServeOptions,
    ready_notifier: Option<oneshot::Sender<SocketAddr>>,
) -> Result<(), ServeError> {
    let context = Arc::new(context);

    let initial = {
        let context = (*context).clone();
        tokio::task::spawn_blocking(move || {
            BuildRunner::new(context).with_progress(Arc::new(ConsoleProgress::new())).build_all()
        })
        .await?
    };
    if !initial.is_success() {
        eprintln!("{}", initial.summary());
    }

    let out_dir: PathBuf = context.out_dir();
    std::fs::create_dir_all(&out_dir)?;

    let hub = options.live_reload.then(ReloadHub::new);

    let (tx, rx) = mpsc::unbounded_channel();
    let _watcher = start_watcher(Arc::clone(&context), options.debounce, tx)?;
    let scheduler = Scheduler::new(Arc::clone(&context), hub.clone()).with_clear_screen(options.clear_screen);
    tokio::spawn(scheduler.run(rx));

    let addr = format!("{}:{}", options.host, options.port);
    let listener = TcpListener::bind(&addr).await.map_err(|source| ServeError::Bind { addr, source })?;
    let local_addr = listener.local_addr()?;
    if let Some(tx) = ready_notifier {
        let _ = tx.send(local_addr);
    }

    println!("[{}] Serving {} at http://{}", timestamp(), out_dir.display(), local_addr);
    if options.live_reload {
        println!("[{}] Live reload enabled", timestamp());
    }
    println!("[{}] Watching {} for changes...", timestamp(), context.src_dir().display());

    axum::serve(listener, router(&out_dir, hub).into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn options(port: u16) -> ServeOptions {
        ServeOptions {
            host: "127.0.0.1".to_string(),
            port,
            live_reload: true,
            debounce: Duration::from_millis(50),
            clear_screen: false,
        }
    }

    fn project() -> (TempDir, BuildContext) {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("src/html")).unwrap();
        fs::write(temp.path().join("src/html/index.html"), "<html><body>hi</body></html>").unwrap();
        let ctx = BuildContext::new(AssetConfig::default(), temp.path().to_path_buf());
        (temp, ctx)
    }

    #[test]
    fn test_options_from_config() {
        let mut config = AssetConfig::default();
        config.serve.port = 8080;
        config.serve.live_reload = false;
        config.watch.debounce_ms = 250;

        let opts = ServeOptions::from_config(&config);

        assert_eq!(opts.host, "127.0.0.1");
        assert_eq!(opts.port, 8080);
        assert!(!opts.live_reload);
        assert_eq!(opts.debounce, Duration::from_millis(250));
    }

    #[tokio::test]
    async fn test_interrupted_build_is_build_error() {
        let join_error = tokio::spawn(async { panic!("build interrupted") }).await.unwrap_err();

        let err = ServeError::from(join_error);

        assert!(matches!(err, ServeError::Build(_)));
        assert!(err.to_string().starts_with("Initial build did not finish"));
    }

    #[tokio::test]
    async fn test_serve_without_sources_fails_to_watch() {
        let temp = TempDir::new().unwrap();
        let ctx = BuildContext::new(AssetConfig::default(), temp.path().to_path_buf());

        let err = serve(ctx, options(0)).await.unwrap_err();

        assert!(matches!(err, ServeError::Watch(WatchError::SourceNotFound(_))));
    }

    #[tokio::test]
    async fn test_serve_reports_bind_failure() {
        let (_temp, ctx) = project();
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = taken.local_addr().unwrap().port();

        let err = serve(ctx, options(port)).await.unwrap_err();

        assert!(matches!(err, ServeError::Bind { .. }));
    }

    #[tokio::test]
    async fn test_serve_builds_then_notifies_ready() {
        let (temp, ctx) = project();
        let (tx, rx) = oneshot::channel();

        let handle = tokio::spawn(serve_with_ready_notifier(ctx, options(0), tx));
        let addr = rx.await.unwrap();

        assert_ne!(addr.port(), 0);
        assert!(temp.path().join("dist/html/index.html").exists());
        handle.abort();
    }
}
