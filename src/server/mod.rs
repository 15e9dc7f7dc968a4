//! Development server with live reload
//!
//! Serves the output directory under the configured path prefix, so links
//! produced by the `url` filter resolve the same way they will when deployed.

use anyhow::Result;
use axum::{
    body::Body,
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    http::{header, Request, StatusCode, Uri},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use notify_debouncer_mini::{
    new_debouncer,
    notify::{RecursiveMode, Watcher},
};
use percent_encoding::percent_decode_str;
use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tower_http::services::ServeDir;

use crate::commands::build;
use crate::Site;

const LIVE_RELOAD_PATH: &str = "/__livereload";

/// Live reload script injected into HTML pages
const LIVE_RELOAD_SCRIPT: &str = r#"
<script>
(function() {
    var ws = new WebSocket('ws://' + location.host + '/__livereload');
    ws.onmessage = function(msg) {
        if (msg.data === 'reload') {
            location.reload();
        }
    };
    ws.onclose = function() {
        setTimeout(function() { location.reload(); }, 1000);
    };
})();
</script>
</body>
"#;

struct ServerState {
    output_dir: PathBuf,
    path_prefix: String,
    reload_tx: broadcast::Sender<()>,
    live_reload: bool,
}

/// Start the development server
pub async fn start(site: &Site, ip: &str, port: u16, watch: bool, open: bool) -> Result<()> {
    let (reload_tx, _) = broadcast::channel::<()>(16);

    let state = Arc::new(ServerState {
        output_dir: site.output_dir.clone(),
        path_prefix: site.settings().path_prefix.clone(),
        reload_tx: reload_tx.clone(),
        live_reload: watch,
    });

    let app = Router::new()
        .route(LIVE_RELOAD_PATH, get(livereload_handler))
        .fallback(fallback_handler)
        .with_state(state);

    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    let url = format!("http://{}:{}{}", ip, port, site.settings().path_prefix);
    println!("Server running at {}", url);
    if watch {
        println!("Live reload enabled. Watching for changes...");
    }
    println!("Press Ctrl+C to stop.");

    if open {
        if let Err(e) = open_browser(&url) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    if watch {
        let site = site.clone();
        tokio::task::spawn_blocking(move || {
            if let Err(e) = watch_and_reload(site, reload_tx) {
                tracing::error!("File watcher error: {}", e);
            }
        });
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Rebuild on debounced changes and tell connected pages to reload
fn watch_and_reload(site: Site, reload_tx: broadcast::Sender<()>) -> Result<()> {
    let (tx, rx) = std::sync::mpsc::channel();
    let mut debouncer = new_debouncer(Duration::from_millis(500), tx)?;

    for target in build::watch_targets(&site) {
        if target.exists() {
            let mode = if target.is_dir() {
                RecursiveMode::Recursive
            } else {
                RecursiveMode::NonRecursive
            };
            debouncer.watcher().watch(&target, mode)?;
            tracing::debug!("Watching: {:?}", target);
        }
    }

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let changed: Vec<_> = events
                    .iter()
                    .filter(|e| build::is_relevant_change(&site, &e.path))
                    .collect();
                if changed.is_empty() {
                    continue;
                }

                for event in &changed {
                    tracing::info!("File changed: {}", event.path.display());
                }

                match site.reload().and_then(|fresh| build::run(&fresh)) {
                    Ok(_) => {
                        let _ = reload_tx.send(());
                    }
                    Err(e) => tracing::error!("Build failed: {:#}", e),
                }
            }
            Ok(Err(e)) => tracing::error!("Watch error: {:?}", e),
            Err(e) => {
                tracing::error!("Channel error: {:?}", e);
                break;
            }
        }
    }

    Ok(())
}

async fn livereload_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServerState>>,
) -> impl IntoResponse {
    let reload_rx = state.reload_tx.subscribe();
    ws.on_upgrade(move |socket| handle_livereload_socket(socket, reload_rx))
}

async fn handle_livereload_socket(mut socket: WebSocket, mut reload_rx: broadcast::Receiver<()>) {
    tracing::debug!("Live reload client connected");

    loop {
        tokio::select! {
            result = reload_rx.recv() => {
                match result {
                    Ok(_) => {
                        if socket.send(Message::Text("reload".to_string())).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
        }
    }

    tracing::debug!("Live reload client disconnected");
}

/// Where a request path points, relative to the output directory.
///
/// `None` means the path is outside the prefix and should be redirected.
pub fn strip_prefix<'a>(path_prefix: &str, request_path: &'a str) -> Option<&'a str> {
    let prefix = path_prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return Some(request_path);
    }
    match request_path.strip_prefix(prefix) {
        Some("") => Some("/"),
        Some(rest) if rest.starts_with('/') => Some(rest),
        _ => None,
    }
}

/// Map a prefix-free URL path to a file, refusing `..` segments
fn resolve_file(output_dir: &Path, path: &str) -> Option<PathBuf> {
    let decoded = percent_decode_str(path).decode_utf8().ok()?;
    let relative = Path::new(decoded.trim_start_matches('/'));
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return None;
    }

    let candidate = output_dir.join(relative);
    if candidate.is_dir() {
        Some(candidate.join("index.html"))
    } else if candidate.exists() {
        Some(candidate)
    } else {
        let with_html = candidate.with_extension("html");
        with_html.exists().then_some(with_html)
    }
}

async fn fallback_handler(State(state): State<Arc<ServerState>>, request: Request<Body>) -> Response {
    let path = request.uri().path().to_string();

    let Some(inner) = strip_prefix(&state.path_prefix, &path) else {
        let target = format!(
            "{}{}",
            state.path_prefix.trim_end_matches('/'),
            if path.starts_with('/') { path.clone() } else { format!("/{}", path) }
        );
        return Redirect::temporary(&target).into_response();
    };
    let inner = inner.to_string();

    let file_path = resolve_file(&state.output_dir, &inner);
    let is_html = file_path
        .as_ref()
        .and_then(|p| p.extension())
        .map(|ext| ext == "html" || ext == "htm")
        .unwrap_or(false);

    if is_html && state.live_reload {
        if let Some(file_path) = file_path {
            return match tokio::fs::read_to_string(&file_path).await {
                Ok(content) => Html(inject_live_reload(&content)).into_response(),
                Err(_) => (StatusCode::NOT_FOUND, "Not found").into_response(),
            };
        }
    }

    // Hand the prefix-free path to ServeDir
    let (mut parts, body) = request.into_parts();
    let query = parts.uri.query().map(|q| format!("?{}", q)).unwrap_or_default();
    parts.uri = match format!("{}{}", inner, query).parse::<Uri>() {
        Ok(uri) => uri,
        Err(_) => return (StatusCode::BAD_REQUEST, "Bad request").into_response(),
    };
    let request = Request::from_parts(parts, body);

    let mut service = ServeDir::new(&state.output_dir).append_index_html_on_directories(true);
    match service.try_call(request).await {
        Ok(response) => {
            let mut response = response.into_response();
            response
                .headers_mut()
                .insert(header::CACHE_CONTROL, header::HeaderValue::from_static("no-cache"));
            response
        }
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response(),
    }
}

fn inject_live_reload(html: &str) -> String {
    if html.contains("</body>") {
        html.replacen("</body>", LIVE_RELOAD_SCRIPT, 1)
    } else {
        format!("{}{}", html, LIVE_RELOAD_SCRIPT)
    }
}

fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(url).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/c", "start", url])
            .spawn()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_strip_prefix() {
        let prefix = "/movement_science_club/";
        assert_eq!(strip_prefix(prefix, "/movement_science_club/"), Some("/"));
        assert_eq!(strip_prefix(prefix, "/movement_science_club"), Some("/"));
        assert_eq!(
            strip_prefix(prefix, "/movement_science_club/posts/a/"),
            Some("/posts/a/")
        );
        assert_eq!(strip_prefix(prefix, "/posts/a/"), None);
        assert_eq!(strip_prefix(prefix, "/movement_science_clubhouse/"), None);
        assert_eq!(strip_prefix("/", "/posts/a/"), Some("/posts/a/"));
    }

    #[test]
    fn test_resolve_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("posts/a")).unwrap();
        fs::write(dir.path().join("posts/a/index.html"), "a").unwrap();
        fs::write(dir.path().join("about.html"), "about").unwrap();

        assert_eq!(
            resolve_file(dir.path(), "/posts/a/"),
            Some(dir.path().join("posts/a/index.html"))
        );
        assert_eq!(
            resolve_file(dir.path(), "/about"),
            Some(dir.path().join("about.html"))
        );
        assert_eq!(resolve_file(dir.path(), "/missing"), None);
        assert_eq!(resolve_file(dir.path(), "/../etc/passwd"), None);
        assert_eq!(resolve_file(dir.path(), "/%2e%2e/secret"), None);
    }

    #[test]
    fn test_inject_live_reload() {
        let html = inject_live_reload("<body><p>hi</p></body>");
        assert!(html.contains("__livereload"));
        assert_eq!(html.matches("</body>").count(), 1);
    }
}
