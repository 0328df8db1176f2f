//! Development HTTP server for the source root.

use std::{net::SocketAddr, thread};

use axum::Router;
use axum::body::Body;
use axum::extract::State;
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::response::Response;
use camino::Utf8PathBuf;
use console::style;
use tower_http::services::ServeDir;
use tracing::info;

pub const PORT: u16 = 8080;

/// Serves `root` on a separate thread. With a live-reload port, every HTML
/// response gets the reload client attached.
pub fn start(
    root: Utf8PathBuf,
    reload_port: Option<u16>,
) -> thread::JoinHandle<Result<(), anyhow::Error>> {
    start_on(PORT, root, reload_port)
}

fn start_on(
    port: u16,
    root: Utf8PathBuf,
    reload_port: Option<u16>,
) -> thread::JoinHandle<Result<(), anyhow::Error>> {
    info!(url = %style(format!("http://localhost:{port}/")).yellow(), "starting a HTTP server");

    thread::spawn(move || {
        let result = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(anyhow::Error::from)
            .and_then(|runtime| runtime.block_on(serve(port, root, reload_port)));

        if let Err(e) = &result {
            tracing::error!("HTTP server stopped: {e:#}");
        }

        result
    })
}

async fn serve(port: u16, root: Utf8PathBuf, reload_port: Option<u16>) -> Result<(), anyhow::Error> {
    let address = SocketAddr::from(([127, 0, 0, 1], port));
    let address = tokio::net::TcpListener::bind(address).await?;

    let mut router = Router::new()
        // path to the source directory with compiled assets
        .fallback_service(ServeDir::new(root));

    if let Some(reload) = reload_port {
        router = router.layer(axum::middleware::map_response_with_state(reload, attach_client));
    }

    axum::serve(address, router).await?;

    Ok(())
}

async fn attach_client(State(port): State<u16>, response: Response) -> Response {
    let is_html = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("text/html"));

    if !is_html {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let html = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!("couldn't read response body: {e}");
            return Response::from_parts(parts, Body::empty());
        }
    };

    let html = inject_client(&String::from_utf8_lossy(&html), port);
    parts.headers.remove(CONTENT_LENGTH);

    Response::from_parts(parts, Body::from(html))
}

/// Inserts the live-reload client before the closing `</body>` tag, or at
/// the end of the document when there is none.
pub fn inject_client(html: &str, port: u16) -> String {
    let script = format!(
        concat!(
            "<script>",
            "(() => {{",
            "const socket = new WebSocket(`ws://${{location.hostname}}:{port}`);",
            "socket.addEventListener(\"message\", (event) => {{",
            "if (event.data === \"reload\") location.reload();",
            "}});",
            "}})();",
            "</script>"
        ),
        port = port
    );

    match html.rfind("</body>") {
        Some(index) => {
            let mut out = String::with_capacity(html.len() + script.len());
            out.push_str(&html[..index]);
            out.push_str(&script);
            out.push_str(&html[index..]);
            out
        }
        None => format!("{html}{script}"),
    }
}
