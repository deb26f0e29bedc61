use std::sync::Arc;

use colored::*;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::warn;

use crate::render::{render_markdown, render_page, render_transcript};
use crate::session::DebateSession;
use crate::DebateClient;

/// Serve the transcript viewer on localhost. When `session_id` is set the
/// session is re-fetched from the backend per request, so a page refresh
/// shows whatever the backend has now; otherwise the in-memory snapshot
/// taken at startup is served.
pub async fn serve(
    port: u16,
    client: Arc<DebateClient>,
    session: Arc<DebateSession>,
    session_id: Option<String>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let listener = TcpListener::bind(format!("127.0.0.1:{port}")).await?;

    eprintln!(
        "{}",
        format!("  Transcript viewer running at http://localhost:{port}").bright_green()
    );
    eprintln!("{}", "  Press Ctrl+C to stop.".bright_blue());

    loop {
        let (stream, _addr) = listener.accept().await?;
        let client = Arc::clone(&client);
        let session = Arc::clone(&session);
        let session_id = session_id.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, client, session, session_id).await {
                eprintln!("  connection error: {e}");
            }
        });
    }
}

async fn handle_connection(
    mut stream: tokio::net::TcpStream,
    client: Arc<DebateClient>,
    session: Arc<DebateSession>,
    session_id: Option<String>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut buf = vec![0u8; 8192];
    let n = stream.read(&mut buf).await?;
    let request = String::from_utf8_lossy(&buf[..n]);

    // Parse the request line: "GET /path HTTP/1.1"
    let first_line = request.lines().next().unwrap_or("");
    let parts: Vec<&str> = first_line.split_whitespace().collect();
    if parts.len() < 2 {
        return Ok(());
    }
    let path = parts[1].split('?').next().unwrap_or("/");

    let (status, body) = match path {
        "/" => transcript_page(&client, &session, session_id.as_deref()).await,
        "/prd" => prd_page(&client).await,
        _ => (
            "404 Not Found",
            render_page("Not found", "<p>Nothing at this path. Try / or /prd.</p>"),
        ),
    };

    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body,
    );
    stream.write_all(response.as_bytes()).await?;
    Ok(())
}

async fn transcript_page(
    client: &DebateClient,
    snapshot: &DebateSession,
    session_id: Option<&str>,
) -> (&'static str, String) {
    match session_id {
        Some(id) => match client.load_debate(id).await {
            Ok(loaded) => {
                let session = DebateSession::from_loaded(id, loaded);
                ("200 OK", render_transcript(&session))
            }
            Err(e) => {
                warn!(session_id = id, error = %e, "session reload failed");
                ("502 Bad Gateway", error_page(&e.to_string()))
            }
        },
        None => ("200 OK", render_transcript(snapshot)),
    }
}

async fn prd_page(client: &DebateClient) -> (&'static str, String) {
    match client.prd_text().await {
        Ok(prd) => {
            let body = render_markdown(&prd.text);
            ("200 OK", render_page("Product Requirements Document", &body))
        }
        Err(e) => {
            warn!(error = %e, "prd fetch failed");
            ("502 Bad Gateway", error_page(&e.to_string()))
        }
    }
}

fn error_page(message: &str) -> String {
    render_page(
        "Backend error",
        &format!("<p>{}</p>", crate::render::escape_html(message)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_page_escapes_message() {
        let page = error_page("boom <script>bad()</script>");
        assert!(page.contains("boom &lt;script&gt;"));
        assert!(!page.contains("<script>bad"));
    }

    #[tokio::test]
    async fn test_serve_binds_to_port() {
        let client = Arc::new(DebateClient::new("http://localhost:5000/api"));
        let session = Arc::new(DebateSession::default());
        let server = tokio::spawn(serve(53199, client, session, None));

        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        let connected = tokio::net::TcpStream::connect("127.0.0.1:53199").await;
        assert!(connected.is_ok(), "viewer should accept connections");
        server.abort();
    }

    #[tokio::test]
    async fn test_root_serves_snapshot_transcript() {
        let mut session = DebateSession::default();
        session.topic = "offline sync".to_string();
        let client = Arc::new(DebateClient::new("http://localhost:5000/api"));
        let session = Arc::new(session);
        let server = tokio::spawn(serve(53198, client, session, None));

        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        let mut stream = tokio::net::TcpStream::connect("127.0.0.1:53198")
            .await
            .expect("connect");
        stream
            .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .await
            .expect("write request");
        let mut response = String::new();
        stream.read_to_string(&mut response).await.expect("read response");
        assert!(response.starts_with("HTTP/1.1 200 OK"), "got: {response}");
        assert!(response.contains("offline sync"), "got: {response}");
        server.abort();
    }

    #[tokio::test]
    async fn test_unknown_path_is_404() {
        let client = Arc::new(DebateClient::new("http://localhost:5000/api"));
        let session = Arc::new(DebateSession::default());
        let server = tokio::spawn(serve(53197, client, session, None));

        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        let mut stream = tokio::net::TcpStream::connect("127.0.0.1:53197")
            .await
            .expect("connect");
        stream
            .write_all(b"GET /nope HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .await
            .expect("write request");
        let mut response = String::new();
        stream.read_to_string(&mut response).await.expect("read response");
        assert!(response.starts_with("HTTP/1.1 404"), "got: {response}");
        server.abort();
    }
}
