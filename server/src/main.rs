mod session;

use anyhow::Context;
use bytes::Bytes;
use session::{DeviceSession, Mailbox};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let addr = std::env::var("HUB_LISTEN_ADDR").unwrap_or_else(|_| DEFAULT_LISTEN_ADDR.into());
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Hub listening on {}", addr);
    info!("  Queue device messages on stdin as: <device-id> <message>");

    let mailbox = Mailbox::new();
    tokio::spawn(feed_from_stdin(mailbox.clone()));

    loop {
        let (socket, peer) = listener.accept().await?;
        info!("Connection from: {}", peer);

        let session = DeviceSession::new(socket, peer, mailbox.clone());
        tokio::spawn(async move {
            if let Err(e) = session.run().await {
                warn!("Session {} ended with error: {}", peer, e);
            }
        });
    }
}

/// Queue each stdin line as a cloud-to-device message
async fn feed_from_stdin(mailbox: Mailbox) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) if line.trim().is_empty() => {}
            Ok(Some(line)) => match parse_enqueue_line(&line) {
                Some((device_id, body)) => {
                    let depth = mailbox.enqueue(device_id, body).await;
                    info!("[{}] queued message ({} waiting)", device_id, depth);
                }
                None => warn!("Ignoring {:?}: expected <device-id> <message>", line),
            },
            Ok(None) => {
                info!("stdin closed; no more messages will be queued");
                break;
            }
            Err(e) => {
                warn!("stdin read error: {}", e);
                break;
            }
        }
    }
}

/// Split `<device-id> <message>`; the message keeps its inner whitespace
fn parse_enqueue_line(line: &str) -> Option<(&str, Bytes)> {
    let (device_id, text) = line.trim().split_once(char::is_whitespace)?;
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Some((device_id, Bytes::copy_from_slice(text.as_bytes())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_enqueue_line() {
        let (device, body) = parse_enqueue_line("  MyDevice03   {\"fan\": \"on\"} ").unwrap();
        assert_eq!(device, "MyDevice03");
        assert_eq!(&body[..], b"{\"fan\": \"on\"}");

        assert!(parse_enqueue_line("MyDevice03").is_none());
        assert!(parse_enqueue_line("MyDevice03    ").is_none());
        assert!(parse_enqueue_line("").is_none());
    }
}
