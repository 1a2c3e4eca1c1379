//! Individual device session handling

use super::mailbox::{Mailbox, SessionId};
use anyhow::Result;
use sensorsim_shared::codec::{self, FrameDecoder};
use sensorsim_shared::{status, HubRequest, HubResponse, RequestKind};
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

/// One device connection
pub struct DeviceSession {
    stream: TcpStream,
    addr: SocketAddr,
    id: SessionId,
    decoder: FrameDecoder<HubRequest>,
    read_buf: Vec<u8>,
    /// Set by a successful `Open`
    device_id: Option<String>,
    mailbox: Mailbox,
}

impl DeviceSession {
    /// Create a new session from an accepted TCP stream
    pub fn new(stream: TcpStream, addr: SocketAddr, mailbox: Mailbox) -> Self {
        let id = mailbox.register_session();
        Self {
            stream,
            addr,
            id,
            decoder: FrameDecoder::new(),
            read_buf: vec![0u8; 4096],
            device_id: None,
            mailbox,
        }
    }

    /// Serve requests until the device disconnects or is refused
    ///
    /// Messages the device received but never completed are requeued.
    pub async fn run(mut self) -> Result<()> {
        let result = self.serve().await;

        let requeued = self.mailbox.abandon_session(self.id).await;
        if requeued > 0 {
            info!(
                "[{}] requeued {} uncompleted messages",
                self.device_id.as_deref().unwrap_or("-"),
                requeued
            );
        }
        info!("Client disconnected: {}", self.addr);

        result
    }

    async fn serve(&mut self) -> Result<()> {
        while let Some(request) = self.recv().await? {
            let response = self.handle(&request).await;
            let refused = response.code() == status::UNAUTHORIZED;

            let encoded = codec::encode(&response)?;
            self.stream.write_all(&encoded).await?;

            if refused {
                warn!("Refused {} from {}", request.device_id, self.addr);
                break;
            }
        }
        Ok(())
    }

    /// Read the next request; `None` once the connection is closed
    async fn recv(&mut self) -> Result<Option<HubRequest>> {
        loop {
            if let Some(request) = self.decoder.decode_next()? {
                return Ok(Some(request));
            }

            let n = self.stream.read(&mut self.read_buf).await?;
            if n == 0 {
                return Ok(None);
            }
            self.decoder.extend(&self.read_buf[..n]);
        }
    }

    async fn handle(&mut self, request: &HubRequest) -> HubResponse {
        let seq = request.sequence_id;
        let kind = request.request_kind();

        if kind == RequestKind::Open {
            return self.open(request).await;
        }

        let Some(device_id) = self.device_id.as_deref() else {
            return HubResponse::status(seq, status::UNAUTHORIZED);
        };

        match kind {
            RequestKind::SendEvent => {
                info!(
                    "[{}] seq={} telemetry: {}",
                    device_id,
                    seq,
                    String::from_utf8_lossy(&request.payload)
                );
                HubResponse::status(seq, status::NO_CONTENT)
            }
            RequestKind::Receive => match self.mailbox.lock_next(device_id, self.id).await {
                Some((token, payload)) => {
                    debug!(
                        "[{}] delivering {} bytes under {}",
                        device_id,
                        payload.len(),
                        token
                    );
                    HubResponse::delivery(seq, payload.to_vec(), token)
                }
                None => HubResponse::status(seq, status::NO_CONTENT),
            },
            RequestKind::Complete => {
                if self.mailbox.complete(device_id, &request.lock_token).await {
                    info!("[{}] completed {}", device_id, request.lock_token);
                    HubResponse::status(seq, status::NO_CONTENT)
                } else {
                    warn!("[{}] unknown lock token {:?}", device_id, request.lock_token);
                    HubResponse::status(seq, status::PRECONDITION_FAILED)
                }
            }
            RequestKind::Open | RequestKind::Unknown => {
                warn!(
                    "[{}] seq={} unsupported request kind {}",
                    device_id, seq, request.kind
                );
                HubResponse::status(seq, status::BAD_REQUEST)
            }
        }
    }

    async fn open(&mut self, request: &HubRequest) -> HubResponse {
        if request.device_id.is_empty() || request.shared_access_key.is_empty() {
            return HubResponse::status(request.sequence_id, status::UNAUTHORIZED);
        }

        // A connection stays bound to the device it first opened as
        if let Some(bound) = self.device_id.as_deref() {
            if bound != request.device_id {
                warn!(
                    "[{}] refusing to reopen {} as {}",
                    bound, self.addr, request.device_id
                );
                return HubResponse::status(request.sequence_id, status::BAD_REQUEST);
            }
        }

        let pending = self.mailbox.pending(&request.device_id).await;
        info!(
            "[{}] link opened from {} ({} messages pending)",
            request.device_id, self.addr, pending
        );
        self.device_id = Some(request.device_id.clone());

        HubResponse::status(request.sequence_id, status::OK)
    }
}
