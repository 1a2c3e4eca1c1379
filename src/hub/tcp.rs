//! TCP hub client implementing both sink and source

use super::traits::{InboundMessage, MessageSink, MessageSource, Received, StatusInfo};
use super::{ConnectionString, ConnectionStringError, HubError};
use async_trait::async_trait;
use bytes::Bytes;
use sensorsim_shared::{codec, codec::FrameDecoder, HubRequest, HubResponse, RequestKind};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// An open, authenticated connection to the hub
struct HubLink {
    stream: TcpStream,
    decoder: FrameDecoder<HubResponse>,
    read_buf: Vec<u8>,
}

impl HubLink {
    /// Write one request and wait for its response
    async fn round_trip(&mut self, request: &HubRequest) -> Result<HubResponse, HubError> {
        let encoded = codec::encode(request)?;
        self.stream.write_all(&encoded).await?;

        loop {
            if let Some(response) = self.decoder.decode_next()? {
                if response.sequence_id != request.sequence_id {
                    return Err(HubError::SequenceMismatch {
                        expected: request.sequence_id,
                        actual: response.sequence_id,
                    });
                }
                return Ok(response);
            }

            let n = self.stream.read(&mut self.read_buf).await?;
            if n == 0 {
                return Err(HubError::Closed);
            }
            self.decoder.extend(&self.read_buf[..n]);
        }
    }
}

#[derive(Default)]
struct ClientState {
    link: Option<HubLink>,
    sequence_id: u64,
}

impl ClientState {
    fn next_sequence_id(&mut self) -> u64 {
        self.sequence_id += 1;
        self.sequence_id
    }
}

/// Device-side hub client
///
/// Connects on first use and drops the link after any I/O, codec or timeout
/// failure so the next operation reconnects. One request is in flight at a
/// time.
pub struct HubClient {
    credentials: Result<ConnectionString, ConnectionStringError>,
    connect_timeout: Duration,
    request_timeout: Duration,
    state: Mutex<ClientState>,
}

impl HubClient {
    /// Create a client; an unparsable connection string fails every operation
    pub fn new(
        connection_string: &str,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Self {
        Self {
            credentials: ConnectionString::parse(connection_string),
            connect_timeout,
            request_timeout,
            state: Mutex::new(ClientState::default()),
        }
    }

    pub fn credentials(&self) -> Result<&ConnectionString, ConnectionStringError> {
        self.credentials.as_ref().map_err(|e| e.clone())
    }

    async fn open(
        &self,
        credentials: &ConnectionString,
        sequence_id: u64,
    ) -> Result<HubLink, HubError> {
        let address = credentials.address();
        let stream = match timeout(self.connect_timeout, TcpStream::connect(&address)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => return Err(HubError::Connect { address, source }),
            Err(_) => return Err(HubError::Timeout("connect")),
        };

        let mut link = HubLink {
            stream,
            decoder: FrameDecoder::new(),
            read_buf: vec![0u8; 4096],
        };

        let mut hello = HubRequest::new(credentials.device_id(), RequestKind::Open, sequence_id);
        hello.shared_access_key = credentials.shared_access_key().to_string();

        let response = timeout(self.request_timeout, link.round_trip(&hello))
            .await
            .map_err(|_| HubError::Timeout("open"))??;
        let status = status_of(&response);
        if !status.is_success() {
            return Err(HubError::Refused(status.code, status.message));
        }

        info!("Hub link open: {} as {}", address, credentials.device_id());
        Ok(link)
    }

    /// Issue one request, connecting first if needed
    async fn request(
        &self,
        kind: RequestKind,
        payload: Bytes,
        lock_token: &str,
    ) -> Result<HubResponse, HubError> {
        let credentials = self.credentials()?;
        let mut state = self.state.lock().await;

        if state.link.is_none() {
            let sequence_id = state.next_sequence_id();
            let link = self.open(credentials, sequence_id).await?;
            state.link = Some(link);
        }

        let sequence_id = state.next_sequence_id();
        let request = HubRequest::new(credentials.device_id(), kind, sequence_id)
            .with_payload(payload.to_vec())
            .with_lock_token(lock_token);

        let result = match state.link.as_mut() {
            Some(link) => timeout(self.request_timeout, link.round_trip(&request))
                .await
                .unwrap_or(Err(HubError::Timeout("request"))),
            None => Err(HubError::Closed),
        };

        if let Err(e) = &result {
            warn!("Dropping hub link after {:?} failure: {}", kind, e);
            state.link = None;
        }

        result
    }
}

fn status_of(response: &HubResponse) -> StatusInfo {
    StatusInfo::new(response.code(), response.status_message.clone())
}

#[async_trait]
impl MessageSink for HubClient {
    async fn send(&self, message: Bytes) -> Result<StatusInfo, HubError> {
        let response = self.request(RequestKind::SendEvent, message, "").await?;
        Ok(status_of(&response))
    }
}

#[async_trait]
impl MessageSource for HubClient {
    async fn receive(&self) -> Result<Received, HubError> {
        let response = self.request(RequestKind::Receive, Bytes::new(), "").await?;
        let status = status_of(&response);

        let message = if status.is_no_content() || response.lock_token.is_empty() {
            None
        } else {
            Some(InboundMessage {
                payload: Bytes::from(response.payload),
                lock_token: response.lock_token,
            })
        };

        debug!("Receive poll: {} (message: {})", status.code, message.is_some());
        Ok(Received { status, message })
    }

    async fn complete(&self, message: &InboundMessage) -> Result<StatusInfo, HubError> {
        let response = self
            .request(RequestKind::Complete, Bytes::new(), &message.lock_token)
            .await?;
        Ok(status_of(&response))
    }
}
