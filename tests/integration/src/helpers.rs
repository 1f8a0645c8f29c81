//! Test helpers for integration tests
//!
//! Provides a gateway server on an ephemeral port, a WebSocket client that
//! speaks the gateway protocol, and viewer sessions over the same board.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use confession_cache::LocalBroadcastChannel;
use confession_client::{LocalStorage, MemoryStorage, SessionOptions, SessionPorts, ViewerSession};
use confession_db::MemoryPostStore;
use confession_gateway::protocol::{GatewayMessage, JoinPayload, OpCode};
use confession_gateway::{GatewaySettings, GatewayState};
use futures_util::{SinkExt, StreamExt};
use reqwest::{Client, Response};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

/// How long a client waits for the next frame
pub const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// In-process store and broadcast channel shared by the gateway and sessions
#[derive(Clone, Default)]
pub struct Board {
    pub store: Arc<MemoryPostStore>,
    pub broadcast: Arc<LocalBroadcastChannel>,
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ports(&self, storage: Arc<dyn LocalStorage>) -> SessionPorts {
        SessionPorts {
            store: self.store.clone(),
            changes: self.store.clone(),
            broadcast: self.broadcast.clone(),
            storage,
        }
    }

    /// Start a viewer with fresh local storage and default options
    pub async fn viewer(&self) -> Result<ViewerSession> {
        self.viewer_with(Arc::new(MemoryStorage::new()), SessionOptions::default())
            .await
    }

    pub async fn viewer_with(
        &self,
        storage: Arc<dyn LocalStorage>,
        options: SessionOptions,
    ) -> Result<ViewerSession> {
        Ok(ViewerSession::start(self.ports(storage), options).await?)
    }

    /// Gateway state over this board
    pub fn gateway_state(&self) -> GatewayState {
        GatewayState::new(self.store.clone(), self.store.clone(), self.broadcast.clone())
    }
}

/// Test server instance that manages lifecycle
pub struct TestServer {
    pub addr: SocketAddr,
    pub board: Board,
    pub state: GatewayState,
    pub client: Client,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Result<Self> {
        Self::start_with_settings(GatewaySettings::default()).await
    }

    pub async fn start_with_settings(settings: GatewaySettings) -> Result<Self> {
        let board = Board::new();
        let state = board.gateway_state().with_settings(settings);

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let server_state = state.clone();
        let handle = tokio::spawn(async move {
            confession_gateway::serve(listener, server_state).await.ok();
        });

        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            addr,
            board,
            state,
            client,
            handle,
        })
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/gateway", self.addr)
    }

    /// Open a WebSocket and consume the Hello frame
    pub async fn connect(&self) -> Result<WsClient> {
        let mut client = WsClient::connect(&self.ws_url()).await?;
        client.hello().await?;
        Ok(client)
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.get(&url).send().await?)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Minimal gateway client
pub struct WsClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    last_sequence: Option<u64>,
}

impl WsClient {
    pub async fn connect(url: &str) -> Result<Self> {
        let (stream, _) = connect_async(url).await?;
        Ok(Self {
            stream,
            last_sequence: None,
        })
    }

    pub fn last_sequence(&self) -> Option<u64> {
        self.last_sequence
    }

    pub async fn send(&mut self, message: &GatewayMessage) -> Result<()> {
        self.stream.send(Message::Text(message.to_json()?)).await?;
        Ok(())
    }

    pub async fn send_raw(&mut self, text: &str) -> Result<()> {
        self.stream.send(Message::Text(text.to_string())).await?;
        Ok(())
    }

    /// Next protocol frame; fails on close or timeout
    pub async fn recv(&mut self) -> Result<GatewayMessage> {
        loop {
            let frame = tokio::time::timeout(RECV_TIMEOUT, self.stream.next())
                .await
                .context("timed out waiting for a frame")?;

            match frame {
                Some(Ok(Message::Text(text))) => {
                    let message = GatewayMessage::from_json(&text)?;
                    if message.s.is_some() {
                        self.last_sequence = message.s;
                    }
                    return Ok(message);
                }
                Some(Ok(Message::Close(frame))) => bail!("connection closed: {frame:?}"),
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(e.into()),
                None => bail!("connection ended"),
            }
        }
    }

    /// Skip frames until a dispatch of `event` arrives
    pub async fn recv_dispatch(&mut self, event: &str) -> Result<GatewayMessage> {
        loop {
            let message = self.recv().await?;
            if message.op == OpCode::Dispatch && message.t.as_deref() == Some(event) {
                return Ok(message);
            }
        }
    }

    /// Read the Hello frame and return its heartbeat interval
    pub async fn hello(&mut self) -> Result<u64> {
        let message = self.recv().await?;
        if message.op != OpCode::Hello {
            bail!("expected Hello, got {message}");
        }
        message
            .d
            .as_ref()
            .and_then(|d| d["heartbeat_interval"].as_u64())
            .context("Hello without heartbeat_interval")
    }

    /// Join and return the READY payload
    pub async fn join(&mut self, self_delivery: Option<bool>) -> Result<Value> {
        self.send(&GatewayMessage::join(JoinPayload { self_delivery }))
            .await?;
        let ready = self.recv_dispatch("READY").await?;
        ready.d.context("READY without data")
    }

    pub async fn heartbeat(&mut self) -> Result<()> {
        let message = GatewayMessage::heartbeat(self.last_sequence);
        self.send(&message).await
    }

    /// Wait for the server to close; returns the close code if one was sent
    pub async fn expect_close(&mut self) -> Result<Option<u16>> {
        loop {
            let frame = tokio::time::timeout(RECV_TIMEOUT, self.stream.next())
                .await
                .context("timed out waiting for close")?;

            match frame {
                Some(Ok(Message::Close(frame))) => return Ok(frame.map(|f| u16::from(f.code))),
                Some(Ok(_)) => continue,
                Some(Err(_)) | None => return Ok(None),
            }
        }
    }

    /// Assert nothing but control frames arrive within `window`
    pub async fn expect_silence(&mut self, window: Duration) -> Result<()> {
        match tokio::time::timeout(window, self.recv()).await {
            Err(_) => Ok(()),
            Ok(Ok(message)) => bail!("unexpected frame: {message}"),
            Ok(Err(e)) => Err(e),
        }
    }
}
