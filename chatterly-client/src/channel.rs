//! Live event channel over a WebSocket.
//!
//! One supervisor task owns the socket. It connects with the session token as
//! a bearer header, forwards decoded [`ServerEvent`]s, writes queued
//! [`ClientIntent`]s, and reconnects after a fixed delay until the channel is
//! closed.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use shared::models::{ClientIntent, ServerEvent};
use tokio::{
    net::TcpStream,
    sync::{mpsc, watch},
    task::JoinHandle,
    time::sleep,
};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{
        self, Message,
        client::IntoClientRequest,
        http::header::{AUTHORIZATION, HeaderValue},
    },
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{ClientError, ClientResult};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Whether the socket is currently up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionState {
    /// Connecting, waiting to reconnect, or closed.
    #[default]
    Disconnected,
    /// Handshake complete.
    Connected,
}

impl ConnectionState {
    /// Shorthand for `== Connected`.
    #[must_use]
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }
}

/// Everything the channel reports to its consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// A connection attempt succeeded.
    Connected,
    /// The socket went away; a reconnect follows unless the channel is closed.
    Disconnected {
        /// Close or error description.
        reason: String,
    },
    /// A decoded server frame.
    Event(ServerEvent),
}

/// Destination for outbound intents.
pub trait IntentSink: Send + Sync + std::fmt::Debug {
    /// Queue an intent for delivery.
    ///
    /// # Errors
    /// Returns [`ClientError::NotConnected`] when it cannot be delivered.
    fn emit(&self, intent: ClientIntent) -> ClientResult<()>;
}

impl IntentSink for mpsc::UnboundedSender<ClientIntent> {
    fn emit(&self, intent: ClientIntent) -> ClientResult<()> {
        self.send(intent).map_err(|_| ClientError::NotConnected)
    }
}

/// Cloneable handle for emitting intents on a [`LiveChannel`].
#[derive(Debug, Clone)]
pub struct ChannelSink {
    intents: mpsc::UnboundedSender<ClientIntent>,
    state: watch::Receiver<ConnectionState>,
}

impl IntentSink for ChannelSink {
    fn emit(&self, intent: ClientIntent) -> ClientResult<()> {
        if !self.state.borrow().is_connected() {
            debug!(intent = intent.name(), "dropping intent while disconnected");
            return Err(ClientError::NotConnected);
        }
        self.intents.emit(intent)
    }
}

/// A supervised WebSocket connection for one authenticated session.
#[derive(Debug)]
pub struct LiveChannel {
    sink: ChannelSink,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl LiveChannel {
    /// Start the supervisor. Events arrive on the returned receiver.
    #[must_use]
    pub fn open(
        url: Url,
        token: String,
        reconnect_delay: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<ChannelEvent>) {
        let (intents_tx, intents_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        let cancel = CancellationToken::new();

        let supervisor = Supervisor {
            url,
            token,
            reconnect_delay,
            intents: intents_rx,
            events: events_tx,
            state: state_tx,
            cancel: cancel.clone(),
        };
        let task = tokio::spawn(supervisor.run());

        let channel = Self {
            sink: ChannelSink {
                intents: intents_tx,
                state: state_rx,
            },
            cancel,
            task: Some(task),
        };
        (channel, events_rx)
    }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.sink.state.borrow()
    }

    /// A cloneable intent handle sharing this channel's queue.
    #[must_use]
    pub fn sink(&self) -> ChannelSink {
        self.sink.clone()
    }

    /// Stop reconnecting, close the socket and wait for the supervisor.
    pub async fn close(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take()
            && let Err(err) = task.await
        {
            warn!(error = %err, "live channel supervisor ended abnormally");
        }
    }
}

impl IntentSink for LiveChannel {
    fn emit(&self, intent: ClientIntent) -> ClientResult<()> {
        self.sink.emit(intent)
    }
}

impl Drop for LiveChannel {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct Supervisor {
    url: Url,
    token: String,
    reconnect_delay: Duration,
    intents: mpsc::UnboundedReceiver<ClientIntent>,
    events: mpsc::UnboundedSender<ChannelEvent>,
    state: watch::Sender<ConnectionState>,
    cancel: CancellationToken,
}

impl Supervisor {
    async fn run(mut self) {
        let cancel = self.cancel.clone();
        loop {
            let attempt = tokio::select! {
                () = cancel.cancelled() => break,
                attempt = connect(&self.url, &self.token) => attempt,
            };

            match attempt {
                Ok(socket) => {
                    self.state.send_replace(ConnectionState::Connected);
                    info!(url = %self.url, "live channel connected");
                    let _ = self.events.send(ChannelEvent::Connected);

                    let reason = self.pump(socket).await;

                    self.state.send_replace(ConnectionState::Disconnected);
                    let dropped = self.drain_intents();
                    info!(%reason, dropped, "live channel disconnected");
                    let _ = self.events.send(ChannelEvent::Disconnected { reason });
                }
                Err(err) => warn!(url = %self.url, error = %err, "live channel connect failed"),
            }

            tokio::select! {
                () = cancel.cancelled() => break,
                () = sleep(self.reconnect_delay) => {}
            }
        }

        self.state.send_replace(ConnectionState::Disconnected);
        debug!("live channel supervisor stopped");
    }

    /// Shuttle frames until the socket ends or the channel is closed.
    async fn pump(&mut self, socket: Socket) -> String {
        let (mut write, mut read) = socket.split();

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => {
                    let _ = write.send(Message::Close(None)).await;
                    return "closed by client".to_string();
                }
                Some(intent) = self.intents.recv() => {
                    let payload = match serde_json::to_string(&intent) {
                        Ok(payload) => payload,
                        Err(err) => {
                            warn!(intent = intent.name(), error = %err, "failed to encode intent");
                            continue;
                        }
                    };
                    if let Err(err) = write.send(Message::text(payload)).await {
                        return err.to_string();
                    }
                }
                frame = read.next() => match frame {
                    Some(Ok(Message::Text(text))) => self.forward(text.as_str()),
                    Some(Ok(Message::Close(_))) | None => return "closed by server".to_string(),
                    Some(Ok(_)) => {}
                    Some(Err(err)) => return err.to_string(),
                },
            }
        }
    }

    fn forward(&self, text: &str) {
        match serde_json::from_str::<ServerEvent>(text) {
            Ok(event) => {
                let _ = self.events.send(ChannelEvent::Event(event));
            }
            Err(err) => debug!(error = %err, "skipping unrecognised frame"),
        }
    }

    fn drain_intents(&mut self) -> usize {
        let mut dropped = 0;
        while self.intents.try_recv().is_ok() {
            dropped += 1;
        }
        dropped
    }
}

async fn connect(url: &Url, token: &str) -> ClientResult<Socket> {
    let mut request = url.as_str().into_client_request()?;
    let bearer =
        HeaderValue::from_str(&format!("Bearer {token}")).map_err(tungstenite::Error::from)?;
    request.headers_mut().insert(AUTHORIZATION, bearer);

    let (socket, response) = connect_async(request).await?;
    debug!(status = %response.status(), "live channel handshake complete");
    Ok(socket)
}
