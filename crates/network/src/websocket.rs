// -------------------------------------------------------------------------------------------------
//  Copyright (C) 2015-2025 Nautech Systems Pty Ltd. All rights reserved.
//  https://nautechsystems.io
//
//  Licensed under the GNU Lesser General Public License Version 3.0 (the "License");
//  You may not use this file except in compliance with the License.
//  You may obtain a copy of the License at https://www.gnu.org/licenses/lgpl-3.0.en.html
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.
// -------------------------------------------------------------------------------------------------

//! A single-shot WebSocket connection with split read/write tasks.
//!
//! **Design**:
//! - Single reader, multiple writer model.
//! - Read half runs in a dedicated task forwarding text and binary frames to a handler.
//! - Write half runs in a dedicated task fed through a channel.
//! - No automatic reconnection: when the stream ends the disconnect handler is notified
//!   once and the owner decides whether to open a new connection.
//! - After [`WebSocketConnection::close`] the message handler is never invoked again.

pub mod config;
pub mod types;

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use futures_util::{SinkExt, StreamExt};
use http::HeaderName;
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{Error, Message, client::IntoClientRequest, http::HeaderValue},
};

use self::{
    config::WebSocketConfig,
    types::{
        DisconnectHandler, DisconnectReason, MessageHandler, MessageReader, MessageWriter,
        WriterCommand,
    },
};
use crate::{
    error::NetworkError, heartbeat::HeartbeatTransport, tls::install_cryptographic_provider,
};

/// `WebSocketConnection` connects to a websocket server to read and send messages.
///
/// The connection is split into read and write halves. The read half is moved into a
/// tokio task which keeps receiving messages from the server and calls the handler. The
/// write half is owned by a second task receiving [`WriterCommand`]s through a channel,
/// so the connection can be written to from any scope through a shared reference.
pub struct WebSocketConnection {
    url: String,
    writer_tx: mpsc::UnboundedSender<WriterCommand>,
    read_task: JoinHandle<()>,
    write_task: JoinHandle<()>,
    open: Arc<AtomicBool>,
    closed: Arc<AtomicBool>,
}

impl std::fmt::Debug for WebSocketConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(stringify!(WebSocketConnection))
            .field("url", &self.url)
            .field("open", &self.open.load(Ordering::SeqCst))
            .field("closed", &self.closed.load(Ordering::SeqCst))
            .finish()
    }
}

impl WebSocketConnection {
    /// Opens a connection and spawns its read and write tasks.
    ///
    /// # Errors
    ///
    /// Returns an error if the handshake fails or does not complete within the configured timeout.
    pub async fn connect(
        config: WebSocketConfig,
        handler: MessageHandler,
        on_disconnect: Option<DisconnectHandler>,
    ) -> Result<Self, NetworkError> {
        tracing::debug!(url = %config.url, "Connecting");
        install_cryptographic_provider();

        let timeout = Duration::from_millis(config.connect_timeout_ms);
        let (writer, reader) = tokio::time::timeout(
            timeout,
            Self::connect_with_server(&config.url, config.headers.clone()),
        )
        .await
        .map_err(|_| NetworkError::Timeout(config.connect_timeout_ms))??;

        let open = Arc::new(AtomicBool::new(true));
        let closed = Arc::new(AtomicBool::new(false));
        let (writer_tx, writer_rx) = mpsc::unbounded_channel();

        let read_task =
            Self::spawn_read_task(reader, handler, on_disconnect, open.clone(), closed.clone());
        let write_task = Self::spawn_write_task(writer, writer_rx, open.clone());

        tracing::debug!(url = %config.url, "Connected");

        Ok(Self {
            url: config.url,
            writer_tx,
            read_task,
            write_task,
            open,
            closed,
        })
    }

    /// Connects with the server creating a tokio-tungstenite websocket stream.
    async fn connect_with_server(
        url: &str,
        headers: Vec<(String, String)>,
    ) -> Result<(MessageWriter, MessageReader), Error> {
        let mut request = url.into_client_request()?;
        let req_headers = request.headers_mut();

        for (key, val) in headers {
            let header_value = HeaderValue::from_str(&val)?;
            let header_name: HeaderName = key.parse()?;
            req_headers.insert(header_name, header_value);
        }

        connect_async(request).await.map(|resp| resp.0.split())
    }

    fn spawn_read_task(
        mut reader: MessageReader,
        handler: MessageHandler,
        on_disconnect: Option<DisconnectHandler>,
        open: Arc<AtomicBool>,
        closed: Arc<AtomicBool>,
    ) -> JoinHandle<()> {
        tracing::debug!("Started task 'read'");

        tokio::task::spawn(async move {
            let reason = loop {
                match reader.next().await {
                    Some(Ok(msg @ (Message::Text(_) | Message::Binary(_)))) => {
                        if closed.load(Ordering::SeqCst) {
                            break None;
                        }
                        handler(msg);
                    }
                    Some(Ok(Message::Close(frame))) => {
                        tracing::debug!("Received close message - terminating: {frame:?}");
                        break Some(DisconnectReason::ServerClosed);
                    }
                    Some(Ok(_)) => (),
                    Some(Err(e)) => {
                        tracing::error!("Received error message - terminating: {e}");
                        break Some(DisconnectReason::Error(e.to_string()));
                    }
                    // Internally tungstenite considers the connection closed when polling
                    // for the next message in the stream returns None.
                    None => {
                        tracing::debug!("No message received - terminating");
                        break Some(DisconnectReason::ServerClosed);
                    }
                }
            };

            open.store(false, Ordering::SeqCst);

            if let Some(reason) = reason
                && !closed.load(Ordering::SeqCst)
                && let Some(on_disconnect) = on_disconnect
            {
                on_disconnect(reason);
            }

            tracing::debug!("Completed task 'read'");
        })
    }

    fn spawn_write_task(
        mut writer: MessageWriter,
        mut writer_rx: mpsc::UnboundedReceiver<WriterCommand>,
        open: Arc<AtomicBool>,
    ) -> JoinHandle<()> {
        tracing::debug!("Started task 'write'");

        tokio::task::spawn(async move {
            while let Some(command) = writer_rx.recv().await {
                match command {
                    WriterCommand::Send(msg) => {
                        if let Err(e) = writer.send(msg).await {
                            tracing::error!("Failed to send message: {e}");
                            break;
                        }
                    }
                    WriterCommand::Close => break,
                }
            }

            open.store(false, Ordering::SeqCst);

            // Attempt to close the writer gracefully before exiting,
            // we ignore any error as the writer may already be closed.
            _ = writer.close().await;

            tracing::debug!("Completed task 'write'");
        })
    }

    /// Returns the URL this connection was opened against.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns true while the stream is open and has not been closed locally.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst) && !self.closed.load(Ordering::SeqCst)
    }

    /// Returns true once [`Self::close`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Queues a text frame for sending.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection is not open or the writer task has stopped.
    pub fn send_text(&self, text: String) -> Result<(), NetworkError> {
        if !self.is_open() {
            return Err(NetworkError::NotConnected);
        }

        tracing::trace!("Sending: {text}");
        self.writer_tx
            .send(WriterCommand::Send(Message::Text(text.into())))
            .map_err(|e| NetworkError::Send(e.to_string()))
    }

    /// Closes the connection. Idempotent.
    ///
    /// Once this returns the message handler is not invoked again and the disconnect
    /// handler is never notified.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        tracing::debug!(url = %self.url, "Closing");
        self.open.store(false, Ordering::SeqCst);
        self.read_task.abort();

        if self.writer_tx.send(WriterCommand::Close).is_err() {
            self.write_task.abort();
        }
    }
}

impl HeartbeatTransport for WebSocketConnection {
    fn is_open(&self) -> bool {
        Self::is_open(self)
    }

    fn send_text(&self, text: String) {
        if let Err(e) = Self::send_text(self, text) {
            tracing::warn!("Failed to send heartbeat message: {e}");
        }
    }

    fn force_close(&self) {
        self.close();
    }
}

impl Drop for WebSocketConnection {
    fn drop(&mut self) {
        self.closed.store(true, Ordering::SeqCst);

        if !self.read_task.is_finished() {
            self.read_task.abort();
            tracing::debug!("Aborted task 'read'");
        }

        if !self.write_task.is_finished() {
            self.write_task.abort();
            tracing::debug!("Aborted task 'write'");
        }
    }
}
