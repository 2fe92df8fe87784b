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

//! Liveness monitoring for market data streams.
//!
//! A [`HeartbeatMonitor`] runs up to two timers while active: an optional prober sending a
//! ping message at a fixed interval, and a checker which force-closes the connection when
//! nothing has been received for longer than the configured timeout.

use std::{
    fmt::Debug,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};

use serde_json::{Value, json};
use tokio::{
    task::JoinHandle,
    time::{Instant, interval_at},
};

use crate::mode::{ConnectionStatus, StatusCell};

/// Default silence timeout before a connection is considered dead.
pub const DEFAULT_HEARTBEAT_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound on the liveness check period.
pub const MAX_CHECK_INTERVAL: Duration = Duration::from_secs(5);

/// The connection operations a [`HeartbeatMonitor`] needs.
pub trait HeartbeatTransport: Send + Sync + 'static {
    /// Returns true if frames can currently be sent.
    fn is_open(&self) -> bool;

    /// Sends a text frame, logging rather than returning failures.
    fn send_text(&self, text: String);

    /// Closes the connection without waiting for the peer.
    fn force_close(&self);
}

/// A ping payload, either fixed or generated for every probe.
#[derive(Clone)]
pub enum PingMessage {
    Static(String),
    Dynamic(Arc<dyn Fn() -> String + Send + Sync>),
}

impl Debug for PingMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Static(text) => f.debug_tuple("Static").field(text).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(<fn>)"),
        }
    }
}

impl PingMessage {
    /// Returns the text to send for the next probe.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Static(text) => text.clone(),
            Self::Dynamic(generate) => generate(),
        }
    }
}

impl From<&str> for PingMessage {
    fn from(value: &str) -> Self {
        Self::Static(value.to_string())
    }
}

/// Configuration for a [`HeartbeatMonitor`].
#[derive(Clone, Debug)]
pub struct HeartbeatConfig {
    /// Period of the prober, `None` disables probing.
    pub ping_interval: Option<Duration>,
    /// Payload sent by the prober.
    pub ping_message: Option<PingMessage>,
    /// Answer server pings found in inbound JSON payloads.
    pub auto_pong: bool,
    /// Silence allowed before the connection is force-closed.
    pub timeout: Duration,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            ping_interval: None,
            ping_message: None,
            auto_pong: false,
            timeout: DEFAULT_HEARTBEAT_TIMEOUT,
        }
    }
}

impl HeartbeatConfig {
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_ping(mut self, interval: Duration, message: PingMessage) -> Self {
        self.ping_interval = Some(interval);
        self.ping_message = Some(message);
        self
    }

    #[must_use]
    pub fn with_auto_pong(mut self, auto_pong: bool) -> Self {
        self.auto_pong = auto_pong;
        self
    }

    /// Returns the liveness check period: `min(5s, timeout / 2)`.
    #[must_use]
    pub fn check_interval(&self) -> Duration {
        MAX_CHECK_INTERVAL
            .min(self.timeout / 2)
            .max(Duration::from_millis(1))
    }
}

struct HeartbeatInner {
    config: HeartbeatConfig,
    status: StatusCell,
    active: AtomicBool,
    generation: AtomicU64,
    last_message: Mutex<Instant>,
    transport: Mutex<Option<Arc<dyn HeartbeatTransport>>>,
    pinger: Mutex<Option<JoinHandle<()>>>,
    checker: Mutex<Option<JoinHandle<()>>>,
}

impl HeartbeatInner {
    fn touch(&self) {
        if let Ok(mut last) = self.last_message.lock() {
            *last = Instant::now();
        }
    }

    fn silence(&self) -> Duration {
        self.last_message
            .lock()
            .map(|last| last.elapsed())
            .unwrap_or_default()
    }

    fn abort_slot(slot: &Mutex<Option<JoinHandle<()>>>) {
        if let Ok(mut guard) = slot.lock()
            && let Some(handle) = guard.take()
        {
            handle.abort();
        }
    }

    fn store_slot(slot: &Mutex<Option<JoinHandle<()>>>, handle: JoinHandle<()>) {
        match slot.lock() {
            Ok(mut guard) => *guard = Some(handle),
            Err(_) => handle.abort(),
        }
    }

    fn transport(&self) -> Option<Arc<dyn HeartbeatTransport>> {
        self.transport.lock().ok().and_then(|guard| guard.clone())
    }
}

/// Watches a connection for silence and keeps it alive with pings.
///
/// Clones share the same state, so a clone can be moved into a message handler while the
/// owner keeps control of [`Self::start`] and [`Self::stop`].
#[derive(Clone)]
pub struct HeartbeatMonitor {
    inner: Arc<HeartbeatInner>,
}

impl Debug for HeartbeatMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(stringify!(HeartbeatMonitor))
            .field("config", &self.inner.config)
            .field("active", &self.is_active())
            .finish()
    }
}

impl HeartbeatMonitor {
    /// Creates an idle monitor publishing timeouts to `status`.
    #[must_use]
    pub fn new(config: HeartbeatConfig, status: StatusCell) -> Self {
        Self {
            inner: Arc::new(HeartbeatInner {
                config,
                status,
                active: AtomicBool::new(false),
                generation: AtomicU64::new(0),
                last_message: Mutex::new(Instant::now()),
                transport: Mutex::new(None),
                pinger: Mutex::new(None),
                checker: Mutex::new(None),
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &HeartbeatConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.inner.active.load(Ordering::SeqCst)
    }

    /// Starts monitoring `transport`, stopping any previous run first.
    ///
    /// `on_timeout` is invoked at most once, after the connection has been force-closed
    /// and the status set to [`ConnectionStatus::Reconnecting`].
    pub fn start<F>(&self, transport: Arc<dyn HeartbeatTransport>, on_timeout: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.stop();

        let inner = &self.inner;
        let generation = inner.generation.fetch_add(1, Ordering::SeqCst) + 1;

        if let Ok(mut slot) = inner.transport.lock() {
            *slot = Some(transport.clone());
        }
        inner.touch();
        inner.active.store(true, Ordering::SeqCst);

        if let (Some(period), Some(message)) = (
            inner.config.ping_interval,
            inner.config.ping_message.clone(),
        ) {
            let pinger = Self::spawn_pinger(
                inner.clone(),
                transport.clone(),
                generation,
                period,
                message,
            );
            HeartbeatInner::store_slot(&inner.pinger, pinger);
        }

        let checker = Self::spawn_checker(inner.clone(), transport, generation, on_timeout);
        HeartbeatInner::store_slot(&inner.checker, checker);

        tracing::debug!(
            timeout_ms = inner.config.timeout.as_millis() as u64,
            check_ms = inner.config.check_interval().as_millis() as u64,
            "Heartbeat started"
        );
    }

    /// Stops both timers. Idempotent.
    pub fn stop(&self) {
        let inner = &self.inner;
        let was_active = inner.active.swap(false, Ordering::SeqCst);
        inner.generation.fetch_add(1, Ordering::SeqCst);

        HeartbeatInner::abort_slot(&inner.pinger);
        HeartbeatInner::abort_slot(&inner.checker);

        if let Ok(mut slot) = inner.transport.lock() {
            *slot = None;
        }

        if was_active {
            tracing::debug!("Heartbeat stopped");
        }
    }

    /// Records an inbound message and parses it as JSON.
    ///
    /// Every call resets the silence clock. Returns `None` when the payload is not JSON.
    /// With auto-pong enabled, server pings are answered before the payload is returned.
    pub fn handle_message(&self, text: &str) -> Option<Value> {
        self.inner.touch();

        let value: Value = match serde_json::from_str(text) {
            Ok(value) => value,
            Err(e) => {
                tracing::trace!("Dropping non-JSON payload: {e}");
                return None;
            }
        };

        if self.inner.config.auto_pong
            && let Some(reply) = pong_for(&value)
            && let Some(transport) = self.inner.transport()
            && transport.is_open()
        {
            transport.send_text(reply.to_string());
        }

        Some(value)
    }

    fn spawn_pinger(
        inner: Arc<HeartbeatInner>,
        transport: Arc<dyn HeartbeatTransport>,
        generation: u64,
        period: Duration,
        message: PingMessage,
    ) -> JoinHandle<()> {
        tokio::task::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            loop {
                interval.tick().await;

                if !inner.active.load(Ordering::SeqCst)
                    || inner.generation.load(Ordering::SeqCst) != generation
                {
                    break;
                }

                if transport.is_open() {
                    let text = message.render();
                    tracing::trace!("Sending ping: {text}");
                    transport.send_text(text);
                }
            }
        })
    }

    fn spawn_checker<F>(
        inner: Arc<HeartbeatInner>,
        transport: Arc<dyn HeartbeatTransport>,
        generation: u64,
        on_timeout: F,
    ) -> JoinHandle<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let timeout = inner.config.timeout;
        let check = inner.config.check_interval();

        tokio::task::spawn(async move {
            let mut interval = interval_at(Instant::now() + check, check);
            loop {
                interval.tick().await;

                if inner.generation.load(Ordering::SeqCst) != generation {
                    break;
                }

                let silence = inner.silence();
                if silence <= timeout {
                    continue;
                }

                if !inner.active.swap(false, Ordering::SeqCst) {
                    break;
                }

                tracing::warn!(
                    silence_ms = silence.as_millis() as u64,
                    timeout_ms = timeout.as_millis() as u64,
                    "Heartbeat timeout, closing connection"
                );

                HeartbeatInner::abort_slot(&inner.pinger);
                inner.status.set(ConnectionStatus::Reconnecting);
                transport.force_close();
                on_timeout();
                break;
            }
        })
    }
}

impl Drop for HeartbeatInner {
    fn drop(&mut self) {
        Self::abort_slot(&self.pinger);
        Self::abort_slot(&self.checker);
    }
}

/// Builds the reply for a server ping, if `value` is one.
fn pong_for(value: &Value) -> Option<Value> {
    if let Some(ping) = value.get("ping")
        && is_truthy(ping)
    {
        return Some(json!({ "pong": ping }));
    }

    if value.get("op").and_then(Value::as_str) == Some("ping") {
        return Some(json!({ "op": "pong", "ts": chrono::Utc::now().timestamp_millis() }));
    }

    None
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use rstest::rstest;

    use super::*;

    #[derive(Default)]
    struct MockTransport {
        closed: AtomicBool,
        sent: Mutex<Vec<String>>,
    }

    impl MockTransport {
        fn sent(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl HeartbeatTransport for MockTransport {
        fn is_open(&self) -> bool {
            !self.closed.load(Ordering::SeqCst)
        }

        fn send_text(&self, text: String) {
            self.sent.lock().unwrap().push(text);
        }

        fn force_close(&self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    fn monitor(config: HeartbeatConfig) -> (HeartbeatMonitor, StatusCell) {
        let status = StatusCell::new(ConnectionStatus::Connected);
        (HeartbeatMonitor::new(config, status.clone()), status)
    }

    fn counter() -> (Arc<AtomicUsize>, impl FnOnce() + Send + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        (count, move || {
            count_clone.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[rstest]
    #[case(Duration::from_secs(30), Duration::from_secs(5))]
    #[case(Duration::from_secs(60), Duration::from_secs(5))]
    #[case(Duration::from_millis(1000), Duration::from_millis(500))]
    fn test_check_interval(#[case] timeout: Duration, #[case] expected: Duration) {
        let config = HeartbeatConfig::default().with_timeout(timeout);
        assert_eq!(config.check_interval(), expected);
    }

    #[rstest]
    fn test_ping_message_render() {
        let fixed = PingMessage::from("{\"op\":\"ping\"}");
        let dynamic = PingMessage::Dynamic(Arc::new(|| "generated".to_string()));

        assert_eq!(fixed.render(), "{\"op\":\"ping\"}");
        assert_eq!(dynamic.render(), "generated");
        assert_eq!(format!("{dynamic:?}"), "Dynamic(<fn>)");
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn test_timeout_fires_once_within_window() {
        let config = HeartbeatConfig::default().with_timeout(Duration::from_millis(1000));
        let (monitor, status) = monitor(config);
        let transport = Arc::new(MockTransport::default());
        let (fired, on_timeout) = counter();

        monitor.start(transport.clone(), on_timeout);

        tokio::time::sleep(Duration::from_millis(1400)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(monitor.is_active());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!monitor.is_active());
        assert!(!transport.is_open());
        assert_eq!(status.get(), ConnectionStatus::Reconnecting);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn test_messages_keep_connection_alive() {
        let config = HeartbeatConfig::default().with_timeout(Duration::from_millis(1000));
        let (monitor, status) = monitor(config);
        let transport = Arc::new(MockTransport::default());
        let (fired, on_timeout) = counter();

        monitor.start(transport.clone(), on_timeout);

        for _ in 0..10 {
            tokio::time::sleep(Duration::from_millis(700)).await;
            assert!(monitor.handle_message("{\"price\":\"1\"}").is_some());
        }

        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(transport.is_open());
        assert_eq!(status.get(), ConnectionStatus::Connected);
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn test_stop_is_idempotent_and_cancels_timers() {
        let config = HeartbeatConfig::default()
            .with_timeout(Duration::from_millis(1000))
            .with_ping(Duration::from_millis(300), PingMessage::from("ping"));
        let (monitor, _) = monitor(config);
        let transport = Arc::new(MockTransport::default());
        let (fired, on_timeout) = counter();

        monitor.start(transport.clone(), on_timeout);
        monitor.stop();
        monitor.stop();

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(transport.sent().is_empty());
        assert!(!monitor.is_active());
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn test_pinger_sends_static_message() {
        let config = HeartbeatConfig::default()
            .with_timeout(Duration::from_secs(60))
            .with_ping(Duration::from_secs(20), PingMessage::from("{\"op\":\"ping\"}"));
        let (monitor, _) = monitor(config);
        let transport = Arc::new(MockTransport::default());
        let (_, on_timeout) = counter();

        monitor.start(transport.clone(), on_timeout);
        tokio::time::sleep(Duration::from_secs(41)).await;
        monitor.stop();

        assert_eq!(transport.sent(), vec!["{\"op\":\"ping\"}"; 2]);
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn test_restart_replaces_previous_run() {
        let config = HeartbeatConfig::default().with_timeout(Duration::from_millis(1000));
        let (monitor, _) = monitor(config);
        let transport = Arc::new(MockTransport::default());
        let (first, on_first) = counter();
        let (second, on_second) = counter();

        monitor.start(transport.clone(), on_first);
        tokio::time::sleep(Duration::from_millis(800)).await;
        monitor.start(transport.clone(), on_second);

        tokio::time::sleep(Duration::from_millis(2000)).await;
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn test_auto_pong_replies_to_ping_field() {
        let config = HeartbeatConfig::default().with_auto_pong(true);
        let (monitor, _) = monitor(config);
        let transport = Arc::new(MockTransport::default());
        let (_, on_timeout) = counter();
        monitor.start(transport.clone(), on_timeout);

        let value = monitor.handle_message("{\"ping\":1700000000000}").unwrap();
        monitor.stop();

        assert_eq!(value["ping"], 1_700_000_000_000_i64);
        assert_eq!(transport.sent(), vec!["{\"pong\":1700000000000}".to_string()]);
    }

    #[rstest]
    #[tokio::test]
    async fn test_auto_pong_replies_to_op_ping() {
        let config = HeartbeatConfig::default().with_auto_pong(true);
        let (monitor, _) = monitor(config);
        let transport = Arc::new(MockTransport::default());
        let (_, on_timeout) = counter();
        monitor.start(transport.clone(), on_timeout);

        monitor.handle_message("{\"op\":\"ping\"}");
        monitor.stop();

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        let reply: Value = serde_json::from_str(&sent[0]).unwrap();
        assert_eq!(reply["op"], "pong");
        assert!(reply["ts"].as_i64().unwrap() > 0);
    }

    #[rstest]
    #[tokio::test]
    async fn test_no_pong_without_auto_pong() {
        let (monitor, _) = monitor(HeartbeatConfig::default());
        let transport = Arc::new(MockTransport::default());
        let (_, on_timeout) = counter();
        monitor.start(transport.clone(), on_timeout);

        monitor.handle_message("{\"ping\":1}");
        monitor.stop();

        assert!(transport.sent().is_empty());
    }

    #[rstest]
    fn test_invalid_json_is_dropped() {
        let (monitor, _) = monitor(HeartbeatConfig::default());
        assert!(monitor.handle_message("not json").is_none());
    }

    #[rstest]
    #[case(json!({"ping": 0}), None)]
    #[case(json!({"ping": ""}), None)]
    #[case(json!({"ping": null}), None)]
    #[case(json!({"ping": 42}), Some(json!({"pong": 42})))]
    #[case(json!({"ping": "abc"}), Some(json!({"pong": "abc"})))]
    #[case(json!({"op": "subscribe"}), None)]
    fn test_pong_for(#[case] input: Value, #[case] expected: Option<Value>) {
        assert_eq!(pong_for(&input), expected);
    }
}
