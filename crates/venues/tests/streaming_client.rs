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

//! Integration tests for the streaming market data clients using a mock venue.

use std::{
    io::Write,
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use axum::{
    Json, Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::HeaderMap,
    response::Response,
    routing::{get, post},
};
use flate2::{Compression, write::GzEncoder};
use poscalc_model::{
    enums::{MarketType, Venue},
    identifiers::Symbol,
};
use poscalc_network::{mode::ConnectionStatus, testing::wait_until_async};
use poscalc_venues::{
    client::{EventSender, MarketDataClient, MarketDataEvent, PriceSource, PriceUpdate, StreamLoss},
    config::VenueClientConfig,
    error::VenueError,
    factory::MarketDataClientAny,
};
use rstest::rstest;
use serde_json::{Value, json};
use tokio::sync::{Mutex, mpsc};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Kind {
    Bybit,
    Htx,
    Kucoin,
}

impl Kind {
    fn ticker_frame(self) -> Message {
        match self {
            Self::Bybit => Message::Text(
                json!({"topic": "tickers.BTCUSDT", "type": "snapshot", "data": {"lastPrice": "65000.5"}})
                    .to_string()
                    .into(),
            ),
            Self::Htx => Message::Binary(
                gzip(&json!({
                    "ch": "market.btcusdt.trade.detail",
                    "tick": {"data": [{"price": 65000.25, "amount": 0.1}]}
                })
                .to_string())
                .into(),
            ),
            Self::Kucoin => Message::Text(
                json!({
                    "type": "message",
                    "topic": "/market/ticker:BTC-USDT",
                    "data": {"price": "65002"}
                })
                .to_string()
                .into(),
            ),
        }
    }
}

#[derive(Clone, Default)]
struct TestServerState {
    connection_count: Arc<AtomicUsize>,
    subscriptions: Arc<Mutex<Vec<Value>>>,
    control: Arc<Mutex<Vec<Value>>>,
    silent: Arc<AtomicBool>,
    hangup_after_subscribe: Arc<AtomicBool>,
}

fn gzip(text: &str) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(text.as_bytes()).unwrap();
    encoder.finish().unwrap()
}

fn is_subscribe(value: &Value) -> bool {
    value["op"] == "subscribe" || value["type"] == "subscribe" || value.get("sub").is_some()
}

async fn handle_bybit(ws: WebSocketUpgrade, State(state): State<TestServerState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, Kind::Bybit))
}

async fn handle_htx(ws: WebSocketUpgrade, State(state): State<TestServerState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, Kind::Htx))
}

async fn handle_kucoin(ws: WebSocketUpgrade, State(state): State<TestServerState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, Kind::Kucoin))
}

async fn handle_socket(mut socket: WebSocket, state: TestServerState, kind: Kind) {
    state.connection_count.fetch_add(1, Ordering::SeqCst);

    match kind {
        Kind::Kucoin => {
            let welcome = json!({"id": "welcome-1", "type": "welcome"}).to_string();
            let _ = socket.send(Message::Text(welcome.into())).await;
        }
        Kind::Bybit | Kind::Htx => {}
    }

    let mut subscribed = false;
    let mut interval = tokio::time::interval(Duration::from_millis(50));

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(Ok(msg)) = msg else {
                    break;
                };
                let text = match msg {
                    Message::Text(text) => text,
                    Message::Close(_) => break,
                    _ => continue,
                };
                let Ok(value) = serde_json::from_str::<Value>(text.as_str()) else {
                    continue;
                };

                if is_subscribe(&value) {
                    state.subscriptions.lock().await.push(value);
                    subscribed = true;

                    if state.hangup_after_subscribe.load(Ordering::SeqCst) {
                        let _ = socket.send(Message::Close(None)).await;
                        break;
                    }

                    if kind == Kind::Htx {
                        let ping = gzip(r#"{"ping":1700000000000}"#);
                        let _ = socket.send(Message::Binary(ping.into())).await;
                    }
                } else {
                    state.control.lock().await.push(value);
                }
            }
            _ = interval.tick() => {
                if subscribed
                    && !state.silent.load(Ordering::SeqCst)
                    && socket.send(kind.ticker_frame()).await.is_err()
                {
                    break;
                }
            }
        }
    }
}

async fn bybit_ticker() -> Json<Value> {
    Json(json!({
        "retCode": 0,
        "result": {"category": "linear", "list": [{"symbol": "BTCUSDT", "lastPrice": "64999.9"}]}
    }))
}

async fn kucoin_token(headers: HeaderMap) -> Json<Value> {
    let host = headers
        .get("host")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();

    Json(json!({
        "code": "200000",
        "data": {
            "token": "test-token",
            "instanceServers": [{"endpoint": format!("ws://{host}/kucoin"), "pingInterval": 18000}]
        }
    }))
}

async fn start_test_server() -> (SocketAddr, TestServerState) {
    let state = TestServerState::default();
    let router = Router::new()
        .route("/v5/market/tickers", get(bybit_ticker))
        .route("/v5/public/linear", get(handle_bybit))
        .route("/ws", get(handle_htx))
        .route("/api/v1/bullet-public", post(kucoin_token))
        .route("/kucoin", get(handle_kucoin))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    tokio::time::sleep(Duration::from_millis(100)).await;

    (addr, state)
}

fn client_for(
    venue: Venue,
    market: MarketType,
    addr: SocketAddr,
    epoch: u64,
) -> (MarketDataClientAny, mpsc::UnboundedReceiver<MarketDataEvent>) {
    let config = VenueClientConfig::new(venue, market)
        .with_base_url_http(format!("http://{addr}"))
        .with_base_url_ws(format!("ws://{addr}"));
    client_with(config, epoch)
}

fn client_with(
    config: VenueClientConfig,
    epoch: u64,
) -> (MarketDataClientAny, mpsc::UnboundedReceiver<MarketDataEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let client = MarketDataClientAny::new(config, EventSender::new(epoch, tx)).unwrap();
    (client, rx)
}

async fn next_event(rx: &mut mpsc::UnboundedReceiver<MarketDataEvent>) -> MarketDataEvent {
    tokio::time::timeout(Duration::from_secs(3), rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

async fn next_stream_price(rx: &mut mpsc::UnboundedReceiver<MarketDataEvent>) -> PriceUpdate {
    loop {
        if let MarketDataEvent::Price(update) = next_event(rx).await
            && update.source == PriceSource::Stream
        {
            return update;
        }
    }
}

fn btc() -> Symbol {
    Symbol::from_static("BTC/USDT")
}

#[rstest]
#[tokio::test]
async fn test_fetch_initial_price_emits_rest_update() {
    let (addr, _state) = start_test_server().await;
    let (client, mut rx) = client_for(Venue::Bybit, MarketType::Futures, addr, 3);

    let price = client.fetch_initial_price(&btc()).await.unwrap();

    assert_eq!(price, 64999.9);
    match next_event(&mut rx).await {
        MarketDataEvent::Price(update) => {
            assert_eq!(update.epoch, 3);
            assert_eq!(update.price, 64999.9);
            assert_eq!(update.source, PriceSource::Rest);
        }
        other => panic!("unexpected event: {other:?}"),
    }
    assert_eq!(client.status(), ConnectionStatus::Disconnected);
}

#[rstest]
#[tokio::test]
async fn test_fetch_initial_price_failure_emits_nothing() {
    let (addr, _state) = start_test_server().await;
    let (client, mut rx) = client_for(Venue::Binance, MarketType::Spot, addr, 1);

    let result = client.fetch_initial_price(&btc()).await;

    assert!(matches!(result, Err(VenueError::Http(_))));
    assert!(rx.try_recv().is_err());
}

#[rstest]
#[tokio::test]
async fn test_connect_twice_opens_single_subscription() {
    let (addr, state) = start_test_server().await;
    let (client, mut rx) = client_for(Venue::Bybit, MarketType::Futures, addr, 5);
    let symbol = btc();

    let (first, second) = tokio::join!(client.connect_ws(&symbol), client.connect_ws(&symbol));
    first.unwrap();
    second.unwrap();
    client.connect_ws(&symbol).await.unwrap();

    let update = next_stream_price(&mut rx).await;
    assert_eq!(update.price, 65000.5);
    assert_eq!(update.epoch, 5);
    assert_eq!(client.status(), ConnectionStatus::Connected);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(state.connection_count.load(Ordering::SeqCst), 1);
    let subscriptions = state.subscriptions.lock().await.clone();
    assert_eq!(
        subscriptions,
        vec![json!({"op": "subscribe", "args": ["tickers.BTCUSDT"]})]
    );

    client.close_ws();
}

#[rstest]
#[tokio::test]
async fn test_close_ws_stops_price_events() {
    let (addr, _state) = start_test_server().await;
    let (client, mut rx) = client_for(Venue::Bybit, MarketType::Futures, addr, 1);

    client.connect_ws(&btc()).await.unwrap();
    next_stream_price(&mut rx).await;

    client.close_ws();
    client.close_ws();
    while rx.try_recv().is_ok() {}

    tokio::time::sleep(Duration::from_millis(250)).await;
    assert!(rx.try_recv().is_err());
    assert_eq!(client.status(), ConnectionStatus::Disconnected);
    assert!(!client.is_open_or_connecting());
}

#[rstest]
#[tokio::test]
async fn test_server_close_emits_stream_lost() {
    let (addr, state) = start_test_server().await;
    state.hangup_after_subscribe.store(true, Ordering::SeqCst);
    let (client, mut rx) = client_for(Venue::Bybit, MarketType::Futures, addr, 9);

    client.connect_ws(&btc()).await.unwrap();

    assert_eq!(
        next_event(&mut rx).await,
        MarketDataEvent::StreamLost {
            epoch: 9,
            reason: StreamLoss::ServerClosed
        }
    );
    assert_eq!(client.status(), ConnectionStatus::Disconnected);
}

#[rstest]
#[tokio::test]
async fn test_heartbeat_timeout_emits_stream_lost() {
    let (addr, state) = start_test_server().await;
    state.silent.store(true, Ordering::SeqCst);
    let config = VenueClientConfig::new(Venue::Bybit, MarketType::Futures)
        .with_base_url_http(format!("http://{addr}"))
        .with_base_url_ws(format!("ws://{addr}"))
        .with_heartbeat_timeout(Duration::from_millis(300));
    let (client, mut rx) = client_with(config, 2);

    client.connect_ws(&btc()).await.unwrap();

    assert_eq!(
        next_event(&mut rx).await,
        MarketDataEvent::StreamLost {
            epoch: 2,
            reason: StreamLoss::HeartbeatTimeout
        }
    );
    assert_eq!(client.status(), ConnectionStatus::Reconnecting);

    client.close_ws();
    assert_eq!(client.status(), ConnectionStatus::Disconnected);
}

#[rstest]
#[tokio::test]
async fn test_htx_gzip_stream_and_auto_pong() {
    let (addr, state) = start_test_server().await;
    let (client, mut rx) = client_for(Venue::Htx, MarketType::Spot, addr, 1);

    client.connect_ws(&btc()).await.unwrap();

    let update = next_stream_price(&mut rx).await;
    assert_eq!(update.price, 65000.25);

    wait_until_async(
        || {
            let control = state.control.clone();
            async move {
                control
                    .lock()
                    .await
                    .contains(&json!({"pong": 1_700_000_000_000_u64}))
            }
        },
        Duration::from_secs(2),
    )
    .await;

    let subscriptions = state.subscriptions.lock().await.clone();
    assert_eq!(subscriptions[0]["sub"], "market.btcusdt.trade.detail");

    client.close_ws();
}

#[rstest]
#[tokio::test]
async fn test_kucoin_token_flow() {
    let (addr, state) = start_test_server().await;
    let config = VenueClientConfig::new(Venue::Kucoin, MarketType::Spot)
        .with_base_url_http(format!("http://{addr}"));
    let (client, mut rx) = client_with(config, 4);

    client.connect_ws(&btc()).await.unwrap();

    let update = next_stream_price(&mut rx).await;
    assert_eq!(update.price, 65002.0);
    assert_eq!(update.epoch, 4);

    let subscriptions = state.subscriptions.lock().await.clone();
    assert_eq!(subscriptions.len(), 1);
    assert_eq!(subscriptions[0]["topic"], "/market/ticker:BTC-USDT");

    client.close_ws();
}

#[rstest]
#[tokio::test]
async fn test_connect_failure_sets_error_status() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let (client, _rx) = client_for(Venue::Coinex, MarketType::Spot, addr, 1);

    let result = client.connect_ws(&btc()).await;

    assert!(matches!(result, Err(VenueError::WebSocket(_))));
    assert_eq!(client.status(), ConnectionStatus::Error);
    assert!(!client.is_open_or_connecting());
}
