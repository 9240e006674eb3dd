// tests/deriv_ws_tests.rs

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_tungstenite::{accept_async, tungstenite::protocol::Message};

use trade_relay::exchange::types::{BrokerError, OrderRequest, Timeframe};
use trade_relay::exchange::{Broker, Deriv};

type Seen = Arc<Mutex<Vec<Value>>>;

/// One-connection fake of the Deriv endpoint. `respond` maps each request to the frames sent back.
async fn spawn_server<F>(respond: F) -> (Deriv, Seen)
where
    F: Fn(&Value) -> Vec<Message> + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let seen_task = seen.clone();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        while let Some(Ok(msg)) = ws.next().await {
            let Message::Text(text) = msg else { continue };
            let request: Value = serde_json::from_str(text.as_str()).unwrap();
            seen_task.lock().unwrap().push(request.clone());
            for frame in respond(&request) {
                if ws.send(frame).await.is_err() {
                    return;
                }
            }
        }
    });

    let deriv = Deriv::new(&format!("ws://{}", addr), "1089")
        .unwrap()
        .with_timeouts(Duration::from_secs(2), Duration::from_millis(500));
    (deriv, seen)
}

fn reply(request: &Value, msg_type: &str, mut body: Value) -> Message {
    body["msg_type"] = json!(msg_type);
    body["req_id"] = request["req_id"].clone();
    Message::Text(body.to_string().into())
}

fn order(token: Option<&str>) -> OrderRequest {
    OrderRequest {
        symbol: "R_50".into(),
        amount: 10.0,
        contract_type: "CALL".into(),
        api_token: token.map(str::to_string),
    }
}

fn buy_body() -> Value {
    json!({"buy": {"contract_id": 99, "transaction_id": 5, "buy_price": 5.2, "payout": 10, "longcode": "Win"}})
}

#[tokio::test]
async fn order_authorizes_then_buys() {
    let (deriv, seen) = spawn_server(|req| {
        if req.get("authorize").is_some() {
            vec![reply(req, "authorize", json!({"authorize": {"loginid": "CR1"}}))]
        } else {
            vec![reply(req, "buy", buy_body())]
        }
    })
    .await;

    let receipt = deriv.place_order(&order(Some("secret"))).await.unwrap();
    assert_eq!(receipt.contract_id, Some(99));
    assert_eq!(receipt.buy_price, Some(5.2));
    assert_eq!(receipt.raw["msg_type"], "buy");

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0]["authorize"], "secret");
    assert_eq!(seen[1]["buy"], "1");
    assert_eq!(seen[1]["parameters"]["symbol"], "R_50");
    assert_ne!(seen[0]["req_id"], seen[1]["req_id"]);
}

#[tokio::test]
async fn order_without_token_skips_authorize() {
    let (deriv, seen) = spawn_server(|req| vec![reply(req, "buy", buy_body())]).await;

    deriv.place_order(&order(None)).await.unwrap();
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].get("authorize").is_none());
}

#[tokio::test]
async fn unrelated_frames_are_skipped() {
    let (deriv, _) = spawn_server(|req| {
        vec![
            Message::Text(json!({"msg_type": "tick", "tick": {"quote": 1.0}}).to_string().into()),
            reply(req, "buy", buy_body()),
        ]
    })
    .await;

    assert!(deriv.place_order(&order(None)).await.is_ok());
}

#[tokio::test]
async fn broker_error_is_a_rejection() {
    let (deriv, _) = spawn_server(|req| {
        vec![reply(req, "buy", json!({"error": {"code": "ContractBuyValidationError", "message": "Invalid symbol"}}))]
    })
    .await;

    match deriv.place_order(&order(None)).await {
        Err(BrokerError::Rejected { code, message }) => {
            assert_eq!(code, "ContractBuyValidationError");
            assert_eq!(message, "Invalid symbol");
        }
        other => panic!("unexpected: {:?}", other),
    }
}

#[tokio::test]
async fn failed_authorize_stops_before_buy() {
    let (deriv, seen) = spawn_server(|req| {
        vec![reply(req, "authorize", json!({"error": {"code": "InvalidToken", "message": "The token is invalid."}}))]
    })
    .await;

    let err = deriv.place_order(&order(Some("bad"))).await.unwrap_err();
    assert!(matches!(err, BrokerError::Rejected { .. }));
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn silent_broker_times_out() {
    let (deriv, _) = spawn_server(|_| Vec::new()).await;
    assert!(matches!(deriv.place_order(&order(None)).await, Err(BrokerError::Timeout(_))));
}

#[tokio::test]
async fn remote_close_is_reported() {
    let (deriv, _) = spawn_server(|_| vec![Message::Close(None)]).await;
    assert!(matches!(deriv.place_order(&order(None)).await, Err(BrokerError::Closed)));
}

#[tokio::test]
async fn candles_are_requested_with_granularity() {
    let (deriv, seen) = spawn_server(|req| {
        vec![reply(
            req,
            "candles",
            json!({"candles": [
                {"epoch": 3600, "open": 1.0, "high": 2.0, "low": 0.5, "close": 1.5},
                {"epoch": 7200, "open": 1.5, "high": 2.5, "low": 1.0, "close": 2.0}
            ]}),
        )]
    })
    .await;

    let candles = deriv.candles("R_50", Timeframe::H1, 2).await.unwrap();
    assert_eq!(candles.len(), 2);
    assert_eq!(candles[1].close, 2.0);

    let seen = seen.lock().unwrap();
    assert_eq!(seen[0]["ticks_history"], "R_50");
    assert_eq!(seen[0]["granularity"], 3600);
    assert_eq!(seen[0]["style"], "candles");
}

#[tokio::test]
async fn ping_checks_the_connection() {
    let (deriv, _) = spawn_server(|req| vec![reply(req, "ping", json!({"ping": "pong"}))]).await;
    assert!(deriv.check_connection().await.is_ok());
}

#[tokio::test]
async fn unreachable_endpoint_is_a_connect_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let deriv = Deriv::new(&format!("ws://{}", addr), "1089").unwrap();
    assert!(matches!(deriv.check_connection().await, Err(BrokerError::Connect(_))));
}
