// src/exchange/deriv_ws/mod.rs

use futures_util::stream::{SplitSink, SplitStream};
use tokio::net::TcpStream;
use tokio_tungstenite::{tungstenite::protocol::Message, MaybeTlsStream, WebSocketStream};

pub(super) type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
pub(super) type WsStream = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

mod connection;
mod protocol;
mod types_internal;

pub(super) use connection::Session;
pub(super) use protocol::{authorize, buy, ping, ticks_history, ContractParams};
pub(super) use types_internal::{parse_buy, parse_candles};
