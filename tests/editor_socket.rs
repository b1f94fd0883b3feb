//! Editor sockets driven end to end through a bound listener.

mod common;

use std::net::SocketAddr;
use std::time::Duration;

use code_rooms::routes::router;
use code_rooms::ws::ConnectionRegistry;
use common::offline_state;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout, Instant};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const ROOM: &str = "r1";

async fn serve() -> (SocketAddr, ConnectionRegistry) {
  let state = offline_state();
  let registry = state.registry.clone();
  let server = axum::Server::bind(&"127.0.0.1:0".parse().unwrap())
    .serve(router(state).into_make_service());
  let addr = server.local_addr();
  tokio::spawn(server);
  (addr, registry)
}

async fn connect(addr: SocketAddr) -> Client {
  let (client, _) = connect_async(format!("ws://{}/ws/editor/{}", addr, ROOM))
    .await
    .expect("websocket handshake");
  client
}

async fn wait_for_count(registry: &ConnectionRegistry, expected: usize) {
  let deadline = Instant::now() + Duration::from_secs(5);
  while registry.connection_count(ROOM) != expected {
    assert!(
      Instant::now() < deadline,
      "room never reached {} connections (has {})",
      expected,
      registry.connection_count(ROOM)
    );
    sleep(Duration::from_millis(10)).await;
  }
}

async fn next_json(client: &mut Client) -> Value {
  let message = timeout(Duration::from_secs(5), client.next())
    .await
    .expect("frame in time")
    .expect("stream open")
    .expect("valid frame");
  serde_json::from_str(message.to_text().unwrap()).unwrap()
}

async fn two_editors() -> (Client, Client, ConnectionRegistry) {
  let (addr, registry) = serve().await;
  let a = connect(addr).await;
  let b = connect(addr).await;
  wait_for_count(&registry, 2).await;
  (a, b, registry)
}

#[tokio::test]
async fn frames_are_relayed_and_departures_announced() {
  let (mut a, mut b, registry) = two_editors().await;

  a.send(Message::text(r#"{"data":1}"#)).await.unwrap();
  assert_eq!(
    next_json(&mut b).await,
    json!({ "type": "code_change", "data": 1, "timestamp": null })
  );

  a.close(None).await.unwrap();
  assert_eq!(
    next_json(&mut b).await,
    json!({ "type": "user_disconnected", "message": "A user has disconnected" })
  );
  wait_for_count(&registry, 1).await;
}

#[tokio::test]
async fn unreadable_frame_ends_the_connection_quietly() {
  let (mut a, mut b, registry) = two_editors().await;

  a.send(Message::text("not json")).await.unwrap();
  wait_for_count(&registry, 1).await;

  let quiet = timeout(Duration::from_millis(200), b.next()).await;
  assert!(quiet.is_err(), "remaining editor got {:?}", quiet);
}
