use axum::extract::ws::{Message, WebSocket};
use derive_more::Display;
use futures_util::{
  stream::{SplitSink, StreamExt},
  SinkExt,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::mpsc;

use super::registry::{
  BroadcastReport, ConnectionId, ConnectionRegistry, DeliveryError, FrameSender, OUTBOUND_QUEUE,
};

const DEFAULT_MESSAGE_TYPE: &str = "code_change";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
  Connecting,
  Joined,
  Closed,
}

#[derive(Debug, Display)]
pub enum RelayError {
  #[display(fmt = "frame is not valid JSON: {}", _0)]
  Malformed(serde_json::Error),
  #[display(fmt = "frame is not a JSON object")]
  NotAnObject,
  #[display(fmt = "session is not joined to a room")]
  NotJoined,
  #[display(fmt = "{}", _0)]
  Delivery(DeliveryError),
}

impl std::error::Error for RelayError {}

impl RelayError {
  /// Frames that cannot be read as a JSON object end the connection.
  pub fn ends_session(&self) -> bool {
    matches!(
      self,
      RelayError::Malformed(_) | RelayError::NotAnObject | RelayError::NotJoined
    )
  }
}

/// What peers receive for every inbound frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
  #[serde(rename = "type")]
  pub kind: Value,
  pub data: Value,
  pub timestamp: Value,
}

impl Envelope {
  /// Copies `type`, `data` and `timestamp` out of a client frame, filling
  /// in `"code_change"`, `{}` and `null` for whichever are absent.
  pub fn from_frame(text: &str) -> Result<Self, RelayError> {
    let value: Value = serde_json::from_str(text).map_err(RelayError::Malformed)?;
    let Value::Object(mut fields) = value else {
      return Err(RelayError::NotAnObject);
    };
    Ok(Envelope {
      kind: fields
        .remove("type")
        .unwrap_or_else(|| Value::from(DEFAULT_MESSAGE_TYPE)),
      data: fields
        .remove("data")
        .unwrap_or_else(|| Value::Object(Map::new())),
      timestamp: fields.remove("timestamp").unwrap_or(Value::Null),
    })
  }
}

#[derive(Debug, Serialize)]
pub struct DisconnectNotice {
  #[serde(rename = "type")]
  kind: &'static str,
  message: &'static str,
}

impl Default for DisconnectNotice {
  fn default() -> Self {
    DisconnectNotice {
      kind: "user_disconnected",
      message: "A user has disconnected",
    }
  }
}

/// One editor connection's membership in a room.
///
/// `Connecting -> Joined -> Closed`. Dropping a joined session deregisters
/// it without notifying the room.
pub struct EditorSession {
  registry: ConnectionRegistry,
  room_id: String,
  connection_id: Option<ConnectionId>,
  state: SessionState,
}

impl EditorSession {
  pub fn new(registry: ConnectionRegistry, room_id: impl Into<String>) -> Self {
    EditorSession {
      registry,
      room_id: room_id.into(),
      connection_id: None,
      state: SessionState::Connecting,
    }
  }

  pub fn state(&self) -> SessionState {
    self.state
  }

  pub fn room_id(&self) -> &str {
    &self.room_id
  }

  pub fn join(&mut self, tx: FrameSender) -> ConnectionId {
    if let Some(id) = self.connection_id {
      return id;
    }
    let id = self.registry.join(&self.room_id, tx);
    self.connection_id = Some(id);
    self.state = SessionState::Joined;
    id
  }

  /// Rebroadcasts one inbound text frame to everyone else in the room.
  pub fn relay(&self, text: &str) -> Result<BroadcastReport, RelayError> {
    let Some(id) = self.joined_id() else {
      return Err(RelayError::NotJoined);
    };
    let envelope = Envelope::from_frame(text)?;
    self
      .registry
      .broadcast(&self.room_id, &envelope, Some(id))
      .map_err(RelayError::Delivery)
  }

  /// Leaves the room. With `notify`, the remaining members are told a user
  /// disconnected. Closing twice is a no-op.
  pub fn close(&mut self, notify: bool) -> Option<BroadcastReport> {
    let id = self.joined_id()?;
    self.registry.leave(&self.room_id, id);
    self.state = SessionState::Closed;
    if !notify {
      return None;
    }
    match self
      .registry
      .broadcast(&self.room_id, &DisconnectNotice::default(), None)
    {
      Ok(report) => Some(report),
      Err(err) => {
        tracing::warn!(room_id = %self.room_id, %err, "disconnect notice failed");
        None
      }
    }
  }

  fn joined_id(&self) -> Option<ConnectionId> {
    match self.state {
      SessionState::Joined => self.connection_id,
      _ => None,
    }
  }
}

impl Drop for EditorSession {
  fn drop(&mut self) {
    self.close(false);
  }
}

/// Drives one upgraded socket until the client goes away.
pub async fn run_editor_session(socket: WebSocket, registry: ConnectionRegistry, room_id: String) {
  // By splitting we can send and receive at the same time.
  let (sender, mut receiver) = socket.split();
  let (tx, rx) = mpsc::channel(OUTBOUND_QUEUE);

  let mut session = EditorSession::new(registry, room_id);
  let connection_id = session.join(tx);
  tracing::info!(room_id = %session.room_id(), connection_id, "editor connected");

  let mut writer_task = create_writer_task(sender, rx);

  let notify = loop {
    tokio::select! {
      frame = receiver.next() => match frame {
        Some(Ok(Message::Text(text))) => match session.relay(&text) {
          Ok(report) => tracing::trace!(
            connection_id,
            delivered = report.delivered,
            dropped = report.dropped.len(),
            "frame relayed"
          ),
          Err(err) if err.ends_session() => {
            tracing::warn!(connection_id, %err, "closing on unreadable frame");
            break false;
          }
          Err(err) => tracing::warn!(connection_id, %err, "frame not delivered"),
        },
        Some(Ok(Message::Close(frame))) => {
          if let Some(cf) = frame {
            tracing::debug!(connection_id, code = cf.code, reason = %cf.reason, "client sent close");
          }
          break true;
        }
        // axum answers pings itself; binary frames carry nothing for us.
        Some(Ok(_)) => {}
        Some(Err(err)) => {
          tracing::warn!(connection_id, %err, "socket receive failed");
          break false;
        }
        None => break true,
      },
      result = &mut writer_task => {
        if let Ok(Err(err)) = result {
          tracing::warn!(connection_id, %err, "writer stopped");
        }
        break false;
      }
    }
  };

  session.close(notify);
  writer_task.abort();
  tracing::info!(room_id = %session.room_id(), connection_id, "editor disconnected");
}

fn create_writer_task(
  mut sender: SplitSink<WebSocket, Message>,
  mut rx: mpsc::Receiver<String>,
) -> tokio::task::JoinHandle<Result<(), DeliveryError>> {
  tokio::spawn(async move {
    while let Some(frame) = rx.recv().await {
      sender
        .send(Message::Text(frame))
        .await
        .map_err(DeliveryError::Io)?;
    }
    Ok(())
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;
  use tokio::sync::mpsc::Receiver;

  fn joined(registry: &ConnectionRegistry, room_id: &str) -> (EditorSession, Receiver<String>) {
    let (tx, rx) = mpsc::channel(OUTBOUND_QUEUE);
    let mut session = EditorSession::new(registry.clone(), room_id);
    session.join(tx);
    (session, rx)
  }

  fn received(rx: &mut Receiver<String>) -> Value {
    serde_json::from_str(&rx.try_recv().unwrap()).unwrap()
  }

  #[test]
  fn envelope_copies_client_fields() {
    let envelope = Envelope::from_frame(
      r#"{"type":"cursor","data":{"line":3},"timestamp":1700000000,"extra":true}"#,
    )
    .unwrap();
    assert_eq!(
      serde_json::to_value(&envelope).unwrap(),
      json!({ "type": "cursor", "data": { "line": 3 }, "timestamp": 1700000000 })
    );
  }

  #[test]
  fn envelope_fills_defaults() {
    let envelope = Envelope::from_frame("{}").unwrap();
    assert_eq!(
      serde_json::to_value(&envelope).unwrap(),
      json!({ "type": "code_change", "data": {}, "timestamp": null })
    );
  }

  #[test]
  fn non_json_and_non_object_frames_are_rejected() {
    assert!(matches!(
      Envelope::from_frame("not json"),
      Err(RelayError::Malformed(_))
    ));
    assert!(matches!(
      Envelope::from_frame("[1, 2]"),
      Err(RelayError::NotAnObject)
    ));
  }

  #[test]
  fn session_moves_through_its_states() {
    let registry = ConnectionRegistry::new();
    let mut session = EditorSession::new(registry.clone(), "abc");
    assert_eq!(session.state(), SessionState::Connecting);
    assert!(matches!(session.relay("{}"), Err(RelayError::NotJoined)));

    let (tx, _rx) = mpsc::channel(OUTBOUND_QUEUE);
    session.join(tx);
    assert_eq!(session.state(), SessionState::Joined);
    assert_eq!(registry.connection_count("abc"), 1);

    session.close(false);
    assert_eq!(session.state(), SessionState::Closed);
    assert_eq!(registry.connection_count("abc"), 0);
    assert!(session.close(true).is_none());
  }

  #[test]
  fn relay_reaches_every_peer_but_the_sender() {
    let registry = ConnectionRegistry::new();
    let (sender, mut sender_rx) = joined(&registry, "abc");
    let (_a, mut a_rx) = joined(&registry, "abc");
    let (_b, mut b_rx) = joined(&registry, "abc");

    let report = sender
      .relay(r#"{"data":{"code":"print(1)"},"timestamp":5}"#)
      .unwrap();

    assert_eq!(report.delivered, 2);
    let expected = json!({ "type": "code_change", "data": { "code": "print(1)" }, "timestamp": 5 });
    assert_eq!(received(&mut a_rx), expected);
    assert_eq!(received(&mut b_rx), expected);
    assert!(sender_rx.try_recv().is_err());
  }

  #[test]
  fn unreadable_frames_end_the_session() {
    let registry = ConnectionRegistry::new();
    let (sender, _rx) = joined(&registry, "abc");
    let (_peer, mut peer_rx) = joined(&registry, "abc");

    let err = sender.relay("{oops").unwrap_err();
    assert!(matches!(err, RelayError::Malformed(_)));
    assert!(err.ends_session());
    assert!(sender.relay("42").unwrap_err().ends_session());
    assert!(peer_rx.try_recv().is_err());
  }

  #[test]
  fn lagging_peer_does_not_end_the_sender() {
    let err = RelayError::Delivery(DeliveryError::Lagging(7));
    assert!(!err.ends_session());
  }

  #[test]
  fn close_notifies_remaining_members() {
    let registry = ConnectionRegistry::new();
    let (mut leaving, mut leaving_rx) = joined(&registry, "abc");
    let (_stay, mut stay_rx) = joined(&registry, "abc");

    let report = leaving.close(true).unwrap();

    assert_eq!(report.delivered, 1);
    assert_eq!(
      received(&mut stay_rx),
      json!({ "type": "user_disconnected", "message": "A user has disconnected" })
    );
    assert!(leaving_rx.try_recv().is_err());
  }

  #[test]
  fn last_member_leaving_notifies_nobody() {
    let registry = ConnectionRegistry::new();
    let (mut only, _rx) = joined(&registry, "abc");
    assert_eq!(only.close(true), Some(BroadcastReport::default()));
    assert_eq!(registry.connection_count("abc"), 0);
  }

  #[test]
  fn dropping_a_joined_session_deregisters_it() {
    let registry = ConnectionRegistry::new();
    let (session, _rx) = joined(&registry, "abc");
    assert_eq!(registry.connection_count("abc"), 1);
    drop(session);
    assert_eq!(registry.connection_count("abc"), 0);
  }
}
