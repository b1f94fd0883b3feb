//! Process-local map from room token to the live editor connections in it.
//!
//! The registry is owned by the server state and handed to every
//! connection task; `join`, `leave` and `broadcast` are its only mutators.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use derive_more::Display;
use serde::Serialize;
use tokio::sync::mpsc::{self, error::TrySendError};

pub type ConnectionId = u64;

/// Frames a connection may have queued before it counts as stalled.
pub const OUTBOUND_QUEUE: usize = 256;

/// Outbound half of a connection: serialized frames queued for its writer.
pub type FrameSender = mpsc::Sender<String>;

#[derive(Debug, Display)]
pub enum DeliveryError {
  /// The connection's writer has stopped; the handle is dead.
  #[display(fmt = "connection {} is gone", _0)]
  PeerGone(ConnectionId),
  /// The connection's queue is full; its writer is not keeping up.
  #[display(fmt = "connection {} is lagging", _0)]
  Lagging(ConnectionId),
  /// The frame could not be encoded. Nothing was sent.
  #[display(fmt = "malformed frame: {}", _0)]
  Malformed(serde_json::Error),
  /// Writing to the socket failed.
  #[display(fmt = "socket write failed: {}", _0)]
  Io(axum::Error),
}

impl std::error::Error for DeliveryError {}

/// Outcome of a fan-out.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BroadcastReport {
  pub delivered: usize,
  pub dropped: Vec<ConnectionId>,
}

struct Peer {
  id: ConnectionId,
  tx: FrameSender,
}

impl Peer {
  // Never waits: a stalled peer is dropped rather than buffered without bound.
  fn deliver(&self, frame: &str) -> Result<(), DeliveryError> {
    self.tx.try_send(frame.to_owned()).map_err(|err| match err {
      TrySendError::Full(_) => DeliveryError::Lagging(self.id),
      TrySendError::Closed(_) => DeliveryError::PeerGone(self.id),
    })
  }
}

#[derive(Default)]
struct Inner {
  rooms: Mutex<HashMap<String, Vec<Peer>>>,
  next_id: AtomicU64,
}

#[derive(Clone, Default)]
pub struct ConnectionRegistry {
  inner: Arc<Inner>,
}

impl ConnectionRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Appends a connection to the room, creating the room entry if needed.
  pub fn join(&self, room_id: &str, tx: FrameSender) -> ConnectionId {
    let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed) + 1;
    self
      .rooms()
      .entry(room_id.to_owned())
      .or_default()
      .push(Peer { id, tx });
    tracing::debug!(room_id, connection_id = id, "connection joined");
    id
  }

  /// Removes a connection. The room entry goes away with its last member.
  /// Returns `false` if the connection was not registered.
  pub fn leave(&self, room_id: &str, id: ConnectionId) -> bool {
    let mut rooms = self.rooms();
    let removed = remove_peers(&mut rooms, room_id, &[id]);
    if removed {
      tracing::debug!(room_id, connection_id = id, "connection left");
    }
    removed
  }

  /// Sends `frame` to every connection in the room except `exclude`.
  ///
  /// Connections whose writer is gone or lagging are pruned once the
  /// fan-out is done.
  pub fn broadcast<T: Serialize>(
    &self,
    room_id: &str,
    frame: &T,
    exclude: Option<ConnectionId>,
  ) -> Result<BroadcastReport, DeliveryError> {
    let frame = serde_json::to_string(frame).map_err(DeliveryError::Malformed)?;
    let mut report = BroadcastReport::default();

    let mut rooms = self.rooms();
    let Some(peers) = rooms.get(room_id) else {
      return Ok(report);
    };
    for peer in peers.iter().filter(|peer| Some(peer.id) != exclude) {
      match peer.deliver(&frame) {
        Ok(()) => report.delivered += 1,
        Err(err) => {
          tracing::debug!(room_id, %err, "dropping connection");
          report.dropped.push(peer.id);
        }
      }
    }
    if !report.dropped.is_empty() {
      remove_peers(&mut rooms, room_id, &report.dropped);
    }
    Ok(report)
  }

  pub fn connection_count(&self, room_id: &str) -> usize {
    self.rooms().get(room_id).map_or(0, Vec::len)
  }

  fn rooms(&self) -> MutexGuard<'_, HashMap<String, Vec<Peer>>> {
    // No invariant spans a panic inside the lock, so a poisoned map is still usable.
    self
      .inner
      .rooms
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
  }
}

fn remove_peers(
  rooms: &mut HashMap<String, Vec<Peer>>,
  room_id: &str,
  ids: &[ConnectionId],
) -> bool {
  let Some(peers) = rooms.get_mut(room_id) else {
    return false;
  };
  let before = peers.len();
  peers.retain(|peer| !ids.contains(&peer.id));
  let removed = peers.len() != before;
  if peers.is_empty() {
    rooms.remove(room_id);
  }
  removed
}
