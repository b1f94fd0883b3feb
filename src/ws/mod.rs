pub mod registry;
pub mod relay;

pub use registry::{
  BroadcastReport, ConnectionId, ConnectionRegistry, DeliveryError, FrameSender, OUTBOUND_QUEUE,
};
pub use relay::{run_editor_session, EditorSession, Envelope, RelayError, SessionState};
