//! Per-connection streaming pipeline.
//!
//! ```text
//! socket ──▶ receive task ──▶ Mailbox (latest wins)
//!                                 │
//!                                 ▼
//!                         Session::run ── decode (blocking pool)
//!                                 │
//!                                 ▼
//!                         ClassifierWorker (own thread)
//!                                 │
//!                                 ▼
//!                          EmissionGate ──▶ writer task ──▶ socket
//!                                              ▲
//!                               keepalive ─────┘
//! ```

pub mod decode;
pub mod emission;
pub mod mailbox;
pub mod protocol;
pub mod session;
pub mod ws;

pub use emission::EmissionGate;
pub use mailbox::{Mailbox, Recv};
pub use protocol::{ClientMessage, ServerMessage};
pub use session::{Inbound, Session, SessionStats};
pub use ws::{GestureState, gesture_routes};
