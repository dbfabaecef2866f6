//! sealbox-relay
//!
//! The message relay (component C5) and its notification fabric: sealed
//! ciphertext queues with TTL, real-time wake-ups for online recipients,
//! and the JSON frame protocol spoken on notification sockets. No frame
//! ever carries ciphertext, and no queue row ever carries a sender.

pub mod fabric;
pub mod protocol;
pub mod queue;
pub mod reaper;

pub use fabric::{Fabric, SocketGuard, SocketSender};
pub use protocol::{ClientFrame, ServerFrame};
pub use queue::Relay;
pub use reaper::spawn_reaper;
