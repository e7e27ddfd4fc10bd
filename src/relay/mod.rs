pub mod room;
mod server;
mod signaling;
pub use server::RelayServer;
pub use signaling::{RelayMessage, SignalingHandler};
