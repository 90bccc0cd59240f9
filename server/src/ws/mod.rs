pub mod actor;
pub mod handler;
pub mod protocol;
pub mod registry;
pub mod session;

pub use registry::{ConnectionClosed, ConnectionHandle, ConnectionRegistry};

/// Close code sent to a connection replaced by a newer registration of the
/// same vendor.
pub const CLOSE_SUPERSEDED: u16 = 4000;

/// Close code sent when the client stops answering pings.
pub const CLOSE_PONG_TIMEOUT: u16 = 1001;
