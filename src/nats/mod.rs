pub mod capture;
pub mod client;
pub mod messages;

pub use capture::{NatsCaptureDevice, NatsCaptureFactory};
pub use client::NatsClient;
pub use messages::{CaptureCommandMessage, CaptureReplyMessage};
