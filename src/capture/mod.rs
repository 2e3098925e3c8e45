pub mod backend;
pub mod log;

pub use backend::{invoke, CaptureCommand, CaptureDevice, CaptureFactory};
pub use log::{LogCaptureDevice, LogCaptureFactory};
