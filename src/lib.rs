pub mod capture;
pub mod clock;
pub mod config;
pub mod error;
pub mod http;
pub mod nats;
pub mod notice;
pub mod session;
pub mod store;
pub mod view;
pub mod workflow;

pub use capture::{CaptureCommand, CaptureDevice, CaptureFactory, LogCaptureFactory};
pub use clock::{Clock, ManualClock, Millis, SystemClock};
pub use config::Config;
pub use error::SessionError;
pub use http::{create_router, AppState};
pub use nats::{CaptureCommandMessage, CaptureReplyMessage, NatsCaptureFactory, NatsClient};
pub use notice::{ChannelNotifier, Notice, NoticeBoard, Notifier};
pub use session::{
    CrossTabSynchronizer, RecordingSession, RecordingSessionController, RecordingState,
    RestoreOutcome, SessionConfig, SessionRestorer, SessionStatus, Transition, TransitionSource,
};
pub use store::{
    KeyValueStore, MemoryOrigin, MemoryStore, NatsKvStore, PersistedSessionRecord,
    PersistedSessionStore,
};
pub use view::{MeetingView, ViewDeps};
pub use workflow::{
    GenerationOutcome, HttpMeetingApi, InFlightRegistry, MeetingStatusUpdater, MinutesGenerator,
    PostStopWorkflowTrigger,
};
