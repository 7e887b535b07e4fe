//! Background polling: gateway status monitor and live M-Bus readers

pub mod gateway_monitor;
pub mod guard;
pub mod live_reader;
pub mod traits;

pub use gateway_monitor::{GatewayMonitor, MonitorSnapshot};
pub use guard::PollGuard;
pub use live_reader::{
    FeedMode, LiveReaderRegistry, ReaderAction, ReaderError, ReaderSnapshot, ReaderState,
    TransitionError, IDLE_POLLS,
};
pub use traits::Startable;
