pub mod broker;
pub mod config;
pub mod demo;
pub mod handle;
pub mod host;
pub mod options;
pub mod scheduler;
pub mod stack;

pub use config::{ConfigError, GlobalConfig};
pub use handle::PanelHandle;
pub use host::{DetachedHost, HostSurface, HostView};
pub use options::{PanelOptions, Position};
pub use stack::{CloseEvent, OpenedEvent, PanelEntry, StackManager, SETTLE_DELAY};
