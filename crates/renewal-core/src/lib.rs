pub mod alert;
pub mod events;
pub mod loader;
pub mod settings;

pub use alert::{ContractAlert, NotificationContext};
pub use events::{EventKind, EventSink, MemorySink, RunEvent, Severity, TracingSink};
pub use loader::{AlertLoader, LoadError, parse_alerts};
pub use settings::{Settings, TextServiceConfig, Timeouts};
