//! GMP gateway to the OpenVAS scanner.
//!
//! Every request opens its own [`ScannerSession`] through a [`ScannerConnector`],
//! authenticates, runs the commands it needs and drops the connection.
//! Responses are decoded into the typed structs in [`models`].

pub mod alerts;
pub mod assets;
pub mod command;
pub mod models;
pub mod reports;
pub mod schedules;
pub mod session;
pub mod targets;
pub mod tasks;
pub mod transport;
pub mod users;
mod wire;
pub mod xml;

pub use alerts::AlertSpec;
pub use schedules::{Frequency, Recurrence, ScheduleSpec};
pub use session::ScannerSession;
pub use targets::{HostEntry, NewTarget, TargetChanges};
pub use tasks::TaskSpec;
pub use transport::{GmpTransport, ScannerConnector, UnixSocketConnector};
pub use users::UserSpec;
