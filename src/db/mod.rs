pub mod connection;
pub mod groups;
pub mod schema;
pub mod users;

pub use connection::Database;
pub use groups::{GroupSummary, LocalTarget};
pub use users::{NewUser, User, UserUpdate};
