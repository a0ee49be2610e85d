//! 4D SQL protocol messages
//!
//! Builders for the three requests the client sends and the parser for the
//! header block that starts every response.

mod close;
mod execute;
mod header;
mod login;

pub use close::CloseStatementMessage;
pub use execute::ExecuteStatementMessage;
pub use header::{ResponseHeader, ResponseStatus};
pub use login::LoginMessage;
