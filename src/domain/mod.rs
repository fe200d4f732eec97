pub mod command;
pub mod message;
pub mod types;

pub use command::{parse_command, Command, USAGE};
pub use message::IncomingMessage;
pub use types::{CheckSubmission, CheckTicket, Credentials, PollOutcome, ReplyTarget};
