use teloxide::utils::command::BotCommands;
use tokio::sync::mpsc;

use crate::domain::IncomingMessage;

pub type BotResult<T> = Result<T, teloxide::RequestError>;

pub struct AppState {
    pub inbox: mpsc::Sender<IncomingMessage>,
}

/// Only used to publish the command menu; parsing lives in `domain::command`.
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum GeneralCommand {
    #[command(description = "how to use the bot")]
    Start,
    #[command(description = "how to use the bot")]
    Help,
    #[command(description = "check a text: /check year filename text")]
    Check,
}
