mod handler;
mod messenger;
mod types;
mod utils;

pub use handler::TelegramService;
pub use messenger::TelegramMessenger;
