use teloxide::types::{Message, User};

use crate::domain::IncomingMessage;

/// Text messages only; anything else never reaches the dispatch loop.
pub fn to_incoming(msg: &Message) -> Option<IncomingMessage> {
    let text = msg.text()?;
    let sender = msg
        .from
        .as_ref()
        .map(format_user_display)
        .unwrap_or_else(|| "Unknown".to_string());
    Some(IncomingMessage {
        chat_id: msg.chat.id,
        message_id: msg.id,
        sender,
        text: text.to_string(),
    })
}

pub fn format_user_display(user: &User) -> String {
    display_name(
        user.username.as_deref(),
        &user.first_name,
        user.last_name.as_deref(),
    )
}

fn display_name(username: Option<&str>, first_name: &str, last_name: Option<&str>) -> String {
    if let Some(username) = username {
        return format!("@{username}");
    }
    let name = match last_name {
        Some(last) => format!("{first_name} {last}"),
        None => first_name.to_string(),
    };
    let name = name.trim();
    if name.is_empty() {
        "Unknown".to_string()
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_wins_over_names() {
        assert_eq!(display_name(Some("student"), "Ivan", Some("Petrov")), "@student");
    }

    #[test]
    fn names_are_joined_and_trimmed() {
        assert_eq!(display_name(None, "Ivan", Some("Petrov")), "Ivan Petrov");
        assert_eq!(display_name(None, "Ivan", None), "Ivan");
        assert_eq!(display_name(None, " ", Some("")), "Unknown");
    }
}
