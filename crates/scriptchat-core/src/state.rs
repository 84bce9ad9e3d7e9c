//! UI-agnostic conversation types
//!
//! Scripts are authored in terms of `Turn`s with a `user`/`assistant` role.
//! Anything that reaches the screen is a `DisplayedMessage`, where the
//! assistant side is called the bot.

use serde::{Deserialize, Serialize};

/// The role of a scripted turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    #[serde(alias = "bot")]
    Assistant,
}

/// One authored turn of a conversation script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }
}

/// Who a displayed message belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayRole {
    User,
    Bot,
}

impl From<Role> for DisplayRole {
    fn from(role: Role) -> Self {
        match role {
            Role::User => DisplayRole::User,
            Role::Assistant => DisplayRole::Bot,
        }
    }
}

/// A message in the visible chat history. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayedMessage {
    pub id: String,
    pub role: DisplayRole,
    pub content: String,
    pub timestamp: String,
}

/// Wall-clock time the way the chat bubbles show it
pub fn display_timestamp() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assistant_becomes_bot() {
        assert_eq!(DisplayRole::from(Role::Assistant), DisplayRole::Bot);
        assert_eq!(DisplayRole::from(Role::User), DisplayRole::User);
    }

    #[test]
    fn test_role_parses_lowercase_and_bot_alias() {
        let turns: Vec<Turn> = serde_json::from_str(
            r#"[{"role":"user","content":"a"},{"role":"assistant","content":"b"},{"role":"bot","content":"c"}]"#,
        )
        .unwrap();
        assert_eq!(turns[0], Turn::user("a"));
        assert_eq!(turns[1], Turn::assistant("b"));
        assert_eq!(turns[2], Turn::assistant("c"));
    }
}
