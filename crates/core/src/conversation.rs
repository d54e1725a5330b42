//! Conversation history: the prompts and decks exchanged in a chat.
//!
//! Chats are scoped to an owner identity supplied by the caller. Two stores
//! are provided: an in-memory one and a directory of JSON files.

use crate::error::{Error, Result};
use crate::types::Deck;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Maximum number of chats returned by [`ChatStore::list`].
pub const HISTORY_LIMIT: usize = 50;

/// Chat ids and owners usable as file names.
static ID_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

/// Who wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message in a chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,

    /// The validated deck produced by this message, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deck: Option<Deck>,

    #[serde(default)]
    pub is_error: bool,

    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// A prompt typed by the user.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            deck: None,
            is_error: false,
            timestamp: Utc::now(),
        }
    }

    /// An assistant reply carrying a deck.
    pub fn assistant_deck(content: impl Into<String>, deck: Deck) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            deck: Some(deck),
            is_error: false,
            timestamp: Utc::now(),
        }
    }

    /// An assistant reply reporting a failure.
    pub fn assistant_error(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            deck: None,
            is_error: true,
            timestamp: Utc::now(),
        }
    }
}

/// A persisted conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    pub chat_id: String,
    pub owner: String,
    pub title: String,
    pub messages: Vec<ChatMessage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Chat {
    /// Start an empty chat.
    pub fn new(owner: impl Into<String>, chat_id: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            chat_id: chat_id.into(),
            owner: owner.into(),
            title: title.into(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a message.
    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// The most recent deck in the conversation.
    pub fn latest_deck(&self) -> Option<&Deck> {
        self.messages.iter().rev().find_map(|m| m.deck.as_ref())
    }

    fn check(&self) -> Result<()> {
        if self.chat_id.trim().is_empty() || self.title.trim().is_empty() {
            return Err(Error::InvalidChat("chat id and title are required".to_string()));
        }
        Ok(())
    }
}

/// Storage for chats, keyed by owner and chat id.
pub trait ChatStore {
    /// Insert or replace a chat. Keeps the original creation time of an
    /// existing chat and refreshes the update time. Returns the stored chat.
    fn save(&mut self, chat: Chat) -> Result<Chat>;

    /// Fetch one of the owner's chats.
    fn get(&self, owner: &str, chat_id: &str) -> Result<Chat>;

    /// The owner's chats, most recently updated first, at most
    /// [`HISTORY_LIMIT`].
    fn list(&self, owner: &str) -> Result<Vec<Chat>>;

    /// Remove one of the owner's chats.
    fn delete(&mut self, owner: &str, chat_id: &str) -> Result<()>;
}

fn newest_first(mut chats: Vec<Chat>) -> Vec<Chat> {
    chats.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    chats.truncate(HISTORY_LIMIT);
    chats
}

/// Chat store kept in memory.
#[derive(Debug, Default)]
pub struct MemoryChatStore {
    chats: HashMap<(String, String), Chat>,
}

impl MemoryChatStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChatStore for MemoryChatStore {
    fn save(&mut self, mut chat: Chat) -> Result<Chat> {
        chat.check()?;

        let key = (chat.owner.clone(), chat.chat_id.clone());
        if let Some(existing) = self.chats.get(&key) {
            chat.created_at = existing.created_at;
        }
        chat.updated_at = Utc::now();

        self.chats.insert(key, chat.clone());
        Ok(chat)
    }

    fn get(&self, owner: &str, chat_id: &str) -> Result<Chat> {
        self.chats
            .get(&(owner.to_string(), chat_id.to_string()))
            .cloned()
            .ok_or_else(|| Error::ChatNotFound(chat_id.to_string()))
    }

    fn list(&self, owner: &str) -> Result<Vec<Chat>> {
        let chats = self
            .chats
            .values()
            .filter(|chat| chat.owner == owner)
            .cloned()
            .collect();
        Ok(newest_first(chats))
    }

    fn delete(&mut self, owner: &str, chat_id: &str) -> Result<()> {
        self.chats
            .remove(&(owner.to_string(), chat_id.to_string()))
            .map(|_| ())
            .ok_or_else(|| Error::ChatNotFound(chat_id.to_string()))
    }
}

/// Chat store writing one JSON file per chat at `<root>/<owner>/<chat_id>.json`.
#[derive(Debug, Clone)]
pub struct DirChatStore {
    root: PathBuf,
}

impl DirChatStore {
    /// Use `root` as the store directory. It is created on first save.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn owner_dir(&self, owner: &str) -> Result<PathBuf> {
        if !ID_REGEX.is_match(owner) {
            return Err(Error::InvalidChat(format!("unusable owner '{}'", owner)));
        }
        Ok(self.root.join(owner))
    }

    fn chat_path(&self, owner: &str, chat_id: &str) -> Result<PathBuf> {
        if !ID_REGEX.is_match(chat_id) {
            return Err(Error::InvalidChat(format!("unusable chat id '{}'", chat_id)));
        }
        Ok(self.owner_dir(owner)?.join(format!("{}.json", chat_id)))
    }

    fn read_chat(path: &Path) -> Result<Chat> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

impl ChatStore for DirChatStore {
    fn save(&mut self, mut chat: Chat) -> Result<Chat> {
        chat.check()?;
        let path = self.chat_path(&chat.owner, &chat.chat_id)?;

        if path.exists() {
            chat.created_at = Self::read_chat(&path)?.created_at;
        }
        chat.updated_at = Utc::now();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, serde_json::to_string_pretty(&chat)?)?;
        log::debug!("Saved chat {} to {}", chat.chat_id, path.display());

        Ok(chat)
    }

    fn get(&self, owner: &str, chat_id: &str) -> Result<Chat> {
        let path = self.chat_path(owner, chat_id)?;
        if !path.exists() {
            return Err(Error::ChatNotFound(chat_id.to_string()));
        }
        Self::read_chat(&path)
    }

    fn list(&self, owner: &str) -> Result<Vec<Chat>> {
        let dir = self.owner_dir(owner)?;
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut chats = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match Self::read_chat(&path) {
                Ok(chat) => chats.push(chat),
                Err(e) => log::warn!("Skipping unreadable chat {}: {}", path.display(), e),
            }
        }

        Ok(newest_first(chats))
    }

    fn delete(&mut self, owner: &str, chat_id: &str) -> Result<()> {
        let path = self.chat_path(owner, chat_id)?;
        if !path.exists() {
            return Err(Error::ChatNotFound(chat_id.to_string()));
        }
        fs::remove_file(&path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Slide;
    use chrono::Duration;

    fn deck() -> Deck {
        Deck {
            title: "Deck".to_string(),
            subtitle: None,
            slides: vec![Slide::new("One", vec!["a".to_string()])],
        }
    }

    fn chat(owner: &str, id: &str) -> Chat {
        let mut chat = Chat::new(owner, id, "New Presentation");
        chat.push(ChatMessage::user("Make a deck"));
        chat.push(ChatMessage::assistant_deck("Here it is", deck()));
        chat
    }

    fn exercise_store(store: &mut dyn ChatStore) {
        let saved = store.save(chat("alice", "c1")).unwrap();
        assert_eq!(store.get("alice", "c1").unwrap().messages.len(), 2);

        // Upsert keeps creation time.
        let mut updated = saved.clone();
        updated.title = "Renamed".to_string();
        updated.created_at = saved.created_at + Duration::days(3);
        let resaved = store.save(updated).unwrap();
        assert_eq!(resaved.created_at, saved.created_at);
        assert_eq!(store.get("alice", "c1").unwrap().title, "Renamed");

        // Owners cannot see each other's chats.
        store.save(chat("bob", "c2")).unwrap();
        assert!(matches!(store.get("bob", "c1"), Err(Error::ChatNotFound(_))));
        assert_eq!(store.list("alice").unwrap().len(), 1);

        store.delete("alice", "c1").unwrap();
        assert!(matches!(store.delete("alice", "c1"), Err(Error::ChatNotFound(_))));
        assert!(store.list("alice").unwrap().is_empty());
    }

    #[test]
    fn test_memory_store() {
        exercise_store(&mut MemoryChatStore::new());
    }

    #[test]
    fn test_dir_store() {
        let dir = tempfile::tempdir().unwrap();
        exercise_store(&mut DirChatStore::new(dir.path()));
    }

    #[test]
    fn test_save_requires_id_and_title() {
        let mut store = MemoryChatStore::new();
        assert!(matches!(
            store.save(Chat::new("alice", "", "Title")),
            Err(Error::InvalidChat(_))
        ));
        assert!(matches!(
            store.save(Chat::new("alice", "c1", " ")),
            Err(Error::InvalidChat(_))
        ));
    }

    #[test]
    fn test_dir_store_rejects_path_like_ids() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = DirChatStore::new(dir.path());

        assert!(matches!(
            store.save(Chat::new("alice", "../escape", "T")),
            Err(Error::InvalidChat(_))
        ));
        assert!(matches!(
            store.get("../alice", "c1"),
            Err(Error::InvalidChat(_))
        ));
    }

    #[test]
    fn test_list_is_newest_first_and_limited() {
        let mut store = MemoryChatStore::new();
        for i in 0..(HISTORY_LIMIT + 5) {
            store.save(Chat::new("alice", format!("c{}", i), "T")).unwrap();
        }

        let chats = store.list("alice").unwrap();
        assert_eq!(chats.len(), HISTORY_LIMIT);
        assert!(chats
            .windows(2)
            .all(|pair| pair[0].updated_at >= pair[1].updated_at));
    }

    #[test]
    fn test_latest_deck() {
        let mut chat = chat("alice", "c1");
        chat.push(ChatMessage::assistant_error("Generation failed"));

        assert_eq!(chat.latest_deck().map(|d| d.title.as_str()), Some("Deck"));
        assert!(chat.messages[2].is_error);
    }

    #[test]
    fn test_dir_store_rejects_invalid_stored_deck() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = DirChatStore::new(dir.path());
        store.save(chat("alice", "c1")).unwrap();

        // Hand-edit the record so its deck breaks the slide limit.
        let path = dir.path().join("alice").join("c1.json");
        let mut record: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        record["messages"][1]["deck"]["slides"] = (1..=51)
            .map(|i| serde_json::json!({"title": format!("S{}", i), "content": ["a"]}))
            .collect();
        fs::write(&path, record.to_string()).unwrap();

        assert!(matches!(store.get("alice", "c1"), Err(Error::JsonError(_))));
        assert!(store.list("alice").unwrap().is_empty());
    }

    #[test]
    fn test_chat_json_shape() {
        let json = serde_json::to_value(chat("alice", "c1")).unwrap();
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][1]["deck"]["title"], "Deck");
        assert!(json["messages"][0].get("deck").is_none());
    }
}
