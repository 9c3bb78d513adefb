use uuid::Uuid;

use crate::errors::{ClientError, ClientResult};
use crate::models::chat::Chat;
use crate::models::message::Message;

/// Append-only, chat-indexed message log.
///
/// Message mutations flow through the stream session controller; the only
/// direct collaborator mutations are chat creation, deletion, selection and
/// wholesale replacement when hydrating from the backend or a snapshot.
/// The store does no locking of its own: callers keep all mutation on one
/// logical thread, or add their own mutex or actor boundary.
#[derive(Debug, Default)]
pub struct ChatStore {
    chats: Vec<Chat>,
    selected: Option<Uuid>,
}

impl ChatStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole collection, dropping any selection.
    pub fn replace_all(&mut self, chats: Vec<Chat>) {
        self.selected = None;
        self.chats = chats;
    }

    /// Create a chat titled after the initial input and select it.
    pub fn create_chat(&mut self, initial_title: &str) -> Uuid {
        let chat = Chat::new(Chat::derive_title(initial_title));
        let id = chat.id;
        self.chats.push(chat);
        self.selected = Some(id);
        id
    }

    pub fn append_message(&mut self, chat_id: Uuid, message: Message) -> ClientResult<()> {
        let chat = self
            .chats
            .iter_mut()
            .find(|chat| chat.id == chat_id)
            .ok_or(ClientError::UnknownChat(chat_id))?;
        chat.messages.push(message);
        Ok(())
    }

    /// Chats in creation order; display order is the presentation layer's
    /// concern and each chat carries its creation timestamp.
    pub fn list_chats(&self) -> &[Chat] {
        &self.chats
    }

    pub fn chat(&self, chat_id: Uuid) -> Option<&Chat> {
        self.chats.iter().find(|chat| chat.id == chat_id)
    }

    /// Remove a chat; if it was selected the selection clears.
    pub fn delete_chat(&mut self, chat_id: Uuid) {
        self.chats.retain(|chat| chat.id != chat_id);
        if self.selected == Some(chat_id) {
            self.selected = None;
        }
    }

    pub fn select_chat(&mut self, chat_id: Uuid) -> ClientResult<()> {
        if self.chat(chat_id).is_none() {
            return Err(ClientError::UnknownChat(chat_id));
        }
        self.selected = Some(chat_id);
        Ok(())
    }

    pub fn selected_chat(&self) -> Option<&Chat> {
        self.selected.and_then(|id| self.chat(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::role::Role;

    #[test]
    fn test_create_chat_derives_title_and_selects() {
        let mut store = ChatStore::new();
        let id = store.create_chat("Build me a ride sharing app for pets please");
        let chat = store.chat(id).unwrap();
        assert_eq!(chat.title.chars().count(), 30);
        assert_eq!(store.selected_chat().unwrap().id, id);
    }

    #[test]
    fn test_messages_append_in_order() {
        let mut store = ChatStore::new();
        let id = store.create_chat("idea");
        store.append_message(id, Message::user("one")).unwrap();
        store.append_message(id, Message::assistant("two")).unwrap();
        store.append_message(id, Message::assistant("three")).unwrap();

        let contents: Vec<&str> = store
            .chat(id)
            .unwrap()
            .messages
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, vec!["one", "two", "three"]);
        assert_eq!(store.chat(id).unwrap().messages[0].role, Role::User);
    }

    #[test]
    fn test_append_to_unknown_chat_fails() {
        let mut store = ChatStore::new();
        let missing = Uuid::new_v4();
        assert!(matches!(
            store.append_message(missing, Message::user("x")),
            Err(ClientError::UnknownChat(id)) if id == missing
        ));
    }

    #[test]
    fn test_chats_keep_creation_order() {
        let mut store = ChatStore::new();
        let first = store.create_chat("first");
        let second = store.create_chat("second");
        let ids: Vec<Uuid> = store.list_chats().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![first, second]);
    }

    #[test]
    fn test_delete_clears_selection_only_for_deleted_chat() {
        let mut store = ChatStore::new();
        let first = store.create_chat("first");
        let second = store.create_chat("second");

        store.delete_chat(first);
        assert_eq!(store.selected_chat().unwrap().id, second);

        store.delete_chat(second);
        assert!(store.selected_chat().is_none());
        assert!(store.list_chats().is_empty());
    }

    #[test]
    fn test_replace_all_drops_selection() {
        let mut store = ChatStore::new();
        store.create_chat("old");
        store.replace_all(vec![Chat::new("restored")]);
        assert_eq!(store.list_chats().len(), 1);
        assert!(store.selected_chat().is_none());
    }

    #[test]
    fn test_select_unknown_chat_fails() {
        let mut store = ChatStore::new();
        assert!(store.select_chat(Uuid::new_v4()).is_err());
    }
}
