//! Local inbox: chats and their messages, merged from pages and pushes

use std::collections::HashMap;

use tracing::{debug, trace};

use super::RealtimeEvent;
use crate::pagination::PagedList;
use crate::types::{Chat, Identified, Message, Page};

/// What changed after an event was merged
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboxUpdate {
    ChatAdded { chat_id: String },
    ChatUpdated { chat_id: String },
    MessageAdded { chat_id: String, message_id: String },
}

/// Chats ordered by latest activity, plus loaded messages per chat
#[derive(Debug, Clone)]
pub struct Inbox {
    me: String,
    chats: PagedList<Chat>,
    messages: HashMap<String, PagedList<Message>>,
}

impl Inbox {
    /// Inbox for the signed-in user `me`
    pub fn new(me: impl Into<String>) -> Self {
        Self {
            me: me.into(),
            chats: PagedList::new(),
            messages: HashMap::new(),
        }
    }

    pub fn me(&self) -> &str {
        &self.me
    }

    /// Merge a page of chats from `GET messages/chats`
    pub fn load_chats(&mut self, page: Page<Chat>) -> usize {
        self.chats.append_page(page)
    }

    /// Merge a page of messages for one chat, keeping the thread oldest first
    pub fn load_messages(&mut self, chat_id: &str, page: Page<Message>) -> usize {
        let thread = self.messages.entry(chat_id.to_string()).or_default();
        let added = thread.append_page(page);
        if added > 0 {
            thread.sort_by_key(|m| m.created_at);
        }
        added
    }

    /// Apply a push event. `None` when it was ignored or already known.
    pub fn apply(&mut self, event: RealtimeEvent) -> Option<InboxUpdate> {
        match event {
            RealtimeEvent::NewMessage(message) => self.add_message(message),
            RealtimeEvent::NewChat(chat) => Some(self.add_chat(chat)),
            RealtimeEvent::MessageNotification { user_id, message } => {
                if user_id != self.me {
                    trace!(%user_id, "Ignoring notification for another user");
                    return None;
                }
                self.add_message(message)
            }
        }
    }

    fn add_chat(&mut self, chat: Chat) -> InboxUpdate {
        let chat_id = chat.id.clone();
        let known = self.chats.remove(&chat_id).is_some();
        self.chats.prepend(chat);
        if known {
            InboxUpdate::ChatUpdated { chat_id }
        } else {
            InboxUpdate::ChatAdded { chat_id }
        }
    }

    fn add_message(&mut self, message: Message) -> Option<InboxUpdate> {
        let chat_id = message.chat_id.clone();
        let thread = self.messages.entry(chat_id.clone()).or_default();
        if thread.contains(message.id()) {
            return None;
        }
        let in_order = thread
            .items()
            .last()
            .map_or(true, |last| last.created_at <= message.created_at);
        thread.append(std::iter::once(message.clone()));
        if !in_order {
            thread.sort_by_key(|m| m.created_at);
        }

        let unread = !message.is_from(&self.me);
        let mut chat = self.chats.remove(&chat_id).unwrap_or_else(|| Chat {
            id: chat_id.clone(),
            participants: vec![message.sender.clone()],
            last_message: None,
            unread_count: 0,
            updated_at: None,
        });
        if unread {
            chat.unread_count += 1;
        }
        let message_id = message.id.clone();
        let newest = chat
            .last_message
            .as_ref()
            .map_or(true, |last| last.created_at <= message.created_at);
        if newest {
            chat.updated_at = Some(message.created_at);
            chat.last_message = Some(message);
        }
        self.chats.prepend(chat);

        debug!(%chat_id, %message_id, unread, "Merged incoming message");
        Some(InboxUpdate::MessageAdded {
            chat_id,
            message_id,
        })
    }

    /// Chats, most recent activity first
    pub fn chats(&self) -> &[Chat] {
        self.chats.items()
    }

    pub fn chat(&self, chat_id: &str) -> Option<&Chat> {
        self.chats.get(chat_id)
    }

    /// Loaded messages of a chat, oldest first
    pub fn messages(&self, chat_id: &str) -> &[Message] {
        self.messages
            .get(chat_id)
            .map(|list| list.items())
            .unwrap_or(&[])
    }

    pub fn unread_total(&self) -> u32 {
        self.chats.iter().map(|c| c.unread_count).sum()
    }

    /// Reset a chat's unread counter after it was opened
    pub fn mark_read(&mut self, chat_id: &str) -> bool {
        match self.chats.get_mut(chat_id) {
            Some(chat) if chat.unread_count > 0 => {
                chat.unread_count = 0;
                true
            }
            _ => false,
        }
    }
}
