//! `messages/*`: chats and their messages

use serde_json::json;

use super::Api;
use crate::error::ClientResult;
use crate::storage::CredentialStore;
use crate::transport::{id_segment, ApiRequest, HttpTransport};
use crate::types::{Chat, Message, Page};
use crate::validation::{ValidationErrors, MAX_POST_LEN};

impl<T: HttpTransport, S: CredentialStore> Api<T, S> {
    pub async fn chats(&self, page: u32) -> ClientResult<Page<Chat>> {
        self.call_page(ApiRequest::get("messages/chats"), page)
            .await
    }

    pub async fn messages(&self, chat_id: &str, page: u32) -> ClientResult<Page<Message>> {
        let path = format!("messages/chats/{}", id_segment(chat_id)?);
        self.call_page(ApiRequest::get(path), page).await
    }

    pub async fn send_message(&self, chat_id: &str, content: &str) -> ClientResult<Message> {
        let content = content.trim();
        let mut errors = ValidationErrors::new();
        if content.is_empty() {
            errors.add("content", "Message cannot be empty");
        } else if content.chars().count() > MAX_POST_LEN {
            errors.add("content", format!("Messages are limited to {} characters", MAX_POST_LEN));
        }
        errors.into_result()?;

        let path = format!("messages/chats/{}", id_segment(chat_id)?);
        let request = ApiRequest::post(path)
            .json(&json!({ "content": content }))?;
        self.call(request).await
    }

    /// Open (or reuse) a one-to-one chat with `user_id`
    pub async fn start_chat(&self, user_id: &str) -> ClientResult<Chat> {
        let request = ApiRequest::post("messages/chats").json(&json!({ "participantId": user_id }))?;
        self.call(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::*;
    use crate::error::ClientError;
    use crate::realtime::{Inbox, RealtimeEvent};

    fn message_json(id: &str) -> serde_json::Value {
        json!({ "id": id, "chatId": "c1", "sender": summary_json("u2"), "content": "Olá", "createdAt": "2024-05-01T10:00:00Z" })
    }

    #[tokio::test]
    async fn test_chats_feed_the_inbox() {
        let api = signed_in_api();
        let transport = api.client().transport();
        transport.push_json(200, json!({ "data": { "attributes": [{ "id": "c1" }, { "id": "c2" }] } }));
        transport.push_json(200, json!({ "data": { "attributes": [message_json("m1")] } }));

        let mut inbox = Inbox::new("u1");
        inbox.load_chats(api.chats(1).await.unwrap());
        inbox.load_messages("c1", api.messages("c1", 1).await.unwrap());
        assert_eq!(transport.last_call().unwrap().path, "messages/chats/c1");

        // A push for an already loaded message is a no-op
        let pushed: Message = serde_json::from_value(message_json("m1")).unwrap();
        assert!(inbox.apply(RealtimeEvent::NewMessage(pushed)).is_none());
        assert_eq!(inbox.chats().len(), 2);
    }

    #[tokio::test]
    async fn test_send_message() {
        let api = signed_in_api();
        api.client().transport().push_json(201, ok(message_json("m2")));
        let sent = api.send_message("c1", "  Olá ").await.unwrap();
        assert_eq!(sent.id, "m2");
        assert!(matches!(
            api.send_message("c1", " ").await,
            Err(ClientError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_start_chat() {
        let api = signed_in_api();
        api.client().transport().push_json(201, ok(json!({ "id": "c7" })));
        assert_eq!(api.start_chat("u9").await.unwrap().id, "c7");
    }
}
