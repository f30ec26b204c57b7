//! `notifications/*`

use super::Api;
use crate::error::ClientResult;
use crate::storage::CredentialStore;
use crate::transport::{id_segment, ApiRequest, HttpTransport};
use crate::types::{Notification, Page};

impl<T: HttpTransport, S: CredentialStore> Api<T, S> {
    pub async fn notifications(&self, page: u32) -> ClientResult<Page<Notification>> {
        self.call_page(ApiRequest::get("notifications"), page).await
    }

    pub async fn mark_notification_read(&self, notification_id: &str) -> ClientResult<Option<String>> {
        let path = format!("notifications/{}/read", id_segment(notification_id)?);
        self.call_ack(ApiRequest::patch(path)).await
    }

    pub async fn mark_all_notifications_read(&self) -> ClientResult<Option<String>> {
        self.call_ack(ApiRequest::patch("notifications/read-all"))
            .await
    }
}
