//! `stories/*`: journeys

use super::Api;
use crate::error::ClientResult;
use crate::journey::JourneyDraft;
use crate::storage::CredentialStore;
use crate::transport::{id_segment, ApiRequest, HttpTransport};
use crate::types::{Journey, Page};

impl<T: HttpTransport, S: CredentialStore> Api<T, S> {
    /// Journeys from the user's connections
    pub async fn journeys(&self, page: u32) -> ClientResult<Page<Journey>> {
        self.call_page(ApiRequest::get("stories"), page).await
    }

    /// Render the draft and upload it
    pub async fn create_journey(&self, draft: JourneyDraft) -> ClientResult<Journey> {
        let payload = draft.into_payload(&self.compositor)?;
        self.call(ApiRequest::post("stories").multipart(payload))
            .await
    }

    pub async fn mark_journey_viewed(&self, journey_id: &str) -> ClientResult<Option<String>> {
        let path = format!("stories/{}/view", id_segment(journey_id)?);
        self.call_ack(ApiRequest::post(path)).await
    }
}
