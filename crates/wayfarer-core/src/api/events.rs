//! `events/*`

use super::Api;
use crate::error::ClientResult;
use crate::storage::CredentialStore;
use crate::transport::{id_segment, ApiRequest, HttpTransport};
use crate::types::event::NewEvent;
use crate::types::{Event, Page};
use crate::validation::validate_event;

impl<T: HttpTransport, S: CredentialStore> Api<T, S> {
    pub async fn events(&self, page: u32) -> ClientResult<Page<Event>> {
        self.call_page(ApiRequest::get("events"), page).await
    }

    pub async fn create_event(&self, event: &NewEvent) -> ClientResult<Event> {
        validate_event(&event.title, &event.location, event.starts_at, event.ends_at)
            .into_result()?;
        self.call(ApiRequest::post("events").json(event)?).await
    }

    pub async fn attend_event(&self, event_id: &str) -> ClientResult<Event> {
        let path = format!("events/{}/attend", id_segment(event_id)?);
        self.call(ApiRequest::post(path)).await
    }
}
