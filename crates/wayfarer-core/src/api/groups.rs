//! `groups/*`

use super::Api;
use crate::error::ClientResult;
use crate::storage::CredentialStore;
use crate::transport::{id_segment, ApiRequest, HttpTransport};
use crate::types::group::NewGroup;
use crate::types::{Group, Page};
use crate::validation::validate_group;

impl<T: HttpTransport, S: CredentialStore> Api<T, S> {
    pub async fn groups(&self, page: u32) -> ClientResult<Page<Group>> {
        self.call_page(ApiRequest::get("groups"), page).await
    }

    pub async fn create_group(&self, group: &NewGroup) -> ClientResult<Group> {
        validate_group(&group.name, &group.description).into_result()?;
        self.call(ApiRequest::post("groups").json(group)?).await
    }

    pub async fn join_group(&self, group_id: &str) -> ClientResult<Group> {
        let path = format!("groups/{}/join", id_segment(group_id)?);
        self.call(ApiRequest::post(path)).await
    }

    pub async fn leave_group(&self, group_id: &str) -> ClientResult<Group> {
        let path = format!("groups/{}/leave", id_segment(group_id)?);
        self.call(ApiRequest::post(path)).await
    }
}
