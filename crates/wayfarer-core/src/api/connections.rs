//! `connections/*`: requests between travelers

use serde_json::json;

use super::Api;
use crate::error::ClientResult;
use crate::storage::CredentialStore;
use crate::transport::{id_segment, ApiRequest, HttpTransport};
use crate::types::{Connection, ConnectionStatus, Page};

impl<T: HttpTransport, S: CredentialStore> Api<T, S> {
    /// Connections, optionally filtered by status
    pub async fn connections(
        &self,
        page: u32,
        status: Option<ConnectionStatus>,
    ) -> ClientResult<Page<Connection>> {
        let mut request = ApiRequest::get("connections");
        if let Some(status) = status {
            request = request.query("status", status);
        }
        self.call_page(request, page).await
    }

    pub async fn request_connection(&self, user_id: &str) -> ClientResult<Connection> {
        let request = ApiRequest::post("connections").json(&json!({ "recipientId": user_id }))?;
        self.call(request).await
    }

    pub async fn accept_connection(&self, connection_id: &str) -> ClientResult<Connection> {
        self.respond_to_connection(connection_id, ConnectionStatus::Accepted)
            .await
    }

    pub async fn reject_connection(&self, connection_id: &str) -> ClientResult<Connection> {
        self.respond_to_connection(connection_id, ConnectionStatus::Rejected)
            .await
    }

    pub async fn remove_connection(&self, connection_id: &str) -> ClientResult<Option<String>> {
        let path = format!("connections/{}", id_segment(connection_id)?);
        self.call_ack(ApiRequest::delete(path)).await
    }

    async fn respond_to_connection(
        &self,
        connection_id: &str,
        status: ConnectionStatus,
    ) -> ClientResult<Connection> {
        let path = format!("connections/{}", id_segment(connection_id)?);
        let request = ApiRequest::patch(path)
            .json(&json!({ "status": status }))?;
        self.call(request).await
    }
}
