//! `posts/*`: the feed, likes and comments

use bytes::Bytes;
use serde_json::json;
use tracing::debug;

use super::Api;
use crate::cache::QueryCache;
use crate::error::{ClientError, ClientResult};
use crate::storage::CredentialStore;
use crate::transport::{id_segment, ApiRequest, HttpTransport, UploadPayload};
use crate::types::{Comment, Page, Post};
use crate::validation::{validate_post, ValidationErrors, MAX_POST_LEN};

/// A file attached to a new post
#[derive(Debug, Clone)]
pub struct Attachment {
    pub file_name: String,
    pub mime: String,
    pub bytes: Bytes,
}

impl<T: HttpTransport, S: CredentialStore> Api<T, S> {
    pub async fn feed(&self, page: u32) -> ClientResult<Page<Post>> {
        self.call_page(ApiRequest::get("posts/feed"), page).await
    }

    pub async fn create_post(
        &self,
        content: &str,
        location: Option<&str>,
        attachments: Vec<Attachment>,
    ) -> ClientResult<Post> {
        validate_post(content, attachments.len()).into_result()?;

        let mut payload = UploadPayload::new().field("content", content.trim());
        if let Some(location) = location.filter(|l| !l.trim().is_empty()) {
            payload = payload.field("location", location.trim());
        }
        for attachment in attachments {
            payload = payload.file("media", &attachment.file_name, &attachment.mime, attachment.bytes);
        }
        self.call(ApiRequest::post("posts").multipart(payload)).await
    }

    pub async fn like_post(&self, post_id: &str) -> ClientResult<Post> {
        let path = format!("posts/{}/like", id_segment(post_id)?);
        self.call(ApiRequest::post(path)).await
    }

    pub async fn unlike_post(&self, post_id: &str) -> ClientResult<Post> {
        let path = format!("posts/{}/like", id_segment(post_id)?);
        self.call(ApiRequest::delete(path)).await
    }

    /// Flip the like on a cached post right away, then reconcile with the
    /// server. The cached post is rolled back if the request fails.
    pub async fn toggle_like(&self, cache: &QueryCache<String, Post>, post_id: &str) -> ClientResult<Post> {
        let key = post_id.to_string();
        let ticket = cache
            .apply_optimistic(&key, Post::toggle_like)
            .ok_or_else(|| ClientError::UnexpectedResponse(format!("post {} is not loaded", post_id)))?;

        let result = if ticket.snapshot().liked_by_me {
            self.unlike_post(post_id).await
        } else {
            self.like_post(post_id).await
        };
        match result {
            Ok(post) => {
                cache.confirm(ticket, post.clone());
                Ok(post)
            }
            Err(e) => {
                debug!(%post_id, error = %e, "Like failed, rolling back");
                cache.rollback(ticket);
                Err(e)
            }
        }
    }

    pub async fn comment(&self, post_id: &str, content: &str) -> ClientResult<Comment> {
        let content = content.trim();
        let mut errors = ValidationErrors::new();
        if content.is_empty() {
            errors.add("content", "Write a comment");
        } else if content.chars().count() > MAX_POST_LEN {
            errors.add("content", format!("Comments are limited to {} characters", MAX_POST_LEN));
        }
        errors.into_result()?;

        let path = format!("posts/{}/comments", id_segment(post_id)?);
        let request = ApiRequest::post(path)
            .json(&json!({ "content": content }))?;
        self.call(request).await
    }

    pub async fn delete_post(&self, post_id: &str) -> ClientResult<Option<String>> {
        let path = format!("posts/{}", id_segment(post_id)?);
        self.call_ack(ApiRequest::delete(path)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::*;
    use crate::transport::{Method, RequestBody};
    use serde_json::Value;

    fn post_json(id: &str, likes: u32, liked: bool) -> Value {
        json!({
            "id": id,
            "author": summary_json("u2"),
            "content": "Sunrise over Sintra",
            "likeCount": likes,
            "likedByMe": liked,
            "createdAt": "2024-05-01T07:00:00Z"
        })
    }

    #[tokio::test]
    async fn test_feed_page() {
        let api = signed_in_api();
        api.client().transport().push_json(
            200,
            json!({ "data": { "attributes": [post_json("p1", 0, false), post_json("p2", 1, true)] } }),
        );
        let page = api.feed(1).await.unwrap();
        assert_eq!(page.items.len(), 2);
        // Full page of the configured size without meta: assume more
        assert!(page.has_more);
    }

    #[tokio::test]
    async fn test_create_post_multipart() {
        let api = signed_in_api();
        api.client().transport().push_json(201, ok(post_json("p9", 0, false)));
        let attachment = Attachment {
            file_name: "a.jpg".into(),
            mime: "image/jpeg".into(),
            bytes: Bytes::from_static(&[0xFF, 0xD8]),
        };
        let post = api.create_post("  Hello  ", Some("Sintra"), vec![attachment]).await.unwrap();
        assert_eq!(post.id, "p9");

        let call = api.client().transport().last_call().unwrap();
        let RequestBody::Multipart(payload) = call.body else {
            panic!("expected multipart");
        };
        assert_eq!(payload.field_value("content"), Some("Hello"));
        assert_eq!(payload.field_value("location"), Some("Sintra"));
        assert_eq!(payload.files().count(), 1);
    }

    #[tokio::test]
    async fn test_empty_post_rejected() {
        let api = signed_in_api();
        assert!(matches!(
            api.create_post("  ", None, vec![]).await,
            Err(ClientError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_toggle_like_confirms_with_server_value() {
        let api = signed_in_api();
        let cache = QueryCache::new();
        let sub = cache.subscribe("p1".to_string());
        let post: Post = serde_json::from_value(post_json("p1", 4, false)).unwrap();
        cache.set(&"p1".to_string(), post);

        api.client().transport().push_json(200, ok(post_json("p1", 7, true)));
        let confirmed = api.toggle_like(&cache, "p1").await.unwrap();
        assert_eq!(confirmed.like_count, 7);
        assert_eq!(sub.current().unwrap().like_count, 7);

        let call = api.client().transport().last_call().unwrap();
        assert_eq!((call.method, call.path.as_str()), (Method::Post, "posts/p1/like"));
    }

    #[tokio::test]
    async fn test_post_ids_are_encoded_into_one_segment() {
        let api = signed_in_api();
        api.client().transport().push_json(200, ok(post_json("p1", 1, true)));
        api.like_post("../users/me").await.unwrap();
        let call = api.client().transport().last_call().unwrap();
        assert_eq!(call.path, "posts/..%2Fusers%2Fme/like");

        assert!(matches!(
            api.delete_post("..").await,
            Err(ClientError::Validation(_))
        ));
        assert_eq!(api.client().transport().calls().len(), 1);
    }

    #[tokio::test]
    async fn test_toggle_like_rolls_back_on_failure() {
        let api = signed_in_api();
        let cache = QueryCache::new();
        let sub = cache.subscribe("p1".to_string());
        let post: Post = serde_json::from_value(post_json("p1", 4, true)).unwrap();
        cache.set(&"p1".to_string(), post.clone());

        api.client()
            .transport()
            .push_json(500, json!({ "message": "Database unavailable" }));
        let err = api.toggle_like(&cache, "p1").await.unwrap_err();
        assert_eq!(err.to_string(), "API error (500): Database unavailable");
        assert_eq!(sub.current(), Some(post));

        let call = api.client().transport().last_call().unwrap();
        assert_eq!(call.method, Method::Delete);
    }

    #[tokio::test]
    async fn test_comment() {
        let api = signed_in_api();
        api.client().transport().push_json(
            201,
            ok(json!({ "id": "c1", "postId": "p1", "author": summary_json("u1"), "content": "Lovely", "createdAt": "2024-05-01T08:00:00Z" })),
        );
        let comment = api.comment("p1", " Lovely ").await.unwrap();
        assert_eq!(comment.post_id, "p1");
        assert_eq!(
            api.client().transport().last_call().unwrap().body,
            RequestBody::Json(json!({ "content": "Lovely" }))
        );
        assert!(api.comment("p1", "").await.is_err());
    }

    #[tokio::test]
    async fn test_delete_post() {
        let api = signed_in_api();
        api.client().transport().push_json(200, json!({ "message": "Post deleted" }));
        assert_eq!(api.delete_post("p1").await.unwrap().as_deref(), Some("Post deleted"));
    }
}
