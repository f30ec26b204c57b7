//! `search`: users, posts and groups by free text

use serde::Deserialize;

use super::Api;
use crate::error::ClientResult;
use crate::storage::CredentialStore;
use crate::transport::{ApiRequest, HttpTransport};
use crate::types::{Group, Post, UserSummary};

/// What to search for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchScope {
    #[default]
    All,
    Users,
    Posts,
    Groups,
}

impl SearchScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchScope::All => "all",
            SearchScope::Users => "users",
            SearchScope::Posts => "posts",
            SearchScope::Groups => "groups",
        }
    }
}

impl std::str::FromStr for SearchScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(SearchScope::All),
            "users" | "people" => Ok(SearchScope::Users),
            "posts" => Ok(SearchScope::Posts),
            "groups" => Ok(SearchScope::Groups),
            other => Err(format!("unknown search scope '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SearchResults {
    #[serde(default)]
    pub users: Vec<UserSummary>,
    #[serde(default)]
    pub posts: Vec<Post>,
    #[serde(default)]
    pub groups: Vec<Group>,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.users.is_empty() && self.posts.is_empty() && self.groups.is_empty()
    }
}

impl<T: HttpTransport, S: CredentialStore> Api<T, S> {
    /// Blank queries return no results without a request
    pub async fn search(&self, query: &str, scope: SearchScope) -> ClientResult<SearchResults> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(SearchResults::default());
        }
        let request = ApiRequest::get("search")
            .query("q", query)
            .query("type", scope.as_str());
        self.call(request).await
    }
}
