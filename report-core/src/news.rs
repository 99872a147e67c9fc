//! Articles from the public demo posts API.

use anyhow::{Context, Result, anyhow};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

const DUMMYJSON_URL: &str = "https://dummyjson.com";
const EXCERPT_CHARS: usize = 100;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reactions {
    pub likes: u64,
    pub dislikes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: u64,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub user_id: u64,
    #[serde(default)]
    pub reactions: Reactions,
}

impl Post {
    /// First 100 characters of the body followed by "....".
    pub fn excerpt(&self) -> String {
        let head: String = self.body.chars().take(EXCERPT_CHARS).collect();
        format!("{head}....")
    }
}

#[derive(Debug, Deserialize)]
struct PostsPage {
    posts: Vec<Post>,
}

#[derive(Debug, Clone)]
pub struct NewsClient {
    base_url: String,
    http: Client,
}

impl Default for NewsClient {
    fn default() -> Self {
        Self::new()
    }
}

impl NewsClient {
    pub fn new() -> Self {
        Self::new_with_base_url(DUMMYJSON_URL)
    }

    pub fn new_with_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: crate::http::client(),
        }
    }

    /// Home page listing.
    pub async fn posts(&self) -> Result<Vec<Post>> {
        let url = format!("{}/posts", self.base_url);
        debug!(%url, "fetching posts");

        let res = self
            .http
            .get(&url)
            .send()
            .await
            .context("Failed to fetch posts")?;

        if !res.status().is_success() {
            return Err(anyhow!("Failed to fetch posts: {}", res.status()));
        }

        let page: PostsPage = res.json().await.context("Failed to parse posts JSON")?;
        Ok(page.posts)
    }

    /// A single article.
    pub async fn post(&self, id: u64) -> Result<Post> {
        let url = format!("{}/posts/{}", self.base_url, id);
        debug!(%url, "fetching post");

        let res = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch post {id}"))?;

        if !res.status().is_success() {
            return Err(anyhow!("Failed to fetch post {}: {}", id, res.status()));
        }

        res.json()
            .await
            .with_context(|| format!("Failed to parse post {id} JSON"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_post(id: u64, title: &str, body: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "title": title,
            "body": body,
            "tags": ["history", "crime"],
            "views": 305,
            "userId": 121,
            "reactions": { "likes": 192, "dislikes": 25 }
        })
    }

    #[test]
    fn excerpt_truncates_by_characters() {
        let post: Post = serde_json::from_value(test_post(1, "t", &"é".repeat(150))).unwrap();
        let excerpt = post.excerpt();
        assert_eq!(excerpt.chars().count(), 104);
        assert!(excerpt.ends_with("é...."));
    }

    #[test]
    fn short_body_still_gets_ellipsis() {
        let post: Post = serde_json::from_value(test_post(1, "t", "Short.")).unwrap();
        assert_eq!(post.excerpt(), "Short.....");
    }

    #[test]
    fn post_deserialization() {
        let post: Post = serde_json::from_value(test_post(7, "His mother had always taught him", "b")).unwrap();
        assert_eq!(post.id, 7);
        assert_eq!(post.user_id, 121);
        assert_eq!(post.tags, vec!["history", "crime"]);
        assert_eq!(post.reactions.likes, 192);
    }

    #[tokio::test]
    async fn lists_posts() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/posts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "posts": [test_post(1, "First", "one"), test_post(2, "Second", "two")],
                "total": 2,
                "skip": 0,
                "limit": 30
            })))
            .mount(&mock_server)
            .await;

        let client = NewsClient::new_with_base_url(&mock_server.uri());
        let posts = client.posts().await.unwrap();

        assert_eq!(posts.len(), 2);
        assert_eq!(posts[1].title, "Second");
    }

    #[tokio::test]
    async fn fetches_single_post() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/posts/5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(test_post(5, "Fifth", "body")))
            .mount(&mock_server)
            .await;

        let client = NewsClient::new_with_base_url(&mock_server.uri());
        let post = client.post(5).await.unwrap();
        assert_eq!(post.title, "Fifth");
    }

    #[tokio::test]
    async fn listing_failure_is_an_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let client = NewsClient::new_with_base_url(&mock_server.uri());
        let err = client.posts().await.unwrap_err();
        assert!(err.to_string().contains("Failed to fetch posts"));
    }

    #[tokio::test]
    async fn missing_post_is_an_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let client = NewsClient::new_with_base_url(&mock_server.uri());
        let err = client.post(999).await.unwrap_err();
        assert!(err.to_string().contains("Failed to fetch post 999"));
    }
}
