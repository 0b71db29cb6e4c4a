//! Ghost Admin API publishing store.

use crate::http::{json_body, transport};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Client;
use runtime::{ArticleDraft, ArticleSummary, DraftReceipt, PublishingStore, ServiceError};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

const ADMIN_PATH: &str = "ghost/api/admin/";
const ACCEPT_VERSION: &str = "v5.0";
const TOKEN_TTL_SECS: i64 = 300;
const PAGE_SIZE: u32 = 100;
/// Upper bound on pages followed in one listing.
const MAX_PAGES: u32 = 100;

/// Publishing store for a Ghost site.
///
/// Authenticates with an Admin API key of the form `id:secret`, where the
/// secret is hex. A short-lived token is signed for every request.
#[derive(Clone)]
pub struct GhostPublishingStore {
    client: Client,
    site: Url,
    admin: Url,
    key_id: String,
    secret: Vec<u8>,
}

impl GhostPublishingStore {
    pub fn new(site_url: &str, admin_api_key: &str) -> Result<Self, ServiceError> {
        let mut site = Url::parse(site_url)
            .map_err(|e| ServiceError::Config(format!("cms url {site_url:?}: {e}")))?;
        if !site.path().ends_with('/') {
            let path = format!("{}/", site.path());
            site.set_path(&path);
        }
        let admin = site
            .join(ADMIN_PATH)
            .map_err(|e| ServiceError::Config(e.to_string()))?;

        let (key_id, secret) = admin_api_key.split_once(':').ok_or_else(|| {
            ServiceError::Config("admin api key must look like <id>:<secret>".into())
        })?;
        let secret = hex::decode(secret.trim())
            .map_err(|e| ServiceError::Config(format!("admin api key secret is not hex: {e}")))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ServiceError::Config(e.to_string()))?;

        Ok(Self {
            client,
            site,
            admin,
            key_id: key_id.trim().to_string(),
            secret,
        })
    }

    fn token(&self) -> Result<String, ServiceError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            iat: now,
            exp: now + TOKEN_TTL_SECS,
            aud: "/admin/",
        };
        let mut header = Header::new(Algorithm::HS256);
        header.kid = Some(self.key_id.clone());
        jsonwebtoken::encode(&header, &claims, &EncodingKey::from_secret(&self.secret))
            .map_err(|e| ServiceError::Config(format!("signing admin token: {e}")))
    }

    fn endpoint(&self, path: &str) -> Result<Url, ServiceError> {
        self.admin
            .join(path)
            .map_err(|e| ServiceError::Config(e.to_string()))
    }

    fn editor_url(&self, id: &str) -> String {
        format!("{}ghost/#/editor/post/{id}", self.site)
    }
}

impl std::fmt::Debug for GhostPublishingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GhostPublishingStore")
            .field("site", &self.site.as_str())
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct Claims {
    iat: i64,
    exp: i64,
    aud: &'static str,
}

#[derive(Deserialize)]
struct PostsPage {
    posts: Vec<PostRecord>,
    #[serde(default)]
    meta: Option<PageMeta>,
}

#[derive(Deserialize)]
struct PageMeta {
    pagination: Pagination,
}

#[derive(Deserialize)]
struct Pagination {
    next: Option<u32>,
}

#[derive(Deserialize)]
struct PostRecord {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    slug: String,
    published_at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
struct NewPosts<'a> {
    posts: [NewPost<'a>; 1],
}

#[derive(Serialize)]
struct NewPost<'a> {
    title: &'a str,
    html: &'a str,
    status: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    custom_excerpt: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    meta_title: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    meta_description: &'a str,
    tags: Vec<NewTag<'a>>,
}

#[derive(Serialize)]
struct NewTag<'a> {
    name: &'a str,
}

#[derive(Deserialize)]
struct CreatedPosts {
    posts: Vec<CreatedPost>,
}

#[derive(Deserialize)]
struct CreatedPost {
    id: String,
}

#[async_trait]
impl PublishingStore for GhostPublishingStore {
    async fn list_articles(&self) -> Result<Vec<ArticleSummary>, ServiceError> {
        let url = self.endpoint("posts/")?;
        let limit = PAGE_SIZE.to_string();
        let mut articles = Vec::new();
        let mut page = 1;

        loop {
            let page_param = page.to_string();
            let response = self
                .client
                .get(url.clone())
                .header("Authorization", format!("Ghost {}", self.token()?))
                .header("Accept-Version", ACCEPT_VERSION)
                .query(&[
                    ("limit", limit.as_str()),
                    ("page", page_param.as_str()),
                    ("fields", "id,title,slug,published_at"),
                    ("order", "published_at desc"),
                ])
                .send()
                .await
                .map_err(transport)?;
            let body: PostsPage = json_body(response).await?;
            debug!(page, posts = body.posts.len(), "fetched article page");

            articles.extend(body.posts.into_iter().map(|p| ArticleSummary {
                id: p.id,
                title: p.title,
                slug: p.slug,
                published_at: p.published_at,
            }));

            match body.meta.and_then(|m| m.pagination.next) {
                Some(next) if next > page && next <= MAX_PAGES => page = next,
                _ => break,
            }
        }
        Ok(articles)
    }

    async fn create_draft(&self, draft: &ArticleDraft) -> Result<DraftReceipt, ServiceError> {
        let mut url = self.endpoint("posts/")?;
        url.query_pairs_mut().append_pair("source", "html");

        let body = NewPosts {
            posts: [NewPost {
                title: &draft.title,
                html: &draft.html,
                status: "draft",
                custom_excerpt: &draft.excerpt,
                meta_title: &draft.meta_title,
                meta_description: &draft.meta_description,
                tags: draft.tags.iter().map(|name| NewTag { name }).collect(),
            }],
        };

        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Ghost {}", self.token()?))
            .header("Accept-Version", ACCEPT_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(transport)?;
        let created: CreatedPosts = json_body(response).await?;
        let post = created
            .posts
            .into_iter()
            .next()
            .ok_or_else(|| ServiceError::Decode("no post in create response".into()))?;

        info!(id = %post.id, title = %draft.title, "ghost draft created");
        Ok(DraftReceipt {
            url: self.editor_url(&post.id),
            id: post.id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{DecodingKey, Validation};
    use serde_json::{Value, json};
    use wiremock::matchers::{body_partial_json, header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const KEY: &str = "6489a1b2c3d4e5f6a7b8c9d0:0123456789abcdef0123456789abcdef";

    fn post(id: &str, title: &str, slug: &str) -> Value {
        json!({"id": id, "title": title, "slug": slug, "published_at": "2024-05-01T09:00:00.000Z"})
    }

    #[test]
    fn token_is_signed_with_the_admin_secret() {
        let store = GhostPublishingStore::new("https://blog.example.com", KEY).unwrap();
        let token = store.token().unwrap();

        let header = jsonwebtoken::decode_header(&token).unwrap();
        assert_eq!(header.kid.as_deref(), Some("6489a1b2c3d4e5f6a7b8c9d0"));
        assert_eq!(header.alg, Algorithm::HS256);

        let secret = hex::decode("0123456789abcdef0123456789abcdef").unwrap();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&["/admin/"]);
        let data =
            jsonwebtoken::decode::<Value>(&token, &DecodingKey::from_secret(&secret), &validation)
                .unwrap();
        let claims = data.claims;
        assert_eq!(
            claims["exp"].as_i64().unwrap() - claims["iat"].as_i64().unwrap(),
            TOKEN_TTL_SECS
        );
    }

    #[test]
    fn rejects_malformed_keys_and_urls() {
        assert!(matches!(
            GhostPublishingStore::new("https://blog.example.com", "no-colon"),
            Err(ServiceError::Config(_))
        ));
        assert!(matches!(
            GhostPublishingStore::new("https://blog.example.com", "id:not-hex"),
            Err(ServiceError::Config(_))
        ));
        assert!(matches!(
            GhostPublishingStore::new("not a url", KEY),
            Err(ServiceError::Config(_))
        ));
    }

    #[tokio::test]
    async fn list_articles_follows_pagination() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ghost/api/admin/posts/"))
            .and(query_param("page", "1"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "posts": [post("1", "Pricing Wedding Flowers", "pricing-wedding-flowers")],
                "meta": {"pagination": {"page": 1, "pages": 2, "next": 2}}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/ghost/api/admin/posts/"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "posts": [post("2", "Sarah Chen Floral Journey", "sarah-chen-floral-journey")],
                "meta": {"pagination": {"page": 2, "pages": 2, "next": null}}
            })))
            .mount(&server)
            .await;

        let store = GhostPublishingStore::new(&server.uri(), KEY).unwrap();
        let articles = store.list_articles().await.unwrap();

        let slugs: Vec<_> = articles.iter().map(|a| a.slug.as_str()).collect();
        assert_eq!(slugs, ["pricing-wedding-flowers", "sarah-chen-floral-journey"]);
        assert!(articles[0].published_at.is_some());
    }

    #[tokio::test]
    async fn create_draft_posts_html_source() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ghost/api/admin/posts/"))
            .and(query_param("source", "html"))
            .and(body_partial_json(json!({
                "posts": [{
                    "title": "Kiln Safety Basics",
                    "status": "draft",
                    "tags": [{"name": "ceramics"}]
                }]
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "posts": [{"id": "abc123", "title": "Kiln Safety Basics", "status": "draft"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let store = GhostPublishingStore::new(&server.uri(), KEY).unwrap();
        let draft = ArticleDraft {
            title: "Kiln Safety Basics".into(),
            html: "<p>Wear gloves.</p>".into(),
            tags: vec!["ceramics".into()],
            ..Default::default()
        };
        let receipt = store.create_draft(&draft).await.unwrap();

        assert_eq!(receipt.id, "abc123");
        assert_eq!(receipt.url, format!("{}/ghost/#/editor/post/abc123", server.uri()));
    }

    #[tokio::test]
    async fn api_errors_carry_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad token"))
            .mount(&server)
            .await;

        let store = GhostPublishingStore::new(&server.uri(), KEY).unwrap();
        let err = store.list_articles().await.unwrap_err();
        assert!(
            matches!(err, ServiceError::Http { status: 401, ref body } if body == "bad token")
        );
    }
}
