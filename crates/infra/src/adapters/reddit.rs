use std::env;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde::Deserialize;
use url::Url;

use application::interfaces::platform::PlatformAdapter;
use domain::value_objects::analytics::ActivityItem;
use domain::value_objects::enums::platforms::Platform;
use domain::value_objects::platform_api::{
    AccountMetrics, AdapterError, AuthorizationRequest, PlatformIdentity, PostMetrics,
    PublishSuccess, TokenResult,
};

use super::{read_json, transport_error};

const AUTHORIZE_URL: &str = "https://www.reddit.com/api/v1/authorize";
const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
const OAUTH_BASE: &str = "https://oauth.reddit.com";
const OAUTH_SCOPES: &str = "identity submit read history";

/// Reddit titles are capped at 300 characters.
const TITLE_LIMIT: usize = 300;

#[derive(Clone, Debug)]
pub struct RedditConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub user_agent: String,
}

impl RedditConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            client_id: env::var("REDDIT_CLIENT_ID").context("REDDIT_CLIENT_ID is required")?,
            client_secret: env::var("REDDIT_CLIENT_SECRET")
                .context("REDDIT_CLIENT_SECRET is required")?,
            redirect_uri: env::var("REDDIT_REDIRECT_URI")
                .context("REDDIT_REDIRECT_URI is required")?,
            user_agent: env::var("REDDIT_USER_AGENT")
                .unwrap_or_else(|_| "social-deck/0.1".to_string()),
        })
    }
}

pub struct RedditAdapter {
    http: reqwest::Client,
    config: RedditConfig,
}

impl RedditAdapter {
    pub fn new(config: RedditConfig) -> Result<Self> {
        Ok(Self {
            http: super::build_http_client()?,
            config,
        })
    }

    async fn me(&self, access_token: &str) -> Result<RedditMe, AdapterError> {
        let resp = self
            .http
            .get(format!("{OAUTH_BASE}/api/v1/me"))
            .bearer_auth(access_token)
            .header(reqwest::header::USER_AGENT, &self.config.user_agent)
            .send()
            .await
            .map_err(transport_error)?;

        read_json(resp, "reddit api/v1/me").await
    }
}

#[derive(Debug, Deserialize)]
struct RedditMe {
    id: String,
    name: String,
    #[serde(default)]
    link_karma: i32,
    #[serde(default)]
    comment_karma: i32,
    subreddit: Option<RedditProfileSubreddit>,
}

#[derive(Debug, Deserialize)]
struct RedditProfileSubreddit {
    #[serde(default)]
    subscribers: i32,
}

#[derive(Debug, Deserialize)]
struct SubmitEnvelope {
    json: SubmitBody,
}

#[derive(Debug, Deserialize)]
struct SubmitBody {
    #[serde(default)]
    errors: Vec<serde_json::Value>,
    data: Option<SubmitData>,
}

#[derive(Debug, Deserialize)]
struct SubmitData {
    id: Option<String>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListingEnvelope {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<ListingChild>,
}

#[derive(Debug, Deserialize)]
struct ListingChild {
    data: RedditPost,
}

#[derive(Debug, Deserialize)]
struct RedditPost {
    id: String,
    #[serde(default)]
    score: i32,
    #[serde(default)]
    num_comments: i32,
    #[serde(default)]
    created_utc: f64,
}

fn post_metrics_from(post: &RedditPost) -> PostMetrics {
    PostMetrics {
        likes: post.score,
        comments: post.num_comments,
        ..Default::default()
    }
}

/// Score plus comment count.
fn engagement_score(post: &RedditPost) -> i64 {
    (post.score + post.num_comments) as i64
}

fn title_of(content: &str) -> String {
    content.chars().take(TITLE_LIMIT).collect()
}

#[async_trait]
impl PlatformAdapter for RedditAdapter {
    fn platform(&self) -> Platform {
        Platform::Reddit
    }

    /// No PKCE; reddit relies on the client secret plus the state token.
    fn build_authorization_request(&self, state: &str) -> AuthorizationRequest {
        let mut url = Url::parse(AUTHORIZE_URL).expect("authorize url is valid");
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("response_type", "code")
            .append_pair("state", state)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("duration", "permanent")
            .append_pair("scope", OAUTH_SCOPES);

        AuthorizationRequest {
            redirect_url: url.into(),
            code_verifier: None,
        }
    }

    async fn exchange_code_for_token<'a>(
        &self,
        code: &str,
        _code_verifier: Option<&'a str>,
    ) -> Result<TokenResult, AdapterError> {
        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", &self.config.redirect_uri),
        ];

        let resp = self
            .http
            .post(TOKEN_URL)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .header(reqwest::header::USER_AGENT, &self.config.user_agent)
            .form(&form)
            .send()
            .await
            .map_err(transport_error)?;

        read_json(resp, "reddit token exchange").await
    }

    async fn fetch_identity(&self, access_token: &str) -> Result<PlatformIdentity, AdapterError> {
        let me = self.me(access_token).await?;
        Ok(PlatformIdentity {
            account_id: me.id,
            display_name: Some(me.name.clone()),
            handle: me.name,
        })
    }

    /// Submits a self post (or a link post for media) to the user's profile
    /// subreddit.
    async fn publish<'a>(
        &self,
        content: &str,
        access_token: &str,
        media_url: Option<&'a str>,
    ) -> Result<PublishSuccess, AdapterError> {
        let me = self.me(access_token).await?;
        let subreddit = format!("u_{}", me.name);
        let title = title_of(content);

        let mut form: Vec<(&str, String)> = vec![
            ("sr", subreddit),
            ("title", title),
            ("api_type", "json".to_string()),
            ("resubmit", "true".to_string()),
        ];
        match media_url {
            Some(url) => {
                form.push(("kind", "link".to_string()));
                form.push(("url", url.to_string()));
            }
            None => {
                form.push(("kind", "self".to_string()));
                form.push(("text", content.to_string()));
            }
        }

        let resp = self
            .http
            .post(format!("{OAUTH_BASE}/api/submit"))
            .bearer_auth(access_token)
            .header(reqwest::header::USER_AGENT, &self.config.user_agent)
            .form(&form)
            .send()
            .await
            .map_err(transport_error)?;

        let envelope: SubmitEnvelope = read_json(resp, "reddit submit").await?;
        if !envelope.json.errors.is_empty() {
            return Err(AdapterError::Provider {
                status: 200,
                detail: serde_json::to_string(&envelope.json.errors)
                    .unwrap_or_else(|_| "reddit submit rejected".to_string()),
            });
        }

        let data = envelope.json.data.ok_or_else(|| {
            AdapterError::MalformedResponse("reddit submit response missing data".to_string())
        })?;
        let id = data.id.ok_or_else(|| {
            AdapterError::MalformedResponse("reddit submit response missing post id".to_string())
        })?;

        Ok(PublishSuccess {
            platform_post_id: id,
            platform_url: data.url,
        })
    }

    async fn fetch_post_metrics(
        &self,
        platform_post_id: &str,
        access_token: &str,
    ) -> Result<PostMetrics, AdapterError> {
        let resp = self
            .http
            .get(format!("{OAUTH_BASE}/api/info"))
            .query(&[("id", format!("t3_{platform_post_id}"))])
            .bearer_auth(access_token)
            .header(reqwest::header::USER_AGENT, &self.config.user_agent)
            .send()
            .await
            .map_err(transport_error)?;

        let envelope: ListingEnvelope = read_json(resp, "reddit api/info").await?;
        let post = envelope.data.children.first().ok_or_else(|| {
            AdapterError::MalformedResponse(format!(
                "reddit api/info returned nothing for t3_{platform_post_id}"
            ))
        })?;

        Ok(post_metrics_from(&post.data))
    }

    async fn fetch_account_metrics(
        &self,
        access_token: &str,
    ) -> Result<AccountMetrics, AdapterError> {
        let me = self.me(access_token).await?;

        Ok(AccountMetrics {
            followers: me.subreddit.map(|s| s.subscribers).unwrap_or(0),
            total_likes: me.link_karma,
            total_comments: me.comment_karma,
            ..Default::default()
        })
    }

    async fn fetch_recent_activity(
        &self,
        access_token: &str,
    ) -> Result<Vec<ActivityItem>, AdapterError> {
        let me = self.me(access_token).await?;

        let resp = self
            .http
            .get(format!("{OAUTH_BASE}/user/{}/submitted", me.name))
            .query(&[("limit", "10")])
            .bearer_auth(access_token)
            .header(reqwest::header::USER_AGENT, &self.config.user_agent)
            .send()
            .await
            .map_err(transport_error)?;

        let envelope: ListingEnvelope = read_json(resp, "reddit submitted listing").await?;
        let items = envelope
            .data
            .children
            .into_iter()
            .map(|child| {
                let post = child.data;
                let created_at = Utc
                    .timestamp_opt(post.created_utc as i64, 0)
                    .single()
                    .unwrap_or_else(Utc::now);
                ActivityItem {
                    engagement_score: engagement_score(&post),
                    id: post.id,
                    platform: Platform::Reddit,
                    handle: me.name.clone(),
                    created_at,
                }
            })
            .collect();

        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn adapter() -> RedditAdapter {
        RedditAdapter::new(RedditConfig {
            client_id: "client-id".to_string(),
            client_secret: "client-secret".to_string(),
            redirect_uri: "https://app.example/api/v1/oauth/reddit/callback".to_string(),
            user_agent: "social-deck/test".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn authorization_request_has_no_verifier_and_asks_permanent_duration() {
        let request = adapter().build_authorization_request("state-token");
        assert!(request.code_verifier.is_none());

        let url = Url::parse(&request.redirect_url).unwrap();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        assert!(pairs.contains(&("state".to_string(), "state-token".to_string())));
        assert!(pairs.contains(&("duration".to_string(), "permanent".to_string())));
    }

    #[test]
    fn listing_post_maps_score_and_comments() {
        let envelope: ListingEnvelope = serde_json::from_value(json!({
            "data": {
                "children": [
                    { "data": { "id": "abc123", "score": 10, "num_comments": 3, "created_utc": 1700000000.0 } }
                ]
            }
        }))
        .unwrap();

        let post = &envelope.data.children[0].data;
        let metrics = post_metrics_from(post);
        assert_eq!(metrics.likes, 10);
        assert_eq!(metrics.comments, 3);
        assert_eq!(metrics.views, 0);
        assert_eq!(engagement_score(post), 13);
    }

    #[test]
    fn submit_envelope_surfaces_api_errors() {
        let envelope: SubmitEnvelope = serde_json::from_value(json!({
            "json": {
                "errors": [["RATELIMIT", "you are doing that too much", "ratelimit"]],
                "data": null
            }
        }))
        .unwrap();
        assert!(!envelope.json.errors.is_empty());

        let ok: SubmitEnvelope = serde_json::from_value(json!({
            "json": {
                "errors": [],
                "data": { "id": "xyz789", "url": "https://www.reddit.com/user/tester/comments/xyz789/" }
            }
        }))
        .unwrap();
        assert_eq!(ok.json.data.unwrap().id.unwrap(), "xyz789");
    }

    #[test]
    fn title_is_clamped_to_reddit_limit() {
        let long = "x".repeat(400);
        assert_eq!(title_of(&long).len(), TITLE_LIMIT);
        assert_eq!(title_of("short post"), "short post");
    }
}
