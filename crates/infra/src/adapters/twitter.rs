use std::env;

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use url::Url;

use application::interfaces::platform::PlatformAdapter;
use domain::value_objects::analytics::ActivityItem;
use domain::value_objects::enums::platforms::Platform;
use domain::value_objects::platform_api::{
    AccountMetrics, AdapterError, AuthorizationRequest, PlatformIdentity, PostMetrics,
    PublishSuccess, TokenResult,
};

use super::{read_json, transport_error};

const AUTHORIZE_URL: &str = "https://twitter.com/i/oauth2/authorize";
const TOKEN_URL: &str = "https://api.twitter.com/2/oauth2/token";
const API_BASE: &str = "https://api.twitter.com/2";
const OAUTH_SCOPES: &str = "tweet.read tweet.write users.read offline.access";

#[derive(Clone, Debug)]
pub struct TwitterConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

impl TwitterConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            client_id: env::var("TWITTER_CLIENT_ID").context("TWITTER_CLIENT_ID is required")?,
            client_secret: env::var("TWITTER_CLIENT_SECRET")
                .context("TWITTER_CLIENT_SECRET is required")?,
            redirect_uri: env::var("TWITTER_REDIRECT_URI")
                .context("TWITTER_REDIRECT_URI is required")?,
        })
    }
}

pub struct TwitterAdapter {
    http: reqwest::Client,
    config: TwitterConfig,
}

impl TwitterAdapter {
    pub fn new(config: TwitterConfig) -> Result<Self> {
        Ok(Self {
            http: super::build_http_client()?,
            config,
        })
    }

    async fn me(&self, access_token: &str, fields: Option<&str>) -> Result<TwitterUser, AdapterError> {
        let mut request = self
            .http
            .get(format!("{API_BASE}/users/me"))
            .bearer_auth(access_token);
        if let Some(fields) = fields {
            request = request.query(&[("user.fields", fields)]);
        }

        let resp = request.send().await.map_err(transport_error)?;
        let envelope: TwitterUserEnvelope = read_json(resp, "twitter users/me").await?;
        Ok(envelope.data)
    }
}

/// Generates the PKCE verifier and its S256 challenge. The verifier is 43
/// characters of base64url, inside the 43..=128 range RFC 7636 allows.
fn generate_pkce_pair() -> (String, String) {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    let verifier = URL_SAFE_NO_PAD.encode(bytes);
    let challenge = URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()));
    (verifier, challenge)
}

#[derive(Debug, Deserialize)]
struct TwitterUserEnvelope {
    data: TwitterUser,
}

#[derive(Debug, Deserialize)]
struct TwitterUser {
    id: String,
    username: String,
    name: Option<String>,
    public_metrics: Option<TwitterUserMetrics>,
}

#[derive(Debug, Deserialize)]
struct TwitterUserMetrics {
    #[serde(default)]
    followers_count: i32,
    #[serde(default)]
    following_count: i32,
    #[serde(default)]
    tweet_count: i32,
}

#[derive(Debug, Deserialize)]
struct TweetEnvelope {
    data: Tweet,
}

#[derive(Debug, Deserialize)]
struct TweetListEnvelope {
    #[serde(default)]
    data: Vec<Tweet>,
}

#[derive(Debug, Deserialize)]
struct Tweet {
    id: String,
    created_at: Option<DateTime<Utc>>,
    public_metrics: Option<TweetMetrics>,
}

#[derive(Debug, Deserialize, Default)]
struct TweetMetrics {
    #[serde(default)]
    retweet_count: i32,
    #[serde(default)]
    reply_count: i32,
    #[serde(default)]
    like_count: i32,
    #[serde(default)]
    quote_count: i32,
    #[serde(default)]
    impression_count: i32,
}

#[derive(Debug, Deserialize)]
struct CreatedTweetEnvelope {
    data: CreatedTweet,
}

#[derive(Debug, Deserialize)]
struct CreatedTweet {
    id: String,
}

fn post_metrics_from(metrics: &TweetMetrics) -> PostMetrics {
    PostMetrics {
        likes: metrics.like_count,
        comments: metrics.reply_count,
        shares: metrics.retweet_count + metrics.quote_count,
        views: 0,
        impressions: metrics.impression_count,
        clicks: 0,
    }
}

/// Likes plus replies plus retweets (quotes count as retweets).
fn engagement_score(metrics: &TweetMetrics) -> i64 {
    (metrics.like_count + metrics.reply_count + metrics.retweet_count + metrics.quote_count) as i64
}

fn tweet_url(id: &str) -> String {
    format!("https://twitter.com/i/web/status/{id}")
}

#[async_trait]
impl PlatformAdapter for TwitterAdapter {
    fn platform(&self) -> Platform {
        Platform::Twitter
    }

    fn build_authorization_request(&self, state: &str) -> AuthorizationRequest {
        let (verifier, challenge) = generate_pkce_pair();

        let mut url = Url::parse(AUTHORIZE_URL).expect("authorize url is valid");
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("scope", OAUTH_SCOPES)
            .append_pair("state", state)
            .append_pair("code_challenge", &challenge)
            .append_pair("code_challenge_method", "S256");

        AuthorizationRequest {
            redirect_url: url.into(),
            code_verifier: Some(verifier),
        }
    }

    async fn exchange_code_for_token<'a>(
        &self,
        code: &str,
        code_verifier: Option<&'a str>,
    ) -> Result<TokenResult, AdapterError> {
        let verifier = code_verifier.ok_or_else(|| {
            AdapterError::MalformedResponse("twitter exchange requires a pkce verifier".to_string())
        })?;

        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", &self.config.redirect_uri),
            ("code_verifier", verifier),
        ];

        let resp = self
            .http
            .post(TOKEN_URL)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&form)
            .send()
            .await
            .map_err(transport_error)?;

        read_json(resp, "twitter token exchange").await
    }

    async fn fetch_identity(&self, access_token: &str) -> Result<PlatformIdentity, AdapterError> {
        let user = self.me(access_token, None).await?;
        Ok(PlatformIdentity {
            account_id: user.id,
            handle: user.username,
            display_name: user.name,
        })
    }

    async fn publish<'a>(
        &self,
        content: &str,
        access_token: &str,
        media_url: Option<&'a str>,
    ) -> Result<PublishSuccess, AdapterError> {
        // No media upload endpoint here; a media link rides along in the text.
        let text = match media_url {
            Some(url) => format!("{content} {url}"),
            None => content.to_string(),
        };

        let resp = self
            .http
            .post(format!("{API_BASE}/tweets"))
            .bearer_auth(access_token)
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await
            .map_err(transport_error)?;

        let envelope: CreatedTweetEnvelope = read_json(resp, "twitter create tweet").await?;
        Ok(PublishSuccess {
            platform_url: Some(tweet_url(&envelope.data.id)),
            platform_post_id: envelope.data.id,
        })
    }

    async fn fetch_post_metrics(
        &self,
        platform_post_id: &str,
        access_token: &str,
    ) -> Result<PostMetrics, AdapterError> {
        let resp = self
            .http
            .get(format!("{API_BASE}/tweets/{platform_post_id}"))
            .query(&[("tweet.fields", "public_metrics")])
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(transport_error)?;

        let envelope: TweetEnvelope = read_json(resp, "twitter tweet lookup").await?;
        Ok(post_metrics_from(
            &envelope.data.public_metrics.unwrap_or_default(),
        ))
    }

    async fn fetch_account_metrics(
        &self,
        access_token: &str,
    ) -> Result<AccountMetrics, AdapterError> {
        let user = self.me(access_token, Some("public_metrics")).await?;
        let metrics = user.public_metrics.ok_or_else(|| {
            AdapterError::MalformedResponse("twitter users/me missing public_metrics".to_string())
        })?;

        Ok(AccountMetrics {
            followers: metrics.followers_count,
            following: metrics.following_count,
            total_posts: metrics.tweet_count,
            ..Default::default()
        })
    }

    async fn fetch_recent_activity(
        &self,
        access_token: &str,
    ) -> Result<Vec<ActivityItem>, AdapterError> {
        let user = self.me(access_token, None).await?;

        let resp = self
            .http
            .get(format!("{API_BASE}/users/{}/tweets", user.id))
            .query(&[
                ("max_results", "10"),
                ("tweet.fields", "public_metrics,created_at"),
            ])
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(transport_error)?;

        let envelope: TweetListEnvelope = read_json(resp, "twitter user tweets").await?;
        let items = envelope
            .data
            .into_iter()
            .map(|tweet| {
                let metrics = tweet.public_metrics.unwrap_or_default();
                ActivityItem {
                    id: tweet.id,
                    platform: Platform::Twitter,
                    handle: user.username.clone(),
                    created_at: tweet.created_at.unwrap_or_else(Utc::now),
                    engagement_score: engagement_score(&metrics),
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

    fn adapter() -> TwitterAdapter {
        TwitterAdapter::new(TwitterConfig {
            client_id: "client-id".to_string(),
            client_secret: "client-secret".to_string(),
            redirect_uri: "https://app.example/api/v1/oauth/twitter/callback".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn authorization_request_carries_pkce_challenge_and_state() {
        let request = adapter().build_authorization_request("state-token");
        let url = Url::parse(&request.redirect_url).unwrap();

        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        assert!(pairs.contains(&("state".to_string(), "state-token".to_string())));
        assert!(pairs.contains(&("code_challenge_method".to_string(), "S256".to_string())));

        let verifier = request.code_verifier.unwrap();
        assert_eq!(verifier.len(), 43);

        let expected = URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()));
        assert!(pairs.contains(&("code_challenge".to_string(), expected)));
    }

    #[test]
    fn pkce_verifiers_are_unique_per_request() {
        let (first, _) = generate_pkce_pair();
        let (second, _) = generate_pkce_pair();
        assert_ne!(first, second);
    }

    #[test]
    fn tweet_metrics_map_into_post_metrics() {
        let envelope: TweetEnvelope = serde_json::from_value(json!({
            "data": {
                "id": "1234",
                "public_metrics": {
                    "retweet_count": 3,
                    "reply_count": 2,
                    "like_count": 10,
                    "quote_count": 1,
                    "impression_count": 500
                }
            }
        }))
        .unwrap();

        let metrics = post_metrics_from(&envelope.data.public_metrics.unwrap());
        assert_eq!(metrics.likes, 10);
        assert_eq!(metrics.comments, 2);
        assert_eq!(metrics.shares, 4);
        assert_eq!(metrics.impressions, 500);
        assert_eq!(metrics.views, 0);
    }

    #[test]
    fn engagement_score_is_likes_replies_retweets() {
        let metrics = TweetMetrics {
            retweet_count: 2,
            reply_count: 1,
            like_count: 5,
            quote_count: 0,
            impression_count: 100,
        };
        assert_eq!(engagement_score(&metrics), 8);
    }

    #[test]
    fn user_envelope_parses_with_and_without_metrics() {
        let bare: TwitterUserEnvelope = serde_json::from_value(json!({
            "data": { "id": "99", "username": "tester", "name": "Tester" }
        }))
        .unwrap();
        assert_eq!(bare.data.username, "tester");
        assert!(bare.data.public_metrics.is_none());

        let with_metrics: TwitterUserEnvelope = serde_json::from_value(json!({
            "data": {
                "id": "99",
                "username": "tester",
                "public_metrics": { "followers_count": 42, "following_count": 7, "tweet_count": 120 }
            }
        }))
        .unwrap();
        let metrics = with_metrics.data.public_metrics.unwrap();
        assert_eq!(metrics.followers_count, 42);
        assert_eq!(metrics.tweet_count, 120);
    }
}
