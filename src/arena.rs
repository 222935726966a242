//! Handles all interactions with the Are.na REST API.
//!
//! This module provides the OAuth2 authorization-code exchange plus the read
//! endpoints the UI consumes: user search, channel search, a user's channel
//! listing, and paged channel contents. All functions are asynchronous and
//! use a shared `reqwest` client; failures map onto the error taxonomy in
//! `src/errors.rs`. Requests with missing parameters are rejected before any
//! network call is made, and upstream non-success statuses are echoed
//! verbatim in `ApiError::Http`.

use super::config::AppConfig;
use super::errors::ApiError;
use super::model::{
    ArenaChannel, ArenaUser, Block, ChannelContentsResponse, ChannelListResponse, TokenResponse,
    UserSearchResponse,
};
use log::{debug, error, info, warn};
use reqwest::Client;
use serde::de::DeserializeOwned;

/// Authenticated client for the Are.na API.
///
/// Cheap to clone; the inner `reqwest::Client` is reference-counted.
#[derive(Clone, Debug)]
pub struct ArenaClient {
    http: Client,
    api_url: String,
    auth_url: String,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

impl ArenaClient {
    pub fn new(config: &AppConfig, http: Client) -> Self {
        Self {
            http,
            api_url: config.api_url.clone(),
            auth_url: config.auth_url.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
        }
    }

    /// The underlying HTTP client, for plain asset downloads.
    pub fn http(&self) -> &Client {
        &self.http
    }

    /// Reads the response body and parses it as JSON, keeping malformed JSON
    /// distinct from an upstream error status.
    async fn read_json<T: DeserializeOwned>(
        response: reqwest::Response,
        what: &str,
    ) -> Result<T, ApiError> {
        let status = response.status();
        let body = response.text().await.map_err(|e| {
            error!("Error reading {} response body: {:?}", what, e);
            ApiError::Request(e)
        })?;
        if !status.is_success() {
            warn!("{} failed upstream with status {}: {}", what, status, body);
            return Err(ApiError::Http { status, body });
        }
        serde_json::from_str(&body).map_err(|e| {
            error!("Failed to parse {} response as JSON: {}", what, e);
            ApiError::Json(e)
        })
    }

    /// Exchanges an OAuth2 authorization code for an access token.
    ///
    /// Sends the standard `x-www-form-urlencoded` grant to the token
    /// endpoint, with the redirect URI exactly as used in the authorize step.
    #[must_use = "token exchange can fail; the Result must be handled"]
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse, ApiError> {
        if code.trim().is_empty() {
            return Err(ApiError::MissingParam("code"));
        }
        debug!("Exchanging authorization code for access token");
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("code", code.trim()),
            ("grant_type", "authorization_code"),
            ("redirect_uri", self.redirect_uri.as_str()),
        ];
        let response = self
            .http
            .post(format!("{}/token", self.auth_url))
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                error!("Request error during token exchange: {:?}", e);
                ApiError::Request(e)
            })?;
        let token: TokenResponse = Self::read_json(response, "token exchange").await?;
        info!("Token exchange succeeded");
        Ok(token)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        token: &str,
        path: &str,
        query: &[(&str, String)],
        what: &str,
    ) -> Result<T, ApiError> {
        debug!("GET {}{} ({})", self.api_url, path, what);
        let response = self
            .http
            .get(format!("{}{}", self.api_url, path))
            .query(query)
            .bearer_auth(token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                error!("Request error during {}: {:?}", what, e);
                ApiError::Request(e)
            })?;
        Self::read_json(response, what).await
    }

    /// Searches Are.na users by free-text query.
    #[must_use = "the search can fail; the Result must be handled"]
    pub async fn search_users(&self, token: &str, query: &str) -> Result<Vec<ArenaUser>, ApiError> {
        let term = query.trim();
        if term.is_empty() {
            return Err(ApiError::MissingParam("q"));
        }
        let response: UserSearchResponse = self
            .get_json(
                token,
                "/search/users",
                &[("q", term.to_string())],
                "user search",
            )
            .await?;
        info!("User search for '{}' returned {} users", term, response.users.len());
        Ok(response.users)
    }

    /// Searches Are.na channels by free-text query.
    #[must_use = "the search can fail; the Result must be handled"]
    pub async fn search_channels(
        &self,
        token: &str,
        query: &str,
    ) -> Result<Vec<ArenaChannel>, ApiError> {
        let term = query.trim();
        if term.is_empty() {
            return Err(ApiError::MissingParam("q"));
        }
        let response: ChannelListResponse = self
            .get_json(
                token,
                "/search/channels",
                &[("q", term.to_string())],
                "channel search",
            )
            .await?;
        info!(
            "Channel search for '{}' returned {} channels",
            term,
            response.channels.len()
        );
        Ok(response.channels)
    }

    /// Lists the public channels belonging to a user.
    #[must_use = "the listing can fail; the Result must be handled"]
    pub async fn user_channels(
        &self,
        token: &str,
        user_id: u64,
    ) -> Result<Vec<ArenaChannel>, ApiError> {
        let response: ChannelListResponse = self
            .get_json(
                token,
                &format!("/users/{}/channels", user_id),
                &[],
                "user channels",
            )
            .await?;
        info!(
            "User {} has {} public channels",
            user_id,
            response.channels.len()
        );
        Ok(response.channels)
    }

    /// Fetches one page of a channel's contents.
    ///
    /// `page` is 1-based; `per` is the requested page size. The raw returned
    /// count (before any image filtering) is what pagination compares against
    /// `per` to decide exhaustion.
    #[must_use = "the fetch can fail; the Result must be handled"]
    pub async fn channel_contents(
        &self,
        token: &str,
        channel_id: u64,
        page: u32,
        per: usize,
    ) -> Result<Vec<Block>, ApiError> {
        let response: ChannelContentsResponse = self
            .get_json(
                token,
                &format!("/channels/{}/contents", channel_id),
                &[("page", page.to_string()), ("per", per.to_string())],
                "channel contents",
            )
            .await?;
        debug!(
            "Channel {} page {} (per {}) returned {} raw blocks",
            channel_id,
            page,
            per,
            response.contents.len()
        );
        Ok(response.contents)
    }
}
