//! Adquota HTTP client implementation.

use reqwest::Client;
use std::time::Duration;

use crate::error::ClientError;
use crate::types::{
    AdBody, ApiErrorResponse, CampaignPerformance, CreateAdRequest, CreateAdResponse,
    HealthResponse, PerformanceBody, TrackEvent, TrackEventResponse, TrendResponse,
};

const LIMIT_CODES: [&str; 3] = [
    "active_ad_limit_reached",
    "ad_limit_reached",
    "impression_limit_reached",
];

/// The owner on whose behalf requests are made.
#[derive(Debug, Clone)]
pub struct OwnerIdentity {
    owner_id: String,
    owner_type: String,
}

impl OwnerIdentity {
    /// Identity for a user-owned campaign.
    #[must_use]
    pub fn user(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            owner_type: "user".to_string(),
        }
    }

    /// Identity for a company-owned campaign.
    #[must_use]
    pub fn company(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            owner_type: "company".to_string(),
        }
    }
}

/// Adquota API client.
///
/// Provides methods for managing ads, metering viewer events and reading
/// campaign analytics.
#[derive(Debug, Clone)]
pub struct AdquotaClient {
    client: Client,
    base_url: String,
    identity: OwnerIdentity,
}

impl AdquotaClient {
    /// Create a new adquota client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the adquota service (e.g., `"http://adquota:8080"`)
    /// * `identity` - The owner whose quota and ads this client acts on
    #[must_use]
    pub fn new(base_url: impl Into<String>, identity: OwnerIdentity) -> Self {
        Self::with_options(base_url, identity, ClientOptions::default())
    }

    /// Create a new adquota client with custom options.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built (should not happen with default settings).
    #[must_use]
    pub fn with_options(
        base_url: impl Into<String>,
        identity: OwnerIdentity,
        options: ClientOptions,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_seconds))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            identity,
        }
    }

    /// Create an ad, reserving one ad slot on the owner's subscription.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NoActivePlan`] if the owner has no subscription
    /// and [`ClientError::PlanLimit`] if the period's ad slots are spent.
    pub async fn create_ad(
        &self,
        title: impl Into<String>,
    ) -> Result<CreateAdResponse, ClientError> {
        let url = format!("{}/v1/ads", self.base_url);
        let request = CreateAdRequest {
            title: title.into(),
        };

        let response = self
            .client
            .post(&url)
            .header("x-owner-id", &self.identity.owner_id)
            .header("x-owner-type", &self.identity.owner_type)
            .json(&request)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Resume delivery of a paused ad.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn activate_ad(&self, ad_id: &str) -> Result<AdBody, ClientError> {
        self.set_ad_status(ad_id, "activate").await
    }

    /// Pause delivery of an ad. The period's ad slot stays spent.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn deactivate_ad(&self, ad_id: &str) -> Result<AdBody, ClientError> {
        self.set_ad_status(ad_id, "deactivate").await
    }

    async fn set_ad_status(&self, ad_id: &str, action: &str) -> Result<AdBody, ClientError> {
        let url = format!("{}/v1/ads/{ad_id}/{action}", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("x-owner-id", &self.identity.owner_id)
            .header("x-owner-type", &self.identity.owner_type)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Report a viewer event against an ad.
    ///
    /// `client_ip` and `user_agent` identify the viewer for per-day
    /// deduplication; forward them from the original request.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::PlanLimit`] when an impression would exceed the
    /// period's impression quota.
    pub async fn track_event(
        &self,
        ad_id: &str,
        event: TrackEvent,
        client_ip: &str,
        user_agent: &str,
    ) -> Result<TrackEventResponse, ClientError> {
        let url = format!("{}/v1/ads/{ad_id}/events", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("x-forwarded-for", client_ip)
            .header("user-agent", user_agent)
            .json(&event)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Get lifetime performance counters for an ad.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn ad_performance(&self, ad_id: &str) -> Result<PerformanceBody, ClientError> {
        let url = format!("{}/v1/ads/{ad_id}/performance", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("x-owner-id", &self.identity.owner_id)
            .header("x-owner-type", &self.identity.owner_type)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Get a per-day trend for an ad over the trailing `days` days.
    ///
    /// Pass `None` for the server default window of one week.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn ad_trend(
        &self,
        ad_id: &str,
        days: Option<u32>,
    ) -> Result<TrendResponse, ClientError> {
        let url = format!("{}/v1/ads/{ad_id}/trend", self.base_url);

        let mut request = self
            .client
            .get(&url)
            .header("x-owner-id", &self.identity.owner_id)
            .header("x-owner-type", &self.identity.owner_type);
        if let Some(days) = days {
            request = request.query(&[("days", days)]);
        }

        self.handle_response(request.send().await?).await
    }

    /// Get performance aggregated across all of the owner's ads.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn campaign_performance(&self) -> Result<CampaignPerformance, ClientError> {
        let url = format!("{}/v1/campaigns/performance", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("x-owner-id", &self.identity.owner_id)
            .header("x-owner-type", &self.identity.owner_type)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Check service health.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn health(&self) -> Result<HealthResponse, ClientError> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send().await?;
        self.handle_response(response).await
    }

    /// Handle API response and convert errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        // Try to parse error response
        let error_body: Result<ApiErrorResponse, _> = response.json().await;

        match error_body {
            Ok(api_error) => {
                let code = api_error.error.code;
                let message = api_error.error.message;

                // Map specific error codes to typed errors
                if code == "no_active_plan" {
                    Err(ClientError::NoActivePlan)
                } else if LIMIT_CODES.contains(&code.as_str()) {
                    let used = api_error
                        .error
                        .details
                        .as_ref()
                        .and_then(|d| d.get("used"))
                        .and_then(serde_json::Value::as_u64)
                        .unwrap_or(0);
                    let limit = api_error
                        .error
                        .details
                        .as_ref()
                        .and_then(|d| d.get("limit"))
                        .and_then(serde_json::Value::as_u64)
                        .unwrap_or(0);

                    Err(ClientError::PlanLimit { code, used, limit })
                } else if code == "not_found" {
                    Err(ClientError::NotFound(message))
                } else {
                    Err(ClientError::Api {
                        code,
                        message,
                        status: status.as_u16(),
                    })
                }
            }
            Err(_) => Err(ClientError::Api {
                code: "unknown".to_string(),
                message: format!("HTTP {status}"),
                status: status.as_u16(),
            }),
        }
    }
}

/// Client options for customization.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Request timeout in seconds (default: 30).
    pub timeout_seconds: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
        }
    }
}
