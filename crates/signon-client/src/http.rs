// crates/signon-client/src/http.rs
// ============================================================================
// Module: HTTP Sign-On Policy Action API
// Description: reqwest-backed implementation of the action API.
// Purpose: Issue authenticated requests and map responses to typed results.
// Dependencies: reqwest, url, serde_json, signon-core
// ============================================================================

//! ## Overview
//! [`HttpSignOnPolicyActionApi`] speaks to the management API under
//! `{base}/environments/{envId}/signOnPolicies/{policyId}/actions`. Every
//! request carries a bearer token from the configured [`TokenSource`] and is
//! raced against the caller's [`CancelSignal`]. Non-success statuses become
//! [`ClientError::Api`] with the decoded error envelope and a bounded body
//! excerpt. Paging links are followed only when they stay on the configured
//! origin so the token is never sent elsewhere.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::Method;
use reqwest::StatusCode;
use reqwest::header::HeaderValue;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use signon_core::ActionId;
use signon_core::EnvironmentId;
use signon_core::SignOnPolicyAction;
use signon_core::SignOnPolicyId;
use url::Url;

use crate::api::ActionPage;
use crate::api::EnvironmentSummary;
use crate::api::ResponseSummary;
use crate::api::SignOnPolicyActionApi;
use crate::error::ClientError;
use crate::retry::CancelSignal;
use crate::token::TokenSource;

// ============================================================================
// SECTION: Settings
// ============================================================================

/// Default TCP connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for [`HttpSignOnPolicyActionApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    /// API base URL including the version segment (e.g. `https://api.pingone.com/v1`).
    pub api_base_url: String,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
    /// Whole-request timeout.
    pub request_timeout: Duration,
    /// User agent sent with every request.
    pub user_agent: String,
}

impl ClientSettings {
    /// Creates settings with default timeouts.
    #[must_use]
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            user_agent: concat!("signon-provider/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

// ============================================================================
// SECTION: Client
// ============================================================================

/// HTTP implementation of [`SignOnPolicyActionApi`].
///
/// # Invariants
/// - `base_url` has no trailing empty path segment.
pub struct HttpSignOnPolicyActionApi {
    /// API base URL.
    base_url: Url,
    /// Pooled HTTP client configured with timeouts.
    client: Client,
    /// Bearer token provider.
    tokens: Arc<dyn TokenSource>,
}

impl HttpSignOnPolicyActionApi {
    /// Builds a client for `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidRequest`] when the base URL is invalid and
    /// [`ClientError::Transport`] when the HTTP client cannot be built.
    pub fn new(
        settings: &ClientSettings,
        tokens: Arc<dyn TokenSource>,
    ) -> Result<Self, ClientError> {
        let base_url = parse_base_url(&settings.api_base_url)?;
        let client = Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|err| ClientError::Transport(err.to_string()))?;
        Ok(Self {
            base_url,
            client,
            tokens,
        })
    }

    /// Returns the configured base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Builds a URL by appending escaped path segments to the base.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidRequest("base url cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Returns the collection URL for a policy's actions.
    fn actions_url(
        &self,
        environment_id: &EnvironmentId,
        policy_id: &SignOnPolicyId,
    ) -> Result<Url, ClientError> {
        self.endpoint(&[
            "environments",
            environment_id.as_str(),
            "signOnPolicies",
            policy_id.as_str(),
            "actions",
        ])
    }

    /// Returns the URL of a single action.
    fn action_url(
        &self,
        environment_id: &EnvironmentId,
        policy_id: &SignOnPolicyId,
        action_id: &ActionId,
    ) -> Result<Url, ClientError> {
        self.endpoint(&[
            "environments",
            environment_id.as_str(),
            "signOnPolicies",
            policy_id.as_str(),
            "actions",
            action_id.as_str(),
        ])
    }

    /// Resolves a paging link, refusing links that leave the base origin.
    fn follow_link(&self, href: &str) -> Result<Url, ClientError> {
        let url = self
            .base_url
            .join(href)
            .map_err(|err| ClientError::InvalidRequest(format!("invalid paging link: {err}")))?;
        if url.origin() != self.base_url.origin() {
            return Err(ClientError::InvalidRequest(format!(
                "paging link leaves the API origin: {url}"
            )));
        }
        Ok(url)
    }

    /// Sends one request and returns the status and body.
    async fn exchange(
        &self,
        method: Method,
        url: Url,
        body: Option<&SignOnPolicyAction>,
        cancel: &CancelSignal,
    ) -> Result<Exchange, ClientError> {
        cancel.check()?;
        let token = self.tokens.bearer_token().await?;
        let authorization = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| ClientError::Token("access token has invalid characters".to_string()))?;
        let summary_url = url.to_string();
        let mut request =
            self.client.request(method, url).header(reqwest::header::AUTHORIZATION, authorization);
        if let Some(body) = body {
            request = request.json(body);
        }
        let send = async {
            let response =
                request.send().await.map_err(|err| ClientError::Transport(err.to_string()))?;
            let status = response.status();
            let body =
                response.bytes().await.map_err(|err| ClientError::Transport(err.to_string()))?;
            Ok::<_, ClientError>((status, body.to_vec()))
        };
        let (status, body) = tokio::select! {
            result = send => result?,
            () = cancel.cancelled() => return Err(ClientError::Cancelled),
        };
        Ok(Exchange {
            status,
            body,
            url: summary_url,
        })
    }
}

/// Raw outcome of one request.
struct Exchange {
    /// Response status.
    status: StatusCode,
    /// Response body.
    body: Vec<u8>,
    /// Request URL.
    url: String,
}

impl Exchange {
    /// Fails with [`ClientError::Api`] unless the status is a success.
    fn success(self) -> Result<Self, ClientError> {
        if self.status.is_success() {
            Ok(self)
        } else {
            Err(ClientError::from_response(self.status.as_u16(), &self.body).at_url(self.url))
        }
    }

    /// Decodes a successful JSON body.
    fn decode<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        serde_json::from_slice(&self.body).map_err(|err| ClientError::Decode(err.to_string()))
    }

    /// Summarizes the response for diagnostics.
    fn summary(&self) -> ResponseSummary {
        ResponseSummary {
            status: self.status.as_u16(),
            url: self.url.clone(),
        }
    }
}

#[async_trait]
impl SignOnPolicyActionApi for HttpSignOnPolicyActionApi {
    async fn create_action(
        &self,
        environment_id: &EnvironmentId,
        policy_id: &SignOnPolicyId,
        action: &SignOnPolicyAction,
        cancel: &CancelSignal,
    ) -> Result<SignOnPolicyAction, ClientError> {
        let url = self.actions_url(environment_id, policy_id)?;
        self.exchange(Method::POST, url, Some(action), cancel).await?.success()?.decode()
    }

    async fn read_action(
        &self,
        environment_id: &EnvironmentId,
        policy_id: &SignOnPolicyId,
        action_id: &ActionId,
        cancel: &CancelSignal,
    ) -> Result<SignOnPolicyAction, ClientError> {
        let url = self.action_url(environment_id, policy_id, action_id)?;
        self.exchange(Method::GET, url, None, cancel).await?.success()?.decode()
    }

    async fn update_action(
        &self,
        environment_id: &EnvironmentId,
        policy_id: &SignOnPolicyId,
        action_id: &ActionId,
        action: &SignOnPolicyAction,
        cancel: &CancelSignal,
    ) -> Result<SignOnPolicyAction, ClientError> {
        let url = self.action_url(environment_id, policy_id, action_id)?;
        self.exchange(Method::PUT, url, Some(action), cancel).await?.success()?.decode()
    }

    async fn delete_action(
        &self,
        environment_id: &EnvironmentId,
        policy_id: &SignOnPolicyId,
        action_id: &ActionId,
        cancel: &CancelSignal,
    ) -> Result<(), ClientError> {
        let url = self.action_url(environment_id, policy_id, action_id)?;
        self.exchange(Method::DELETE, url, None, cancel).await?.success()?;
        Ok(())
    }

    async fn fetch_page(
        &self,
        environment_id: &EnvironmentId,
        policy_id: &SignOnPolicyId,
        next: Option<&str>,
        cancel: &CancelSignal,
    ) -> Result<ActionPage, ClientError> {
        let url = match next {
            Some(href) => self.follow_link(href)?,
            None => self.actions_url(environment_id, policy_id)?,
        };
        let exchange = self.exchange(Method::GET, url, None, cancel).await?.success()?;
        let page: CollectionBody = exchange.decode()?;
        Ok(ActionPage {
            actions: page.embedded.actions,
            next: page.links.next.map(|link| link.href),
            response: exchange.summary(),
        })
    }

    async fn get_environment(
        &self,
        environment_id: &EnvironmentId,
        cancel: &CancelSignal,
    ) -> Result<EnvironmentSummary, ClientError> {
        let url = self.endpoint(&["environments", environment_id.as_str()])?;
        let body: EnvironmentBody =
            self.exchange(Method::GET, url, None, cancel).await?.success()?.decode()?;
        Ok(EnvironmentSummary {
            id: EnvironmentId::new(body.id),
            name: body.name,
        })
    }
}

// ============================================================================
// SECTION: Response Bodies
// ============================================================================

/// HAL collection body for the action list endpoint.
#[derive(Debug, Deserialize)]
struct CollectionBody {
    /// Embedded resources.
    #[serde(rename = "_embedded", default)]
    embedded: EmbeddedActions,
    /// Navigation links.
    #[serde(rename = "_links", default)]
    links: CollectionLinks,
}

/// Embedded action list.
#[derive(Debug, Default, Deserialize)]
struct EmbeddedActions {
    /// Actions on this page.
    #[serde(default)]
    actions: Vec<SignOnPolicyAction>,
}

/// Collection navigation links.
#[derive(Debug, Default, Deserialize)]
struct CollectionLinks {
    /// Link to the next page.
    #[serde(default)]
    next: Option<Link>,
}

/// HAL link.
#[derive(Debug, Deserialize)]
struct Link {
    /// Link target.
    href: String,
}

/// Environment body returned by the permission probe.
#[derive(Debug, Deserialize)]
struct EnvironmentBody {
    /// Environment identifier.
    id: String,
    /// Display name.
    #[serde(default)]
    name: Option<String>,
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Parses and normalizes the API base URL.
fn parse_base_url(raw: &str) -> Result<Url, ClientError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let url = Url::parse(trimmed)
        .map_err(|err| ClientError::InvalidRequest(format!("invalid api base url: {err}")))?;
    match url.scheme() {
        "https" | "http" => {}
        other => {
            return Err(ClientError::InvalidRequest(format!(
                "unsupported api base url scheme: {other}"
            )));
        }
    }
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(ClientError::InvalidRequest("api base url requires a host".to_string()));
    }
    Ok(url)
}

#[cfg(test)]
mod tests;
