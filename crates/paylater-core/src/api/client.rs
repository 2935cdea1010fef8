//! API client for communicating with the PayLater REST API.
//!
//! This module provides the `ApiClient` struct for making session-scoped
//! API requests for users, merchants, transactions, paybacks and reports.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, Client, Method, Response, StatusCode, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::auth::{Credential, Session};
use crate::models::merchant::FeeUpdate;
use crate::models::{
    AccessToken, DuesReport, FeeReport, LoginRequest, Merchant, MerchantSummary, NewPayback,
    NewTransaction, NewUser, PaybackReceipt, ServiceInfo, TotalDuesReport, Transaction,
    TransactionOutcome, User, UserIdentity,
};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Base URL used when neither the environment nor the config names one
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Whether a route needs the session credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// `/auth/*` and the service root: a 401 is an ordinary rejection
    Public,
    /// Everything else: a 401 expires the session
    Protected,
}

/// API client for the PayLater service.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling,
/// and every clone shares the same session.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    session: Arc<Session>,
}

impl ApiClient {
    /// Create a new API client with the default timeout
    pub fn new(base_url: &str, session: Arc<Session>) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, Duration::from_secs(REQUEST_TIMEOUT_SECS), session)
    }

    pub fn with_timeout(
        base_url: &str,
        timeout: Duration,
        session: Arc<Session>,
    ) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ApiError::InvalidRequest(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidRequest(format!(
                "{} cannot be used as a base URL",
                base_url
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(Self::default_headers())
            .build()?;

        Ok(Self {
            client,
            base_url,
            session,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    fn default_headers() -> header::HeaderMap {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );
        headers
    }

    /// Build the URL for a route. Segments are percent-encoded; an empty
    /// last segment produces a trailing slash.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidRequest(format!("{} cannot be a base", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn auth_headers(token: Option<&SecretString>) -> Result<header::HeaderMap, ApiError> {
        let mut headers = header::HeaderMap::new();
        if let Some(token) = token {
            let mut value =
                header::HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                    .map_err(|_| {
                        ApiError::InvalidRequest("token is not a valid header value".to_string())
                    })?;
            value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: Response) -> Result<Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    /// Decode a successful response body. Decode failures are kept apart
    /// from transport failures.
    async fn decode<T: DeserializeOwned>(response: Response, route: &str) -> Result<T, ApiError> {
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| ApiError::InvalidResponse(format!("{}: {}", route, e)))
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        token: Option<&SecretString>,
        body: Option<&Value>,
    ) -> Result<Response, ApiError> {
        debug!(%method, path = url.path(), authenticated = token.is_some(), "Sending request");

        let mut builder = self
            .client
            .request(method, url)
            .headers(Self::auth_headers(token)?);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        Ok(builder.send().await?)
    }

    /// Issue a request with the session credential.
    ///
    /// A 401 on a protected route expires the session (at most once per
    /// session generation) and returns [`ApiError::AuthenticationExpired`].
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &[&str],
        access: Access,
        body: Option<&Value>,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        let route = format!("{} {}", method, url.path());
        let ticket = self.session.ticket().await;

        let response = self.send(method, url, ticket.token.as_ref(), body).await?;

        if response.status() == StatusCode::UNAUTHORIZED && access == Access::Protected {
            debug!(route = %route, "Authentication rejected");
            self.session.expire(ticket.epoch).await;
            return Err(ApiError::AuthenticationExpired);
        }

        let response = Self::check_response(response).await?;
        Self::decode(response, &route).await
    }

    /// Issue a request with an explicit token, bypassing the session.
    /// Used right after login, before the credential is stored.
    async fn request_with_token<T: DeserializeOwned>(
        &self,
        path: &[&str],
        token: &SecretString,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        let route = format!("GET {}", url.path());
        let response = self.send(Method::GET, url, Some(token), None).await?;
        let response = Self::check_response(response).await?;
        Self::decode(response, &route).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &[&str]) -> Result<T, ApiError> {
        self.request(Method::GET, path, Access::Protected, None).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &[&str],
        access: Access,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = serde_json::to_value(body)
            .map_err(|e| ApiError::InvalidRequest(format!("Failed to encode body: {}", e)))?;
        self.request(Method::POST, path, access, Some(&body)).await
    }

    async fn patch<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &[&str],
        body: &B,
    ) -> Result<T, ApiError> {
        let body = serde_json::to_value(body)
            .map_err(|e| ApiError::InvalidRequest(format!("Failed to encode body: {}", e)))?;
        self.request(Method::PATCH, path, Access::Protected, Some(&body))
            .await
    }

    // ===== Authentication =====

    pub async fn login(&self, email: &str, password: &str) -> Result<AccessToken, ApiError> {
        self.post(&["auth", "login"], Access::Public, &LoginRequest { email, password })
            .await
    }

    pub async fn register(&self, user: &NewUser) -> Result<User, ApiError> {
        self.post(&["auth", "register"], Access::Public, user).await
    }

    /// Log in and build the credential to hand to [`Session::login_user`].
    ///
    /// The identity comes from `/users/me`; if only that lookup fails the
    /// credential still carries the email it was issued for.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Credential, ApiError> {
        let token = self.login(email, password).await?;
        let secret = SecretString::from(token.access_token.clone());

        let identity = match self.request_with_token::<User>(&["users", "me"], &secret).await {
            Ok(user) => user.identity(),
            Err(e) if e.status() == Some(StatusCode::UNAUTHORIZED.as_u16()) => return Err(e),
            Err(e) => {
                warn!(error = %e, "Signed in but could not fetch profile");
                UserIdentity::from_email(email)
            }
        };

        Ok(Credential::new(token.access_token, identity))
    }

    /// Service name and version from the root route
    pub async fn health(&self) -> Result<ServiceInfo, ApiError> {
        self.request(Method::GET, &[""], Access::Public, None).await
    }

    // ===== Users =====

    pub async fn me(&self) -> Result<User, ApiError> {
        self.get(&["users", "me"]).await
    }

    pub async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        self.get(&["users", ""]).await
    }

    // ===== Merchants =====

    pub async fn list_merchants(&self) -> Result<Vec<Merchant>, ApiError> {
        self.get(&["merchants", ""]).await
    }

    pub async fn create_merchant(
        &self,
        name: &str,
        fee_percentage: f64,
    ) -> Result<MerchantSummary, ApiError> {
        let body = MerchantSummary {
            name: name.to_string(),
            fee_percentage,
        };
        self.post(&["merchants", ""], Access::Protected, &body).await
    }

    pub async fn update_merchant_fee(
        &self,
        name: &str,
        fee_percentage: f64,
    ) -> Result<MerchantSummary, ApiError> {
        self.patch(&["merchants", name], &FeeUpdate { fee_percentage })
            .await
    }

    // ===== Transactions =====

    pub async fn my_transactions(&self) -> Result<Vec<Transaction>, ApiError> {
        self.get(&["transactions", "my"]).await
    }

    pub async fn all_transactions(&self) -> Result<Vec<Transaction>, ApiError> {
        self.get(&["transactions", ""]).await
    }

    pub async fn create_transaction(
        &self,
        user_name: &str,
        merchant_name: &str,
        amount: f64,
    ) -> Result<TransactionOutcome, ApiError> {
        let body = NewTransaction {
            user_name: user_name.to_string(),
            merchant_name: merchant_name.to_string(),
            amount,
        };
        self.post(&["transactions", ""], Access::Protected, &body)
            .await
    }

    // ===== Paybacks =====

    pub async fn create_payback(
        &self,
        user_name: &str,
        amount: f64,
    ) -> Result<PaybackReceipt, ApiError> {
        let body = NewPayback {
            user_name: user_name.to_string(),
            amount,
        };
        self.post(&["paybacks", ""], Access::Protected, &body).await
    }

    // ===== Reports =====

    pub async fn merchant_fee_report(&self, merchant_name: &str) -> Result<FeeReport, ApiError> {
        self.get(&["reports", "fee", merchant_name]).await
    }

    pub async fn user_dues_report(&self, user_name: &str) -> Result<DuesReport, ApiError> {
        self.get(&["reports", "dues", user_name]).await
    }

    pub async fn users_at_credit_limit(&self) -> Result<Vec<String>, ApiError> {
        self.get(&["reports", "users-at-credit-limit"]).await
    }

    pub async fn total_dues_report(&self) -> Result<TotalDuesReport, ApiError> {
        self.get(&["reports", "total-dues"]).await
    }
}
