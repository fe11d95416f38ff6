//! Remote Profile Gateway client
//!
//! The gateway is the REST backend that owns accounts and donor records.
//! [`ProfileGateway`] is the seam the session store talks through;
//! [`HttpGateway`] is the production implementation.

use std::future::Future;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{error, info};

use crate::error::{PortalError, PortalResult};
use crate::models::{
    CompanyProfileRequest, DonationRecord, GoogleLoginRequest, GoogleLoginResponse, LoginRequest,
    LoginResponse, ProfileResponse, RegisterRequest, RegisterResponse, ResidenceProfileRequest,
};

/// Operations offered by the Remote Profile Gateway
pub trait ProfileGateway: Send + Sync {
    /// `POST /api/auth/register`
    fn register(
        &self,
        request: &RegisterRequest,
    ) -> impl Future<Output = PortalResult<RegisterResponse>> + Send;

    /// `POST /api/auth/login`
    fn login(
        &self,
        request: &LoginRequest,
    ) -> impl Future<Output = PortalResult<LoginResponse>> + Send;

    /// `POST /api/auth/google`
    fn google_login(
        &self,
        request: &GoogleLoginRequest,
    ) -> impl Future<Output = PortalResult<GoogleLoginResponse>> + Send;

    /// `POST /api/residence/complete-profile`
    fn complete_residence_profile(
        &self,
        token: &str,
        request: &ResidenceProfileRequest,
    ) -> impl Future<Output = PortalResult<ProfileResponse>> + Send;

    /// `POST /api/company/complete-profile`
    fn complete_company_profile(
        &self,
        token: &str,
        request: &CompanyProfileRequest,
    ) -> impl Future<Output = PortalResult<ProfileResponse>> + Send;

    /// `GET /api/donations`
    fn donation_history(
        &self,
        token: &str,
    ) -> impl Future<Output = PortalResult<Vec<DonationRecord>>> + Send;
}

/// Error body returned by the gateway
#[derive(Debug, serde::Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// HTTP implementation of the gateway
#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
}

impl HttpGateway {
    /// Create a new gateway client for `base_url` (e.g. `http://localhost:8080`)
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    async fn post<B, T>(&self, endpoint: &str, token: Option<&str>, body: &B) -> PortalResult<T>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.client.post(self.url(endpoint)).json(body);
        self.send(endpoint, token, request, EmptyBody::Object).await
    }

    async fn get_list<T>(&self, endpoint: &str, token: Option<&str>) -> PortalResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let request = self.client.get(self.url(endpoint));
        self.send(endpoint, token, request, EmptyBody::List).await
    }

    async fn send<T>(
        &self,
        endpoint: &str,
        token: Option<&str>,
        request: RequestBuilder,
        empty: EmptyBody,
    ) -> PortalResult<T>
    where
        T: DeserializeOwned,
    {
        let request = match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await.map_err(|e| {
            error!("Request to {} failed: {}", endpoint, e);
            PortalError::Network(e)
        })?;

        read_response(endpoint, response, empty).await
    }
}

/// What a successful response without a body stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EmptyBody {
    Object,
    List,
}

impl EmptyBody {
    fn as_json(&self) -> &'static str {
        match self {
            EmptyBody::Object => "{}",
            EmptyBody::List => "[]",
        }
    }
}

/// Turn a gateway response into `T`, or into the matching error
async fn read_response<T: DeserializeOwned>(
    endpoint: &str,
    response: Response,
    empty: EmptyBody,
) -> PortalResult<T> {
    let status = response.status();
    let text = response.text().await?;
    parse_body(endpoint, status, &text, empty)
}

fn parse_body<T: DeserializeOwned>(
    endpoint: &str,
    status: StatusCode,
    text: &str,
    empty: EmptyBody,
) -> PortalResult<T> {
    if !status.is_success() {
        let message = serde_json::from_str::<ErrorBody>(text)
            .ok()
            .and_then(|body| body.message.or(body.error))
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()));
        error!("{} answered {}: {}", endpoint, status, message);
        return Err(PortalError::Server { status, message });
    }

    // Some endpoints answer 2xx (often 204) with an empty body
    let body = if text.trim().is_empty() {
        empty.as_json()
    } else {
        text
    };
    serde_json::from_str(body).map_err(|e| {
        error!("{} returned an unreadable body: {}", endpoint, e);
        PortalError::Server {
            status,
            message: format!("Invalid response from server: {}", e),
        }
    })
}

impl ProfileGateway for HttpGateway {
    async fn register(&self, request: &RegisterRequest) -> PortalResult<RegisterResponse> {
        info!("Registering account for {}", request.email);
        self.post("/api/auth/register", None, request).await
    }

    async fn login(&self, request: &LoginRequest) -> PortalResult<LoginResponse> {
        info!("Logging in {}", request.email);
        self.post("/api/auth/login", None, request).await
    }

    async fn google_login(&self, request: &GoogleLoginRequest) -> PortalResult<GoogleLoginResponse> {
        info!("Exchanging third-party credential");
        self.post("/api/auth/google", None, request).await
    }

    async fn complete_residence_profile(
        &self,
        token: &str,
        request: &ResidenceProfileRequest,
    ) -> PortalResult<ProfileResponse> {
        info!("Completing residence profile");
        self.post("/api/residence/complete-profile", Some(token), request)
            .await
    }

    async fn complete_company_profile(
        &self,
        token: &str,
        request: &CompanyProfileRequest,
    ) -> PortalResult<ProfileResponse> {
        info!("Completing company profile");
        self.post("/api/company/complete-profile", Some(token), request)
            .await
    }

    async fn donation_history(&self, token: &str) -> PortalResult<Vec<DonationRecord>> {
        info!("Fetching donation history");
        self.get_list("/api/donations", Some(token)).await
    }
}
