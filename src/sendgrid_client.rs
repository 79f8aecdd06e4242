use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::Client;
use reqwest::Response;
use reqwest::StatusCode;
use secrecy::ExposeSecret;
use secrecy::Secret;

use crate::domain::SenderProfile;
use crate::domain::VerificationToken;

/// Authenticated client for the two sender-verification endpoints of the
/// SendGrid v3 API. Non-success statuses are not errors here; they are handed
/// back as `ApiResponse` for the caller to report.
pub struct SendGridClient {
    http_client: Client,
    base_url: String,
    api_key: Secret<String>,
}

/// Everything the caller gets to inspect after an API call
#[derive(Debug)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: String,
    pub headers: HeaderMap,
}

impl ApiResponse {
    async fn read(resp: Response) -> Result<Self, reqwest::Error> {
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.text().await?;
        Ok(Self {
            status,
            body,
            headers,
        })
    }

    pub fn is_success(&self) -> bool { self.status.is_success() }

    /// One `name: value` line per header
    pub fn headers_dump(&self) -> String {
        self.headers
            .iter()
            .map(|(name, value)| format!("{}: {}", name, value.to_str().unwrap_or("<binary>")))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl SendGridClient {
    pub fn new(
        base_url: String,
        api_key: Secret<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            api_key,
        })
    }

    /// `POST /verified_senders`. SendGrid then emails a verification link to
    /// `from_email`.
    #[tracing::instrument(
        name = "Requesting sender verification",
        skip(self, profile),
        fields(
            nickname = %profile.nickname.as_ref(),
            from_email = %profile.from_email.as_ref(),
        )
    )]
    pub async fn create_sender(
        &self,
        profile: &SenderProfile,
    ) -> Result<ApiResponse, reqwest::Error> {
        let resp = self
            .http_client
            .post(format!("{}/verified_senders", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(profile)
            .send()
            .await?;
        ApiResponse::read(resp).await
    }

    /// `GET /verified_senders/verify/{token}`
    #[tracing::instrument(name = "Submitting verification token", skip_all)]
    pub async fn verify_sender(
        &self,
        token: &VerificationToken,
    ) -> Result<ApiResponse, reqwest::Error> {
        let resp = self
            .http_client
            .get(format!(
                "{}/verified_senders/verify/{}",
                self.base_url,
                token.as_path_segment()
            ))
            .bearer_auth(self.api_key.expose_secret())
            .send()
            .await?;
        ApiResponse::read(resp).await
    }
}
