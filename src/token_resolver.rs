use std::fmt::Debug;
use std::time::Duration;

use reqwest::header::LOCATION;
use reqwest::redirect::Policy;
use reqwest::Client;
use reqwest::StatusCode;
use reqwest::Url;

use crate::domain::VerificationToken;
use crate::utils::error_chain_fmt;

/// Links of this form carry the token directly:
/// `https://app.sendgrid.com/settings/sender_auth/senders/verify?token=...`
const VERIFY_PATH: &str = "/settings/sender_auth/senders/verify";

/// Links of this form wrap a verify link (app-relative, url-encoded):
/// `https://app.sendgrid.com/login?redirect_to=%2Fsettings%2F...`
const LOGIN_PATH: &str = "/login";

/// Turns whatever link the operator pastes into a `VerificationToken`.
///
/// A link is one of:
///
/// 1. a verify link, which holds the token in its `token` param
/// 2. a login link, which holds a verify link in its `redirect_to` param
/// 3. anything else (typically a click-tracking link), which is fetched with
///    redirects disabled; if it answers 302, its `Location` is the next link
///    to look at
///
/// Every login indirection and every HTTP redirect counts as one hop; at most
/// `max_redirects` hops are followed.
pub struct TokenResolver {
    http_client: Client,
    app_base_url: String,
    max_redirects: usize,
}

/// What one hop produced
#[derive(Debug, PartialEq)]
enum Hop {
    Token(VerificationToken),
    Next(String),
}

#[derive(thiserror::Error)]
pub enum ResolveError {
    #[error("Did not find token in verification URL {0:?}")]
    TokenNotFound(String),
    #[error("Gave up resolving verification URL after {0} redirects")]
    TooManyRedirects(usize),
    #[error("Timed out requesting {url:?}")]
    Timeout {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Failed to request {url:?}")]
    RequestFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl Debug for ResolveError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl TokenResolver {
    /// `app_base_url` is the origin of the SendGrid web app, e.g.
    /// `https://app.sendgrid.com`
    pub fn new(
        app_base_url: String,
        max_redirects: usize,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        // `Location` must be inspected at every step, so that verify/login
        // links are caught mid-chain
        let http_client = Client::builder()
            .redirect(Policy::none())
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http_client,
            app_base_url: app_base_url.trim_end_matches('/').to_owned(),
            max_redirects,
        })
    }

    #[tracing::instrument(name = "Resolving verification token", skip_all)]
    pub async fn resolve(
        &self,
        url: &str,
    ) -> Result<VerificationToken, ResolveError> {
        let mut current = url.trim().to_owned();
        for hop in 0..=self.max_redirects {
            tracing::debug!(hop, url = %current, "inspecting link");
            match self.next_hop(&current).await? {
                Hop::Token(token) => return Ok(token),
                Hop::Next(next) => current = next,
            }
        }
        Err(ResolveError::TooManyRedirects(self.max_redirects))
    }

    async fn next_hop(
        &self,
        url: &str,
    ) -> Result<Hop, ResolveError> {
        if url.starts_with(&format!("{}{VERIFY_PATH}", self.app_base_url)) {
            return query_param(url, "token")
                .as_deref()
                .and_then(VerificationToken::parse)
                .map(Hop::Token)
                .ok_or_else(|| ResolveError::TokenNotFound(url.to_owned()));
        }

        if url.starts_with(&format!("{}{LOGIN_PATH}", self.app_base_url)) {
            return query_param(url, "redirect_to")
                .map(|redirect_to| Hop::Next(format!("{}{redirect_to}", self.app_base_url)))
                .ok_or_else(|| ResolveError::TokenNotFound(url.to_owned()));
        }

        self.follow_redirect(url).await
    }

    /// The only hop that touches the network. Only a 302 with a `Location`
    /// header moves resolution forward; every other response is a dead end.
    #[tracing::instrument(name = "Probing link for redirect", skip(self))]
    async fn follow_redirect(
        &self,
        url: &str,
    ) -> Result<Hop, ResolveError> {
        let parsed = Url::parse(url).map_err(|_| ResolveError::TokenNotFound(url.to_owned()))?;

        let resp = self
            .http_client
            .get(parsed.clone())
            .send()
            .await
            .map_err(|e| match e.is_timeout() {
                true => ResolveError::Timeout {
                    url: url.to_owned(),
                    source: e,
                },
                false => ResolveError::RequestFailed {
                    url: url.to_owned(),
                    source: e,
                },
            })?;

        let status = resp.status();
        if !is_redirect(status) {
            tracing::warn!(%status, "link did not redirect");
            return Err(ResolveError::TokenNotFound(url.to_owned()));
        }

        let location = resp
            .headers()
            .get(LOCATION)
            .and_then(|l| l.to_str().ok())
            .ok_or_else(|| ResolveError::TokenNotFound(url.to_owned()))?;

        // relative locations are resolved against the link that produced them
        let next = parsed
            .join(location)
            .map(String::from)
            .unwrap_or_else(|_| location.to_owned());
        Ok(Hop::Next(next))
    }
}

/// Only `302 Found` counts; other 3xx responses are dead ends like any other
/// status.
fn is_redirect(status: StatusCode) -> bool { status == StatusCode::FOUND }

/// Decoded value of the first query param called `name`
fn query_param(
    url: &str,
    name: &str,
) -> Option<String> {
    Url::parse(url)
        .ok()?
        .query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}
