use std::fmt::Debug;

use reqwest::StatusCode;

use crate::configuration::Settings;
use crate::console::OperatorConsole;
use crate::domain::SenderProfile;
use crate::sendgrid_client::ApiResponse;
use crate::sendgrid_client::SendGridClient;
use crate::token_resolver::ResolveError;
use crate::token_resolver::TokenResolver;
use crate::utils::error_chain_fmt;

pub const VERIFICATION_URL_PROMPT: &str = "Enter verification URL:";

/// Steps are strictly sequential; there is no way back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    Start,
    SenderSubmitted,
    AwaitingInput,
    TokenResolved,
    VerifySubmitted,
    Done,
}

/// Statuses of the two API calls of a completed run
#[derive(Debug)]
pub struct WorkflowReport {
    pub registration: StatusCode,
    pub verification: StatusCode,
}

impl WorkflowReport {
    pub fn verified(&self) -> bool { self.verification.is_success() }
}

/// Fatal errors only. Non-success API responses are reported to the operator
/// and do not stop the run.
#[derive(thiserror::Error)]
pub enum WorkflowError {
    #[error("Could not resolve verification token")]
    TokenResolution(#[from] ResolveError),
    #[error("Request to the SendGrid API failed")]
    Api(#[from] reqwest::Error),
    #[error("Console I/O failed")]
    Console(#[from] std::io::Error),
}

impl Debug for WorkflowError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

/// Register sender -> ask operator for the emailed link -> resolve token ->
/// verify sender
pub struct Workflow {
    client: SendGridClient,
    resolver: TokenResolver,
    sender: SenderProfile,
    state: WorkflowState,
}

impl Workflow {
    pub fn new(
        client: SendGridClient,
        resolver: TokenResolver,
        sender: SenderProfile,
    ) -> Self {
        Self {
            client,
            resolver,
            sender,
            state: WorkflowState::Start,
        }
    }

    pub fn build(cfg: Settings) -> Result<Self, reqwest::Error> {
        Ok(Self::new(
            cfg.sendgrid.client()?,
            cfg.sendgrid.resolver()?,
            cfg.sender,
        ))
    }

    /// Last state reached; after a fatal error, this is where the run stopped.
    pub fn state(&self) -> WorkflowState { self.state }

    fn advance(
        &mut self,
        next: WorkflowState,
    ) {
        tracing::info!(from = ?self.state, to = ?next, "workflow advanced");
        self.state = next;
    }

    #[tracing::instrument(
        name = "Verifying sender",
        skip_all,
        fields(
            nickname = %self.sender.nickname.as_ref(),
            from_email = %self.sender.from_email.as_ref(),
        )
    )]
    pub async fn run(
        &mut self,
        console: &mut impl OperatorConsole,
    ) -> Result<WorkflowReport, WorkflowError> {
        let registration = self.client.create_sender(&self.sender).await?;
        if !registration.is_success() {
            report_failure(
                console,
                "Failed to request sender verification.",
                &registration,
            )?;
        }
        self.advance(WorkflowState::SenderSubmitted);

        self.advance(WorkflowState::AwaitingInput);
        let url = console.prompt(VERIFICATION_URL_PROMPT)?;

        let token = self.resolver.resolve(&url).await?;
        self.advance(WorkflowState::TokenResolved);

        let verification = self.client.verify_sender(&token).await?;
        self.advance(WorkflowState::VerifySubmitted);
        match verification.is_success() {
            true => console.report("Sender verified.")?,
            false => report_failure(console, "Failed to verify sender.", &verification)?,
        }

        self.advance(WorkflowState::Done);
        Ok(WorkflowReport {
            registration: registration.status,
            verification: verification.status,
        })
    }
}

/// Status line, raw body, then headers
fn report_failure(
    console: &mut impl OperatorConsole,
    what: &str,
    resp: &ApiResponse,
) -> std::io::Result<()> {
    tracing::warn!(status = %resp.status, body = %resp.body, "{what}");
    console.report(&format!(
        "{what} HTTP status code {}.",
        resp.status.as_u16()
    ))?;
    console.report(&resp.body)?;
    console.report(&resp.headers_dump())
}
