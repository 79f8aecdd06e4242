use serde::Serialize;

use super::SenderEmail;
use super::SenderName;

/// Request body of `POST /verified_senders`. Built once at startup (see
/// `configuration::SenderSettings`) and never mutated.
///
/// Field names are the ones the API expects; the postal address is passed
/// through as-is.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SenderProfile {
    pub nickname: SenderName,
    pub from_email: SenderEmail,
    pub from_name: SenderName,
    pub reply_to: SenderEmail,
    pub reply_to_name: SenderName,
    pub address: String,
    pub address2: String,
    pub state: String,
    pub city: String,
    pub country: String,
    pub zip: String,
}
