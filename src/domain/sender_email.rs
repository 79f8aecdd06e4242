use serde::Serialize;
use validator::ValidateEmail;

/// A parsed email address, used for both `from_email` and `reply_to` of a
/// sender profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SenderEmail(String);

impl SenderEmail {
    pub fn parse(email: String) -> Result<Self, String> {
        ValidateEmail::validate_email(&email)
            .then_some(Self(email.clone()))
            .ok_or(format!("Invalid email: {email:?}"))
    }
}

impl AsRef<str> for SenderEmail {
    fn as_ref(&self) -> &str { &self.0 }
}
