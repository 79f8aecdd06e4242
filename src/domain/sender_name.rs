use serde::Serialize;

/// A display name (`nickname`, `from_name`, `reply_to_name`). Anything but a
/// blank string is passed through; SendGrid does its own checks.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SenderName(String);

impl SenderName {
    pub fn parse(name: String) -> Result<Self, String> {
        match name.trim().is_empty() {
            true => Err(format!("Invalid name: {name:?}")),
            false => Ok(Self(name)),
        }
    }
}

impl AsRef<str> for SenderName {
    fn as_ref(&self) -> &str { &self.0 }
}
