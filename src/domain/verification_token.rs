/// Opaque token extracted from a verification link. Only ever used as the
/// last path segment of `GET /verified_senders/verify/{token}`.
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationToken(String);

impl VerificationToken {
    /// An empty `token=` parameter is as good as a missing one. Deliberately
    /// stricter than passing `""` on, which would hit
    /// `/verified_senders/verify/` with no token at all.
    pub fn parse(token: &str) -> Option<Self> {
        match token.is_empty() {
            true => None,
            false => Some(Self(token.to_owned())),
        }
    }

    /// Percent-encoded, so that the token always stays a single path segment
    pub fn as_path_segment(&self) -> String { urlencoding::encode(&self.0).into_owned() }
}

impl AsRef<str> for VerificationToken {
    fn as_ref(&self) -> &str { &self.0 }
}
