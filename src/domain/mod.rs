mod sender_email;
mod sender_name;
mod sender_profile;
mod verification_token;
// allow external `use` statements to skip `sender_profile` etc
pub use sender_email::SenderEmail;
pub use sender_name::SenderName;
pub use sender_profile::SenderProfile;
pub use verification_token::VerificationToken;
