use serde::Serialize;

pub const DEFAULT_SUBJECT: &str = "Website contact";
pub const MAX_SUBJECT_LENGTH: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactField {
    Name,
    Email,
    Subject,
    Message,
    Phone,
    TurnstileToken,
}

impl ContactField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Subject => "subject",
            Self::Message => "message",
            Self::Phone => "phone",
            Self::TurnstileToken => "token",
        }
    }
}

/// Accepted payload keys per canonical field. Earlier keys win when a form
/// sends more than one.
pub const FIELD_ALIASES: &[(ContactField, &[&str])] = &[
    (ContactField::Name, &["name", "fullName"]),
    (ContactField::Email, &["email", "emailAddress"]),
    (ContactField::Subject, &["subject", "service"]),
    (ContactField::Message, &["message", "body"]),
    (ContactField::Phone, &["phone", "tel"]),
    (
        ContactField::TurnstileToken,
        &["token", "turnstileToken", "cf-turnstile-response"],
    ),
];

pub const REQUIRED_FIELDS: [ContactField; 3] =
    [ContactField::Name, ContactField::Email, ContactField::Message];

#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub phone: Option<String>,
    pub turnstile_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ContactReply {
    pub success: bool,
    pub id: Option<String>,
}
