use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::apex::{
    config::{
        ENV_MAIL_FROM, ENV_MAIL_PROVIDER, ENV_MAIL_TO, ENV_RESEND_API_KEY, ENV_ZOHO_ACCESS_TOKEN,
        ENV_ZOHO_ACCOUNT_ID, ENV_ZOHO_CLIENT_ID, ENV_ZOHO_CLIENT_SECRET, ENV_ZOHO_REFRESH_TOKEN,
        Settings,
    },
    utils::{DETAILS_MAX_CHARS, RelayError, truncate_chars},
};

pub const ZOHO_ACCOUNTS_BASE_COM: &str = "https://accounts.zoho.com";
pub const ZOHO_ACCOUNTS_BASE_EU: &str = "https://accounts.zoho.eu";
pub const ZOHO_API_BASE_COM: &str = "https://mail.zoho.com";
pub const ZOHO_API_BASE_EU: &str = "https://mail.zoho.eu";
pub const MAILCHANNELS_API_BASE_URL: &str = "https://api.mailchannels.net/tx/v1";
pub const RESEND_API_BASE_URL: &str = "https://api.resend.com";
pub const TURNSTILE_VERIFY_URL: &str =
    "https://challenges.cloudflare.com/turnstile/v0/siteverify";

pub const ZOHO_SUCCESS_CODE: i64 = 200;
pub const SENDER_DISPLAY_NAME: &str = "Website Form";
pub const RECIPIENT_DISPLAY_NAME: &str = "GeoConsultants";
const REDACTED: &str = "[redacted]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Com,
    Eu,
}

impl Region {
    pub fn from_hint(hint: &str) -> Option<Self> {
        match hint.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "eu" => Some(Self::Eu),
            "com" | "us" => Some(Self::Com),
            _ => None,
        }
    }

    pub fn accounts_base(self) -> &'static str {
        match self {
            Self::Com => ZOHO_ACCOUNTS_BASE_COM,
            Self::Eu => ZOHO_ACCOUNTS_BASE_EU,
        }
    }

    pub fn api_base(self) -> &'static str {
        match self {
            Self::Com => ZOHO_API_BASE_COM,
            Self::Eu => ZOHO_API_BASE_EU,
        }
    }
}

/// Preferred region first. An explicit hint wins, then a `.eu` sender or
/// recipient, then `.com`.
pub fn region_order(hint: Option<&str>, from_address: &str, to_address: &str) -> [Region; 2] {
    let ends_in_eu = |address: &str| address.trim().to_ascii_lowercase().ends_with(".eu");

    let preferred = hint.and_then(Region::from_hint).unwrap_or_else(|| {
        if ends_in_eu(from_address) || ends_in_eu(to_address) {
            Region::Eu
        } else {
            Region::Com
        }
    });

    match preferred {
        Region::Com => [Region::Com, Region::Eu],
        Region::Eu => [Region::Eu, Region::Com],
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Zoho,
    MailChannels,
    Resend,
}

impl ProviderKind {
    pub fn parse(value: Option<&str>) -> Result<Self, RelayError> {
        match value.map(str::to_ascii_lowercase).as_deref() {
            None | Some("zoho") => Ok(Self::Zoho),
            Some("mailchannels") => Ok(Self::MailChannels),
            Some("resend") => Ok(Self::Resend),
            Some(other) => Err(RelayError::Configuration(format!(
                "{} must be one of zoho, mailchannels, resend (got {})",
                ENV_MAIL_PROVIDER, other
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Zoho => "zoho",
            Self::MailChannels => "mailchannels",
            Self::Resend => "resend",
        }
    }
}

#[derive(Clone, PartialEq)]
pub enum Credential {
    None,
    DirectToken(String),
    RefreshTriple {
        refresh_token: String,
        client_id: String,
        client_secret: String,
    },
}

impl Credential {
    fn secrets(&self) -> Vec<&str> {
        match self {
            Self::None => Vec::new(),
            Self::DirectToken(token) => vec![token.as_str()],
            Self::RefreshTriple {
                refresh_token,
                client_secret,
                ..
            } => vec![refresh_token.as_str(), client_secret.as_str()],
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::DirectToken(_) => write!(f, "DirectToken({})", REDACTED),
            Self::RefreshTriple { client_id, .. } => f
                .debug_struct("RefreshTriple")
                .field("client_id", client_id)
                .finish_non_exhaustive(),
        }
    }
}

/// Everything one request needs to reach the mail provider. Built per
/// request from `Settings` and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub account_id: String,
    pub from_address: String,
    pub to_address: String,
    pub credential: Credential,
    pub accounts_bases: Vec<String>,
    pub api_bases: Vec<String>,
}

impl ProviderConfig {
    pub fn resolve(settings: &Settings) -> Result<Self, RelayError> {
        let kind = ProviderKind::parse(settings.mail_provider.as_deref())?;

        let mut missing: Vec<String> = Vec::new();
        if settings.mail_from.trim().is_empty() {
            missing.push(ENV_MAIL_FROM.to_string());
        }
        if settings.mail_to.trim().is_empty() {
            missing.push(ENV_MAIL_TO.to_string());
        }

        let from_address = settings.mail_from.trim().to_string();
        let to_address = settings.mail_to.trim().to_string();

        match kind {
            ProviderKind::Zoho => {
                let account_id = settings.zoho_account_id.clone().unwrap_or_default();
                if account_id.is_empty() {
                    missing.push(ENV_ZOHO_ACCOUNT_ID.to_string());
                }

                let credential = match zoho_credential(settings) {
                    Ok(credential) => Some(credential),
                    Err(absent) => {
                        missing.extend(absent);
                        None
                    }
                };

                let (Some(credential), true) = (credential, missing.is_empty()) else {
                    return Err(missing_configuration(&missing));
                };

                let regions = region_order(
                    settings.zoho_region.as_deref(),
                    &from_address,
                    &to_address,
                );

                Ok(Self {
                    kind,
                    account_id,
                    from_address,
                    to_address,
                    credential,
                    accounts_bases: candidate_bases(
                        settings.zoho_accounts_base.as_deref(),
                        regions.map(Region::accounts_base),
                    ),
                    api_bases: candidate_bases(
                        settings.zoho_api_base.as_deref(),
                        regions.map(Region::api_base),
                    ),
                })
            }
            ProviderKind::MailChannels => {
                if !missing.is_empty() {
                    return Err(missing_configuration(&missing));
                }
                Ok(Self {
                    kind,
                    account_id: String::new(),
                    from_address,
                    to_address,
                    credential: Credential::None,
                    accounts_bases: Vec::new(),
                    api_bases: vec![MAILCHANNELS_API_BASE_URL.to_string()],
                })
            }
            ProviderKind::Resend => {
                let api_key = settings.resend_api_key.clone().unwrap_or_default();
                if api_key.is_empty() {
                    missing.push(ENV_RESEND_API_KEY.to_string());
                }
                if !missing.is_empty() {
                    return Err(missing_configuration(&missing));
                }
                Ok(Self {
                    kind,
                    account_id: String::new(),
                    from_address,
                    to_address,
                    credential: Credential::DirectToken(api_key),
                    accounts_bases: Vec::new(),
                    api_bases: vec![RESEND_API_BASE_URL.to_string()],
                })
            }
        }
    }

    /// Replaces any configured secret that leaked into `text` and bounds its
    /// length, so upstream bodies can be echoed to clients and logs.
    pub fn scrub(&self, text: &str) -> String {
        self.scrub_with(text, None)
    }

    /// Like [`ProviderConfig::scrub`], also redacting the access token in use
    /// for this request.
    pub fn scrub_with(&self, text: &str, token: Option<&AccessToken>) -> String {
        let live = token.map(AccessToken::secret);
        let mut cleaned = text.to_string();
        for secret in self.credential.secrets().into_iter().chain(live) {
            if !secret.is_empty() {
                cleaned = cleaned.replace(secret, REDACTED);
            }
        }
        truncate_chars(&cleaned, DETAILS_MAX_CHARS)
    }
}

fn zoho_credential(settings: &Settings) -> Result<Credential, Vec<String>> {
    if let Some(token) = &settings.zoho_access_token {
        return Ok(Credential::DirectToken(token.clone()));
    }

    let triple = [
        (ENV_ZOHO_REFRESH_TOKEN, &settings.zoho_refresh_token),
        (ENV_ZOHO_CLIENT_ID, &settings.zoho_client_id),
        (ENV_ZOHO_CLIENT_SECRET, &settings.zoho_client_secret),
    ];

    let absent: Vec<String> = triple
        .iter()
        .filter(|(_, value)| value.is_none())
        .map(|(name, _)| name.to_string())
        .collect();

    match (
        &settings.zoho_refresh_token,
        &settings.zoho_client_id,
        &settings.zoho_client_secret,
    ) {
        (Some(refresh_token), Some(client_id), Some(client_secret)) => {
            Ok(Credential::RefreshTriple {
                refresh_token: refresh_token.clone(),
                client_id: client_id.clone(),
                client_secret: client_secret.clone(),
            })
        }
        _ if absent.len() == triple.len() => Err(vec![format!(
            "{} (or {}, {} and {})",
            ENV_ZOHO_ACCESS_TOKEN, ENV_ZOHO_REFRESH_TOKEN, ENV_ZOHO_CLIENT_ID, ENV_ZOHO_CLIENT_SECRET
        )]),
        _ => Err(absent),
    }
}

fn missing_configuration(missing: &[String]) -> RelayError {
    RelayError::Configuration(format!("missing {}", missing.join(", ")))
}

fn candidate_bases(explicit: Option<&str>, regional: [&str; 2]) -> Vec<String> {
    match explicit {
        Some(base) => vec![base.trim_end_matches('/').to_string()],
        None => regional.iter().map(|base| base.to_string()).collect(),
    }
}

/// Bearer credential for one request. Never printed.
#[derive(Clone, PartialEq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[inline]
    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessToken({})", REDACTED)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub reply_to: String,
    pub reply_name: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SendResult {
    pub ok: bool,
    pub provider_message_id: Option<String>,
    pub error_detail: Option<String>,
    pub http_status: u16,
    pub transport_failure: bool,
}

impl SendResult {
    pub fn delivered(provider_message_id: Option<String>) -> Self {
        Self {
            ok: true,
            provider_message_id,
            error_detail: None,
            http_status: StatusCode::OK.as_u16(),
            transport_failure: false,
        }
    }

    pub fn failed(error: &AttemptError) -> Self {
        Self {
            ok: false,
            provider_message_id: None,
            error_detail: Some(error.to_string()),
            http_status: error
                .upstream_status()
                .unwrap_or(StatusCode::BAD_GATEWAY.as_u16()),
            transport_failure: matches!(error, AttemptError::Transport(_)),
        }
    }

    /// Maps the outcome onto the client-facing result. Any upstream failure is
    /// a 502; the upstream status stays in the details.
    pub fn into_outcome(self) -> Result<Option<String>, RelayError> {
        if self.ok {
            return Ok(self.provider_message_id);
        }

        let details = self.error_detail.unwrap_or_default();
        if self.transport_failure {
            return Err(RelayError::Network {
                service: "mail provider",
                details,
            });
        }

        Err(RelayError::UpstreamSend {
            status: StatusCode::BAD_GATEWAY,
            details,
        })
    }
}

/// Failure against a single base URL inside a fallback loop.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AttemptError {
    #[error("{base} responded {status}: {detail}")]
    Status {
        base: String,
        status: u16,
        detail: String,
    },

    #[error("{base} rejected the request: {detail}")]
    Rejected { base: String, detail: String },

    #[error("{0}")]
    Transport(String),
}

impl AttemptError {
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Rejected { .. } | Self::Transport(_) => None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    pub error: Option<String>,
}

/// What a Zoho send body says, read field by field so one oddly typed field
/// cannot hide the embedded status code.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ZohoSendReply {
    pub code: Option<String>,
    pub description: Option<String>,
    pub message_id: Option<String>,
}

impl ZohoSendReply {
    pub fn parse(body: &str) -> Self {
        let value: Value = parse_lenient(body);
        let status = value.get("status");

        let code = status
            .and_then(|status| status.get("code"))
            .and_then(|code| match code {
                Value::Null => None,
                Value::String(code) => Some(code.trim().to_string()),
                other => Some(other.to_string()),
            });

        let description = status
            .and_then(|status| status.get("description"))
            .and_then(Value::as_str)
            .map(str::to_string);

        let message_id = value
            .get("data")
            .and_then(|data| data.get("messageId"))
            .and_then(|id| match id {
                Value::String(id) if !id.is_empty() => Some(id.clone()),
                Value::Number(id) => Some(id.to_string()),
                _ => None,
            });

        Self {
            code,
            description,
            message_id,
        }
    }

    /// The embedded status code when it is present and not a success.
    pub fn failure_code(&self) -> Option<&str> {
        self.code
            .as_deref()
            .filter(|code| code.parse::<i64>().ok() != Some(ZOHO_SUCCESS_CODE))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MailChannelsEmailRequest {
    pub personalizations: Vec<MailChannelsPersonalization>,
    pub from: MailChannelsContact,
    pub reply_to: Vec<MailChannelsContact>,
    pub subject: String,
    pub content: Vec<MailChannelsContent>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MailChannelsPersonalization {
    pub to: Vec<MailChannelsContact>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MailChannelsContact {
    pub email: String,
    pub name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MailChannelsContent {
    #[serde(rename = "type")]
    pub content_type: String,
    pub value: String,
}

#[derive(Debug, Serialize)]
pub struct ResendEmailRequest {
    pub from: String,
    pub to: Vec<String>,
    pub reply_to: String,
    pub subject: String,
    pub text: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ResendEmailResponse {
    pub id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TurnstileResponse {
    pub success: bool,
    #[serde(rename = "error-codes")]
    pub error_codes: Vec<String>,
}

/// Upstream bodies are not guaranteed to be JSON; anything unparsable reads
/// as an empty response.
pub fn parse_lenient<T>(body: &str) -> T
where
    T: for<'de> Deserialize<'de> + Default,
{
    serde_json::from_str(body).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn zoho_settings() -> Settings {
        Settings {
            zoho_account_id: Some("6000001".into()),
            zoho_access_token: Some("direct-token".into()),
            mail_from: "noreply@geoconsultants.eu".into(),
            mail_to: "info@geoconsultants.eu".into(),
            ..Settings::default()
        }
    }

    #[test]
    fn region_hint_beats_address_inference() {
        assert_eq!(
            region_order(Some("com"), "a@x.eu", "b@y.eu"),
            [Region::Com, Region::Eu]
        );
        assert_eq!(
            region_order(Some(".EU"), "a@x.com", "b@y.com"),
            [Region::Eu, Region::Com]
        );
    }

    #[test]
    fn region_inferred_from_eu_addresses() {
        assert_eq!(
            region_order(None, "a@x.com", "b@y.eu"),
            [Region::Eu, Region::Com]
        );
        assert_eq!(
            region_order(Some("mars"), "a@x.eu", "b@y.com"),
            [Region::Eu, Region::Com]
        );
    }

    #[test]
    fn region_defaults_to_com_first() {
        assert_eq!(
            region_order(None, "a@x.com", "b@y.org"),
            [Region::Com, Region::Eu]
        );
    }

    #[test]
    fn direct_token_resolves_with_regional_candidates() {
        let config = ProviderConfig::resolve(&zoho_settings()).unwrap();
        assert_eq!(config.kind, ProviderKind::Zoho);
        assert_eq!(
            config.credential,
            Credential::DirectToken("direct-token".into())
        );
        assert_eq!(
            config.api_bases,
            vec![ZOHO_API_BASE_EU.to_string(), ZOHO_API_BASE_COM.to_string()]
        );
        assert_eq!(
            config.accounts_bases,
            vec![
                ZOHO_ACCOUNTS_BASE_EU.to_string(),
                ZOHO_ACCOUNTS_BASE_COM.to_string()
            ]
        );
    }

    #[test]
    fn explicit_base_replaces_regional_list() {
        let settings = Settings {
            zoho_api_base: Some("https://mail.zoho.in/".into()),
            ..zoho_settings()
        };
        let config = ProviderConfig::resolve(&settings).unwrap();
        assert_eq!(config.api_bases, vec!["https://mail.zoho.in".to_string()]);
        assert_eq!(config.accounts_bases.len(), 2);
    }

    #[test]
    fn refresh_triple_is_used_without_direct_token() {
        let settings = Settings {
            zoho_access_token: None,
            zoho_refresh_token: Some("r".into()),
            zoho_client_id: Some("c".into()),
            zoho_client_secret: Some("s".into()),
            ..zoho_settings()
        };
        let config = ProviderConfig::resolve(&settings).unwrap();
        assert!(matches!(config.credential, Credential::RefreshTriple { .. }));
    }

    #[test]
    fn missing_account_id_is_named() {
        let settings = Settings {
            zoho_account_id: None,
            ..zoho_settings()
        };
        let error = ProviderConfig::resolve(&settings).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Server misconfigured: missing ZOHO_ACCOUNT_ID"
        );
    }

    #[test]
    fn partial_refresh_triple_names_the_absent_parts() {
        let settings = Settings {
            zoho_access_token: None,
            zoho_refresh_token: Some("r".into()),
            ..zoho_settings()
        };
        let error = ProviderConfig::resolve(&settings).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Server misconfigured: missing ZOHO_CLIENT_ID, ZOHO_CLIENT_SECRET"
        );
    }

    #[test]
    fn no_credential_at_all_names_both_options() {
        let settings = Settings {
            zoho_account_id: None,
            zoho_access_token: None,
            ..zoho_settings()
        };
        let message = ProviderConfig::resolve(&settings).unwrap_err().to_string();
        assert!(message.contains("ZOHO_ACCOUNT_ID"));
        assert!(message.contains("ZOHO_ACCESS_TOKEN (or ZOHO_REFRESH_TOKEN"));
    }

    #[test]
    fn unknown_provider_is_a_configuration_error() {
        let settings = Settings {
            mail_provider: Some("sendmail".into()),
            ..zoho_settings()
        };
        let error = ProviderConfig::resolve(&settings).unwrap_err();
        assert_eq!(error.kind(), "ConfigurationError");
    }

    #[test]
    fn resend_requires_api_key() {
        let settings = Settings {
            mail_provider: Some("Resend".into()),
            ..zoho_settings()
        };
        let error = ProviderConfig::resolve(&settings).unwrap_err();
        assert_eq!(error.to_string(), "Server misconfigured: missing RESEND_API_KEY");

        let settings = Settings {
            mail_provider: Some("resend".into()),
            resend_api_key: Some("re_123".into()),
            ..zoho_settings()
        };
        let config = ProviderConfig::resolve(&settings).unwrap();
        assert_eq!(config.api_bases, vec![RESEND_API_BASE_URL.to_string()]);
    }

    #[test]
    fn mailchannels_needs_no_credential() {
        let settings = Settings {
            mail_provider: Some("mailchannels".into()),
            ..Settings::default()
        };
        let error = ProviderConfig::resolve(&settings).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Server misconfigured: missing MAIL_FROM, MAIL_TO"
        );

        let settings = Settings {
            mail_provider: Some("mailchannels".into()),
            ..zoho_settings()
        };
        let config = ProviderConfig::resolve(&settings).unwrap();
        assert_eq!(config.credential, Credential::None);
    }

    #[test]
    fn scrub_removes_secrets_and_bounds_length() {
        let settings = Settings {
            zoho_access_token: None,
            zoho_refresh_token: Some("1000.refresh".into()),
            zoho_client_id: Some("client".into()),
            zoho_client_secret: Some("shh-secret".into()),
            ..zoho_settings()
        };
        let config = ProviderConfig::resolve(&settings).unwrap();
        let scrubbed = config.scrub(&format!(
            "invalid refresh 1000.refresh for shh-secret {}",
            "z".repeat(400)
        ));
        assert!(!scrubbed.contains("1000.refresh"));
        assert!(!scrubbed.contains("shh-secret"));
        assert!(scrubbed.starts_with("invalid refresh [redacted] for [redacted]"));
        assert_eq!(scrubbed.chars().count(), DETAILS_MAX_CHARS);
    }

    #[test]
    fn scrub_with_redacts_refreshed_token() {
        let settings = Settings {
            zoho_access_token: None,
            zoho_refresh_token: Some("1000.refresh".into()),
            zoho_client_id: Some("client".into()),
            zoho_client_secret: Some("shh-secret".into()),
            ..zoho_settings()
        };
        let config = ProviderConfig::resolve(&settings).unwrap();
        let token = AccessToken::new("1000.fresh-token");

        let scrubbed = config.scrub_with("token 1000.fresh-token is invalid", Some(&token));
        assert_eq!(scrubbed, "token [redacted] is invalid");
        assert!(config.scrub("1000.fresh-token").contains("fresh-token"));
    }

    #[test]
    fn debug_never_prints_credentials() {
        let token = AccessToken::new("live-token");
        assert_eq!(format!("{token:?}"), "AccessToken([redacted])");

        let config = ProviderConfig::resolve(&zoho_settings()).unwrap();
        assert!(!format!("{config:?}").contains("direct-token"));
    }

    #[test]
    fn lenient_parse_treats_garbage_as_empty() {
        let parsed: TokenResponse = parse_lenient("<html>502 Bad Gateway</html>");
        assert!(parsed.access_token.is_none());

        let parsed: Value = parse_lenient("not json");
        assert_eq!(parsed, Value::Null);
    }

    #[test]
    fn zoho_reply_reads_code_and_message_id() {
        let reply = ZohoSendReply::parse(
            r#"{"status":{"code":200,"description":"success"},"data":{"messageId":1712345}}"#,
        );
        assert_eq!(reply.failure_code(), None);
        assert_eq!(reply.message_id.as_deref(), Some("1712345"));

        let reply = ZohoSendReply::parse(r#"{"data":{"messageId":"abc"}}"#);
        assert_eq!(reply.code, None);
        assert_eq!(reply.message_id.as_deref(), Some("abc"));
    }

    #[test]
    fn zoho_failure_code_survives_odd_field_types() {
        let reply = ZohoSendReply::parse(r#"{"status":{"code":"500"}}"#);
        assert_eq!(reply.failure_code(), Some("500"));

        let reply =
            ZohoSendReply::parse(r#"{"status":{"code":500,"description":"fail"},"data":"oops"}"#);
        assert_eq!(reply.failure_code(), Some("500"));
        assert_eq!(reply.description.as_deref(), Some("fail"));
        assert_eq!(reply.message_id, None);

        let reply = ZohoSendReply::parse(r#"{"status":{"code":"200"},"data":[1]}"#);
        assert_eq!(reply.failure_code(), None);
    }

    #[test]
    fn send_result_maps_statuses() {
        let unauthorized = SendResult::failed(&AttemptError::Status {
            base: ZOHO_API_BASE_EU.into(),
            status: 401,
            detail: "INVALID_OAUTHTOKEN".into(),
        });
        assert_eq!(unauthorized.http_status, 401);
        let error = unauthorized.into_outcome().unwrap_err();
        assert_eq!(error.status(), StatusCode::BAD_GATEWAY);
        assert!(error.details().unwrap().contains("responded 401"));

        let upstream_down = SendResult::failed(&AttemptError::Status {
            base: ZOHO_API_BASE_EU.into(),
            status: 503,
            detail: "down".into(),
        });
        assert_eq!(
            upstream_down.into_outcome().unwrap_err().status(),
            StatusCode::BAD_GATEWAY
        );

        let embedded = SendResult::failed(&AttemptError::Rejected {
            base: ZOHO_API_BASE_EU.into(),
            detail: "code 500".into(),
        });
        assert_eq!(embedded.http_status, 502);

        let network = SendResult::failed(&AttemptError::Transport("refused".into()));
        assert_eq!(network.into_outcome().unwrap_err().kind(), "NetworkError");

        assert_eq!(
            SendResult::delivered(Some("m1".into())).into_outcome().unwrap(),
            Some("m1".to_string())
        );
    }
}
