use std::{env::var, fmt};

pub const ENV_MAIL_PROVIDER: &str = "MAIL_PROVIDER";
pub const ENV_ZOHO_ACCOUNT_ID: &str = "ZOHO_ACCOUNT_ID";
pub const ENV_ZOHO_ACCESS_TOKEN: &str = "ZOHO_ACCESS_TOKEN";
pub const ENV_ZOHO_REFRESH_TOKEN: &str = "ZOHO_REFRESH_TOKEN";
pub const ENV_ZOHO_CLIENT_ID: &str = "ZOHO_CLIENT_ID";
pub const ENV_ZOHO_CLIENT_SECRET: &str = "ZOHO_CLIENT_SECRET";
pub const ENV_ZOHO_ACCOUNTS_BASE: &str = "ZOHO_ACCOUNTS_BASE";
pub const ENV_ZOHO_API_BASE: &str = "ZOHO_API_BASE";
pub const ENV_ZOHO_REGION: &str = "ZOHO_REGION";
pub const ENV_MAIL_FROM: &str = "MAIL_FROM";
pub const ENV_MAIL_TO: &str = "MAIL_TO";
pub const ENV_RESEND_API_KEY: &str = "RESEND_API_KEY";
pub const ENV_TURNSTILE_SECRET: &str = "TURNSTILE_SECRET";
pub const ENV_ALLOWED_ORIGIN: &str = "ALLOWED_ORIGIN";

pub const DEFAULT_MAIL_FROM: &str = "noreply@geoconsultants.eu";
pub const DEFAULT_MAIL_TO: &str = "info@geoconsultants.eu";
pub const DEFAULT_ALLOWED_ORIGIN: &str = "*";

/// Raw configuration captured once at startup. Nothing here is validated;
/// `ProviderConfig::resolve` turns it into something sendable per request.
#[derive(Clone, Default)]
pub struct Settings {
    pub mail_provider: Option<String>,
    pub zoho_account_id: Option<String>,
    pub zoho_access_token: Option<String>,
    pub zoho_refresh_token: Option<String>,
    pub zoho_client_id: Option<String>,
    pub zoho_client_secret: Option<String>,
    pub zoho_accounts_base: Option<String>,
    pub zoho_api_base: Option<String>,
    pub zoho_region: Option<String>,
    pub mail_from: String,
    pub mail_to: String,
    pub resend_api_key: Option<String>,
    pub turnstile_secret: Option<String>,
    pub allowed_origin: String,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Self {
            mail_provider: read(ENV_MAIL_PROVIDER),
            zoho_account_id: read(ENV_ZOHO_ACCOUNT_ID),
            zoho_access_token: read(ENV_ZOHO_ACCESS_TOKEN),
            zoho_refresh_token: read(ENV_ZOHO_REFRESH_TOKEN),
            zoho_client_id: read(ENV_ZOHO_CLIENT_ID),
            zoho_client_secret: read(ENV_ZOHO_CLIENT_SECRET),
            zoho_accounts_base: read(ENV_ZOHO_ACCOUNTS_BASE),
            zoho_api_base: read(ENV_ZOHO_API_BASE),
            zoho_region: read(ENV_ZOHO_REGION),
            mail_from: read(ENV_MAIL_FROM).unwrap_or_else(|| DEFAULT_MAIL_FROM.to_string()),
            mail_to: read(ENV_MAIL_TO).unwrap_or_else(|| DEFAULT_MAIL_TO.to_string()),
            resend_api_key: read(ENV_RESEND_API_KEY),
            turnstile_secret: read(ENV_TURNSTILE_SECRET),
            allowed_origin: read(ENV_ALLOWED_ORIGIN)
                .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGIN.to_string()),
        }
    }
}

// Secrets are reported by presence only.
impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("mail_provider", &self.mail_provider)
            .field("zoho_account_id", &self.zoho_account_id)
            .field("zoho_access_token", &self.zoho_access_token.is_some())
            .field("zoho_refresh_token", &self.zoho_refresh_token.is_some())
            .field("zoho_client_id", &self.zoho_client_id.is_some())
            .field("zoho_client_secret", &self.zoho_client_secret.is_some())
            .field("zoho_accounts_base", &self.zoho_accounts_base)
            .field("zoho_api_base", &self.zoho_api_base)
            .field("zoho_region", &self.zoho_region)
            .field("mail_from", &self.mail_from)
            .field("mail_to", &self.mail_to)
            .field("resend_api_key", &self.resend_api_key.is_some())
            .field("turnstile_secret", &self.turnstile_secret.is_some())
            .field("allowed_origin", &self.allowed_origin)
            .finish()
    }
}
