use tracing::{debug, info, warn};

use super::{
    schemas::*,
    transport::{OutboundRequest, Transport},
};
use crate::apex::utils::{DETAILS_MAX_CHARS, RelayError, truncate_chars};

/// Returns the bearer credential for this request, or `None` for providers
/// that need none. A direct token is used as-is; a refresh triple is
/// exchanged against each accounts base in order until one answers.
pub async fn obtain_access_token(
    transport: &dyn Transport,
    config: &ProviderConfig,
) -> Result<Option<AccessToken>, RelayError> {
    match &config.credential {
        Credential::None => Ok(None),
        Credential::DirectToken(token) => Ok(Some(AccessToken::new(token.clone()))),
        Credential::RefreshTriple {
            refresh_token,
            client_id,
            client_secret,
        } => {
            let mut failures: Vec<AttemptError> = Vec::new();

            for base in &config.accounts_bases {
                match refresh_at(transport, config, base, refresh_token, client_id, client_secret)
                    .await
                {
                    Ok(token) => {
                        info!(accounts_base = %base, "access token refreshed");
                        return Ok(Some(token));
                    }
                    Err(error) => {
                        warn!(accounts_base = %base, %error, "token refresh attempt failed");
                        failures.push(error);
                    }
                }
            }

            let details = failures
                .first()
                .map(ToString::to_string)
                .unwrap_or_else(|| "No accounts base configured".to_string());

            Err(RelayError::UpstreamAuth(details))
        }
    }
}

async fn refresh_at(
    transport: &dyn Transport,
    config: &ProviderConfig,
    base: &str,
    refresh_token: &str,
    client_id: &str,
    client_secret: &str,
) -> Result<AccessToken, AttemptError> {
    let request = OutboundRequest::form(
        format!("{}/oauth/v2/token", base),
        &[
            ("refresh_token", refresh_token),
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("grant_type", "refresh_token"),
        ],
    );

    let reply = transport
        .post(request)
        .await
        .map_err(|e| AttemptError::Transport(config.scrub(&e.to_string())))?;

    if !reply.is_success() {
        return Err(AttemptError::Status {
            base: base.to_string(),
            status: reply.status,
            detail: config.scrub(&reply.body),
        });
    }

    let parsed: TokenResponse = parse_lenient(&reply.body);
    match parsed.access_token.filter(|token| !token.trim().is_empty()) {
        Some(token) => Ok(AccessToken::new(token.trim())),
        None => Err(AttemptError::Rejected {
            base: base.to_string(),
            detail: match parsed.error {
                Some(error) => config.scrub(&error),
                None => "response did not include an access_token".to_string(),
            },
        }),
    }
}

/// Sends `message` through the configured provider, trying each API base in
/// order and stopping at the first that accepts it.
pub async fn send_message(
    transport: &dyn Transport,
    config: &ProviderConfig,
    token: Option<&AccessToken>,
    message: &OutboundMessage,
) -> SendResult {
    let mut failures: Vec<AttemptError> = Vec::new();

    for base in &config.api_bases {
        let attempt = match config.kind {
            ProviderKind::Zoho => send_via_zoho(transport, config, base, token, message).await,
            ProviderKind::MailChannels => {
                send_via_mailchannels(transport, config, base, message).await
            }
            ProviderKind::Resend => send_via_resend(transport, config, base, token, message).await,
        };

        match attempt {
            Ok(message_id) => {
                info!(
                    provider = config.kind.as_str(),
                    api_base = %base,
                    message_id = message_id.as_deref().unwrap_or("-"),
                    "message accepted"
                );
                return SendResult::delivered(message_id);
            }
            Err(error) => {
                warn!(provider = config.kind.as_str(), api_base = %base, %error, "send attempt failed");
                failures.push(error);
            }
        }
    }

    match failures.first() {
        Some(error) => SendResult::failed(error),
        None => SendResult::failed(&AttemptError::Transport(
            "No API base configured".to_string(),
        )),
    }
}

async fn send_via_zoho(
    transport: &dyn Transport,
    config: &ProviderConfig,
    base: &str,
    token: Option<&AccessToken>,
    message: &OutboundMessage,
) -> Result<Option<String>, AttemptError> {
    let Some(token) = token else {
        return Err(AttemptError::Rejected {
            base: base.to_string(),
            detail: "no access token available".to_string(),
        });
    };

    let request = OutboundRequest::form(
        format!("{}/api/accounts/{}/messages", base, config.account_id),
        &[
            ("fromAddress", config.from_address.as_str()),
            ("toAddress", config.to_address.as_str()),
            ("replyTo", message.reply_to.as_str()),
            ("subject", message.subject.as_str()),
            ("content", message.text.as_str()),
            ("mailFormat", "plaintext"),
        ],
    )
    .with_authorization(format!("Zoho-oauthtoken {}", token.secret()));

    let reply = transport
        .post(request)
        .await
        .map_err(|e| AttemptError::Transport(config.scrub_with(&e.to_string(), Some(token))))?;

    if !reply.is_success() {
        return Err(AttemptError::Status {
            base: base.to_string(),
            status: reply.status,
            detail: config.scrub_with(&reply.body, Some(token)),
        });
    }

    let parsed = ZohoSendReply::parse(&reply.body);

    if let Some(code) = parsed.failure_code() {
        let description = parsed.description.as_deref().unwrap_or("unknown error");
        return Err(AttemptError::Rejected {
            base: base.to_string(),
            detail: config.scrub_with(
                &format!("status code {}: {}", code, description),
                Some(token),
            ),
        });
    }

    Ok(parsed.message_id)
}

async fn send_via_mailchannels(
    transport: &dyn Transport,
    config: &ProviderConfig,
    base: &str,
    message: &OutboundMessage,
) -> Result<Option<String>, AttemptError> {
    let email_request = MailChannelsEmailRequest {
        personalizations: vec![MailChannelsPersonalization {
            to: vec![MailChannelsContact {
                email: config.to_address.clone(),
                name: Some(RECIPIENT_DISPLAY_NAME.to_string()),
            }],
        }],
        from: MailChannelsContact {
            email: config.from_address.clone(),
            name: Some(SENDER_DISPLAY_NAME.to_string()),
        },
        reply_to: vec![MailChannelsContact {
            email: message.reply_to.clone(),
            name: Some(message.reply_name.clone()),
        }],
        subject: message.subject.clone(),
        content: vec![MailChannelsContent {
            content_type: "text/html".to_string(),
            value: message.html.clone(),
        }],
    };

    let body = serde_json::to_value(&email_request)
        .map_err(|e| AttemptError::Transport(format!("Failed to encode request: {}", e)))?;

    let reply = transport
        .post(OutboundRequest::json(format!("{}/send", base), body))
        .await
        .map_err(|e| AttemptError::Transport(config.scrub(&e.to_string())))?;

    if !reply.is_success() {
        return Err(AttemptError::Status {
            base: base.to_string(),
            status: reply.status,
            detail: config.scrub(&reply.body),
        });
    }

    Ok(None)
}

async fn send_via_resend(
    transport: &dyn Transport,
    config: &ProviderConfig,
    base: &str,
    token: Option<&AccessToken>,
    message: &OutboundMessage,
) -> Result<Option<String>, AttemptError> {
    let Some(token) = token else {
        return Err(AttemptError::Rejected {
            base: base.to_string(),
            detail: "no API key available".to_string(),
        });
    };

    let email_request = ResendEmailRequest {
        from: format!("{} <{}>", SENDER_DISPLAY_NAME, config.from_address),
        to: vec![config.to_address.clone()],
        reply_to: message.reply_to.clone(),
        subject: message.subject.clone(),
        text: message.text.clone(),
    };

    let body = serde_json::to_value(&email_request)
        .map_err(|e| AttemptError::Transport(format!("Failed to encode request: {}", e)))?;

    let reply = transport
        .post(
            OutboundRequest::json(format!("{}/emails", base), body)
                .with_authorization(format!("Bearer {}", token.secret())),
        )
        .await
        .map_err(|e| AttemptError::Transport(config.scrub_with(&e.to_string(), Some(token))))?;

    if !reply.is_success() {
        return Err(AttemptError::Status {
            base: base.to_string(),
            status: reply.status,
            detail: config.scrub_with(&reply.body, Some(token)),
        });
    }

    let parsed: ResendEmailResponse = parse_lenient(&reply.body);
    Ok(parsed.id.filter(|id| !id.is_empty()))
}

/// Checks a Turnstile token with Cloudflare. Only called when a secret is
/// configured.
pub async fn verify_turnstile(
    transport: &dyn Transport,
    secret: &str,
    token: Option<&str>,
    remote_ip: Option<&str>,
) -> Result<(), RelayError> {
    let Some(token) = token.filter(|token| !token.is_empty()) else {
        return Err(RelayError::BotCheckFailed(
            "Missing verification token".to_string(),
        ));
    };

    let mut fields = vec![("secret", secret), ("response", token)];
    if let Some(ip) = remote_ip {
        fields.push(("remoteip", ip));
    }

    let reply = transport
        .post(OutboundRequest::form(TURNSTILE_VERIFY_URL.to_string(), &fields))
        .await
        .map_err(|e| RelayError::Network {
            service: "verification service",
            details: truncate_chars(&e.to_string().replace(secret, "[redacted]"), DETAILS_MAX_CHARS),
        })?;

    let parsed: TurnstileResponse = parse_lenient(&reply.body);
    if reply.is_success() && parsed.success {
        debug!("turnstile token accepted");
        return Ok(());
    }

    Err(RelayError::BotCheckFailed(parsed.error_codes.join(", ")))
}
