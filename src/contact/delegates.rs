use axum::http::HeaderMap;
use email_address::EmailAddress;
use regex::Regex;
use serde_json::{Map, Value};
use std::{collections::HashMap, sync::LazyLock};
use tracing::debug;

use super::schemas::{
    ContactField, ContactReply, DEFAULT_SUBJECT, FIELD_ALIASES, MAX_SUBJECT_LENGTH,
    REQUIRED_FIELDS, Submission,
};
use crate::{
    AppState,
    apex::utils::{RelayError, truncate_chars},
    notifications::{
        delegates::{obtain_access_token, send_message, verify_turnstile},
        schemas::{OutboundMessage, ProviderConfig},
    },
};

static EMAIL_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email shape pattern is valid")
});

pub fn parse_payload(body: &[u8]) -> Result<Map<String, Value>, RelayError> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(payload)) => Ok(payload),
        _ => Err(RelayError::InvalidPayload),
    }
}

/// Collapses accepted aliases onto canonical fields. Values are trimmed;
/// blanks and non-strings count as absent.
pub fn normalize_fields(payload: &Map<String, Value>) -> HashMap<ContactField, String> {
    FIELD_ALIASES
        .iter()
        .filter_map(|(field, aliases)| {
            aliases
                .iter()
                .find_map(|key| {
                    payload
                        .get(*key)
                        .and_then(Value::as_str)
                        .map(str::trim)
                        .filter(|value| !value.is_empty())
                })
                .map(|value| (*field, value.to_string()))
        })
        .collect()
}

#[inline]
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_SHAPE.is_match(email) && EmailAddress::is_valid(email)
}

pub fn validate_submission(
    mut fields: HashMap<ContactField, String>,
) -> Result<Submission, RelayError> {
    let missing: Vec<&'static str> = REQUIRED_FIELDS
        .iter()
        .filter(|field| !fields.contains_key(*field))
        .map(|field| field.as_str())
        .collect();

    if !missing.is_empty() {
        return Err(RelayError::validation("Missing required fields", missing));
    }

    let mut take = |field: ContactField| fields.remove(&field);

    let (Some(name), Some(email), Some(message)) = (
        take(ContactField::Name),
        take(ContactField::Email),
        take(ContactField::Message),
    ) else {
        return Err(RelayError::validation("Missing required fields", vec![]));
    };

    if !is_valid_email(&email) {
        return Err(RelayError::validation("Invalid email", vec!["email"]));
    }

    Ok(Submission {
        name,
        email,
        subject: take(ContactField::Subject).unwrap_or_else(|| DEFAULT_SUBJECT.to_string()),
        message,
        phone: take(ContactField::Phone),
        turnstile_token: take(ContactField::TurnstileToken),
    })
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

pub fn compose_message(submission: &Submission) -> OutboundMessage {
    let subject = truncate_chars(
        &format!("{} - {}", submission.subject, submission.name),
        MAX_SUBJECT_LENGTH,
    );

    let mut text = format!(
        "New website inquiry - GeoConsultants\n\nName: {}\nEmail: {}\n",
        submission.name, submission.email
    );
    if let Some(phone) = &submission.phone {
        text.push_str(&format!("Phone: {}\n", phone));
    }
    text.push_str(&format!(
        "Subject: {}\n\nMessage:\n{}\n",
        submission.subject, submission.message
    ));

    let phone_line = submission
        .phone
        .as_deref()
        .map(|phone| format!("<p><strong>Phone:</strong> {}</p>", escape_html(phone)))
        .unwrap_or_default();

    let html = format!(
        concat!(
            "<div style=\"font-family:Segoe UI,Arial,sans-serif\">",
            "<h2>New Website Inquiry - GeoConsultants</h2>",
            "<p><strong>Name:</strong> {}</p>",
            "<p><strong>Email:</strong> {}</p>",
            "{}",
            "<p><strong>Subject:</strong> {}</p>",
            "<hr style=\"border:none;border-top:1px solid #ddd;margin:12px 0;\" />",
            "<p><strong>Message:</strong></p>",
            "<pre style=\"white-space:pre-wrap; font-family:inherit;\">{}</pre>",
            "</div>"
        ),
        escape_html(&submission.name),
        escape_html(&submission.email),
        phone_line,
        escape_html(&submission.subject),
        escape_html(&submission.message),
    );

    OutboundMessage {
        reply_to: submission.email.clone(),
        reply_name: submission.name.clone(),
        subject,
        text,
        html,
    }
}

pub fn client_ip(headers: &HeaderMap) -> Option<String> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };

    header("cf-connecting-ip")
        .or_else(|| {
            header("x-forwarded-for").and_then(|chain| chain.split(',').next().map(str::trim))
        })
        .map(str::to_string)
}

/// Runs one submission end to end: parse, validate, resolve configuration,
/// bot check, token, send.
pub async fn relay_submission(
    state: &AppState,
    remote_ip: Option<&str>,
    body: &[u8],
) -> Result<ContactReply, RelayError> {
    let payload = parse_payload(body)?;
    let submission = validate_submission(normalize_fields(&payload))?;
    debug!("submission validated");

    let config = ProviderConfig::resolve(&state.settings)?;
    debug!(provider = config.kind.as_str(), "configuration resolved");

    let transport = state.transport.as_ref();

    if let Some(secret) = &state.settings.turnstile_secret {
        verify_turnstile(
            transport,
            secret,
            submission.turnstile_token.as_deref(),
            remote_ip,
        )
        .await?;
    }

    let token = obtain_access_token(transport, &config).await?;
    let message = compose_message(&submission);
    let id = send_message(transport, &config, token.as_ref(), &message)
        .await
        .into_outcome()?;

    Ok(ContactReply { success: true, id })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn single(key: &str, value: &str) -> HashMap<ContactField, String> {
        let mut payload = Map::new();
        payload.insert(key.to_string(), Value::String(value.to_string()));
        normalize_fields(&payload)
    }

    fn fields_of(value: Value) -> HashMap<ContactField, String> {
        let Value::Object(map) = value else {
            panic!("expected object");
        };
        normalize_fields(&map)
    }

    #[test]
    fn payload_must_be_a_json_object() {
        assert!(parse_payload(br#"{"name":"x"}"#).is_ok());
        assert_eq!(
            parse_payload(b"name=x").unwrap_err().kind(),
            "InvalidPayload"
        );
        assert_eq!(
            parse_payload(b"[1,2]").unwrap_err().kind(),
            "InvalidPayload"
        );
        assert_eq!(parse_payload(b"").unwrap_err().kind(), "InvalidPayload");
    }

    #[test]
    fn alias_table_maps_every_listed_key() {
        for (field, aliases) in FIELD_ALIASES {
            for alias in aliases.iter() {
                let fields = single(alias, "  value  ");
                assert_eq!(fields.get(field).map(String::as_str), Some("value"), "{alias}");
            }
        }
    }

    #[test]
    fn earlier_alias_wins_and_blank_falls_through() {
        let fields = fields_of(json!({
            "subject": "Soil survey",
            "service": "Drilling",
            "token": "   ",
            "turnstileToken": "ts-1",
        }));
        assert_eq!(fields[&ContactField::Subject], "Soil survey");
        assert_eq!(fields[&ContactField::TurnstileToken], "ts-1");
    }

    #[test]
    fn non_string_values_count_as_absent() {
        let fields = fields_of(json!({ "name": 42, "email": null, "message": ["hi"] }));
        assert!(fields.is_empty());
    }

    #[test]
    fn missing_fields_are_named_in_order() {
        let error = validate_submission(fields_of(json!({ "email": "a@b.co" }))).unwrap_err();
        assert_eq!(error.kind(), "ValidationError");
        assert_eq!(error.details().as_deref(), Some("name, message"));
    }

    #[test]
    fn subject_defaults_and_optionals_carry_through() {
        let submission = validate_submission(fields_of(json!({
            "name": " Jane ",
            "email": "jane@example.com",
            "message": "Need a site survey",
            "tel": "+40 700 000 000",
        })))
        .unwrap();

        assert_eq!(
            submission,
            Submission {
                name: "Jane".into(),
                email: "jane@example.com".into(),
                subject: DEFAULT_SUBJECT.into(),
                message: "Need a site survey".into(),
                phone: Some("+40 700 000 000".into()),
                turnstile_token: None,
            }
        );
    }

    #[test]
    fn email_shape_is_enforced() {
        for bad in ["plain", "a@b", "@b.co", "a@.", "a b@c.de", "a@b c.de", "a@@b.co"] {
            assert!(!is_valid_email(bad), "{bad}");
        }
        for good in ["a@b.co", "first.last@geoconsultants.eu", "x+tag@mail.example.org"] {
            assert!(is_valid_email(good), "{good}");
        }

        let error = validate_submission(fields_of(json!({
            "name": "Jane",
            "email": "jane@localhost",
            "message": "hi",
        })))
        .unwrap_err();
        assert_eq!(error.to_string(), "Invalid email");
    }

    #[test]
    fn html_is_escaped() {
        assert_eq!(
            escape_html(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#039;Jerry&#039;&lt;/b&gt;"
        );
    }

    #[test]
    fn composed_message_caps_subject_and_escapes_html() {
        let submission = Submission {
            name: "<Jane>".into(),
            email: "jane@example.com".into(),
            subject: "s".repeat(300),
            message: "line one\nline two".into(),
            phone: None,
            turnstile_token: None,
        };

        let message = compose_message(&submission);
        assert_eq!(message.subject.chars().count(), MAX_SUBJECT_LENGTH);
        assert_eq!(message.reply_to, "jane@example.com");
        assert!(message.text.contains("Name: <Jane>\n"));
        assert!(message.text.ends_with("Message:\nline one\nline two\n"));
        assert!(!message.text.contains("Phone:"));
        assert!(message.html.contains("&lt;Jane&gt;"));
        assert!(!message.html.contains("<Jane>"));
    }

    #[test]
    fn client_ip_prefers_cloudflare_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "198.51.100.1, 10.0.0.1".parse().unwrap());
        assert_eq!(client_ip(&headers).as_deref(), Some("198.51.100.1"));

        headers.insert("cf-connecting-ip", "203.0.113.7".parse().unwrap());
        assert_eq!(client_ip(&headers).as_deref(), Some("203.0.113.7"));

        assert_eq!(client_ip(&HeaderMap::new()), None);
    }
}
