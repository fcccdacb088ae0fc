//! Answer-generation providers.
//!
//! Each provider implements the [`Generator`] trait defined in [`traits`]
//! and is registered in the factory function [`create_generator`] by its
//! canonical string key.

pub mod openai;
pub mod traits;

pub use traits::{GenerateRequest, Generator};

const MAX_API_ERROR_CHARS: usize = 200;

fn is_secret_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':')
}

fn token_end(input: &str, from: usize) -> usize {
    let mut end = from;
    for (i, c) in input[from..].char_indices() {
        if is_secret_char(c) {
            end = from + i + c.len_utf8();
        } else {
            break;
        }
    }
    end
}

/// Scrub known secret-like token prefixes from provider error strings.
pub fn scrub_secret_patterns(input: &str) -> String {
    const PREFIXES: [&str; 3] = ["sk-", "sk-proj-", "api-key-"];

    let mut scrubbed = input.to_string();

    for prefix in PREFIXES {
        let mut search_from = 0;
        loop {
            let Some(rel) = scrubbed[search_from..].find(prefix) else {
                break;
            };

            let start = search_from + rel;
            let content_start = start + prefix.len();
            let end = token_end(&scrubbed, content_start);

            if end == content_start {
                search_from = content_start;
                continue;
            }

            scrubbed.replace_range(start..end, "[REDACTED]");
            search_from = start + "[REDACTED]".len();
        }
    }

    scrubbed
}

/// Sanitize API error text by scrubbing secrets and truncating length.
pub fn sanitize_api_error(input: &str) -> String {
    let scrubbed = scrub_secret_patterns(input);

    if scrubbed.chars().count() <= MAX_API_ERROR_CHARS {
        return scrubbed;
    }

    let mut end = MAX_API_ERROR_CHARS;
    while end > 0 && !scrubbed.is_char_boundary(end) {
        end -= 1;
    }

    format!("{}...", &scrubbed[..end])
}

/// Build a sanitized provider error from a failed HTTP response.
pub async fn api_error(provider: &str, response: reqwest::Response) -> anyhow::Error {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read provider error body>".to_string());
    let sanitized = sanitize_api_error(&body);
    anyhow::anyhow!("{provider} API error ({status}): {sanitized}")
}

/// Resolve the API key for a generator from an explicit override or
/// environment variables.
fn resolve_credential(credential_override: Option<&str>) -> Option<String> {
    if let Some(raw_override) = credential_override {
        let trimmed = raw_override.trim();
        if !trimmed.is_empty() {
            return Some(trimmed.to_owned());
        }
    }

    for env_var in ["DESKBOT_API_KEY", "OPENAI_API_KEY", "API_KEY"] {
        if let Ok(value) = std::env::var(env_var) {
            let value = value.trim();
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }

    None
}

/// Factory: create the right generator from config.
pub fn create_generator(
    name: &str,
    api_key: Option<&str>,
    api_url: Option<&str>,
    model: &str,
    temperature: f64,
) -> anyhow::Result<Box<dyn Generator>> {
    let resolved = resolve_credential(api_key);
    let key = resolved.as_deref();

    match name {
        "openai" => Ok(Box::new(openai::OpenAiGenerator::new(
            api_url,
            key,
            model,
            temperature,
        ))),
        _ => anyhow::bail!("Unknown generator: {name}. Only \"openai\" is currently supported."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_openai() {
        assert!(create_generator("openai", Some("test-credential"), None, "gpt-4o-mini", 0.2).is_ok());
    }

    #[test]
    fn factory_unknown_generator_errors() {
        let result = create_generator("nonexistent", None, None, "m", 0.0);
        assert!(result.is_err());
        let msg = result.err().unwrap().to_string();
        assert!(msg.contains("Unknown generator"));
    }

    #[test]
    fn factory_empty_name_errors() {
        assert!(create_generator("", None, None, "m", 0.0).is_err());
    }

    // ── API error sanitization ───────────────────────────────

    #[test]
    fn sanitize_scrubs_sk_prefix() {
        let input = "request failed: sk-1234567890abcdef";
        let out = sanitize_api_error(input);
        assert!(!out.contains("sk-1234567890abcdef"));
        assert!(out.contains("[REDACTED]"));
    }

    #[test]
    fn sanitize_truncates_long_error() {
        let long = "a".repeat(400);
        let result = sanitize_api_error(&long);
        assert!(result.len() <= 203);
        assert!(result.ends_with("..."));
    }

    #[test]
    fn sanitize_no_secret_no_change() {
        let input = "simple upstream timeout";
        let result = sanitize_api_error(input);
        assert_eq!(result, input);
    }

    #[test]
    fn resolve_credential_prefers_explicit_argument() {
        let resolved = resolve_credential(Some("  explicit-key  "));
        assert_eq!(resolved, Some("explicit-key".to_string()));
    }
}
