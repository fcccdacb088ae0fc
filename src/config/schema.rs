use anyhow::{Context, Result};
use directories::UserDirs;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::routing::classifier::{
    FAQ_KEYWORDS, FAQ_SPECIFIC_KEYWORDS, ORDER_KEYWORDS, PAYMENT_KEYWORDS, SEARCH_KEYWORDS,
};
use crate::routing::{IntentRule, KeywordClassifier, Route};

// ── Top-level config ──────────────────────────────────────────────

/// Top-level deskbot configuration, loaded from `config.toml`.
///
/// Resolution order: `DESKBOT_CONFIG_DIR` env → `~/.deskbot/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Config {
    /// Workspace directory - computed from home, not serialized
    #[serde(skip)]
    pub workspace_dir: PathBuf,
    /// Path to config.toml - computed from home, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,
    /// API key for the generation provider. Overridden by `DESKBOT_API_KEY`
    /// or `API_KEY` env vars.
    pub api_key: Option<String>,
    /// Base URL override for the provider API (e.g. a local gateway).
    pub api_url: Option<String>,
    /// Generation provider ID. Default: `"openai"`.
    pub default_provider: Option<String>,
    /// Model routed through the provider. Default: `"gpt-4o-mini"`.
    pub default_model: Option<String>,
    /// Model temperature (0.0–2.0). Default: `0.2`.
    pub default_temperature: f64,
    /// Optional knowledge-table override file. Relative paths resolve
    /// against the workspace directory.
    pub knowledge_file: Option<String>,

    /// Intent routing configuration (`[routing]`).
    #[serde(default)]
    pub routing: RoutingConfig,

    /// Session behavior (`[session]`).
    #[serde(default)]
    pub session: SessionConfig,
}

// ── Routing ──────────────────────────────────────────────────────

/// Intent routing configuration (`[routing]` section).
///
/// Keyword sets are matched as substrings of the lower-cased input, in the
/// priority order payment, order, search, faq.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RoutingConfig {
    /// Route taken when nothing matches: `"faq"` or `"general"`.
    #[serde(default = "default_fallback")]
    pub fallback: String,
    #[serde(default = "default_payment_keywords")]
    pub payment_keywords: Vec<String>,
    #[serde(default = "default_order_keywords")]
    pub order_keywords: Vec<String>,
    #[serde(default = "default_search_keywords")]
    pub search_keywords: Vec<String>,
    #[serde(default = "default_faq_keywords")]
    pub faq_keywords: Vec<String>,
    /// FAQ input containing any of these goes to the specific-FAQ table.
    #[serde(default = "default_faq_specific_keywords")]
    pub faq_specific_keywords: Vec<String>,
}

fn owned(keywords: &[&str]) -> Vec<String> {
    keywords.iter().map(|k| (*k).to_string()).collect()
}

fn default_fallback() -> String {
    "faq".into()
}

fn default_payment_keywords() -> Vec<String> {
    owned(PAYMENT_KEYWORDS)
}

fn default_order_keywords() -> Vec<String> {
    owned(ORDER_KEYWORDS)
}

fn default_search_keywords() -> Vec<String> {
    owned(SEARCH_KEYWORDS)
}

fn default_faq_keywords() -> Vec<String> {
    owned(FAQ_KEYWORDS)
}

fn default_faq_specific_keywords() -> Vec<String> {
    owned(FAQ_SPECIFIC_KEYWORDS)
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            fallback: default_fallback(),
            payment_keywords: default_payment_keywords(),
            order_keywords: default_order_keywords(),
            search_keywords: default_search_keywords(),
            faq_keywords: default_faq_keywords(),
            faq_specific_keywords: default_faq_specific_keywords(),
        }
    }
}

impl RoutingConfig {
    /// The fallback route, already validated by [`Config::validate`].
    pub fn fallback_route(&self) -> Route {
        match self.fallback.trim().to_ascii_lowercase().as_str() {
            "general" => Route::General,
            _ => Route::Faq,
        }
    }

    /// Build the classifier over this config's rule table.
    pub fn build_classifier(&self) -> KeywordClassifier {
        let rules = vec![
            IntentRule {
                route: Route::Payment,
                keywords: self.payment_keywords.clone(),
            },
            IntentRule {
                route: Route::Order,
                keywords: self.order_keywords.clone(),
            },
            IntentRule {
                route: Route::Search,
                keywords: self.search_keywords.clone(),
            },
            IntentRule {
                route: Route::Faq,
                keywords: self.faq_keywords.clone(),
            },
        ];
        KeywordClassifier::new(
            rules,
            self.fallback_route(),
            self.faq_specific_keywords.clone(),
        )
    }
}

// ── Sessions ─────────────────────────────────────────────────────

/// Session behavior (`[session]` section).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SessionConfig {
    /// Most recent turns handed to the generation provider as context.
    /// Default: `50`.
    #[serde(default = "default_max_history_messages")]
    pub max_history_messages: usize,
}

fn default_max_history_messages() -> usize {
    50
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_history_messages: default_max_history_messages(),
        }
    }
}

// ── Load / save ──────────────────────────────────────────────────

impl Default for Config {
    fn default() -> Self {
        let home =
            UserDirs::new().map_or_else(|| PathBuf::from("."), |u| u.home_dir().to_path_buf());
        let deskbot_dir = home.join(".deskbot");

        Self {
            workspace_dir: deskbot_dir.join("workspace"),
            config_path: deskbot_dir.join("config.toml"),
            api_key: None,
            api_url: None,
            default_provider: Some("openai".to_string()),
            default_model: Some("gpt-4o-mini".to_string()),
            default_temperature: 0.2,
            knowledge_file: None,
            routing: RoutingConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

fn default_config_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("DESKBOT_CONFIG_DIR") {
        let dir = dir.trim();
        if !dir.is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let home = UserDirs::new()
        .map(|u| u.home_dir().to_path_buf())
        .context("Could not find home directory")?;
    Ok(home.join(".deskbot"))
}

impl Config {
    pub async fn load_or_init() -> Result<Self> {
        let deskbot_dir = default_config_dir()?;
        let workspace_dir = deskbot_dir.join("workspace");
        let config_path = deskbot_dir.join("config.toml");

        fs::create_dir_all(&deskbot_dir)
            .await
            .with_context(|| format!("Failed to create config directory: {}", deskbot_dir.display()))?;
        fs::create_dir_all(&workspace_dir)
            .await
            .context("Failed to create workspace directory")?;

        if config_path.exists() {
            let contents = fs::read_to_string(&config_path)
                .await
                .context("Failed to read config file")?;
            let mut config: Config =
                toml::from_str(&contents).context("Failed to parse config file")?;
            // Set computed paths that are skipped during serialization
            config.config_path = config_path;
            config.workspace_dir = workspace_dir;
            config.apply_env_overrides();
            config.validate()?;
            tracing::info!(
                path = %config.config_path.display(),
                initialized = false,
                "Config loaded"
            );
            Ok(config)
        } else {
            let mut config = Config::default();
            config.config_path = config_path.clone();
            config.workspace_dir = workspace_dir;
            config.save().await?;

            // Restrict permissions on newly created config file (may contain an API key)
            #[cfg(unix)]
            {
                use std::{fs::Permissions, os::unix::fs::PermissionsExt};
                let _ = fs::set_permissions(&config_path, Permissions::from_mode(0o600)).await;
            }

            config.apply_env_overrides();
            config.validate()?;
            tracing::info!(
                path = %config.config_path.display(),
                initialized = true,
                "Config loaded"
            );
            Ok(config)
        }
    }

    /// Apply environment variable overrides to config
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("DESKBOT_API_KEY").or_else(|_| std::env::var("API_KEY")) {
            if !key.is_empty() {
                self.api_key = Some(key);
            }
        }
        if let Ok(provider) = std::env::var("DESKBOT_PROVIDER") {
            if !provider.is_empty() {
                self.default_provider = Some(provider);
            }
        }
        if let Ok(model) = std::env::var("DESKBOT_MODEL") {
            if !model.is_empty() {
                self.default_model = Some(model);
            }
        }
    }

    /// Validate configuration values that would cause runtime failures.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.default_temperature) {
            anyhow::bail!("default_temperature must be between 0.0 and 2.0");
        }

        let fallback = self.routing.fallback.trim().to_ascii_lowercase();
        if fallback != "faq" && fallback != "general" {
            anyhow::bail!("routing.fallback must be \"faq\" or \"general\" (got {fallback:?})");
        }

        for (name, keywords) in [
            ("payment_keywords", &self.routing.payment_keywords),
            ("order_keywords", &self.routing.order_keywords),
            ("faq_keywords", &self.routing.faq_keywords),
        ] {
            if keywords.is_empty() {
                anyhow::bail!("routing.{name} must not be empty");
            }
            if keywords.iter().any(|k| k.trim().is_empty()) {
                anyhow::bail!("routing.{name} contains a blank keyword");
            }
        }

        if self.session.max_history_messages == 0 {
            anyhow::bail!("session.max_history_messages must be greater than 0");
        }

        Ok(())
    }

    pub async fn save(&self) -> Result<()> {
        let toml_str = toml::to_string_pretty(self).context("Failed to serialize config")?;

        let parent_dir = self
            .config_path
            .parent()
            .context("Config path must have a parent directory")?;
        fs::create_dir_all(parent_dir).await.with_context(|| {
            format!(
                "Failed to create config directory: {}",
                parent_dir.display()
            )
        })?;

        let file_name = self
            .config_path
            .file_name()
            .and_then(|v| v.to_str())
            .unwrap_or("config.toml");
        let temp_path = parent_dir.join(format!(".{file_name}.tmp-{}", uuid::Uuid::new_v4()));

        let mut temp_file = fs::File::create(&temp_path)
            .await
            .context("Failed to create temp config file")?;
        temp_file
            .write_all(toml_str.as_bytes())
            .await
            .context("Failed to write config")?;
        temp_file.flush().await.context("Failed to flush config")?;
        drop(temp_file);

        fs::rename(&temp_path, &self.config_path)
            .await
            .context("Failed to move config into place")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::{Category, IntentClassifier};

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_provider.as_deref(), Some("openai"));
        assert_eq!(config.routing.fallback, "faq");
    }

    #[test]
    fn toml_round_trip_preserves_routing_tables() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let back: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(back.routing.payment_keywords, config.routing.payment_keywords);
        assert_eq!(back.routing.fallback, "faq");
        assert_eq!(back.session.max_history_messages, 50);
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let config: Config = toml::from_str("default_temperature = 0.5").unwrap();
        assert_eq!(config.default_temperature, 0.5);
        assert!(!config.routing.order_keywords.is_empty());
        assert_eq!(config.session.max_history_messages, 50);
    }

    #[test]
    fn validate_rejects_bad_temperature() {
        let mut config = Config::default();
        config.default_temperature = 3.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_unknown_fallback() {
        let mut config = Config::default();
        config.routing.fallback = "search".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_keyword_table() {
        let mut config = Config::default();
        config.routing.payment_keywords.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn built_classifier_follows_config_fallback() {
        let mut config = Config::default();
        config.routing.fallback = "general".into();
        let classifier = config.routing.build_classifier();
        assert_eq!(classifier.resolve("hello there").category, Category::General);
    }

    #[test]
    fn built_classifier_uses_configured_keywords() {
        let mut config = Config::default();
        config.routing.payment_keywords = vec!["invoice".into()];
        let classifier = config.routing.build_classifier();
        assert_eq!(
            classifier.resolve("please resend the invoice").category,
            Category::Payment
        );
        // The builtin "refund" keyword was replaced wholesale.
        assert_ne!(
            classifier.resolve("refund please").category,
            Category::Payment
        );
    }
}
