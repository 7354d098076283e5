use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow};

use crate::theme::ThemeMode;

pub const DEFAULT_BOT_NAME: &str = "AI Assistant";
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000";

/// Widget parameters, resolved once at startup and immutable thereafter.
///
/// Resolution order mirrors the embed contract: explicit CLI arguments first,
/// process environment as fallback (`CHATBOT_BOT_ID`, `CHATBOT_API_KEY`,
/// `CHATBOT_BOT_NAME`, `CHATBOT_BACKEND_URL`).
#[derive(Debug, Clone)]
pub struct WidgetParams {
    pub bot_id: String,
    pub api_key: String,
    pub bot_name: String,
    pub backend_url: String,
}

impl WidgetParams {
    pub fn resolve(
        bot_id: Option<String>,
        api_key: Option<String>,
        bot_name: Option<String>,
        backend_url: Option<String>,
    ) -> Result<Self> {
        Self::resolve_with(bot_id, api_key, bot_name, backend_url, |var| {
            std::env::var(var).ok()
        })
    }

    fn resolve_with(
        bot_id: Option<String>,
        api_key: Option<String>,
        bot_name: Option<String>,
        backend_url: Option<String>,
        getenv: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let bot_id = bot_id
            .or_else(|| getenv("CHATBOT_BOT_ID"))
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow!("missing required parameter: bot_id"))?;

        let api_key = api_key
            .or_else(|| getenv("CHATBOT_API_KEY"))
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow!("missing required parameter: api_key"))?;

        let bot_name = bot_name
            .or_else(|| getenv("CHATBOT_BOT_NAME"))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_BOT_NAME.to_string());

        let backend_url = backend_url
            .or_else(|| getenv("CHATBOT_BACKEND_URL"))
            .filter(|s| !s.is_empty())
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());

        Ok(Self { bot_id, api_key, bot_name, backend_url })
    }
}

/// Persisted widget preferences. Currently just the theme flag.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Preferences {
    pub theme: Option<String>,
}

impl Preferences {
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let prefs: Preferences = serde_json::from_str(&content)?;
        Ok(prefs)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Persist a theme change, preserving any other stored preferences.
    pub fn save_theme(path: &Path, mode: ThemeMode) -> Result<()> {
        let mut prefs = Self::load_from(path).unwrap_or_default();
        prefs.theme = Some(mode.as_str().to_string());
        prefs.save_to(path)
    }

    /// The theme stored in this preferences file, falling back to light.
    pub fn theme_mode(&self) -> ThemeMode {
        self.theme
            .as_deref()
            .map(ThemeMode::from_str)
            .unwrap_or_default()
    }

    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("chatwidget").join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn resolve_prefers_arguments_over_environment() {
        let params = WidgetParams::resolve_with(
            Some("arg-bot".to_string()),
            Some("arg-key".to_string()),
            None,
            None,
            |var| match var {
                "CHATBOT_BOT_ID" => Some("env-bot".to_string()),
                "CHATBOT_API_KEY" => Some("env-key".to_string()),
                _ => None,
            },
        )
        .unwrap();
        assert_eq!(params.bot_id, "arg-bot");
        assert_eq!(params.api_key, "arg-key");
    }

    #[test]
    fn resolve_falls_back_to_environment() {
        let params = WidgetParams::resolve_with(None, None, None, None, |var| match var {
            "CHATBOT_BOT_ID" => Some("env-bot".to_string()),
            "CHATBOT_API_KEY" => Some("env-key".to_string()),
            "CHATBOT_BOT_NAME" => Some("Helper".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(params.bot_id, "env-bot");
        assert_eq!(params.api_key, "env-key");
        assert_eq!(params.bot_name, "Helper");
    }

    #[test]
    fn resolve_fails_without_required_parameters() {
        assert!(WidgetParams::resolve_with(None, Some("key".into()), None, None, no_env).is_err());
        assert!(WidgetParams::resolve_with(Some("bot".into()), None, None, None, no_env).is_err());
        assert!(
            WidgetParams::resolve_with(Some(String::new()), Some("key".into()), None, None, no_env)
                .is_err()
        );
    }

    #[test]
    fn resolve_applies_defaults() {
        let params = WidgetParams::resolve_with(
            Some("abc".to_string()),
            Some("xyz".to_string()),
            None,
            None,
            no_env,
        )
        .unwrap();
        assert_eq!(params.bot_name, DEFAULT_BOT_NAME);
        assert_eq!(params.backend_url, DEFAULT_BACKEND_URL);
    }

    #[test]
    fn resolve_trims_trailing_slash_from_backend_url() {
        let params = WidgetParams::resolve_with(
            Some("abc".to_string()),
            Some("xyz".to_string()),
            Some("Helper".to_string()),
            Some("https://bots.example.com/".to_string()),
            no_env,
        )
        .unwrap();
        assert_eq!(params.backend_url, "https://bots.example.com");
        assert_eq!(params.bot_name, "Helper");
    }

    #[test]
    fn preferences_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        Preferences::save_theme(&path, ThemeMode::Dark).unwrap();
        let prefs = Preferences::load_from(&path).unwrap();
        assert_eq!(prefs.theme_mode(), ThemeMode::Dark);

        Preferences::save_theme(&path, ThemeMode::Light).unwrap();
        let prefs = Preferences::load_from(&path).unwrap();
        assert_eq!(prefs.theme_mode(), ThemeMode::Light);
    }

    #[test]
    fn missing_preferences_default_to_light() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = Preferences::load_from(&dir.path().join("nope.json")).unwrap();
        assert_eq!(prefs.theme_mode(), ThemeMode::Light);
    }

    #[test]
    fn corrupt_preferences_are_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();
        assert!(Preferences::load_from(&path).is_err());
    }
}
