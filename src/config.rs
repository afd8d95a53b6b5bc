use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use serde::Deserialize;
use tracing::debug;

use crate::error::MailcowError;

pub const DEFAULT_PROFILE: &str = "default";

#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub domain: Option<String>,
    pub src_host: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct MailcowConfig {
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
    /// Overrides for the built-in imapsync defaults.
    #[serde(default)]
    pub sync_defaults: BTreeMap<String, toml::Value>,
}

impl MailcowConfig {
    /// A missing default profile is not an error; a missing named one is.
    pub fn profile(&self, name: Option<&str>) -> Result<Profile, MailcowError> {
        match name {
            None => Ok(self
                .profiles
                .get(DEFAULT_PROFILE)
                .cloned()
                .unwrap_or_default()),
            Some(name) => self
                .profiles
                .get(name)
                .cloned()
                .ok_or_else(|| MailcowError::Config(format!("unknown profile '{name}'"))),
        }
    }

    pub fn sync_overrides(&self) -> impl Iterator<Item = (String, String)> + '_ {
        self.sync_defaults.iter().map(|(k, v)| {
            let value = match v {
                toml::Value::String(s) => s.clone(),
                toml::Value::Boolean(b) => (if *b { "1" } else { "0" }).to_string(),
                other => other.to_string(),
            };
            (k.clone(), value)
        })
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("mailcow-cli").join("config.toml"))
}

/// Loads the TOML config. Without an explicit path a missing file yields
/// an empty config.
pub fn load_config(path: Option<&str>) -> Result<MailcowConfig, MailcowError> {
    let (path, explicit) = match path {
        Some(p) => (PathBuf::from(shellexpand::tilde(p).to_string()), true),
        None => match default_config_path() {
            Some(p) => (p, false),
            None => return Ok(MailcowConfig::default()),
        },
    };
    if !explicit && !path.exists() {
        debug!(path = %path.display(), "no config file");
        return Ok(MailcowConfig::default());
    }
    let contents = fs::read_to_string(&path)?;
    Ok(toml::from_str(&contents)?)
}

/// Loads `.env`, or `.env.<name>` when an environment variant is selected.
/// Variables already set in the process environment win.
pub fn load_env_file(select: Option<&str>) -> Result<(), MailcowError> {
    match select {
        Some(name) => {
            let file = format!(".env.{name}");
            dotenvy::from_filename(&file)
                .map(|_| ())
                .map_err(|e| MailcowError::Config(format!("cannot load {file}: {e}")))
        }
        None => {
            dotenvy::dotenv().ok();
            Ok(())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_url: String,
    pub api_key: String,
}

impl Settings {
    /// Flags and environment variables take precedence over the profile.
    pub fn resolve(
        api_url: Option<&str>,
        api_key: Option<&str>,
        profile: &Profile,
    ) -> Result<Self, MailcowError> {
        let api_url = api_url
            .map(str::to_string)
            .or_else(|| profile.api_url.clone())
            .ok_or_else(|| MailcowError::usage("Missing option '--api-url' (env: MAILCOW_API_URL)"))?;
        let api_key = api_key
            .map(str::to_string)
            .or_else(|| profile.api_key.clone())
            .ok_or_else(|| MailcowError::usage("Missing option '--api-key' (env: MAILCOW_API_KEY)"))?;
        Ok(Self { api_url, api_key })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[profiles.default]
api_url = "https://mail.example.com"
api_key = "default-key"

[profiles.domeniu1]
api_url = "https://mail.domeniu1.ro"
api_key = "other-key"
domain = "domeniu1.ro"

[sync_defaults]
mins_interval = 60
automap = false
exclude = "(?i)trash"
"#;

    #[test]
    fn profiles_and_sync_overrides() {
        let cfg: MailcowConfig = toml::from_str(SAMPLE).unwrap();
        assert_eq!(
            cfg.profile(None).unwrap().api_key.as_deref(),
            Some("default-key")
        );
        assert_eq!(
            cfg.profile(Some("domeniu1")).unwrap().domain.as_deref(),
            Some("domeniu1.ro")
        );
        assert!(cfg.profile(Some("missing")).is_err());

        let overrides: BTreeMap<_, _> = cfg.sync_overrides().collect();
        assert_eq!(overrides["mins_interval"], "60");
        assert_eq!(overrides["automap"], "0");
        assert_eq!(overrides["exclude"], "(?i)trash");
    }

    #[test]
    fn flags_win_over_profile() {
        let profile = Profile {
            api_url: Some("https://profile".into()),
            api_key: Some("profile-key".into()),
            ..Default::default()
        };
        let settings = Settings::resolve(Some("https://flag"), None, &profile).unwrap();
        assert_eq!(settings.api_url, "https://flag");
        assert_eq!(settings.api_key, "profile-key");
    }

    #[test]
    fn missing_url_is_a_usage_error() {
        let err = Settings::resolve(None, Some("key"), &Profile::default()).unwrap_err();
        assert!(matches!(err, MailcowError::Usage(_)));
    }

    #[test]
    fn empty_config_has_default_profile() {
        let cfg = MailcowConfig::default();
        assert_eq!(cfg.profile(None).unwrap(), Profile::default());
    }
}
