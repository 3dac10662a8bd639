//! TOML configuration.
//!
//! ```toml
//! [db]
//! path = "./data/redirects.sqlite"
//!
//! [server]
//! bind = "127.0.0.1:7420"
//!
//! [i18n]
//! default_locale = "en"
//! locales = ["en", "nl"]
//!
//! [i18n.pathnames.author]
//! en = "contributors"
//! nl = "medewerkers"
//! ```
//!
//! Only `[db]` is required. `[i18n.pathnames]` overrides or extends the
//! built-in content-type routes.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use redirect_desk_core::models::LANGUAGE_ALL;
use redirect_desk_core::{Locales, Resolver};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub i18n: I18nConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7420".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct I18nConfig {
    #[serde(default = "default_locale")]
    pub default_locale: String,
    #[serde(default = "default_locales")]
    pub locales: Vec<String>,
    /// `pathnames.<content type>.<locale> = "<segment>"`
    #[serde(default)]
    pub pathnames: HashMap<String, HashMap<String, String>>,
}

impl Default for I18nConfig {
    fn default() -> Self {
        Self {
            default_locale: default_locale(),
            locales: default_locales(),
            pathnames: HashMap::new(),
        }
    }
}

fn default_locale() -> String {
    "en".to_string()
}
fn default_locales() -> Vec<String> {
    vec!["en".to_string(), "nl".to_string()]
}

impl Config {
    pub fn locales(&self) -> Locales {
        Locales::new(&self.i18n.default_locale, self.i18n.locales.clone())
    }

    /// Resolver with the built-in routes plus any configured pathnames.
    pub fn resolver(&self) -> Resolver {
        Resolver::new(self.locales()).with_pathnames(&self.i18n.pathnames)
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    let i18n = &config.i18n;

    if i18n.locales.is_empty() {
        bail!("i18n.locales must not be empty");
    }
    if i18n.locales.iter().any(|l| l == LANGUAGE_ALL) {
        bail!("i18n.locales must not contain the reserved value '{}'", LANGUAGE_ALL);
    }
    if !i18n.locales.contains(&i18n.default_locale) {
        bail!(
            "i18n.default_locale '{}' must be one of i18n.locales",
            i18n.default_locale
        );
    }
    for (doc_type, by_locale) in &i18n.pathnames {
        for locale in by_locale.keys() {
            if !i18n.locales.contains(locale) {
                bail!(
                    "i18n.pathnames.{} names unknown locale '{}'",
                    doc_type,
                    locale
                );
            }
        }
    }

    if config.server.bind.trim().is_empty() {
        bail!("server.bind must not be empty");
    }

    Ok(())
}
