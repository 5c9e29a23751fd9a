// ── Credential sources ──
//
// Concrete `CredentialSource` impls, consulted in this order after the
// in-memory override: OS keyring (the saved setting), environment
// variables, then flat `key = value` credential files.

use std::collections::HashMap;
use std::path::PathBuf;

use directories::BaseDirs;
use tracing::debug;

use zonewatch_api::{CredentialRecord, CredentialSource, ResolvedFrom};

use crate::{ConfigError, CredentialSettings};

const KEYRING_TOKEN_USER: &str = "api-token";
const KEYRING_ACCOUNT_USER: &str = "account-id";

const TOKEN_KEYS: &[&str] = &["api_token", "cloudflare_api_token", "token"];
const ACCOUNT_KEYS: &[&str] = &["account_id", "cloudflare_account_id"];

// ── Keyring ─────────────────────────────────────────────────────────

/// The persisted application setting, kept in the OS keyring.
#[derive(Debug, Clone)]
pub struct KeyringSource {
    service: String,
}

impl KeyringSource {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, user: &str) -> Result<keyring::Entry, ConfigError> {
        Ok(keyring::Entry::new(&self.service, user)?)
    }

    /// Save a token (and optional account id), replacing what was there.
    pub fn store(&self, token: &str, account_id: Option<&str>) -> Result<(), ConfigError> {
        self.entry(KEYRING_TOKEN_USER)?.set_password(token)?;
        match account_id.filter(|a| !a.trim().is_empty()) {
            Some(account) => self.entry(KEYRING_ACCOUNT_USER)?.set_password(account)?,
            None => forget(&self.entry(KEYRING_ACCOUNT_USER)?)?,
        }
        Ok(())
    }

    /// Remove the saved token and account id. Missing entries are fine.
    pub fn delete(&self) -> Result<(), ConfigError> {
        forget(&self.entry(KEYRING_TOKEN_USER)?)?;
        forget(&self.entry(KEYRING_ACCOUNT_USER)?)?;
        Ok(())
    }
}

fn forget(entry: &keyring::Entry) -> Result<(), ConfigError> {
    match entry.delete_credential() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

impl CredentialSource for KeyringSource {
    fn describe(&self) -> String {
        format!("keyring:{}", self.service)
    }

    fn load(&self) -> Option<CredentialRecord> {
        let token = self.entry(KEYRING_TOKEN_USER).ok()?.get_password().ok()?;
        let account = self
            .entry(KEYRING_ACCOUNT_USER)
            .ok()
            .and_then(|e| e.get_password().ok());
        Some(CredentialRecord::new(token, account, ResolvedFrom::Setting))
    }
}

// ── Environment ─────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct EnvSource {
    token_var: String,
    account_var: String,
}

impl EnvSource {
    pub fn new(token_var: impl Into<String>, account_var: impl Into<String>) -> Self {
        Self {
            token_var: token_var.into(),
            account_var: account_var.into(),
        }
    }
}

impl CredentialSource for EnvSource {
    fn describe(&self) -> String {
        format!("${}", self.token_var)
    }

    fn load(&self) -> Option<CredentialRecord> {
        let token = std::env::var(&self.token_var).ok()?;
        let account = std::env::var(&self.account_var).ok();
        Some(CredentialRecord::new(
            token,
            account,
            ResolvedFrom::Environment(self.token_var.clone()),
        ))
    }
}

// ── Flat credential files ───────────────────────────────────────────

/// A `key = value` (or `KEY=value`) file. Unreadable or token-less files
/// yield nothing.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CredentialSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> Option<CredentialRecord> {
        let raw = std::fs::read_to_string(&self.path).ok()?;
        let values = parse_key_values(&raw);
        let lookup = |keys: &[&str]| keys.iter().find_map(|k| values.get(*k).cloned());

        let token = lookup(TOKEN_KEYS)?;
        debug!(path = %self.path.display(), "token found in credential file");
        Some(CredentialRecord::new(
            token,
            lookup(ACCOUNT_KEYS),
            ResolvedFrom::File(self.path.clone()),
        ))
    }
}

/// Parse flat `key = value` lines into a map with lowercased keys.
///
/// Accepts `=` or `:` separators and an optional `export ` prefix. Blank
/// lines, `#`/`;` comments and `[section]` headers are skipped. Values
/// lose one layer of matching single or double quotes. Later keys win.
pub fn parse_key_values(raw: &str) -> HashMap<String, String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with(['#', ';', '[']))
        .filter_map(|line| {
            let line = line.strip_prefix("export ").unwrap_or(line);
            let (key, value) = line.split_once(['=', ':'])?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            Some((key.to_ascii_lowercase(), unquote(value.trim()).to_owned()))
        })
        .collect()
}

fn unquote(value: &str) -> &str {
    ['"', '\'']
        .iter()
        .find_map(|q| value.strip_prefix(*q).and_then(|v| v.strip_suffix(*q)))
        .unwrap_or(value)
}

// ── Assembly ────────────────────────────────────────────────────────

/// Well-known credential file locations, in lookup order.
fn well_known_files() -> Vec<PathBuf> {
    let Some(base) = BaseDirs::new() else {
        return Vec::new();
    };
    let home = base.home_dir();
    vec![
        base.config_dir().join("zonewatch").join("credentials"),
        home.join(".cloudflare").join("credentials"),
        home.join(".wrangler").join("config").join("default.toml"),
    ]
}

/// Sources in resolution order: keyring, environment, configured files,
/// well-known files.
pub fn default_sources(settings: &CredentialSettings) -> Vec<Box<dyn CredentialSource>> {
    let mut sources: Vec<Box<dyn CredentialSource>> = vec![
        Box::new(KeyringSource::new(&settings.keyring_service)),
        Box::new(EnvSource::new(&settings.token_env, &settings.account_env)),
    ];
    sources.extend(
        settings
            .files
            .iter()
            .cloned()
            .chain(well_known_files())
            .map(|path| Box::new(FileSource::new(path)) as Box<dyn CredentialSource>),
    );
    sources
}
