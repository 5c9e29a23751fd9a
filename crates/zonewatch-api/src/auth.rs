use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};

use crate::Error;

/// Where a [`CredentialRecord`] came from.
///
/// Reported to collaborators instead of the token itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedFrom {
    /// Set programmatically via [`CredentialResolver::set_override`].
    Override,
    /// Persisted application setting (e.g. the OS keyring).
    Setting,
    /// Environment variable, by name.
    Environment(String),
    /// Flat `key = value` configuration file.
    File(PathBuf),
}

impl fmt::Display for ResolvedFrom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Override => f.write_str("override"),
            Self::Setting => f.write_str("saved setting"),
            Self::Environment(var) => write!(f, "${var}"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// A resolved bearer token plus the optional account identifier needed
/// by account-scoped analytics queries.
///
/// Superseded in full on every resolution; never partially merged.
#[derive(Debug, Clone)]
pub struct CredentialRecord {
    pub token: SecretString,
    pub account_id: Option<String>,
    pub origin: ResolvedFrom,
}

impl CredentialRecord {
    pub fn new(token: impl Into<String>, account_id: Option<String>, origin: ResolvedFrom) -> Self {
        Self {
            token: SecretString::from(token.into()),
            account_id: account_id.filter(|a| !a.trim().is_empty()),
            origin,
        }
    }

    fn has_token(&self) -> bool {
        !self.token.expose_secret().trim().is_empty()
    }
}

/// One place a token may live. Sources are consulted in the order they
/// are handed to [`CredentialResolver::new`].
pub trait CredentialSource: Send + Sync {
    /// Short label used in logs.
    fn describe(&self) -> String;

    /// Load a record, or `None` if this source has nothing to offer.
    fn load(&self) -> Option<CredentialRecord>;
}

/// Resolves the bearer token used by [`ApiClient`](crate::ApiClient).
///
/// Resolution order: the in-memory override, then each source in order.
/// The first non-empty token wins outright. The override is read on every
/// call, so setting it takes effect for the very next request without a
/// [`reload`](Self::reload).
pub struct CredentialResolver {
    sources: Vec<Box<dyn CredentialSource>>,
    override_record: ArcSwapOption<CredentialRecord>,
    cached: ArcSwapOption<CredentialRecord>,
}

impl CredentialResolver {
    /// Build a resolver and run an initial resolution.
    pub fn new(sources: Vec<Box<dyn CredentialSource>>) -> Self {
        let resolver = Self {
            sources,
            override_record: ArcSwapOption::empty(),
            cached: ArcSwapOption::empty(),
        };
        resolver.reload();
        resolver
    }

    /// A resolver with no persistent sources; only the override applies.
    pub fn override_only() -> Self {
        Self::new(Vec::new())
    }

    /// Set a token programmatically. Highest priority; lets a caller try a
    /// candidate token before persisting it anywhere.
    pub fn set_override(&self, token: impl Into<String>, account_id: Option<String>) {
        let record = CredentialRecord::new(token, account_id, ResolvedFrom::Override);
        if record.has_token() {
            debug!("credential override set");
            self.override_record.store(Some(Arc::new(record)));
        } else {
            self.clear_override();
        }
    }

    pub fn clear_override(&self) {
        self.override_record.store(None);
    }

    /// Re-run resolution over the persistent sources from scratch,
    /// replacing any previously cached record.
    pub fn reload(&self) -> Option<Arc<CredentialRecord>> {
        let resolved = self.sources.iter().find_map(|source| {
            let record = source.load().filter(CredentialRecord::has_token);
            if record.is_none() {
                debug!(source = %source.describe(), "credential source empty");
            }
            record
        });

        match &resolved {
            Some(record) => info!(origin = %record.origin, "API token resolved"),
            None => info!("no API token found in any source"),
        }

        let resolved = resolved.map(Arc::new);
        self.cached.store(resolved.clone());
        resolved
    }

    /// The record to use for the next request.
    pub fn current(&self) -> Result<Arc<CredentialRecord>, Error> {
        self.override_record
            .load_full()
            .or_else(|| self.cached.load_full())
            .ok_or(Error::NotAuthenticated)
    }

    pub fn is_authenticated(&self) -> bool {
        self.current().is_ok()
    }
}

impl fmt::Debug for CredentialResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialResolver")
            .field("sources", &self.sources.len())
            .field("has_override", &self.override_record.load().is_some())
            .field("has_cached", &self.cached.load().is_some())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct Stub {
        label: &'static str,
        value: Mutex<Option<String>>,
        origin: ResolvedFrom,
        calls: Arc<AtomicUsize>,
    }

    impl Stub {
        fn boxed(
            label: &'static str,
            value: Option<&str>,
            origin: ResolvedFrom,
        ) -> (Box<dyn CredentialSource>, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let stub = Self {
                label,
                value: Mutex::new(value.map(String::from)),
                origin,
                calls: Arc::clone(&calls),
            };
            (Box::new(stub), calls)
        }
    }

    impl CredentialSource for Stub {
        fn describe(&self) -> String {
            self.label.to_owned()
        }

        fn load(&self) -> Option<CredentialRecord> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let value = self.value.lock().unwrap().clone()?;
            Some(CredentialRecord::new(value, None, self.origin.clone()))
        }
    }

    #[test]
    fn env_wins_when_setting_is_empty_and_file_is_never_read() {
        let (setting, _) = Stub::boxed("setting", Some(""), ResolvedFrom::Setting);
        let (env, env_calls) = Stub::boxed(
            "env",
            Some("tok-123"),
            ResolvedFrom::Environment("CLOUDFLARE_API_TOKEN".into()),
        );
        let (file, file_calls) = Stub::boxed(
            "file",
            Some("tok-from-file"),
            ResolvedFrom::File("/etc/zonewatch".into()),
        );

        let resolver = CredentialResolver::new(vec![setting, env, file]);
        let record = resolver.current().unwrap();

        assert_eq!(record.token.expose_secret(), "tok-123");
        assert_eq!(
            record.origin,
            ResolvedFrom::Environment("CLOUDFLARE_API_TOKEN".into())
        );
        assert_eq!(env_calls.load(Ordering::SeqCst), 1);
        assert_eq!(file_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn override_takes_effect_without_reload() {
        let (env, _) = Stub::boxed(
            "env",
            Some("tok-env"),
            ResolvedFrom::Environment("X".into()),
        );
        let resolver = CredentialResolver::new(vec![env]);

        resolver.set_override("tok-candidate", Some("acct-1".into()));
        let record = resolver.current().unwrap();
        assert_eq!(record.token.expose_secret(), "tok-candidate");
        assert_eq!(record.account_id.as_deref(), Some("acct-1"));

        resolver.clear_override();
        assert_eq!(resolver.current().unwrap().token.expose_secret(), "tok-env");
    }

    #[test]
    fn blank_override_clears_instead_of_shadowing() {
        let resolver = CredentialResolver::override_only();
        resolver.set_override("tok", None);
        resolver.set_override("   ", None);
        assert!(matches!(resolver.current(), Err(Error::NotAuthenticated)));
    }

    #[test]
    fn reload_replaces_cached_record() {
        let calls = Arc::new(AtomicUsize::new(0));
        let stub = Stub {
            label: "setting",
            value: Mutex::new(Some("first".into())),
            origin: ResolvedFrom::Setting,
            calls: Arc::clone(&calls),
        };
        let stub = Arc::new(stub);

        struct Shared(Arc<Stub>);
        impl CredentialSource for Shared {
            fn describe(&self) -> String {
                self.0.describe()
            }
            fn load(&self) -> Option<CredentialRecord> {
                self.0.load()
            }
        }

        let resolver = CredentialResolver::new(vec![Box::new(Shared(Arc::clone(&stub)))]);
        assert_eq!(resolver.current().unwrap().token.expose_secret(), "first");

        *stub.value.lock().unwrap() = None;
        // Cached until an explicit reload.
        assert!(resolver.is_authenticated());
        assert!(resolver.reload().is_none());
        assert!(!resolver.is_authenticated());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn blank_account_id_is_dropped() {
        let record = CredentialRecord::new("tok", Some("  ".into()), ResolvedFrom::Setting);
        assert!(record.account_id.is_none());
    }
}
