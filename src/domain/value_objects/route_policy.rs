//! Which paths need authentication, which need the master tier, and where denied
//! callers are sent.

use crate::config::RouteSettings;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePolicy {
    protected: Vec<String>,
    master_only: Vec<String>,
    login_path: String,
    dashboard_path: String,
}

impl RoutePolicy {
    pub fn new(
        protected: Vec<String>,
        master_only: Vec<String>,
        login_path: impl Into<String>,
        dashboard_path: impl Into<String>,
    ) -> Self {
        Self {
            protected,
            master_only,
            login_path: login_path.into(),
            dashboard_path: dashboard_path.into(),
        }
    }

    pub fn from_settings(settings: &RouteSettings) -> Self {
        Self::new(
            settings.protected.clone(),
            settings.master_only.clone(),
            settings.login_path.clone(),
            settings.dashboard_path.clone(),
        )
    }

    pub fn is_protected(&self, path: &str) -> bool {
        self.protected.iter().any(|prefix| matches_prefix(path, prefix))
    }

    pub fn is_master_only(&self, path: &str) -> bool {
        self.master_only.iter().any(|prefix| matches_prefix(path, prefix))
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    pub fn dashboard_path(&self) -> &str {
        &self.dashboard_path
    }

    /// Login URL that returns the caller to `requested` afterwards.
    pub fn login_redirect(&self, requested: &str) -> String {
        format!(
            "{}?redirect={}",
            self.login_path,
            urlencoding::encode(requested)
        )
    }
}

impl Default for RoutePolicy {
    fn default() -> Self {
        Self::from_settings(&RouteSettings::default())
    }
}

/// Segment-aware prefix match: `/api` covers `/api` and `/api/...` but not `/apix`.
fn matches_prefix(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return true;
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
