pub mod webfaction;
pub mod xmlrpc;

use serde::Deserialize;

use crate::error::DeployResult;

/// Authenticated API session.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub account: serde_json::Value,
}

/// Kind of application slot on the hosting account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppType {
    /// Long-running process bound to an assigned port.
    CustomAppWithPort,
    /// Static files served from a directory symlink.
    SymlinkStaticOnly,
}

impl AppType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CustomAppWithPort => "custom_app_with_port",
            Self::SymlinkStaticOnly => "symlink_static_only",
        }
    }
}

/// Request to create an application slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppSpec {
    pub name: String,
    pub app_type: AppType,
    pub autostart: bool,
    pub extra_info: String,
}

impl AppSpec {
    #[must_use]
    pub fn custom_with_port(name: &str) -> Self {
        Self {
            name: name.to_string(),
            app_type: AppType::CustomAppWithPort,
            autostart: false,
            extra_info: String::new(),
        }
    }

    /// A static-only app serving files from `path`.
    #[must_use]
    pub fn symlink_static(name: &str, path: &str) -> Self {
        Self {
            name: name.to_string(),
            app_type: AppType::SymlinkStaticOnly,
            autostart: false,
            extra_info: path.to_string(),
        }
    }
}

/// Request to create a website binding apps to path prefixes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebsiteSpec {
    pub name: String,
    pub ip: String,
    pub https: bool,
    pub subdomains: Vec<String>,
    /// `(app name, path prefix)` pairs.
    pub apps: Vec<(String, String)>,
}

impl WebsiteSpec {
    /// The project website: the app at `/`, its static app at
    /// `/static` and its media app at `/media`.
    ///
    /// ```
    /// use slipway::api::WebsiteSpec;
    ///
    /// let site = WebsiteSpec::for_project("blog", "10.0.0.1", "alice", "webfactional.com");
    ///
    /// assert_eq!(site.subdomains, vec!["blog.alice.webfactional.com"]);
    /// assert_eq!(site.apps[1], ("blog_static".to_string(), "/static".to_string()));
    /// ```
    #[must_use]
    pub fn for_project(name: &str, ip: &str, user: &str, domain_suffix: &str) -> Self {
        Self {
            name: name.to_string(),
            ip: ip.to_string(),
            https: false,
            subdomains: vec![format!("{name}.{user}.{domain_suffix}")],
            apps: vec![
                (name.to_string(), "/".to_string()),
                (static_app_name(name), "/static".to_string()),
                (media_app_name(name), "/media".to_string()),
            ],
        }
    }
}

#[must_use]
pub fn static_app_name(app: &str) -> String {
    format!("{app}_static")
}

#[must_use]
pub fn media_app_name(app: &str) -> String {
    format!("{app}_media")
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AppInfo {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    #[serde(rename = "type", default)]
    pub app_type: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub extra_info: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DomainInfo {
    #[serde(default)]
    pub id: i64,
    pub domain: String,
    #[serde(default)]
    pub subdomains: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WebsiteInfo {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub https: bool,
    #[serde(default)]
    pub subdomains: Vec<String>,
    #[serde(default)]
    pub website_apps: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DbInfo {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub db_type: String,
    #[serde(default)]
    pub machine: String,
}

/// The hosting provider's resource provisioning API.
///
/// Every call is a synchronous request/response; provider faults
/// surface as [`DeployError::Fault`](crate::error::DeployError::Fault).
pub trait HostingApi {
    fn login(&self, user: &str, password: &str) -> DeployResult<Session>;

    fn list_apps(&self, session: &Session) -> DeployResult<Vec<AppInfo>>;

    fn create_app(&self, session: &Session, app: &AppSpec) -> DeployResult<AppInfo>;

    fn list_domains(&self, session: &Session) -> DeployResult<Vec<DomainInfo>>;

    /// Create `domain` with one subdomain, e.g. `blog` under
    /// `alice.webfactional.com`.
    fn create_domain(
        &self,
        session: &Session,
        domain: &str,
        subdomain: &str,
    ) -> DeployResult<DomainInfo>;

    fn list_websites(&self, session: &Session) -> DeployResult<Vec<WebsiteInfo>>;

    fn create_website(&self, session: &Session, site: &WebsiteSpec) -> DeployResult<WebsiteInfo>;

    fn list_dbs(&self, session: &Session) -> DeployResult<Vec<DbInfo>>;

    fn create_db(
        &self,
        session: &Session,
        name: &str,
        db_type: &str,
        password: &str,
    ) -> DeployResult<DbInfo>;
}
