use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{DeployError, DeployResult};

/// Environment variable consulted when the settings file carries
/// no `password`.
pub const PASSWORD_ENV: &str = "SLIPWAY_PASSWORD";

/// Deployment parameters, loaded once from a YAML file and never
/// mutated afterwards.
///
/// # Example
///
/// ```
/// use slipway::Settings;
///
/// let settings = Settings::from_yaml(
///     "
/// wf_host: web500.webfaction.com
/// ip_host: 10.0.0.1
/// project_name: blog
/// project_dir_name: blog
/// project_parent_dir: /home/alice/webapps/blog
/// project_dir: /home/alice/webapps/blog/blog
/// project_django_dir: /home/alice/webapps/blog/blog/src
/// project_settings_module: blog.settings.production
/// project_media: /home/alice/webapps/blog/media
/// repository: git@example.com:alice/blog.git
/// user: alice
/// password: hunter2
/// virtualenvs: /home/alice/.virtualenvs
/// local_project_dir: /srv/blog
/// pg_database_name: blog
/// pg_database_user: alice
/// host: webfaction
/// apache_dir: /home/alice/webapps/blog/apache2/bin
/// gdrive: /srv/drive/backups
/// ",
/// )
/// .unwrap();
///
/// assert_eq!(settings.home(), "/home/alice");
/// assert_eq!(settings.supervisor_dir(), "/home/alice/webapps/supervisor");
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    pub wf_host: String,
    pub ip_host: String,
    pub project_name: String,
    pub project_dir_name: String,
    pub project_parent_dir: String,
    pub project_dir: String,
    pub project_django_dir: String,
    pub project_settings_module: String,
    pub project_media: String,
    pub repository: String,
    pub user: String,
    #[serde(default)]
    pub password: String,
    pub virtualenvs: String,
    pub local_project_dir: String,
    pub pg_database_name: String,
    pub pg_database_user: String,
    /// SSH alias used by scp/rsync for database and media transfers.
    pub host: String,
    pub apache_dir: String,
    /// Secondary local folder that receives a copy of each dump.
    pub gdrive: String,

    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_python_version")]
    pub python_version: String,
    #[serde(default = "default_domain_suffix")]
    pub domain_suffix: String,
    #[serde(default)]
    pub ssh_key: Option<String>,
    #[serde(default)]
    pub templates_dir: Option<PathBuf>,
}

fn default_api_url() -> String {
    "https://api.webfaction.com/".to_string()
}

fn default_python_version() -> String {
    "2.7".to_string()
}

fn default_domain_suffix() -> String {
    "webfactional.com".to_string()
}

impl Settings {
    /// Load and validate the settings file at `path`.
    pub fn load(path: &Path) -> DeployResult<Self> {
        if !path.exists() {
            return Err(DeployError::Settings(format!(
                "{} not found; it either does not exist or is unreadable",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        let settings = Self::from_yaml(&content)
            .map_err(|e| DeployError::Settings(format!("{}: {e}", path.display())))?
            .resolve_password(std::env::var(PASSWORD_ENV).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    /// Parse settings from YAML without validating them.
    pub fn from_yaml(content: &str) -> DeployResult<Self> {
        serde_yaml::from_str(content).map_err(|e| DeployError::Settings(e.to_string()))
    }

    /// Fill an empty `password` from `fallback`.
    pub fn resolve_password(mut self, fallback: Option<String>) -> DeployResult<Self> {
        if self.password.is_empty() {
            self.password = fallback
                .filter(|p| !p.is_empty())
                .ok_or_else(|| DeployError::EnvMissing(PASSWORD_ENV.into()))?;
        }
        Ok(self)
    }

    /// Reject empty required values.
    pub fn validate(&self) -> DeployResult<()> {
        let required = [
            ("wf_host", &self.wf_host),
            ("ip_host", &self.ip_host),
            ("project_name", &self.project_name),
            ("project_dir_name", &self.project_dir_name),
            ("project_parent_dir", &self.project_parent_dir),
            ("project_dir", &self.project_dir),
            ("project_django_dir", &self.project_django_dir),
            ("project_settings_module", &self.project_settings_module),
            ("project_media", &self.project_media),
            ("repository", &self.repository),
            ("user", &self.user),
            ("password", &self.password),
            ("virtualenvs", &self.virtualenvs),
            ("local_project_dir", &self.local_project_dir),
            ("pg_database_name", &self.pg_database_name),
            ("pg_database_user", &self.pg_database_user),
            ("host", &self.host),
            ("apache_dir", &self.apache_dir),
            ("gdrive", &self.gdrive),
        ];

        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(DeployError::Settings(format!("missing setting: {key}")));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn home(&self) -> String {
        format!("/home/{}", self.user)
    }

    #[must_use]
    pub fn webfaction_app_dir(&self) -> String {
        format!("{}/webapps/{}", self.home(), self.project_name)
    }

    #[must_use]
    pub fn supervisor_dir(&self) -> String {
        format!("{}/webapps/supervisor", self.home())
    }

    #[must_use]
    pub fn supervisor_ve_dir(&self) -> String {
        self.virtualenv("supervisor")
    }

    /// Root directory of the virtualenv called `name`.
    #[must_use]
    pub fn virtualenv(&self, name: &str) -> String {
        format!("{}/{name}", self.virtualenvs)
    }

    #[must_use]
    pub fn python(&self) -> String {
        format!("/usr/local/bin/python{}", self.python_version)
    }

    /// Local path of the SQL dump for the project database.
    #[must_use]
    pub fn local_dump(&self) -> String {
        format!("{}/{}.sql", self.local_project_dir, self.pg_database_name)
    }
}
