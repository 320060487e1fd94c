//! Config file templates with `{{ name }}` placeholders.
//!
//! Three templates ship with the crate. A file of the same name in
//! [`Settings::templates_dir`] replaces the built-in one.

use std::path::Path;

use indexmap::IndexMap;

use crate::error::{DeployError, DeployResult};
use crate::settings::Settings;

/// Supervisor program entry running gunicorn for the project.
pub const GUNICORN_CONF: &str = "gunicorn.conf";
/// Main supervisord config.
pub const SUPERVISORD_CONF: &str = "supervisord.conf";
/// Start/stop wrapper called by the health-check cronjob.
pub const START_SUPERVISOR: &str = "start_supervisor.sh";

/// Named substitution values, kept in insertion order.
pub type Vars = IndexMap<&'static str, String>;

fn builtin(name: &str) -> Option<&'static str> {
    match name {
        GUNICORN_CONF => Some(include_str!("../templates/gunicorn.conf")),
        SUPERVISORD_CONF => Some(include_str!("../templates/supervisord.conf")),
        START_SUPERVISOR => Some(include_str!("../templates/start_supervisor.sh")),
        _ => None,
    }
}

/// Fetch template `name`, preferring an override in `dir`.
pub fn load(dir: Option<&Path>, name: &str) -> DeployResult<String> {
    if let Some(path) = dir.map(|d| d.join(name)).filter(|p| p.exists()) {
        tracing::debug!(path = %path.display(), "using template override");
        return Ok(std::fs::read_to_string(path)?);
    }

    builtin(name)
        .map(str::to_string)
        .ok_or_else(|| DeployError::Template(format!("unknown template: {name}")))
}

/// Substitute every `{{ name }}` placeholder in `template`.
///
/// Unknown placeholders are an error; unused variables are not.
///
/// ```
/// use slipway::template::{Vars, render};
///
/// let mut vars = Vars::new();
/// vars.insert("port", "31337".into());
///
/// assert_eq!(
///     render("bind 127.0.0.1:{{ port }}", &vars).unwrap(),
///     "bind 127.0.0.1:31337"
/// );
/// ```
pub fn render(template: &str, vars: &Vars) -> DeployResult<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find("}}")
            .ok_or_else(|| DeployError::Template("unclosed placeholder".into()))?;
        let key = after[..end].trim();
        let value = vars
            .get(key)
            .ok_or_else(|| DeployError::Template(format!("no value for '{key}'")))?;
        out.push_str(value);
        rest = &after[end + 2..];
    }

    out.push_str(rest);
    Ok(out)
}

/// Variables for the project's supervisor program entry.
#[must_use]
pub fn gunicorn_vars(settings: &Settings, port: u16) -> Vars {
    let mut vars = Vars::new();
    vars.insert("project", settings.project_name.clone());
    vars.insert("project_django_dir", settings.project_django_dir.clone());
    vars.insert("webfaction_app_dir", settings.project_dir.clone());
    vars.insert("virtualenv", settings.virtualenv(&settings.project_name));
    vars.insert("port", port.to_string());
    vars.insert("password", settings.password.clone());
    vars.insert("user", settings.user.clone());
    vars
}

#[must_use]
pub fn supervisord_vars(settings: &Settings, port: u16) -> Vars {
    let mut vars = Vars::new();
    vars.insert("user", settings.user.clone());
    vars.insert("password", settings.password.clone());
    vars.insert("port", port.to_string());
    vars.insert("dir", settings.supervisor_dir());
    vars
}

#[must_use]
pub fn start_supervisor_vars(settings: &Settings) -> Vars {
    let mut vars = Vars::new();
    vars.insert("user", settings.user.clone());
    vars.insert("virtualenv", settings.supervisor_ve_dir());
    vars
}

/// Load template `name` and render it with `vars`.
pub fn render_named(settings: &Settings, name: &str, vars: &Vars) -> DeployResult<String> {
    let template = load(settings.templates_dir.as_deref(), name)?;
    render(&template, vars)
}
