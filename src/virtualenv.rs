//! Isolated Python runtime environments on the remote host.

use crate::error::DeployResult;
use crate::pipeline::Pipeline;
use crate::report;
use crate::settings::Settings;
use crate::ssh::in_dir;

/// Path whose presence marks virtualenv `name` as created.
#[must_use]
pub fn sentinel(settings: &Settings, name: &str) -> String {
    format!("{}/bin/activate", settings.virtualenv(name))
}

/// Shell command running `command` with virtualenv `name` active.
#[must_use]
pub fn activated(settings: &Settings, name: &str, command: &str) -> String {
    format!("source {} && {command}", sentinel(settings, name))
}

impl Pipeline {
    /// Create virtualenv `name` unless it already exists. Returns
    /// whether it was created.
    pub fn ensure_virtualenv(&self, name: &str) -> DeployResult<bool> {
        let s = &self.settings;

        if self.remote.exists(&sentinel(s, name))? {
            report::step(&format!("Virtualenv {name} already exists, skipping"));
            return Ok(false);
        }

        report::step(&format!("Creating virtualenv {name}"));
        self.remote.exec_interactive(&in_dir(
            &s.virtualenvs,
            &format!(
                "mkvirtualenv -p {} --no-site-packages {name}",
                s.python()
            ),
        ))?;
        Ok(true)
    }

    /// Run `command` inside `dir` with virtualenv `name` active.
    pub fn ve_run(&self, name: &str, dir: &str, command: &str) -> DeployResult<()> {
        self.remote
            .exec_interactive(&in_dir(dir, &activated(&self.settings, name, command)))
    }
}
