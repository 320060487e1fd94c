use std::path::Path;

use clap::ValueEnum;

use crate::error::{DeployError, DeployResult};
use crate::pipeline::{Facts, Pipeline};
use crate::report;
use crate::ssh::in_dir;
use crate::template;

/// How much of the project to refresh on reload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ReloadMode {
    /// Pull, reinstall requirements, migrate, collect static files.
    #[default]
    Full,
    /// Pull only.
    Quick,
}

impl Pipeline {
    /// Prepare a fresh host: base directories, pip, and
    /// virtualenvwrapper.
    pub fn bootstrap(&self) -> DeployResult<()> {
        let s = &self.settings;
        let home = s.home();

        report::step(&format!("Bootstrapping {}", s.wf_host));
        self.remote
            .exec(&format!("mkdir -p {home}/lib/python{}", s.python_version))?;
        self.remote.exec(&format!("mkdir -p {home}/db_backups"))?;
        self.remote
            .exec_interactive(&format!("easy_install-{} pip", s.python_version))?;
        self.remote
            .exec_interactive("pip install virtualenv virtualenvwrapper")?;
        Ok(())
    }

    /// Install the project: secrets, app slot, supervisor program
    /// entry, checkout, virtualenv, hosting resources, then reload
    /// and restart.
    pub fn install_app(&self, facts: Facts) -> DeployResult<Facts> {
        let s = &self.settings;

        report::step(&format!("Installing {}", s.project_name));
        self.remote
            .exec(&format!("mkdir -p {}/media", s.project_parent_dir))?;
        self.upload_secrets()?;

        let port = self.ensure_primary_app(&s.project_name)?;
        let facts = facts.with_app_port(port);

        self.upload_app_config(port)?;
        self.clone_if_absent()?;
        self.ensure_virtualenv(&s.project_name)?;

        let outcome = self.configure(&s.project_name)?;
        if outcome.has_failures() {
            report::warn("Continuing with some resources unprovisioned");
        }

        self.reload_app(ReloadMode::Full)?;
        self.restart_app()?;
        Ok(facts)
    }

    /// Copy `secrets.json` from the local project directory next to
    /// the checkout, keeping its permissions.
    pub fn upload_secrets(&self) -> DeployResult<()> {
        let s = &self.settings;
        let local = format!("{}/secrets.json", s.local_project_dir);

        if !Path::new(&local).exists() {
            return Err(DeployError::FileNotFound(local));
        }

        self.remote
            .put_file(&local, &format!("{}/secrets.json", s.project_parent_dir))?;
        report::success("Secrets uploaded");
        Ok(())
    }

    /// Render the project's supervisor program entry for `port`
    /// and write it into `conf.d`.
    pub fn upload_app_config(&self, port: u16) -> DeployResult<()> {
        let s = &self.settings;
        let content = template::render_named(
            s,
            template::GUNICORN_CONF,
            &template::gunicorn_vars(s, port),
        )?;
        self.remote.write_file(
            &content,
            &format!("{}/conf.d/{}.conf", s.supervisor_dir(), s.project_name),
            None,
        )
    }

    /// Clone the repository into `project_dir` unless that directory
    /// exists. Returns whether a clone happened.
    pub fn clone_if_absent(&self) -> DeployResult<bool> {
        let s = &self.settings;

        if self.remote.exists(&s.project_dir)? {
            report::step(&format!("{} already checked out", s.project_dir));
            return Ok(false);
        }

        report::step(&format!("Cloning {}", s.repository));
        self.remote.exec_interactive(&in_dir(
            &s.project_parent_dir,
            &format!("git clone {} {}", s.repository, s.project_dir),
        ))?;
        Ok(true)
    }

    /// Pull the latest code and restart. A full reload also
    /// reinstalls requirements, migrates, and collects static files.
    pub fn reload_app(&self, mode: ReloadMode) -> DeployResult<()> {
        let s = &self.settings;
        let project = &s.project_name;

        report::step(&format!("Pulling {project}"));
        self.remote
            .exec_interactive(&in_dir(&s.project_dir, "git pull"))?;

        if mode == ReloadMode::Full {
            self.ve_run(
                project,
                &s.project_dir,
                "pip install -r requirements/production.txt",
            )?;
            self.ve_run(
                project,
                &s.project_django_dir,
                &format!(
                    "python manage.py migrate --settings={}",
                    s.project_settings_module
                ),
            )?;
            self.ve_run(
                project,
                &s.project_django_dir,
                &format!(
                    "python manage.py collectstatic --noinput --settings={}",
                    s.project_settings_module
                ),
            )?;
        }

        self.restart_app()
    }

    pub fn restart_apache(&self) -> DeployResult<()> {
        report::step("Restarting Apache");
        self.remote
            .exec_interactive(&in_dir(&self.settings.apache_dir, "./restart"))
    }
}
