use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::api::HostingApi;
use crate::api::webfaction::Webfaction;
use crate::app::ReloadMode;
use crate::cmd::{Local, LocalShell};
use crate::error::{DeployError, DeployResult};
use crate::provision::Resources;
use crate::report;
use crate::settings::Settings;
use crate::ssh::{Remote, SshSession};
use crate::template;

/// Values discovered while the workflow runs, handed from one
/// step to the next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Facts {
    /// Port assigned to the project's app slot.
    pub app_port: Option<u16>,
    /// Port assigned to the supervisor's app slot.
    pub supervisor_port: Option<u16>,
}

impl Facts {
    #[must_use]
    pub const fn with_app_port(mut self, port: u16) -> Self {
        self.app_port = Some(port);
        self
    }

    #[must_use]
    pub const fn with_supervisor_port(mut self, port: u16) -> Self {
        self.supervisor_port = Some(port);
        self
    }
}

/// Deployment pipeline: the settings plus the three external
/// collaborators every step talks to.
pub struct Pipeline {
    pub(crate) settings: Settings,
    pub(crate) remote: Box<dyn Remote>,
    pub(crate) local: Box<dyn Local>,
    pub(crate) api: Box<dyn HostingApi>,
}

impl Pipeline {
    #[must_use]
    pub fn new(
        settings: Settings,
        remote: impl Remote + 'static,
        local: impl Local + 'static,
        api: impl HostingApi + 'static,
    ) -> Self {
        Self {
            settings,
            remote: Box::new(remote),
            local: Box::new(local),
            api: Box::new(api),
        }
    }

    /// Wire the real collaborators: ssh to `wf_host`, local
    /// processes, and the XML-RPC API at `api_url`.
    #[must_use]
    pub fn from_settings(settings: Settings) -> Self {
        let mut ssh = SshSession::new(&settings.wf_host, &settings.user);
        if let Some(key) = &settings.ssh_key {
            ssh = ssh.with_key(key);
        }
        let api = Webfaction::new(&settings.api_url);
        Self::new(settings, ssh, LocalShell, api)
    }

    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    pub(crate) fn resources(&self) -> Resources<'_> {
        Resources::new(
            self.api.as_ref(),
            &self.settings.user,
            &self.settings.password,
        )
    }

    /// Fail unless every local tool in `programs` is installed.
    pub(crate) fn require_local(&self, programs: &[&str]) -> DeployResult<()> {
        for program in programs {
            if !self.local.has(program) {
                return Err(DeployError::PrerequisiteMissing(format!(
                    "{program} is not installed on this machine"
                )));
            }
        }
        Ok(())
    }

    /// Full deployment: bootstrap the host, install supervisor
    /// when missing, then install the project.
    pub fn deploy(&self) -> DeployResult<Facts> {
        let facts = Facts::default();

        self.bootstrap()?;

        let facts = if self.remote.exists(&self.settings.supervisor_dir())? {
            report::step("Supervisor already installed, skipping");
            facts
        } else {
            self.install_supervisor(facts)?
        };

        let facts = self.install_app(facts)?;

        eprintln!();
        report::success(&format!(
            "Deployment of {} complete",
            self.settings.project_name
        ));
        Ok(facts)
    }

    /// Run one CLI command.
    pub fn dispatch(&self, command: &Command) -> DeployResult<()> {
        let project = &self.settings.project_name;

        match command {
            Command::Deploy => self.deploy().map(drop),
            Command::Bootstrap => self.bootstrap(),
            Command::InstallSupervisor => self.install_supervisor(Facts::default()).map(drop),
            Command::InstallApp => self.install_app(Facts::default()).map(drop),
            Command::UploadSecrets => self.upload_secrets(),
            Command::ReloadApp { mode } => self.reload_app(mode.unwrap_or_default()),
            Command::RestartApp => self.restart_app(),
            Command::RestartApache => self.restart_apache(),
            Command::Status => self.supervisor_status(),
            Command::Configure => {
                let report = self.configure(project)?;
                if report.has_failures() {
                    report::warn("Some resources could not be provisioned, see above");
                }
                Ok(())
            }
            Command::CreateApp { name } => self
                .ensure_primary_app(name.as_deref().unwrap_or(project))
                .map(drop),
            Command::CreateAppMedia => self.create_app_media(project).map(drop),
            Command::CreateAppStatic => self.create_app_static(project).map(drop),
            Command::CreateDomain => self.create_domain(project).map(drop),
            Command::CreateWebsite => self.create_website(project).map(drop),
            Command::CreateDb { name } => self
                .create_db(name.as_deref().unwrap_or(&self.settings.pg_database_name))
                .map(drop),
            Command::AddCronjob => self.add_cronjob().map(drop),
            Command::Backup => self.backup(),
            Command::RsyncFromRemote => self.rsync_from_remote(),
            Command::CopyPgDumpToLocal => self.copy_pg_dump_to_local(),
            Command::PgDump => self.pg_dump(),
            Command::LoadOnLocal => self.load_on_local(),
            Command::LoadToRemote => self.load_to_remote(),
            Command::RsyncToRemote => self.rsync_to_remote(),
            Command::RenderConfig {
                port,
                supervisor_port,
            } => self.render_config(*port, *supervisor_port),
        }
    }

    fn render_config(&self, port: u16, supervisor_port: u16) -> DeployResult<()> {
        let s = &self.settings;
        let files = [
            (
                format!("{}/conf.d/{}.conf", s.supervisor_dir(), s.project_name),
                template::render_named(s, template::GUNICORN_CONF, &template::gunicorn_vars(s, port))?,
            ),
            (
                format!("{}/supervisord.conf", s.supervisor_dir()),
                template::render_named(
                    s,
                    template::SUPERVISORD_CONF,
                    &template::supervisord_vars(s, supervisor_port),
                )?,
            ),
            (
                format!("{}/start_supervisor.sh", s.supervisor_dir()),
                template::render_named(
                    s,
                    template::START_SUPERVISOR,
                    &template::start_supervisor_vars(s),
                )?,
            ),
        ];

        eprintln!("=== Dry run: no changes will be made ===");
        for (path, content) in files {
            eprintln!();
            eprintln!("--- {path} ---");
            println!("{content}");
        }
        Ok(())
    }
}

#[derive(Parser)]
#[command(name = "slipway")]
#[command(about = "Deploy a Django app with gunicorn and supervisor on shared hosting")]
pub struct Cli {
    /// Settings file
    #[arg(long, global = true, env = "SLIPWAY_SETTINGS", default_value = "slipway.yml")]
    pub settings: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Bootstrap the host, install supervisor if needed, install the app
    Deploy,

    /// Create base directories and install pip and virtualenvwrapper
    Bootstrap,

    /// Install supervisor in its own app slot and virtualenv
    InstallSupervisor,

    /// Install the project in its own app slot and virtualenv
    InstallApp,

    /// Upload secrets.json from the local project directory
    UploadSecrets,

    /// Pull the latest code, refresh requirements, and restart
    ReloadApp {
        /// `quick` only pulls and restarts
        #[arg(value_enum)]
        mode: Option<ReloadMode>,
    },

    /// Restart the app through supervisorctl
    RestartApp,

    /// Restart Apache
    RestartApache,

    /// Show supervisor process status
    Status,

    /// Provision media, static, domain, website, database, and
    /// backup cronjob, then load local data to the remote
    Configure,

    /// Create a custom app with port
    CreateApp {
        /// App name (defaults to the project name)
        name: Option<String>,
    },

    /// Create the static-only media app
    CreateAppMedia,

    /// Create the static-only static-files app
    CreateAppStatic,

    /// Create the default domain
    CreateDomain,

    /// Create the website binding the project apps
    CreateWebsite,

    /// Create the project database
    CreateDb {
        /// Database name (defaults to the configured one)
        name: Option<String>,
    },

    /// Register the daily database dump cronjob
    AddCronjob,

    /// Fetch media and the latest database dump from the remote
    Backup,

    /// Sync remote media to the local project directory
    RsyncFromRemote,

    /// Copy the latest remote dump locally and to the backup folder
    CopyPgDumpToLocal,

    /// Dump the remote database in the remote home directory
    PgDump,

    /// Drop, recreate, and load the local database
    LoadOnLocal,

    /// Copy and load the local dump on the remote, then sync media
    LoadToRemote,

    /// Sync local media to the remote
    RsyncToRemote,

    /// Print the rendered config files without deploying
    RenderConfig {
        /// App port to render into the program entry
        #[arg(long)]
        port: u16,

        /// Supervisor port to render into supervisord.conf
        #[arg(long, default_value_t = 9001)]
        supervisor_port: u16,
    },
}
