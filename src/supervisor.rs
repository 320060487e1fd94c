use crate::api::AppSpec;
use crate::cron;
use crate::error::DeployResult;
use crate::pipeline::{Facts, Pipeline};
use crate::report;
use crate::ssh::in_dir;
use crate::template;

/// Name of the supervisor app slot and virtualenv.
pub const SUPERVISOR: &str = "supervisor";

impl Pipeline {
    /// Install supervisor in its own app slot and virtualenv,
    /// register the health-check cronjob, and start it.
    pub fn install_supervisor(&self, facts: Facts) -> DeployResult<Facts> {
        let s = &self.settings;
        let dir = s.supervisor_dir();

        report::step("Installing supervisor");
        let port = self.ensure_primary_app(SUPERVISOR)?;
        let facts = facts.with_supervisor_port(port);

        self.ensure_virtualenv(SUPERVISOR)?;

        if !self
            .remote
            .exists(&format!("{}/bin/supervisord", s.supervisor_ve_dir()))?
        {
            self.ve_run(SUPERVISOR, &s.home(), "pip install supervisor")?;
        }

        let conf = template::render_named(
            s,
            template::SUPERVISORD_CONF,
            &template::supervisord_vars(s, port),
        )?;
        self.remote
            .write_file(&conf, &format!("{dir}/supervisord.conf"), None)?;

        let script = template::render_named(
            s,
            template::START_SUPERVISOR,
            &template::start_supervisor_vars(s),
        )?;
        self.remote
            .write_file(&script, &format!("{dir}/start_supervisor.sh"), Some(0o750))?;

        cron::install(self.remote.as_ref(), &cron::supervisor_healthcheck(s))?;

        self.remote.exec(&format!("mkdir -p {dir}/conf.d"))?;

        match self.remote.exec_interactive(&in_dir(
            &dir,
            "./start_supervisor.sh stop && ./start_supervisor.sh start",
        )) {
            Ok(()) => report::success("Supervisor started"),
            Err(e) => report::warn(&format!("Supervisor did not restart cleanly: {e}")),
        }

        Ok(facts)
    }

    /// Ask supervisor to reread its config, reload, and restart the
    /// project's program.
    pub fn restart_app(&self) -> DeployResult<()> {
        let dir = self.settings.supervisor_dir();

        report::step(&format!("Restarting {}", self.settings.project_name));
        self.ve_run(
            SUPERVISOR,
            &dir,
            "supervisorctl reread && supervisorctl reload",
        )?;
        self.ve_run(
            SUPERVISOR,
            &dir,
            &format!("supervisorctl restart {}", self.settings.project_name),
        )
    }

    pub fn supervisor_status(&self) -> DeployResult<()> {
        self.ve_run(
            SUPERVISOR,
            &self.settings.supervisor_dir(),
            "supervisorctl status",
        )
    }

    /// Create (or find) a custom app with port and return its port.
    ///
    /// An existing slot is reused with the port the API reports; any
    /// other failure aborts the run.
    pub fn ensure_primary_app(&self, name: &str) -> DeployResult<u16> {
        match self.resources().ensure_app(&AppSpec::custom_with_port(name)) {
            Ok(app) => {
                let created = app.was_created();
                let port = app.into_inner().port;
                if created {
                    report::success(&format!("App {name} created on port {port}"));
                } else {
                    report::warn(&format!("App {name} already exists, reusing port {port}"));
                }
                Ok(port)
            }
            Err(e) => {
                report::failure(&format!("Could not create app {name}: {e}"));
                Err(e)
            }
        }
    }
}
