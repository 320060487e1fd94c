use std::fmt::Debug;

use crate::api::{
    AppInfo, AppSpec, DbInfo, DomainInfo, WebsiteInfo, WebsiteSpec, media_app_name,
    static_app_name,
};
use crate::error::DeployResult;
use crate::pipeline::Pipeline;
use crate::provision::Provisioned;
use crate::report;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepStatus {
    Created,
    Existing,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    pub resource: String,
    pub status: StepStatus,
}

/// What [`Pipeline::configure`] did for each resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigureReport {
    pub steps: Vec<StepOutcome>,
}

impl ConfigureReport {
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.steps
            .iter()
            .any(|s| matches!(s.status, StepStatus::Failed(_)))
    }

    #[must_use]
    pub fn status_of(&self, resource: &str) -> Option<&StepStatus> {
        self.steps
            .iter()
            .find(|s| s.resource == resource)
            .map(|s| &s.status)
    }

    fn record<T: Debug>(&mut self, resource: &str, result: DeployResult<Provisioned<T>>) {
        let status = match result {
            Ok(Provisioned::Created(_)) => StepStatus::Created,
            Ok(Provisioned::Existing(_)) => StepStatus::Existing,
            Err(e) => StepStatus::Failed(e.to_string()),
        };
        self.steps.push(StepOutcome {
            resource: resource.to_string(),
            status,
        });
    }
}

fn announce<T: Debug>(
    what: &str,
    result: DeployResult<Provisioned<T>>,
) -> DeployResult<Provisioned<T>> {
    match &result {
        Ok(outcome) if outcome.was_created() => {
            report::success(&format!("{what} created: {:?}", outcome.get()));
        }
        Ok(_) => report::warn(&format!("{what} already exists")),
        Err(e) => report::failure(&format!("Could not create {what}: {e}")),
    }
    result
}

impl Pipeline {
    /// Provision the hosting resources around app `app`, register
    /// the dump cronjob, and load local data onto the remote.
    ///
    /// A failing resource is recorded and the next one is still
    /// attempted. Only the final data load can abort.
    pub fn configure(&self, app: &str) -> DeployResult<ConfigureReport> {
        let mut outcome = ConfigureReport::default();

        outcome.record(&media_app_name(app), self.create_app_media(app));
        outcome.record(&static_app_name(app), self.create_app_static(app));
        outcome.record("domain", self.create_domain(app));
        outcome.record("website", self.create_website(app));
        outcome.record(
            "database",
            self.create_db(&self.settings.pg_database_name),
        );

        outcome.record("cronjob", self.add_cronjob());

        self.load_to_remote()?;
        Ok(outcome)
    }

    pub fn create_app_media(&self, app: &str) -> DeployResult<Provisioned<AppInfo>> {
        let name = media_app_name(app);
        let spec = AppSpec::symlink_static(
            &name,
            &format!("{}/media/", self.settings.project_parent_dir),
        );
        announce(&format!("Media app {name}"), self.resources().ensure_app(&spec))
    }

    pub fn create_app_static(&self, app: &str) -> DeployResult<Provisioned<AppInfo>> {
        let name = static_app_name(app);
        let spec = AppSpec::symlink_static(
            &name,
            &format!("{}/static_root/", self.settings.project_django_dir),
        );
        announce(&format!("Static app {name}"), self.resources().ensure_app(&spec))
    }

    /// Ensure `<app>.<user>.<suffix>` exists.
    pub fn create_domain(&self, app: &str) -> DeployResult<Provisioned<DomainInfo>> {
        let domain = format!("{}.{}", self.settings.user, self.settings.domain_suffix);
        announce(
            &format!("Domain {app}.{domain}"),
            self.resources().ensure_domain(&domain, app),
        )
    }

    pub fn create_website(&self, website: &str) -> DeployResult<Provisioned<WebsiteInfo>> {
        let s = &self.settings;
        let spec = WebsiteSpec::for_project(website, &s.ip_host, &s.user, &s.domain_suffix);
        announce(
            &format!("Website {website}"),
            self.resources().ensure_website(&spec),
        )
    }

    pub fn create_db(&self, name: &str) -> DeployResult<Provisioned<DbInfo>> {
        announce(
            &format!("PostgreSQL database {name}"),
            self.resources().ensure_db(name, "postgresql"),
        )
    }
}
