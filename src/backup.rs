//! Database and media transfers between the remote host and this
//! machine.
//!
//! Nothing here is transactional: a failure halfway leaves the
//! earlier steps applied.

use crate::cron;
use crate::error::DeployResult;
use crate::pipeline::Pipeline;
use crate::provision::Provisioned;
use crate::report;

fn reported(result: DeployResult<()>, ok: &str, fail: &str) -> DeployResult<()> {
    match &result {
        Ok(()) => report::success(ok),
        Err(e) => report::failure(&format!("{fail}: {e}")),
    }
    result
}

impl Pipeline {
    /// Fetch remote media and the latest nightly dump.
    pub fn backup(&self) -> DeployResult<()> {
        self.require_local(&["rsync", "scp", "cp"])?;

        // media sync failures are reported only
        let _ = self.rsync_from_remote();
        self.copy_pg_dump_to_local()
    }

    pub fn rsync_from_remote(&self) -> DeployResult<()> {
        let s = &self.settings;
        let source = format!("{}@{}:{}/media", s.user, s.wf_host, s.project_parent_dir);
        reported(
            self.local
                .run("rsync", &["-avz", &source, &s.local_project_dir]),
            &format!("Synchronized {} media from {}", s.project_name, s.wf_host),
            &format!("Could not synchronize {} media from {}", s.project_name, s.wf_host),
        )
    }

    /// Copy the dump written by the nightly cronjob into the local
    /// project directory, then into the backup folder.
    pub fn copy_pg_dump_to_local(&self) -> DeployResult<()> {
        let s = &self.settings;
        let remote_dump = format!("{}:db_backups/{}.sql", s.host, s.pg_database_name);
        let local_dump = s.local_dump();

        let result = self
            .local
            .run("scp", &[remote_dump.as_str(), s.local_project_dir.as_str()])
            .and_then(|()| self.local.run("cp", &[local_dump.as_str(), s.gdrive.as_str()]));
        reported(
            result,
            &format!("Database dump copied to {} and {}", s.local_project_dir, s.gdrive),
            &format!("Could not copy the {} dump to this machine", s.pg_database_name),
        )
    }

    /// Dump the remote database into `<db>.sql` in the remote home.
    pub fn pg_dump(&self) -> DeployResult<()> {
        let s = &self.settings;
        reported(
            self.remote.exec_interactive(&format!(
                "pg_dump -U {0} -W {1} > {1}.sql",
                s.pg_database_user, s.pg_database_name
            )),
            &format!("{} database dumped", s.pg_database_name),
            &format!("Could not dump the {} database", s.pg_database_name),
        )
    }

    /// Recreate the local database from the local dump. Every step
    /// is attempted; failures are reported only.
    pub fn load_on_local(&self) -> DeployResult<()> {
        self.require_local(&["psql"])?;

        let _ = self.create_local_database_user();
        let _ = self.create_local_database();
        let _ = self.load_local_database();
        Ok(())
    }

    pub fn create_local_database_user(&self) -> DeployResult<()> {
        let user = &self.settings.pg_database_user;
        reported(
            self.local
                .run("psql", &["-c", &format!("CREATE USER {user};")]),
            &format!("User and role {user} created"),
            &format!("Could not create user and role {user}, maybe in use"),
        )
    }

    /// Drop then create the local database. A failed drop usually
    /// means there was nothing to drop.
    pub fn create_local_database(&self) -> DeployResult<()> {
        let s = &self.settings;
        let db = &s.pg_database_name;

        let _ = reported(
            self.local.run("psql", &["-c", &format!("DROP DATABASE {db};")]),
            &format!("Database {db} dropped"),
            &format!("Could not drop database {db}, maybe not existing yet"),
        );

        reported(
            self.local.run(
                "psql",
                &[
                    "-c",
                    &format!("CREATE DATABASE {db} WITH OWNER {};", s.pg_database_user),
                ],
            ),
            &format!("Database {db} created"),
            &format!("Could not create database {db}"),
        )
    }

    pub fn load_local_database(&self) -> DeployResult<()> {
        let s = &self.settings;
        let db = &s.pg_database_name;
        reported(
            self.local.run(
                "psql",
                &["-f", &s.local_dump(), "-U", &s.pg_database_user, db],
            ),
            &format!("Database {db} loaded"),
            &format!("Could not load database {db} on this machine"),
        )
    }

    /// Push the local dump and media to the remote host and load
    /// the dump there. Copy and load failures abort; a media sync
    /// failure, including a missing rsync, is reported only.
    pub fn load_to_remote(&self) -> DeployResult<()> {
        self.require_local(&["scp"])?;

        self.copy_database_to_remote()?;
        self.load_remote_database()?;
        let _ = self.rsync_to_remote();
        Ok(())
    }

    pub fn copy_database_to_remote(&self) -> DeployResult<()> {
        let s = &self.settings;
        let local_dump = s.local_dump();
        let dest = format!("{}:", s.host);
        reported(
            self.local.run("scp", &[local_dump.as_str(), dest.as_str()]),
            &format!("Local {} dump copied to {}", s.pg_database_name, s.host),
            &format!("Could not copy the local {} dump to {}", s.pg_database_name, s.host),
        )
    }

    pub fn load_remote_database(&self) -> DeployResult<()> {
        let s = &self.settings;
        reported(
            self.remote.exec_interactive(&format!(
                "psql -f {0}.sql -U {1} -W {0}",
                s.pg_database_name, s.pg_database_user
            )),
            &format!("Database {} loaded on {}", s.pg_database_name, s.host),
            &format!("Could not load the {} database on {}", s.pg_database_name, s.host),
        )
    }

    pub fn rsync_to_remote(&self) -> DeployResult<()> {
        let s = &self.settings;
        let source = format!("{}/media", s.local_project_dir);
        let dest = format!("{}:{}", s.host, s.project_parent_dir);
        reported(
            self.local.run("rsync", &["-avz", &source, &dest]),
            &format!("Synchronized {} media to {}", s.project_name, s.host),
            &format!("Could not synchronize {} media to {}", s.project_name, s.host),
        )
    }

    /// Register the nightly database dump cronjob.
    pub fn add_cronjob(&self) -> DeployResult<Provisioned<()>> {
        let result = cron::install(self.remote.as_ref(), &cron::database_dump(&self.settings));
        match &result {
            Ok(Provisioned::Created(())) => report::success("Backup cronjob added"),
            Ok(Provisioned::Existing(())) => report::warn("Backup cronjob already present"),
            Err(e) => report::failure(&format!("Failed to add backup cronjob: {e}")),
        }
        result
    }
}
