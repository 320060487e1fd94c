//! Crontab entries on the remote host.

use crate::cmd::shell_quote;
use crate::error::{DeployError, DeployResult};
use crate::provision::Provisioned;
use crate::settings::Settings;
use crate::ssh::Remote;

const ADDED: &str = "added";
const PRESENT: &str = "present";

/// Append `line` to the remote user's crontab unless an identical
/// line is already there.
pub fn install(remote: &dyn Remote, line: &str) -> DeployResult<Provisioned<()>> {
    let quoted = shell_quote(line);
    let reply = remote.exec(&format!(
        "if crontab -l 2>/dev/null | grep -qxF {quoted}; then echo {PRESENT}; \
         else {{ crontab -l 2>/dev/null; echo {quoted}; }} | crontab - && echo {ADDED}; fi"
    ))?;
    match reply.trim() {
        ADDED => Ok(Provisioned::Created(())),
        PRESENT => Ok(Provisioned::Existing(())),
        other => Err(DeployError::SshFailed(format!(
            "unexpected reply while installing cron line: {other}"
        ))),
    }
}

/// Every 10 minutes, start supervisord if it is not running.
#[must_use]
pub fn supervisor_healthcheck(settings: &Settings) -> String {
    format!(
        "*/10 * * * * {}/start_supervisor.sh start",
        settings.supervisor_dir()
    )
}

/// Daily at 01:00, dump the project database into `~/db_backups`.
#[must_use]
pub fn database_dump(settings: &Settings) -> String {
    format!(
        "0 1 * * * /usr/local/pgsql/bin/pg_dump -Fp -b -U {user} {db} \
         > $HOME/db_backups/{db}.sql 2>> $HOME/db_backups/cron.log",
        user = settings.pg_database_user,
        db = settings.pg_database_name,
    )
}
