mod common;

use common::{FakeApi, FakeLocal, FakeRemote, harness, harness_with};
use slipway::error::DeployError;
use slipway::{Facts, Provisioned, cron};

const DIR: &str = "/home/alice/webapps/supervisor";

#[test]
fn install_records_supervisor_port() {
    let h = harness();

    let facts = h.pipeline.install_supervisor(Facts::default()).unwrap();

    assert_eq!(facts.supervisor_port, Some(31337));
    assert_eq!(facts.app_port, None);
    assert_eq!(h.api.created_app_names(), vec!["supervisor"]);
}

#[test]
fn install_uploads_both_templates() {
    let h = harness();

    h.pipeline.install_supervisor(Facts::default()).unwrap();

    let (conf, mode) = h.remote.file(&format!("{DIR}/supervisord.conf")).unwrap();
    assert!(conf.contains("port=127.0.0.1:31337"));
    assert!(conf.contains("username=alice"));
    assert!(conf.contains("files = /home/alice/webapps/supervisor/conf.d/*.conf"));
    assert_eq!(mode, None);

    let (script, mode) = h.remote.file(&format!("{DIR}/start_supervisor.sh")).unwrap();
    assert!(script.starts_with("#!/bin/sh"));
    assert!(script.contains("/home/alice/.virtualenvs/supervisor/bin/supervisord"));
    assert_eq!(mode, Some(0o750));
}

#[test]
fn install_registers_healthcheck_and_starts() {
    let h = harness();

    h.pipeline.install_supervisor(Facts::default()).unwrap();

    assert!(h
        .remote
        .ran("*/10 * * * * /home/alice/webapps/supervisor/start_supervisor.sh start"));
    assert!(h.remote.ran(&format!("mkdir -p {DIR}/conf.d")));

    let cron = h.remote.position("crontab").unwrap();
    let start = h.remote.position("./start_supervisor.sh start").unwrap();
    assert!(cron < start);
}

#[test]
fn supervisor_package_installed_only_when_missing() {
    let h = harness();
    h.pipeline.install_supervisor(Facts::default()).unwrap();
    assert_eq!(h.remote.count("pip install supervisor"), 1);

    let h = harness_with(
        FakeRemote::new().with_existing("/home/alice/.virtualenvs/supervisor/bin/supervisord"),
        FakeLocal::new(),
        FakeApi::new(),
    );
    h.pipeline.install_supervisor(Facts::default()).unwrap();
    assert!(!h.remote.ran("pip install supervisor"));
}

#[test]
fn failed_start_is_not_fatal() {
    let h = harness_with(
        FakeRemote::new().failing_on("./start_supervisor.sh stop"),
        FakeLocal::new(),
        FakeApi::new(),
    );

    assert!(h.pipeline.install_supervisor(Facts::default()).is_ok());
}

#[test]
fn supervisor_slot_failure_is_fatal() {
    let h = harness_with(
        FakeRemote::new(),
        FakeLocal::new(),
        FakeApi::new().failing_create("supervisor"),
    );

    let err = h.pipeline.install_supervisor(Facts::default()).unwrap_err();

    assert!(matches!(err, DeployError::Fault { .. }));
    assert!(h.remote.commands().is_empty());
}

#[test]
fn cron_install_is_guarded_by_grep() {
    let remote = FakeRemote::new();

    let outcome = cron::install(&remote, "0 1 * * * echo hi").unwrap();

    assert_eq!(outcome, Provisioned::Created(()));
    assert_eq!(
        remote.commands(),
        vec![
            "if crontab -l 2>/dev/null | grep -qxF '0 1 * * * echo hi'; then echo present; \
             else { crontab -l 2>/dev/null; echo '0 1 * * * echo hi'; } | crontab - \
             && echo added; fi"
        ]
    );
}

#[test]
fn cron_line_already_present_is_not_added_again() {
    let remote = FakeRemote::new();

    cron::install(&remote, "0 1 * * * echo hi").unwrap();
    let again = cron::install(&remote, "0 1 * * * echo hi").unwrap();

    assert_eq!(again, Provisioned::Existing(()));
    assert_eq!(remote.crontab(), vec!["0 1 * * * echo hi"]);
}

#[test]
fn unexpected_cron_reply_is_an_error() {
    struct Silent;

    impl slipway::ssh::Remote for Silent {
        fn exec(&self, _command: &str) -> slipway::error::DeployResult<String> {
            Ok(String::new())
        }
        fn exec_interactive(&self, _command: &str) -> slipway::error::DeployResult<()> {
            Ok(())
        }
        fn write_file(
            &self,
            _content: &str,
            _remote_path: &str,
            _mode: Option<u32>,
        ) -> slipway::error::DeployResult<()> {
            Ok(())
        }
        fn put_file(&self, _local: &str, _remote: &str) -> slipway::error::DeployResult<()> {
            Ok(())
        }
    }

    assert!(matches!(
        cron::install(&Silent, "0 1 * * * echo hi"),
        Err(DeployError::SshFailed(_))
    ));
}

#[test]
fn database_dump_line() {
    let s = common::settings("/srv/blog");

    assert_eq!(
        cron::database_dump(&s),
        "0 1 * * * /usr/local/pgsql/bin/pg_dump -Fp -b -U alice blog_db \
         > $HOME/db_backups/blog_db.sql 2>> $HOME/db_backups/cron.log"
    );
}
