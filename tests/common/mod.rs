//! Recording fakes for the pipeline's collaborators.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use slipway::Settings;
use slipway::api::{
    AppInfo, AppSpec, AppType, DbInfo, DomainInfo, HostingApi, Session, WebsiteInfo,
    WebsiteSpec,
};
use slipway::cmd::Local;
use slipway::error::{DeployError, DeployResult};
use slipway::ssh::Remote;
use tempfile::TempDir;

pub const SETTINGS_YAML: &str = "\
wf_host: web500.webfaction.com
ip_host: 10.0.0.1
project_name: blog
project_dir_name: blog
project_parent_dir: /home/alice/webapps/blog
project_dir: /home/alice/webapps/blog/blog
project_django_dir: /home/alice/webapps/blog/blog/src
project_settings_module: blog.settings.production
project_media: /home/alice/webapps/blog/media
repository: git@example.com:alice/blog.git
user: alice
password: hunter2
virtualenvs: /home/alice/.virtualenvs
local_project_dir: LOCAL_DIR
pg_database_name: blog_db
pg_database_user: alice
host: webfaction
apache_dir: /home/alice/webapps/blog/apache2/bin
gdrive: /srv/drive/backups
";

pub fn settings(local_dir: &str) -> Settings {
    Settings::from_yaml(&SETTINGS_YAML.replace("LOCAL_DIR", local_dir)).unwrap()
}

/// A local project directory holding `secrets.json`.
pub fn local_project() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("secrets.json"), "{\"SECRET_KEY\": \"x\"}").unwrap();
    dir
}

fn fail_matching(needles: &[String], command: &str) -> DeployResult<()> {
    if needles.iter().any(|n| command.contains(n.as_str())) {
        Err(DeployError::Other(format!("failed: {command}")))
    } else {
        Ok(())
    }
}

// ---------------------------------------------------------------
// Remote
// ---------------------------------------------------------------

#[derive(Default)]
pub struct RemoteState {
    pub commands: Vec<String>,
    pub files: Vec<(String, String, Option<u32>)>,
    pub puts: Vec<(String, String)>,
    pub existing: HashSet<String>,
    pub fail_on: Vec<String>,
    /// Lines in the user's crontab.
    pub crontab: Vec<String>,
}

#[derive(Clone, Default)]
pub struct FakeRemote {
    pub state: Rc<RefCell<RemoteState>>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_existing(self, path: &str) -> Self {
        self.state.borrow_mut().existing.insert(path.to_string());
        self
    }

    pub fn failing_on(self, needle: &str) -> Self {
        self.state.borrow_mut().fail_on.push(needle.to_string());
        self
    }

    pub fn commands(&self) -> Vec<String> {
        self.state.borrow().commands.clone()
    }

    pub fn count(&self, needle: &str) -> usize {
        self.state
            .borrow()
            .commands
            .iter()
            .filter(|c| c.contains(needle))
            .count()
    }

    pub fn ran(&self, needle: &str) -> bool {
        self.count(needle) > 0
    }

    /// Position of the first command containing `needle`.
    pub fn position(&self, needle: &str) -> Option<usize> {
        self.state
            .borrow()
            .commands
            .iter()
            .position(|c| c.contains(needle))
    }

    pub fn file(&self, path: &str) -> Option<(String, Option<u32>)> {
        self.state
            .borrow()
            .files
            .iter()
            .rev()
            .find(|(p, _, _)| p == path)
            .map(|(_, content, mode)| (content.clone(), *mode))
    }

    pub fn crontab(&self) -> Vec<String> {
        self.state.borrow().crontab.clone()
    }

    pub fn puts(&self) -> Vec<(String, String)> {
        self.state.borrow().puts.clone()
    }

    /// Answer a guarded crontab install the way the remote shell
    /// would, keeping the crontab in state.
    fn crontab_reply(&self, command: &str) -> String {
        let Some((_, rest)) = command.split_once("grep -qxF '") else {
            return String::new();
        };
        let line = rest.split('\'').next().unwrap_or_default().to_string();
        let mut state = self.state.borrow_mut();
        if state.crontab.contains(&line) {
            "present".to_string()
        } else {
            state.crontab.push(line);
            "added".to_string()
        }
    }

    fn record(&self, command: &str) -> DeployResult<()> {
        let mut state = self.state.borrow_mut();
        state.commands.push(command.to_string());
        fail_matching(&state.fail_on, command)
    }
}

impl Remote for FakeRemote {
    fn exec(&self, command: &str) -> DeployResult<String> {
        self.record(command)?;
        Ok(self.crontab_reply(command))
    }

    fn exec_interactive(&self, command: &str) -> DeployResult<()> {
        self.record(command)
    }

    fn write_file(&self, content: &str, remote_path: &str, mode: Option<u32>) -> DeployResult<()> {
        self.state
            .borrow_mut()
            .files
            .push((remote_path.to_string(), content.to_string(), mode));
        Ok(())
    }

    fn put_file(&self, local_path: &str, remote_path: &str) -> DeployResult<()> {
        self.state
            .borrow_mut()
            .puts
            .push((local_path.to_string(), remote_path.to_string()));
        Ok(())
    }

    fn exists(&self, path: &str) -> DeployResult<bool> {
        Ok(self.state.borrow().existing.contains(path))
    }
}

// ---------------------------------------------------------------
// Local
// ---------------------------------------------------------------

#[derive(Default)]
pub struct LocalState {
    pub commands: Vec<String>,
    pub fail_on: Vec<String>,
    pub missing: Vec<String>,
}

#[derive(Clone, Default)]
pub struct FakeLocal {
    pub state: Rc<RefCell<LocalState>>,
}

impl FakeLocal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(self, needle: &str) -> Self {
        self.state.borrow_mut().fail_on.push(needle.to_string());
        self
    }

    pub fn without(self, program: &str) -> Self {
        self.state.borrow_mut().missing.push(program.to_string());
        self
    }

    pub fn commands(&self) -> Vec<String> {
        self.state.borrow().commands.clone()
    }

    pub fn ran(&self, needle: &str) -> bool {
        self.state
            .borrow()
            .commands
            .iter()
            .any(|c| c.contains(needle))
    }
}

impl Local for FakeLocal {
    fn run(&self, program: &str, args: &[&str]) -> DeployResult<()> {
        let mut command = vec![program];
        command.extend_from_slice(args);
        let command = command.join(" ");

        let mut state = self.state.borrow_mut();
        state.commands.push(command.clone());
        if state.missing.iter().any(|m| m == program) {
            return Err(DeployError::CommandNotFound(program.to_string()));
        }
        fail_matching(&state.fail_on, &command)
    }

    fn has(&self, program: &str) -> bool {
        !self.state.borrow().missing.iter().any(|m| m == program)
    }
}

// ---------------------------------------------------------------
// Hosting API
// ---------------------------------------------------------------

pub struct ApiState {
    pub apps: Vec<AppInfo>,
    pub domains: Vec<DomainInfo>,
    pub websites: Vec<WebsiteInfo>,
    pub dbs: Vec<DbInfo>,
    pub next_port: u16,
    pub logins: usize,
    pub created_apps: Vec<AppSpec>,
    pub created_domains: Vec<(String, String)>,
    pub created_websites: Vec<WebsiteSpec>,
    pub created_dbs: Vec<String>,
    /// Names whose creation faults.
    pub fail_create: Vec<String>,
}

#[derive(Clone)]
pub struct FakeApi {
    pub state: Rc<RefCell<ApiState>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(ApiState {
                apps: Vec::new(),
                domains: Vec::new(),
                websites: Vec::new(),
                dbs: Vec::new(),
                next_port: 31337,
                logins: 0,
                created_apps: Vec::new(),
                created_domains: Vec::new(),
                created_websites: Vec::new(),
                created_dbs: Vec::new(),
                fail_create: Vec::new(),
            })),
        }
    }

    pub fn with_app(self, name: &str, port: u16) -> Self {
        self.state.borrow_mut().apps.push(AppInfo {
            id: 1,
            name: name.to_string(),
            app_type: "custom_app_with_port".to_string(),
            port,
            extra_info: String::new(),
        });
        self
    }

    pub fn failing_create(self, name: &str) -> Self {
        self.state.borrow_mut().fail_create.push(name.to_string());
        self
    }

    pub fn created_app_names(&self) -> Vec<String> {
        self.state
            .borrow()
            .created_apps
            .iter()
            .map(|a| a.name.clone())
            .collect()
    }

    fn check(&self, name: &str) -> DeployResult<()> {
        if self.state.borrow().fail_create.iter().any(|n| n == name) {
            Err(DeployError::Fault {
                code: 1,
                message: format!("could not create {name}: quota exceeded"),
            })
        } else {
            Ok(())
        }
    }
}

impl HostingApi for FakeApi {
    fn login(&self, user: &str, password: &str) -> DeployResult<Session> {
        assert_eq!(user, "alice");
        assert_eq!(password, "hunter2");
        self.state.borrow_mut().logins += 1;
        Ok(Session {
            id: "session".into(),
            account: serde_json::Value::Null,
        })
    }

    fn list_apps(&self, _session: &Session) -> DeployResult<Vec<AppInfo>> {
        Ok(self.state.borrow().apps.clone())
    }

    fn create_app(&self, _session: &Session, app: &AppSpec) -> DeployResult<AppInfo> {
        self.check(&app.name)?;
        let mut state = self.state.borrow_mut();
        let port = if app.app_type == AppType::CustomAppWithPort {
            let port = state.next_port;
            state.next_port += 1;
            port
        } else {
            0
        };
        let info = AppInfo {
            id: state.apps.len() as i64 + 1,
            name: app.name.clone(),
            app_type: app.app_type.as_str().to_string(),
            port,
            extra_info: app.extra_info.clone(),
        };
        state.apps.push(info.clone());
        state.created_apps.push(app.clone());
        Ok(info)
    }

    fn list_domains(&self, _session: &Session) -> DeployResult<Vec<DomainInfo>> {
        Ok(self.state.borrow().domains.clone())
    }

    fn create_domain(
        &self,
        _session: &Session,
        domain: &str,
        subdomain: &str,
    ) -> DeployResult<DomainInfo> {
        self.check(domain)?;
        let mut state = self.state.borrow_mut();
        let info = DomainInfo {
            id: 1,
            domain: domain.to_string(),
            subdomains: vec![subdomain.to_string()],
        };
        state.domains.push(info.clone());
        state
            .created_domains
            .push((domain.to_string(), subdomain.to_string()));
        Ok(info)
    }

    fn list_websites(&self, _session: &Session) -> DeployResult<Vec<WebsiteInfo>> {
        Ok(self.state.borrow().websites.clone())
    }

    fn create_website(&self, _session: &Session, site: &WebsiteSpec) -> DeployResult<WebsiteInfo> {
        self.check(&site.name)?;
        let mut state = self.state.borrow_mut();
        let info = WebsiteInfo {
            id: 1,
            name: site.name.clone(),
            ip: site.ip.clone(),
            https: site.https,
            subdomains: site.subdomains.clone(),
            website_apps: site.apps.clone(),
        };
        state.websites.push(info.clone());
        state.created_websites.push(site.clone());
        Ok(info)
    }

    fn list_dbs(&self, _session: &Session) -> DeployResult<Vec<DbInfo>> {
        Ok(self.state.borrow().dbs.clone())
    }

    fn create_db(
        &self,
        _session: &Session,
        name: &str,
        db_type: &str,
        password: &str,
    ) -> DeployResult<DbInfo> {
        self.check(name)?;
        assert_eq!(password, "hunter2");
        let mut state = self.state.borrow_mut();
        let info = DbInfo {
            id: 1,
            name: name.to_string(),
            db_type: db_type.to_string(),
            machine: "web500".to_string(),
        };
        state.dbs.push(info.clone());
        state.created_dbs.push(name.to_string());
        Ok(info)
    }
}

/// All three fakes wired into a pipeline.
pub struct Harness {
    pub pipeline: slipway::Pipeline,
    pub remote: FakeRemote,
    pub local: FakeLocal,
    pub api: FakeApi,
    pub dir: TempDir,
}

pub fn harness_with(remote: FakeRemote, local: FakeLocal, api: FakeApi) -> Harness {
    let dir = local_project();
    let settings = settings(dir.path().to_str().unwrap());
    let pipeline = slipway::Pipeline::new(settings, remote.clone(), local.clone(), api.clone());
    Harness {
        pipeline,
        remote,
        local,
        api,
        dir,
    }
}

pub fn harness() -> Harness {
    harness_with(FakeRemote::new(), FakeLocal::new(), FakeApi::new())
}
