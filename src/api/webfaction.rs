use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::api::xmlrpc;
use crate::api::{AppInfo, AppSpec, DbInfo, DomainInfo, HostingApi, Session, WebsiteInfo, WebsiteSpec};
use crate::cmd;
use crate::error::{DeployError, DeployResult};

/// XML-RPC client for the `WebFaction` API.
///
/// Each call is sent as a POST request through curl.
pub struct Webfaction {
    url: String,
}

impl Webfaction {
    #[must_use]
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
        }
    }

    /// Perform one XML-RPC call and return the decoded result.
    fn call(&self, method: &str, params: &[Value]) -> DeployResult<Value> {
        tracing::debug!(url = %self.url, %method, "xml-rpc call");
        let body = xmlrpc::encode_call(method, params);
        let response = cmd::run_with_stdin(
            "curl",
            &[
                "-s",
                "-S",
                "--fail",
                "-X",
                "POST",
                "-H",
                "Content-Type: text/xml",
                "--data-binary",
                "@-",
                &self.url,
            ],
            body.as_bytes(),
        )?;
        let value = xmlrpc::decode_response(&response);
        if let Err(e) = &value {
            tracing::debug!(%method, error = %e, "xml-rpc call failed");
        }
        value
    }

    fn call_as<T: DeserializeOwned>(&self, method: &str, params: &[Value]) -> DeployResult<T> {
        let value = self.call(method, params)?;
        Ok(serde_json::from_value(value)?)
    }
}

/// Positional parameters for `create_app`.
#[must_use]
pub fn create_app_params(session: &Session, app: &AppSpec) -> Vec<Value> {
    vec![
        json!(session.id),
        json!(app.name),
        json!(app.app_type.as_str()),
        json!(app.autostart),
        json!(app.extra_info),
    ]
}

/// Positional parameters for `create_website`: the fixed fields,
/// then one `[app, path]` pair per bound app.
#[must_use]
pub fn create_website_params(session: &Session, site: &WebsiteSpec) -> Vec<Value> {
    let mut params = vec![
        json!(session.id),
        json!(site.name),
        json!(site.ip),
        json!(site.https),
        json!(site.subdomains),
    ];
    params.extend(site.apps.iter().map(|(app, path)| json!([app, path])));
    params
}

/// Split a `login` result into a session.
pub fn parse_login(value: Value) -> DeployResult<Session> {
    match value {
        Value::Array(mut parts) if parts.len() == 2 => {
            let account = parts.pop().unwrap_or(Value::Null);
            let id = parts
                .pop()
                .and_then(|v| v.as_str().map(str::to_string))
                .ok_or_else(|| DeployError::Protocol("login returned no session id".into()))?;
            Ok(Session { id, account })
        }
        other => Err(DeployError::Protocol(format!(
            "unexpected login response: {other}"
        ))),
    }
}

impl HostingApi for Webfaction {
    fn login(&self, user: &str, password: &str) -> DeployResult<Session> {
        parse_login(self.call("login", &[json!(user), json!(password)])?)
    }

    fn list_apps(&self, session: &Session) -> DeployResult<Vec<AppInfo>> {
        self.call_as("list_apps", &[json!(session.id)])
    }

    fn create_app(&self, session: &Session, app: &AppSpec) -> DeployResult<AppInfo> {
        self.call_as("create_app", &create_app_params(session, app))
    }

    fn list_domains(&self, session: &Session) -> DeployResult<Vec<DomainInfo>> {
        self.call_as("list_domains", &[json!(session.id)])
    }

    fn create_domain(
        &self,
        session: &Session,
        domain: &str,
        subdomain: &str,
    ) -> DeployResult<DomainInfo> {
        self.call_as(
            "create_domain",
            &[json!(session.id), json!(domain), json!(subdomain)],
        )
    }

    fn list_websites(&self, session: &Session) -> DeployResult<Vec<WebsiteInfo>> {
        self.call_as("list_websites", &[json!(session.id)])
    }

    fn create_website(&self, session: &Session, site: &WebsiteSpec) -> DeployResult<WebsiteInfo> {
        self.call_as("create_website", &create_website_params(session, site))
    }

    fn list_dbs(&self, session: &Session) -> DeployResult<Vec<DbInfo>> {
        self.call_as("list_dbs", &[json!(session.id)])
    }

    fn create_db(
        &self,
        session: &Session,
        name: &str,
        db_type: &str,
        password: &str,
    ) -> DeployResult<DbInfo> {
        self.call_as(
            "create_db",
            &[json!(session.id), json!(name), json!(db_type), json!(password)],
        )
    }
}
