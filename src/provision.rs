//! Idempotent creation of hosting resources.
//!
//! Each `ensure_*` call lists what the account already has and only
//! creates the resource when it is absent. A create that races with
//! another client and faults with "already exists" is resolved by
//! listing again.

use crate::api::{
    AppInfo, AppSpec, DbInfo, DomainInfo, HostingApi, Session, WebsiteInfo, WebsiteSpec,
};
use crate::error::DeployResult;

/// Outcome of an idempotent provisioning call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provisioned<T> {
    /// The resource was created by this call.
    Created(T),
    /// A resource with this name was already present.
    Existing(T),
}

impl<T> Provisioned<T> {
    #[must_use]
    pub const fn get(&self) -> &T {
        match self {
            Self::Created(t) | Self::Existing(t) => t,
        }
    }

    #[must_use]
    pub fn into_inner(self) -> T {
        match self {
            Self::Created(t) | Self::Existing(t) => t,
        }
    }

    #[must_use]
    pub const fn was_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

fn ensure<T>(
    find: impl Fn() -> DeployResult<Option<T>>,
    create: impl FnOnce() -> DeployResult<T>,
) -> DeployResult<Provisioned<T>> {
    if let Some(found) = find()? {
        return Ok(Provisioned::Existing(found));
    }

    match create() {
        Ok(created) => Ok(Provisioned::Created(created)),
        Err(e) if e.is_already_exists() => find()?.map(Provisioned::Existing).ok_or(e),
        Err(e) => Err(e),
    }
}

/// Idempotent resource operations against one account.
pub struct Resources<'a> {
    api: &'a dyn HostingApi,
    user: &'a str,
    password: &'a str,
}

impl<'a> Resources<'a> {
    #[must_use]
    pub fn new(api: &'a dyn HostingApi, user: &'a str, password: &'a str) -> Self {
        Self {
            api,
            user,
            password,
        }
    }

    fn session(&self) -> DeployResult<Session> {
        self.api.login(self.user, self.password)
    }

    pub fn ensure_app(&self, spec: &AppSpec) -> DeployResult<Provisioned<AppInfo>> {
        let session = self.session()?;
        ensure(
            || {
                Ok(self
                    .api
                    .list_apps(&session)?
                    .into_iter()
                    .find(|a| a.name == spec.name))
            },
            || self.api.create_app(&session, spec),
        )
    }

    /// Ensure `domain` carries `subdomain`.
    pub fn ensure_domain(
        &self,
        domain: &str,
        subdomain: &str,
    ) -> DeployResult<Provisioned<DomainInfo>> {
        let session = self.session()?;
        ensure(
            || {
                Ok(self.api.list_domains(&session)?.into_iter().find(|d| {
                    d.domain == domain && d.subdomains.iter().any(|s| s == subdomain)
                }))
            },
            || self.api.create_domain(&session, domain, subdomain),
        )
    }

    pub fn ensure_website(&self, site: &WebsiteSpec) -> DeployResult<Provisioned<WebsiteInfo>> {
        let session = self.session()?;
        ensure(
            || {
                Ok(self
                    .api
                    .list_websites(&session)?
                    .into_iter()
                    .find(|w| w.name == site.name))
            },
            || self.api.create_website(&session, site),
        )
    }

    pub fn ensure_db(&self, name: &str, db_type: &str) -> DeployResult<Provisioned<DbInfo>> {
        let session = self.session()?;
        ensure(
            || {
                Ok(self
                    .api
                    .list_dbs(&session)?
                    .into_iter()
                    .find(|d| d.name == name))
            },
            || self.api.create_db(&session, name, db_type, self.password),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::error::DeployError;

    #[test]
    fn found_resource_is_not_created() {
        let created = Cell::new(false);
        let outcome = ensure(
            || Ok(Some(1)),
            || {
                created.set(true);
                Ok(2)
            },
        )
        .unwrap();

        assert_eq!(outcome, Provisioned::Existing(1));
        assert!(!created.get());
    }

    #[test]
    fn absent_resource_is_created() {
        let outcome = ensure(|| Ok(None), || Ok(2)).unwrap();
        assert_eq!(outcome, Provisioned::Created(2));
        assert!(outcome.was_created());
    }

    #[test]
    fn already_exists_fault_resolves_through_a_second_lookup() {
        let lookups = Cell::new(0);
        let outcome = ensure(
            || {
                lookups.set(lookups.get() + 1);
                Ok((lookups.get() > 1).then_some(7))
            },
            || {
                Err(DeployError::Fault {
                    code: 1,
                    message: "Name already exists.".into(),
                })
            },
        )
        .unwrap();

        assert_eq!(outcome.into_inner(), 7);
    }

    #[test]
    fn other_faults_propagate() {
        let err = ensure::<u8>(
            || Ok(None),
            || {
                Err(DeployError::Fault {
                    code: 1,
                    message: "quota exceeded".into(),
                })
            },
        )
        .unwrap_err();

        assert!(matches!(err, DeployError::Fault { .. }));
    }
}
