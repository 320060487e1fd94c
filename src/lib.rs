//! Deploy a Django project onto WebFaction-style shared hosting.
//!
//! Slipway provisions hosting resources through the provider's
//! XML-RPC API, installs supervisor and gunicorn over SSH, deploys
//! code with git, and moves `PostgreSQL` dumps and media between the
//! remote host and your machine.
//!
//! A slipway is the ramp a ship is built on and launched from.
//!
//! # Overview
//!
//! Everything runs through a [`Pipeline`] that owns the immutable
//! [`Settings`] and three collaborators:
//!
//! - a [`Remote`](ssh::Remote) executor (e.g. [`SshSession`])
//! - a [`Local`](cmd::Local) runner for rsync, scp and psql
//! - a [`HostingApi`](api::HostingApi) client (e.g. [`Webfaction`])
//!
//! # Workflow
//!
//! `deploy` runs, in order:
//!
//! 1. **Bootstrap** - base directories, pip, virtualenvwrapper
//! 2. **Supervisor** - only when `~/webapps/supervisor` is missing:
//!    app slot, virtualenv, config, health-check cronjob, start
//! 3. **App** - secrets, app slot (its port goes into the gunicorn
//!    program entry), git clone if absent, virtualenv, hosting
//!    resources, reload, restart
//!
//! Resource creation is idempotent: every `ensure_*` call returns a
//! [`Provisioned`] telling whether the resource was created or was
//! already there. Values discovered along the way, such as the
//! assigned port, travel in [`Facts`].
//!
//! # Example
//!
//! ```rust,no_run
//! use slipway::{Pipeline, Settings};
//!
//! fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load("slipway.yml".as_ref())?;
//!     let pipeline = Pipeline::from_settings(settings);
//!
//!     let facts = pipeline.deploy()?;
//!     println!("app listening on port {:?}", facts.app_port);
//!     Ok(())
//! }
//! ```

// Allow noisy pedantic lints that don't add value for a
// deployment tool crate.
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod api;
pub mod app;
pub mod backup;
pub mod cmd;
pub mod configure;
pub mod cron;
pub mod error;
pub mod pipeline;
pub mod provision;
pub mod report;
pub mod settings;
pub mod ssh;
pub mod supervisor;
pub mod template;
pub mod virtualenv;

pub use api::webfaction::Webfaction;
pub use app::ReloadMode;
pub use configure::{ConfigureReport, StepStatus};
pub use pipeline::{Cli, Command, Facts, Pipeline};
pub use provision::Provisioned;
pub use settings::Settings;
pub use ssh::SshSession;
