use std::path::Path;

use clap::Parser;
use slipway::{Cli, Command, ReloadMode};

#[test]
fn reload_mode_parses() {
    let cli = Cli::try_parse_from(["slipway", "reload-app", "quick"]).unwrap();
    assert_eq!(
        cli.command,
        Command::ReloadApp {
            mode: Some(ReloadMode::Quick)
        }
    );

    let cli = Cli::try_parse_from(["slipway", "reload-app"]).unwrap();
    assert_eq!(cli.command, Command::ReloadApp { mode: None });
}

#[test]
fn unknown_reload_mode_is_rejected() {
    assert!(Cli::try_parse_from(["slipway", "reload-app", "partial"]).is_err());
}

#[test]
fn settings_path_is_global() {
    let cli = Cli::try_parse_from(["slipway", "status", "--settings", "prod.yml"]).unwrap();
    assert_eq!(cli.settings, Path::new("prod.yml"));
    assert_eq!(cli.command, Command::Status);
}

#[test]
fn render_config_ports() {
    let cli = Cli::try_parse_from(["slipway", "render-config", "--port", "24000"]).unwrap();
    assert_eq!(
        cli.command,
        Command::RenderConfig {
            port: 24000,
            supervisor_port: 9001
        }
    );
}

#[test]
fn create_db_takes_optional_name() {
    let cli = Cli::try_parse_from(["slipway", "create-db", "other_db"]).unwrap();
    assert_eq!(
        cli.command,
        Command::CreateDb {
            name: Some("other_db".to_string())
        }
    );
}
