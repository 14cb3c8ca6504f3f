// NOTE: Setting env vars in tests will clobber env vars in other tests, so each
// test uses its own env var prefix.

use std::path::Path;

use clap::Parser as _;
use figment::Jail;

use crate::settings::{Args, OsClientKind, Settings};

const CFG_FILE_CONTENTS: &str = r#"
    data_dir = "/config/specs"
    os_client = "dummy"
    bootc = "/config/bootc"
"#;

fn make_args(args: &str) -> Result<Args, clap::Error> {
    Args::try_parse_from(str::split_ascii_whitespace(args))
}

#[test]
fn test_defaults_apply_without_config() {
    Jail::expect_with(|jail| {
        let args = make_args("boot_reconciler").unwrap();
        let settings = Settings::get(&args, jail.directory().join("missing.conf"), "defaults_")?;
        assert_eq!(settings, Settings::default());
        Ok(())
    });
}

#[test]
fn test_config_file_overrides_defaults() {
    Jail::expect_with(|jail| {
        jail.create_file("config.toml", CFG_FILE_CONTENTS)?;
        let args = make_args("boot_reconciler").unwrap();
        let settings = Settings::get(&args, Path::new("config.toml"), "cfg_file_")?;
        assert_eq!(
            settings,
            Settings {
                data_dir: "/config/specs".into(),
                os_client: OsClientKind::Dummy,
                bootc: "/config/bootc".into(),
            }
        );
        Ok(())
    });
}

#[test]
fn test_env_vars_override_config_file() {
    Jail::expect_with(|jail| {
        jail.create_file("config.toml", CFG_FILE_CONTENTS)?;
        jail.set_env("env_over_cfg_data_dir", "/env/specs");
        jail.set_env("env_over_cfg_os_client", "bootc");
        let args = make_args("boot_reconciler").unwrap();
        let settings = Settings::get(&args, Path::new("config.toml"), "env_over_cfg_")?;
        assert_eq!(
            settings,
            Settings {
                data_dir: "/env/specs".into(),
                os_client: OsClientKind::Bootc,
                bootc: "/config/bootc".into(),
            }
        );
        Ok(())
    });
}

#[test]
fn test_cli_args_override_config_file_and_env_vars() {
    Jail::expect_with(|jail| {
        jail.create_file("config.toml", CFG_FILE_CONTENTS)?;
        jail.set_env("args_over_env_data_dir", "/env/specs");
        jail.set_env("args_over_env_bootc", "/env/bootc");
        let args = make_args(
            "boot_reconciler --data-dir /args/specs --bootc /args/bootc --os-client bootc",
        )
        .unwrap();
        let settings = Settings::get(&args, Path::new("config.toml"), "args_over_env_")?;
        assert_eq!(
            settings,
            Settings {
                data_dir: "/args/specs".into(),
                os_client: OsClientKind::Bootc,
                bootc: "/args/bootc".into(),
            }
        );
        Ok(())
    });
}

#[test]
fn test_invalid_os_client_is_rejected() {
    Jail::expect_with(|jail| {
        jail.create_file("config.toml", r#"os_client = "rpm-ostree""#)?;
        let args = make_args("boot_reconciler").unwrap();
        assert!(Settings::get(&args, Path::new("config.toml"), "invalid_").is_err());
        Ok(())
    });
}
