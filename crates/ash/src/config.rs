//! Command-line overrides on top of `ash_config`.
//!
//! Flags win over the config file and environment. `--token` skips the
//! whole credential chain.

use secrecy::SecretString;

use ash_config::Config;
use ash_core::{PlatformConfig, TlsVerification};

use crate::cli::Cli;
use crate::error::CliError;

/// Load the config file and fold the command-line flags into it.
pub fn build_platform_config(cli: &Cli) -> Result<PlatformConfig, CliError> {
    let path = cli.config.clone().unwrap_or_else(ash_config::config_path);
    let mut config = ash_config::load_config(&path)?;
    apply_overrides(&mut config, cli);

    let url = config.url(&path)?;
    let token = match cli.token {
        Some(ref token) => SecretString::from(token.clone()),
        None => ash_config::resolve_token(&config, &url)?,
    };

    let platform = ash_config::to_platform_config(&config, &path, token)?;
    tracing::debug!(
        url = %platform.url,
        api_path = %platform.api_path,
        verify_tls = platform.tls != TlsVerification::DangerAcceptInvalid,
        "platform configured"
    );
    Ok(platform)
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(ref url) = cli.url {
        config.base_url = Some(url.clone());
    }
    if let Some(ref api_path) = cli.api_path {
        config.api_path.clone_from(api_path);
    }
    if let Some(timeout) = cli.timeout {
        config.timeout = timeout;
    }
    if cli.secure {
        config.insecure = false;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::Parser;
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn flags_override_the_file() {
        let mut config = Config {
            base_url: Some("https://file.example.com".into()),
            ..Config::default()
        };
        let cli = Cli::try_parse_from([
            "ash",
            "--url",
            "https://flag.example.com",
            "--timeout",
            "60",
            "--secure",
        ])
        .unwrap();

        apply_overrides(&mut config, &cli);
        assert_eq!(config.base_url.as_deref(), Some("https://flag.example.com"));
        assert_eq!(config.timeout, 60);
        assert!(!config.insecure);
        assert_eq!(config.api_path, "/api/v2/");
    }

    #[test]
    fn token_flag_skips_the_credential_chain() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");
        std::fs::write(&path, "base_url: https://aap.example.com\n").unwrap();

        let cli = Cli::try_parse_from([
            "ash",
            "--config",
            path.to_str().unwrap(),
            "--token",
            "from-flag",
        ])
        .unwrap();

        let platform = build_platform_config(&cli).unwrap();
        assert_eq!(platform.token.expose_secret(), "from-flag");
        assert_eq!(platform.url.as_str(), "https://aap.example.com/");
    }

    #[test]
    fn missing_base_url_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.yml");
        let cli = Cli::try_parse_from(["ash", "--config", path.to_str().unwrap()]).unwrap();

        let err = build_platform_config(&cli).unwrap_err();
        assert!(matches!(err, CliError::NoConfig { .. }));
    }
}
