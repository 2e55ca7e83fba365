//! CLI definitions for reltag
//!
//! This module contains the CLI argument parsing structure using clap.

use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::config::ConfigOverrides;
use crate::domain::tag::TagMode;

#[derive(Parser, Debug)]
#[command(
    name = "reltag",
    version,
    about = "Release tagging for TeamCity builds",
    long_about = "Pins every artifact dependency of a TeamCity build and tags the\n\
                  revision behind every snapshot dependency as rel/<release> in Bitbucket."
)]
pub struct Cli {
    /// Build number of the release build
    #[arg(long)]
    pub build: String,

    /// Release version, tagged as rel/<release>
    #[arg(long)]
    pub release: String,

    /// Bitbucket username
    #[arg(long, env = "BB_USERNAME")]
    pub bb_username: String,

    /// Bitbucket app password
    #[arg(long, env = "BB_PASSWORD", hide_env_values = true)]
    pub bb_password: String,

    /// TeamCity access token
    #[arg(long, env = "TC_TOKEN", hide_env_values = true)]
    pub tc_token: String,

    /// Unpin the builds and delete the release tags instead
    #[arg(long)]
    pub delete: bool,

    /// More logging, repeatable (-vv for trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Less logging, repeatable (-qq for errors only)
    #[arg(short, long, action = ArgAction::Count)]
    pub quiet: u8,

    /// YAML configuration file
    #[arg(long, env = "RELTAG_CONFIG")]
    pub config: Option<PathBuf>,

    /// TeamCity build type of the release build
    #[arg(long)]
    pub build_type: Option<String>,

    /// TeamCity server URL
    #[arg(long, env = "TEAMCITY_URL")]
    pub tc_url: Option<String>,

    /// Bitbucket API URL
    #[arg(long)]
    pub bb_url: Option<String>,
}

impl Cli {
    pub fn mode(&self) -> TagMode {
        TagMode::from_delete_flag(self.delete)
    }

    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            ci_base_url: self.tc_url.clone(),
            vcs_base_url: self.bb_url.clone(),
            build_type: self.build_type.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    const REQUIRED: [&str; 11] = [
        "reltag",
        "--build",
        "1234",
        "--release",
        "2.3.0",
        "--bb-username",
        "deploy-bot",
        "--bb-password",
        "app-pass",
        "--tc-token",
        "tc-token",
    ];

    fn parse(extra: &[&str]) -> Cli {
        Cli::try_parse_from(REQUIRED.iter().chain(extra)).unwrap()
    }

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_required_arguments() {
        let cli = parse(&[]);
        assert_eq!(cli.build, "1234");
        assert_eq!(cli.release, "2.3.0");
        assert_eq!(cli.mode(), TagMode::Create);
        assert_eq!(cli.verbose, 0);
        assert_eq!(cli.quiet, 0);
    }

    #[test]
    fn test_missing_release_is_rejected() {
        let result = Cli::try_parse_from([
            "reltag",
            "--build",
            "1234",
            "--bb-username",
            "u",
            "--bb-password",
            "p",
            "--tc-token",
            "t",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_delete_and_verbosity_flags() {
        let cli = parse(&["--delete", "-vv", "-q"]);
        assert_eq!(cli.mode(), TagMode::Delete);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.quiet, 1);
    }

    #[test]
    fn test_overrides() {
        let cli = parse(&[
            "--tc-url",
            "https://tc.example.com",
            "--bb-url",
            "https://bb.example.com",
            "--build-type",
            "bt_main",
        ]);
        let overrides = cli.overrides();
        assert_eq!(overrides.ci_base_url.as_deref(), Some("https://tc.example.com"));
        assert_eq!(overrides.vcs_base_url.as_deref(), Some("https://bb.example.com"));
        assert_eq!(overrides.build_type.as_deref(), Some("bt_main"));
    }
}
