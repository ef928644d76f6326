use clap::{CommandFactory, Parser};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use super::file_operations::ensure_private_dir;
use crate::error::SignerError;
use crate::nvl::{ProtocolPolicy, ReferenceMode};

pub const DEFAULT_NVL_BASE_URL: &str = "https://nvl.api.coiin.ai";
const DEFAULT_HTTP_TIMEOUT_MS: u64 = 30_000;

/// Command line of the independent signer. Every option can also come from
/// the environment or a `.env` file.
#[derive(Parser, Debug)]
#[command(
    name = "independent-signer",
    version,
    about = "Verifies the latest NVL block and publishes an independently signed attestation of it"
)]
pub struct Args {
    /// Base URL of the NVL authority
    #[arg(long = "nvlBaseURL", env = "NVL_BASE_URL", default_value = DEFAULT_NVL_BASE_URL)]
    pub nvl_base_url: String,

    /// Directory holding the signing key and chain state
    #[arg(long = "data-dir", env = "NVL_SIGNER_DATA_DIR", value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Timeout for each HTTP request to the authority
    #[arg(
        long = "http-timeout-ms",
        env = "NVL_HTTP_TIMEOUT_MS",
        default_value_t = DEFAULT_HTTP_TIMEOUT_MS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub http_timeout_ms: u64,

    /// What the independent block references: proof-hash or raw-json
    #[arg(long = "reference-mode", env = "NVL_REFERENCE_MODE", default_value_t = ReferenceMode::ProofHash)]
    pub reference_mode: ReferenceMode,

    /// Leave coiinSupply out of the independent block header
    #[arg(long = "no-coiin-supply", env = "NVL_NO_COIIN_SUPPLY")]
    pub no_coiin_supply: bool,

    /// Print the signer's public key (creating the key if needed) and exit
    #[arg(long = "print-public-key")]
    pub print_public_key: bool,
}

/// Rewrites single-dash long options (`-nvlBaseURL x`, `-nvlBaseURL=x`) to the
/// double-dash form clap expects. Short options and positional values are kept.
pub fn normalize_go_style_flags<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let command = Args::command();
    let long_names: Vec<&str> = command
        .get_arguments()
        .filter_map(|arg| arg.get_long())
        .chain(["help", "version"])
        .collect();

    let mut options_ended = false;
    args.into_iter()
        .enumerate()
        .map(|(index, arg)| {
            if index == 0 || options_ended {
                return arg;
            }
            let Some(text) = arg.to_str() else {
                return arg;
            };
            if text == "--" {
                options_ended = true;
                return arg;
            }
            match text.strip_prefix('-') {
                Some(rest) if !rest.starts_with('-') => {
                    let name = rest.split_once('=').map_or(rest, |(name, _)| name);
                    if name.len() > 1 && long_names.contains(&name) {
                        OsString::from(format!("-{text}"))
                    } else {
                        arg
                    }
                }
                _ => arg,
            }
        })
        .collect()
}

pub struct Config {
    pub nvl_base_url: String,
    pub data_dir: PathBuf,
    pub http_timeout: Duration,
    pub policy: ProtocolPolicy,
    pub print_public_key: bool,
}

impl Config {
    pub fn from_args(args: Args) -> Result<Self, SignerError> {
        let data_dir = match args.data_dir {
            Some(dir) => dir,
            None => default_data_dir()?,
        };

        let config = Self {
            nvl_base_url: args.nvl_base_url.trim_end_matches('/').to_string(),
            data_dir,
            http_timeout: Duration::from_millis(args.http_timeout_ms),
            policy: ProtocolPolicy {
                reference_mode: args.reference_mode,
                carry_coiin_supply: !args.no_coiin_supply,
            },
            print_public_key: args.print_public_key,
        };

        info!(
            r#"
Configuration:
NVL base URL: {},
Data directory: {},
HTTP timeout: {}ms,
Reference mode: {},
Carry coiinSupply: {}
"#,
            config.nvl_base_url,
            config.data_dir.display(),
            config.http_timeout.as_millis(),
            config.policy.reference_mode,
            config.policy.carry_coiin_supply,
        );

        Ok(config)
    }

    pub fn prepare_data_dir(&self) -> Result<(), SignerError> {
        ensure_private_dir(&self.data_dir).map_err(|e| {
            SignerError::Config(format!(
                "Failed to create data directory {}: {e}",
                self.data_dir.display()
            ))
        })?;
        if !self.data_dir.is_dir() {
            return Err(SignerError::Config(format!(
                "Data directory {} is not a directory",
                self.data_dir.display()
            )));
        }
        Ok(())
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

/// `<user config dir>/coiin/nvl/independent-signer`, or the current directory
/// when the platform has no config dir.
pub fn default_data_dir() -> Result<PathBuf, SignerError> {
    if let Some(base_dirs) = directories::BaseDirs::new() {
        return Ok(base_dirs
            .config_dir()
            .join("coiin")
            .join("nvl")
            .join("independent-signer"));
    }

    warn!("No user config directory found, using the current directory");
    std::env::current_dir().map_err(|e| {
        SignerError::Config(format!("Failed to resolve the current directory: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn os_args(args: &[&str]) -> Vec<OsString> {
        args.iter().map(OsString::from).collect()
    }

    #[test]
    fn test_normalize_go_style_flags() {
        let normalized = normalize_go_style_flags(os_args(&[
            "independent-signer",
            "-nvlBaseURL",
            "http://localhost:8080",
            "-data-dir=/tmp/nvl",
            "--print-public-key",
            "-h",
            "-unknown",
        ]));
        assert_eq!(
            normalized,
            os_args(&[
                "independent-signer",
                "--nvlBaseURL",
                "http://localhost:8080",
                "--data-dir=/tmp/nvl",
                "--print-public-key",
                "-h",
                "-unknown",
            ])
        );
    }

    #[test]
    fn test_normalize_stops_at_double_dash() {
        let normalized =
            normalize_go_style_flags(os_args(&["independent-signer", "--", "-nvlBaseURL"]));
        assert_eq!(
            normalized,
            os_args(&["independent-signer", "--", "-nvlBaseURL"])
        );
    }

    #[test]
    fn test_go_style_command_line_parses() {
        let args = Args::try_parse_from(normalize_go_style_flags(os_args(&[
            "independent-signer",
            "-nvlBaseURL=http://localhost:8080/",
            "-reference-mode",
            "raw-json",
            "-no-coiin-supply",
            "-http-timeout-ms",
            "1500",
            "-data-dir",
            "/tmp/nvl",
        ])))
        .unwrap();

        let config = Config::from_args(args).unwrap();
        assert_eq!(config.nvl_base_url, "http://localhost:8080");
        assert_eq!(config.data_dir(), Path::new("/tmp/nvl"));
        assert_eq!(config.http_timeout, Duration::from_millis(1500));
        assert_eq!(config.policy.reference_mode, ReferenceMode::RawJson);
        assert!(!config.policy.carry_coiin_supply);
        assert!(!config.print_public_key);
    }

    #[test]
    fn test_invalid_options_are_rejected() {
        assert!(Args::try_parse_from(["independent-signer", "--http-timeout-ms", "0"]).is_err());
        assert!(
            Args::try_parse_from(["independent-signer", "--reference-mode", "both"]).is_err()
        );
    }

    #[test]
    fn test_default_data_dir_layout() {
        let dir = default_data_dir().unwrap();
        if directories::BaseDirs::new().is_some() {
            assert!(dir.ends_with("coiin/nvl/independent-signer"));
        }
    }

    #[test]
    fn test_prepare_data_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let args = Args::try_parse_from([
            "independent-signer",
            "--data-dir",
            tmp.path().join("nested").join("signer").to_str().unwrap(),
        ])
        .unwrap();
        let config = Config::from_args(args).unwrap();
        config.prepare_data_dir().unwrap();
        assert!(config.data_dir().is_dir());

        let file = tmp.path().join("file");
        std::fs::write(&file, "x").unwrap();
        let args = Args::try_parse_from(["independent-signer", "--data-dir", file.to_str().unwrap()])
            .unwrap();
        assert!(matches!(
            Config::from_args(args).unwrap().prepare_data_dir(),
            Err(SignerError::Config(_))
        ));
    }
}
