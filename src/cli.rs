//! CLI (CommandLine Interface) for the PrivMail search engine party process.
//!
//! `--configuration-file` supplies defaults; anything given directly on the
//! command line overrides the file. Parses into `ConfigFile` via
//! `serde_yaml`, with `deny_unknown_fields` to catch typos.

use crate::error::EngineError;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

/// One entry of `--parties id,ip,port`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PartySpec {
    pub id: usize,
    pub addr: SocketAddr,
}

impl FromStr for PartySpec {
    type Err = EngineError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let malformed = || EngineError::MalformedShareFile {
            path: "--parties".to_string(),
            reason: format!("'{s}' does not match id,ip,port"),
        };

        let mut parts = s.split(',');
        let id: usize = parts.next().and_then(|p| p.parse().ok()).ok_or_else(malformed)?;
        let ip: IpAddr = parts.next().and_then(|p| p.parse().ok()).ok_or_else(malformed)?;
        let port: u16 = parts.next().and_then(|p| p.parse().ok()).ok_or_else(malformed)?;
        if parts.next().is_some() {
            return Err(malformed());
        }

        Ok(PartySpec {
            id,
            addr: SocketAddr::new(ip, port),
        })
    }
}

/// `--search-mode`: which circuit shape to build.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    Normal,
    Hidden,
    Bucket,
    Index,
}

impl std::fmt::Display for SearchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SearchMode::Normal => "normal",
            SearchMode::Hidden => "hidden",
            SearchMode::Bucket => "bucket",
            SearchMode::Index => "index",
        };
        write!(f, "{s}")
    }
}

/// File-backed defaults for every long flag name. Unknown keys are a loader
/// error, matching the same defensive policy used for the other structured
/// files.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct ConfigFile {
    pub my_id: Option<usize>,
    pub parties: Option<Vec<String>>,
    pub search_mode: Option<SearchMode>,
    pub query_file_path: Option<PathBuf>,
    pub mail_dir_path: Option<PathBuf>,
    pub index_file_path: Option<PathBuf>,
    pub json_path: Option<PathBuf>,
    pub disable_logging: Option<bool>,
    pub print_configuration: Option<bool>,
}

/// Arguments for one PrivMail party process. This struct implements
/// [`clap::Parser`].
#[derive(Parser, Debug)]
#[command(version, about, long_about = None, next_line_help = true)]
pub struct Args {
    /// Id of this party, `0 <= my_id < parties.len()`.
    #[arg(long)]
    pub my_id: Option<usize>,

    /// One `id,ip,port` entry per party, including this one. Repeatable.
    #[arg(long = "parties")]
    pub parties: Vec<String>,

    /// Which circuit mode to build.
    #[arg(long = "search-mode", value_enum)]
    pub search_mode: Option<SearchMode>,

    /// Path to this party's query share file.
    #[arg(long = "query-file-path")]
    pub query_file_path: Option<PathBuf>,

    /// Path to this party's mail share directory. Required unless
    /// `--search-mode index`.
    #[arg(long = "mail-dir-path")]
    pub mail_dir_path: Option<PathBuf>,

    /// Path to this party's index share file. Required when
    /// `--search-mode index`.
    #[arg(long = "index-file-path")]
    pub index_file_path: Option<PathBuf>,

    /// Where to write the JSON statistics report. Without this, a
    /// human-readable block is printed to stdout.
    #[arg(long = "json-path")]
    pub json_path: Option<PathBuf>,

    /// YAML file of defaults for the other long flags; CLI flags override it.
    #[arg(long = "configuration-file")]
    pub configuration_file: Option<PathBuf>,

    /// Suppress tracing output.
    #[arg(long = "disable-logging", default_value_t = false)]
    pub disable_logging: bool,

    /// Print the fully-resolved configuration (after merging the
    /// configuration file) and exit.
    #[arg(long = "print-configuration", default_value_t = false)]
    pub print_configuration: bool,
}

/// Fully resolved, validated configuration for one run.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub my_id: usize,
    pub parties: Vec<PartySpec>,
    pub search_mode: SearchMode,
    pub query_file_path: PathBuf,
    pub mail_dir_path: Option<PathBuf>,
    pub index_file_path: Option<PathBuf>,
    pub json_path: Option<PathBuf>,
    pub disable_logging: bool,
}

impl Args {
    /// Merge `--configuration-file` defaults underneath the CLI flags the
    /// user actually typed (CLI wins) and validate everything required
    /// before any party communication happens.
    pub fn resolve(self) -> Result<ResolvedConfig> {
        let file: ConfigFile = match &self.configuration_file {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading configuration file {}", path.display()))?;
                serde_yaml::from_str(&text)
                    .with_context(|| format!("parsing configuration file {}", path.display()))?
            }
            None => ConfigFile::default(),
        };

        let my_id = self
            .my_id
            .or(file.my_id)
            .context("--my-id is required (directly or via --configuration-file)")?;

        let raw_parties = if !self.parties.is_empty() {
            self.parties
        } else {
            file.parties.unwrap_or_default()
        };
        if raw_parties.is_empty() {
            anyhow::bail!("--parties is required (directly or via --configuration-file)");
        }
        let parties = raw_parties
            .iter()
            .map(|s| PartySpec::from_str(s).map_err(anyhow::Error::from))
            .collect::<Result<Vec<_>>>()?;
        if my_id >= parties.len() {
            anyhow::bail!(
                "--my-id {} out of range for {} parties",
                my_id,
                parties.len()
            );
        }

        let search_mode = self.search_mode.or(file.search_mode).unwrap_or(SearchMode::Normal);

        let query_file_path = self
            .query_file_path
            .or(file.query_file_path)
            .context("--query-file-path is required")?;

        let mail_dir_path = self.mail_dir_path.or(file.mail_dir_path);
        let index_file_path = self.index_file_path.or(file.index_file_path);

        if search_mode == SearchMode::Index {
            if index_file_path.is_none() {
                anyhow::bail!("--index-file-path is required for --search-mode index");
            }
        } else if mail_dir_path.is_none() {
            anyhow::bail!("--mail-dir-path is required unless --search-mode index");
        }

        let json_path = self.json_path.or(file.json_path);
        let disable_logging = self.disable_logging || file.disable_logging.unwrap_or(false);

        Ok(ResolvedConfig {
            my_id,
            parties,
            search_mode,
            query_file_path,
            mail_dir_path,
            index_file_path,
            json_path,
            disable_logging,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn party_spec_parses() {
        let p: PartySpec = "1,127.0.0.1,9001".parse().unwrap();
        assert_eq!(p.id, 1);
        assert_eq!(p.addr, "127.0.0.1:9001".parse().unwrap());
    }

    #[test]
    fn party_spec_rejects_malformed() {
        assert!("not,a,party".parse::<PartySpec>().is_err());
        assert!("1,127.0.0.1".parse::<PartySpec>().is_err());
    }
}
