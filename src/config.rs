use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

use crate::cli::CliArgs;
use crate::widgets::{DEFAULT_CHAR_LIMIT, DEFAULT_TABLE_HEIGHT};

const DEFAULT_TICK_MS: u64 = 100;
const DEFAULT_LOG_FILTER: &str = "info";

/// Effective settings: CLI flags over the config file over defaults.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Settings {
    /// Config file the values came from, if any.
    pub source: Option<PathBuf>,
    pub catalog: Option<PathBuf>,
    pub workspace: Option<String>,
    pub tick_ms: u64,
    pub table_height: usize,
    pub search_char_limit: usize,
    pub log_filter: String,
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct DeckhandConfigFile {
    #[serde(default)]
    catalog: Option<PathBuf>,
    #[serde(default)]
    workspace: Option<String>,
    #[serde(default, alias = "tick")]
    tick_ms: Option<u64>,
    #[serde(default, alias = "height")]
    table_height: Option<usize>,
    #[serde(default, alias = "char_limit")]
    search_char_limit: Option<usize>,
    #[serde(default, alias = "log")]
    log_filter: Option<String>,
    #[serde(default)]
    log_file: Option<PathBuf>,
}

impl Settings {
    pub fn load(args: &CliArgs) -> Result<Self> {
        let (source, file) = match discover_config_path() {
            Some(path) => {
                let raw = fs::read_to_string(&path)
                    .with_context(|| format!("failed to read config {}", path.display()))?;
                let parsed: DeckhandConfigFile = serde_yaml::from_str(&raw)
                    .with_context(|| format!("failed to parse config {}", path.display()))?;
                (Some(path), parsed)
            }
            None => (None, DeckhandConfigFile::default()),
        };
        let env_catalog = std::env::var("DECKHAND_CATALOG")
            .ok()
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        merge(args, source, file, env_catalog)
    }
}

fn merge(
    args: &CliArgs,
    source: Option<PathBuf>,
    file: DeckhandConfigFile,
    env_catalog: Option<PathBuf>,
) -> Result<Settings> {
    let settings = Settings {
        source,
        catalog: args.catalog.clone().or(env_catalog).or(file.catalog),
        workspace: args.workspace.clone().or(file.workspace),
        tick_ms: args.tick_ms.or(file.tick_ms).unwrap_or(DEFAULT_TICK_MS),
        table_height: args
            .table_height
            .or(file.table_height)
            .unwrap_or(DEFAULT_TABLE_HEIGHT),
        search_char_limit: file.search_char_limit.unwrap_or(DEFAULT_CHAR_LIMIT),
        log_filter: args
            .log_filter
            .clone()
            .or(file.log_filter)
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        log_file: args.log_file.clone().or(file.log_file),
    };

    if settings.tick_ms == 0 {
        bail!("tick interval must be positive");
    }
    if settings.table_height == 0 {
        bail!("table height must be positive");
    }
    Ok(settings)
}

fn discover_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("DECKHAND_CONFIG")
        && !path.trim().is_empty()
    {
        return Some(PathBuf::from(path));
    }

    let cwd_candidates = [
        PathBuf::from("deckhand.yaml"),
        PathBuf::from("deckhand.yml"),
        PathBuf::from(".deckhand.yaml"),
    ];
    for candidate in cwd_candidates {
        if candidate.exists() {
            return Some(candidate);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let user_candidates = [
            PathBuf::from(&home).join(".config/deckhand/config.yaml"),
            PathBuf::from(&home).join(".config/deckhand/config.yml"),
        ];
        for candidate in user_candidates {
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::{DeckhandConfigFile, merge};
    use crate::cli::CliArgs;
    use clap::Parser;
    use std::path::PathBuf;

    fn file(raw: &str) -> DeckhandConfigFile {
        serde_yaml::from_str(raw).expect("config parses")
    }

    #[test]
    fn defaults_apply_without_file_or_flags() {
        let args = CliArgs::parse_from(["deckhand"]);
        let settings = merge(&args, None, DeckhandConfigFile::default(), None).expect("settings");
        assert_eq!(settings.tick_ms, 100);
        assert_eq!(settings.table_height, 10);
        assert_eq!(settings.search_char_limit, 156);
        assert_eq!(settings.log_filter, "info");
        assert!(settings.catalog.is_none());
    }

    #[test]
    fn cli_flags_win_over_file_values() {
        let args = CliArgs::parse_from(["deckhand", "--tick-ms", "40", "--catalog", "cli.yaml"]);
        let parsed = file("catalog: file.yaml\ntick: 250\nheight: 20\nlog: debug\n");
        let settings = merge(
            &args,
            Some(PathBuf::from("deckhand.yaml")),
            parsed,
            Some(PathBuf::from("env.yaml")),
        )
        .expect("settings");

        assert_eq!(settings.tick_ms, 40);
        assert_eq!(settings.table_height, 20);
        assert_eq!(settings.log_filter, "debug");
        assert_eq!(settings.catalog, Some(PathBuf::from("cli.yaml")));
        assert_eq!(settings.source, Some(PathBuf::from("deckhand.yaml")));
    }

    #[test]
    fn catalog_env_var_beats_file() {
        let args = CliArgs::parse_from(["deckhand"]);
        let settings = merge(
            &args,
            None,
            file("catalog: file.yaml\n"),
            Some(PathBuf::from("env.yaml")),
        )
        .expect("settings");
        assert_eq!(settings.catalog, Some(PathBuf::from("env.yaml")));
    }

    #[test]
    fn zero_values_are_rejected() {
        let args = CliArgs::parse_from(["deckhand", "--table-height", "0"]);
        let error = merge(&args, None, DeckhandConfigFile::default(), None)
            .err()
            .expect("rejected");
        assert_eq!(error.to_string(), "table height must be positive");
    }
}
