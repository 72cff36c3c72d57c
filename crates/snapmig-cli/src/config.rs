use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use snapmig_client::{DEFAULT_PARALLEL_QUERIES, DEFAULT_UNSPENT_OUTPUTS_ROUTE};
use snapmig_ledger::DEFAULT_MIN_MIGRATION_AMOUNT;
use snapmig_types::TOTAL_SUPPLY;

use crate::cli::{FullArgs, GenesisArgs, RebindArgs};

pub const DEFAULT_NODE_URI: &str = "http://localhost:14265";

/// Optional defaults read from `--config`. Every key is optional; an
/// explicit command-line flag always wins.
///
/// ```toml
/// [genesis]
/// node = "http://legacy:14265"
/// network_id = "chrysalis-mainnet"
///
/// [full]
/// parallel_queries = 64
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SnapmigConfig {
    pub genesis: GenesisSection,
    pub full: FullSection,
    pub rebind: RebindSection,
    /// Legacy node used by `ledger-diff`; falls back to `genesis.node`.
    pub legacy_node: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenesisSection {
    pub node: Option<String>,
    pub min_migration_token_amount: Option<u64>,
    pub global_snapshot_file: Option<PathBuf>,
    pub genesis_snapshot_file: Option<PathBuf>,
    pub network_id: Option<String>,
    pub timestamp: Option<u64>,
    pub count_eligible_spent_addrs: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FullSection {
    pub node: Option<String>,
    pub outputs_debug_route: Option<String>,
    pub output_file: Option<PathBuf>,
    pub network_id: Option<String>,
    pub target_index: Option<u32>,
    pub parallel_queries: Option<usize>,
    pub total_supply: Option<u64>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RebindSection {
    pub source_file: Option<PathBuf>,
    pub target_file: Option<PathBuf>,
    pub network_id: Option<String>,
    pub total_supply: Option<u64>,
}

impl SnapmigConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("failed to parse config {}", path.display()))
    }

    /// Config from `path`, or the empty config when no file was given.
    pub fn load_optional(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn legacy_node(&self) -> String {
        self.legacy_node
            .clone()
            .or_else(|| self.genesis.node.clone())
            .unwrap_or_else(|| DEFAULT_NODE_URI.to_string())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenesisSettings {
    pub node: String,
    pub min_migration_token_amount: u64,
    pub global_snapshot_file: PathBuf,
    pub genesis_snapshot_file: PathBuf,
    pub network_id: String,
    pub timestamp: u64,
    pub count_eligible_spent_addrs: bool,
    pub ledger_dump: Option<PathBuf>,
}

impl GenesisSettings {
    pub fn resolve(args: GenesisArgs, config: &GenesisSection) -> Self {
        let config = config.clone();
        Self {
            node: args.node.or(config.node).unwrap_or_else(|| DEFAULT_NODE_URI.into()),
            min_migration_token_amount: args
                .min_migration_token_amount
                .or(config.min_migration_token_amount)
                .unwrap_or(DEFAULT_MIN_MIGRATION_AMOUNT),
            global_snapshot_file: args
                .global_snapshot_file
                .or(config.global_snapshot_file)
                .unwrap_or_else(|| "global_snapshot.csv".into()),
            genesis_snapshot_file: args
                .genesis_snapshot_file
                .or(config.genesis_snapshot_file)
                .unwrap_or_else(|| "genesis_snapshot.bin".into()),
            network_id: args.network_id.or(config.network_id).unwrap_or_else(|| "mainnet1".into()),
            timestamp: args.timestamp.or(config.timestamp).unwrap_or(0),
            count_eligible_spent_addrs: args.count_eligible_spent_addrs
                || config.count_eligible_spent_addrs.unwrap_or(false),
            ledger_dump: args.ledger_dump,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FullSettings {
    pub node: String,
    pub outputs_debug_route: String,
    pub output_file: PathBuf,
    pub network_id: String,
    pub target_index: u32,
    pub parallel_queries: usize,
    pub total_supply: u64,
}

impl FullSettings {
    pub fn resolve(args: FullArgs, config: &FullSection) -> Self {
        let config = config.clone();
        Self {
            node: args.node.or(config.node).unwrap_or_else(|| DEFAULT_NODE_URI.into()),
            outputs_debug_route: args
                .outputs_debug_route
                .or(config.outputs_debug_route)
                .unwrap_or_else(|| DEFAULT_UNSPENT_OUTPUTS_ROUTE.into()),
            output_file: args
                .output_file
                .or(config.output_file)
                .unwrap_or_else(|| "full_snapshot.bin".into()),
            network_id: args.network_id.or(config.network_id).unwrap_or_else(|| "testnet".into()),
            target_index: args.target_index.or(config.target_index).unwrap_or(0),
            parallel_queries: args
                .parallel_queries
                .or(config.parallel_queries)
                .unwrap_or(DEFAULT_PARALLEL_QUERIES),
            total_supply: args.total_supply.or(config.total_supply).unwrap_or(TOTAL_SUPPLY),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RebindSettings {
    pub source_file: PathBuf,
    pub target_file: PathBuf,
    pub network_id: String,
    pub total_supply: u64,
}

impl RebindSettings {
    pub fn resolve(args: RebindArgs, config: &RebindSection) -> Self {
        let config = config.clone();
        Self {
            source_file: args
                .source_file
                .or(config.source_file)
                .unwrap_or_else(|| "genesis_snapshot_alt.bin".into()),
            target_file: args
                .target_file
                .or(config.target_file)
                .unwrap_or_else(|| "mod_genesis_snapshot_alt.bin".into()),
            network_id: args.network_id.or(config.network_id).unwrap_or_else(|| "as-network".into()),
            total_supply: args.total_supply.or(config.total_supply).unwrap_or(TOTAL_SUPPLY),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn builtin_defaults() {
        let settings = GenesisSettings::resolve(GenesisArgs::default(), &GenesisSection::default());
        assert_eq!(settings.node, DEFAULT_NODE_URI);
        assert_eq!(settings.min_migration_token_amount, 1_000_000);
        assert_eq!(settings.global_snapshot_file, PathBuf::from("global_snapshot.csv"));
        assert_eq!(settings.genesis_snapshot_file, PathBuf::from("genesis_snapshot.bin"));
        assert_eq!(settings.network_id, "mainnet1");
        assert_eq!(settings.timestamp, 0);
        assert!(!settings.count_eligible_spent_addrs);

        let full = FullSettings::resolve(FullArgs::default(), &FullSection::default());
        assert_eq!(full.output_file, PathBuf::from("full_snapshot.bin"));
        assert_eq!(full.network_id, "testnet");
        assert_eq!(full.parallel_queries, 200);
        assert_eq!(full.outputs_debug_route, "/api/plugins/debug/outputs/unspent");

        let rebind = RebindSettings::resolve(RebindArgs::default(), &RebindSection::default());
        assert_eq!(rebind.source_file, PathBuf::from("genesis_snapshot_alt.bin"));
        assert_eq!(rebind.target_file, PathBuf::from("mod_genesis_snapshot_alt.bin"));
        assert_eq!(rebind.network_id, "as-network");
    }

    #[test]
    fn flags_override_config() {
        let config: SnapmigConfig = toml::from_str(
            r#"
            [genesis]
            node = "http://from-config:14265"
            network_id = "config-net"
            count_eligible_spent_addrs = true
            "#,
        )
        .unwrap();
        let args = GenesisArgs {
            network_id: Some("flag-net".into()),
            ..GenesisArgs::default()
        };
        let settings = GenesisSettings::resolve(args, &config.genesis);
        assert_eq!(settings.node, "http://from-config:14265");
        assert_eq!(settings.network_id, "flag-net");
        assert!(settings.count_eligible_spent_addrs);
    }

    #[test]
    fn legacy_node_fallbacks() {
        assert_eq!(SnapmigConfig::default().legacy_node(), DEFAULT_NODE_URI);
        let config: SnapmigConfig = toml::from_str("[genesis]\nnode = \"http://g\"").unwrap();
        assert_eq!(config.legacy_node(), "http://g");
        let config: SnapmigConfig = toml::from_str("legacy_node = \"http://l\"\n[genesis]\nnode = \"http://g\"").unwrap();
        assert_eq!(config.legacy_node(), "http://l");
    }

    #[test]
    fn unknown_keys_rejected() {
        assert!(toml::from_str::<SnapmigConfig>("[full]\nparalel_queries = 3").is_err());
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[full]\nparallel_queries = 8\ntarget_index = 9").unwrap();
        let config = SnapmigConfig::load_optional(Some(file.path())).unwrap();
        let full = FullSettings::resolve(FullArgs::default(), &config.full);
        assert_eq!(full.parallel_queries, 8);
        assert_eq!(full.target_index, 9);
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = SnapmigConfig::load(Path::new("/nonexistent/snapmig.toml")).unwrap_err();
        assert!(format!("{err:#}").contains("failed to read config"));
    }
}
