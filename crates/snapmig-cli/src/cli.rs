use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "snapmig",
    about = "Ledger-snapshot migration engine",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// TOML file with defaults for subcommand options
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Build the target network genesis snapshot from a legacy ledger
    Genesis(GenesisArgs),
    /// Dump the live ledger of a target network node as a full snapshot
    Full(FullArgs),
    /// Rebind the output ids of a genesis snapshot to another network
    Rebind(RebindArgs),
    /// Print header, counts and supply of a snapshot file
    Inspect(InspectArgs),
    /// Compute the Merkle root of hex-encoded items, one per line
    MerkleRoot(MerkleRootArgs),
    /// Show the ledger diff of a legacy milestone
    LedgerDiff(LedgerDiffArgs),
}

// Options left unset fall back to the config file, then to built-in
// defaults; see `config::Settings`.

#[derive(Args, Default)]
pub struct GenesisArgs {
    /// Legacy node command endpoint
    #[arg(long)]
    pub node: Option<String>,
    /// Minimum balance an eligible legacy address must hold
    #[arg(long)]
    pub min_migration_token_amount: Option<u64>,
    /// Where to write the global ledger dump
    #[arg(long)]
    pub global_snapshot_file: Option<PathBuf>,
    /// Where to write the genesis snapshot
    #[arg(long)]
    pub genesis_snapshot_file: Option<PathBuf>,
    #[arg(long = "genesis-snapshot-file-network-id", alias = "network-id")]
    pub network_id: Option<String>,
    #[arg(long = "genesis-snapshot-file-timestamp", alias = "timestamp")]
    pub timestamp: Option<u64>,
    /// Count eligible addresses that were already spent from
    #[arg(long)]
    pub count_eligible_spent_addrs: bool,
    /// Read the ledger from a global dump instead of a legacy node
    #[arg(long)]
    pub ledger_dump: Option<PathBuf>,
}

#[derive(Args, Default)]
pub struct FullArgs {
    /// Target network node REST endpoint
    #[arg(long)]
    pub node: Option<String>,
    #[arg(long)]
    pub outputs_debug_route: Option<String>,
    #[arg(long)]
    pub output_file: Option<PathBuf>,
    #[arg(long)]
    pub network_id: Option<String>,
    /// Ledger index written into the header
    #[arg(long)]
    pub target_index: Option<u32>,
    /// Outputs fetched concurrently
    #[arg(long)]
    pub parallel_queries: Option<usize>,
    /// Supply the snapshot must account for
    #[arg(long)]
    pub total_supply: Option<u64>,
}

#[derive(Args, Default)]
pub struct RebindArgs {
    #[arg(long)]
    pub source_file: Option<PathBuf>,
    #[arg(long)]
    pub target_file: Option<PathBuf>,
    #[arg(long)]
    pub network_id: Option<String>,
    #[arg(long)]
    pub total_supply: Option<u64>,
}

#[derive(Args)]
pub struct InspectArgs {
    pub path: PathBuf,
    /// Supply a full snapshot is checked against
    #[arg(long)]
    pub total_supply: Option<u64>,
}

#[derive(Args)]
pub struct MerkleRootArgs {
    /// File with one hex item per line; stdin when absent
    pub input: Option<PathBuf>,
    /// Also print the inclusion proof of the item at this position
    #[arg(long)]
    pub proof: Option<usize>,
}

#[derive(Args)]
pub struct LedgerDiffArgs {
    pub milestone_index: u32,
    #[arg(long)]
    pub node: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_genesis() {
        let cli = Cli::try_parse_from(["snapmig", "genesis"]).unwrap();
        assert!(matches!(cli.command, Command::Genesis(_)));
        assert!(!cli.verbose);
        assert!(cli.config.is_none());
    }

    #[test]
    fn parse_genesis_options() {
        let cli = Cli::try_parse_from([
            "snapmig",
            "genesis",
            "--node",
            "http://legacy:14265",
            "--min-migration-token-amount",
            "5",
            "--genesis-snapshot-file-network-id",
            "chrysalis-mainnet",
            "--genesis-snapshot-file-timestamp",
            "1617000000",
            "--count-eligible-spent-addrs",
        ])
        .unwrap();
        if let Command::Genesis(args) = cli.command {
            assert_eq!(args.node.as_deref(), Some("http://legacy:14265"));
            assert_eq!(args.min_migration_token_amount, Some(5));
            assert_eq!(args.network_id.as_deref(), Some("chrysalis-mainnet"));
            assert_eq!(args.timestamp, Some(1_617_000_000));
            assert!(args.count_eligible_spent_addrs);
            assert!(args.ledger_dump.is_none());
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_genesis_short_aliases() {
        let cli = Cli::try_parse_from(["snapmig", "genesis", "--network-id", "x", "--timestamp", "3"]).unwrap();
        if let Command::Genesis(args) = cli.command {
            assert_eq!(args.network_id.as_deref(), Some("x"));
            assert_eq!(args.timestamp, Some(3));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_full() {
        let cli = Cli::try_parse_from([
            "snapmig", "full", "--target-index", "42", "--parallel-queries", "16",
        ])
        .unwrap();
        if let Command::Full(args) = cli.command {
            assert_eq!(args.target_index, Some(42));
            assert_eq!(args.parallel_queries, Some(16));
            assert!(args.output_file.is_none());
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_rebind() {
        let cli = Cli::try_parse_from([
            "snapmig", "rebind", "--source-file", "a.bin", "--target-file", "b.bin",
        ])
        .unwrap();
        if let Command::Rebind(args) = cli.command {
            assert_eq!(args.source_file, Some(PathBuf::from("a.bin")));
            assert_eq!(args.target_file, Some(PathBuf::from("b.bin")));
            assert!(args.network_id.is_none());
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_inspect_json() {
        let cli = Cli::try_parse_from(["snapmig", "inspect", "full_snapshot.bin", "--format", "json"]).unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        if let Command::Inspect(args) = cli.command {
            assert_eq!(args.path, PathBuf::from("full_snapshot.bin"));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_merkle_root() {
        let cli = Cli::try_parse_from(["snapmig", "merkle-root", "ids.txt", "--proof", "2"]).unwrap();
        if let Command::MerkleRoot(args) = cli.command {
            assert_eq!(args.input, Some(PathBuf::from("ids.txt")));
            assert_eq!(args.proof, Some(2));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_ledger_diff() {
        let cli = Cli::try_parse_from(["snapmig", "-v", "ledger-diff", "7"]).unwrap();
        assert!(cli.verbose);
        if let Command::LedgerDiff(args) = cli.command {
            assert_eq!(args.milestone_index, 7);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn global_config_after_subcommand() {
        let cli = Cli::try_parse_from(["snapmig", "full", "--config", "snapmig.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("snapmig.toml")));
    }

    #[test]
    fn missing_subcommand_fails() {
        assert!(Cli::try_parse_from(["snapmig"]).is_err());
    }
}
