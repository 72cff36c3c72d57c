use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use anyhow::{bail, Context, Result};
use colored::Colorize;
use serde_json::json;
use snapmig_client::{gather_outputs, LegacyClient, NodeClient};
use snapmig_crypto::MerkleHasher;
use snapmig_ledger::{
    classify, classify_with_spent_check, fetch_ledger, integrity_digest_hex, read_global_dump,
    write_global_dump_file, GenesisBuilder, Ledger,
};
use snapmig_snapshot::{
    read_snapshot, rebind_output_id, transform_snapshot_file, write_snapshot_file, SnapshotError,
    SnapshotHeader, SnapshotKind, SnapshotStats, WriterOptions,
};
use snapmig_types::{network_id_from_str, MessageId, TOTAL_SUPPLY};
use tracing::{info, warn};

use crate::cli::*;
use crate::config::{FullSettings, GenesisSettings, RebindSettings, SnapmigConfig};

pub async fn run_command(cli: Cli) -> Result<()> {
    let config = SnapmigConfig::load_optional(cli.config.as_deref())?;
    let format = cli.format;
    match cli.command {
        Command::Genesis(args) => cmd_genesis(GenesisSettings::resolve(args, &config.genesis), &format).await,
        Command::Full(args) => cmd_full(FullSettings::resolve(args, &config.full), &format).await,
        Command::Rebind(args) => cmd_rebind(RebindSettings::resolve(args, &config.rebind), &format),
        Command::Inspect(args) => cmd_inspect(args, &format),
        Command::MerkleRoot(args) => cmd_merkle_root(args, &format),
        Command::LedgerDiff(args) => {
            let node = args.node.clone().unwrap_or_else(|| config.legacy_node());
            cmd_ledger_diff(args, &node, &format).await
        }
    }
}

async fn cmd_genesis(settings: GenesisSettings, format: &OutputFormat) -> Result<()> {
    let legacy = LegacyClient::new(&settings.node)?;
    let ledger = match &settings.ledger_dump {
        Some(path) => load_ledger_dump(path)?,
        None => fetch_synced_ledger(&legacy, &settings.global_snapshot_file).await?,
    };
    ledger.check_total_supply()?;
    let digest = integrity_digest_hex(ledger.entries());
    info!(ledger_index = ledger.index(), entries = ledger.len(), digest = %digest, "ledger loaded");

    let (records, summary) = if settings.count_eligible_spent_addrs {
        classify_with_spent_check(ledger.entries(), settings.min_migration_token_amount, &legacy).await?
    } else {
        classify(ledger.entries(), settings.min_migration_token_amount)?
    };

    let written = GenesisBuilder::new(network_id_from_str(&settings.network_id))
        .timestamp(settings.timestamp)
        .write_file(&settings.genesis_snapshot_file, &records)
        .with_context(|| format!("failed to write {}", settings.genesis_snapshot_file.display()))?;

    match format {
        OutputFormat::Json => print_json(&json!({
            "ledger_index": ledger.index(),
            "entries": ledger.len(),
            "integrity_digest": digest,
            "eligibility": summary,
            "snapshot": written,
            "path": settings.genesis_snapshot_file,
        }))?,
        OutputFormat::Text => {
            println!("Ledger at milestone {}: {} entries", ledger.index().to_string().bold(), ledger.len());
            println!("  integrity: {}", digest.cyan());
            println!(
                "  migration addresses: {} holding {}",
                summary.migration_count.to_string().bold(),
                summary.migrated_total
            );
            println!(
                "  eligible: {} holding {}, dust: {} holding {}",
                summary.eligible_count, summary.eligible_total, summary.dust_count, summary.dust_total
            );
            if let Some(spent) = summary.spent {
                println!(
                    "  eligible already spent from: {} ({} with invalid last trit)",
                    spent.spent.to_string().yellow(),
                    spent.invalid_last_trit
                );
            }
            println!(
                "{} Genesis snapshot written to {} ({} outputs, {} bytes)",
                "✓".green().bold(),
                settings.genesis_snapshot_file.display().to_string().bold(),
                written.outputs,
                written.bytes_written
            );
        }
    }
    Ok(())
}

fn load_ledger_dump(path: &Path) -> Result<Ledger> {
    let file = File::open(path).with_context(|| format!("failed to open ledger dump {}", path.display()))?;
    let ledger = read_global_dump(BufReader::new(file), 0)
        .with_context(|| format!("failed to read ledger dump {}", path.display()))?;
    info!(path = %path.display(), entries = ledger.len(), "ledger read from dump");
    Ok(ledger)
}

/// Fetch the ledger at the latest solid milestone and persist its dump.
async fn fetch_synced_ledger(legacy: &LegacyClient, dump_path: &Path) -> Result<Ledger> {
    let info = legacy
        .node_info()
        .await
        .with_context(|| format!("failed to query legacy node {}", legacy.uri()))?;
    if !info.is_synced() {
        bail!(
            "legacy node is not synced: latest milestone {} but latest solid milestone {}",
            info.latest_milestone_index,
            info.latest_solid_subtangle_milestone_index
        );
    }
    let ledger = fetch_ledger(legacy, info.latest_solid_subtangle_milestone_index).await?;
    let lines = write_global_dump_file(dump_path, ledger.entries())
        .with_context(|| format!("failed to write {}", dump_path.display()))?;
    info!(path = %dump_path.display(), lines, "global ledger dump written");
    Ok(ledger)
}

async fn cmd_full(settings: FullSettings, format: &OutputFormat) -> Result<()> {
    let node = NodeClient::new(&settings.node)?;
    let info = node
        .info()
        .await
        .with_context(|| format!("failed to query node {}", settings.node))?;
    if info.confirmed_milestone_index != settings.target_index {
        warn!(
            confirmed = info.confirmed_milestone_index,
            target_index = settings.target_index,
            "header index differs from the confirmed milestone of the node"
        );
    }

    let ids = node.unspent_output_ids(&settings.outputs_debug_route).await?;
    let outputs = gather_outputs(&node, &ids, settings.parallel_queries).await?;
    let treasury = node.treasury().await?.to_treasury_output()?;

    let timestamp = u64::try_from(chrono::Utc::now().timestamp()).context("system clock is before the unix epoch")?;
    let header = SnapshotHeader::full(
        network_id_from_str(&settings.network_id),
        settings.target_index,
        timestamp,
        treasury,
    );
    let written = write_snapshot_file(
        &settings.output_file,
        WriterOptions {
            total_supply: settings.total_supply,
        },
        &header,
        [Ok(MessageId::null())],
        outputs
            .iter()
            .map(|o| o.to_snapshot_output().map_err(|e| SnapshotError::Producer(e.to_string()))),
        std::iter::empty(),
    )
    .with_context(|| format!("failed to write {}", settings.output_file.display()))?;

    match format {
        OutputFormat::Json => print_json(&json!({
            "node_network": info.network_id,
            "snapshot": written,
            "path": settings.output_file,
        }))?,
        OutputFormat::Text => println!(
            "{} Full snapshot of {} written to {} ({} outputs, treasury {})",
            "✓".green().bold(),
            info.network_id.yellow(),
            settings.output_file.display().to_string().bold(),
            written.outputs,
            header.treasury.amount
        ),
    }
    Ok(())
}

fn cmd_rebind(settings: RebindSettings, format: &OutputFormat) -> Result<()> {
    let network_id = network_id_from_str(&settings.network_id);
    let written = transform_snapshot_file(
        &settings.source_file,
        &settings.target_file,
        WriterOptions {
            total_supply: settings.total_supply,
        },
        rebind_output_id(network_id),
    )
    .with_context(|| {
        format!(
            "failed to rebind {} to {}",
            settings.source_file.display(),
            settings.target_file.display()
        )
    })?;

    match format {
        OutputFormat::Json => print_json(&json!({
            "network_id": network_id,
            "snapshot": written,
            "path": settings.target_file,
        }))?,
        OutputFormat::Text => println!(
            "{} Rebound {} outputs to network {} ({}) in {}",
            "✓".green().bold(),
            written.outputs,
            settings.network_id.yellow(),
            network_id,
            settings.target_file.display().to_string().bold()
        ),
    }
    Ok(())
}

fn cmd_inspect(args: InspectArgs, format: &OutputFormat) -> Result<()> {
    let file = File::open(&args.path).with_context(|| format!("failed to open {}", args.path.display()))?;
    let stats = read_snapshot(BufReader::new(file), &mut ())
        .with_context(|| format!("failed to read snapshot {}", args.path.display()))?;
    let balanced = supply_balances(&stats, args.total_supply.unwrap_or(TOTAL_SUPPLY));

    match format {
        OutputFormat::Json => print_json(&json!({ "stats": stats, "supply_balanced": balanced }))?,
        OutputFormat::Text => {
            let header = &stats.header;
            println!("Snapshot {}", args.path.display().to_string().bold());
            println!("  version:      {}", header.version);
            println!("  kind:         {:?}", header.kind);
            println!("  network id:   {}", header.network_id);
            println!("  sep index:    {}", header.sep_index);
            println!("  ledger index: {}", header.ledger_index);
            println!("  timestamp:    {}", format_timestamp(header.timestamp));
            println!("  treasury:     {} (milestone {})", header.treasury.amount, header.treasury.milestone_id.to_hex().cyan());
            println!("  solid entry points: {}", stats.solid_entry_points);
            println!("  outputs:            {} holding {}", stats.outputs, stats.output_supply);
            println!("  milestone diffs:    {}", stats.milestone_diffs);
            match balanced {
                Some(true) => println!("{} Supply balanced", "✓".green().bold()),
                Some(false) => println!("{} Treasury and outputs do not add up to the total supply", "✗".red().bold()),
                None => {}
            }
        }
    }
    if balanced == Some(false) {
        bail!("snapshot {} does not account for the total supply", args.path.display());
    }
    Ok(())
}

/// Whether a full snapshot accounts for `total_supply`; `None` for deltas.
fn supply_balances(stats: &SnapshotStats, total_supply: u64) -> Option<bool> {
    (stats.header.kind == SnapshotKind::Full)
        .then(|| stats.header.treasury.amount as u128 + stats.output_supply == total_supply as u128)
}

fn format_timestamp(timestamp: u64) -> String {
    i64::try_from(timestamp)
        .ok()
        .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
        .map(|at| format!("{timestamp} ({})", at.to_rfc3339()))
        .unwrap_or_else(|| timestamp.to_string())
}

fn cmd_merkle_root(args: MerkleRootArgs, format: &OutputFormat) -> Result<()> {
    let items = match &args.input {
        Some(path) => {
            let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
            read_hex_items(BufReader::new(file))?
        }
        None => read_hex_items(io::stdin().lock())?,
    };

    let hasher = MerkleHasher::blake2b();
    let root = hasher.hash(&items)?;
    let proof = match args.proof {
        Some(index) => {
            let proof = hasher.proof(&items, index)?;
            if !hasher.verify(&proof, &root) {
                bail!("inclusion proof for item {index} does not verify");
            }
            Some(proof)
        }
        None => None,
    };

    match format {
        OutputFormat::Json => print_json(&json!({
            "items": items.len(),
            "root": hex::encode(&root),
            "proof": proof,
        }))?,
        OutputFormat::Text => {
            println!("{}", hex::encode(&root));
            if let Some(proof) = proof {
                println!("proof for item {} (leaf {}):", proof.index, hex::encode(&proof.leaf).cyan());
                for (sibling, side) in &proof.path {
                    println!("  {:?} {}", side, hex::encode(sibling));
                }
            }
        }
    }
    Ok(())
}

/// One hex item per line, `0x` prefix optional, blank lines skipped.
fn read_hex_items<R: BufRead>(source: R) -> Result<Vec<Vec<u8>>> {
    let mut items = Vec::new();
    for (number, line) in source.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let item = hex::decode(line.strip_prefix("0x").unwrap_or(line))
            .with_context(|| format!("line {} is not hex", number + 1))?;
        items.push(item);
    }
    Ok(items)
}

async fn cmd_ledger_diff(args: LedgerDiffArgs, node: &str, format: &OutputFormat) -> Result<()> {
    let legacy = LegacyClient::new(node)?;
    let diff = legacy
        .ledger_diff_ext(args.milestone_index)
        .await
        .with_context(|| format!("failed to fetch ledger diff of milestone {}", args.milestone_index))?;

    match format {
        OutputFormat::Json => print_json(&diff)?,
        OutputFormat::Text => {
            println!("Ledger diff of milestone {}", diff.milestone_index.to_string().bold());
            println!("  addresses changed:     {}", diff.diff.len());
            println!("  confirmed value txs:   {}", diff.confirmed_tx_with_value.len());
            println!("  confirmed bundles:     {}", diff.confirmed_bundles_with_value.len());
            println!("  net change:            {}", diff.net_change());
        }
    }
    if !diff.is_balanced() {
        bail!(
            "ledger diff of milestone {} is unbalanced by {}",
            diff.milestone_index,
            diff.net_change()
        );
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
