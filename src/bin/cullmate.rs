// Cullmate CLI binary

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use cullmate_core::{run_ingest, HashAlgorithm, IngestError, IngestEvent, IngestParams, VerifyMode};

#[derive(Parser)]
#[command(name = "cullmate")]
#[command(about = "Card-to-project ingest with a cryptographically verifiable safe-to-format proof", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a source directory into a project
    Ingest {
        /// Source directory (camera card)
        source: PathBuf,
        /// Parent directory the project folder is created under
        dest: PathBuf,
        /// Project folder name
        #[arg(long)]
        name: String,
        /// Verification mode: none, sentinel, full
        #[arg(long, default_value = "sentinel")]
        verify: String,
        /// Hash algorithm: blake3, sha256, sha512
        #[arg(long, default_value = "blake3")]
        hash_algo: String,
        /// Overwrite existing destination files
        #[arg(long)]
        overwrite: bool,
        /// Skip copying content whose hash already landed in this run
        #[arg(long)]
        dedupe: bool,
        /// Mirror every file to a second, independent destination
        #[arg(long)]
        backup: Option<PathBuf>,
    },
}

fn main() -> Result<(), IngestError> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Ingest {
            source,
            dest,
            name,
            verify,
            hash_algo,
            overwrite,
            dedupe,
            backup,
        } => cmd_ingest(source, dest, name, verify, hash_algo, overwrite, dedupe, backup),
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_ingest(
    source: PathBuf,
    dest: PathBuf,
    name: String,
    verify: String,
    hash_algo: String,
    overwrite: bool,
    dedupe: bool,
    backup: Option<PathBuf>,
) -> Result<(), IngestError> {
    let verify_mode = VerifyMode::parse(&verify)
        .ok_or_else(|| IngestError::InvalidParams(format!("unknown verify mode: {verify}")))?;
    let algo = HashAlgorithm::parse(&hash_algo)
        .ok_or_else(|| IngestError::InvalidParams(format!("unknown hash algorithm: {hash_algo}")))?;

    let mut params = IngestParams::new(source, dest, name);
    params.verify_mode = verify_mode;
    params.hash_algo = algo;
    params.overwrite = overwrite;
    params.dedupe = dedupe;
    params.backup_dest = backup;

    let mut on_event = |event: IngestEvent| print_event(&event);
    let manifest = run_ingest(params, Some(&mut on_event))?;

    println!();
    println!("Ingest complete:");
    println!("  Files:          {}", manifest.totals.file_count);
    println!("  Copied:         {}", manifest.totals.success_count);
    println!("  Failed:         {}", manifest.totals.fail_count);
    println!("  Skipped:        {}", manifest.totals.skip_count);
    println!("  Duplicates:     {}", manifest.totals.duplicate_count);
    println!("  Safe to format: {}", manifest.safe_to_format);
    if let Some(path) = &manifest.manifest_path {
        println!("  Manifest:       {path}");
    }
    if let Some(path) = &manifest.report_path {
        println!("  Report:         {path}");
    }

    if !manifest.safe_to_format {
        std::process::exit(1);
    }
    Ok(())
}

fn print_event(event: &IngestEvent) {
    match event {
        IngestEvent::Start { source_path, project_root } => {
            println!("Starting ingest of {source_path} into {project_root}");
        }
        IngestEvent::ScanProgress { discovered_count } => {
            log::debug!("scanned {discovered_count} files so far");
        }
        IngestEvent::CopyProgress { index, total, rel_path, .. } => {
            println!("[{index}/{total}] {rel_path}");
        }
        IngestEvent::DedupeHit { rel_path, duplicate_of, .. } => {
            println!("duplicate: {rel_path} already copied as {duplicate_of}");
        }
        IngestEvent::VerifyProgress { mode, verified_count, verified_total } => {
            log::debug!("verify[{mode}] {verified_count}/{verified_total}");
        }
        IngestEvent::BackupStart { backup_root } => {
            println!("Mirroring to backup: {backup_root}");
        }
        IngestEvent::BackupCopyProgress { index, total, rel_path, .. } => {
            println!("[backup {index}/{total}] {rel_path}");
        }
        IngestEvent::BackupVerifyProgress { mode, verified_count, verified_total } => {
            log::debug!("backup verify[{mode}] {verified_count}/{verified_total}");
        }
        IngestEvent::TriageDone { unreadable_count, black_frame_count } => {
            if *unreadable_count > 0 || *black_frame_count > 0 {
                println!("Triage flagged {unreadable_count} unreadable, {black_frame_count} black frame files");
            }
        }
        IngestEvent::ReportGenerated { report_path, .. } => {
            println!("Report written to {report_path}");
        }
        IngestEvent::Done { safe_to_format, .. } => {
            println!("Done. safe_to_format = {safe_to_format}");
        }
        _ => {}
    }
}
