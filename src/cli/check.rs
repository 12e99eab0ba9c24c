use std::path::PathBuf;

use clap::Args;

use crate::cli::{print_fatal, OutputFormat, TuningArgs};
use crate::curation::report::DiscrepancyReport;
use crate::curation::{reconcile_files, Curation, CurationError};

#[derive(Args)]
pub struct CheckArgs {
    /// Assembly TPF
    #[arg(required = true)]
    pub tpf: PathBuf,

    /// PretextView AGP
    #[arg(required = true)]
    pub agp: PathBuf,

    #[command(flatten)]
    pub tuning: TuningArgs,
}

/// Execute check subcommand
///
/// # Errors
///
/// Returns an error if either input cannot be parsed, or if the curation has
/// fatal problems.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: CheckArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let curation = match reconcile_files(&args.tpf, &args.agp, &args.tuning.config()) {
        Ok(curation) => curation,
        Err(CurationError::Fatal(records)) => {
            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&serde_json::json!({
                        "ok": false,
                        "errors": records,
                    }))?);
                }
                OutputFormat::Text | OutputFormat::Tsv => print_fatal(&records),
            }
            anyhow::bail!("{} fatal problem(s) found", records.len());
        }
        Err(e) => return Err(e.into()),
    };

    if verbose {
        eprintln!(
            "{} output scaffolds, {} haplotigs, {} breaks",
            curation.main.len(),
            curation.haplotigs.len(),
            curation.breakpoints.len()
        );
    }

    match format {
        OutputFormat::Text => print_text_check(&curation),
        OutputFormat::Json => print_json_check(&curation)?,
        OutputFormat::Tsv => print_tsv_check(&curation.report),
    }

    Ok(())
}

fn print_text_check(curation: &Curation) {
    if curation.report.is_empty() {
        println!("No discrepancies found; curate would write {} scaffolds.", curation.main.len());
        return;
    }
    print_text_report(&curation.report);
}

/// Human-readable discrepancy blocks, shared with `curate`
pub(crate) fn print_text_report(report: &DiscrepancyReport) {
    if !report.discarded_entries.is_empty() {
        println!("\n{}\n", "=".repeat(100));
        println!("Unused AGP lines - either snap-mode artefacts, or something else like a missing break.");
        println!("Check these and if necessary fix them manually:\n");
        for line in &report.discarded_entries {
            println!("{line}");
        }
        println!("\n{}\n", "=".repeat(100));
    }

    if !report.synthesized_breaks.is_empty() {
        println!("Breaks missing from input TPF (synthesized):");
        for b in &report.synthesized_breaks {
            println!("  {}\t{}\t{}", b.scaffold, b.divider, b.coordinate);
        }
    }

    if !report.duplicate_shrapnel.is_empty() {
        println!("Duplicate shrapnel removed:");
        for region in &report.duplicate_shrapnel {
            println!("  {region}");
        }
    }

    match report.count_mismatches.len() {
        0 => {}
        1 => println!("\nDiscrepancy between agp and tpf - likely a break has been missed:\n"),
        _ => println!("\nDiscrepancies between agp and tpf - likely breaks have been missed:\n"),
    }
    for mismatch in &report.count_mismatches {
        println!("{mismatch}");
    }

    if !report.missing_components.is_empty() || !report.duplicated_components.is_empty() {
        println!("\n>>>   PROBLEM - components missing from or repeated in output   <<<");
        for region in &report.missing_components {
            println!("  missing\t{region}");
        }
        for region in &report.duplicated_components {
            println!("  repeated\t{region}");
        }
    }
}

fn print_json_check(curation: &Curation) -> anyhow::Result<()> {
    let output = serde_json::json!({
        "ok": true,
        "report": curation.report,
        "warnings": curation.warnings,
        "stats": curation.stats,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_tsv_check(report: &DiscrepancyReport) {
    println!("kind\tname\tdetail");
    for b in &report.synthesized_breaks {
        println!("synthesized_break\t{}\t{}", b.scaffold, b.coordinate);
    }
    for line in &report.discarded_entries {
        let name = line.split('\t').next().unwrap_or_default();
        println!("discarded_entry\t{name}\t{}", line.replace('\t', " "));
    }
    for region in &report.duplicate_shrapnel {
        println!("duplicate_shrapnel\t{region}\t");
    }
    for m in &report.count_mismatches {
        println!("count_mismatch\t{}\t{}/{}", m.name, m.agp_count, m.tpf_count);
    }
    for region in &report.missing_components {
        println!("missing_component\t{region}\t");
    }
    for region in &report.duplicated_components {
        println!("duplicated_component\t{region}\t");
    }
}
