use std::io::Write;
use std::path::{Path, PathBuf};

use clap::Args;
use tempfile::NamedTempFile;

use crate::cli::check::print_text_report;
use crate::cli::{print_fatal, sanity, OutputFormat, TuningArgs};
use crate::curation::report::CurationStats;
use crate::curation::{reconcile_files, Curation, CurationError};
use crate::utils::format::{commas, InterventionBand};

/// Default name of the corrected TPF
pub const DEFAULT_OUTPUT: &str = "rapid_prtxt.tpf";

/// Default name of the dividers report
pub const DEFAULT_DIVIDERS: &str = "dividers.tsv";

#[derive(Args)]
pub struct CurateArgs {
    /// Assembly TPF, with gaps as needed to allow the curated rearrangements
    #[arg(required = true)]
    pub tpf: PathBuf,

    /// AGP saved from PretextView
    #[arg(required = true)]
    pub agp: PathBuf,

    /// Corrected TPF to write
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// Haplotig TPF to write (default: haps_<output> next to the output)
    #[arg(long)]
    pub haps_output: Option<PathBuf>,

    /// Where to write the AGP-to-TPF break coordinates
    #[arg(long, default_value = DEFAULT_DIVIDERS)]
    pub dividers: PathBuf,

    /// External TPF validator run on the input and output TPF, e.g. "perl check_tpf.pl"
    #[arg(long)]
    pub sanity_cmd: Option<String>,

    #[command(flatten)]
    pub tuning: TuningArgs,
}

impl CurateArgs {
    fn haps_path(&self) -> PathBuf {
        if let Some(path) = &self.haps_output {
            return path.clone();
        }
        let name = self
            .output
            .file_name()
            .map_or_else(|| DEFAULT_OUTPUT.into(), |n| n.to_string_lossy().into_owned());
        self.output.with_file_name(format!("haps_{name}"))
    }
}

/// Execute curate subcommand
///
/// # Errors
///
/// Returns an error if the inputs cannot be parsed, the curation has fatal
/// problems, the outputs cannot be written, or a sanity check fails.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: CurateArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    if let Some(cmd) = &args.sanity_cmd {
        sanity::check_tpf(cmd, &args.tpf)?;
    }

    let curation = match reconcile_files(&args.tpf, &args.agp, &args.tuning.config()) {
        Ok(curation) => curation,
        Err(CurationError::Fatal(records)) => {
            print_fatal(&records);
            anyhow::bail!("{} fatal problem(s) found; no output written", records.len());
        }
        Err(e) => return Err(e.into()),
    };

    let haps_path = args.haps_path();
    write_all_atomic(&[
        (&args.output, curation.main_tpf()),
        (&haps_path, curation.haplotig_tpf()),
        (&args.dividers, curation.dividers_report()),
    ])?;

    if verbose {
        eprintln!(
            "Wrote {}, {} and {}",
            args.output.display(),
            haps_path.display(),
            args.dividers.display()
        );
    }

    if let Some(cmd) = &args.sanity_cmd {
        sanity::check_tpf(cmd, &args.output)?;
    }

    match format {
        OutputFormat::Text => print_text_results(&args, &haps_path, &curation),
        OutputFormat::Json => print_json_results(&args, &haps_path, &curation)?,
        OutputFormat::Tsv => print_tsv_results(&curation.stats),
    }

    Ok(())
}

/// Stage every file next to its destination, then move them all into place
fn write_all_atomic(files: &[(&PathBuf, String)]) -> anyhow::Result<()> {
    let mut staged = Vec::with_capacity(files.len());
    for (path, contents) in files {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut temp = NamedTempFile::new_in(dir)?;
        temp.write_all(contents.as_bytes())?;
        temp.flush()?;
        staged.push((temp, *path));
    }
    for (temp, path) in staged {
        temp.persist(path)
            .map_err(|e| anyhow::anyhow!("Failed to write {}: {}", path.display(), e.error))?;
    }
    Ok(())
}

fn print_text_results(args: &CurateArgs, haps_path: &Path, curation: &Curation) {
    let stats = &curation.stats;

    print_text_report(&curation.report);

    match &stats.sex_chromosomes {
        Some(letters) if letters.len() == 1 => println!("Sex chromosome:\t\t\t{letters}"),
        Some(letters) => println!("Sex chromosomes:\t\t{letters}"),
        None => println!("No sex chromosomes defined"),
    }

    let tpf_name = args.tpf.display().to_string();
    let out_name = args.output.display().to_string();
    let width = tpf_name.len().max(out_name.len());
    println!(
        "length {tpf_name:<width$}\t\t{} bp\t(input)",
        commas(stats.input_bases)
    );
    println!(
        "length {out_name:<width$}\t\t{} bp\t(output)",
        commas(stats.output_bases)
    );
    if stats.haplotig_bases > 0 {
        println!("haplotigs\t\t\t{} bp", commas(stats.haplotig_bases));
    }

    println!("\nTexel length:\t\t\t{}bp", commas(stats.texel));
    if stats.breaks_agree() {
        println!("Break count:\t\t\t{}", commas(stats.layout_breaks as u64));
    } else {
        println!(
            "Break count is either\t\t{} or {}",
            commas(stats.layout_breaks as u64),
            commas(stats.resolved_breaks as u64)
        );
    }
    println!("Join count:\t\t\t{}", commas(stats.joins as u64));
    println!("Haps count:\t\t\t{}", commas(stats.haplotigs as u64));
    println!("Unloc count:\t\t\t{}", commas(stats.unlocs as u64));

    if stats.band == InterventionBand::None {
        println!("No manual interventions!");
    } else {
        println!(
            "Interventions per Gb:\t\t{}\t\t({})",
            stats.interventions_per_gb, stats.band
        );
    }

    println!("\nWritten:");
    println!("  {}", args.output.display());
    println!("  {}", haps_path.display());
    println!("  {}", args.dividers.display());
}

fn print_json_results(args: &CurateArgs, haps_path: &Path, curation: &Curation) -> anyhow::Result<()> {
    let output = serde_json::json!({
        "outputs": {
            "tpf": args.output.display().to_string(),
            "haplotigs": haps_path.display().to_string(),
            "dividers": args.dividers.display().to_string(),
        },
        "stats": curation.stats,
        "report": curation.report,
        "warnings": curation.warnings,
        "haplotigs": curation.named_haplotigs,
        "unlocs": curation.named_unlocs,
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_tsv_results(stats: &CurationStats) {
    println!(
        "input_bases\toutput_bases\thaplotig_bases\ttexel\tlayout_breaks\tresolved_breaks\tjoins\thaplotigs\tunlocs\tsex_chromosomes\tinterventions_per_gb\tband"
    );
    println!(
        "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{:.1}\t{}",
        stats.input_bases,
        stats.output_bases,
        stats.haplotig_bases,
        stats.texel,
        stats.layout_breaks,
        stats.resolved_breaks,
        stats.joins,
        stats.haplotigs,
        stats.unlocs,
        stats.sex_chromosomes.as_deref().unwrap_or("-"),
        stats.interventions_per_gb,
        stats.band,
    );
}
