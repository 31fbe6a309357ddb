use clap::{Args, Parser, Subcommand};
use grip_occupancy::naming::{
    discover_runs, discover_runs_by_ids, discover_runs_matching, read_id_list, RunLocation,
};
use grip_occupancy::occupancy::ProbabilityOptions;
use grip_occupancy::{process_run, GripError, PipelineConfig, RunResult, ScoreKind};
use log::{error, info};
use polars::prelude::*;
use rayon::prelude::*;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

#[derive(thiserror::Error, Debug)]
pub enum SiteOccupancyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),

    #[error(transparent)]
    Grip(#[from] GripError),

    #[error("{failed} of {total} runs failed")]
    RunsFailed { failed: usize, total: usize },

    #[error("No simulation runs found under {0}")]
    NoRuns(PathBuf),
}

#[derive(Parser)]
#[command(
    name = "site-occupancy",
    about = "Compares Boltzmann binding probabilities with the occupancy measured by GRiP simulations",
    long_about = "Reads the occupancy, affinity landscape, TF species and params files of GRiP runs, \
                  masks inaccessible chromatin and unreachable footprint starts, and writes the \
                  theoretical and empirical binding probability of every site next to a per-TF summary.",
    version,
    after_help = "Example usage:\n    \
                  site-occupancy run --dir results/kr --prefix kr --id 1712 --out tables\n    \
                  site-occupancy scan results --ids 1712,1713 --out tables --energy\n    \
                  site-occupancy scan results --param ENSEMBLE_SIZE=100 --id-file ids/copy_number.txt",
    color = clap::ColorChoice::Always
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process a single run given by directory, prefix and id
    Run(RunArgs),
    /// Find every run below a directory and process them in parallel
    Scan(ScanArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Directory holding the run's output files
    #[arg(short, long)]
    dir: PathBuf,

    /// Common prefix of the run's file names
    #[arg(short, long)]
    prefix: String,

    /// Run id, the last `_`-separated part of every file name
    #[arg(short, long)]
    id: String,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args, Debug)]
struct ScanArgs {
    /// Directory searched recursively for params files
    #[arg(value_name = "ROOT")]
    root: PathBuf,

    /// Only process these run ids
    #[arg(long, value_delimiter = ',')]
    ids: Option<Vec<String>>,

    /// Only process the run ids listed in an id-list file
    #[arg(long, conflicts_with = "ids")]
    id_file: Option<PathBuf>,

    /// Only process runs whose params file sets KEY to VALUE; may be repeated
    #[arg(long = "param", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    params: Vec<(String, String)>,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Directory the output tables are written to
    #[arg(short, long, default_value = ".")]
    out: PathBuf,

    /// Directory that relative paths inside params files start from
    #[arg(long, default_value = ".")]
    project_root: PathBuf,

    /// The affinity landscape holds energies (lower is stronger) instead of scores
    #[arg(long)]
    energy: bool,

    /// Fill rows without accessible sites or without binding with zeros instead of failing
    #[arg(long)]
    zero_degenerate: bool,

    /// Descriptive lines before the header of track files
    #[arg(long, default_value = "1")]
    skip_lines: usize,
}

impl CommonArgs {
    fn config(&self) -> PipelineConfig {
        PipelineConfig {
            project_root: self.project_root.clone(),
            score_kind: if self.energy {
                ScoreKind::Energy
            } else {
                ScoreKind::Affinity
            },
            track_skip_lines: self.skip_lines,
            probability: ProbabilityOptions {
                zero_degenerate_rows: self.zero_degenerate,
            },
        }
    }
}

fn parse_key_value(arg: &str) -> Result<(String, String), String> {
    let (key, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got {}", arg))?;
    Ok((key.trim().to_string(), value.trim().trim_matches('"').to_string()))
}

fn write_csv(df: &mut DataFrame, path: &Path) -> Result<(), SiteOccupancyError> {
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(df)?;
    Ok(())
}

fn write_outputs(result: &RunResult, out: &Path) -> Result<(), SiteOccupancyError> {
    let loc = &result.location;
    let name = |kind: &str| out.join(format!("{}{}_{}.csv", loc.prefix, kind, loc.run_id));

    write_csv(&mut result.to_dataframe()?, &name("probabilities"))?;
    write_csv(&mut result.summary_dataframe()?, &name("summary"))?;
    if let Some(sites) = result.target_sites_dataframe() {
        write_csv(&mut sites?, &name("target_sites"))?;
    }
    Ok(())
}

fn process_and_write(
    location: &RunLocation,
    config: &PipelineConfig,
    out: &Path,
) -> Result<(), SiteOccupancyError> {
    let result = process_run(location, config)?;
    write_outputs(&result, out)?;
    info!(
        "run {}: {} rows × {} positions written to {}",
        location.run_id,
        result.row_names.len(),
        result.positions.len(),
        out.display()
    );
    Ok(())
}

fn main() -> Result<(), SiteOccupancyError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let start_time = std::time::Instant::now();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => {
            fs::create_dir_all(&args.common.out)?;
            let location = RunLocation::new(&args.dir, &args.prefix, &args.id);
            process_and_write(&location, &args.common.config(), &args.common.out)?;
        }
        Commands::Scan(args) => {
            fs::create_dir_all(&args.common.out)?;
            let ids = match &args.id_file {
                Some(file) => {
                    let list = read_id_list(file)?;
                    info!(
                        "{} ids for {} = {:?}",
                        list.ids.len(),
                        list.param_name,
                        list.param_values
                    );
                    Some(list.ids)
                }
                None => args.ids.clone(),
            };
            let mut runs = match &ids {
                Some(ids) => discover_runs_by_ids(&args.root, ids)?,
                None => discover_runs(&args.root)?,
            };
            if !args.params.is_empty() {
                let matching = discover_runs_matching(
                    &args.root,
                    |params| {
                        args.params
                            .iter()
                            .all(|(key, value)| params.raw.get(key) == Some(value))
                    },
                    |_| true,
                )?;
                runs.retain(|run| matching.contains(run));
            }
            if runs.is_empty() {
                return Err(SiteOccupancyError::NoRuns(args.root));
            }
            info!("{} runs to process", runs.len());

            let config = args.common.config();
            let failed = runs
                .par_iter()
                .map(|run| process_and_write(run, &config, &args.common.out))
                .filter_map(|r| r.err())
                .inspect(|e| error!("{}", e))
                .count();
            if failed > 0 {
                return Err(SiteOccupancyError::RunsFailed {
                    failed,
                    total: runs.len(),
                });
            }
        }
    }

    let elapsed = start_time.elapsed();
    info!("Total execution time: {:.4} minutes", elapsed.as_secs_f64() / 60.0);

    Ok(())
}
