use allpaths_workload::collection::{Collection, RedbCollection};
use allpaths_workload::{WorkloadConfig, WorkloadError, all_paths_suite, wire};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "allpaths-workload", about = "All-paths index benchmark workloads")]
struct Opts {
    /// JSON file with workload settings. Flags below override it.
    #[arg(long, env = "ALLPATHS_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long, env = "ALLPATHS_POOL_SIZE")]
    pool_size: Option<usize>,

    #[arg(long, env = "ALLPATHS_CORPUS_SIZE")]
    corpus_size: Option<usize>,

    #[arg(long, env = "ALLPATHS_BATCH_SIZE")]
    batch_size: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print every case name with its operation count.
    List,
    /// Write the suite as an array of case descriptors.
    Export {
        #[arg(long, value_enum, default_value = "json")]
        format: Format,
        /// Output file. Defaults to stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Run cases against a redb collection without timing them.
    Replay {
        #[arg(long)]
        db: PathBuf,
        /// Only this case. Defaults to every case.
        #[arg(long)]
        case: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Cbor,
}

impl Opts {
    fn workload_config(&self) -> allpaths_workload::Result<WorkloadConfig> {
        let mut config = match &self.config {
            Some(path) => WorkloadConfig::from_json_file(path)?,
            None => WorkloadConfig::default(),
        };
        if let Some(pool_size) = self.pool_size {
            config.pool_size = pool_size;
        }
        if let Some(corpus_size) = self.corpus_size {
            config.corpus_size = corpus_size;
        }
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        Ok(config)
    }
}

fn main() -> allpaths_workload::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let opts = Opts::parse();
    let registry = all_paths_suite(&opts.workload_config()?)?;

    match opts.command {
        Command::List => {
            let mut stdout = std::io::stdout().lock();
            for case in &registry {
                writeln!(stdout, "{}\t{}", case.name(), case.operations().len())?;
            }
        }
        Command::Export { format, out } => {
            let bytes = match format {
                Format::Json => wire::to_json(&registry)?,
                Format::Cbor => wire::to_cbor(&registry)?,
            };
            match out {
                Some(path) => {
                    std::fs::write(&path, &bytes)?;
                    info!(path = %path.display(), bytes = bytes.len(), "suite exported");
                }
                None => std::io::stdout().lock().write_all(&bytes)?,
            }
        }
        Command::Replay { db, case } => {
            let mut collection = RedbCollection::new(&db)?;
            let selected: Vec<_> = match &case {
                Some(name) => vec![
                    registry
                        .get(name)
                        .ok_or_else(|| WorkloadError::UnknownCase(name.clone()))?,
                ],
                None => registry.iter().collect(),
            };
            for case in selected {
                case.replay(&mut collection)?;
                info!(
                    case = case.name(),
                    documents = collection.document_count()?,
                    entries = collection.index_entry_count()?,
                    "case replayed"
                );
            }
        }
    }
    Ok(())
}
