use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::PathBuf;
use stowage::app::{dump_storage, load_storage};
use stowage::core::SelectionResolver;
use stowage::system::{list_archive_entries, FileSystemStorage};
use stowage::StowageConfig;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (default: <config dir>/stowage/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Storage root, overrides `storage_root` from the config file
    #[arg(short, long)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List selectable storage paths with file counts and sizes.
    Choices,

    /// Archive the selected storage paths into a .tgz file.
    DumpStorage {
        /// Storage-relative paths (directories archive their direct files only).
        #[arg(required = true)]
        paths: Vec<String>,

        /// Output file, `-` for stdout. Defaults to `<timestamp>.tgz`.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Extract a .tgz archive into storage, skipping files that already exist.
    LoadStorage {
        archive: PathBuf,
    },

    /// Print the entry names of a .tgz archive.
    List {
        archive: PathBuf,
    },
}

/// `RUST_LOG` 지시문으로 필터 생성, 비어 있으면 WARN 이상만 출력
fn parse_log_filter(directives: &str) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .parse_lossy(directives)
}

fn log_filter() -> EnvFilter {
    parse_log_filter(&std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default())
}

fn initialize_tracing() {
    let format = tracing_subscriber::fmt::format()
        .without_time()
        .with_target(false)
        .compact();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .event_format(format)
        .with_writer(io::stderr)
        .init();
}

fn load_config(args: &Args) -> Result<StowageConfig> {
    let mut config = match &args.config {
        Some(path) => StowageConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => StowageConfig::load().context("Failed to load default config")?,
    };
    if let Some(root) = &args.root {
        config.storage_root = root.clone();
    }
    Ok(config)
}

fn open_storage(config: &StowageConfig) -> Result<FileSystemStorage> {
    FileSystemStorage::new(&config.storage_root)
        .with_context(|| format!("Invalid storage root {}", config.storage_root.display()))
}

fn run(args: Args) -> Result<()> {
    let config = load_config(&args)?;

    match args.command {
        Commands::Choices => {
            let resolver = SelectionResolver::new(open_storage(&config)?)?;
            println!("{}", resolver.help_text());
            for choice in resolver.list_choices()? {
                println!("{}", choice.label);
            }
        }
        Commands::DumpStorage { paths, output } => {
            let resolver = SelectionResolver::new(open_storage(&config)?)?;
            let now = chrono::Local::now().naive_local();
            let dump = dump_storage(&resolver, &paths, now)?;
            let output = output.unwrap_or_else(|| PathBuf::from(&dump.filename));

            let mut writer: Box<dyn Write> = if output.as_os_str() == "-" {
                Box::new(io::stdout().lock())
            } else {
                Box::new(
                    File::create(&output)
                        .with_context(|| format!("Failed to create {}", output.display()))?,
                )
            };
            for chunk in dump.body {
                writer.write_all(&chunk?)?;
            }
            writer.flush()?;
        }
        Commands::LoadStorage { archive } => {
            let storage = open_storage(&config)?;
            let file = File::open(&archive)
                .with_context(|| format!("Failed to open {}", archive.display()))?;
            let summary = load_storage(BufReader::new(file), &storage)?;
            println!("{}", summary.message());
        }
        Commands::List { archive } => {
            let file = File::open(&archive)
                .with_context(|| format!("Failed to open {}", archive.display()))?;
            for entry in list_archive_entries(BufReader::new(file))? {
                if entry.is_dir() {
                    println!("{}/", entry.name);
                } else {
                    println!("{}", entry.name);
                }
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    initialize_tracing();
    run(Args::parse())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_filter_defaults_to_warn() {
        assert_eq!(parse_log_filter("").max_level_hint(), Some(LevelFilter::WARN));
    }

    #[test]
    fn test_log_filter_honors_directives() {
        assert_eq!(
            parse_log_filter("debug").max_level_hint(),
            Some(LevelFilter::DEBUG)
        );
        assert_eq!(
            parse_log_filter("stowage=info").max_level_hint(),
            Some(LevelFilter::INFO)
        );
    }
}
