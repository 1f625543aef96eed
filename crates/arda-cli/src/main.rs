//! Fusion → Arda.cards converter CLI
//!
//! Command-line tool for converting Fusion 360 tool library exports into the
//! Arda.cards bulk import format and for managing the mapping logic.

use arda_core::{
    convert_with, read_input_file, read_table_file, ConverterConfig, DefaultLogic,
    LogicStore, MappingLogic, OutputField, RowPolicy, DEFAULT_LOGIC_SOURCE,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "arda")]
#[command(about = "Fusion 360 tool library to Arda.cards converter", long_about = None)]
#[command(version)]
struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Log format
    #[arg(long, value_enum, default_value = "text", global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a Fusion tool library CSV to an Arda.cards import CSV
    Convert {
        /// Fusion tool library CSV
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path
        #[arg(short, long, default_value = "arda_import.csv")]
        output: PathBuf,

        /// Converter config file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Mapping logic source file, overrides the config's logic store
        #[arg(long, conflicts_with = "store")]
        logic: Option<PathBuf>,

        /// Logic store whose active version is used
        #[arg(long)]
        store: Option<PathBuf>,

        /// Fail on any row whose column count differs from the header
        #[arg(long)]
        strict: bool,

        /// Use the built-in tool image catalog when the config has none
        #[arg(long)]
        builtin_images: bool,

        /// Output format
        #[arg(long, value_enum, default_value = "csv")]
        format: OutputFormat,
    },

    /// Check mapping logic for syntax errors
    Validate {
        /// Mapping logic source file
        #[arg(short, long)]
        logic: PathBuf,
    },

    /// Print the default mapping logic
    DefaultLogic,

    /// Parse a CSV file and show what the converter sees
    Inspect {
        /// Path to CSV file
        #[arg(short, long)]
        file: PathBuf,

        /// Converter config file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of rows to display
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },

    /// Manage a versioned mapping logic store
    Logic {
        /// Logic store file (JSON)
        #[arg(short, long)]
        store: PathBuf,

        #[command(subcommand)]
        action: LogicAction,
    },

    /// Write a config file template
    InitConfig {
        /// Output path for the config file
        #[arg(short, long)]
        output: PathBuf,

        /// Include the built-in tool image catalog
        #[arg(long)]
        builtin_images: bool,
    },
}

#[derive(Subcommand)]
enum LogicAction {
    /// Print the active mapping logic
    Show,
    /// Validate a source file and store it as the new active version
    Set {
        /// Mapping logic source file
        #[arg(short, long)]
        file: PathBuf,
    },
    /// List stored versions
    History,
    /// Drop the active version and reactivate the previous one
    Rollback,
    /// Store the default logic as a new version
    Reset,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_format);

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8, format: LogFormat) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = match verbose {
        0 => "arda_core=warn",
        1 => "arda_core=info",
        _ => "arda_core=debug",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match format {
        LogFormat::Text => fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init(),
        LogFormat::Json => fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init(),
    }
}

fn run(command: Commands) -> arda_core::Result<()> {
    match command {
        Commands::Convert {
            input,
            output,
            config,
            logic,
            store,
            strict,
            builtin_images,
            format,
        } => cmd_convert(
            &input,
            &output,
            config.as_deref(),
            logic.as_deref(),
            store.as_deref(),
            strict,
            builtin_images,
            format,
        ),
        Commands::Validate { logic } => cmd_validate(&logic),
        Commands::DefaultLogic => {
            print!("{}", DEFAULT_LOGIC_SOURCE);
            Ok(())
        }
        Commands::Inspect {
            file,
            config,
            limit,
        } => cmd_inspect(&file, config.as_deref(), limit),
        Commands::Logic { store, action } => cmd_logic(&store, action),
        Commands::InitConfig {
            output,
            builtin_images,
        } => cmd_init_config(&output, builtin_images),
    }
}

fn load_config(path: Option<&Path>) -> arda_core::Result<ConverterConfig> {
    match path {
        Some(path) => ConverterConfig::load(path),
        None => Ok(ConverterConfig::default()),
    }
}

fn read_source(path: &Path) -> arda_core::Result<String> {
    fs::read_to_string(path).map_err(|e| arda_core::Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Pick the mapping logic: explicit file, then explicit store, then the config's store
fn resolve_logic(
    logic: Option<&Path>,
    store: Option<&Path>,
    config: &ConverterConfig,
) -> arda_core::Result<Box<dyn MappingLogic>> {
    if let Some(path) = logic {
        return Ok(Box::new(arda_core::compile(&read_source(path)?)?));
    }

    match store.or(config.logic_store.as_deref()) {
        Some(path) => {
            let store = LogicStore::load(path)?;
            tracing::info!(store = %path.display(), version = store.active_version(), "using stored mapping logic");
            Ok(Box::new(store.compile_active()?))
        }
        None => Ok(Box::new(DefaultLogic)),
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_convert(
    input: &Path,
    output: &Path,
    config_path: Option<&Path>,
    logic_path: Option<&Path>,
    store_path: Option<&Path>,
    strict: bool,
    builtin_images: bool,
    format: OutputFormat,
) -> arda_core::Result<()> {
    let mut config = load_config(config_path)?;
    if strict {
        config.row_policy = RowPolicy::Strict;
    }
    if builtin_images && config.images.is_empty() {
        config.images = arda_core::TypeImageMap::builtin();
    }

    let logic = resolve_logic(logic_path, store_path, &config)?;

    let decoded = read_input_file(input)?;
    let conversion = convert_with(&decoded.text, &config, logic.as_ref())?;

    let content = match format {
        OutputFormat::Csv => conversion.output,
        OutputFormat::Json => serde_json::to_string_pretty(&conversion.rows)?,
    };
    fs::write(output, content)?;

    let report = conversion.report;
    println!("Converted {} rows to {}", report.rows_written, output.display());
    println!("  {} rows read", report.rows_read);
    if report.duplicates_removed() > 0 {
        println!("  {} duplicates removed", report.duplicates_removed());
    }
    if report.rows_skipped > 0 {
        println!("  {} malformed rows skipped", report.rows_skipped);
    }

    Ok(())
}

fn cmd_validate(path: &Path) -> arda_core::Result<()> {
    let logic = arda_core::compile(&read_source(path)?)?;
    println!("Syntax is valid: {}", path.display());
    println!(
        "Deduplication: {}",
        if logic.dedupes() { "yes" } else { "no" }
    );
    let fields: Vec<&str> = logic.assigned_fields().iter().map(|f| f.name()).collect();
    println!("Assigned fields: {}", fields.join(", "));

    Ok(())
}

fn cmd_inspect(file: &Path, config_path: Option<&Path>, limit: usize) -> arda_core::Result<()> {
    let config = load_config(config_path)?;
    let table = read_table_file(file, config.row_policy)?;
    let resolved = config.headers.resolve(&table.headers);

    println!("File: {}", file.display());
    println!("Columns: {}", table.column_count());
    println!("Rows: {}", table.row_count());
    if !table.skipped_lines.is_empty() {
        println!(
            "Skipped lines: {}",
            table
                .skipped_lines
                .iter()
                .map(|l| l.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
    println!();

    println!("Fields:");
    for field in arda_core::headers::CANONICAL_FIELDS {
        let status = if resolved.contains(field) {
            resolved.label(field).to_string()
        } else if table.find_column(field).is_some() {
            field.to_string()
        } else {
            "(missing)".to_string()
        };
        println!("  {:<18} {}", field, status);
    }
    println!();

    // Print header
    println!("{}", table.headers.join("\t"));
    println!("{}", "-".repeat(table.column_count() * 12));

    for row in table.rows.iter().take(limit) {
        let values: Vec<&str> = row.iter().map(|(_, v)| v).collect();
        println!("{}", values.join("\t"));
    }

    if table.row_count() > limit {
        println!("... ({} more rows)", table.row_count() - limit);
    }

    Ok(())
}

fn cmd_logic(store_path: &Path, action: LogicAction) -> arda_core::Result<()> {
    let mut store = LogicStore::load(store_path)?;

    match action {
        LogicAction::Show => {
            let active = store.active();
            println!("# {} v{} saved {}", store.name, active.version, active.saved_at);
            print!("{}", active.source);
            return Ok(());
        }
        LogicAction::History => {
            println!("Logic '{}' ({} versions):", store.name, store.history().len());
            let active = store.active_version();
            for entry in store.history() {
                let marker = if entry.version == active { " <-- active" } else { "" };
                println!(
                    "  v{}  {}  {} lines{}",
                    entry.version,
                    entry.saved_at.format("%Y-%m-%d %H:%M:%S"),
                    entry.source.lines().count(),
                    marker
                );
            }
            return Ok(());
        }
        LogicAction::Set { file } => {
            let version = store.update(read_source(&file)?)?;
            println!("Stored {} as version {}", file.display(), version);
        }
        LogicAction::Rollback => match store.rollback() {
            Some(dropped) => println!(
                "Dropped v{}, active is now v{}",
                dropped.version,
                store.active_version()
            ),
            None => {
                println!("Only one version stored, nothing to roll back.");
                return Ok(());
            }
        },
        LogicAction::Reset => {
            let version = store.reset_to_default()?;
            println!("Stored default logic as version {}", version);
        }
    }

    store.save(store_path)
}

fn cmd_init_config(output: &Path, builtin_images: bool) -> arda_core::Result<()> {
    let config = if builtin_images {
        ConverterConfig::with_builtin_images()
    } else {
        ConverterConfig::default()
    };

    config.save(output)?;
    println!("Created config file: {}", output.display());
    println!();
    println!("Edit the file to add header aliases and image URLs, then run:");
    println!(
        "  arda convert --input <fusion.csv> --config {}",
        output.display()
    );
    println!();
    println!("Output columns:");
    for field in OutputField::ALL {
        println!("  {}", field);
    }

    Ok(())
}
