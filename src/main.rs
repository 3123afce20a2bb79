//! Agentix: tool-schema extractor CLI.
//!
//! Usage:
//!   agentix describe <FILE>                 Print tool specs for a Python file
//!   agentix scan <ROOT> --prefix <P>        Describe every module under a root
//!   agentix classes <FILE> --methods a,b    List classes implementing methods
//!   agentix decorate <FILE> --class C --decorator D [--write]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use serde_json::{Map, Value};
use std::path::Path;
use tracing::{debug, info};

use agentix::config::{self, AgentixConfig};
use agentix::export::{render_tools_block, to_tool_calling_format_with_limit};
use agentix::extract::{module_files, ToolExtractor};
use agentix::syntax::inspect;
use agentix::syntax::SourceTree;
use agentix::types::ToolSpec;

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "agentix")]
#[command(version)]
#[command(about = "Extract function-calling tool schemas from Python sources")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to agentix.toml (default: ~/.agentix/agentix.toml).
    #[arg(long, global = true)]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error). Overrides the config file.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log every visited definition.
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the tools defined in a Python file.
    Describe {
        file: String,

        #[arg(long, value_enum, default_value_t = OutputFormat::Native)]
        format: OutputFormat,
    },

    /// Describe every Python module below a directory.
    Scan {
        root: String,

        /// Relative path prefix filter (default from config).
        #[arg(long)]
        prefix: Option<String>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Native)]
        format: OutputFormat,
    },

    /// List top-level classes that implement all of the given methods.
    Classes {
        file: String,

        #[arg(long, value_delimiter = ',', required = true)]
        methods: Vec<String>,
    },

    /// Add a decorator to every class with the given name.
    Decorate {
        file: String,

        #[arg(long = "class")]
        class_name: String,

        #[arg(long)]
        decorator: String,

        /// Rewrite the file in place instead of printing the result.
        #[arg(long)]
        write: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Full tool specifications.
    Native,
    /// Function-calling records (`{"type": "function", ...}`).
    Tools,
    /// Function-calling records wrapped in a `[TOOLS]` prompt block.
    Prompt,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .as_deref()
        .map(config::resolve_path)
        .unwrap_or_else(config::default_config_path);
    let mut cfg = config::load_config(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    if let Some(level) = &cli.log_level {
        cfg.log_level = level.clone();
    }
    if cli.debug {
        cfg.extract.debug = true;
    }

    // Logs go to stderr so stdout stays machine-readable.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cfg.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
    debug!("Using config {}", config_path.display());

    match cli.command {
        Commands::Describe { file, format } => {
            cmd_describe(&cfg, &config::resolve_path(&file), format)
        }
        Commands::Scan { root, prefix, format } => {
            let prefix = prefix.unwrap_or_else(|| cfg.scan.module_prefix.clone());
            cmd_scan(&cfg, &config::resolve_path(&root), &prefix, format)
        }
        Commands::Classes { file, methods } => cmd_classes(&config::resolve_path(&file), &methods),
        Commands::Decorate {
            file,
            class_name,
            decorator,
            write,
        } => cmd_decorate(&config::resolve_path(&file), &class_name, &decorator, write),
    }
}

// ---------------------------------------------------------------------------
// Command implementations
// ---------------------------------------------------------------------------

fn cmd_describe(cfg: &AgentixConfig, file: &Path, format: OutputFormat) -> Result<()> {
    let extractor = ToolExtractor::new(cfg.extract.clone());
    let tools = extractor
        .extract_from_file(file)
        .with_context(|| format!("Failed to extract tools from {}", file.display()))?;

    print!("{}", render(cfg, &tools, format)?);
    Ok(())
}

fn cmd_scan(cfg: &AgentixConfig, root: &Path, prefix: &str, format: OutputFormat) -> Result<()> {
    let files = module_files(root, prefix)
        .with_context(|| format!("Failed to scan {}", root.display()))?;
    let extractor = ToolExtractor::new(cfg.extract.clone());
    let results = extractor
        .extract_from_files(&files)
        .context("Failed to extract tools")?;

    let total: usize = results.iter().map(|(_, tools)| tools.len()).sum();
    eprintln!(
        "{} {} tools in {} files under {}",
        ">>>".green().bold(),
        total,
        results.len(),
        root.display(),
    );

    if format == OutputFormat::Prompt {
        let all: Vec<ToolSpec> = results.into_iter().flat_map(|(_, tools)| tools).collect();
        print!("{}", render(cfg, &all, format)?);
        return Ok(());
    }

    let mut by_file = Map::new();
    for (path, tools) in results {
        let value = match format {
            OutputFormat::Tools => serde_json::to_value(to_tool_calling_format_with_limit(
                &tools,
                cfg.extract.description_limit,
            ))?,
            _ => serde_json::to_value(&tools)?,
        };
        by_file.insert(path.display().to_string(), value);
    }
    println!("{}", serde_json::to_string_pretty(&Value::Object(by_file))?);
    Ok(())
}

fn cmd_classes(file: &Path, methods: &[String]) -> Result<()> {
    let source = read_source(file)?;
    let tree = SourceTree::parse(&source)
        .with_context(|| format!("Failed to parse {}", file.display()))?;

    let classes = inspect::module_classes_implementing(&tree, methods);
    let mut out = Vec::with_capacity(classes.len());
    for class in classes {
        let defs = inspect::function_defs_in_class(&tree, &class.name, methods);
        out.push(serde_json::json!({ "class": class, "methods": defs }));
    }
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn cmd_decorate(file: &Path, class_name: &str, decorator: &str, write: bool) -> Result<()> {
    let source = read_source(file)?;
    let updated = inspect::add_class_decorator(&source, class_name, decorator)
        .with_context(|| format!("Failed to parse {}", file.display()))?;

    if !write {
        print!("{}", updated);
        return Ok(());
    }

    if updated == source {
        eprintln!("{} {} unchanged", "---".yellow().bold(), file.display());
        return Ok(());
    }
    std::fs::write(file, &updated)
        .with_context(|| format!("Failed to write {}", file.display()))?;
    info!("Decorated class {} in {}", class_name, file.display());
    eprintln!("{} {} updated", ">>>".green().bold(), file.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_source(file: &Path) -> Result<String> {
    std::fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))
}

fn render(cfg: &AgentixConfig, tools: &[ToolSpec], format: OutputFormat) -> Result<String> {
    let text = match format {
        OutputFormat::Native => format!("{}\n", serde_json::to_string_pretty(tools)?),
        OutputFormat::Tools => {
            let payload = to_tool_calling_format_with_limit(tools, cfg.extract.description_limit);
            format!("{}\n", serde_json::to_string_pretty(&payload)?)
        }
        OutputFormat::Prompt => render_tools_block(&to_tool_calling_format_with_limit(
            tools,
            cfg.extract.description_limit,
        ))?,
    };
    Ok(text)
}
