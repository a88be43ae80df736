//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use doctools_core::IndexBuilder;
use doctools_core::antispam::{self, AntispamInput};
use doctools_core::fileops;
use doctools_markdown::{ConvertOptions, Transform};
use doctools_shared::{
    AppConfig, DocToolsError, init_config, init_config_at, load_config, load_config_from,
};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// doctools — documentation build helpers.
#[derive(Parser)]
#[command(
    name = "doctools",
    version,
    about = "Markdown-to-HTML with generated index pages, issue antispam checks, and portable file ops.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to ~/.doctools/doctools.toml).
    #[arg(long, global = true, env = "DOCTOOLS_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Convert a Markdown file to HTML, generating the index page.
    Convert {
        /// Markdown input file.
        input: PathBuf,

        /// HTML output file.
        output: PathBuf,

        /// Skip index page generation.
        #[arg(long)]
        no_index: bool,

        /// Emit an HTML fragment instead of a complete document.
        #[arg(long)]
        fragment: bool,

        /// Document title (defaults to the first heading).
        #[arg(long)]
        title: Option<String>,
    },

    /// Print the document tree, with the index page applied, as JSON.
    Index {
        /// Markdown input file.
        input: PathBuf,
    },

    /// Score an issue/PR author and print the verdict as JSON.
    Antispam {
        /// JSON file with the author profile and event context.
        #[arg(long)]
        input: PathBuf,

        /// Evaluation time (RFC 3339), defaults to now.
        #[arg(long)]
        now: Option<String>,
    },

    /// Copy a file; a directory destination keeps the file name.
    Cp {
        /// Source file.
        src: PathBuf,
        /// Destination file or directory.
        dest: PathBuf,
    },

    /// Create a directory if it does not exist.
    Mkdir {
        /// Directory to create.
        path: PathBuf,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Write a default config file to --config, or ~/.doctools/doctools.toml.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr; stdout is
/// reserved for command output.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "doctools=warn",
        1 => "doctools=info",
        2 => "doctools=debug",
        _ => "doctools=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Convert {
            input,
            output,
            no_index,
            fragment,
            title,
        } => cmd_convert(config_path, &input, &output, no_index, fragment, title),
        Command::Index { input } => cmd_index(config_path, &input),
        Command::Antispam { input, now } => cmd_antispam(config_path, &input, now.as_deref()),
        Command::Cp { src, dest } => cmd_cp(&src, &dest),
        Command::Mkdir { path } => cmd_mkdir(&path),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(config_path),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    };
    Ok(config)
}

fn read_input(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| DocToolsError::io(path, e).into())
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_convert(
    config_path: Option<&Path>,
    input: &Path,
    output: &Path,
    no_index: bool,
    fragment: bool,
    title: Option<String>,
) -> Result<()> {
    let config = resolve_config(config_path)?;
    let markdown = read_input(input)?;

    let mut opts = ConvertOptions::from(&config.html);
    if fragment {
        opts.complete_document = false;
    }
    if title.is_some() {
        opts.title = title;
    }

    let index = IndexBuilder::from(&config.index);
    let transforms: Vec<&dyn Transform> = if no_index {
        Vec::new()
    } else {
        vec![&index as &dyn Transform]
    };

    let result = doctools_markdown::convert(&markdown, &opts, &transforms)
        .map_err(|e| eyre!("{}: {e}", input.display()))?;

    std::fs::write(output, &result.html).map_err(|e| DocToolsError::io(output, e))?;

    info!(
        input = %input.display(),
        output = %output.display(),
        title = %result.title,
        headings = result.heading_count,
        "converted"
    );

    Ok(())
}

fn cmd_index(config_path: Option<&Path>, input: &Path) -> Result<()> {
    let config = resolve_config(config_path)?;
    let markdown = read_input(input)?;

    let mut root = doctools_markdown::parse(&markdown);
    IndexBuilder::from(&config.index)
        .build_index(&mut root)
        .map_err(|e| eyre!("{}: {e}", input.display()))?;

    println!("{}", serde_json::to_string_pretty(&root)?);
    Ok(())
}

fn cmd_antispam(config_path: Option<&Path>, input: &Path, now: Option<&str>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let input = AntispamInput::from_json(&read_input(input)?)?;

    let now = match now {
        Some(ts) => DateTime::parse_from_rfc3339(ts)
            .map_err(|e| eyre!("invalid --now timestamp '{ts}': {e}"))?
            .with_timezone(&Utc),
        None => Utc::now(),
    };

    let verdict = antispam::evaluate(&input, &config.antispam, now)?;
    if !verdict.suspicious {
        info!("not suspicious");
    }

    println!("{}", serde_json::to_string_pretty(&verdict)?);
    Ok(())
}

fn cmd_cp(src: &Path, dest: &Path) -> Result<()> {
    let written = fileops::copy_file(src, dest)?;
    info!(path = %written.display(), "copied");
    Ok(())
}

fn cmd_mkdir(path: &Path) -> Result<()> {
    if fileops::make_dir(path)? {
        info!(path = %path.display(), "created");
    }
    Ok(())
}

fn cmd_config_init(config_path: Option<&Path>) -> Result<()> {
    let path = match config_path {
        Some(path) => init_config_at(path)?,
        None => init_config()?,
    };
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
