use clap::{ArgAction, Parser, Subcommand};
use miette::Result;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::Settings;
use config::{Config, OutputFormat};

#[derive(Parser)]
#[command(name = "implementor")]
#[command(
    author,
    version,
    about = "Implement C++ interfaces: override declarations, insertion points, base specifiers"
)]
struct Cli {
    /// Config file (defaults to ./implementor.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format, overrides `[output] format`
    #[arg(long, global = true, value_enum)]
    format: Option<OutputFormat>,

    /// Leave attribute specifiers out of generated declarations
    #[arg(long, global = true)]
    ignore_attributes: bool,

    /// More logging on stderr (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Make a class implement an interface: add the base and the overrides
    Implement {
        /// C++ source file
        file: PathBuf,

        /// Class that should implement the interface
        #[arg(long)]
        class: String,

        /// Interface to implement
        #[arg(long)]
        interface: String,

        /// Rewrite the file instead of printing it
        #[arg(long)]
        in_place: bool,
    },

    /// Print override declarations for the pure virtual methods of a class
    Overrides {
        /// C++ source file
        file: PathBuf,

        /// Interface class
        #[arg(long)]
        class: String,
    },

    /// Print where a new public method would be inserted
    Place {
        /// C++ source file
        file: PathBuf,

        /// Class to insert into
        #[arg(long)]
        class: String,
    },

    /// Print the edit that adds a base specifier
    Base {
        /// C++ source file
        file: PathBuf,

        /// Deriving class
        #[arg(long)]
        class: String,

        /// Base class to add
        #[arg(long)]
        base: String,
    },
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_env("IMPLEMENTOR_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cwd = std::env::current_dir()
        .map_err(|e| miette::miette!("Failed to get the current directory: {}", e))?;
    let config = Config::load(cli.config.as_deref(), &cwd)?;

    let mut settings = Settings {
        expander: config.expander,
        format: cli.format.unwrap_or(config.output.format),
    };
    if cli.ignore_attributes {
        settings.expander.ignore_attribute_specifiers = true;
    }

    let output = match cli.command {
        Commands::Implement {
            file,
            class,
            interface,
            in_place,
        } => commands::implement(&file, &class, &interface, in_place, &settings)?,
        Commands::Overrides { file, class } => commands::overrides(&file, &class, &settings)?,
        Commands::Place { file, class } => commands::place(&file, &class, &settings)?,
        Commands::Base { file, class, base } => commands::base(&file, &class, &base, &settings)?,
    };
    print!("{output}");

    Ok(())
}
