use anyhow::Result;
use archive_curator::commands::{
    add_source_command, build_command, group_command, index_command, library_info_command,
    overlay_command, sync_command,
};
use archive_curator::init_tracing;
use clap::{Parser, Subcommand};

/// Software archive curator CLI.
///
/// This CLI is a thin wrapper around `curator-core` (exposed in code as
/// `curator_core`). All substantive logic lives in the library so it can be
/// tested thoroughly and reused from other frontends.
#[derive(Parser, Debug)]
#[command(
    name = "archive-curator",
    version,
    about = "Discover, deduplicate and group archived software releases",
    long_about = None
)]
struct Cli {
    /// Library definition file (YAML).
    #[arg(long, global = true, default_value = "library.yaml")]
    library: String,

    /// Enable debug logging (overridden by RUST_LOG).
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Materialize local copies of every source.
    Sync,

    /// Walk the sources and build the intermediate release index.
    ///
    /// This will:
    /// - Recreate the intermediates directory.
    /// - Store every release under its sha256 in `files/`.
    /// - Write icons to `icons/` and failing files to `errors/`.
    /// - Write `releases.json`.
    Index,

    /// Group releases into programs, versions and variants.
    Group,

    /// Merge overlays into the grouped index and write the published tree.
    Overlay,

    /// Run `index`, `group` and `overlay` in order.
    Build {
        /// Sync sources first.
        #[arg(long, default_value_t = false)]
        sync: bool,
    },

    /// Add a source URL to the library definition.
    ///
    /// The definition is created with default directories if it does not exist.
    AddSource {
        /// Archive item or website snapshot URL.
        url: String,
    },

    /// Show library paths, sources and the last summary.
    Info {
        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Sync => sync_command(&cli.library)?,
        Command::Index => index_command(&cli.library)?,
        Command::Group => group_command(&cli.library)?,
        Command::Overlay => overlay_command(&cli.library)?,
        Command::Build { sync } => build_command(&cli.library, sync)?,
        Command::AddSource { url } => add_source_command(&cli.library, &url)?,
        Command::Info { json } => library_info_command(&cli.library, json)?,
    }

    Ok(())
}
