use std::sync::Arc;

use clap::{
    ArgAction, CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use shuffli::{cli, config, error, types::PkceToken};
use tokio::sync::Mutex;

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Authorize with Spotify API
    Auth,

    /// Refill a playlist with a random selection from your library
    Shuffle(ShuffleOptions),

    /// Inspect or edit the playlist exclusion list
    Exclusions(ExclusionsOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct ShuffleOptions {
    /// Number of songs to place in the target playlist
    #[clap(long, default_value_t = 20)]
    pub songs: usize,

    /// Id of an existing playlist to refill
    #[clap(long)]
    pub target: Option<String>,

    /// Create a new private playlist with this name and use it as the target
    /// (takes priority over --target)
    #[clap(long)]
    pub new_playlist: Option<String>,

    /// Source playlist id; can be repeated
    #[clap(long = "source", action = ArgAction::Append, num_args = 1, conflicts_with = "random")]
    pub sources: Vec<String>,

    /// Draw tracks from this many randomly chosen playlists instead of
    /// explicit sources, skipping recently used ones
    #[clap(long)]
    pub random: Option<usize>,

    /// Also draw from your liked songs
    #[clap(long)]
    pub include_liked: bool,
}

#[derive(Parser, Debug, Clone)]
#[command(
    about = "Inspect or edit the playlist exclusion list",
    args_conflicts_with_subcommands = true
)]
pub struct ExclusionsOptions {
    /// Subcommands under `exclusions` (e.g., `remove`, `clear`)
    #[command(subcommand)]
    pub command: Option<ExclusionsSubcommand>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ExclusionsSubcommand {
    /// Remove a playlist from all exclusion runs
    Remove(ExclusionsRemoveOpts),

    /// Clear the entire playlist exclusion list
    Clear,
}

#[derive(Parser, Debug, Clone)]
pub struct ExclusionsRemoveOpts {
    /// Playlist id to release
    pub playlist_id: String,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    let cli = Cli::parse();

    match cli.command {
        Command::Auth => {
            let oauth_result: Arc<Mutex<Option<PkceToken>>> = Arc::new(Mutex::new(None));
            cli::auth(Arc::clone(&oauth_result)).await;
        }

        Command::Shuffle(opt) => {
            cli::shuffle(
                opt.songs,
                opt.target,
                opt.new_playlist,
                opt.sources,
                opt.random,
                opt.include_liked,
            )
            .await
        }

        Command::Exclusions(opt) => match opt.command {
            Some(ExclusionsSubcommand::Remove(r)) => cli::remove_exclusion(r.playlist_id).await,
            Some(ExclusionsSubcommand::Clear) => cli::clear_exclusions().await,
            None => cli::list_exclusions().await,
        },

        Command::Completions(opt) => {
            let mut cmd = Cli::command_for_update();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}
