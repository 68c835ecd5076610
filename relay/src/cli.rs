use clap::{Parser, Subcommand};

/// Movie relay — local movie collection plus a TMDB proxy
#[derive(Parser)]
#[command(name = "movie-relay", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to bind (defaults to RELAY_PORT, then 5000)
        #[arg(short, long)]
        port: Option<u16>,

        /// Keep movies in memory instead of PostgreSQL
        #[arg(long)]
        ephemeral: bool,
    },

    /// Apply database migrations and exit
    Migrate,
}
