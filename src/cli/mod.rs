//! CLI module for vidrag.

mod ask;
mod output;
pub mod preflight;

pub use ask::run_ask;
pub use output::Output;

use clap::Parser;

/// vidrag - Ask questions about a video
///
/// Downloads the video's audio, transcribes it, indexes the transcript and
/// answers the query from the most relevant passages. Audio and transcripts
/// are cached, so repeated questions about the same video are cheap.
#[derive(Parser, Debug)]
#[command(name = "vidrag")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Video URL to process (defaults to the configured source)
    #[arg(short, long)]
    pub source: Option<String>,

    /// The question to answer
    pub query: String,
}
