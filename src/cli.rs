use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

use janus::{Key, Mode, SearchEvent};

#[derive(Parser)]
#[command(name = "janus")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Scramble, unscramble and crack row-permuted video frames", long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// JSON configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scramble the rows of an image
    Scramble {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        key: KeyArgs,
    },

    /// Restore an image scrambled with a known key
    Unscramble {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        key: KeyArgs,
    },

    /// Recover the key of a scrambled image by brute force
    Crack {
        #[arg(short, long)]
        input: PathBuf,

        /// Where to write the image descrambled with the best key
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Largest R tried
        #[arg(long)]
        r_max: Option<u32>,

        /// Largest S tried
        #[arg(long)]
        s_max: Option<u32>,

        /// Worker threads
        #[arg(short, long)]
        threads: Option<usize>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Play a directory of frames through the scrambler
    Play {
        /// Directory of png/jpg frames, played in file name order
        #[arg(short, long)]
        input: PathBuf,

        /// Directory receiving the transformed frames
        #[arg(short, long)]
        output: PathBuf,

        #[arg(short, long, value_enum, default_value_t = ModeArg::Passthrough)]
        mode: ModeArg,

        #[command(flatten)]
        key: KeyArgs,

        /// Search the key on the first frame while playing, then restart descrambled
        #[arg(long)]
        crack_first: bool,

        /// Milliseconds between frames
        #[arg(long)]
        cadence_ms: Option<u64>,
    },
}

#[derive(Args)]
pub struct KeyArgs {
    /// Key offset R (empty means 0)
    #[arg(short = 'r', default_value = "0", allow_hyphen_values = true)]
    pub r: String,

    /// Key step parameter S (empty means 0)
    #[arg(short = 's', default_value = "0", allow_hyphen_values = true)]
    pub s: String,
}

impl KeyArgs {
    pub fn key(&self) -> janus::Result<Key> {
        Key::parse(&self.r, &self.s)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Passthrough,
    Forward,
    Inverse,
}

impl From<ModeArg> for Mode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Passthrough => Mode::Passthrough,
            ModeArg::Forward => Mode::Forward,
            ModeArg::Inverse => Mode::Inverse,
        }
    }
}

/// Progress bar fed by search events.
pub struct SearchReporter {
    bar: ProgressBar,
}

impl SearchReporter {
    pub fn new(total: u64) -> Result<Self> {
        let bar = ProgressBar::new(total);
        bar.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{msg}\n{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} keys ({eta})",
                )?
                .progress_chars("#>-"),
        );
        bar.set_message("Searching key space...");
        Ok(Self { bar })
    }

    pub fn observe(&self, event: &SearchEvent) {
        match event {
            SearchEvent::Improved(update) => {
                self.bar.set_message(format!(
                    "Best so far {} | score {:.1}",
                    update.key, update.score
                ));
            }
            SearchEvent::Progress(progress) => {
                self.bar.set_position(progress.evaluated as u64);
            }
            SearchEvent::Finished(result) => {
                self.bar.set_position(result.evaluated as u64);
            }
        }
    }

    pub fn finish(&self, message: String) {
        self.bar.finish_with_message(message);
    }

    pub fn abandon(&self, message: String) {
        self.bar.abandon_with_message(message);
    }
}
