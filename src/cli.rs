// Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "beatscope")]
#[command(about = "Terminal step sequencer with a spectrogram recorder", long_about = None)]
pub struct Args {
    /// Project directory; takes and settings live here (default: cwd)
    #[arg(value_name = "DIR")]
    pub project_dir: Option<PathBuf>,

    /// Sequencer tempo in beats per minute (16th-note steps)
    #[arg(long, value_name = "BPM")]
    pub bpm: Option<f32>,

    /// Seed for the beat generator, for reproducible beats
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Run without opening audio devices
    #[arg(long)]
    pub no_audio: bool,
}

impl Args {
    pub fn project_dir(&self) -> PathBuf {
        self.project_dir
            .clone()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_default())
    }

    /// Settings for this run: the stored config with the flags laid over it.
    /// The stored config itself is left alone, so flags never end up saved.
    pub fn overlay(&self, stored: &Config) -> Config {
        let mut config = stored.clone();
        if let Some(bpm) = self.bpm {
            config.set_bpm(bpm);
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        config
    }
}
