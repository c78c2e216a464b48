// Host settings, kept in <project_dir>/.beatscope/config.json.
// Loaded on startup and written back on quit. Patterns are not saved.
use std::path::{Path, PathBuf};
use std::time::Duration;

use beatscope::audio::{RenderOptions, SpectrogramConfig};
use serde::{Deserialize, Serialize};

const BEATSCOPE_DIR: &str = ".beatscope";
const CONFIG_FILE: &str = "config.json";
const LOG_FILE: &str = "beatscope.log";

const MIN_BPM: f32 = 20.0;
const MAX_BPM: f32 = 300.0;
const STEPS_PER_BEAT: f32 = 4.0; // 16th notes

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bpm: f32,
    pub container: String, // file name of the recorded take
    pub spectrogram: SpectrogramConfig,
    pub image: RenderOptions,
    pub seed: Option<u64>, // fixed beat seed; random each run if unset
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bpm: 120.0,
            container: String::from("temp_audio.wav"),
            spectrogram: SpectrogramConfig::default(),
            image: RenderOptions::default(),
            seed: None,
        }
    }
}

impl Config {
    pub fn set_bpm(&mut self, bpm: f32) {
        self.bpm = if bpm.is_finite() {
            bpm.clamp(MIN_BPM, MAX_BPM)
        } else {
            120.0
        };
    }

    // time between two sequencer ticks
    pub fn step_interval(&self) -> Duration {
        Duration::from_secs_f32(60.0 / self.bpm.clamp(MIN_BPM, MAX_BPM) / STEPS_PER_BEAT)
    }

    pub fn container_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.container)
    }
}

pub fn state_dir(project_dir: &Path) -> PathBuf {
    project_dir.join(BEATSCOPE_DIR)
}

pub fn log_file_path(project_dir: &Path) -> PathBuf {
    state_dir(project_dir).join(LOG_FILE)
}

// <project_dir>/.beatscope/config.json
fn config_file_path(project_dir: &Path) -> PathBuf {
    state_dir(project_dir).join(CONFIG_FILE)
}

pub fn load_config(project_dir: &Path) -> Option<Config> {
    let path = config_file_path(project_dir);
    let data = std::fs::read_to_string(&path).ok()?;
    match serde_json::from_str::<Config>(&data) {
        Ok(mut config) => {
            config.set_bpm(config.bpm);
            Some(config)
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable config");
            None
        }
    }
}

// Save the config, making .beatscope/ if it doesn't exist already
pub fn save_config(project_dir: &Path, config: &Config) -> anyhow::Result<()> {
    let path = config_file_path(project_dir);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(&path, json)?;
    Ok(())
}
