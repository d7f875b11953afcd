//! Configuration types.
//!
//! Everything here is process-wide and immutable once the server starts.
//! Sessions receive it behind an `Arc` and never mutate it.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::geometry::EngineConfig;

/// Prefix for every environment variable read by [`StreamConfig::from_env`].
pub const ENV_PREFIX: &str = "SIGN_STREAM_";

/// Which classifier strategy a session runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClassifierBackend {
    /// Hand landmarks + geometric rules + temporal stabilizer.
    #[default]
    Rule,
    /// End-to-end neural model over a window of frames.
    Clip,
}

impl std::fmt::Display for ClassifierBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rule => write!(f, "rule"),
            Self::Clip => write!(f, "clip"),
        }
    }
}

impl FromStr for ClassifierBackend {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rule" | "rules" | "geometry" => Ok(Self::Rule),
            "clip" | "neural" => Ok(Self::Clip),
            other => Err(format!("Unknown classifier backend: {}", other)),
        }
    }
}

/// Options handed to the hand-landmark engine when a session creates it.
#[derive(Debug, Clone)]
pub struct LandmarkerConfig {
    /// Maximum number of hands the engine reports per frame.
    pub max_hands: usize,
    pub min_detection_confidence: f32,
    pub min_presence_confidence: f32,
    pub min_tracking_confidence: f32,
    /// Model asset for engines that load one from disk.
    pub model_path: Option<PathBuf>,
}

impl Default for LandmarkerConfig {
    fn default() -> Self {
        Self {
            max_hands: 2,
            min_detection_confidence: 0.5,
            min_presence_confidence: 0.5,
            min_tracking_confidence: 0.5,
            model_path: None,
        }
    }
}

/// Temporal stabilizer settings.
#[derive(Debug, Clone)]
pub struct StabilizerConfig {
    /// Number of raw labels kept in history (nulls included).
    pub history_len: usize,
    /// Minimum plurality count for a label to be reported as stable.
    pub min_votes: usize,
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        Self {
            history_len: 7,
            min_votes: 4,
        }
    }
}

/// Clip (neural) backend settings.
#[derive(Debug, Clone)]
pub struct ClipConfig {
    /// Frames per inference window.
    pub window: usize,
    /// Minimum top-1 probability for a result to be reported.
    pub threshold: f32,
    /// How many ranked labels the model result keeps.
    pub top_k: usize,
    /// `<index>\t<label>` class list file.
    pub class_list: Option<PathBuf>,
}

impl Default for ClipConfig {
    fn default() -> Self {
        Self {
            window: 32,
            threshold: 0.5,
            top_k: 1,
            class_list: None,
        }
    }
}

/// Server and per-session pipeline configuration.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// HTTP/WebSocket listen port.
    pub port: u16,
    pub backend: ClassifierBackend,
    /// Minimum time between two classifications. Zero disables admission control.
    pub infer_interval: Duration,
    /// Interval between keepalive pings sent to the client.
    pub keepalive_interval: Duration,
    /// How long the processing loop waits for a frame before doing housekeeping.
    pub recv_timeout: Duration,
    /// Minimum time between two emissions of the same label.
    pub emit_cooldown: Duration,
    /// Decoded frames are resized to this width.
    pub frame_width: u32,
    /// Decoded frames are resized to this height.
    pub frame_height: u32,
    /// Upper bound on waiting for the classifier worker to close its engine.
    pub shutdown_timeout: Duration,
    pub stabilizer: StabilizerConfig,
    pub clip: ClipConfig,
    pub landmarker: LandmarkerConfig,
    pub engine: EngineConfig,
    /// Verbose per-frame logging.
    pub debug: bool,
    /// Directory for rolling JSON log files (stderr only when unset).
    pub log_dir: Option<PathBuf>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            backend: ClassifierBackend::Rule,
            infer_interval: Duration::ZERO,
            keepalive_interval: Duration::from_secs(10),
            recv_timeout: Duration::from_secs(2),
            emit_cooldown: Duration::from_millis(800),
            frame_width: 224,
            frame_height: 224,
            shutdown_timeout: Duration::from_secs(5),
            stabilizer: StabilizerConfig::default(),
            clip: ClipConfig::default(),
            landmarker: LandmarkerConfig::default(),
            engine: EngineConfig::default(),
            debug: false,
            log_dir: None,
        }
    }
}

impl StreamConfig {
    /// Load configuration from `SIGN_STREAM_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// Keys are passed with the [`ENV_PREFIX`] already applied. Unset keys
    /// fall back to defaults; set but unparsable keys are an error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = EnvReader { lookup };
        let defaults = Self::default();

        let backend = env
            .parse::<ClassifierBackend>("BACKEND")?
            .unwrap_or(defaults.backend);

        // The clip backend is expensive per inference; the rule backend runs every frame.
        let default_interval = match backend {
            ClassifierBackend::Rule => Duration::ZERO,
            ClassifierBackend::Clip => Duration::from_millis(350),
        };

        let config = Self {
            port: env.parse("PORT")?.unwrap_or(defaults.port),
            backend,
            infer_interval: env
                .parse::<u64>("INFER_INTERVAL_MS")?
                .map(Duration::from_millis)
                .unwrap_or(default_interval),
            keepalive_interval: env
                .parse::<u64>("KEEPALIVE_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.keepalive_interval),
            recv_timeout: env
                .parse::<u64>("RECV_TIMEOUT_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.recv_timeout),
            emit_cooldown: env
                .parse::<u64>("EMIT_COOLDOWN_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.emit_cooldown),
            frame_width: env.parse("FRAME_WIDTH")?.unwrap_or(defaults.frame_width),
            frame_height: env.parse("FRAME_HEIGHT")?.unwrap_or(defaults.frame_height),
            shutdown_timeout: env
                .parse::<u64>("SHUTDOWN_TIMEOUT_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.shutdown_timeout),
            stabilizer: StabilizerConfig {
                history_len: env
                    .parse("HISTORY_LEN")?
                    .unwrap_or(defaults.stabilizer.history_len),
                min_votes: env
                    .parse("MIN_VOTES")?
                    .unwrap_or(defaults.stabilizer.min_votes),
            },
            clip: ClipConfig {
                window: env.parse("CLIP_WINDOW")?.unwrap_or(defaults.clip.window),
                threshold: env
                    .parse("CLIP_THRESHOLD")?
                    .unwrap_or(defaults.clip.threshold),
                top_k: env.parse("CLIP_TOPK")?.unwrap_or(defaults.clip.top_k),
                class_list: env.path("CLASS_LIST"),
            },
            landmarker: LandmarkerConfig {
                max_hands: env
                    .parse("MAX_HANDS")?
                    .unwrap_or(defaults.landmarker.max_hands),
                min_detection_confidence: env
                    .parse("MIN_DETECTION_CONFIDENCE")?
                    .unwrap_or(defaults.landmarker.min_detection_confidence),
                min_presence_confidence: env
                    .parse("MIN_PRESENCE_CONFIDENCE")?
                    .unwrap_or(defaults.landmarker.min_presence_confidence),
                min_tracking_confidence: env
                    .parse("MIN_TRACKING_CONFIDENCE")?
                    .unwrap_or(defaults.landmarker.min_tracking_confidence),
                model_path: env.path("HAND_TASK_PATH"),
            },
            engine: defaults.engine,
            debug: env.flag("DEBUG"),
            log_dir: env.path("LOG_DIR"),
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject combinations the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_width == 0 || self.frame_height == 0 {
            return Err(invalid("FRAME_WIDTH/FRAME_HEIGHT", "frame size must be non-zero"));
        }
        if self.stabilizer.history_len == 0 {
            return Err(invalid("HISTORY_LEN", "history must hold at least one label"));
        }
        if self.stabilizer.min_votes == 0 || self.stabilizer.min_votes > self.stabilizer.history_len
        {
            return Err(invalid(
                "MIN_VOTES",
                &format!(
                    "must be between 1 and HISTORY_LEN ({})",
                    self.stabilizer.history_len
                ),
            ));
        }
        if self.clip.window == 0 {
            return Err(invalid("CLIP_WINDOW", "window must hold at least one frame"));
        }
        if self.clip.top_k == 0 {
            return Err(invalid("CLIP_TOPK", "top-k must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.clip.threshold) {
            return Err(invalid("CLIP_THRESHOLD", "threshold must be within 0..=1"));
        }
        if self.backend == ClassifierBackend::Clip && self.clip.class_list.is_none() {
            return Err(ConfigError::MissingRequired {
                key: format!("{}CLASS_LIST", ENV_PREFIX),
                hint: "The clip backend needs an `<index>\\t<label>` class list file.".to_string(),
            });
        }
        if self.landmarker.max_hands == 0 {
            return Err(invalid("MAX_HANDS", "engine must report at least one hand"));
        }
        for (key, value) in [
            ("MIN_DETECTION_CONFIDENCE", self.landmarker.min_detection_confidence),
            ("MIN_PRESENCE_CONFIDENCE", self.landmarker.min_presence_confidence),
            ("MIN_TRACKING_CONFIDENCE", self.landmarker.min_tracking_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(key, "confidence must be within 0..=1"));
            }
        }
        if self.keepalive_interval.is_zero() {
            return Err(invalid("KEEPALIVE_SECS", "interval must be non-zero"));
        }
        if self.recv_timeout.is_zero() {
            return Err(invalid("RECV_TIMEOUT_MS", "timeout must be non-zero"));
        }
        Ok(())
    }
}

fn invalid(key: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: format!("{}{}", ENV_PREFIX, key),
        message: message.to_string(),
    }
}

struct EnvReader<F> {
    lookup: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn raw(&self, key: &str) -> Option<String> {
        (self.lookup)(&format!("{}{}", ENV_PREFIX, key))
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse<T>(&self, key: &str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.raw(key) {
            None => Ok(None),
            Some(value) => value
                .parse::<T>()
                .map(Some)
                .map_err(|e| invalid(key, &format!("{:?}: {}", value, e))),
        }
    }

    fn path(&self, key: &str) -> Option<PathBuf> {
        self.raw(key).map(PathBuf::from)
    }

    fn flag(&self, key: &str) -> bool {
        matches!(
            self.raw(key).as_deref(),
            Some("1") | Some("true") | Some("yes") | Some("on")
        )
    }
}
