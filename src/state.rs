use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{
    core::{
        embeddings::{FeatureExtractor, Normalization},
        similarity::ImageComparator,
    },
    error::Result,
    utils::{env_opt, env_or},
};

/// Configuration for the application
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Address to bind
    pub host: IpAddr,
    /// Port to bind
    pub port: u16,
    /// Path to the ResNet-18 weights (`.ot`)
    pub model_weights: PathBuf,
    /// `auto`, `cpu`, `cuda` or `cuda:N`
    pub device: String,
    /// Pixel scaling applied before the forward pass
    pub normalization: Normalization,
    /// Maximum request body size in bytes
    pub max_upload_bytes: usize,
    /// Optional directory with a static front-end
    pub static_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8000,
            model_weights: PathBuf::from("models/resnet18.ot"),
            device: String::from("auto"),
            normalization: Normalization::UnitRange,
            max_upload_bytes: 20 * 1024 * 1024, // two 10MB photos
            static_dir: None,
        }
    }
}

impl Config {
    /// Builds a configuration from `IMAGESIM_*` environment variables.
    ///
    /// Unset variables keep their [`Default`] values. A `.env` file, if
    /// present, is read first.
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenv::dotenv() {
            log::debug!("Loaded environment from {}", path.display());
        }

        let defaults = Self::default();
        Ok(Self {
            host: env_or("IMAGESIM_HOST", defaults.host)?,
            port: env_or("IMAGESIM_PORT", defaults.port)?,
            model_weights: env_or("IMAGESIM_MODEL_WEIGHTS", defaults.model_weights)?,
            device: env_or("IMAGESIM_DEVICE", defaults.device)?,
            normalization: env_or("IMAGESIM_NORMALIZE", defaults.normalization)?,
            max_upload_bytes: env_or("IMAGESIM_MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
            static_dir: env_opt("IMAGESIM_STATIC_DIR").map(PathBuf::from),
        })
    }

    /// Socket address the server listens on
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Application state that can be shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Application configuration
    pub config: Config,
    /// Shared model wrapped in the comparison pipeline
    pub comparator: ImageComparator,
    /// When the state was built
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Create application state around an already loaded extractor
    pub fn new(config: Config, extractor: Arc<dyn FeatureExtractor>) -> Arc<Self> {
        Arc::new(Self {
            config,
            comparator: ImageComparator::new(extractor),
            started_at: Utc::now(),
        })
    }

    #[cfg(feature = "embeddings")]
    /// Load the ResNet-18 extractor named by `config` and build the state
    pub fn load(config: Config) -> Result<Arc<Self>> {
        use crate::core::embeddings::{DeviceSpec, ResNetExtractor};

        let device: DeviceSpec = config.device.parse()?;
        let extractor =
            ResNetExtractor::load(&config.model_weights, device, config.normalization)?;
        Ok(Self::new(config, Arc::new(extractor)))
    }
}
