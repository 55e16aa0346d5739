use image::{imageops::FilterType, DynamicImage};
use ndarray::Array3;
use std::str::FromStr;

use crate::error::{AppError, Result};

/// Side length of the square network input.
pub const INPUT_SIZE: u32 = 224;

/// Length of the ResNet-18 output vector (ImageNet classes).
pub const EMBEDDING_DIM: usize = 1000;

const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Turns a decoded image into an embedding.
///
/// Implementations must be shareable between request handlers; the server
/// holds exactly one behind an `Arc`.
pub trait FeatureExtractor: Send + Sync {
    /// Runs a single forward pass and returns the flattened output.
    fn extract(&self, image: &DynamicImage) -> Result<Vec<f32>>;

    /// Short identifier reported by the health endpoint.
    fn name(&self) -> &str;
}

/// How pixel values are scaled before the forward pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Normalization {
    /// Channels in [0, 1]
    #[default]
    UnitRange,
    /// [0, 1] followed by ImageNet mean/std standardization
    ImageNet,
}

impl FromStr for Normalization {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "unit" | "unit_range" => Ok(Self::UnitRange),
            "imagenet" => Ok(Self::ImageNet),
            other => Err(AppError::Config(format!(
                "unknown normalization {:?} (expected \"unit\" or \"imagenet\")",
                other
            ))),
        }
    }
}

/// Resizes to `INPUT_SIZE`x`INPUT_SIZE` and lays the pixels out as a CHW array.
pub fn preprocess(image: &DynamicImage, normalization: Normalization) -> Array3<f32> {
    let side = INPUT_SIZE as usize;
    let rgb = image
        .resize_exact(INPUT_SIZE, INPUT_SIZE, FilterType::Triangle)
        .to_rgb8();

    let mut chw = Array3::<f32>::zeros((3, side, side));
    for (x, y, pixel) in rgb.enumerate_pixels() {
        for c in 0..3 {
            let mut value = pixel[c] as f32 / 255.0;
            if normalization == Normalization::ImageNet {
                value = (value - IMAGENET_MEAN[c]) / IMAGENET_STD[c];
            }
            chw[[c, y as usize, x as usize]] = value;
        }
    }
    chw
}

#[cfg(feature = "embeddings")]
pub use self::resnet::{DeviceSpec, ResNetExtractor};

#[cfg(feature = "embeddings")]
mod resnet {
    use super::*;
    use std::path::Path;
    use std::sync::Mutex;
    use tch::{nn, nn::ModuleT, vision, Device, Tensor};

    /// Where the network runs
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub enum DeviceSpec {
        /// CUDA when available, CPU otherwise
        #[default]
        Auto,
        /// Always the CPU
        Cpu,
        /// A specific CUDA device
        Cuda(usize),
    }

    impl DeviceSpec {
        fn resolve(self) -> Device {
            match self {
                Self::Auto => Device::cuda_if_available(),
                Self::Cpu => Device::Cpu,
                Self::Cuda(index) => Device::Cuda(index),
            }
        }
    }

    impl FromStr for DeviceSpec {
        type Err = AppError;

        fn from_str(s: &str) -> Result<Self> {
            let s = s.trim().to_lowercase();
            match s.as_str() {
                "auto" => Ok(Self::Auto),
                "cpu" => Ok(Self::Cpu),
                "cuda" => Ok(Self::Cuda(0)),
                other => other
                    .strip_prefix("cuda:")
                    .and_then(|index| index.parse().ok())
                    .map(Self::Cuda)
                    .ok_or_else(|| AppError::Config(format!("unknown device {:?}", other))),
            }
        }
    }

    struct Network {
        // Owns the weights the closure in `net` refers to
        _vs: nn::VarStore,
        net: nn::FuncT<'static>,
    }

    /// ResNet-18 with ImageNet weights, using the 1000 pre-softmax logits as the embedding
    pub struct ResNetExtractor {
        network: Mutex<Network>,
        device: Device,
        normalization: Normalization,
    }

    impl std::fmt::Debug for ResNetExtractor {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("ResNetExtractor")
                .field("device", &self.device)
                .field("normalization", &self.normalization)
                .finish_non_exhaustive()
        }
    }

    impl ResNetExtractor {
        /// Loads ResNet-18 weights (a `.ot` file as distributed with tch) onto `device`.
        pub fn load<P: AsRef<Path>>(
            weights: P,
            device: DeviceSpec,
            normalization: Normalization,
        ) -> Result<Self> {
            let weights = weights.as_ref();
            if !weights.exists() {
                return Err(AppError::Model(format!(
                    "weights file {} not found",
                    weights.display()
                )));
            }

            let device = device.resolve();
            let mut vs = nn::VarStore::new(device);
            let net = vision::resnet::resnet18(&vs.root(), vision::imagenet::CLASS_COUNT);
            vs.load(weights)?;
            log::info!("Loaded ResNet-18 from {} on {:?}", weights.display(), device);

            Ok(Self {
                network: Mutex::new(Network { _vs: vs, net }),
                device,
                normalization,
            })
        }

        fn to_input(&self, image: &DynamicImage) -> Result<Tensor> {
            let chw = preprocess(image, self.normalization);
            let data = chw.as_slice().ok_or_else(|| {
                AppError::Internal("preprocessed array is not contiguous".to_string())
            })?;
            let side = INPUT_SIZE as i64;
            Ok(Tensor::of_slice(data)
                .reshape(&[1, 3, side, side])
                .to_device(self.device))
        }
    }

    impl FeatureExtractor for ResNetExtractor {
        fn extract(&self, image: &DynamicImage) -> Result<Vec<f32>> {
            let input = self.to_input(image)?;
            let network = self
                .network
                .lock()
                .map_err(|_| AppError::Model("model mutex poisoned".to_string()))?;

            let output = tch::no_grad(|| network.net.forward_t(&input, false));
            let embedding = Vec::<f32>::try_from(output.flatten(0, -1).to_device(Device::Cpu))?;
            Ok(embedding)
        }

        fn name(&self) -> &str {
            "resnet18"
        }
    }
}
