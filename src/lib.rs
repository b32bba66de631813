// Gesture Engine Core - on-device gesture inference pipeline
// Windowing, feature extraction, quantised neural network and debouncing

// Module declarations
pub mod config;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod features;
pub mod inference;
pub mod input;
pub mod model;
pub mod output;
pub mod postprocess;
pub mod sensor;
pub mod testing;
pub mod transport;

// Re-exports for convenience
pub use config::AppConfig;
pub use engine::{GestureEngine, GestureRuntime};
pub use error::{PipelineError, SetupError, Status};
pub use input::{FeedStatus, InputSamples};
pub use model::ModelDescriptor;
pub use output::DecodedOutput;
pub use postprocess::{GestureClass, PredictionEvent};
