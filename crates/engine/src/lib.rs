//! Job execution for the car-buying analysis service: the in-memory job
//! registry, the background executor, and the external analysis
//! collaborator it drives.

pub mod analysis;
pub mod executor;
pub mod registry;

pub use analysis::{
    AnalysisEngine, AnalysisError, AnalysisFactory, AnalysisInputs, AnalysisVariant,
    EngineConfig, EngineFactory,
};
pub use executor::JobExecutor;
pub use registry::{JobRegistry, RegistryError, RetentionPolicy};
