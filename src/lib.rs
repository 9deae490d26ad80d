pub mod chunker;
pub mod error;
pub mod extraction;
pub mod fallback;
pub mod history;
pub mod languages;
pub mod logging;
pub mod pipeline;
pub mod providers;
pub mod server;
pub mod settings;

pub use error::{ChunkError, ExtractError, PersistenceError, PipelineError, ProviderError};
pub use fallback::{Fallback, invoke_with_fallback};
pub use history::{TranslationLog, TranslationRecord};
pub use pipeline::{
    Coordinator, PipelineRequest, PipelineResult, SynthesizedAudio, TaskInput, TaskKind,
};
pub use providers::{GatewayFuture, HuggingFace, ModelGateway};
pub use settings::Settings;
