pub mod api_key;
pub mod authorize;
pub mod cors;
pub mod exception;
pub mod pipeline;
pub mod response;
pub mod session;

pub use cors::CorsPolicy;
pub use pipeline::{build_pipeline, AccessRule, PipelineConfig, PipelineError, SessionPolicy};
pub use response::{ApiResult, ResponseEnvelope};
