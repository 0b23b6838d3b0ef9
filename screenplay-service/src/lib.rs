pub mod errors;
pub mod middleware;
pub mod service;
pub mod settings;

pub use errors::{ApiError, ApiResult, ErrorResponse};
pub use middleware::{CORRELATION_ID_HEADER, DEBUG_HEADER, DebugMode};
pub use service::{AppState, build_router, create_app};
pub use settings::ServiceSettings;
