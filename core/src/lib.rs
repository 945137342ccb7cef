pub mod api;
pub mod config;
pub mod error;
pub mod http;
pub mod router;
pub mod session;
pub mod storage;
pub mod stream;
pub mod telemetry;

pub use config::ClientConfig;
pub use error::{ApiError, ApiResult};
pub use http::{ApiClient, ScriptedTransport, Transport};
pub use router::{decide, resolve, NavigationDecision, ResolvedRoute, RouteMeta};
pub use session::{ActionOutcome, Role, SessionSnapshot, SessionStore, UserProfile};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use stream::{ChatStream, StreamEvent};
