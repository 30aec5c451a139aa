/// App context
pub mod app_context;
/// TTL single-flight cache
pub mod cache;
/// Constants
pub mod constants;
/// Logger
pub mod logger;
/// Router deadlines
pub mod time;
