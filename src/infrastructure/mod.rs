pub mod logging;
pub mod skip_log;

pub use logging::{Logger, LoggerTrait};
pub use skip_log::SkipRecorder;
