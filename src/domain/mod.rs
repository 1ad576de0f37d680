pub mod video;

pub use video::{MetricsUpdate, Platform, VideoRecord, TITLE_MAX_CHARS};
