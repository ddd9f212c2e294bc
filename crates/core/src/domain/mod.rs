mod metadata;
mod request;
mod run;

pub use metadata::VideoMetadata;
pub use request::RunRequest;
pub use run::{RunConfig, VideoFormat, Visibility};
