// Adapters - External system implementations

pub mod exec_ffmpeg;
pub mod fs_local;
pub mod probe_ffprobe;
pub mod tool_resolver;
pub mod toml_config;
pub mod tracing_log;

// Re-export adapters
pub use exec_ffmpeg::FfmpegExecAdapter;
pub use fs_local::LocalFsAdapter;
pub use probe_ffprobe::FfprobeAdapter;
pub use tool_resolver::ToolResolver;
pub use toml_config::TomlConfigAdapter;
pub use tracing_log::{LogFormat, TracingLogAdapter};
