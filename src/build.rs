mod document;
mod library;
mod markdown;
mod paths;
pub mod pipeline;
mod watch;

pub use library::Library;
pub use paths::output_path;
pub use watch::{ChangeKind, FileWatcher, WatchEvent, WatchPaths};
