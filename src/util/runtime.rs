use std::path::PathBuf;

/// Directory for mutable application data (settings, synthesised audio).
pub fn runtime_dir() -> PathBuf {
    if let Ok(path) = std::env::var("READABLE_RUNTIME_DIR") {
        let candidate = PathBuf::from(path);
        if candidate.components().next().is_some() {
            return candidate;
        }
    }
    PathBuf::from("runtime")
}
