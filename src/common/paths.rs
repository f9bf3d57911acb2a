use std::path::PathBuf;

/// Config file locations, most specific first: user config dir, then the
/// system-wide path.
pub fn config_file_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(config_dir) = dirs::config_dir() {
        candidates.push(config_dir.join("facegate").join("config.toml"));
    }
    candidates.push(PathBuf::from("/etc/facegate/config.toml"));
    candidates
}
