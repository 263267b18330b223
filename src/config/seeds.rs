use crate::url::normalize_url;
use crate::ConfigError;
use std::path::Path;

/// Loads seed URLs from a `.txt` file, one URL per line
///
/// Blank lines and `#` comments are skipped. Lines that are not absolute
/// http(s) URLs with a host are dropped with a warning; the surviving lines
/// are returned as written (normalization happens in the frontier).
///
/// # Errors
///
/// * `ConfigError::SeedExtension` - the path does not end in `.txt`
/// * `ConfigError::SeedFile` - the file cannot be read
/// * `ConfigError::NoSeeds` - no valid seed remains
pub fn load_seeds(path: &Path) -> Result<Vec<String>, ConfigError> {
    let display = path.display().to_string();

    if path.extension().and_then(|ext| ext.to_str()) != Some("txt") {
        return Err(ConfigError::SeedExtension(display));
    }

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::SeedFile {
        path: display.clone(),
        source,
    })?;

    let seeds = parse_seeds(&content);
    if seeds.is_empty() {
        return Err(ConfigError::NoSeeds(display));
    }

    Ok(seeds)
}

/// Extracts the valid seed lines from seed file content
pub fn parse_seeds(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter(|line| match normalize_url(line) {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("Ignoring invalid seed {}: {}", line, e);
                false
            }
        })
        .map(str::to_string)
        .collect()
}
