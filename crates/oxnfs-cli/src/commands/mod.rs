pub mod cat;
pub mod ls;
pub mod meta;
pub mod mkdir;
pub mod mv;
pub mod rm;
pub mod touch;
pub mod write;

/// Normalize a share path to have a leading slash and no trailing slash
pub fn normalize_path(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    format!("/{trimmed}")
}
