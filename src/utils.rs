use std::fs;
use std::path::Path;

pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Random lowercase hex token of `len` characters (at most 32).
pub fn random_token(len: usize) -> String {
    let raw = format!("{:032x}", rand::random::<u128>());
    raw[..len.min(raw.len())].to_string()
}
