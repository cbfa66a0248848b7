use std::path::Path;
use uuid::Uuid;

/// 8-hex-char token; embedded in every artifact file name owned by one
/// generation request.
pub fn new_cert_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// Short random suffix for bulk archive names.
pub fn new_archive_suffix() -> String {
    Uuid::new_v4().simple().to_string()[..6].to_string()
}

/// Strip anything that could escape the upload directory from a client
/// supplied file name.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches('.').to_string();
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

pub fn ensure_dirs(upload_folder: &Path, generated_folder: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(upload_folder)?;
    std::fs::create_dir_all(generated_folder)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cert_ids_are_8_hex_chars() {
        let id = new_cert_id();
        assert_eq!(id.len(), 8);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn cert_ids_are_unique() {
        assert_ne!(new_cert_id(), new_cert_id());
    }

    #[test]
    fn sanitize_strips_traversal() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "_.._etc_passwd");
        assert_eq!(sanitize_filename("logo final.png"), "logo_final.png");
        assert_eq!(sanitize_filename(""), "upload");
    }
}
