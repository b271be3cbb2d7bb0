use std::{
    fs,
    path::{
        Path,
        PathBuf,
    },
};

use chrono::Local;
use log::info;

use crate::core::StudyError;

/// Copy the database into a sibling `backups/` directory, at most once per
/// calendar day. Returns the backup path when a copy was made.
pub fn backup_db(db_path: &Path) -> Result<Option<PathBuf>, StudyError> {
    if !db_path.exists() {
        return Ok(None);
    }

    let backups = db_path.parent().unwrap_or(Path::new(".")).join("backups");
    let stem = db_path.file_stem().and_then(|s| s.to_str()).unwrap_or("study");
    let stamp = Local::now().format("%Y%m%d");
    let dst = backups.join(format!("{stem}-{stamp}.sqlite"));
    if dst.exists() {
        return Ok(None);
    }

    fs::create_dir_all(&backups)?;
    fs::copy(db_path, &dst)?;
    info!("backed up {} to {}", db_path.display(), dst.display());
    Ok(Some(dst))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backs_up_once_per_day() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let db = dir.path().join("study.db");
        fs::write(&db, b"sqlite bytes").expect("seed");

        let first = backup_db(&db).expect("backup").expect("path");
        assert!(first.exists());
        assert!(first.starts_with(dir.path().join("backups")));
        assert_eq!(fs::read(&first).expect("read"), b"sqlite bytes");

        // Same-day second call is a no-op
        assert!(backup_db(&db).expect("backup").is_none());
    }

    #[test]
    fn missing_database_is_not_an_error() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let db = dir.path().join("absent.db");
        assert!(backup_db(&db).expect("backup").is_none());
    }
}
