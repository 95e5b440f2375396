use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use crate::error::{IoError, OchreResult};

/// A fully written `.tmp` sibling awaiting its atomic rename. Callers stage
/// every artifact of a run first and commit them together, so a failure
/// mid-export leaves nothing at the final paths.
pub(crate) struct StagedFile {
    tmp_path: PathBuf,
    final_path: PathBuf,
}

/// Writes `bytes` to `<dir>/<file_name>.tmp`, creating `dir` if absent.
pub(crate) fn stage(dir: &Path, file_name: &str, bytes: &[u8]) -> OchreResult<StagedFile> {
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(|e| {
            IoError::FileSystem(format!("Failed to create directory {}: {e}", dir.display()))
        })?;
    }

    let final_path = dir.join(file_name);
    let tmp_path = dir.join(format!("{file_name}.tmp"));

    if let Err(e) = File::create(&tmp_path).and_then(|mut file| file.write_all(bytes)) {
        let _ = fs::remove_file(&tmp_path);
        return Err(IoError::WriteFailed(format!(
            "Failed to write {}: {e}",
            final_path.display()
        ))
        .into());
    }

    Ok(StagedFile {
        tmp_path,
        final_path,
    })
}

impl StagedFile {
    /// Renames the staged file into place.
    pub fn commit(self) -> OchreResult<PathBuf> {
        if let Err(e) = fs::rename(&self.tmp_path, &self.final_path) {
            let _ = fs::remove_file(&self.tmp_path);
            return Err(IoError::WriteFailed(format!(
                "Failed to move {} into place: {e}",
                self.final_path.display()
            ))
            .into());
        }
        Ok(self.final_path)
    }

    /// Removes the staged file without publishing it.
    pub fn discard(self) {
        let _ = fs::remove_file(&self.tmp_path);
    }
}

/// Stage-and-commit in one step, for callers with a single artifact.
pub(crate) fn write_atomic(dir: &Path, file_name: &str, bytes: &[u8]) -> OchreResult<PathBuf> {
    stage(dir, file_name, bytes)?.commit()
}
