use std::path::{Path, PathBuf};

use tempfile::TempDir;
use uuid::Uuid;

use crate::errors::AppError;

pub const UPLOAD_FILE_NAME: &str = "uploaded.pdf";
pub const OUTPUT_FILE_NAME: &str = "storyboard_output.pdf";

/// Scratch directory owned by exactly one storyboard request.
///
/// Holds the uploaded PDF and the assembled output under fixed names, inside a
/// directory no other request can see. The directory and everything in it is
/// removed when the workspace is dropped, whichever way the request ends.
#[derive(Debug)]
pub struct RequestWorkspace {
    request_id: Uuid,
    dir: TempDir,
}

impl RequestWorkspace {
    pub fn create() -> Result<Self, AppError> {
        Self::create_in(&std::env::temp_dir())
    }

    pub fn create_in(root: &Path) -> Result<Self, AppError> {
        let request_id = Uuid::new_v4();
        let dir = tempfile::Builder::new()
            .prefix(&format!("storyboard-{request_id}-"))
            .tempdir_in(root)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("creating request workspace: {e}")))?;
        Ok(Self { request_id, dir })
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn input_path(&self) -> PathBuf {
        self.dir.path().join(UPLOAD_FILE_NAME)
    }

    pub fn output_path(&self) -> PathBuf {
        self.dir.path().join(OUTPUT_FILE_NAME)
    }
}
