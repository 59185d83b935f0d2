//! Detection of Blender-authored source files

use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Creator string written into the header of Blender's FBX exports
pub const BLENDER_CREATOR_ID: &str = "Blender (stable FBX IO)";

/// Bytes of an FBX header searched for the creator string
pub const HEADER_LEN: usize = 512;

/// Where a model file came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Native `.blend` file
    BlendFile,
    /// FBX exported by Blender
    BlenderFbx,
    /// FBX from another tool
    OtherFbx,
    /// Any other format
    Other,
}

impl SourceKind {
    /// Classify from the path and the first bytes of the file
    pub fn detect(path: &Path, header: &[u8]) -> Self {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("blend") => Self::BlendFile,
            Some("fbx") => {
                let header = &header[..header.len().min(HEADER_LEN)];
                let creator = BLENDER_CREATOR_ID.as_bytes();
                if header.windows(creator.len()).any(|window| window == creator) {
                    Self::BlenderFbx
                } else {
                    Self::OtherFbx
                }
            }
            _ => Self::Other,
        }
    }

    /// Classify a file on disk, reading at most [`HEADER_LEN`] bytes of FBX files
    pub fn sniff_file(path: &Path) -> std::io::Result<Self> {
        let is_fbx = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("fbx"));
        if !is_fbx {
            return Ok(Self::detect(path, &[]));
        }
        let mut header = Vec::with_capacity(HEADER_LEN);
        File::open(path)?.take(HEADER_LEN as u64).read_to_end(&mut header)?;
        Ok(Self::detect(path, &header))
    }

    /// Whether the file was authored in Blender
    pub fn is_blender(self) -> bool {
        matches!(self, Self::BlendFile | Self::BlenderFbx)
    }
}
