use crate::{Error, Result, CONFIG};
use guid_create::GUID;
use heck::KebabCase;
use std::{
    fs::{self, DirBuilder},
    path::{Path, PathBuf},
};
use tracing::warn;

pub const USER_UPLOAD_DIRECTORY: &str = "uploads/users";
pub const POST_UPLOAD_DIRECTORY: &str = "uploads/post";

/// Magic-byte check; the upload endpoints reject anything that isn't one of
/// the formats we serve back as a photo.
pub fn is_image(bytes: &[u8]) -> bool {
    bytes.starts_with(b"\x89PNG\r\n\x1a\n")
        || bytes.starts_with(b"\xff\xd8\xff")
        || bytes.starts_with(b"GIF87a")
        || bytes.starts_with(b"GIF89a")
        || (bytes.len() > 12 && bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP")
}

fn extension_for(filename: Option<&str>) -> String {
    filename
        .and_then(|f| f.rsplit('.').next())
        .map(|ext| ext.to_lowercase())
        .unwrap_or_else(|| String::from("png"))
}

/// Full filesystem path for a stored relative path.
pub fn local_path(relative: &str) -> PathBuf {
    Path::new(&CONFIG.media_directory).join(relative)
}

/// Writes an uploaded photo under `directory` (one of the `*_UPLOAD_DIRECTORY`
/// constants), named after a slug of the owning entity plus a random
/// identifier, and returns the relative path to store in the database.
pub fn save_image(
    directory: &str,
    owner_name: &str,
    filename: Option<&str>,
    bytes: &[u8],
) -> Result<String> {
    if !is_image(bytes) {
        return Err(Error::InvalidImage);
    }

    let name = format!(
        "{}-{}.{}",
        owner_name.to_kebab_case(),
        GUID::rand(),
        extension_for(filename)
    );
    let relative = format!("{}/{}", directory, name);

    let dest = local_path(&relative);
    if let Some(parent) = dest.parent() {
        DirBuilder::new().recursive(true).create(parent)?;
    }
    fs::write(&dest, bytes)?;
    Ok(relative)
}

/// Best-effort removal of a replaced or deleted photo. A file that is
/// already gone is fine; anything else is logged and otherwise ignored so
/// a disk hiccup never blocks the row mutation that triggered it.
pub fn delete_file(relative: &str) {
    if let Err(err) = fs::remove_file(local_path(relative)) {
        if err.kind() != std::io::ErrorKind::NotFound {
            warn!("Couldn't remove media file {}: {}", relative, err);
        }
    }
}
