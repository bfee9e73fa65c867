//! Wallpaper selection: presets, remote URLs and uploaded files.

use crate::config;
use crate::settings::{
    default_wallpaper, BackgroundType, SettingsPartial, UserSettings, Wallpaper, WallpaperFit,
};
use base64::Engine as _;
use std::time::{SystemTime, UNIX_EPOCH};
use url::Url;

const IMAGE_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/svg+xml",
];

const VIDEO_TYPES: &[&str] = &["video/mp4", "video/webm", "video/ogg"];

const VIDEO_EXTENSIONS: &[&str] = &[".mp4", ".webm", ".ogg"];

/// Make `wallpaper` the active background
pub fn apply_preset(wallpaper: &Wallpaper) -> SettingsPartial {
    SettingsPartial {
        background_url: Some(wallpaper.url.clone()),
        background_type: Some(wallpaper.kind),
        ..Default::default()
    }
}

pub fn set_fit(fit: WallpaperFit) -> SettingsPartial {
    SettingsPartial {
        wallpaper_fit: Some(fit),
        ..Default::default()
    }
}

/// Add a remote wallpaper and apply it.
///
/// URLs ending in a video extension are treated as video.
pub fn add_wallpaper_url(current: &UserSettings, url: &str) -> Result<SettingsPartial, WallpaperError> {
    let url = url.trim();
    let parsed = Url::parse(url).map_err(|_| WallpaperError::InvalidUrl(url.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(WallpaperError::UnsupportedProtocol(parsed.scheme().to_string()));
    }

    let lower = url.to_ascii_lowercase();
    let kind = if VIDEO_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
        BackgroundType::Video
    } else {
        BackgroundType::Image
    };

    Ok(add_custom(current, "Custom URL", kind, url.to_string()))
}

/// Add an uploaded file as a data URI wallpaper and apply it.
pub fn add_uploaded_wallpaper(
    current: &UserSettings,
    file_name: &str,
    mime: &str,
    bytes: &[u8],
) -> Result<SettingsPartial, WallpaperError> {
    if bytes.len() > config::MAX_WALLPAPER_FILE_BYTES {
        return Err(WallpaperError::FileTooLarge {
            size: bytes.len(),
            limit: config::MAX_WALLPAPER_FILE_BYTES,
        });
    }

    let mime = mime.trim().to_ascii_lowercase();
    let declared = if VIDEO_TYPES.contains(&mime.as_str()) {
        BackgroundType::Video
    } else if IMAGE_TYPES.contains(&mime.as_str()) {
        BackgroundType::Image
    } else {
        return Err(WallpaperError::UnsupportedFileType(mime));
    };

    if sniff_kind(bytes) != Some(declared) {
        return Err(WallpaperError::ContentMismatch);
    }

    let data_uri = format!(
        "data:{};base64,{}",
        mime,
        base64::engine::general_purpose::STANDARD.encode(bytes)
    );

    let settings_size = serde_json::to_string(current)
        .map(|serialized| serialized.len())
        .unwrap_or_default();
    let projected = data_uri.len() + settings_size;
    if projected > config::STORAGE_QUOTA_BYTES {
        log::warn!(
            "Wallpaper {} would need {} bytes of storage, limit is {}",
            file_name,
            projected,
            config::STORAGE_QUOTA_BYTES
        );
        return Err(WallpaperError::StorageFull {
            required: projected,
            limit: config::STORAGE_QUOTA_BYTES,
        });
    }

    Ok(add_custom(current, file_name, declared, data_uri))
}

/// Remove the custom wallpaper with `id`. If it was the active background
/// the first preset becomes active.
pub fn delete_wallpaper(current: &UserSettings, id: &str) -> Option<SettingsPartial> {
    let target = current
        .custom_wallpapers
        .iter()
        .find(|wallpaper| wallpaper.id.as_deref() == Some(id))?;

    let remaining: Vec<Wallpaper> = current
        .custom_wallpapers
        .iter()
        .filter(|wallpaper| wallpaper.id != target.id && wallpaper.url != target.url)
        .cloned()
        .collect();

    let mut partial = SettingsPartial {
        custom_wallpapers: Some(remaining),
        ..Default::default()
    };
    if current.background_url == target.url {
        let fallback = default_wallpaper();
        partial.background_url = Some(fallback.url);
        partial.background_type = Some(fallback.kind);
    }
    Some(partial)
}

fn add_custom(current: &UserSettings, name: &str, kind: BackgroundType, url: String) -> SettingsPartial {
    let wallpaper = Wallpaper {
        id: Some(new_wallpaper_id()),
        name: name.to_string(),
        kind,
        url: url.clone(),
        thumbnail: None,
        is_custom: Some(true),
    };

    let mut wallpapers = current.custom_wallpapers.clone();
    wallpapers.push(wallpaper);

    SettingsPartial {
        background_url: Some(url),
        background_type: Some(kind),
        custom_wallpapers: Some(wallpapers),
        ..Default::default()
    }
}

fn new_wallpaper_id() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default()
        .to_string()
}

/// Guess whether file content is an image or a video from its leading bytes
fn sniff_kind(bytes: &[u8]) -> Option<BackgroundType> {
    const JPEG: &[u8] = &[0xff, 0xd8, 0xff];
    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];
    const WEBM: &[u8] = &[0x1a, 0x45, 0xdf, 0xa3];

    if bytes.starts_with(JPEG)
        || bytes.starts_with(PNG)
        || bytes.starts_with(b"GIF87a")
        || bytes.starts_with(b"GIF89a")
        || (bytes.starts_with(b"RIFF") && bytes.get(8..12) == Some(b"WEBP".as_slice()))
        || looks_like_svg(bytes)
    {
        return Some(BackgroundType::Image);
    }

    if bytes.get(4..8) == Some(b"ftyp".as_slice()) || bytes.starts_with(WEBM) || bytes.starts_with(b"OggS") {
        return Some(BackgroundType::Video);
    }

    None
}

fn looks_like_svg(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(1024)];
    let text = String::from_utf8_lossy(head);
    let text = text.trim_start_matches('\u{feff}').trim_start();
    (text.starts_with("<?xml") || text.starts_with("<svg") || text.starts_with("<!--"))
        && text.contains("<svg")
}

/// Why a wallpaper could not be added
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WallpaperError {
    UnsupportedProtocol(String),
    InvalidUrl(String),
    FileTooLarge { size: usize, limit: usize },
    UnsupportedFileType(String),
    /// File content does not match its declared type
    ContentMismatch,
    StorageFull { required: usize, limit: usize },
}

impl std::fmt::Display for WallpaperError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WallpaperError::UnsupportedProtocol(scheme) => {
                write!(f, "Unsupported protocol: {}", scheme)
            }
            WallpaperError::InvalidUrl(url) => write!(f, "Invalid URL: {}", url),
            WallpaperError::FileTooLarge { size, limit } => {
                write!(f, "File is {} bytes, limit is {}", size, limit)
            }
            WallpaperError::UnsupportedFileType(mime) => write!(f, "Unsupported file type: {}", mime),
            WallpaperError::ContentMismatch => write!(f, "File content does not match type"),
            WallpaperError::StorageFull { required, limit } => write!(
                f,
                "Wallpaper needs {} bytes of storage, limit is {}",
                required, limit
            ),
        }
    }
}

impl std::error::Error for WallpaperError {}
