//! User-visible messages in English and Chinese.

use crate::engines::EngineEditError;
use crate::navigation::NavigationError;
use crate::settings::Language;
use crate::storage::StorageError;
use crate::wallpaper::WallpaperError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    SearchEngineAdded,
    SearchEngineUpdated,
    SearchEngineDeleted,
    DuplicateEngineName,
    EmptyEngineField,
    EngineNotFound,
    LastEngineKept,
    InvalidSvgIcon,
    CustomWallpaperApplied,
    WallpaperUploaded,
    WallpaperDeleted,
    FileReadFailed,
    FileSizeExceeded,
    UnsupportedFileType,
    FileContentMismatch,
    StorageFull,
    InvalidUrlFormat,
    UnsupportedProtocol,
    InvalidSearchUrl,
    HistoryCleared,
    SettingsReset,
    SaveFailed,
}

impl Message {
    pub fn text(self, language: Language) -> &'static str {
        match language {
            Language::En => self.english(),
            Language::Zh => self.chinese(),
        }
    }

    fn english(self) -> &'static str {
        match self {
            Message::SearchEngineAdded => "New search engine added",
            Message::SearchEngineUpdated => "Search engine updated successfully",
            Message::SearchEngineDeleted => "Search engine deleted",
            Message::DuplicateEngineName => {
                "This search engine name already exists, please use a different name"
            }
            Message::EmptyEngineField => "Please fill in both the name and the URL",
            Message::EngineNotFound => "Search engine not found",
            Message::LastEngineKept => "At least one search engine is required",
            Message::InvalidSvgIcon => "Invalid SVG icon",
            Message::CustomWallpaperApplied => "Custom wallpaper applied",
            Message::WallpaperUploaded => "Wallpaper uploaded and applied successfully",
            Message::WallpaperDeleted => "Custom wallpaper deleted",
            Message::FileReadFailed => "Could not read the file",
            Message::FileSizeExceeded => {
                "File size cannot exceed 3.5MB. Consider using URL method instead."
            }
            Message::UnsupportedFileType => {
                "Unsupported file type. Only supports: JPEG, PNG, GIF, WebP, SVG, MP4, WebM, OGG"
            }
            Message::FileContentMismatch => "File content does not match type",
            Message::StorageFull => {
                "Insufficient storage space! File too large to save. Consider using URL method."
            }
            Message::InvalidUrlFormat => "Invalid URL format",
            Message::UnsupportedProtocol => "Only HTTP or HTTPS protocol links are supported",
            Message::InvalidSearchUrl => "Generated search URL is invalid",
            Message::HistoryCleared => "Search history cleared",
            Message::SettingsReset => "Settings restored to defaults",
            Message::SaveFailed => "Settings could not be saved",
        }
    }

    fn chinese(self) -> &'static str {
        match self {
            Message::SearchEngineAdded => "新搜索引擎已添加",
            Message::SearchEngineUpdated => "搜索引擎更新成功",
            Message::SearchEngineDeleted => "搜索引擎已删除",
            Message::DuplicateEngineName => "该搜索引擎名称已存在，请使用其他名称",
            Message::EmptyEngineField => "请填写名称和 URL",
            Message::EngineNotFound => "未找到该搜索引擎",
            Message::LastEngineKept => "至少需要保留一个搜索引擎",
            Message::InvalidSvgIcon => "无效的 SVG 图标",
            Message::CustomWallpaperApplied => "自定义壁纸已应用",
            Message::WallpaperUploaded => "壁纸上传并应用成功",
            Message::WallpaperDeleted => "自定义壁纸已删除",
            Message::FileReadFailed => "无法读取文件",
            Message::FileSizeExceeded => "文件大小不能超过 3.5MB。建议使用URL方式添加。",
            Message::UnsupportedFileType => {
                "不支持的文件类型。仅支持：JPEG, PNG, GIF, WebP, SVG, MP4, WebM, OGG"
            }
            Message::FileContentMismatch => "文件内容与类型不匹配",
            Message::StorageFull => "存储空间不足！文件过大，无法保存。建议使用 URL 方式。",
            Message::InvalidUrlFormat => "无效的 URL 格式",
            Message::UnsupportedProtocol => "仅支持 HTTP 或 HTTPS 协议的链接",
            Message::InvalidSearchUrl => "生成的搜索 URL 无效",
            Message::HistoryCleared => "搜索历史已清除",
            Message::SettingsReset => "设置已恢复默认",
            Message::SaveFailed => "设置保存失败",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Success,
    Error,
    Info,
}

/// A short notification shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: Message,
}

impl Toast {
    pub fn success(message: Message) -> Self {
        Self {
            level: ToastLevel::Success,
            message,
        }
    }

    pub fn error(message: Message) -> Self {
        Self {
            level: ToastLevel::Error,
            message,
        }
    }

    pub fn info(message: Message) -> Self {
        Self {
            level: ToastLevel::Info,
            message,
        }
    }

    pub fn text(&self, language: Language) -> &'static str {
        self.message.text(language)
    }
}

impl From<&NavigationError> for Message {
    fn from(error: &NavigationError) -> Self {
        match error {
            NavigationError::UnsupportedProtocol(_) => Message::UnsupportedProtocol,
            NavigationError::InvalidUrl(_) => Message::InvalidSearchUrl,
        }
    }
}

impl From<&EngineEditError> for Message {
    fn from(error: &EngineEditError) -> Self {
        match error {
            EngineEditError::EmptyField => Message::EmptyEngineField,
            EngineEditError::DuplicateName(_) => Message::DuplicateEngineName,
            EngineEditError::InvalidIcon => Message::InvalidSvgIcon,
            EngineEditError::NotFound(_) => Message::EngineNotFound,
        }
    }
}

impl From<&WallpaperError> for Message {
    fn from(error: &WallpaperError) -> Self {
        match error {
            WallpaperError::UnsupportedProtocol(_) => Message::UnsupportedProtocol,
            WallpaperError::InvalidUrl(_) => Message::InvalidUrlFormat,
            WallpaperError::FileTooLarge { .. } => Message::FileSizeExceeded,
            WallpaperError::UnsupportedFileType(_) => Message::UnsupportedFileType,
            WallpaperError::ContentMismatch => Message::FileContentMismatch,
            WallpaperError::StorageFull { .. } => Message::StorageFull,
        }
    }
}

impl From<&StorageError> for Message {
    fn from(error: &StorageError) -> Self {
        if error.is_quota_exceeded() {
            Message::StorageFull
        } else {
            Message::SaveFailed
        }
    }
}
