use aerostart::config::{self, AppConfig, AppDirs};
use aerostart::engines::{self, EngineDraft};
use aerostart::history;
use aerostart::i18n::{Message, Toast, ToastLevel};
use aerostart::navigation::perform_search;
use aerostart::settings::{
    normalize, preset_wallpapers, Language, SettingsPartial, SettingsStore, UserSettings,
    WallpaperFit,
};
use aerostart::storage::{SqliteStorage, Storage};
use aerostart::suggest::{SoupTransport, SuggestionClient, SuggestionSession};
use aerostart::wallpaper;
use clap::{Parser, Subcommand};
use futures::channel::oneshot;
use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// New tab start page: search suggestions, engines, wallpapers and settings.
#[derive(Parser)]
#[command(name = "aerostart", version, about)]
struct Cli {
    /// Config file. Defaults to config.toml in the user config directory.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch suggestions for a query
    Suggest {
        query: String,
        /// Provider to ask. Defaults to the selected engine.
        #[arg(long)]
        engine: Option<String>,
    },
    /// Search with the selected engine and open the result
    Search {
        text: String,
        /// Print the destination instead of opening it
        #[arg(long)]
        print: bool,
    },
    /// Manage search engines
    Engine {
        #[command(subcommand)]
        action: EngineCommand,
    },
    /// Manage wallpapers
    Wallpaper {
        #[command(subcommand)]
        action: WallpaperCommand,
    },
    /// Show or clear search history
    History {
        #[command(subcommand)]
        action: HistoryCommand,
    },
    /// Show or change settings
    Settings {
        #[command(subcommand)]
        action: SettingsCommand,
    },
}

#[derive(Subcommand)]
enum EngineCommand {
    List,
    Add {
        name: String,
        url_pattern: String,
        /// File containing SVG icon markup
        #[arg(long)]
        icon: Option<PathBuf>,
    },
    Update {
        original_name: String,
        name: String,
        url_pattern: String,
        #[arg(long)]
        icon: Option<PathBuf>,
    },
    Delete {
        name: String,
    },
    /// Make an engine the selected one
    Default {
        name: String,
    },
    /// Move the engine at position FROM to position TO (zero based)
    Move {
        from: usize,
        to: usize,
    },
}

#[derive(Subcommand)]
enum WallpaperCommand {
    List,
    /// Apply a built-in wallpaper by name
    Preset {
        name: String,
    },
    /// Add and apply a wallpaper from an http(s) URL
    Url {
        url: String,
    },
    /// Add and apply a local image or video file
    Upload {
        path: PathBuf,
        /// MIME type. Guessed from the extension when omitted.
        #[arg(long)]
        mime: Option<String>,
    },
    /// Delete a custom wallpaper by id
    Delete {
        id: String,
    },
    Fit {
        fit: WallpaperFit,
    },
}

#[derive(Subcommand)]
enum HistoryCommand {
    List,
    Clear,
}

#[derive(Subcommand)]
enum SettingsCommand {
    /// Print the settings as JSON
    Show,
    /// Restore defaults
    Reset,
    Set {
        #[arg(long)]
        language: Option<Language>,
        /// Theme name or hex color
        #[arg(long)]
        theme: Option<String>,
        #[arg(long)]
        use_24_hour_format: Option<bool>,
        #[arg(long)]
        show_seconds: Option<bool>,
        #[arg(long)]
        background_blur: Option<f64>,
        #[arg(long)]
        search_opacity: Option<f64>,
        #[arg(long)]
        enable_mask_blur: Option<bool>,
        #[arg(long)]
        mask_opacity: Option<f64>,
        #[arg(long)]
        enable_search_history: Option<bool>,
    },
}

fn main() -> glib::ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    log::debug!("Starting {} v{}", config::APP_NAME, config::APP_VERSION);

    let dirs = AppDirs::resolve();
    let config_path = cli.config.clone().unwrap_or_else(|| dirs.config_file());
    let app_config = match AppConfig::load(&config_path) {
        Ok(app_config) => app_config,
        Err(e) => {
            log::error!("Failed to load config {:?}: {}", config_path, e);
            return glib::ExitCode::FAILURE;
        }
    };

    let storage: Rc<dyn Storage> = match SqliteStorage::open(&app_config.storage_path(&dirs)) {
        Ok(storage) => Rc::new(storage),
        Err(e) => {
            log::error!("Failed to open storage: {}", e);
            return glib::ExitCode::FAILURE;
        }
    };

    let defaults = UserSettings::default();
    let store = SettingsStore::new(storage, &defaults, app_config.persist_debounce());

    let language = Rc::new(Cell::new(store.with_settings(|s| s.language)));
    {
        let language = Rc::clone(&language);
        store.subscribe(move |settings| language.set(settings.language));
    }
    {
        let language = Rc::clone(&language);
        store.subscribe_errors(move |e| report(&Toast::error(Message::from(e)), language.get()));
    }

    let context = glib::MainContext::default();
    let toast = context.block_on(run(cli.command, &store, &app_config, &defaults));

    let mut failed = false;
    if let Err(e) = store.flush() {
        log::error!("Failed to save settings: {}", e);
        report(&Toast::error(Message::from(&e)), language.get());
        failed = true;
    }

    if let Some(toast) = toast {
        report(&toast, language.get());
        failed |= toast.level == ToastLevel::Error;
    }

    if failed {
        glib::ExitCode::FAILURE
    } else {
        glib::ExitCode::SUCCESS
    }
}

fn report(toast: &Toast, language: Language) {
    match toast.level {
        ToastLevel::Error => eprintln!("{}", toast.text(language)),
        ToastLevel::Success | ToastLevel::Info => println!("{}", toast.text(language)),
    }
}

async fn run(
    command: Commands,
    store: &SettingsStore,
    app_config: &AppConfig,
    defaults: &UserSettings,
) -> Option<Toast> {
    match command {
        Commands::Suggest { query, engine } => {
            suggest(store, app_config, engine, &query).await;
            None
        }
        Commands::Search { text, print } => search(store, &text, print),
        Commands::Engine { action } => engine_command(store, action),
        Commands::Wallpaper { action } => wallpaper_command(store, action),
        Commands::History { action } => match action {
            HistoryCommand::List => {
                store.with_settings(|s| s.search_history.iter().for_each(|entry| println!("{}", entry)));
                None
            }
            HistoryCommand::Clear => {
                store.patch(history::clear_history());
                Some(Toast::success(Message::HistoryCleared))
            }
        },
        Commands::Settings { action } => settings_command(store, action, defaults),
    }
}

async fn suggest(store: &SettingsStore, app_config: &AppConfig, engine: Option<String>, query: &str) {
    let engine = engine.unwrap_or_else(|| store.with_settings(|s| s.selected_engine.clone()));
    let client = SuggestionClient::new(Rc::new(SoupTransport::new()), app_config);
    let session = SuggestionSession::new(client, app_config.search_debounce());

    let (sender, receiver) = oneshot::channel();
    session.update_query(&engine, query, move |suggestions| {
        let _ = sender.send(suggestions);
    });

    match receiver.await {
        Ok(suggestions) => suggestions.iter().for_each(|suggestion| println!("{}", suggestion)),
        Err(_) => log::debug!("Suggestion request for '{}' was superseded", query),
    }
}

fn search(store: &SettingsStore, text: &str, print: bool) -> Option<Toast> {
    let outcome = store.with_settings(|s| perform_search(s, text))?;
    if let Some(history) = outcome.history {
        store.patch(history);
    }

    let url = match outcome.destination {
        Ok(url) => url,
        Err(e) => return Some(Toast::error(Message::from(&e))),
    };

    if print {
        println!("{}", url);
        return None;
    }

    log::info!("Opening {}", url);
    if let Err(e) = gio::AppInfo::launch_default_for_uri(url.as_str(), None::<&gio::AppLaunchContext>) {
        log::error!("Failed to open {}: {}", url, e);
        println!("{}", url);
    }
    None
}

fn engine_command(store: &SettingsStore, action: EngineCommand) -> Option<Toast> {
    let current = store.settings();
    let result = match action {
        EngineCommand::List => {
            for engine in &current.search_engines {
                let marker = if engine.name == current.selected_engine { "*" } else { " " };
                println!("{} {}\t{}", marker, engine.name, engine.url_pattern);
            }
            return None;
        }
        EngineCommand::Add {
            name,
            url_pattern,
            icon,
        } => draft(name, url_pattern, icon.as_deref())
            .and_then(|draft| engines::add_engine(&current, &draft).map_err(|e| Message::from(&e)))
            .map(|partial| (partial, Message::SearchEngineAdded)),
        EngineCommand::Update {
            original_name,
            name,
            url_pattern,
            icon,
        } => draft(name, url_pattern, icon.as_deref())
            .and_then(|draft| {
                engines::update_engine(&current, &original_name, &draft).map_err(|e| Message::from(&e))
            })
            .map(|partial| (partial, Message::SearchEngineUpdated)),
        EngineCommand::Delete { name } => {
            if current.engine(&name).is_none() {
                Err(Message::EngineNotFound)
            } else {
                engines::delete_engine(&current, &name)
                    .map(|partial| (partial, Message::SearchEngineDeleted))
                    .ok_or(Message::LastEngineKept)
            }
        }
        EngineCommand::Default { name } => {
            if current.engine(&name).is_none() {
                Err(Message::EngineNotFound)
            } else {
                store.patch(engines::set_default(&name));
                return None;
            }
        }
        EngineCommand::Move { from, to } => {
            if let Some(partial) = engines::move_engine(&current, from, to) {
                store.patch(partial);
            }
            return None;
        }
    };

    match result {
        Ok((partial, message)) => {
            store.patch(partial);
            Some(Toast::success(message))
        }
        Err(message) => Some(Toast::error(message)),
    }
}

fn draft(name: String, url_pattern: String, icon: Option<&Path>) -> Result<EngineDraft, Message> {
    let draft = EngineDraft::new(name, url_pattern);
    match icon {
        Some(path) => std::fs::read_to_string(path)
            .map(|markup| draft.with_icon(markup))
            .map_err(|e| {
                log::error!("Failed to read icon {:?}: {}", path, e);
                Message::FileReadFailed
            }),
        None => Ok(draft),
    }
}

fn wallpaper_command(store: &SettingsStore, action: WallpaperCommand) -> Option<Toast> {
    let current = store.settings();
    let result = match action {
        WallpaperCommand::List => {
            for entry in preset_wallpapers().iter().chain(&current.custom_wallpapers) {
                let marker = if entry.url == current.background_url { "*" } else { " " };
                let id = entry.id.as_deref().unwrap_or("-");
                println!("{} {}\t{}\t{:?}", marker, id, entry.name, entry.kind);
            }
            return None;
        }
        WallpaperCommand::Preset { name } => {
            if let Some(preset) = preset_wallpapers().iter().find(|w| w.name.eq_ignore_ascii_case(&name)) {
                store.patch(wallpaper::apply_preset(preset));
            } else {
                log::warn!("No preset wallpaper named {}", name);
            }
            return None;
        }
        WallpaperCommand::Url { url } => wallpaper::add_wallpaper_url(&current, &url)
            .map(|partial| (partial, Toast::success(Message::CustomWallpaperApplied))),
        WallpaperCommand::Upload { path, mime } => {
            let bytes = match std::fs::read(&path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    log::error!("Failed to read {:?}: {}", path, e);
                    return Some(Toast::error(Message::FileReadFailed));
                }
            };
            let mime = mime.unwrap_or_else(|| guess_mime(&path).to_string());
            let file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            wallpaper::add_uploaded_wallpaper(&current, &file_name, &mime, &bytes)
                .map(|partial| (partial, Toast::success(Message::WallpaperUploaded)))
        }
        WallpaperCommand::Delete { id } => {
            return wallpaper::delete_wallpaper(&current, &id).map(|partial| {
                store.patch(partial);
                Toast::info(Message::WallpaperDeleted)
            });
        }
        WallpaperCommand::Fit { fit } => {
            store.patch(wallpaper::set_fit(fit));
            return None;
        }
    };

    match result {
        Ok((partial, toast)) => {
            store.patch(partial);
            Some(toast)
        }
        Err(e) => Some(Toast::error(Message::from(&e))),
    }
}

fn guess_mime(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "ogg" | "ogv" => "video/ogg",
        _ => "application/octet-stream",
    }
}

fn settings_command(store: &SettingsStore, action: SettingsCommand, defaults: &UserSettings) -> Option<Toast> {
    match action {
        SettingsCommand::Show => {
            match store.with_settings(|s| serde_json::to_string_pretty(s)) {
                Ok(json) => println!("{}", json),
                Err(e) => log::error!("Failed to serialize settings: {}", e),
            }
            None
        }
        SettingsCommand::Reset => {
            store.replace(defaults.clone());
            Some(Toast::success(Message::SettingsReset))
        }
        SettingsCommand::Set {
            language,
            theme,
            use_24_hour_format,
            show_seconds,
            background_blur,
            search_opacity,
            enable_mask_blur,
            mask_opacity,
            enable_search_history,
        } => {
            let theme_color = theme.map(|theme| {
                config::THEMES
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(&theme))
                    .map(|(_, hex)| hex.to_string())
                    .unwrap_or(theme)
            });
            let partial = SettingsPartial {
                language,
                theme_color,
                use_24_hour_format,
                show_seconds,
                background_blur,
                search_opacity,
                enable_mask_blur,
                mask_opacity,
                enable_search_history,
                ..Default::default()
            };
            if partial.is_empty() {
                return None;
            }

            // Values from the command line get the same repair as stored ones
            let next = store.with_settings(|current| partial.apply_to(current));
            match serde_json::to_value(&next) {
                Ok(raw) => store.replace(normalize(defaults, Some(&raw))),
                Err(e) => log::error!("Failed to serialize settings: {}", e),
            }
            None
        }
    }
}
