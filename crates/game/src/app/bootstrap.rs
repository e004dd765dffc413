use engine::{resolve_app_paths, LoopConfig, Scene, SceneKey, StartupError};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::dialogue::{DialogueDispatcher, DialogueError};
use super::scenes::{build_scenes, SceneSettings, BREAZE};

const DIALOGUE_URL_ENV_VAR: &str = "TERRENE_DIALOGUE_URL";
const WALKABLE_DEBUG_ENV_VAR: &str = "TERRENE_WALKABLE_DEBUG";
const DEFAULT_DIALOGUE_URL: &str = "http://localhost:3000/api";

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Dialogue(#[from] DialogueError),
}

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) scenes: Vec<(SceneKey, Box<dyn Scene>)>,
    pub(crate) initial_scene: SceneKey,
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    init_tracing();
    info!("=== Terrene Startup ===");

    let app_paths = resolve_app_paths()?;
    let settings = settings_from(
        std::env::var(DIALOGUE_URL_ENV_VAR).ok(),
        std::env::var(WALKABLE_DEBUG_ENV_VAR).ok(),
    );
    info!(
        assets_dir = %app_paths.assets_dir.display(),
        dialogue_url = settings.dialogue_base_url.as_str(),
        walkable_debug = settings.walkable_debug,
        "settings_resolved"
    );

    let dispatcher = DialogueDispatcher::new()?;
    let scenes = build_scenes(&settings, &app_paths.assets_dir, &dispatcher);

    Ok(AppWiring {
        config: LoopConfig::default(),
        scenes,
        initial_scene: BREAZE,
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn settings_from(dialogue_url: Option<String>, walkable_debug: Option<String>) -> SceneSettings {
    let dialogue_base_url = dialogue_url
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
        .unwrap_or_else(|| DEFAULT_DIALOGUE_URL.to_string());
    let walkable_debug = walkable_debug.map_or(true, |raw| raw.trim() != "0");
    SceneSettings {
        dialogue_base_url,
        walkable_debug,
    }
}
