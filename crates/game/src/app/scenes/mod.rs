mod baston;
mod outdoor;
mod profiles;

use std::path::Path;
use std::sync::Arc;

use engine::{Scene, SceneKey};
use tracing::{info, warn};

use super::dialogue::{BackendDialogue, DialogueDispatcher, DialogueSource, ScriptedDialogue};

pub(crate) use baston::BastonScene;
pub(crate) use outdoor::OutdoorScene;
use profiles::{sally_emergency_lines, NpcVoice};

pub(crate) const BREAZE: SceneKey = SceneKey("breaze");
pub(crate) const THE_WOODS: SceneKey = SceneKey("the_woods");
pub(crate) const BASTON: SceneKey = SceneKey("baston");

const SCENE_ORDER: [SceneKey; 3] = [BREAZE, THE_WOODS, BASTON];

/// Where a scene is in its collision setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScenePhase {
    Loading,
    Ready,
    Fallback,
}

impl ScenePhase {
    fn label(self) -> &'static str {
        match self {
            ScenePhase::Loading => "loading",
            ScenePhase::Ready => "mask",
            ScenePhase::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct SceneSettings {
    pub(crate) dialogue_base_url: String,
    pub(crate) walkable_debug: bool,
}

pub(crate) fn next_scene(current: SceneKey) -> SceneKey {
    let index = SCENE_ORDER
        .iter()
        .position(|key| *key == current)
        .unwrap_or(0);
    SCENE_ORDER[(index + 1) % SCENE_ORDER.len()]
}

pub(crate) fn build_scenes(
    settings: &SceneSettings,
    assets_dir: &Path,
    dispatcher: &DialogueDispatcher,
) -> Vec<(SceneKey, Box<dyn Scene>)> {
    vec![
        (
            BREAZE,
            Box::new(OutdoorScene::new(
                profiles::breaze(),
                assets_dir.to_path_buf(),
                settings.clone(),
                dispatcher.clone(),
            )) as Box<dyn Scene>,
        ),
        (
            THE_WOODS,
            Box::new(OutdoorScene::new(
                profiles::the_woods(),
                assets_dir.to_path_buf(),
                settings.clone(),
                dispatcher.clone(),
            )),
        ),
        (
            BASTON,
            Box::new(BastonScene::new(settings.clone(), dispatcher.clone())),
        ),
    ]
}

fn npc_source(voice: NpcVoice, dialogue_base_url: &str) -> Arc<dyn DialogueSource> {
    match voice {
        NpcVoice::Sally => {
            let base_url = format!("{}/sally", dialogue_base_url.trim_end_matches('/'));
            match BackendDialogue::new("Sally", &base_url, sally_emergency_lines()) {
                Ok(source) => {
                    info!(
                        npc = "Sally",
                        endpoint = source.endpoint(),
                        "dialogue_backend_configured"
                    );
                    Arc::new(source)
                }
                Err(error) => {
                    warn!(error = %error, "dialogue_backend_unavailable_using_script");
                    Arc::new(ScriptedDialogue::new("Sally", sally_emergency_lines()))
                }
            }
        }
    }
}

fn title(scene: SceneKey, phase: ScenePhase, dialogue_line: Option<String>) -> String {
    match dialogue_line {
        Some(line) => format!("Terrene - {} [{}] {}", scene.name(), phase.label(), line),
        None => format!("Terrene - {} [{}]", scene.name(), phase.label()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tab_cycles_through_every_scene() {
        assert_eq!(next_scene(BREAZE), THE_WOODS);
        assert_eq!(next_scene(THE_WOODS), BASTON);
        assert_eq!(next_scene(BASTON), BREAZE);
        assert_eq!(next_scene(SceneKey("unknown")), THE_WOODS);
    }

    #[test]
    fn title_shows_current_line() {
        assert_eq!(
            title(BREAZE, ScenePhase::Ready, Some("Sally: Hi".to_string())),
            "Terrene - breaze [mask] Sally: Hi"
        );
        assert_eq!(
            title(BASTON, ScenePhase::Fallback, None),
            "Terrene - baston [fallback]"
        );
    }

    #[test]
    fn every_scene_is_registered_once() {
        let dispatcher = DialogueDispatcher::new().expect("runtime");
        let settings = SceneSettings {
            dialogue_base_url: "http://localhost:3000/api".to_string(),
            walkable_debug: false,
        };
        let scenes = build_scenes(&settings, Path::new("assets"), &dispatcher);
        let keys: Vec<SceneKey> = scenes.iter().map(|(key, _)| *key).collect();
        assert_eq!(keys, SCENE_ORDER.to_vec());
    }
}
