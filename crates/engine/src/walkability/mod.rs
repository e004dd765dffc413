mod classifier;
mod debug_view;
mod fallback;
mod map;
mod mask;
mod placement;
mod validator;

pub use classifier::{is_walkable, BrightOverlayThresholds, PixelClassifier};
pub use debug_view::{
    visualize_walkable, WalkableDebugOverlay, OVERLAY_LIFETIME_SECONDS, PANEL_BORDER,
    PANEL_HEIGHT_PX, PANEL_LEFT_PX, PANEL_TOP_PX, PANEL_WIDTH_PX, WALKABLE_HIGHLIGHT,
};
pub use fallback::{
    create_fallback_boundaries, perimeter_walls, spawn_static_blockers,
    walls_around_walkable_area, BlockerKind, FallbackLayout, StaticBlocker,
    DEFAULT_PERIMETER_THICKNESS, DEFAULT_WALL_PADDING,
};
pub use map::{
    build_walkable_map, MapBuildOptions, WalkableMap, WalkableMapError, DEFAULT_SAMPLE_STRIDE,
};
pub use mask::{
    decode_mask_image, load_collision_source, read_scene_metadata, CollisionLoadOutcome,
    FallbackReason, MaskImage, MaskLoadError, MaskLoadJob, MaskLoadRequest, MetadataReadState,
    SceneMetadata, COLLISION_LAYER_NAME,
};
pub use placement::{
    find_dense_walkable_center, window_density, PlacementCandidate, PlacementSearch,
    PlacementSource,
};
pub use validator::{
    Haltable, MovementValidator, NeighborhoodSampler, TrackedBody, ValidationReport, Verdict,
    WalkArea,
};
