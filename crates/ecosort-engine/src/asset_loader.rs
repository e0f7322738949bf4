//! Asset loading for the EcoSort engine.
//!
//! The RON manifest is read up front. Every model file it names is then read
//! and parsed on a tokio task; finished loads come back over a channel and
//! are applied to the session at the start of a frame.
//!
//! A liveness flag shared with the tasks is flipped on teardown. Tasks check
//! it before sending and the loader checks it again before touching the
//! session, so loads that finish after teardown are dropped.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};
use ecosort_common::{Category, EcosortError, NodeId, SchemaVersion, WorldError};
use ecosort_gameplay::{GameSession, SceneGraph, SpatialWorld, Transform};
use glam::{Quat, Vec3};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::runtime::Handle;
use tracing::{debug, error, info, warn};

/// Asset loading errors.
#[derive(Debug, Error)]
pub enum AssetError {
    /// File does not exist
    #[error("asset file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// File exists but could not be read
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// File is not valid RON for its type
    #[error("failed to parse {}: {message}", path.display())]
    Parse {
        /// File path
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// Unknown category or unreadable schema version
    #[error(transparent)]
    Core(#[from] EcosortError),

    /// The scene refused the spawned nodes
    #[error("scene rejected asset: {0}")]
    World(#[from] WorldError),
}

fn unit_scale() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

/// Top-level asset list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetManifest {
    /// Manifest schema version
    #[serde(default)]
    pub version: SchemaVersion,
    /// Character model file
    #[serde(default)]
    pub character: Option<PathBuf>,
    /// Trash and bin entries
    #[serde(default)]
    pub assets: Vec<AssetEntry>,
}

impl AssetManifest {
    /// Reads and version-checks a manifest.
    pub fn load(path: &Path) -> Result<Self, AssetError> {
        let contents = std::fs::read_to_string(path).map_err(|e| io_error(path, e))?;
        let manifest: Self = ron::from_str(&contents).map_err(|e| AssetError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        SchemaVersion::ASSET_MANIFEST.require_readable(&manifest.version)?;

        info!(
            "Loaded asset manifest {} ({} entries)",
            path.display(),
            manifest.assets.len()
        );
        Ok(manifest)
    }
}

/// One model and where to place copies of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetEntry {
    /// What the placements become
    pub kind: AssetKind,
    /// Model file, relative to the manifest
    pub model: PathBuf,
    /// One entity per placement
    #[serde(default)]
    pub placements: Vec<Placement>,
}

/// Entity type of a manifest entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AssetKind {
    /// Floor trash
    Trash {
        /// Category name, case-insensitive
        category: String,
        /// Item scale in world space
        #[serde(default = "unit_scale")]
        base_scale: [f32; 3],
        /// Decorative label text
        #[serde(default)]
        label: Option<String>,
    },
    /// Sorting bin
    Bin {
        /// Category name, case-insensitive
        category: String,
    },
}

impl AssetKind {
    /// Parsed category.
    pub fn category(&self) -> Result<Category, AssetError> {
        let name = match self {
            Self::Trash { category, .. } | Self::Bin { category } => category,
        };
        name.parse::<Category>()
            .map_err(|e| AssetError::Core(EcosortError::from(e)))
    }
}

/// Where one entity goes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// World position
    pub position: [f32; 3],
    /// Rotation about +Y in radians
    #[serde(default)]
    pub yaw: f32,
}

impl Placement {
    fn transform(&self, scale: Vec3) -> Transform {
        Transform::from_translation(Vec3::from_array(self.position))
            .with_rotation(Quat::from_rotation_y(self.yaw))
            .with_scale(scale)
    }
}

/// Node tree of a model file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDesc {
    /// Model name
    pub name: String,
    /// Root scale
    #[serde(default = "unit_scale")]
    pub scale: [f32; 3],
    /// Skeleton below the root
    #[serde(default)]
    pub bones: Vec<BoneDesc>,
}

/// A bone (named child node) of a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoneDesc {
    /// Bone name
    pub name: String,
    /// Offset from the parent bone
    #[serde(default)]
    pub offset: [f32; 3],
    /// Local scale
    #[serde(default = "unit_scale")]
    pub scale: [f32; 3],
    /// Child bones
    #[serde(default)]
    pub children: Vec<BoneDesc>,
}

/// What a finished load will be applied to.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadTarget {
    /// The player character's skeleton
    Character,
    /// A manifest entry
    Entry(AssetEntry),
}

/// A finished model load.
#[derive(Debug)]
pub struct LoadCompletion {
    /// Destination
    pub target: LoadTarget,
    /// Model file that was read
    pub path: PathBuf,
    /// Parsed model or the reason it failed
    pub result: Result<ModelDesc, AssetError>,
}

/// Asset loading statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetStats {
    /// Loads started
    pub requested: usize,
    /// Loads applied to the session
    pub loaded: usize,
    /// Loads that failed to read, parse or spawn
    pub failed: usize,
    /// Loads dropped after teardown
    pub dropped: usize,
    /// Bytes read from model files
    pub bytes_read: u64,
    /// Trash items and bins spawned
    pub entities_spawned: usize,
}

/// Loads models in the background and applies them to a session.
pub struct AssetLoader {
    /// Runtime the load tasks run on
    runtime: Handle,
    /// Directory relative model paths resolve against
    base_dir: PathBuf,
    /// Cleared on teardown
    live: Arc<AtomicBool>,
    /// Handed to tasks
    sender: Sender<LoadCompletion>,
    /// Drained at frame start
    receiver: Receiver<LoadCompletion>,
    /// Shared with tasks
    stats: Arc<Mutex<AssetStats>>,
    /// Loads requested but not yet received
    pending: usize,
}

impl std::fmt::Debug for AssetLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetLoader")
            .field("base_dir", &self.base_dir)
            .field("live", &self.is_live())
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}

impl AssetLoader {
    /// Creates a live loader spawning onto `runtime`.
    #[must_use]
    pub fn new(runtime: Handle, base_dir: impl Into<PathBuf>) -> Self {
        let (sender, receiver) = unbounded();
        Self {
            runtime,
            base_dir: base_dir.into(),
            live: Arc::new(AtomicBool::new(true)),
            sender,
            receiver,
            stats: Arc::new(Mutex::new(AssetStats::default())),
            pending: 0,
        }
    }

    /// Whether the owning session is still alive.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    /// Loads requested but not yet received.
    #[must_use]
    pub const fn pending(&self) -> usize {
        self.pending
    }

    /// Snapshot of the statistics.
    #[must_use]
    pub fn stats(&self) -> AssetStats {
        self.stats.lock().clone()
    }

    /// Starts loading everything the manifest names.
    pub fn request_manifest(&mut self, manifest: &AssetManifest) {
        if let Some(character) = &manifest.character {
            self.request(LoadTarget::Character, character);
        }
        for entry in &manifest.assets {
            let model = entry.model.clone();
            self.request(LoadTarget::Entry(entry.clone()), &model);
        }
    }

    /// Starts loading one model file. Fire-and-forget.
    pub fn request(&mut self, target: LoadTarget, model: &Path) {
        if !self.is_live() {
            debug!(path = %model.display(), "Loader torn down, ignoring request");
            return;
        }

        let path = self.base_dir.join(model);
        let live = Arc::clone(&self.live);
        let sender = self.sender.clone();
        let stats = Arc::clone(&self.stats);

        self.pending += 1;
        self.stats.lock().requested += 1;
        debug!(path = %path.display(), "Loading model");

        self.runtime.spawn(async move {
            let result = read_model(&path, &stats).await;
            if !live.load(Ordering::Acquire) {
                debug!(path = %path.display(), "Session gone, dropping finished load");
                return;
            }
            let _ = sender.send(LoadCompletion { target, path, result });
        });
    }

    /// Applies every load that has finished. Returns how many were received.
    pub fn apply_completions(&mut self, session: &mut GameSession) -> usize {
        let completions: Vec<_> = self.receiver.try_iter().collect();
        let count = completions.len();
        for completion in completions {
            self.apply(completion, session);
        }
        count
    }

    /// Marks the session dead. In-flight loads keep running but their
    /// results are discarded.
    pub fn teardown(&self) {
        if self.live.swap(false, Ordering::AcqRel) {
            debug!(pending = self.pending, "Asset loader torn down");
        }
    }

    fn apply(&mut self, completion: LoadCompletion, session: &mut GameSession) {
        self.pending = self.pending.saturating_sub(1);
        let LoadCompletion { target, path, result } = completion;

        if !self.is_live() {
            debug!(path = %path.display(), "Dropping load completed after teardown");
            self.stats.lock().dropped += 1;
            return;
        }

        match result.and_then(|model| spawn_model(session, &target, &model)) {
            Ok(spawned) => {
                let mut stats = self.stats.lock();
                stats.loaded += 1;
                stats.entities_spawned += spawned;
                info!("Loaded {} ({spawned} entities)", path.display());
            },
            Err(e) => {
                self.stats.lock().failed += 1;
                error!(path = %path.display(), error = %e, "Failed to load asset, continuing without it");
            },
        }
    }
}

impl Drop for AssetLoader {
    fn drop(&mut self) {
        self.teardown();
    }
}

async fn read_model(path: &Path, stats: &Mutex<AssetStats>) -> Result<ModelDesc, AssetError> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| io_error(path, e))?;
    stats.lock().bytes_read += contents.len() as u64;

    ron::from_str(&contents).map_err(|e| AssetError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn io_error(path: &Path, source: std::io::Error) -> AssetError {
    if source.kind() == std::io::ErrorKind::NotFound {
        AssetError::NotFound(path.to_path_buf())
    } else {
        AssetError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Builds the loaded model into the session. Returns the entity count.
fn spawn_model(session: &mut GameSession, target: &LoadTarget, model: &ModelDesc) -> Result<usize, AssetError> {
    let model_scale = Vec3::from_array(model.scale);
    let entry = match target {
        LoadTarget::Character => {
            let root = session.character();
            let scene = session.scene_mut();
            let mut local = scene.local_transform(root).ok_or(WorldError::NodeNotFound(root))?;
            local.scale = model_scale;
            scene.set_local_transform(root, local)?;
            let bones = spawn_bones(scene, root, &model.bones)?;
            debug!(model = %model.name, bones, "Built character skeleton");
            return Ok(0);
        },
        LoadTarget::Entry(entry) => entry,
    };

    let category = entry.kind.category()?;
    if entry.placements.is_empty() {
        warn!(model = %model.name, "Asset has no placements");
    }

    for placement in &entry.placements {
        match &entry.kind {
            AssetKind::Trash { base_scale, label, .. } => {
                let scale = Vec3::from_array(*base_scale) * model_scale;
                session.spawn_trash(category, placement.transform(scale), label.as_deref())?;
            },
            AssetKind::Bin { .. } => {
                session.spawn_bin(category, placement.transform(model_scale))?;
            },
        }
    }
    Ok(entry.placements.len())
}

fn spawn_bones(scene: &mut SceneGraph, parent: NodeId, bones: &[BoneDesc]) -> Result<usize, WorldError> {
    let mut count = 0;
    for bone in bones {
        let local = Transform::from_translation(Vec3::from_array(bone.offset)).with_scale(Vec3::from_array(bone.scale));
        let node = scene.spawn(bone.name.as_str(), parent, local)?;
        count += 1 + spawn_bones(scene, node, &bone.children)?;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecosort_gameplay::{SessionConfig, SilentFeedback};
    use std::fs;
    use std::time::{Duration, Instant};
    use tempfile::TempDir;

    const WAIT: Duration = Duration::from_secs(5);

    /// Polls completions the way the game loop does, until idle or `timeout`.
    fn settle(loader: &mut AssetLoader, session: &mut GameSession, timeout: Duration) {
        let deadline = Instant::now() + timeout;
        while loader.pending() > 0 && Instant::now() < deadline {
            loader.apply_completions(session);
            std::thread::sleep(Duration::from_millis(5));
        }
        loader.apply_completions(session);
    }

    const CHARACTER: &str = r#"(
        name: "sorter",
        scale: (0.5, 0.5, 0.5),
        bones: [
            (name: "Spine", offset: (0.0, 60.0, 0.0), children: [
                (name: "RightHand", offset: (20.0, 0.0, 0.0)),
            ]),
        ],
    )"#;

    const PROP: &str = r#"(name: "prop")"#;

    fn session() -> GameSession {
        GameSession::new(SessionConfig::default(), Box::new(SilentFeedback)).expect("session")
    }

    fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).expect("write");
        path
    }

    fn manifest(dir: &TempDir, assets: &str) -> AssetManifest {
        let path = write(
            dir,
            "manifest.ron",
            &format!("(version: (major: 1, minor: 0, patch: 0), character: Some(\"character.ron\"), assets: [{assets}])"),
        );
        AssetManifest::load(&path).expect("manifest")
    }

    #[test]
    fn test_manifest_populates_session() {
        let dir = TempDir::new().expect("temp dir");
        write(&dir, "character.ron", CHARACTER);
        write(&dir, "banana.ron", PROP);
        write(&dir, "bin.ron", PROP);
        let manifest = manifest(
            &dir,
            r#"
            (kind: Trash(category: "Organic", base_scale: (2.0, 2.0, 2.0), label: Some("banana")),
             model: "banana.ron",
             placements: [(position: (10.0, 0.0, 0.0)), (position: (-10.0, 0.0, 0.0), yaw: 1.0)]),
            (kind: Bin(category: "organic"), model: "bin.ron", placements: [(position: (0.0, 0.0, 50.0))]),
            "#,
        );

        let runtime = tokio::runtime::Runtime::new().expect("runtime");
        let mut loader = AssetLoader::new(runtime.handle().clone(), dir.path());
        let mut session = session();

        loader.request_manifest(&manifest);
        assert_eq!(loader.pending(), 3);
        settle(&mut loader, &mut session, WAIT);

        assert_eq!(loader.pending(), 0);
        assert_eq!(session.registry().trash_count(), 2);
        assert_eq!(session.registry().bin_count(), 1);
        assert!(session.registry().trash().iter().all(|t| t.category() == Category::Organic));

        let stats = loader.stats();
        assert_eq!(stats.loaded, 3);
        assert_eq!(stats.failed, 0);
        assert_eq!(stats.entities_spawned, 3);
        assert!(stats.bytes_read > 0);

        let hand = session
            .scene()
            .find_descendant(session.character(), "hand")
            .expect("hand bone");
        let hand_pos = session.scene().world_position(hand).expect("position");
        assert!((hand_pos - Vec3::new(10.0, 30.0, 0.0)).length() < 1e-3);
    }

    #[test]
    fn test_failed_asset_is_skipped() {
        let dir = TempDir::new().expect("temp dir");
        write(&dir, "character.ron", CHARACTER);
        write(&dir, "broken.ron", "(name: ");
        write(&dir, "bin.ron", PROP);
        let manifest = manifest(
            &dir,
            r#"
            (kind: Trash(category: "recyclable"), model: "broken.ron", placements: [(position: (1.0, 0.0, 0.0))]),
            (kind: Trash(category: "general"), model: "missing.ron", placements: [(position: (2.0, 0.0, 0.0))]),
            (kind: Trash(category: "plastic"), model: "bin.ron", placements: [(position: (3.0, 0.0, 0.0))]),
            (kind: Bin(category: "general"), model: "bin.ron", placements: [(position: (0.0, 0.0, 50.0))]),
            "#,
        );

        let runtime = tokio::runtime::Runtime::new().expect("runtime");
        let mut loader = AssetLoader::new(runtime.handle().clone(), dir.path());
        let mut session = session();

        loader.request_manifest(&manifest);
        settle(&mut loader, &mut session, WAIT);

        let stats = loader.stats();
        assert_eq!(stats.failed, 3);
        assert_eq!(stats.loaded, 2);
        assert_eq!(session.registry().trash_count(), 0);
        assert_eq!(session.registry().bin_count(), 1);
    }

    #[test]
    fn test_loads_after_teardown_are_dropped() {
        let dir = TempDir::new().expect("temp dir");
        write(&dir, "character.ron", CHARACTER);
        write(&dir, "prop.ron", PROP);
        let manifest = manifest(
            &dir,
            r#"(kind: Trash(category: "general"), model: "prop.ron", placements: [(position: (1.0, 0.0, 0.0))]),"#,
        );

        let runtime = tokio::runtime::Runtime::new().expect("runtime");
        let mut loader = AssetLoader::new(runtime.handle().clone(), dir.path());
        let mut session = session();

        loader.request_manifest(&manifest);
        loader.teardown();
        settle(&mut loader, &mut session, Duration::from_millis(300));

        assert!(!loader.is_live());
        assert_eq!(session.registry().trash_count(), 0);
        assert_eq!(loader.stats().loaded, 0);
    }

    #[test]
    fn test_manifest_version_is_checked() {
        let dir = TempDir::new().expect("temp dir");
        let path = write(&dir, "manifest.ron", "(version: (major: 2, minor: 0, patch: 0))");

        let err = AssetManifest::load(&path).expect_err("future major version");
        assert!(matches!(err, AssetError::Core(EcosortError::VersionMismatch { .. })));
    }

    #[test]
    fn test_missing_manifest_is_not_found() {
        let err = AssetManifest::load(Path::new("/nonexistent/manifest.ron")).expect_err("missing");
        assert!(matches!(err, AssetError::NotFound(_)));
    }
}
