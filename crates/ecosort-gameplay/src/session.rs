//! Game session.
//!
//! A [`GameSession`] owns one playthrough: the scene, the registry, the
//! player, the carry state machine, score and HUD. Restarting the game means
//! dropping the session and building a fresh one.

use ecosort_common::{Category, EntityId, NodeId, WorldError};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::animation::LoopingClip;
use crate::camera::{FollowCamera, DEFAULT_CAMERA_OFFSET, DEFAULT_CAMERA_SMOOTHING};
use crate::entity::{Bin, EntityRegistry, TrashItem};
use crate::events::{EventBus, GameEvent};
use crate::feedback::FeedbackSink;
use crate::hud::{outcome_message, HudState};
use crate::input::{InputEvent, InputOutcome, IntentState, KeyBindings};
use crate::interaction::{
    CarryState, Interaction, InteractionConfig, InteractionContext, InteractionOutcome, DEFAULT_ANCHOR_NAME,
    DEFAULT_BIN_DISTANCE, DEFAULT_HAND_OFFSET, DEFAULT_PICKUP_DISTANCE,
};
use crate::player::{MotionConfig, Player, DEFAULT_MOVE_SPEED, DEFAULT_ROTATION_SPEED};
use crate::progress::{GameProgress, GameState};
use crate::scene::SceneGraph;
use crate::simulation::{Simulation, TickReport};
use crate::world::{SpatialWorld, Transform};

/// Name of the character root node.
pub const CHARACTER_NODE_NAME: &str = "character";

/// Gameplay tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Reach for picking up trash
    pub pickup_distance: f32,
    /// Reach for depositing into a bin
    pub bin_distance: f32,
    /// Walking speed (units/s)
    pub move_speed: f32,
    /// Turning speed (rad/s)
    pub rotation_speed: f32,
    /// Camera offset from the character
    pub camera_offset: [f32; 3],
    /// Camera lerp factor per tick
    pub camera_smoothing: f32,
    /// Carried item offset from the hand
    pub hand_offset: [f32; 3],
    /// Name fragment of the hand bone
    pub anchor_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            pickup_distance: DEFAULT_PICKUP_DISTANCE,
            bin_distance: DEFAULT_BIN_DISTANCE,
            move_speed: DEFAULT_MOVE_SPEED,
            rotation_speed: DEFAULT_ROTATION_SPEED,
            camera_offset: DEFAULT_CAMERA_OFFSET.to_array(),
            camera_smoothing: DEFAULT_CAMERA_SMOOTHING,
            hand_offset: DEFAULT_HAND_OFFSET.to_array(),
            anchor_name: DEFAULT_ANCHOR_NAME.to_string(),
        }
    }
}

impl SessionConfig {
    /// Clamps values into usable ranges.
    pub fn validate(&mut self) {
        self.pickup_distance = self.pickup_distance.clamp(1.0, 1000.0);
        self.bin_distance = self.bin_distance.clamp(1.0, 1000.0);
        self.move_speed = self.move_speed.clamp(1.0, 2000.0);
        self.rotation_speed = self.rotation_speed.clamp(0.1, 20.0);
        self.camera_smoothing = self.camera_smoothing.clamp(0.01, 1.0);
        if self.anchor_name.trim().is_empty() {
            self.anchor_name = DEFAULT_ANCHOR_NAME.to_string();
        }
    }

    /// Interaction tunables.
    #[must_use]
    pub fn interaction(&self) -> InteractionConfig {
        InteractionConfig {
            pickup_distance: self.pickup_distance,
            bin_distance: self.bin_distance,
            hand_offset: Vec3::from_array(self.hand_offset),
            anchor_name: self.anchor_name.clone(),
        }
    }

    /// Motion tunables.
    #[must_use]
    pub const fn motion(&self) -> MotionConfig {
        MotionConfig {
            move_speed: self.move_speed,
            rotation_speed: self.rotation_speed,
        }
    }

    /// Follow camera at rest.
    #[must_use]
    pub fn camera(&self) -> FollowCamera {
        FollowCamera::new(Vec3::from_array(self.camera_offset), self.camera_smoothing)
    }
}

/// One playthrough.
pub struct GameSession {
    config: SessionConfig,
    scene: SceneGraph,
    registry: EntityRegistry,
    player: Player,
    interaction: Interaction,
    progress: GameProgress,
    simulation: Simulation,
    bindings: KeyBindings,
    events: EventBus,
    feedback: Box<dyn FeedbackSink>,
    hud: HudState,
}

impl std::fmt::Debug for GameSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameSession")
            .field("score", &self.progress.score())
            .field("state", &self.progress.state())
            .field("trash", &self.registry.trash_count())
            .field("bins", &self.registry.bin_count())
            .field("carry", self.interaction.carry())
            .finish_non_exhaustive()
    }
}

impl GameSession {
    /// Creates a session with an empty scene holding only the character root.
    pub fn new(mut config: SessionConfig, feedback: Box<dyn FeedbackSink>) -> Result<Self, WorldError> {
        config.validate();

        let mut scene = SceneGraph::new();
        let character = scene.spawn_at_root(CHARACTER_NODE_NAME, Transform::IDENTITY)?;

        let mut simulation = Simulation::new(config.motion(), config.camera(), LoopingClip::default());
        simulation.camera_mut().snap_to(Vec3::ZERO);

        info!("New game session started");
        Ok(Self {
            interaction: Interaction::new(config.interaction()),
            config,
            scene,
            registry: EntityRegistry::new(),
            player: Player::new(character),
            progress: GameProgress::new(),
            simulation,
            bindings: KeyBindings::default(),
            events: EventBus::default(),
            feedback,
            hud: HudState::default(),
        })
    }

    /// Active tunables.
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Scene graph.
    #[must_use]
    pub const fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    /// Mutable scene graph, used by the loader to build the character model.
    pub fn scene_mut(&mut self) -> &mut SceneGraph {
        &mut self.scene
    }

    /// Floor trash and bins.
    #[must_use]
    pub const fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    /// The player character.
    #[must_use]
    pub const fn player(&self) -> &Player {
        &self.player
    }

    /// Character root node.
    #[must_use]
    pub const fn character(&self) -> NodeId {
        self.player.node()
    }

    /// Score and game state.
    #[must_use]
    pub const fn progress(&self) -> &GameProgress {
        &self.progress
    }

    /// Overall game state.
    #[must_use]
    pub const fn state(&self) -> GameState {
        self.progress.state()
    }

    /// What the player holds.
    #[must_use]
    pub const fn carry(&self) -> &CarryState {
        self.interaction.carry()
    }

    /// Simulation state (camera, walk clip).
    #[must_use]
    pub const fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    /// Key bindings.
    pub fn bindings_mut(&mut self) -> &mut KeyBindings {
        &mut self.bindings
    }

    /// Event bus.
    #[must_use]
    pub const fn events(&self) -> &EventBus {
        &self.events
    }

    /// HUD snapshot.
    #[must_use]
    pub const fn hud(&self) -> &HudState {
        &self.hud
    }

    /// Places a trash item on the floor.
    ///
    /// `label` spawns a decorative child node carrying the given text as its
    /// name; it disappears together with the item.
    pub fn spawn_trash(
        &mut self,
        category: Category,
        placement: Transform,
        label: Option<&str>,
    ) -> Result<EntityId, WorldError> {
        let node = self.scene.spawn_at_root(format!("trash:{category}"), placement)?;
        let mut item = TrashItem::new(category, node, placement.scale);
        if let Some(text) = label {
            let label_node = self.scene.spawn(text, node, Transform::from_translation(Vec3::Y * 10.0))?;
            item = item.with_label(label_node);
        }

        let entity_id = self.registry.add_trash(item);
        self.events.publish(GameEvent::EntitySpawned {
            entity_id,
            category,
            is_bin: false,
        });
        debug!(%entity_id, %category, "Spawned trash");
        Ok(entity_id)
    }

    /// Places a bin.
    pub fn spawn_bin(&mut self, category: Category, placement: Transform) -> Result<EntityId, WorldError> {
        let node = self.scene.spawn_at_root(format!("bin:{category}"), placement)?;
        let entity_id = self.registry.add_bin(Bin::new(category, node));
        self.events.publish(GameEvent::EntitySpawned {
            entity_id,
            category,
            is_bin: true,
        });
        debug!(%entity_id, %category, "Spawned bin");
        Ok(entity_id)
    }

    /// Applies one key edge to `intent`, running an interaction on interact.
    ///
    /// Once the game has ended every event is ignored.
    pub fn handle_input(&mut self, event: InputEvent, intent: &mut IntentState) -> Result<InputOutcome, WorldError> {
        if !self.progress.is_playing() {
            return Ok(InputOutcome::Ignored);
        }

        let outcome = intent.apply(event, &self.bindings);
        if outcome == InputOutcome::Interact {
            self.interact(intent)?;
        }
        Ok(outcome)
    }

    /// Runs one interaction and propagates its effects to events and HUD.
    pub fn interact(&mut self, intent: &mut IntentState) -> Result<InteractionOutcome, WorldError> {
        let outcome = self.interaction.interact(InteractionContext {
            world: &mut self.scene,
            registry: &mut self.registry,
            player: &self.player,
            progress: &mut self.progress,
            feedback: self.feedback.as_mut(),
        })?;

        match outcome {
            InteractionOutcome::PickedUp { entity, category } => {
                self.events.publish(GameEvent::TrashPickedUp {
                    entity_id: entity,
                    category,
                });
            },
            InteractionOutcome::Deposited {
                entity,
                item_category,
                bin_category,
                correct,
                transition,
            } => {
                self.events.publish(GameEvent::TrashDeposited {
                    entity_id: entity,
                    item_category,
                    bin_category,
                    correct,
                });
                self.events.publish(GameEvent::ScoreChanged {
                    score: transition.score,
                    delta: transition.delta,
                });
                if transition.ended_game() {
                    self.events.publish(GameEvent::GameEnded {
                        state: transition.current,
                        score: transition.score,
                    });
                    intent.freeze();
                    self.simulation.pause_animation();
                }
            },
            InteractionOutcome::Ignored
            | InteractionOutcome::NothingInRange
            | InteractionOutcome::NoBinInRange { .. } => {},
        }

        if let Some(message) = outcome_message(&outcome) {
            self.hud.set_message(message);
        }
        self.sync_hud();
        Ok(outcome)
    }

    /// Advances the simulation by `delta` seconds.
    pub fn tick(&mut self, intent: &IntentState, delta: f32) -> Result<TickReport, WorldError> {
        self.simulation
            .tick(&mut self.scene, &mut self.player, intent, self.progress.state(), delta)
    }

    /// Character world position.
    #[must_use]
    pub fn player_position(&self) -> Option<Vec3> {
        self.scene.world_position(self.player.node())
    }

    fn sync_hud(&mut self) {
        let carrying = self.interaction.carry().item().map(TrashItem::category);
        self.hud.sync(&self.progress, carrying);
    }
}
