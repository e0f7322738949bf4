//! Pickup and deposit state machine.
//!
//! The player is either empty-handed or carrying exactly one item. A single
//! interact signal drives both transitions:
//! - empty-handed: pick up the nearest floor item within reach
//! - carrying: drop the item into the nearest bin within reach and score it
//!
//! A deposited item is consumed whether or not the bin was right; it never
//! returns to the floor.

use ecosort_common::{Category, EntityId, WorldError};
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::entity::{EntityRegistry, Located, TrashItem};
use crate::feedback::{play_cue, FeedbackSink, SoundCue};
use crate::player::Player;
use crate::progress::{GameProgress, ProgressTransition};
use crate::proximity::nearest;
use crate::world::{compensated_local_scale, SpatialWorld, Transform};

/// Default reach for picking up floor items.
pub const DEFAULT_PICKUP_DISTANCE: f32 = 40.0;

/// Default reach for depositing into bins.
pub const DEFAULT_BIN_DISTANCE: f32 = 70.0;

/// Default local offset of a carried item from its anchor.
pub const DEFAULT_HAND_OFFSET: Vec3 = Vec3::new(0.0, 5.0, 10.0);

/// Default name fragment identifying the hand bone.
pub const DEFAULT_ANCHOR_NAME: &str = "hand";

/// Tunables for interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionConfig {
    /// Reach for picking up items
    pub pickup_distance: f32,
    /// Reach for depositing into bins
    pub bin_distance: f32,
    /// Local offset of a carried item from the anchor
    pub hand_offset: Vec3,
    /// Name fragment of the anchor bone
    pub anchor_name: String,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            pickup_distance: DEFAULT_PICKUP_DISTANCE,
            bin_distance: DEFAULT_BIN_DISTANCE,
            hand_offset: DEFAULT_HAND_OFFSET,
            anchor_name: DEFAULT_ANCHOR_NAME.to_string(),
        }
    }
}

/// What the player is holding.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CarryState {
    /// Hands are free
    #[default]
    EmptyHanded,
    /// Holding one item
    Carrying(TrashItem),
}

impl CarryState {
    /// The carried item, if any.
    #[must_use]
    pub fn item(&self) -> Option<&TrashItem> {
        match self {
            Self::EmptyHanded => None,
            Self::Carrying(item) => Some(item),
        }
    }

    /// Whether an item is held.
    #[must_use]
    pub fn is_carrying(&self) -> bool {
        matches!(self, Self::Carrying(_))
    }
}

/// Result of one interact signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionOutcome {
    /// The game is over; nothing happened
    Ignored,
    /// An item moved from the floor into the player's hands
    PickedUp {
        /// Item picked up
        entity: EntityId,
        /// Its category
        category: Category,
    },
    /// Empty-handed and no item within reach
    NothingInRange,
    /// Carrying and no bin within reach
    NoBinInRange {
        /// Category of the item still held
        carrying: Category,
    },
    /// The carried item went into a bin
    Deposited {
        /// Item consumed
        entity: EntityId,
        /// Its category
        item_category: Category,
        /// Category of the bin
        bin_category: Category,
        /// Whether the categories matched
        correct: bool,
        /// Score/state change this caused
        transition: ProgressTransition,
    },
}

impl InteractionOutcome {
    /// Whether this outcome changed carry slot, registry or score.
    #[must_use]
    pub fn changed_state(&self) -> bool {
        matches!(self, Self::PickedUp { .. } | Self::Deposited { .. })
    }
}

/// Everything one interaction reads or mutates.
pub struct InteractionContext<'a, W: SpatialWorld + ?Sized> {
    /// Scene the entities live in
    pub world: &'a mut W,
    /// Floor trash and bins
    pub registry: &'a mut EntityRegistry,
    /// The player character
    pub player: &'a Player,
    /// Score and game state
    pub progress: &'a mut GameProgress,
    /// Sound cue output
    pub feedback: &'a mut dyn FeedbackSink,
}

/// The carry state machine.
#[derive(Debug, Clone, Default)]
pub struct Interaction {
    config: InteractionConfig,
    carry: CarryState,
}

impl Interaction {
    /// Creates an empty-handed state machine.
    #[must_use]
    pub fn new(config: InteractionConfig) -> Self {
        Self {
            config,
            carry: CarryState::EmptyHanded,
        }
    }

    /// Current carry state.
    #[must_use]
    pub const fn carry(&self) -> &CarryState {
        &self.carry
    }

    /// Active tunables.
    #[must_use]
    pub const fn config(&self) -> &InteractionConfig {
        &self.config
    }

    /// Handles one interact signal.
    ///
    /// World errors abort the transition before the registry or carry slot is
    /// touched, so a failed pickup leaves the item on the floor.
    pub fn interact<W: SpatialWorld + ?Sized>(
        &mut self,
        ctx: InteractionContext<'_, W>,
    ) -> Result<InteractionOutcome, WorldError> {
        if !ctx.progress.is_playing() {
            return Ok(InteractionOutcome::Ignored);
        }

        match std::mem::take(&mut self.carry) {
            CarryState::EmptyHanded => self.try_pickup(ctx),
            CarryState::Carrying(item) => self.try_deposit(item, ctx),
        }
    }

    fn try_pickup<W: SpatialWorld + ?Sized>(
        &mut self,
        ctx: InteractionContext<'_, W>,
    ) -> Result<InteractionOutcome, WorldError> {
        let Some(origin) = ctx.player.position(&*ctx.world) else {
            return Err(WorldError::NodeNotFound(ctx.player.node()));
        };

        let Some(target) = nearest(ctx.registry.trash(), &*ctx.world, origin, self.config.pickup_distance)
        else {
            debug!(?origin, "Nothing within pickup reach");
            return Ok(InteractionOutcome::NothingInRange);
        };
        let (entity, node, category, base_scale) =
            (target.id(), target.world_handle(), target.category(), target.base_scale());

        let anchor = ctx.player.anchor(&*ctx.world, &self.config.anchor_name);
        let anchor_scale = ctx
            .world
            .world_scale(anchor)
            .ok_or(WorldError::NodeNotFound(anchor))?;

        ctx.world.attach(node, anchor)?;
        ctx.world.set_local_transform(
            node,
            Transform {
                translation: self.config.hand_offset,
                rotation: Quat::IDENTITY,
                scale: compensated_local_scale(base_scale, anchor_scale),
            },
        )?;

        let Some(item) = ctx.registry.remove_trash(entity) else {
            return Err(WorldError::NodeNotFound(node));
        };
        self.carry = CarryState::Carrying(item);

        play_cue(ctx.feedback, SoundCue::Pickup);
        debug!(%entity, %category, "Picked up trash");
        Ok(InteractionOutcome::PickedUp { entity, category })
    }

    fn try_deposit<W: SpatialWorld + ?Sized>(
        &mut self,
        item: TrashItem,
        ctx: InteractionContext<'_, W>,
    ) -> Result<InteractionOutcome, WorldError> {
        let origin = match ctx.player.position(&*ctx.world) {
            Some(origin) => origin,
            None => {
                let node = ctx.player.node();
                self.carry = CarryState::Carrying(item);
                return Err(WorldError::NodeNotFound(node));
            },
        };

        let Some(bin) = nearest(ctx.registry.bins(), &*ctx.world, origin, self.config.bin_distance) else {
            let carrying = item.category();
            self.carry = CarryState::Carrying(item);
            debug!(?origin, "No bin within reach");
            return Ok(InteractionOutcome::NoBinInRange { carrying });
        };

        let correct = bin.accepts(&item);
        let bin_category = bin.category();

        if let Err(e) = ctx.world.detach(item.world_handle()) {
            warn!(entity = %item.id(), error = %e, "Carried item already gone from scene");
        }
        // A label parented under the item went with it above.
        if let Some(label) = item.label().filter(|&label| ctx.world.world_position(label).is_some()) {
            if let Err(e) = ctx.world.detach(label) {
                warn!(entity = %item.id(), error = %e, "Failed to remove item label");
            }
        }

        let Some(transition) = ctx.progress.record_deposit(item.category(), correct) else {
            return Ok(InteractionOutcome::Ignored);
        };

        play_cue(
            ctx.feedback,
            if correct {
                SoundCue::Correct
            } else {
                SoundCue::Incorrect
            },
        );
        debug!(entity = %item.id(), item = %item.category(), bin = %bin_category, correct, "Deposited trash");

        Ok(InteractionOutcome::Deposited {
            entity: item.id(),
            item_category: item.category(),
            bin_category,
            correct,
            transition,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Bin;
    use crate::feedback::RecordingFeedback;
    use crate::progress::GameState;
    use crate::scene::SceneGraph;

    struct Fixture {
        scene: SceneGraph,
        registry: EntityRegistry,
        player: Player,
        progress: GameProgress,
        feedback: RecordingFeedback,
        interaction: Interaction,
    }

    impl Fixture {
        fn new() -> Self {
            let mut scene = SceneGraph::new();
            let character = scene
                .spawn_at_root("character", Transform::IDENTITY.with_scale(Vec3::splat(0.5)))
                .expect("character");
            Self {
                scene,
                registry: EntityRegistry::new(),
                player: Player::new(character),
                progress: GameProgress::new(),
                feedback: RecordingFeedback::new(),
                interaction: Interaction::new(InteractionConfig::default()),
            }
        }

        fn trash(&mut self, category: Category, at: Vec3) -> EntityId {
            let node = self
                .scene
                .spawn_at_root("trash", Transform::from_translation(at).with_scale(Vec3::splat(2.0)))
                .expect("trash node");
            self.registry.add_trash(TrashItem::new(category, node, Vec3::splat(2.0)))
        }

        fn bin(&mut self, category: Category, at: Vec3) {
            let node = self
                .scene
                .spawn_at_root("bin", Transform::from_translation(at))
                .expect("bin node");
            self.registry.add_bin(Bin::new(category, node));
        }

        fn interact(&mut self) -> InteractionOutcome {
            self.interaction
                .interact(InteractionContext {
                    world: &mut self.scene,
                    registry: &mut self.registry,
                    player: &self.player,
                    progress: &mut self.progress,
                    feedback: &mut self.feedback,
                })
                .expect("interact")
        }
    }

    #[test]
    fn test_pickup_moves_item_into_hand() {
        let mut f = Fixture::new();
        let hand = f
            .scene
            .spawn("mixamorigRightHand", f.player.node(), Transform::IDENTITY.with_scale(Vec3::splat(0.1)))
            .expect("hand");
        let near = f.trash(Category::Organic, Vec3::new(10.0, 0.0, 0.0));
        let far = f.trash(Category::General, Vec3::new(30.0, 0.0, 0.0));

        let outcome = f.interact();

        assert_eq!(outcome, InteractionOutcome::PickedUp { entity: near, category: Category::Organic });
        assert!(outcome.changed_state());
        assert!(!f.registry.contains_trash(near));
        assert!(f.registry.contains_trash(far));
        let held = f.interaction.carry().item().expect("carrying");
        assert_eq!(held.id(), near);

        let node = held.world_handle();
        assert_eq!(f.scene.parent(node), Some(hand));
        let world_scale = f.scene.world_scale(node).expect("scale");
        assert!((world_scale - Vec3::splat(2.0)).length() < 1e-3);
        assert_eq!(f.feedback.played(), &[SoundCue::Pickup]);
    }

    #[test]
    fn test_pickup_without_hand_uses_character_root() {
        let mut f = Fixture::new();
        let id = f.trash(Category::Recyclable, Vec3::new(0.0, 0.0, 20.0));

        f.interact();

        let held = f.interaction.carry().item().expect("carrying");
        assert_eq!(held.id(), id);
        assert_eq!(f.scene.parent(held.world_handle()), Some(f.player.node()));
        let local = f.scene.local_transform(held.world_handle()).expect("local");
        assert_eq!(local.translation, DEFAULT_HAND_OFFSET);
        assert!((local.scale - Vec3::splat(4.0)).length() < 1e-4);
    }

    #[test]
    fn test_pickup_out_of_range_changes_nothing() {
        let mut f = Fixture::new();
        f.trash(Category::Organic, Vec3::new(40.0, 0.0, 0.0));

        let outcome = f.interact();
        assert_eq!(outcome, InteractionOutcome::NothingInRange);
        assert!(!outcome.changed_state());
        assert!(!f.interaction.carry().is_carrying());
        assert_eq!(f.registry.trash_count(), 1);
        assert!(f.feedback.played().is_empty());
    }

    #[test]
    fn test_no_bin_in_range_keeps_item() {
        let mut f = Fixture::new();
        let id = f.trash(Category::Organic, Vec3::new(5.0, 0.0, 0.0));
        f.bin(Category::Organic, Vec3::new(100.0, 0.0, 0.0));
        f.interact();

        let outcome = f.interact();

        assert_eq!(outcome, InteractionOutcome::NoBinInRange { carrying: Category::Organic });
        assert_eq!(f.interaction.carry().item().map(TrashItem::id), Some(id));
        assert_eq!(f.progress.score(), 0);
        assert_eq!(f.progress.state(), GameState::Playing);
    }

    #[test]
    fn test_wrong_bin_discards_item_and_costs_a_point() {
        let mut f = Fixture::new();
        let id = f.trash(Category::Organic, Vec3::new(5.0, 0.0, 0.0));
        f.bin(Category::Recyclable, Vec3::new(0.0, 0.0, 50.0));
        f.interact();
        let node = f.interaction.carry().item().map(TrashItem::world_handle).expect("node");

        let outcome = f.interact();

        let InteractionOutcome::Deposited { entity, transition, bin_category, correct, .. } = outcome else {
            panic!("expected deposit, got {outcome:?}");
        };
        assert_eq!(entity, id);
        assert_eq!(bin_category, Category::Recyclable);
        assert!(!correct);
        assert_eq!(transition.delta, -1);
        assert_eq!(f.progress.score(), -1);
        assert_eq!(f.progress.deposited(Category::Organic), 0);
        assert!(!f.interaction.carry().is_carrying());
        assert!(!f.registry.contains_trash(id));
        assert!(!f.scene.contains(node));
        assert_eq!(f.feedback.played(), &[SoundCue::Pickup, SoundCue::Incorrect]);
    }

    #[test]
    fn test_deposit_removes_free_standing_label() {
        let mut f = Fixture::new();
        let item_node = f
            .scene
            .spawn_at_root("trash", Transform::from_translation(Vec3::new(5.0, 0.0, 0.0)))
            .expect("trash node");
        let label = f
            .scene
            .spawn_at_root("label", Transform::from_translation(Vec3::new(5.0, 20.0, 0.0)))
            .expect("label node");
        f.registry
            .add_trash(TrashItem::new(Category::General, item_node, Vec3::ONE).with_label(label));
        f.bin(Category::General, Vec3::new(0.0, 0.0, 50.0));
        f.interact();

        let outcome = f.interact();

        assert!(matches!(outcome, InteractionOutcome::Deposited { correct: true, .. }));
        assert!(!f.scene.contains(item_node));
        assert!(!f.scene.contains(label));
    }

    #[test]
    fn test_terminal_state_ignores_interact() {
        let mut f = Fixture::new();
        f.trash(Category::Organic, Vec3::new(5.0, 0.0, 0.0));
        f.progress.record_deposit(Category::General, false);
        f.progress.record_deposit(Category::General, false);

        assert_eq!(f.interact(), InteractionOutcome::Ignored);
        assert_eq!(f.registry.trash_count(), 1);
        assert!(!f.interaction.carry().is_carrying());
    }
}
