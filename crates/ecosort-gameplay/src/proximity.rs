//! Nearest-within-radius queries.
//!
//! Scenes hold dozens of entities at most, so queries are a flat linear scan
//! over the candidate slice rather than a spatial index.

use glam::Vec3;

use crate::entity::Located;
use crate::world::SpatialWorld;

/// Nearest candidate strictly closer than `max_radius` to `origin`.
#[must_use]
pub fn nearest<'a, T, W>(candidates: &'a [T], world: &W, origin: Vec3, max_radius: f32) -> Option<&'a T>
where
    T: Located,
    W: SpatialWorld + ?Sized,
{
    nearest_with_distance(candidates, world, origin, max_radius).map(|(candidate, _)| candidate)
}

/// Like [`nearest`], also returning the distance to the winner.
///
/// The running best starts at `max_radius` and only a strictly smaller
/// distance replaces it, so candidates at exactly the radius are excluded and
/// the first of several equidistant candidates wins. Candidates whose node no
/// longer resolves in the world are skipped.
#[must_use]
pub fn nearest_with_distance<'a, T, W>(
    candidates: &'a [T],
    world: &W,
    origin: Vec3,
    max_radius: f32,
) -> Option<(&'a T, f32)>
where
    T: Located,
    W: SpatialWorld + ?Sized,
{
    let mut best: Option<&'a T> = None;
    let mut best_distance = max_radius;

    for candidate in candidates {
        let Some(position) = world.world_position(candidate.world_handle()) else {
            continue;
        };
        let distance = position.distance(origin);
        if distance < best_distance {
            best = Some(candidate);
            best_distance = distance;
        }
    }

    best.map(|candidate| (candidate, best_distance))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneGraph;
    use crate::world::Transform;
    use ecosort_common::NodeId;
    use proptest::prelude::*;

    #[derive(Debug, PartialEq)]
    struct Marker(NodeId);

    impl Located for Marker {
        fn world_handle(&self) -> NodeId {
            self.0
        }
    }

    fn scene_with(points: &[Vec3]) -> (SceneGraph, Vec<Marker>) {
        let mut scene = SceneGraph::new();
        let markers = points
            .iter()
            .map(|p| {
                Marker(
                    scene
                        .spawn_at_root("marker", Transform::from_translation(*p))
                        .expect("spawn marker"),
                )
            })
            .collect();
        (scene, markers)
    }

    #[test]
    fn test_empty_candidates_return_none() {
        let scene = SceneGraph::new();
        let markers: Vec<Marker> = Vec::new();
        assert!(nearest(&markers, &scene, Vec3::ZERO, 100.0).is_none());
    }

    #[test]
    fn test_picks_closest_within_radius() {
        let (scene, markers) = scene_with(&[
            Vec3::new(30.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 10.0),
            Vec3::new(5.0, 0.0, 5.0),
        ]);

        let (hit, distance) = nearest_with_distance(&markers, &scene, Vec3::ZERO, 40.0).expect("hit");
        assert_eq!(hit, &markers[2]);
        assert!((distance - 50.0_f32.sqrt()).abs() < 1e-4);
    }

    #[test]
    fn test_candidate_at_exact_radius_is_excluded() {
        let (scene, markers) = scene_with(&[Vec3::new(40.0, 0.0, 0.0)]);
        assert!(nearest(&markers, &scene, Vec3::ZERO, 40.0).is_none());
        assert!(nearest(&markers, &scene, Vec3::ZERO, 40.01).is_some());
    }

    #[test]
    fn test_first_of_equidistant_candidates_wins() {
        let (scene, markers) = scene_with(&[Vec3::new(3.0, 0.0, 0.0), Vec3::new(-3.0, 0.0, 0.0)]);
        assert_eq!(nearest(&markers, &scene, Vec3::ZERO, 10.0), Some(&markers[0]));
    }

    #[test]
    fn test_despawned_candidates_are_skipped() {
        use crate::world::SpatialWorld as _;

        let (mut scene, markers) = scene_with(&[Vec3::new(1.0, 0.0, 0.0), Vec3::new(5.0, 0.0, 0.0)]);
        scene.detach(markers[0].0).expect("detach");
        assert_eq!(nearest(&markers, &scene, Vec3::ZERO, 10.0), Some(&markers[1]));
    }

    proptest! {
        #[test]
        fn prop_nearest_is_strict_minimum_within_radius(
            points in prop::collection::vec((-100.0f32..100.0, -100.0f32..100.0, -100.0f32..100.0), 0..24),
            radius in 0.1f32..150.0,
        ) {
            let points: Vec<Vec3> = points.into_iter().map(|(x, y, z)| Vec3::new(x, y, z)).collect();
            let (scene, markers) = scene_with(&points);
            let origin = Vec3::ZERO;
            let distances: Vec<f32> = points.iter().map(|p| p.distance(origin)).collect();

            match nearest_with_distance(&markers, &scene, origin, radius) {
                None => prop_assert!(distances.iter().all(|d| *d >= radius - 1e-3)),
                Some((hit, distance)) => {
                    prop_assert!(distance < radius);
                    prop_assert!(markers.iter().any(|m| m == hit));
                    for d in &distances {
                        prop_assert!(*d >= distance - 1e-3);
                    }
                }
            }
        }
    }
}
