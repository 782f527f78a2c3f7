//! Region growth over mesh topology from a hit triangle.
//!
//! Two policies are supported (see [`SelectionPolicy`]):
//! - one-ring: the hit triangle and every triangle sharing a vertex with it
//! - flood fill: breadth-first growth that stops at triangles further than
//!   the radius from the hit point and never crosses into triangles facing
//!   away from the viewer

use std::collections::VecDeque;

use glam::Vec3;
use skinpaint_config::SelectionPolicy;
use tracing::trace;

use crate::cache::TriangleCache;
use crate::topology::TopologyIndex;

/// Parameters for one region growth pass, all in mesh space
#[derive(Debug, Clone, Copy)]
pub struct RegionQuery {
    /// Hit point the distance cutoff is measured from
    pub point: Vec3,
    /// Maximum distance from `point` to a selected triangle. Negative and
    /// NaN radii select only the hit triangle.
    pub radius: f32,
    /// Direction towards the viewer (negated ray direction)
    pub facing: Vec3,
    /// Minimum `dot(facing, normal)` for a triangle to be entered
    pub facing_epsilon: f32,
}

/// Output of a region growth pass
#[derive(Debug, Clone, Default)]
pub struct Region {
    /// Triangles selected for painting
    pub in_range: Vec<u32>,
    /// Every triangle examined, in visit order
    pub visited: Vec<u32>,
}

impl Region {
    pub fn clear(&mut self) {
        self.in_range.clear();
        self.visited.clear();
    }
}

/// Reusable scratch state for region growth.
#[derive(Debug, Clone, Default)]
pub struct RegionGrower {
    open: VecDeque<u32>,
    seen: Vec<bool>,
    neighbors: Vec<u32>,
}

impl RegionGrower {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grow a region from `start` into `out`, replacing its contents.
    pub fn grow(
        &mut self,
        policy: SelectionPolicy,
        start: u32,
        cache: &TriangleCache,
        topology: &TopologyIndex,
        query: &RegionQuery,
        out: &mut Region,
    ) {
        out.clear();
        match policy {
            SelectionPolicy::OneRing => self.one_ring(start, topology, out),
            SelectionPolicy::FloodFill => self.flood_fill(start, cache, topology, query, out),
        }
        trace!(
            "grow_region: {:?} from triangle {}, {} in range, {} visited",
            policy,
            start,
            out.in_range.len(),
            out.visited.len()
        );
    }

    fn one_ring(&mut self, start: u32, topology: &TopologyIndex, out: &mut Region) {
        out.in_range.push(start);
        topology.one_ring(start as usize, &mut out.in_range);
        out.visited.extend_from_slice(&out.in_range);
    }

    fn flood_fill(
        &mut self,
        start: u32,
        cache: &TriangleCache,
        topology: &TopologyIndex,
        query: &RegionQuery,
        out: &mut Region,
    ) {
        // f32::max drops NaN
        let radius = query.radius.max(0.0);
        let sqr_radius = radius * radius;

        self.open.clear();
        self.seen.clear();
        self.seen.resize(cache.len(), false);

        let Some(start_seen) = self.seen.get_mut(start as usize) else {
            return;
        };
        *start_seen = true;
        out.visited.push(start);
        self.open.push_back(start);

        while let Some(tri_idx) = self.open.pop_front() {
            let Some(triangle) = cache.get(tri_idx as usize) else {
                continue;
            };

            // The hit triangle is always kept, even if float error puts the
            // hit point a hair outside a zero radius
            if tri_idx != start && triangle.sqr_distance_to(query.point) > sqr_radius {
                continue;
            }
            out.in_range.push(tri_idx);

            self.neighbors.clear();
            topology.one_ring(tri_idx as usize, &mut self.neighbors);

            for &neighbor in &self.neighbors {
                // Cache and topology may disagree if the host rebuilt one alone
                let Some(seen) = self.seen.get_mut(neighbor as usize) else {
                    continue;
                };
                if *seen {
                    continue;
                }
                *seen = true;
                out.visited.push(neighbor);

                let facing = cache
                    .get(neighbor as usize)
                    .and_then(|tri| tri.normal())
                    .map(|normal| query.facing.dot(normal));
                match facing {
                    Some(dot) if dot >= query.facing_epsilon => self.open.push_back(neighbor),
                    _ => {}
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skinpaint_config::DEFAULT_FACING_EPSILON;

    /// Strip of unit squares along +x, two triangles each, facing +z.
    fn strip(squares: u32) -> (Vec<Vec3>, Vec<u32>) {
        let mut positions = Vec::new();
        for i in 0..=squares {
            positions.push(Vec3::new(i as f32, 0.0, 0.0));
            positions.push(Vec3::new(i as f32, 1.0, 0.0));
        }
        let mut indices = Vec::new();
        for i in 0..squares {
            let (a, b, c, d) = (2 * i, 2 * i + 2, 2 * i + 3, 2 * i + 1);
            indices.extend_from_slice(&[a, b, c, a, c, d]);
        }
        (positions, indices)
    }

    fn setup(positions: &[Vec3], indices: &[u32]) -> (TriangleCache, TopologyIndex) {
        let topology = TopologyIndex::from_indices(positions.len(), indices).unwrap();
        let mut cache = TriangleCache::new();
        cache.rebuild(positions, topology.triangles()).unwrap();
        (cache, topology)
    }

    fn query(point: Vec3, radius: f32) -> RegionQuery {
        RegionQuery {
            point,
            radius,
            facing: Vec3::Z,
            facing_epsilon: DEFAULT_FACING_EPSILON,
        }
    }

    fn sorted(mut v: Vec<u32>) -> Vec<u32> {
        v.sort_unstable();
        v
    }

    #[test]
    fn test_strip_faces_up() {
        let (positions, indices) = strip(1);
        let (cache, _) = setup(&positions, &indices);
        for tri in cache.triangles() {
            assert!(tri.normal().unwrap().dot(Vec3::Z) > 0.99);
        }
    }

    #[test]
    fn test_one_ring_ignores_radius() {
        let (positions, indices) = strip(4);
        let (cache, topology) = setup(&positions, &indices);
        let mut grower = RegionGrower::new();
        let mut region = Region::default();

        // Triangle 0 spans vertices 0, 2, 3
        grower.grow(
            SelectionPolicy::OneRing,
            0,
            &cache,
            &topology,
            &query(Vec3::new(0.6, 0.3, 0.0), 0.0),
            &mut region,
        );
        assert_eq!(region.in_range[0], 0);
        assert_eq!(sorted(region.in_range.clone()), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_flood_fill_bounded_by_radius() {
        let (positions, indices) = strip(10);
        let (cache, topology) = setup(&positions, &indices);
        let mut grower = RegionGrower::new();
        let mut region = Region::default();

        grower.grow(
            SelectionPolicy::FloodFill,
            0,
            &cache,
            &topology,
            &query(Vec3::new(0.6, 0.3, 0.0), 1.5),
            &mut region,
        );

        // Squares 0 to 2 come within 1.5 of the hit point, square 3 does not
        let hit = Vec3::new(0.6, 0.3, 0.0);
        for &tri in &region.in_range {
            assert!(cache.get(tri as usize).unwrap().sqr_distance_to(hit) <= 2.25);
        }
        assert_eq!(sorted(region.in_range.clone()), vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_flood_fill_zero_radius_keeps_start() {
        let (positions, indices) = strip(3);
        let (cache, topology) = setup(&positions, &indices);
        let mut grower = RegionGrower::new();
        let mut region = Region::default();

        grower.grow(
            SelectionPolicy::FloodFill,
            2,
            &cache,
            &topology,
            &query(Vec3::new(1.6, 0.3, 0.0), 0.0),
            &mut region,
        );
        assert_eq!(region.in_range, vec![2]);
        // Neighbors were examined but rejected
        assert!(region.visited.len() > 1);
        assert_eq!(region.visited[0], 2);
    }

    #[test]
    fn test_flood_fill_large_radius_covers_strip() {
        let (positions, indices) = strip(5);
        let (cache, topology) = setup(&positions, &indices);
        let mut grower = RegionGrower::new();
        let mut region = Region::default();

        grower.grow(
            SelectionPolicy::FloodFill,
            4,
            &cache,
            &topology,
            &query(Vec3::new(2.6, 0.3, 0.0), 100.0),
            &mut region,
        );
        assert_eq!(sorted(region.in_range.clone()), (0..10).collect::<Vec<_>>());
        assert_eq!(sorted(region.visited.clone()), (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_flood_fill_stops_at_back_facing() {
        // Square 1 is folded under square 0, facing -z
        let positions = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 0.0, -0.1),
            Vec3::new(0.0, 1.0, -0.1),
        ];
        let indices = vec![
            0, 2, 3, 0, 3, 1, // square 0, facing +z
            2, 4, 5, 2, 5, 3, // square 1, facing -z
        ];
        let (cache, topology) = setup(&positions, &indices);
        assert!(cache.get(2).unwrap().normal().unwrap().z < 0.0);

        let mut grower = RegionGrower::new();
        let mut region = Region::default();
        grower.grow(
            SelectionPolicy::FloodFill,
            0,
            &cache,
            &topology,
            &query(Vec3::new(0.6, 0.3, 0.0), 100.0),
            &mut region,
        );
        assert_eq!(sorted(region.in_range.clone()), vec![0, 1]);
        assert!(region.visited.contains(&2));
        assert!(region.visited.contains(&3));
    }

    #[test]
    fn test_flood_fill_invalid_radius_keeps_start() {
        let (positions, indices) = strip(6);
        let (cache, topology) = setup(&positions, &indices);
        let mut grower = RegionGrower::new();
        let mut region = Region::default();

        for radius in [-1.5, f32::NAN] {
            grower.grow(
                SelectionPolicy::FloodFill,
                4,
                &cache,
                &topology,
                &query(Vec3::new(2.6, 0.3, 0.0), radius),
                &mut region,
            );
            assert_eq!(region.in_range, vec![4]);
        }
    }

    #[test]
    fn test_flood_fill_cache_shorter_than_topology() {
        let (positions, indices) = strip(2);
        let topology = TopologyIndex::from_indices(positions.len(), &indices).unwrap();
        let mut cache = TriangleCache::new();
        cache
            .rebuild(&positions, &topology.triangles()[..2])
            .unwrap();

        let mut grower = RegionGrower::new();
        let mut region = Region::default();
        grower.grow(
            SelectionPolicy::FloodFill,
            0,
            &cache,
            &topology,
            &query(Vec3::new(0.6, 0.3, 0.0), 10.0),
            &mut region,
        );
        assert_eq!(sorted(region.in_range.clone()), vec![0, 1]);
        assert!(region.in_range.iter().all(|&tri| (tri as usize) < cache.len()));
    }

    #[test]
    fn test_grow_replaces_previous_region() {
        let (positions, indices) = strip(2);
        let (cache, topology) = setup(&positions, &indices);
        let mut grower = RegionGrower::new();
        let mut region = Region::default();
        region.in_range.push(99);

        grower.grow(
            SelectionPolicy::FloodFill,
            0,
            &cache,
            &topology,
            &query(Vec3::new(0.6, 0.3, 0.0), 0.0),
            &mut region,
        );
        assert_eq!(region.in_range, vec![0]);
    }
}
