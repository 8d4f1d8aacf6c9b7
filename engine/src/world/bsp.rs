//! Binary space partition over sectors
//!
//! Maps an `(x, z)` point to the sector that owns it. Internal nodes split
//! the plane along a wall's line; leaves are tagged with one sector.
//!
//! # Partition strategies
//!
//! - [`PartitionStrategy::Flat`] puts every wall into a single leaf tagged
//!   with the first wall's sector. Lookups never disambiguate between
//!   sectors, which is enough for single-room levels.
//! - [`PartitionStrategy::SectorSplit`] recursively picks, in wall build
//!   order, the first wall whose line separates the remaining sectors into
//!   two smaller groups. Sectors with vertices on both sides of the line go
//!   to both children. A group no wall can separate becomes a leaf tagged with
//!   its first sector.
//!
//! Points exactly on a partition line count as "in front", which is the side
//! of the sector that owns the splitting wall.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::sector::{Sector, SectorId};
use super::wall::{Wall, WallId};

/// Tolerance for classifying sector vertices against a partition line.
const SIDE_EPSILON: f32 = 1e-4;

/// How [`BspTree::build`] partitions the level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionStrategy {
    /// Single leaf tagged with the first wall's sector.
    Flat,
    /// Split along walls until each leaf holds one sector.
    #[default]
    SectorSplit,
}

/// Directed splitting line taken from a wall.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Partition {
    /// Wall whose line splits the node
    pub wall: WallId,
    pub start: (f32, f32),
    pub end: (f32, f32),
}

impl Partition {
    fn from_wall(wall: &Wall) -> Self {
        Self {
            wall: wall.id(),
            start: (wall.start().x, wall.start().z),
            end: (wall.end().x, wall.end().z),
        }
    }

    fn side(&self, x: f32, z: f32) -> f32 {
        let (dx, dz) = (self.end.0 - self.start.0, self.end.1 - self.start.1);
        let (px, pz) = (x - self.start.0, z - self.start.1);
        dx * pz - dz * px
    }

    /// True when the 2D cross product of the point against the line is
    /// non-negative.
    pub fn is_point_in_front(&self, x: f32, z: f32) -> bool {
        self.side(x, z) >= 0.0
    }
}

/// Leaf of the tree: one sector and the walls that reached it.
#[derive(Debug, Clone, PartialEq)]
pub struct BspLeaf {
    pub sector: SectorId,
    pub walls: Vec<WallId>,
}

/// A node of the partition tree.
#[derive(Debug, Clone, PartialEq)]
pub enum BspNode {
    Split {
        partition: Partition,
        front: Option<Box<BspNode>>,
        back: Option<Box<BspNode>>,
    },
    Leaf(BspLeaf),
}

impl BspNode {
    fn leaf(sector: SectorId, walls: Vec<WallId>) -> Self {
        BspNode::Leaf(BspLeaf { sector, walls })
    }
}

/// Node and leaf counts, for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BspStats {
    pub splits: usize,
    pub leaves: usize,
    pub depth: usize,
}

/// Spatial index built once from the level's walls and sectors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BspTree {
    root: Option<BspNode>,
}

impl BspTree {
    /// Builds the tree. An empty wall list yields an empty tree whose lookups
    /// all return `None`.
    pub fn build(walls: &[Wall], sectors: &[Sector], strategy: PartitionStrategy) -> Self {
        let Some(first) = walls.first() else {
            return Self::default();
        };

        let root = match strategy {
            PartitionStrategy::Flat => BspNode::leaf(first.sector(), walls.iter().map(Wall::id).collect()),
            PartitionStrategy::SectorSplit => {
                let ids: Vec<WallId> = walls.iter().map(Wall::id).collect();
                build_split(walls, sectors, ids)
            }
        };
        Self { root: Some(root) }
    }

    pub fn root(&self) -> Option<&BspNode> {
        self.root.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Descends to the leaf containing `(x, z)` and returns its sector.
    ///
    /// When the chosen child is missing the other one is taken.
    pub fn find_sector_at(&self, x: f32, z: f32) -> Option<SectorId> {
        let mut node = self.root.as_ref()?;
        loop {
            match node {
                BspNode::Leaf(leaf) => return Some(leaf.sector),
                BspNode::Split {
                    partition,
                    front,
                    back,
                } => {
                    let (near, far) = if partition.is_point_in_front(x, z) {
                        (front, back)
                    } else {
                        (back, front)
                    };
                    node = near.as_deref().or(far.as_deref())?;
                }
            }
        }
    }

    /// Visits leaves in painter's order relative to the viewpoint `(x, z)`:
    /// the side of each split away from the viewer first.
    pub fn traverse_back_to_front(&self, x: f32, z: f32, mut visit: impl FnMut(&BspLeaf)) {
        if let Some(root) = &self.root {
            traverse(root, x, z, &mut visit);
        }
    }

    pub fn stats(&self) -> BspStats {
        let mut stats = BspStats::default();
        if let Some(root) = &self.root {
            count(root, 1, &mut stats);
        }
        stats
    }
}

fn traverse(node: &BspNode, x: f32, z: f32, visit: &mut impl FnMut(&BspLeaf)) {
    match node {
        BspNode::Leaf(leaf) => visit(leaf),
        BspNode::Split {
            partition,
            front,
            back,
        } => {
            let (far, near) = if partition.is_point_in_front(x, z) {
                (back, front)
            } else {
                (front, back)
            };
            for child in [far, near].into_iter().flatten() {
                traverse(child, x, z, visit);
            }
        }
    }
}

fn count(node: &BspNode, depth: usize, stats: &mut BspStats) {
    stats.depth = stats.depth.max(depth);
    match node {
        BspNode::Leaf(_) => stats.leaves += 1,
        BspNode::Split { front, back, .. } => {
            stats.splits += 1;
            for child in [front, back].into_iter().flatten() {
                count(child, depth + 1, stats);
            }
        }
    }
}

/// Which side(s) of a partition a sector's outline lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Front,
    Back,
    Both,
}

fn classify(partition: &Partition, outline: &[(f32, f32)]) -> Side {
    let mut front = false;
    let mut back = false;
    for &(x, z) in outline {
        let side = partition.side(x, z);
        front |= side > SIDE_EPSILON;
        back |= side < -SIDE_EPSILON;
    }
    match (front, back) {
        (true, true) => Side::Both,
        (false, true) => Side::Back,
        // Collinear outlines stay with the splitting wall's sector
        _ => Side::Front,
    }
}

/// Sectors owning `ids`, in order of first appearance.
fn sectors_of(walls: &[Wall], ids: &[WallId]) -> Vec<SectorId> {
    let mut seen = Vec::new();
    for id in ids {
        let sector = walls[id.0].sector();
        if !seen.contains(&sector) {
            seen.push(sector);
        }
    }
    seen
}

fn outline(walls: &[Wall], sectors: &[Sector], sector: SectorId) -> Vec<(f32, f32)> {
    sectors
        .get(sector.0)
        .map(|s| {
            s.walls()
                .iter()
                .filter_map(|id| walls.get(id.0))
                .flat_map(|w| [(w.start().x, w.start().z), (w.end().x, w.end().z)])
                .collect()
        })
        .unwrap_or_default()
}

fn build_split(walls: &[Wall], sectors: &[Sector], ids: Vec<WallId>) -> BspNode {
    let group = sectors_of(walls, &ids);
    if group.len() == 1 {
        return BspNode::leaf(group[0], ids);
    }

    let outlines: Vec<(SectorId, Vec<(f32, f32)>)> = group
        .iter()
        .map(|&sector| (sector, outline(walls, sectors, sector)))
        .collect();

    for splitter in &ids {
        let partition = Partition::from_wall(&walls[splitter.0]);
        if walls[splitter.0].length() <= f32::EPSILON {
            continue;
        }

        let mut front_group = Vec::new();
        let mut back_group = Vec::new();
        for (sector, points) in &outlines {
            match classify(&partition, points) {
                Side::Front => front_group.push(*sector),
                Side::Back => back_group.push(*sector),
                Side::Both => {
                    front_group.push(*sector);
                    back_group.push(*sector);
                }
            }
        }

        let separates = !front_group.is_empty()
            && !back_group.is_empty()
            && front_group.len() < group.len()
            && back_group.len() < group.len();
        if !separates {
            continue;
        }

        let pick = |side: &[SectorId]| -> Vec<WallId> {
            ids.iter()
                .copied()
                .filter(|id| side.contains(&walls[id.0].sector()))
                .collect()
        };
        let front = pick(&front_group);
        let back = pick(&back_group);

        return BspNode::Split {
            partition,
            front: Some(Box::new(build_split(walls, sectors, front))),
            back: Some(Box::new(build_split(walls, sectors, back))),
        };
    }

    debug!(
        sectors = group.len(),
        "no wall separates sector group, tagging leaf with first sector"
    );
    BspNode::leaf(group[0], ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    /// Two 10x10 rooms side by side joined by a portal at x = 5.
    fn two_rooms() -> (Vec<Wall>, Vec<Sector>) {
        let mut sectors = vec![Sector::new(0.0, 3.0).unwrap(), Sector::new(0.5, 3.0).unwrap()];
        let mut walls = Vec::new();
        let mut add = |start: [f32; 2], end: [f32; 2], sector: usize, other: Option<usize>| {
            let id = WallId(walls.len());
            walls.push(Wall::new(
                id,
                Vec3::new(start[0], 0.0, start[1]),
                Vec3::new(end[0], 0.0, end[1]),
                SectorId(sector),
                other.map(SectorId),
            ));
            sectors[sector].push_wall(id);
        };

        add([-5.0, -5.0], [5.0, -5.0], 0, None);
        add([5.0, -5.0], [5.0, 5.0], 0, Some(1));
        add([5.0, 5.0], [-5.0, 5.0], 0, None);
        add([-5.0, 5.0], [-5.0, -5.0], 0, None);

        add([5.0, -5.0], [15.0, -5.0], 1, None);
        add([15.0, -5.0], [15.0, 5.0], 1, None);
        add([15.0, 5.0], [5.0, 5.0], 1, None);
        add([5.0, 5.0], [5.0, -5.0], 1, Some(0));

        (walls, sectors)
    }

    #[test]
    fn test_empty_build_finds_nothing() {
        let tree = BspTree::build(&[], &[], PartitionStrategy::SectorSplit);
        assert!(tree.is_empty());
        assert_eq!(tree.find_sector_at(0.0, 0.0), None);
    }

    #[test]
    fn test_flat_build_uses_first_wall_sector() {
        let (walls, sectors) = two_rooms();
        let tree = BspTree::build(&walls, &sectors, PartitionStrategy::Flat);
        assert_eq!(tree.find_sector_at(0.0, 0.0), Some(SectorId(0)));
        assert_eq!(tree.find_sector_at(10.0, 0.0), Some(SectorId(0)));
        assert_eq!(tree.stats(), BspStats { splits: 0, leaves: 1, depth: 1 });
    }

    #[test]
    fn test_sector_split_separates_rooms() {
        let (walls, sectors) = two_rooms();
        let tree = BspTree::build(&walls, &sectors, PartitionStrategy::SectorSplit);
        assert_eq!(tree.find_sector_at(0.0, 0.0), Some(SectorId(0)));
        assert_eq!(tree.find_sector_at(10.0, 0.0), Some(SectorId(1)));
        assert_eq!(tree.stats().leaves, 2);

        match tree.root() {
            Some(BspNode::Split { partition, .. }) => assert_eq!(partition.wall, WallId(1)),
            other => panic!("expected a split at the portal, got {other:?}"),
        }
    }

    #[test]
    fn test_point_on_partition_goes_front() {
        let (walls, sectors) = two_rooms();
        let tree = BspTree::build(&walls, &sectors, PartitionStrategy::SectorSplit);
        assert_eq!(tree.find_sector_at(5.0, 0.0), Some(SectorId(0)));
    }

    #[test]
    fn test_is_point_in_front_cross_product() {
        let partition = Partition {
            wall: WallId(0),
            start: (0.0, 0.0),
            end: (1.0, 0.0),
        };
        assert!(partition.is_point_in_front(0.5, 1.0));
        assert!(partition.is_point_in_front(0.5, 0.0));
        assert!(!partition.is_point_in_front(0.5, -1.0));
    }

    #[test]
    fn test_missing_child_falls_back() {
        let tree = BspTree {
            root: Some(BspNode::Split {
                partition: Partition {
                    wall: WallId(0),
                    start: (0.0, 0.0),
                    end: (1.0, 0.0),
                },
                front: None,
                back: Some(Box::new(BspNode::leaf(SectorId(7), Vec::new()))),
            }),
        };
        assert_eq!(tree.find_sector_at(0.0, 5.0), Some(SectorId(7)));
    }

    #[test]
    fn test_back_to_front_order() {
        let (walls, sectors) = two_rooms();
        let tree = BspTree::build(&walls, &sectors, PartitionStrategy::SectorSplit);

        let mut order = Vec::new();
        tree.traverse_back_to_front(0.0, 0.0, |leaf| order.push(leaf.sector));
        assert_eq!(order, vec![SectorId(1), SectorId(0)]);

        order.clear();
        tree.traverse_back_to_front(10.0, 0.0, |leaf| order.push(leaf.sector));
        assert_eq!(order, vec![SectorId(0), SectorId(1)]);
    }
}
