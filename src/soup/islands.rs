//! Face islands: disjoint-set bookkeeping and island extraction.
//!
//! An island is a maximal set of faces transitively connected through
//! resolved edge pairings. The `islands` array stores one representative
//! face (the union-find root) per face, so "same island" is one integer
//! comparison away.

use super::{Soup, face_of};
use crate::errors::SoupResult;
use crate::float_types::Real;
use hashbrown::HashMap;
use std::fmt::Debug;

/// Disjoint-set forest over face indices.
#[derive(Debug, Clone)]
pub(crate) struct UnionFind {
    /// Parent pointers (index of parent, or self if root).
    parent: Vec<usize>,
    /// Rank for union by rank.
    rank: Vec<usize>,
}

impl UnionFind {
    pub(crate) fn new(n: usize) -> Self {
        UnionFind {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    /// Root of the set containing `x`, halving paths on the way. Iterative,
    /// soups routinely chain through many thousands of faces.
    pub(crate) fn find(&mut self, x: usize) -> usize {
        let mut x = x;
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    /// Merge the sets containing `x` and `y`, by rank.
    pub(crate) fn union(&mut self, x: usize, y: usize) {
        let root_x = self.find(x);
        let root_y = self.find(y);

        if root_x == root_y {
            return;
        }

        match self.rank[root_x].cmp(&self.rank[root_y]) {
            std::cmp::Ordering::Less => {
                self.parent[root_x] = root_y;
            },
            std::cmp::Ordering::Greater => {
                self.parent[root_y] = root_x;
            },
            std::cmp::Ordering::Equal => {
                self.parent[root_y] = root_x;
                self.rank[root_x] += 1;
            },
        }
    }
}

/// Flat render-ready buffers of one island.
#[derive(Debug, Clone, PartialEq)]
pub struct IslandGeometry {
    /// Nine position scalars per face.
    pub positions: Vec<Real>,
    /// The face normal repeated for each corner, parallel to `positions`.
    pub normals: Vec<Real>,
    /// Per-vertex RGB when the soup carries colors.
    pub colors: Option<Vec<Real>>,
}

impl<S: Clone + Send + Sync + Debug> Soup<S> {
    /// Number of distinct islands among live faces.
    pub fn island_count(&self) -> usize {
        let mut roots = hashbrown::HashSet::new();
        for root in self.islands.iter().flatten() {
            roots.insert(*root);
        }
        roots.len()
    }

    /// Recompute the island roots of every live face from the neighbor
    /// graph alone. Deleted faces keep their `None`.
    pub(crate) fn rebuild_islands(&mut self) {
        let faces = self.face_count();
        let mut forest = UnionFind::new(faces);
        for (slot, link) in self.neighbors.iter().enumerate() {
            if let Some(other) = link {
                forest.union(face_of(slot), face_of(*other));
            }
        }
        for face in 0..faces {
            if self.islands[face].is_some() {
                self.islands[face] = Some(forest.find(face));
            }
        }
    }

    /// Split the soup into one independent soup per island. Face order
    /// within an island follows the source order, islands are ordered by
    /// first appearance. The source is left untouched.
    pub fn isolate(&self) -> SoupResult<Vec<Soup<S>>> {
        self.require_topology()?;

        let groups = self.island_face_groups();
        let mut parts = Vec::with_capacity(groups.len());
        for faces in &groups {
            // Old face index -> face index inside the isolated soup.
            let mut remap: HashMap<usize, usize> = HashMap::with_capacity(faces.len());
            for (new, &old) in faces.iter().enumerate() {
                remap.insert(old, new);
            }

            let mut part = Soup::new();
            part.matching = self.matching;
            part.metadata = self.metadata.clone();
            if self.colors.is_some() {
                part.colors = Some(Vec::with_capacity(faces.len() * 9));
            }
            for &old in faces {
                let rgb = self.colors.is_some().then(|| {
                    [
                        self.vertex_color(old * 3),
                        self.vertex_color(old * 3 + 1),
                        self.vertex_color(old * 3 + 2),
                    ]
                });
                part.push_face(&self.face_points(old), rgb.as_ref(), Some(0));
            }
            for (new, &old) in faces.iter().enumerate() {
                for edge in 0..3 {
                    part.neighbors[new * 3 + edge] =
                        self.neighbors[old * 3 + edge].map(|other| {
                            remap[&face_of(other)] * 3 + super::corner_of(other)
                        });
                }
            }
            parts.push(part);
        }
        Ok(parts)
    }

    /// Flat buffers per island: positions, per-face normals repeated for
    /// each corner, colors when carried. This is the hand-off format for
    /// renderers that want unshared vertices with flat shading.
    pub fn isolated_geometries(&self) -> SoupResult<Vec<IslandGeometry>> {
        self.require_topology()?;

        let groups = self.island_face_groups();
        let mut out = Vec::with_capacity(groups.len());
        for faces in &groups {
            let mut geometry = IslandGeometry {
                positions: Vec::with_capacity(faces.len() * 9),
                normals: Vec::with_capacity(faces.len() * 9),
                colors: self.colors.as_ref().map(|_| Vec::with_capacity(faces.len() * 9)),
            };
            for &face in faces {
                for corner in 0..3 {
                    let p = self.point(face * 3 + corner);
                    geometry.positions.extend_from_slice(&[p.x, p.y, p.z]);
                }
                let n = self.face_normal(face);
                for _ in 0..3 {
                    geometry.normals.extend_from_slice(&[n.x, n.y, n.z]);
                }
                if let (Some(colors), Some(source)) = (&mut geometry.colors, &self.colors) {
                    colors.extend_from_slice(&source[face * 9..face * 9 + 9]);
                }
            }
            out.push(geometry);
        }
        Ok(out)
    }

    /// Live faces grouped by island root, both levels ordered by first
    /// appearance.
    fn island_face_groups(&self) -> Vec<Vec<usize>> {
        let mut root_to_group: HashMap<usize, usize> = HashMap::new();
        let mut groups: Vec<Vec<usize>> = Vec::new();
        for (face, root) in self.islands.iter().enumerate() {
            let Some(root) = root else { continue };
            let group = *root_to_group.entry(*root).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[group].push(face);
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_find_merges_and_finds() {
        let mut forest = UnionFind::new(5);
        forest.union(0, 1);
        forest.union(3, 4);
        assert_eq!(forest.find(0), forest.find(1));
        assert_eq!(forest.find(3), forest.find(4));
        assert_ne!(forest.find(1), forest.find(3));
        forest.union(1, 3);
        assert_eq!(forest.find(0), forest.find(4));
        assert_ne!(forest.find(0), forest.find(2));
    }

    #[test]
    fn union_find_survives_long_chains() {
        let n = 100_000;
        let mut forest = UnionFind::new(n);
        for i in 1..n {
            forest.union(i - 1, i);
        }
        let root = forest.find(0);
        assert_eq!(forest.find(n - 1), root);
    }
}
