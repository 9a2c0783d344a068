//! Neighbor reconstruction.
//!
//! The flat format stores no connectivity, so it is recovered here: every
//! directed face-edge is matched with the opposite-direction edge that
//! traverses the same two vertex keys. Clean meshes resolve by forced
//! matching alone; self-touching and non-manifold soups go through the
//! frontier and sliver-ranking fallbacks, which trade speed for a
//! deterministic best-effort pairing.

use super::islands::UnionFind;
use super::key::{EdgeKey, PointKey, VertexMatching};
use super::{Soup, face_of, next_in_face, prev_in_face};
use crate::errors::{SoupError, SoupResult};
use crate::float_types::{PI, Real, TAU, tolerance};
use hashbrown::{HashMap, HashSet};
use std::fmt::Debug;
use tracing::{debug, warn};

/// What to do when resolution leaves edges that cannot be paired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolveMode {
    /// Refuse the soup: fail with [`SoupError::NonManifold`] and leave no
    /// derived topology behind.
    #[default]
    Strict,
    /// Keep the unpaired edges open so hole repair can deal with them.
    Permissive,
}

/// What a resolution pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopologySummary {
    /// Edge pairs connected.
    pub resolved: usize,
    /// Edge slots left without a partner.
    pub open: usize,
    /// Distinct islands among live faces.
    pub islands: usize,
}

#[inline]
fn ordered(a: usize, b: usize) -> (usize, usize) {
    if a <= b { (a, b) } else { (b, a) }
}

impl<S: Clone + Send + Sync + Debug> Soup<S> {
    /// Rebuild the neighbor and island arrays from the position buffer.
    ///
    /// Faces with two coincident vertex keys are excluded from matching and
    /// marked deleted right away. The remaining directed edges are paired
    /// by a three-rule loop, in priority order:
    ///
    /// 1. an edge with exactly one viable candidate takes it (forced);
    /// 2. two open candidate edges on the same island take each other
    ///    (frontier preference, favors closing well-formed shapes over
    ///    long-range matches);
    /// 3. otherwise the globally worst candidate pairing, the one whose
    ///    dihedral angle departs farthest from flat, is discarded and the
    ///    loop retries.
    ///
    /// Edges still open when no rule applies are the non-manifold residue:
    /// [`ResolveMode::Strict`] fails on them, [`ResolveMode::Permissive`]
    /// leaves them unpaired for [`Soup::fix_holes`].
    pub fn find_neighbors(
        &mut self,
        matching: VertexMatching,
        mode: ResolveMode,
    ) -> SoupResult<TopologySummary> {
        self.clear_topology();
        let faces = self.face_count();
        let slots = faces * 3;
        let mut neighbors: Vec<Option<usize>> = vec![None; slots];
        let mut islands: Vec<Option<usize>> = vec![None; faces];

        let keys: Vec<PointKey> = (0..slots).map(|v| matching.key(&self.point(v))).collect();

        let mut live = vec![true; faces];
        for face in 0..faces {
            let k = &keys[face * 3..face * 3 + 3];
            if k[0] == k[1] || k[1] == k[2] || k[2] == k[0] {
                live[face] = false;
            }
        }
        let dropped = live.iter().filter(|l| !**l).count();
        if dropped > 0 {
            debug!(dropped, "excluding degenerate faces from matching");
        }

        let mut edges: HashMap<EdgeKey, Vec<usize>> = HashMap::new();
        for slot in 0..slots {
            if live[face_of(slot)] {
                edges
                    .entry((keys[slot], keys[next_in_face(slot)]))
                    .or_default()
                    .push(slot);
            }
        }

        // Viable partners run the same two keys in reverse.
        let mut candidates: Vec<Vec<usize>> = vec![Vec::new(); slots];
        for slot in 0..slots {
            if live[face_of(slot)] {
                if let Some(found) = edges.get(&(keys[next_in_face(slot)], keys[slot])) {
                    candidates[slot] = found.clone();
                }
            }
        }
        drop(edges);

        let mut forest = UnionFind::new(faces);
        let mut banned: HashSet<(usize, usize)> = HashSet::new();
        let mut angles: HashMap<(usize, usize), Real> = HashMap::new();
        let mut resolved = 0usize;

        loop {
            // Rule 1: forced connections, to a fixed point.
            loop {
                let mut any = false;
                for slot in 0..slots {
                    if neighbors[slot].is_some() || !live[face_of(slot)] {
                        continue;
                    }
                    let mut only = None;
                    let mut count = 0;
                    for &t in &candidates[slot] {
                        if neighbors[t].is_none() && !banned.contains(&ordered(slot, t)) {
                            count += 1;
                            if count > 1 {
                                break;
                            }
                            only = Some(t);
                        }
                    }
                    if let (1, Some(t)) = (count, only) {
                        neighbors[slot] = Some(t);
                        neighbors[t] = Some(slot);
                        forest.union(face_of(slot), face_of(t));
                        resolved += 1;
                        any = true;
                    }
                }
                if !any {
                    break;
                }
            }

            // Rule 2: connect two open edges on the same island's frontier.
            let mut frontier_pair = None;
            'frontier: for slot in 0..slots {
                if neighbors[slot].is_some() || !live[face_of(slot)] {
                    continue;
                }
                for &t in &candidates[slot] {
                    if neighbors[t].is_none()
                        && !banned.contains(&ordered(slot, t))
                        && forest.find(face_of(slot)) == forest.find(face_of(t))
                    {
                        frontier_pair = Some((slot, t));
                        break 'frontier;
                    }
                }
            }
            if let Some((s, t)) = frontier_pair {
                neighbors[s] = Some(t);
                neighbors[t] = Some(s);
                resolved += 1;
                continue;
            }

            // Rule 3: discard the globally worst pairing. The worst angle is
            // the one closest to 0 or 2π, a sliver hinting at two unrelated
            // shapes sharing geometry rather than a true adjacency.
            let mut worst: Option<((usize, usize), Real)> = None;
            for slot in 0..slots {
                if neighbors[slot].is_some() || !live[face_of(slot)] {
                    continue;
                }
                for &t in &candidates[slot] {
                    if t < slot || neighbors[t].is_some() || banned.contains(&(slot, t)) {
                        continue;
                    }
                    let angle = *angles
                        .entry((slot, t))
                        .or_insert_with(|| self.dihedral_angle(slot, t));
                    let departure = (angle - PI).abs();
                    if worst.is_none_or(|(_, d)| departure > d) {
                        worst = Some(((slot, t), departure));
                    }
                }
            }
            match worst {
                Some((pair, _)) => {
                    banned.insert(pair);
                },
                None => break,
            }
        }

        let open = (0..slots)
            .filter(|&s| live[face_of(s)] && neighbors[s].is_none())
            .count();
        if open > 0 {
            match mode {
                ResolveMode::Strict => return Err(SoupError::NonManifold { open }),
                ResolveMode::Permissive => {
                    warn!(open, "leaving unpaired edges for hole repair");
                },
            }
        }

        let mut roots = HashSet::new();
        for face in 0..faces {
            if live[face] {
                let root = forest.find(face);
                islands[face] = Some(root);
                roots.insert(root);
            }
        }

        let summary = TopologySummary {
            resolved,
            open,
            islands: roots.len(),
        };
        self.install_topology(neighbors, islands, matching);
        debug!(
            resolved = summary.resolved,
            open = summary.open,
            islands = summary.islands,
            "neighbor resolution complete"
        );
        Ok(summary)
    }

    /// Interior angle between the faces flanking a candidate pairing, in
    /// `[0, 2π)`: 0 folded back onto itself, π flat, approaching 2π fully
    /// enclosing. Pairings across a vanishing edge or with a vanishing wing
    /// read as folded, the worst rank.
    fn dihedral_angle(&self, s: usize, t: usize) -> Real {
        let a = self.point(s);
        let b = self.point(next_in_face(s));
        let edge = b - a;
        let len = edge.norm();
        if len <= tolerance() {
            return 0.0;
        }
        let edge = edge / len;

        let mut wing_s = self.point(prev_in_face(s)) - a;
        let mut wing_t = self.point(prev_in_face(t)) - a;
        wing_s -= edge * edge.dot(&wing_s);
        wing_t -= edge * edge.dot(&wing_t);
        if wing_s.norm() <= tolerance() || wing_t.norm() <= tolerance() {
            return 0.0;
        }

        let sin = wing_s.cross(&wing_t).dot(&edge);
        let cos = wing_s.dot(&wing_t);
        let mut angle = sin.atan2(cos);
        if angle < 0.0 {
            angle += TAU;
        }
        angle
    }
}
