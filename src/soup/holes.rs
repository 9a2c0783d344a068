//! Boundary threading and hole sealing.
//!
//! Open edges left behind by a plane cut, or by permissive resolution of a
//! non-manifold soup, are threaded into boundary loops by walking the
//! surviving connectivity, then sealed with cap faces by constrained ear
//! clipping anchored at a convex-hull edge of the boundary.

use super::key::PointKey;
use super::{Soup, face_of, next_in_face};
use crate::errors::SoupResult;
use crate::float_types::{Real, tolerance};
use hashbrown::{HashMap, HashSet};
use nalgebra::Vector3;
use std::fmt::Debug;
use tracing::{debug, warn};

/// Largest boundary loop [`Soup::fix_holes`] will try to seal. Anything
/// bigger is reported and left open; a hole that size means the input lost
/// whole surface regions, and capping it would invent geometry.
pub const MAX_HOLE_EDGES: usize = 64;

/// One hole boundary: open edge slots threaded end to start.
#[derive(Debug, Clone)]
pub struct BoundaryLoop {
    /// Open edge slots in traversal order around the hole.
    pub edges: Vec<usize>,
    /// Whether the successor walk closed back on the first edge. Chains
    /// that dead-end stay `false` and cannot be sealed.
    pub closed: bool,
}

/// What to do with one candidate ear during sealing.
enum Ear {
    /// Wrong orientation or no area; move on.
    Blocked,
    /// Empty of boundary points; cap it whole.
    Clip,
    /// Holds other boundary points; cap only out to the nearest one,
    /// the start vertex of this edge slot.
    Bridge(usize),
}

impl<S: Clone + Send + Sync + Debug> Soup<S> {
    /// Boundary loops of one island whose edges lie entirely in the cut
    /// plane, identified by endpoint keys in `on_plane`.
    pub fn find_edges_in_plane(
        &self,
        island: usize,
        on_plane: &HashSet<PointKey>,
    ) -> SoupResult<Vec<BoundaryLoop>> {
        self.require_topology()?;
        let mut candidates = HashSet::new();
        for (slot, link) in self.neighbors.iter().enumerate() {
            if link.is_some() || self.islands[face_of(slot)] != Some(island) {
                continue;
            }
            let a = self.matching.key(&self.point(slot));
            let b = self.matching.key(&self.point(next_in_face(slot)));
            if on_plane.contains(&a) && on_plane.contains(&b) {
                candidates.insert(slot);
            }
        }
        Ok(self.thread_boundary(&candidates))
    }

    /// Thread every residual open edge into boundary loops and seal the
    /// closed ones, each as its own hole. Returns the number of cap faces
    /// appended.
    ///
    /// Loops longer than [`MAX_HOLE_EDGES`], shorter than a triangle, or
    /// not closed at all are reported and left open.
    pub fn fix_holes(&mut self) -> SoupResult<usize> {
        self.require_topology()?;
        let mut candidates = HashSet::new();
        for (slot, link) in self.neighbors.iter().enumerate() {
            if link.is_none() && self.islands[face_of(slot)].is_some() {
                candidates.insert(slot);
            }
        }
        let loops = self.thread_boundary(&candidates);

        let mut added = 0;
        for boundary in &loops {
            if !boundary.closed {
                warn!(
                    edges = boundary.edges.len(),
                    "boundary chain does not close, leaving it open"
                );
                continue;
            }
            if !(3..=MAX_HOLE_EDGES).contains(&boundary.edges.len()) {
                warn!(
                    edges = boundary.edges.len(),
                    limit = MAX_HOLE_EDGES,
                    "hole is not sealable, leaving it open"
                );
                continue;
            }
            added += self.fix_planar_hole(std::slice::from_ref(boundary))?;
        }
        if added > 0 {
            debug!(added, loops = loops.len(), "sealed residual holes");
        }
        Ok(added)
    }

    /// Seal one planar hole with cap faces. The hole is all of `loops`
    /// together: a plane cutting through a solid with a tunnel leaves
    /// concentric boundary loops, and only the region between them is
    /// coverable.
    ///
    /// Repeatedly anchors at an edge on the convex hull of every remaining
    /// boundary point, takes the cap orientation from that edge, then walks
    /// its loop capping each ear whose normal matches. An ear holding other
    /// boundary points is shrunk back to the nearest of them instead, which
    /// rethreads that point's loop into the walk. Unclosed loops are
    /// skipped; a boundary that stalls (numerically uncappable) is left
    /// partly open. Returns the number of faces added.
    pub fn fix_planar_hole(&mut self, loops: &[BoundaryLoop]) -> SoupResult<usize> {
        self.require_topology()?;

        let mut succ: HashMap<usize, usize> = HashMap::new();
        let mut pred: HashMap<usize, usize> = HashMap::new();
        let mut area = Vector3::zeros();
        for boundary in loops {
            if !boundary.closed || boundary.edges.len() < 3 {
                continue;
            }
            if boundary.edges.iter().any(|&e| self.neighbors[e].is_some()) {
                warn!("boundary loop is stale, leaving it untouched");
                continue;
            }
            for (i, &e) in boundary.edges.iter().enumerate() {
                let next = boundary.edges[(i + 1) % boundary.edges.len()];
                succ.insert(e, next);
                pred.insert(next, e);
            }
            area += self.loop_newell(&boundary.edges);
        }
        if succ.is_empty() {
            return Ok(0);
        }
        if area.norm_squared() < Real::EPSILON * Real::EPSILON {
            warn!(edges = succ.len(), "hole boundary has no net area");
            return Ok(0);
        }
        let pn = area.normalize();

        let mut added = 0;
        'sealing: while !succ.is_empty() {
            let Some((hull, side)) = self.hull_edge(&succ, &pn) else {
                warn!(
                    remaining = succ.len(),
                    "no hull edge on boundary, leaving hole open"
                );
                break;
            };
            let n_ref = pn * -Real::from(side);

            let mut cursor = hull;
            let mut sealed = 0;
            let mut failures = 0;
            loop {
                let e1 = cursor;
                let e2 = succ[&e1];
                let e3 = succ[&e2];
                if succ[&e3] == e1 {
                    // Last three edges of this cycle close in one cap.
                    let last = self.emit_cap(e1, e2, e3);
                    self.link(e3, last);
                    for e in [e1, e2, e3] {
                        succ.remove(&e);
                        pred.remove(&e);
                    }
                    added += 1;
                    continue 'sealing;
                }
                match self.ear_action(e1, e2, e3, &n_ref, &succ, &pred) {
                    Ear::Clip => {
                        let nt = self.emit_cap(e1, e2, e3);
                        let before = pred[&e1];
                        succ.remove(&e1);
                        succ.remove(&e2);
                        pred.remove(&e1);
                        pred.remove(&e2);
                        succ.insert(before, nt);
                        pred.insert(nt, before);
                        succ.insert(nt, e3);
                        pred.insert(e3, nt);
                        cursor = nt;
                        added += 1;
                        sealed += 1;
                        failures = 0;
                    },
                    Ear::Bridge(ep) => {
                        let (to_p, from_p) = self.emit_bridge(e1, e2, ep);
                        let before = pred[&e1];
                        let q = pred[&ep];
                        succ.remove(&e1);
                        pred.remove(&e1);
                        succ.insert(before, to_p);
                        pred.insert(to_p, before);
                        succ.insert(to_p, ep);
                        pred.insert(ep, to_p);
                        succ.insert(q, from_p);
                        pred.insert(from_p, q);
                        succ.insert(from_p, e2);
                        pred.insert(e2, from_p);
                        cursor = to_p;
                        added += 1;
                        sealed += 1;
                        failures = 0;
                    },
                    Ear::Blocked => {
                        cursor = e2;
                        failures += 1;
                        if failures > succ.len() {
                            if sealed == 0 {
                                warn!(
                                    remaining = succ.len(),
                                    "hole sealing stalled, leaving hole open"
                                );
                                break 'sealing;
                            }
                            // Progress was made; a fresh hull anchor may
                            // unblock the rest.
                            continue 'sealing;
                        }
                    },
                }
            }
        }
        Ok(added)
    }

    /// Append a cap face over consecutive boundary edges `e1`, `e2`,
    /// pairing its first two edges with them. Returns the face's third
    /// edge slot, the new boundary edge from `e1`'s start to `after`'s
    /// start.
    fn emit_cap(&mut self, e1: usize, e2: usize, after: usize) -> usize {
        let x = self.point(e1);
        let y = self.point(e2);
        let z = self.point(after);
        let island = self.islands[face_of(e1)];
        let rgb = self.colors.is_some().then(|| {
            [
                self.vertex_color(after),
                self.vertex_color(e2),
                self.vertex_color(e1),
            ]
        });
        let face = self.push_face(&[z, y, x], rgb.as_ref(), island);
        self.link(e2, face * 3);
        self.link(e1, face * 3 + 1);
        face * 3 + 2
    }

    /// Append the shrunk cap over `e1` with its apex at `ep`'s start
    /// vertex, pairing only `e1`. Returns the two new boundary edges
    /// (toward the apex, away from the apex).
    fn emit_bridge(&mut self, e1: usize, e2: usize, ep: usize) -> (usize, usize) {
        let x = self.point(e1);
        let y = self.point(e2);
        let p = self.point(ep);
        let island = self.islands[face_of(e1)];
        let rgb = self.colors.is_some().then(|| {
            [
                self.vertex_color(ep),
                self.vertex_color(e2),
                self.vertex_color(e1),
            ]
        });
        let face = self.push_face(&[p, y, x], rgb.as_ref(), island);
        self.link(e1, face * 3 + 1);
        (face * 3 + 2, face * 3)
    }

    /// Classify the ear over `e1`, `e2` with apex at `after`'s start.
    ///
    /// An ear facing away from `n_ref` or with no area is blocked. An ear
    /// holding other boundary points shrinks to the one nearest the base
    /// edge, lowest slot on ties, so the shrunk cap is itself empty; the
    /// apex may not collide with `e1`'s own predecessor.
    fn ear_action(
        &self,
        e1: usize,
        e2: usize,
        after: usize,
        n_ref: &Vector3<Real>,
        succ: &HashMap<usize, usize>,
        pred: &HashMap<usize, usize>,
    ) -> Ear {
        let x = self.point(e1);
        let y = self.point(e2);
        let z = self.point(after);
        if (y - z).cross(&(x - z)).dot(n_ref) <= tolerance() {
            return Ear::Blocked;
        }

        let mut contained: Option<(Real, usize)> = None;
        for &slot in succ.keys() {
            if slot == e1 || slot == e2 || slot == after {
                continue;
            }
            let p = self.point(slot);
            let base = (x - y).cross(&(p - y)).dot(n_ref);
            let inside = base > tolerance()
                && (y - z).cross(&(p - z)).dot(n_ref) > tolerance()
                && (z - x).cross(&(p - x)).dot(n_ref) > tolerance();
            if inside
                && contained.is_none_or(|(best, at)| (base, slot) < (best, at))
            {
                contained = Some((base, slot));
            }
        }
        match contained {
            None => Ear::Clip,
            Some((_, ep)) if pred.get(&e1) == Some(&ep) => Ear::Blocked,
            Some((_, ep)) => Ear::Bridge(ep),
        }
    }

    /// A boundary edge with every other remaining start point on one side
    /// of it within the hole plane, plus that side's sign. Lowest such
    /// slot wins. `None` when the boundary is entirely collinear.
    fn hull_edge(&self, succ: &HashMap<usize, usize>, pn: &Vector3<Real>) -> Option<(usize, i8)> {
        let mut edges: Vec<usize> = succ.keys().copied().collect();
        edges.sort_unstable();

        'edges: for &e in &edges {
            let a = self.point(e);
            let b = self.point(next_in_face(e));
            let d = b - a;
            let mut side = 0i8;
            for &other in &edges {
                if other == e {
                    continue;
                }
                let s = d.cross(&(self.point(other) - a)).dot(pn);
                if s.abs() <= tolerance() {
                    continue;
                }
                let s = if s > 0.0 { 1 } else { -1 };
                if side == 0 {
                    side = s;
                } else if side != s {
                    continue 'edges;
                }
            }
            if side != 0 {
                return Some((e, side));
            }
        }
        None
    }

    /// Newell area vector over the loop's start vertices, unnormalized so
    /// nested opposite-wound loops cancel down to the net hole area.
    fn loop_newell(&self, edges: &[usize]) -> Vector3<Real> {
        let mut n = Vector3::zeros();
        for (i, &e) in edges.iter().enumerate() {
            let p = self.point(e);
            let q = self.point(edges[(i + 1) % edges.len()]);
            n.x += (p.y - q.y) * (p.z + q.z);
            n.y += (p.z - q.z) * (p.x + q.x);
            n.z += (p.x - q.x) * (p.y + q.y);
        }
        n
    }

    /// Open edge that continues `slot`'s boundary at its end vertex,
    /// found by rotating across resolved pairings away from `slot`'s own
    /// face. `None` when the fan closes without reaching an open edge.
    fn boundary_successor(&self, slot: usize) -> Option<usize> {
        let first = next_in_face(slot);
        let mut cursor = first;
        while let Some(partner) = self.neighbors[cursor] {
            cursor = next_in_face(partner);
            if cursor == first {
                return None;
            }
        }
        Some(cursor)
    }

    /// Thread `candidates` into boundary loops via successor walks. Each
    /// candidate lands in exactly one loop; a loop whose walk dead-ends
    /// (or whose successor was claimed by another edge) stays unclosed.
    fn thread_boundary(&self, candidates: &HashSet<usize>) -> Vec<BoundaryLoop> {
        let mut slots: Vec<usize> = candidates.iter().copied().collect();
        slots.sort_unstable();

        let mut succ: HashMap<usize, usize> = HashMap::new();
        let mut claimed = HashSet::new();
        for &slot in &slots {
            if let Some(next) = self.boundary_successor(slot) {
                if candidates.contains(&next) && claimed.insert(next) {
                    succ.insert(slot, next);
                }
            }
        }
        let pred: HashMap<usize, usize> = succ.iter().map(|(&a, &b)| (b, a)).collect();

        let mut visited = HashSet::new();
        let mut loops = Vec::new();
        for &slot in &slots {
            if visited.contains(&slot) {
                continue;
            }
            let mut head = slot;
            while let Some(&p) = pred.get(&head) {
                if p == slot {
                    head = slot;
                    break;
                }
                head = p;
            }
            let mut edges = vec![head];
            visited.insert(head);
            let mut closed = false;
            let mut cursor = head;
            while let Some(&next) = succ.get(&cursor) {
                if next == head {
                    closed = true;
                    break;
                }
                edges.push(next);
                visited.insert(next);
                cursor = next;
            }
            loops.push(BoundaryLoop { edges, closed });
        }
        loops
    }
}
