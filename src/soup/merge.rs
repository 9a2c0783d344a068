//! Coplanar face merging and local retriangulation.
//!
//! `merge_faces` shrinks coplanar regions by edge collapse: a vertex is
//! folded onto a neighbor whenever every face around it either keeps its
//! normal (under a caller-supplied predicate) or collapses to zero area and
//! gets cleaned up. `retriangle` is the companion local optimizer, flipping
//! shared diagonals of coplanar face pairs toward the fatter triangulation.

use super::key::PointKey;
use super::{Soup, face_of, next_in_face, prev_in_face};
use crate::errors::SoupResult;
use crate::float_types::{Real, tolerance};
use nalgebra::{Point3, Vector3};
use std::collections::VecDeque;
use std::fmt::Debug;
use tracing::{debug, warn};

/// Near-equality predicate for unit normals: within `angle` radians of
/// each other. The usual argument to [`Soup::merge_faces`] and
/// [`Soup::retriangle`].
pub fn normals_within(angle: Real) -> impl FnMut(&Vector3<Real>, &Vector3<Real>) -> bool {
    let cos = angle.cos();
    move |a, b| a.dot(b) >= cos
}

impl<S: Clone + Send + Sync + Debug> Soup<S> {
    /// Collapse edges whose removal leaves every surrounding normal intact,
    /// repeating until nothing more merges, then compact. Returns the
    /// number of collapses accepted.
    ///
    /// The island count is never changed by this pass: collapses stay
    /// inside one face fan and the degenerate cleanup splices the fan's
    /// neighbors back together.
    pub fn merge_faces<F>(&mut self, mut equal_normals: F) -> SoupResult<usize>
    where
        F: FnMut(&Vector3<Real>, &Vector3<Real>) -> bool,
    {
        self.require_topology()?;
        let mut total = 0;
        loop {
            let mut accepted = 0;
            for slot in 0..self.face_count() * 3 {
                if self.islands[face_of(slot)].is_none() {
                    continue;
                }
                if self.try_collapse(slot, &mut equal_normals) {
                    accepted += 1;
                }
            }
            if accepted == 0 {
                break;
            }
            total += accepted;
            self.remove_degenerates()?;
        }
        self.delete_degenerates()?;
        if total > 0 {
            debug!(total, "merged faces by edge collapse");
        }
        Ok(total)
    }

    /// Collapse `slot`'s start vertex onto its end vertex if every face in
    /// the start vertex's fan keeps its normal or degenerates.
    fn try_collapse<F>(&mut self, slot: usize, equal_normals: &mut F) -> bool
    where
        F: FnMut(&Vector3<Real>, &Vector3<Real>) -> bool,
    {
        let start = self.point(slot);
        let end = self.point(next_in_face(slot));
        let start_key = self.matching.key(&start);
        let end_key = self.matching.key(&end);
        if start_key == end_key {
            // Zero edge, the degenerate cleanup owns it.
            return false;
        }

        let (fan, closed) = self.start_vertex_fan(slot);
        if !closed && !self.outline_stays_straight(&fan, &end_key) {
            return false;
        }
        for &s in &fan {
            let face = face_of(s);
            let before = self.face_normal(face);
            let after = self.moved_normal(face, &start_key, &end);
            if after == Vector3::zeros() {
                continue;
            }
            if before != Vector3::zeros() && !equal_normals(&before, &after) {
                return false;
            }
        }

        let rgb = self
            .colors
            .is_some()
            .then(|| self.vertex_color(next_in_face(slot)));
        for &s in &fan {
            self.set_point(s, &end);
            if let Some(rgb) = &rgb {
                self.set_vertex_color(s, rgb);
            }
        }
        true
    }

    /// Whether collapsing a boundary vertex with this fan onto `end_key`
    /// keeps the open outline: the target must be one of the vertex's two
    /// boundary neighbors and the vertex must sit straight between them.
    fn outline_stays_straight(&self, fan: &[usize], end_key: &PointKey) -> bool {
        let mut outgoing = None;
        let mut incoming = None;
        for &s in fan {
            if self.neighbors[s].is_none() && outgoing.replace(s).is_some() {
                return false;
            }
            let q = prev_in_face(s);
            if self.neighbors[q].is_none() && incoming.replace(q).is_some() {
                return false;
            }
        }
        let (Some(out), Some(inc)) = (outgoing, incoming) else {
            return false;
        };

        let v = self.point(out);
        let ahead = self.point(next_in_face(out));
        let behind = self.point(inc);
        if *end_key != self.matching.key(&ahead) && *end_key != self.matching.key(&behind) {
            return false;
        }
        (ahead - v).cross(&(behind - v)).norm_squared() <= tolerance() * tolerance()
    }

    /// Normal of `face` with every corner keyed `from` moved to `to`,
    /// zero if the move flattens it.
    fn moved_normal(&self, face: usize, from: &PointKey, to: &Point3<Real>) -> Vector3<Real> {
        let mut pts = self.face_points(face);
        for p in &mut pts {
            if self.matching.key(p) == *from {
                *p = *to;
            }
        }
        let n = (pts[1] - pts[0]).cross(&(pts[2] - pts[0]));
        if n.norm_squared() < Real::EPSILON * Real::EPSILON {
            Vector3::zeros()
        } else {
            n.normalize()
        }
    }

    /// Flip shared diagonals among `faces` until every quad of coplanar
    /// neighbors is as fat as it can be. Returns the number of flips.
    ///
    /// A flip happens when the two angles opposite a shared edge sum past
    /// pi and both post-flip triangles keep the pair's normal under
    /// `equal_normals`. Each flip re-enqueues the four surrounding edges.
    pub fn retriangle<F>(&mut self, faces: &[usize], mut equal_normals: F) -> SoupResult<usize>
    where
        F: FnMut(&Vector3<Real>, &Vector3<Real>) -> bool,
    {
        self.require_topology()?;
        let mut queue: VecDeque<usize> = faces
            .iter()
            .flat_map(|&f| [f * 3, f * 3 + 1, f * 3 + 2])
            .collect();
        let cap = faces.len().max(1) * 64;

        let mut flips = 0;
        while let Some(slot) = queue.pop_front() {
            if flips >= cap {
                warn!(flips, "retriangulation stopped before settling");
                break;
            }
            if self.islands[face_of(slot)].is_none() {
                continue;
            }
            let Some(partner) = self.neighbors[slot] else {
                continue;
            };
            if self.islands[face_of(partner)].is_none() {
                continue;
            }
            let f = face_of(slot);
            let g = face_of(partner);
            let nf = self.face_normal(f);
            let ng = self.face_normal(g);
            if nf == Vector3::zeros() || ng == Vector3::zeros() || !equal_normals(&nf, &ng) {
                continue;
            }
            if !self.diagonal_needs_flip(slot, partner) {
                continue;
            }

            // Both post-flip triangles must stay in the pair's plane; a
            // flip across a nonconvex quad would fold one inside out.
            let a = self.point(slot);
            let b = self.point(next_in_face(slot));
            let wf = self.point(prev_in_face(slot));
            let wg = self.point(prev_in_face(partner));
            let n1 = (a - wf).cross(&(wg - wf));
            let n2 = (b - wg).cross(&(wf - wg));
            if n1.norm_squared() < Real::EPSILON * Real::EPSILON
                || n2.norm_squared() < Real::EPSILON * Real::EPSILON
            {
                continue;
            }
            if !equal_normals(&nf, &n1.normalize()) || !equal_normals(&nf, &n2.normalize()) {
                continue;
            }

            self.rotate_edge(slot);
            flips += 1;
            for s in [f * 3, f * 3 + 1, g * 3, g * 3 + 1] {
                queue.push_back(s);
            }
        }
        if flips > 0 {
            debug!(flips, "retriangulated");
        }
        Ok(flips)
    }

    /// Whether the two angles opposite the shared edge `slot`/`partner`
    /// sum past pi.
    fn diagonal_needs_flip(&self, slot: usize, partner: usize) -> bool {
        let a = self.point(slot);
        let b = self.point(next_in_face(slot));
        let wf = self.point(prev_in_face(slot));
        let wg = self.point(prev_in_face(partner));
        let u1 = a - wf;
        let v1 = b - wf;
        let u2 = a - wg;
        let v2 = b - wg;
        // sin(alpha + beta) < 0 with both angles in (0, pi)
        let sin1 = u1.cross(&v1).norm();
        let sin2 = u2.cross(&v2).norm();
        u1.dot(&v1) * sin2 + u2.dot(&v2) * sin1 < -tolerance()
    }
}
