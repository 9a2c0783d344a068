//! Degenerate-face elimination.
//!
//! Two patterns are cleaned, alternately, until neither occurs: faces with
//! a zero-length edge (two corners on one vertex key) and faces whose three
//! corners are collinear. The first kind is spliced out of the neighbor
//! graph; the second is absorbed by flipping the diagonal it shares with a
//! live neighbor. Deleted faces linger with a `None` island until
//! [`Soup::delete_degenerates`] compacts the buffers.

use super::{Soup, corner_of, edge_slot, face_of, next_in_face, prev_in_face};
use crate::errors::SoupResult;
use crate::float_types::tolerance;
use hashbrown::HashMap;
use std::fmt::Debug;
use tracing::debug;

impl<S: Clone + Send + Sync + Debug> Soup<S> {
    /// Clean every degenerate face, alternating the zero-edge and collinear
    /// rules to a fixed point. Returns the number of faces marked deleted;
    /// they stay in the buffers until [`Soup::delete_degenerates`].
    pub fn remove_degenerates(&mut self) -> SoupResult<usize> {
        self.require_topology()?;
        let mut deleted = 0;
        loop {
            let collapsed = self.collapse_zero_edges();
            let (flipped, dropped) = self.rotate_flat_faces();
            deleted += collapsed + dropped;
            if collapsed + flipped + dropped == 0 {
                break;
            }
        }
        if deleted > 0 {
            debug!(deleted, "degenerate faces removed");
        }
        Ok(deleted)
    }

    /// One pass of the zero-length-edge rule. The face is deleted and its
    /// two flanking partners are spliced together, they traverse the same
    /// two keys in opposite directions once the zero edge is gone.
    fn collapse_zero_edges(&mut self) -> usize {
        let mut removed = 0;
        for face in 0..self.face_count() {
            if self.islands[face].is_none() {
                continue;
            }
            let keys = [
                self.matching.key(&self.point(face * 3)),
                self.matching.key(&self.point(face * 3 + 1)),
                self.matching.key(&self.point(face * 3 + 2)),
            ];
            let Some(zero) = (0..3).find(|&e| keys[e] == keys[(e + 1) % 3]) else {
                continue;
            };
            let all_coincident = keys[0] == keys[1] && keys[1] == keys[2];

            let flank_a = edge_slot(face, (zero + 1) % 3);
            let flank_b = edge_slot(face, (zero + 2) % 3);
            let partner_a = self.neighbors[flank_a];
            let partner_b = self.neighbors[flank_b];

            self.unlink(edge_slot(face, zero));
            self.unlink(flank_a);
            self.unlink(flank_b);
            // A face paired with itself has nothing to splice, and neither
            // does a point-face.
            if partner_a != Some(flank_b) && !all_coincident {
                if let (Some(a), Some(b)) = (partner_a, partner_b) {
                    self.link(a, b);
                }
            }
            self.islands[face] = None;
            removed += 1;
        }
        removed
    }

    /// One pass of the collinear rule: flip each flat face across its long
    /// edge so the neighbor's wing absorbs it. A flat face that cannot be
    /// flipped (no neighbor there, or the flip would stay flat) is deleted
    /// instead. Returns (flips, deletions).
    fn rotate_flat_faces(&mut self) -> (usize, usize) {
        let mut flipped = 0;
        let mut dropped = 0;
        for face in 0..self.face_count() {
            if self.islands[face].is_none() {
                continue;
            }
            let [a, b, c] = self.face_points(face);
            if (b - a).cross(&(c - a)).norm() > tolerance() {
                continue;
            }

            let lengths = [
                (b - a).norm_squared(),
                (c - b).norm_squared(),
                (a - c).norm_squared(),
            ];
            let mut long = 0;
            for e in 1..3 {
                if lengths[e] > lengths[long] {
                    long = e;
                }
            }
            let slot = edge_slot(face, long);

            let flippable = self.neighbors[slot].is_some_and(|t| {
                let origin = self.point(slot);
                let along = self.point(next_in_face(slot)) - origin;
                let len = along.norm();
                if len <= tolerance() {
                    return false;
                }
                let along = along / len;
                let wing = self.point(prev_in_face(t)) - origin;
                (wing - along * along.dot(&wing)).norm() > tolerance()
            });
            if flippable {
                self.rotate_edge(slot);
                flipped += 1;
            } else {
                for e in 0..3 {
                    self.unlink(edge_slot(face, e));
                }
                self.islands[face] = None;
                dropped += 1;
            }
        }
        (flipped, dropped)
    }

    /// Flip the diagonal shared by `slot` and its partner. The two faces
    /// keep their indices and island but exchange the quad's diagonal for
    /// the one between their wings. Returns the two new diagonal slots.
    /// Callers guarantee the partner exists.
    pub(crate) fn rotate_edge(&mut self, slot: usize) -> (usize, usize) {
        let s = slot;
        let t = self.neighbors[s].unwrap_or(s);
        let f = face_of(s);
        let g = face_of(t);

        // Quad corners, taken from one copy each so both halves share the
        // exact scalars.
        let a = self.point(s);
        let b = self.point(next_in_face(s));
        let wing_f = self.point(prev_in_face(s));
        let wing_g = self.point(prev_in_face(t));

        let has_colors = self.colors.is_some();
        let (ca, cb, cwf, cwg) = if has_colors {
            (
                self.vertex_color(s),
                self.vertex_color(next_in_face(s)),
                self.vertex_color(prev_in_face(s)),
                self.vertex_color(prev_in_face(t)),
            )
        } else {
            ([0.0; 3], [0.0; 3], [0.0; 3], [0.0; 3])
        };

        // Outer partners before any rewiring.
        let out_fb = self.neighbors[next_in_face(s)]; // b -> wing_f
        let out_fa = self.neighbors[prev_in_face(s)]; // wing_f -> a
        let out_ga = self.neighbors[next_in_face(t)]; // a -> wing_g
        let out_gb = self.neighbors[prev_in_face(t)]; // wing_g -> b

        // New layout: f = (wing_f, a, wing_g), g = (wing_g, b, wing_f).
        self.set_point(f * 3, &wing_f);
        self.set_point(f * 3 + 1, &a);
        self.set_point(f * 3 + 2, &wing_g);
        self.set_point(g * 3, &wing_g);
        self.set_point(g * 3 + 1, &b);
        self.set_point(g * 3 + 2, &wing_f);
        if has_colors {
            self.set_vertex_color(f * 3, &cwf);
            self.set_vertex_color(f * 3 + 1, &ca);
            self.set_vertex_color(f * 3 + 2, &cwg);
            self.set_vertex_color(g * 3, &cwg);
            self.set_vertex_color(g * 3 + 1, &cb);
            self.set_vertex_color(g * 3 + 2, &cwf);
        }

        let reattach = |soup: &mut Self, here: usize, partner: Option<usize>| {
            soup.neighbors[here] = partner;
            if let Some(p) = partner {
                soup.neighbors[p] = Some(here);
            }
        };
        reattach(self, f * 3, out_fa); // wing_f -> a
        reattach(self, f * 3 + 1, out_ga); // a -> wing_g
        reattach(self, g * 3, out_gb); // wing_g -> b
        reattach(self, g * 3 + 1, out_fb); // b -> wing_f
        self.link(f * 3 + 2, g * 3 + 2); // the new diagonal

        (f * 3 + 2, g * 3 + 2)
    }

    /// Compact the buffers, dropping every face whose island is the absence
    /// marker and remapping all surviving indices. Idempotent; surviving
    /// symmetric pairings are preserved exactly.
    pub fn delete_degenerates(&mut self) -> SoupResult<usize> {
        self.require_topology()?;
        let faces = self.face_count();
        let mut remap: Vec<Option<usize>> = vec![None; faces];
        let mut kept = 0;
        for face in 0..faces {
            if self.islands[face].is_some() {
                remap[face] = Some(kept);
                kept += 1;
            }
        }
        if kept == faces {
            return Ok(0);
        }

        for (face, target) in remap.iter().enumerate() {
            let Some(target) = target else { continue };
            self.positions.copy_within(face * 9..face * 9 + 9, target * 9);
            if let Some(colors) = &mut self.colors {
                colors.copy_within(face * 9..face * 9 + 9, target * 9);
            }
        }
        self.positions.truncate(kept * 9);
        if let Some(colors) = &mut self.colors {
            colors.truncate(kept * 9);
        }

        let mut neighbors = vec![None; kept * 3];
        let mut islands = vec![None; kept];
        // First surviving member of each old group becomes its new root.
        let mut new_roots: HashMap<usize, usize> = HashMap::new();
        for (face, target) in remap.iter().enumerate() {
            let Some(target) = target else { continue };
            for e in 0..3 {
                neighbors[target * 3 + e] = self.neighbors[face * 3 + e]
                    .and_then(|other| {
                        remap[face_of(other)].map(|nf| nf * 3 + corner_of(other))
                    });
            }
            if let Some(root) = self.islands[face] {
                islands[*target] =
                    Some(*new_roots.entry(root).or_insert(*target));
            }
        }
        self.neighbors = neighbors;
        self.islands = islands;
        debug!(removed = faces - kept, kept, "compacted deleted faces");
        Ok(faces - kept)
    }
}
