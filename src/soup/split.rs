//! Plane splitting.
//!
//! `split_faces` rewrites the soup so no face-edge crosses the given plane.
//! Every crossing is resolved locally: the face (and its partner across the
//! edge, when there is one) each trade the crossing edge for two sub-edges
//! meeting at one shared intersection point. The piece that may still cross
//! elsewhere stays at the original face slot so the same sweep reaches it
//! again; the settled piece is appended at the end of the buffers.

use super::key::PointKey;
use super::plane::{COPLANAR, Plane};
use super::{Soup, face_of, next_in_face, prev_in_face};
use crate::errors::SoupResult;
use crate::float_types::Real;
use hashbrown::HashSet;
use nalgebra::Point3;
use std::fmt::Debug;
use tracing::debug;

/// What `split_faces` did.
#[derive(Debug, Clone)]
pub struct SplitSummary {
    /// Vertex keys lying exactly on the plane afterwards, fresh
    /// intersection points and pre-existing coplanar corners alike.
    pub on_plane: HashSet<PointKey>,
    /// Edge crossings resolved.
    pub crossings: usize,
    /// Faces appended while resolving them, two per interior crossing and
    /// one per boundary crossing.
    pub faces_added: usize,
}

#[inline]
fn lerp3(a: &[Real; 3], b: &[Real; 3], t: Real) -> [Real; 3] {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

impl<S: Clone + Send + Sync + Debug> Soup<S> {
    /// Cut every face-edge that strictly crosses `plane`, keeping the
    /// neighbor and island arrays consistent throughout.
    ///
    /// Endpoints within tolerance of the plane count as on it and never
    /// cross, which is also what keeps the sweep from re-splitting
    /// geometry it just produced.
    pub fn split_faces(&mut self, plane: &Plane) -> SoupResult<SplitSummary> {
        self.require_topology()?;
        let mut crossings = 0;
        let mut faces_added = 0;

        let mut slot = 0;
        while slot < self.face_count() * 3 {
            if self.islands[face_of(slot)].is_none() {
                slot += 1;
                continue;
            }
            let a = self.point(slot);
            let b = self.point(next_in_face(slot));
            let side_a = plane.orient_point(&a);
            let side_b = plane.orient_point(&b);
            if side_a == COPLANAR || side_b == COPLANAR || side_a == side_b {
                slot += 1;
                continue;
            }

            // One intersection point, written to every piece on both sides.
            let t = plane.intersection_parameter(&a, &b);
            let x = a + (b - a) * t;
            let partner = self.neighbors[slot];

            let (a_to_x, x_to_b) = self.split_half(plane, slot, &x, t);
            faces_added += 1;
            if let Some(u) = partner {
                let (b_to_x, x_to_a) = self.split_half(plane, u, &x, 1.0 - t);
                faces_added += 1;
                self.link(a_to_x, x_to_a);
                self.link(x_to_b, b_to_x);
            }
            crossings += 1;
            slot += 1;
        }

        let mut on_plane = HashSet::new();
        for face in 0..self.face_count() {
            if self.islands[face].is_none() {
                continue;
            }
            for corner in 0..3 {
                let p = self.point(face * 3 + corner);
                if plane.orient_point(&p) == COPLANAR {
                    on_plane.insert(self.matching.key(&p));
                }
            }
        }

        debug!(
            crossings,
            faces_added,
            on_plane = on_plane.len(),
            "plane split complete"
        );
        Ok(SplitSummary {
            on_plane,
            crossings,
            faces_added,
        })
    }

    /// Split one face of a crossing edge `s` at `x`. The endpoint sharing
    /// the wing's side moves out to an appended face; the remainder, the
    /// only piece that can still cross the plane, keeps the original face
    /// slot. Returns the slots now carrying first-endpoint→x and
    /// x→second-endpoint.
    fn split_half(
        &mut self,
        plane: &Plane,
        s: usize,
        x: &Point3<Real>,
        alpha: Real,
    ) -> (usize, usize) {
        let after = next_in_face(s);
        let before = prev_in_face(s);
        let a = self.point(s);
        let b = self.point(after);
        let w = self.point(before);
        let island = self.islands[face_of(s)];

        let has_colors = self.colors.is_some();
        let (ca, cb, cw) = if has_colors {
            (
                self.vertex_color(s),
                self.vertex_color(after),
                self.vertex_color(before),
            )
        } else {
            ([0.0; 3], [0.0; 3], [0.0; 3])
        };
        let cx = lerp3(&ca, &cb, alpha);

        let side_a = plane.orient_point(&a);
        let side_w = plane.orient_point(&w);

        if side_w == side_a {
            // a moves out; (x, b, w) stays here and still straddles.
            self.set_point(s, x);
            if has_colors {
                self.set_vertex_color(s, &cx);
            }
            let rgb = has_colors.then_some([ca, cx, cw]);
            let added = self.push_face(&[a, *x, w], rgb.as_ref(), island);
            // The old w->a edge lives on the appended face now; the slot it
            // vacated becomes the interior w->x pairing.
            self.relink(before, added * 3 + 2);
            self.link(before, added * 3 + 1);
            (added * 3, s)
        } else {
            // b moves out; (a, x, w) stays here, settled unless w is still
            // on b's side.
            self.set_point(after, x);
            if has_colors {
                self.set_vertex_color(after, &cx);
            }
            let rgb = has_colors.then_some([cx, cb, cw]);
            let added = self.push_face(&[*x, b, w], rgb.as_ref(), island);
            self.relink(after, added * 3 + 1);
            self.link(after, added * 3 + 2);
            (s, added * 3)
        }
    }
}
