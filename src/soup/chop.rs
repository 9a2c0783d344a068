//! Chopping a soup in two along a plane.
//!
//! `chop` is the composition layer over the split, disconnect and sealing
//! passes: after it, each half is an independent soup whose cut face is
//! capped with new triangles.

use super::key::PointKey;
use super::plane::{BACK, FRONT, Plane};
use super::Soup;
use crate::errors::SoupResult;
use hashbrown::HashSet;
use std::fmt::Debug;
use tracing::{debug, warn};

impl<S: Clone + Send + Sync + Debug> Soup<S> {
    /// Cut the soup along `plane` into two independent, sealed halves,
    /// front first. The source soup is left untouched.
    ///
    /// Composes [`Soup::split_faces`], [`Soup::disconnect_at_split`],
    /// compaction and per-island boundary sealing, then recomputes islands
    /// from scratch on each half: disconnecting can fragment an island
    /// into several and sealing changes what is reachable.
    pub fn chop(&self, plane: &Plane) -> SoupResult<(Soup<S>, Soup<S>)> {
        let mut split = self.clone();
        let summary = split.split_faces(plane)?;
        let (mut front, mut back) = split.disconnect_at_split(plane, &summary.on_plane)?;
        for half in [&mut front, &mut back] {
            half.delete_degenerates()?;
            half.seal_cut(&summary.on_plane)?;
            half.rebuild_islands();
        }
        debug!(
            crossings = summary.crossings,
            front = front.face_count(),
            back = back.face_count(),
            "chop complete"
        );
        Ok((front, back))
    }

    /// Clone the soup onto both sides of `plane`: the front clone drops
    /// every face with a vertex strictly behind the plane, the back clone
    /// every face with one strictly in front. Faces lying entirely in the
    /// plane survive in both. `on_plane` marks vertices that count as on
    /// the plane whatever their stored coordinates say.
    pub fn disconnect_at_split(
        &self,
        plane: &Plane,
        on_plane: &HashSet<PointKey>,
    ) -> SoupResult<(Soup<S>, Soup<S>)> {
        self.require_topology()?;
        let mut front = self.clone();
        front.drop_beyond(plane, on_plane, BACK);
        let mut back = self.clone();
        back.drop_beyond(plane, on_plane, FRONT);
        Ok((front, back))
    }

    /// Delete every live face with a vertex strictly on the `banned` side,
    /// unlinking its edges so the surviving faces see the cut as an open
    /// boundary.
    fn drop_beyond(&mut self, plane: &Plane, on_plane: &HashSet<PointKey>, banned: i8) {
        let mut dropped = 0;
        for face in 0..self.face_count() {
            if self.islands[face].is_none() {
                continue;
            }
            let beyond = (0..3).any(|corner| {
                let p = self.point(face * 3 + corner);
                !on_plane.contains(&self.matching.key(&p)) && plane.orient_point(&p) == banned
            });
            if beyond {
                for corner in 0..3 {
                    self.unlink(face * 3 + corner);
                }
                self.islands[face] = None;
                dropped += 1;
            }
        }
        debug!(dropped, banned, "disconnected one side of the cut");
    }

    /// Seal the planar boundary left by a cut, island by island. Each
    /// island's loops go to the repairer together, so a cut through a
    /// tunnel seals the ring between its concentric loops rather than two
    /// overlapping disks. Cut boundaries bypass the residual-hole size cap
    /// of [`Soup::fix_holes`]; their loops came from our own split.
    fn seal_cut(&mut self, on_plane: &HashSet<PointKey>) -> SoupResult<usize> {
        let mut roots = Vec::new();
        let mut seen = HashSet::new();
        for root in self.islands.iter().flatten() {
            if seen.insert(*root) {
                roots.push(*root);
            }
        }

        let mut added = 0;
        for island in roots {
            let loops = self.find_edges_in_plane(island, on_plane)?;
            for boundary in &loops {
                if !boundary.closed {
                    warn!(
                        edges = boundary.edges.len(),
                        island, "cut boundary does not close, leaving it open"
                    );
                }
            }
            added += self.fix_planar_hole(&loops)?;
        }
        Ok(added)
    }
}
