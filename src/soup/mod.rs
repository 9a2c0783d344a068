//! `Soup` struct, flat-buffer addressing and the topology kept alongside it.
//!
//! A soup face owns nine consecutive scalars of the position buffer; nothing
//! is index-shared between faces. Connectivity is not stored in the input,
//! it is reconstructed by [`Soup::find_neighbors`] and then maintained
//! incrementally by every mutating operation.
//!
//! Three index spaces are used throughout, all derived from the flat scalar
//! offset by integer division:
//! - scalar index: offset into `positions` (step 1)
//! - vertex index: `scalar / 3`, also called the *edge slot*, because the
//!   vertex opens the directed in-face edge that starts at it (step 3)
//! - face index: `scalar / 9` = `vertex / 3` (step 9)

use crate::errors::{SoupError, SoupResult};
use crate::float_types::Real;
use nalgebra::{Point3, Vector3};
use std::fmt::Debug;

pub mod key;
pub mod plane;

mod chop;
mod degenerate;
mod holes;
mod islands;
mod merge;
mod neighbors;
mod split;

pub use holes::{BoundaryLoop, MAX_HOLE_EDGES};
pub use islands::IslandGeometry;
pub use key::{PointKey, VertexMatching};
pub use merge::normals_within;
pub use neighbors::{ResolveMode, TopologySummary};
pub use plane::Plane;
pub use split::SplitSummary;

/// Face that owns an edge slot (or vertex index).
#[inline]
pub const fn face_of(slot: usize) -> usize {
    slot / 3
}

/// Corner (0, 1 or 2) of an edge slot within its face.
#[inline]
pub const fn corner_of(slot: usize) -> usize {
    slot % 3
}

/// Edge slot of `face`'s corner `edge`.
#[inline]
pub const fn edge_slot(face: usize, edge: usize) -> usize {
    face * 3 + edge
}

/// The edge slot after `slot`, walking forward around its own face.
#[inline]
pub const fn next_in_face(slot: usize) -> usize {
    face_of(slot) * 3 + (corner_of(slot) + 1) % 3
}

/// The edge slot before `slot`, walking backward around its own face.
#[inline]
pub const fn prev_in_face(slot: usize) -> usize {
    face_of(slot) * 3 + (corner_of(slot) + 2) % 3
}

/// A triangle soup plus its reconstructed connectivity.
///
/// `S` is caller metadata carried through clones and chops, never
/// interpreted here.
#[derive(Clone, Debug)]
pub struct Soup<S: Clone + Send + Sync + Debug> {
    /// Flat vertex positions, nine scalars per face.
    positions: Vec<Real>,

    /// Optional per-vertex RGB, parallel to `positions`.
    colors: Option<Vec<Real>>,

    /// Opposite edge slot per edge slot. Symmetric whenever an operation is
    /// not mid-flight: `neighbors[a] == Some(b)` iff `neighbors[b] == Some(a)`.
    neighbors: Vec<Option<usize>>,

    /// Union-find root face per face. `None` marks a face deleted and
    /// awaiting [`Soup::delete_degenerates`] compaction.
    islands: Vec<Option<usize>>,

    /// Vertex equality policy the topology was built with.
    matching: VertexMatching,

    /// Metadata
    pub metadata: Option<S>,
}

impl<S: Clone + Send + Sync + Debug> Soup<S> {
    /// Empty soup.
    pub fn new() -> Self {
        Soup {
            positions: Vec::new(),
            colors: None,
            neighbors: Vec::new(),
            islands: Vec::new(),
            matching: VertexMatching::Exact,
            metadata: None,
        }
    }

    /// Build a soup by taking ownership of flat buffers.
    ///
    /// `positions` holds nine scalars per face; `colors`, when given, is a
    /// parallel per-vertex RGB buffer of the same length. Indexed meshes
    /// have no entry point here: the only accepted layout is the flat one.
    pub fn from_buffers(
        positions: Vec<Real>,
        colors: Option<Vec<Real>>,
        metadata: Option<S>,
    ) -> SoupResult<Self> {
        if positions.len() % 9 != 0 {
            return Err(SoupError::RaggedSoup(positions.len()));
        }
        if let Some((i, _)) = positions.iter().enumerate().find(|(_, x)| !x.is_finite()) {
            return Err(SoupError::InvalidCoordinate(i));
        }
        if let Some(colors) = &colors {
            if colors.len() != positions.len() {
                return Err(SoupError::ColorLength {
                    got: colors.len(),
                    want: positions.len(),
                });
            }
        }
        Ok(Soup {
            neighbors: Vec::new(),
            islands: Vec::new(),
            matching: VertexMatching::Exact,
            positions,
            colors,
            metadata,
        })
    }

    /// Number of faces in the soup, deleted-but-not-compacted ones included.
    #[inline]
    pub fn face_count(&self) -> usize {
        self.positions.len() / 9
    }

    /// The flat position buffer.
    #[inline]
    pub fn positions(&self) -> &[Real] {
        &self.positions
    }

    /// The flat per-vertex color buffer, if the soup carries one.
    #[inline]
    pub fn colors(&self) -> Option<&[Real]> {
        self.colors.as_deref()
    }

    /// The opposite edge slot per edge slot. Empty until
    /// [`Soup::find_neighbors`] has run.
    #[inline]
    pub fn neighbors(&self) -> &[Option<usize>] {
        &self.neighbors
    }

    /// Union-find root face per face, `None` for deleted faces. Empty until
    /// [`Soup::find_neighbors`] has run.
    #[inline]
    pub fn islands(&self) -> &[Option<usize>] {
        &self.islands
    }

    /// The vertex equality policy the current topology was built with.
    #[inline]
    pub fn matching(&self) -> VertexMatching {
        self.matching
    }

    /// Position of a vertex index as a point.
    #[inline]
    pub fn point(&self, vertex: usize) -> Point3<Real> {
        let i = vertex * 3;
        Point3::new(self.positions[i], self.positions[i + 1], self.positions[i + 2])
    }

    /// The three corner points of a face.
    #[inline]
    pub fn face_points(&self, face: usize) -> [Point3<Real>; 3] {
        [
            self.point(face * 3),
            self.point(face * 3 + 1),
            self.point(face * 3 + 2),
        ]
    }

    /// Unit normal of a face by the right-hand rule, the zero vector when
    /// the face has no area.
    pub fn face_normal(&self, face: usize) -> Vector3<Real> {
        let [a, b, c] = self.face_points(face);
        let n = (b - a).cross(&(c - a));
        if n.norm_squared() < Real::EPSILON * Real::EPSILON {
            Vector3::zeros()
        } else {
            n.normalize()
        }
    }

    /// Axis-aligned bounds of all live vertices, `None` for an empty soup.
    pub fn bounding_box(&self) -> Option<(Point3<Real>, Point3<Real>)> {
        if self.positions.is_empty() {
            return None;
        }
        let mut min = Point3::new(Real::MAX, Real::MAX, Real::MAX);
        let mut max = Point3::new(Real::MIN, Real::MIN, Real::MIN);
        for v in 0..self.positions.len() / 3 {
            let p = self.point(v);
            for axis in 0..3 {
                min[axis] = min[axis].min(p[axis]);
                max[axis] = max[axis].max(p[axis]);
            }
        }
        Some((min, max))
    }

    /// True once every edge of every live face has a partner.
    pub fn is_watertight(&self) -> bool {
        self.has_topology() && self.open_edge_count() == 0
    }

    /// Number of unpaired edges on live faces.
    pub fn open_edge_count(&self) -> usize {
        self.neighbors
            .iter()
            .enumerate()
            .filter(|(slot, link)| link.is_none() && self.islands[face_of(*slot)].is_some())
            .count()
    }

    /// Whether neighbor topology has been built for the current face count.
    #[inline]
    pub(crate) fn has_topology(&self) -> bool {
        self.neighbors.len() == self.face_count() * 3
    }

    /// Guard for operations that need the topology arrays.
    pub(crate) fn require_topology(&self) -> SoupResult<()> {
        if self.has_topology() {
            Ok(())
        } else {
            Err(SoupError::TopologyMissing)
        }
    }

    /// Drop all derived topology, leaving only the raw buffers.
    pub(crate) fn clear_topology(&mut self) {
        self.neighbors.clear();
        self.islands.clear();
    }

    /// Store the topology arrays rebuilt by a resolution pass.
    pub(crate) fn install_topology(
        &mut self,
        neighbors: Vec<Option<usize>>,
        islands: Vec<Option<usize>>,
        matching: VertexMatching,
    ) {
        self.neighbors = neighbors;
        self.islands = islands;
        self.matching = matching;
    }

    /// Overwrite the position of one vertex index.
    #[inline]
    pub(crate) fn set_point(&mut self, vertex: usize, p: &Point3<Real>) {
        let i = vertex * 3;
        self.positions[i] = p.x;
        self.positions[i + 1] = p.y;
        self.positions[i + 2] = p.z;
    }

    /// RGB of one vertex index. Only call on soups that carry colors.
    #[inline]
    pub(crate) fn vertex_color(&self, vertex: usize) -> [Real; 3] {
        let colors = self.colors.as_ref().map_or(&[][..], |c| &c[..]);
        let i = vertex * 3;
        [colors[i], colors[i + 1], colors[i + 2]]
    }

    /// Overwrite the RGB of one vertex index, a no-op on colorless soups.
    #[inline]
    pub(crate) fn set_vertex_color(&mut self, vertex: usize, rgb: &[Real; 3]) {
        if let Some(colors) = &mut self.colors {
            let i = vertex * 3;
            colors[i] = rgb[0];
            colors[i + 1] = rgb[1];
            colors[i + 2] = rgb[2];
        }
    }

    /// Append a face, growing the topology arrays in step. The new edges
    /// start unpaired. Returns the new face index.
    pub(crate) fn push_face(
        &mut self,
        points: &[Point3<Real>; 3],
        rgb: Option<&[[Real; 3]; 3]>,
        island: Option<usize>,
    ) -> usize {
        let face = self.face_count();
        for p in points {
            self.positions.extend_from_slice(&[p.x, p.y, p.z]);
        }
        if let Some(colors) = &mut self.colors {
            // Parity with positions is an invariant, callers of push_face
            // on colored soups must supply colors.
            let rgb = rgb.unwrap_or(&[[0.0; 3]; 3]);
            for c in rgb {
                colors.extend_from_slice(c);
            }
        }
        self.neighbors.extend_from_slice(&[None, None, None]);
        self.islands.push(island);
        face
    }

    /// Pair two edge slots in both directions.
    #[inline]
    pub(crate) fn link(&mut self, a: usize, b: usize) {
        self.neighbors[a] = Some(b);
        self.neighbors[b] = Some(a);
    }

    /// Unpair an edge slot and whatever it pointed at.
    #[inline]
    pub(crate) fn unlink(&mut self, slot: usize) {
        if let Some(other) = self.neighbors[slot].take() {
            self.neighbors[other] = None;
        }
    }

    /// Move a pairing: whatever `from` pointed at now points at `to` and
    /// vice versa, leaving `from` unpaired.
    #[inline]
    pub(crate) fn relink(&mut self, from: usize, to: usize) {
        match self.neighbors[from].take() {
            Some(other) => {
                self.neighbors[other] = Some(to);
                self.neighbors[to] = Some(other);
            },
            None => self.neighbors[to] = None,
        }
    }

    /// Rotate around `slot`'s start vertex, crossing the in-face edge that
    /// ends there. `None` at an open boundary.
    #[inline]
    pub(crate) fn rotate_about_start(&self, slot: usize) -> Option<usize> {
        self.neighbors[prev_in_face(slot)]
    }

    /// Rotate the opposite way around `slot`'s start vertex, crossing the
    /// pairing of `slot` itself. `None` at an open boundary.
    #[inline]
    pub(crate) fn rotate_about_start_rev(&self, slot: usize) -> Option<usize> {
        self.neighbors[slot].map(next_in_face)
    }

    /// Every edge slot that starts at the same vertex as `slot`, walked by
    /// fan rotation in both directions until an open boundary or a full
    /// loop. `slot` itself is included. The second value is true when the
    /// walk closed into a loop without meeting a boundary.
    pub(crate) fn start_vertex_fan(&self, slot: usize) -> (Vec<usize>, bool) {
        let mut fan = vec![slot];
        let mut cursor = slot;
        loop {
            match self.rotate_about_start(cursor) {
                Some(next) if next == slot => return (fan, true),
                Some(next) => {
                    fan.push(next);
                    cursor = next;
                },
                None => break,
            }
        }
        cursor = slot;
        while let Some(prev) = self.rotate_about_start_rev(cursor) {
            if prev == slot {
                // Unreachable once the forward walk hit a boundary, the
                // fan would have closed there instead.
                return (fan, true);
            }
            fan.push(prev);
            cursor = prev;
        }
        (fan, false)
    }
}

impl<S: Clone + Send + Sync + Debug> Default for Soup<S> {
    fn default() -> Self {
        Self::new()
    }
}
