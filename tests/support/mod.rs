//! Test support library
//! Provides soup fixtures & helper functions shared by the integration tests.

// Each integration test crate compiles its own copy and uses a subset.
#![allow(dead_code)]

use nalgebra::{Rotation3, Vector3};
use soupchop::Soup;
use soupchop::float_types::Real;
use soupchop::soup::face_of;

/// Axis-aligned cube `[0, s]^3` as twelve outward-wound triangles.
pub fn cube_soup(s: Real) -> Vec<Real> {
    vec![
        // bottom, -z
        0.0, 0.0, 0.0, 0.0, s, 0.0, s, s, 0.0, //
        0.0, 0.0, 0.0, s, s, 0.0, s, 0.0, 0.0, //
        // top, +z
        0.0, 0.0, s, s, 0.0, s, s, s, s, //
        0.0, 0.0, s, s, s, s, 0.0, s, s, //
        // front, -y
        0.0, 0.0, 0.0, s, 0.0, 0.0, s, 0.0, s, //
        0.0, 0.0, 0.0, s, 0.0, s, 0.0, 0.0, s, //
        // back, +y
        0.0, s, 0.0, s, s, s, s, s, 0.0, //
        0.0, s, 0.0, 0.0, s, s, s, s, s, //
        // left, -x
        0.0, 0.0, 0.0, 0.0, 0.0, s, 0.0, s, s, //
        0.0, 0.0, 0.0, 0.0, s, s, 0.0, s, 0.0, //
        // right, +x
        s, 0.0, 0.0, s, s, s, s, 0.0, s, //
        s, 0.0, 0.0, s, s, 0.0, s, s, s, //
    ]
}

/// Right-cornered tetrahedron with its right angle at `origin`, outward
/// wound.
pub fn tetra_soup(origin: [Real; 3], s: Real) -> Vec<Real> {
    let [x, y, z] = origin;
    vec![
        x, y, z, x, y + s, z, x + s, y, z, //
        x, y, z, x + s, y, z, x, y, z + s, //
        x, y, z, x, y, z + s, x, y + s, z, //
        x + s, y, z, x, y + s, z, x, y, z + s, //
    ]
}

/// Two watertight tetrahedra sharing the triangle `(0,0,0) (0,1,0) (1,0,0)`,
/// each soup carrying its own oppositely-wound copy of it. Eight faces.
pub fn face_glued_pair() -> Vec<Real> {
    // Upper tetra: apex at +z. Its copy of the shared face points -z.
    let mut soup = tetra_soup([0.0, 0.0, 0.0], 1.0);
    // Lower tetra: same base mirrored down, apex at -z, base copy points +z.
    soup.extend_from_slice(&[
        0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, //
        0.0, 0.0, 0.0, 0.0, 0.0, -1.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, -1.0, //
        1.0, 0.0, 0.0, 0.0, 0.0, -1.0, 0.0, 1.0, 0.0, //
    ]);
    soup
}

/// Two watertight tetrahedra sharing only the edge from `(0,0,0)` to
/// `(1,0,0)`, one above the XY plane and one below. Eight faces.
pub fn edge_glued_pair() -> Vec<Real> {
    let mut soup = tetra_soup([0.0, 0.0, 0.0], 1.0);
    soup.extend_from_slice(&[
        0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, -1.0, 0.0, //
        0.0, 0.0, 0.0, 0.0, 0.0, -1.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 0.0, 0.0, -1.0, 0.0, 0.0, 0.0, -1.0, //
        1.0, 0.0, 0.0, 0.0, 0.0, -1.0, 0.0, -1.0, 0.0, //
    ]);
    soup
}

/// `n × n × n` unit cubes spaced a quarter unit apart, so no vertex of one
/// cube coincides with another's; every cube stays its own island.
pub fn cube_grid(n: usize) -> Vec<Real> {
    let mut soup = Vec::new();
    for ix in 0..n {
        for iy in 0..n {
            for iz in 0..n {
                let cube = cube_soup(1.0);
                for (i, scalar) in cube.iter().enumerate() {
                    let offset = match i % 3 {
                        0 => ix as Real,
                        1 => iy as Real,
                        _ => iz as Real,
                    };
                    soup.push(scalar + offset * 1.25);
                }
            }
        }
    }
    soup
}

/// Two unit cubes sharing the wall at `x = 1`, each soup carrying its own
/// oppositely-wound copy of it. Twenty-four faces.
pub fn wall_glued_cubes() -> Vec<Real> {
    let mut soup = cube_soup(1.0);
    let other = cube_soup(1.0);
    for (i, scalar) in other.iter().enumerate() {
        soup.push(if i % 3 == 0 { scalar + 1.0 } else { *scalar });
    }
    soup
}

/// Reorder whole faces by a deterministic pseudo-random permutation.
pub fn permute_faces(soup: &[Real], seed: u64) -> Vec<Real> {
    let faces = soup.len() / 9;
    let mut order: Vec<usize> = (0..faces).collect();
    // Fisher-Yates driven by a tiny multiplicative congruential sequence,
    // reproducible without pulling in an RNG crate.
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    for i in (1..faces).rev() {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        let j = (state >> 33) as usize % (i + 1);
        order.swap(i, j);
    }
    let mut out = Vec::with_capacity(soup.len());
    for face in order {
        out.extend_from_slice(&soup[face * 9..face * 9 + 9]);
    }
    out
}

/// Rigidly rotate every vertex around the given axis through the origin.
pub fn rotate_soup(soup: &[Real], axis: Vector3<Real>, angle: Real) -> Vec<Real> {
    let rotation = Rotation3::from_axis_angle(&nalgebra::Unit::new_normalize(axis), angle);
    let mut out = Vec::with_capacity(soup.len());
    for chunk in soup.chunks_exact(3) {
        let p = rotation * nalgebra::Point3::new(chunk[0], chunk[1], chunk[2]);
        out.extend_from_slice(&[p.x, p.y, p.z]);
    }
    out
}

/// Every pairing must point back at its partner, and never across a
/// deleted face.
pub fn assert_symmetric<S: Clone + Send + Sync + std::fmt::Debug>(soup: &Soup<S>) {
    for (slot, link) in soup.neighbors().iter().enumerate() {
        if let Some(other) = link {
            assert_eq!(
                soup.neighbors()[*other],
                Some(slot),
                "slot {slot} pairs with {other} but not back"
            );
            assert!(
                soup.islands()[face_of(slot)].is_some() && soup.islands()[face_of(*other)].is_some(),
                "slot {slot} links into a deleted face"
            );
        }
    }
}

/// Watertight box `[0, 3]^2 x [0, 1]` with a square tunnel `[1, 2]^2`
/// through it along z. Thirty-two faces, genus one.
pub fn square_torus() -> Vec<Real> {
    let mut positions = Vec::new();
    let mut wall = |c0: [Real; 2], c1: [Real; 2]| {
        let (x0, y0) = (c0[0], c0[1]);
        let (x1, y1) = (c1[0], c1[1]);
        positions.extend_from_slice(&[x0, y0, 0.0, x1, y1, 0.0, x1, y1, 1.0]);
        positions.extend_from_slice(&[x0, y0, 0.0, x1, y1, 1.0, x0, y0, 1.0]);
    };
    // Outer walls wound to face away from the box.
    wall([0.0, 0.0], [3.0, 0.0]);
    wall([3.0, 0.0], [3.0, 3.0]);
    wall([3.0, 3.0], [0.0, 3.0]);
    wall([0.0, 3.0], [0.0, 0.0]);
    // Tunnel walls face into the tunnel.
    wall([1.0, 1.0], [1.0, 2.0]);
    wall([1.0, 2.0], [2.0, 2.0]);
    wall([2.0, 2.0], [2.0, 1.0]);
    wall([2.0, 1.0], [1.0, 1.0]);
    // Flat rings joining the walls, bottom facing -z and top facing +z.
    let mut ring = |o0: [Real; 2], o1: [Real; 2], i0: [Real; 2], i1: [Real; 2], z: Real| {
        if z == 0.0 {
            positions.extend_from_slice(&[o0[0], o0[1], z, i0[0], i0[1], z, i1[0], i1[1], z]);
            positions.extend_from_slice(&[o0[0], o0[1], z, i1[0], i1[1], z, o1[0], o1[1], z]);
        } else {
            positions.extend_from_slice(&[o0[0], o0[1], z, i1[0], i1[1], z, i0[0], i0[1], z]);
            positions.extend_from_slice(&[o0[0], o0[1], z, o1[0], o1[1], z, i1[0], i1[1], z]);
        }
    };
    for z in [0.0, 1.0] {
        ring([0.0, 0.0], [3.0, 0.0], [1.0, 1.0], [2.0, 1.0], z);
        ring([3.0, 0.0], [3.0, 3.0], [2.0, 1.0], [2.0, 2.0], z);
        ring([3.0, 3.0], [0.0, 3.0], [2.0, 2.0], [1.0, 2.0], z);
        ring([0.0, 3.0], [0.0, 0.0], [1.0, 2.0], [1.0, 1.0], z);
    }
    positions
}

/// Sum of live triangle areas.
pub fn surface_area<S: Clone + Send + Sync + std::fmt::Debug>(soup: &Soup<S>) -> Real {
    let mut area = 0.0;
    for face in 0..soup.face_count() {
        if soup.islands()[face].is_none() {
            continue;
        }
        let [a, b, c] = soup.face_points(face);
        area += (b - a).cross(&(c - a)).norm() / 2.0;
    }
    area
}

/// Signed enclosed volume by the divergence theorem. Meaningful for a
/// watertight, outward-wound soup.
pub fn signed_volume<S: Clone + Send + Sync + std::fmt::Debug>(soup: &Soup<S>) -> Real {
    let mut volume = 0.0;
    for face in 0..soup.face_count() {
        if soup.islands()[face].is_none() {
            continue;
        }
        let [a, b, c] = soup.face_points(face);
        volume += a.coords.dot(&b.coords.cross(&c.coords)) / 6.0;
    }
    volume
}

/// Distinct live vertex positions by exact bit pattern.
pub fn distinct_vertex_count<S: Clone + Send + Sync + std::fmt::Debug>(soup: &Soup<S>) -> usize {
    let mut seen = std::collections::HashSet::new();
    for face in 0..soup.face_count() {
        if soup.islands()[face].is_none() {
            continue;
        }
        for corner in 0..3 {
            let p = soup.point(face * 3 + corner);
            seen.insert((p.x.to_bits(), p.y.to_bits(), p.z.to_bits()));
        }
    }
    seen.len()
}

/// Euler characteristic `V - E + F` of a watertight soup, where paired
/// edges count once. Two for a sphere-like solid, zero for a torus.
pub fn euler_characteristic<S: Clone + Send + Sync + std::fmt::Debug>(soup: &Soup<S>) -> isize {
    let faces = soup
        .islands()
        .iter()
        .filter(|island| island.is_some())
        .count() as isize;
    let vertices = distinct_vertex_count(soup) as isize;
    vertices - 3 * faces / 2 + faces
}
