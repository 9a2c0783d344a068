//! Neighbor reconstruction and island behavior on whole solids.

mod support;

use nalgebra::Vector3;
use soupchop::{ResolveMode, Soup, SoupError, VertexMatching};
use support::{
    assert_symmetric, cube_grid, cube_soup, edge_glued_pair, face_glued_pair, permute_faces,
    rotate_soup, signed_volume, tetra_soup, wall_glued_cubes,
};

#[test]
fn cube_resolves_watertight() {
    let mut soup = Soup::<()>::from_buffers(cube_soup(1.0), None, None).unwrap();
    let summary = soup
        .find_neighbors(VertexMatching::Exact, ResolveMode::Strict)
        .unwrap();

    assert_eq!(summary.resolved, 18);
    assert_eq!(summary.open, 0);
    assert_eq!(summary.islands, 1);
    assert!(soup.is_watertight());
    assert_eq!(soup.island_count(), 1);
    assert_symmetric(&soup);
    assert!((signed_volume(&soup) - 1.0).abs() < 1e-9);
}

#[test]
fn face_order_does_not_matter() {
    for seed in [3, 17, 4242] {
        let shuffled = permute_faces(&cube_soup(2.0), seed);
        let mut soup = Soup::<()>::from_buffers(shuffled, None, None).unwrap();
        let summary = soup
            .find_neighbors(VertexMatching::Exact, ResolveMode::Strict)
            .unwrap();
        assert_eq!(summary.resolved, 18, "seed {seed}");
        assert!(soup.is_watertight(), "seed {seed}");
        assert_eq!(soup.island_count(), 1, "seed {seed}");
        assert_symmetric(&soup);
    }
}

#[test]
fn rigid_rotation_does_not_matter() {
    let rotated = rotate_soup(&cube_soup(1.0), Vector3::new(1.0, 2.0, 3.0), 0.83);
    let mut soup = Soup::<()>::from_buffers(rotated, None, None).unwrap();
    let summary = soup
        .find_neighbors(VertexMatching::Exact, ResolveMode::Strict)
        .unwrap();
    assert_eq!(summary.open, 0);
    assert!(soup.is_watertight());
    assert!((signed_volume(&soup) - 1.0).abs() < 1e-9);
}

#[test]
fn face_glued_tetrahedra_stay_two_islands() {
    let mut soup = Soup::<()>::from_buffers(face_glued_pair(), None, None).unwrap();
    let summary = soup
        .find_neighbors(VertexMatching::Exact, ResolveMode::Permissive)
        .unwrap();

    // Every edge of the shared triangle has four incident faces; the
    // angle rules pair each solid with itself.
    assert_eq!(summary.open, 0);
    assert_eq!(summary.islands, 2);
    assert!(soup.is_watertight());
    assert_symmetric(&soup);

    let halves = soup.isolate().unwrap();
    assert_eq!(halves.len(), 2);
    for half in &halves {
        assert_eq!(half.face_count(), 4);
        assert!(half.is_watertight());
    }
}

#[test]
fn edge_glued_tetrahedra_stay_two_islands() {
    let mut soup = Soup::<()>::from_buffers(edge_glued_pair(), None, None).unwrap();
    let summary = soup
        .find_neighbors(VertexMatching::Exact, ResolveMode::Permissive)
        .unwrap();

    assert_eq!(summary.open, 0);
    assert_eq!(summary.islands, 2);
    assert!(soup.is_watertight());
    assert_symmetric(&soup);
}

#[test]
fn fin_fails_strict() {
    // A third face on one edge: the sheet pair resolves, the fin cannot.
    let mut soup = Soup::<()>::from_buffers(
        vec![
            0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.5, 1.0, 0.0, //
            1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.5, -1.0, 0.0, //
            1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.5, 0.0, 1.0, //
        ],
        None,
        None,
    )
    .unwrap();
    let err = soup
        .find_neighbors(VertexMatching::Exact, ResolveMode::Strict)
        .unwrap_err();
    assert!(matches!(err, SoupError::NonManifold { open } if open > 0));

    // A strict failure installs nothing.
    assert!(soup.neighbors().is_empty());
    assert!(soup.islands().is_empty());
    assert_eq!(
        soup.chop(&soupchop::Plane::from_normal(Vector3::z(), 0.1))
            .unwrap_err(),
        SoupError::TopologyMissing
    );
}

#[test]
fn grid_of_cubes_is_many_islands() {
    let mut soup = Soup::<()>::from_buffers(cube_grid(3), None, None).unwrap();
    let summary = soup
        .find_neighbors(VertexMatching::Exact, ResolveMode::Strict)
        .unwrap();

    assert_eq!(soup.face_count(), 27 * 12);
    assert_eq!(summary.resolved, 27 * 18);
    assert_eq!(summary.islands, 27);
    assert!(soup.is_watertight());
    assert_symmetric(&soup);

    let cubes = soup.isolate().unwrap();
    assert_eq!(cubes.len(), 27);
    for cube in &cubes {
        assert_eq!(cube.face_count(), 12);
        assert!(cube.is_watertight());
        assert_eq!(cube.island_count(), 1);
        assert!((signed_volume(cube) - 1.0).abs() < 1e-9);
    }

    // Neither the face order nor the pose changes the count.
    let shuffled = permute_faces(&cube_grid(3), 4242);
    let twisted = rotate_soup(&cube_grid(3), Vector3::new(1.0, 2.0, 3.0), 0.83);
    for buffer in [shuffled, twisted] {
        let mut soup = Soup::<()>::from_buffers(buffer, None, None).unwrap();
        let summary = soup
            .find_neighbors(VertexMatching::Exact, ResolveMode::Strict)
            .unwrap();
        assert_eq!(summary.islands, 27);
        assert!(soup.is_watertight());
        assert_symmetric(&soup);
    }
}

#[test]
fn cubes_sharing_a_wall_stay_two_islands() {
    let mut soup = Soup::<()>::from_buffers(wall_glued_cubes(), None, None).unwrap();
    let summary = soup
        .find_neighbors(VertexMatching::Exact, ResolveMode::Permissive)
        .unwrap();

    assert_eq!(summary.open, 0);
    assert_eq!(summary.islands, 2);
    assert!(soup.is_watertight());
    assert_symmetric(&soup);

    let halves = soup.isolate().unwrap();
    assert_eq!(halves.len(), 2);
    for half in &halves {
        assert_eq!(half.face_count(), 12);
        assert!(half.is_watertight());
        assert!((signed_volume(half) - 1.0).abs() < 1e-9);
    }
}

#[test]
fn isolated_geometries_flatten_per_island() {
    let mut soup = Soup::<()>::from_buffers(face_glued_pair(), None, None).unwrap();
    soup.find_neighbors(VertexMatching::Exact, ResolveMode::Permissive)
        .unwrap();

    let geoms = soup.isolated_geometries().unwrap();
    assert_eq!(geoms.len(), 2);
    for geom in &geoms {
        assert_eq!(geom.positions.len(), 4 * 9);
        assert_eq!(geom.normals.len(), geom.positions.len());
        assert!(geom.colors.is_none());
        // Flat normals: the three copies per face agree.
        for face in geom.normals.chunks_exact(9) {
            assert_eq!(face[0..3], face[3..6]);
            assert_eq!(face[3..6], face[6..9]);
        }
    }
}

#[test]
fn needle_face_is_dropped_at_resolution() {
    let mut positions = cube_soup(1.0);
    // A zero-length edge never enters matching.
    positions.extend_from_slice(&[5.0, 5.0, 5.0, 5.0, 5.0, 5.0, 6.0, 5.0, 5.0]);
    let mut soup = Soup::<()>::from_buffers(positions, None, None).unwrap();
    let summary = soup
        .find_neighbors(VertexMatching::Exact, ResolveMode::Strict)
        .unwrap();

    assert_eq!(summary.open, 0);
    assert_eq!(summary.islands, 1);
    assert_eq!(soup.islands()[12], None);
    assert!(soup.is_watertight());

    assert_eq!(soup.remove_degenerates().unwrap(), 0);
    assert_eq!(soup.delete_degenerates().unwrap(), 1);
    assert_eq!(soup.face_count(), 12);
    assert!(soup.is_watertight());
    assert_eq!(soup.island_count(), 1);

    // Cleanup is idempotent.
    assert_eq!(soup.remove_degenerates().unwrap(), 0);
    assert_eq!(soup.delete_degenerates().unwrap(), 0);
}

#[test]
fn rounded_matching_welds_jittered_tetra() {
    let jitter = 3e-8;
    let mut positions = tetra_soup([0.0, 0.0, 0.0], 1.0);
    for (i, value) in positions.iter_mut().enumerate() {
        if i % 5 == 0 {
            *value += jitter;
        }
    }
    let mut soup = Soup::<()>::from_buffers(positions, None, None).unwrap();

    let err = soup
        .find_neighbors(VertexMatching::Exact, ResolveMode::Strict)
        .unwrap_err();
    assert!(matches!(err, SoupError::NonManifold { .. }));

    let summary = soup
        .find_neighbors(VertexMatching::Rounded, ResolveMode::Strict)
        .unwrap();
    assert_eq!(summary.resolved, 6);
    assert!(soup.is_watertight());
}
