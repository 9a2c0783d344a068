// main.rs
//
// Walks through the main operations of soupchop on a few hand-built scenes
// (which is generic over the shared-data type S). Here, we do not use any
// shared data, so we'll bind the generic S to ().

use std::fs;

use nalgebra::Vector3;
use soupchop::float_types::{PI, Real};
use soupchop::soup::normals_within;
use soupchop::{Plane, ResolveMode, VertexMatching};

// A type alias for convenience: no shared data, i.e. S = ()
type Soup = soupchop::Soup<()>;

/// Axis-aligned cube `[0, s]^3` as twelve outward-wound triangles.
fn cube_soup(s: Real) -> Vec<Real> {
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

/// Regular-cornered tetrahedron with its right angle at `origin`.
fn tetra_soup(origin: [Real; 3], s: Real) -> Vec<Real> {
    let [x, y, z] = origin;
    vec![
        x, y, z, x, y + s, z, x + s, y, z, //
        x, y, z, x + s, y, z, x, y, z + s, //
        x, y, z, x, y, z + s, x, y + s, z, //
        x + s, y, z, x, y + s, z, x, y, z + s, //
    ]
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Ensure the /stl folder exists
    let _ = fs::create_dir_all("stl");

    // 1) A watertight cube, topologized strictly.
    let mut cube = Soup::from_buffers(cube_soup(2.0), None, None)?;
    let summary = cube.find_neighbors(VertexMatching::Exact, ResolveMode::Strict)?;
    println!(
        "cube: {} edge pairs, {} islands, watertight: {}",
        summary.resolved,
        summary.islands,
        cube.is_watertight()
    );
    let _ = fs::write("stl/cube.stl", cube.to_stl_ascii("cube"));

    // 2) chop() against a slanted plane: two independent sealed halves.
    let plane = Plane::from_normal(Vector3::new(1.0, 0.0, 1.0), 2.0);
    let (front, back) = cube.chop(&plane)?;
    println!(
        "chop: front {} faces, back {} faces, both watertight: {}",
        front.face_count(),
        back.face_count(),
        front.is_watertight() && back.is_watertight()
    );
    let _ = fs::write("stl/cube_front.stl", front.to_stl_ascii("cube_front"));
    let _ = fs::write("stl/cube_back.stl", back.to_stl_ascii("cube_back"));

    // 3) merge_faces() undoes the split fragments the cut left behind.
    let mut merged = front.clone();
    let collapsed = merged.merge_faces(normals_within(PI / 180.0))?;
    println!(
        "merge: collapsed {collapsed} vertices, {} faces remain",
        merged.face_count()
    );
    let _ = fs::write("stl/cube_front_merged.stl", merged.to_stl_ascii("cube_front_merged"));

    // 4) One soup holding two separate solids; isolate() pulls them apart.
    let mut scene = cube_soup(1.0);
    scene.extend(tetra_soup([3.0, 0.0, 0.0], 1.5));
    let mut scene = Soup::from_buffers(scene, None, None)?;
    scene.find_neighbors(VertexMatching::Exact, ResolveMode::Strict)?;
    for (i, island) in scene.isolate()?.iter().enumerate() {
        println!("island {i}: {} faces", island.face_count());
        let _ = fs::write(
            format!("stl/island_{i}.stl"),
            island.to_stl_ascii(&format!("island_{i}")),
        );
    }

    // 5) A box with its lid removed: permissive resolution keeps the rim
    //    open, fix_holes() seals it again.
    let mut open = cube_soup(2.0);
    open.drain(18..36);
    let mut open = Soup::from_buffers(open, None, None)?;
    let summary = open.find_neighbors(VertexMatching::Exact, ResolveMode::Permissive)?;
    let sealed = open.fix_holes()?;
    println!(
        "open box: {} open edges, sealed {sealed} faces in, watertight: {}",
        summary.open,
        open.is_watertight()
    );
    let _ = fs::write("stl/box_resealed.stl", open.to_stl_ascii("box_resealed"));

    // 6) Binary STL round trip through the io layer.
    let bytes = cube.to_stl_binary("cube")?;
    let reread = Soup::from_stl(&bytes, None)?;
    println!("stl round trip: {} faces back", reread.face_count());
    let _ = fs::write("stl/cube_roundtrip.stl", reread.to_stl_ascii("cube_roundtrip"));

    // Done!
    println!("All scenes have been created and written to the 'stl' folder.");
    Ok(())
}
