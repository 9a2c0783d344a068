use crate::float_types::Real;
use crate::io::IoError;
use crate::soup::Soup;
use std::fmt::Debug;
use std::io::Cursor;

/// Whether a face still takes part in output. Deleted faces only exist once
/// topology has been built; a bare soup has no deletions.
fn face_live<S: Clone + Send + Sync + Debug>(soup: &Soup<S>, face: usize) -> bool {
    soup.islands().get(face).is_none_or(|root| root.is_some())
}

/// Export to ASCII STL
/// Convert this soup to an **ASCII STL** string with the given `name`.
///
/// Every live face is written as one facet with its own flat normal, so the
/// output never shares vertices between facets.
///
/// ```rust
/// # use soupchop::soup::Soup;
/// # use std::error::Error;
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let soup = Soup::<()>::from_buffers(
///     vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
///     None,
///     None,
/// )?;
/// let text = soup.to_stl_ascii("my_solid");
/// assert!(text.starts_with("solid my_solid"));
/// # Ok(())
/// # }
/// ```
pub fn to_stl_ascii<S: Clone + Send + Sync + Debug>(soup: &Soup<S>, name: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!("solid {name}\n"));

    for face in 0..soup.face_count() {
        if !face_live(soup, face) {
            continue;
        }
        let n = soup.face_normal(face);
        out.push_str(&format!("  facet normal {:.6} {:.6} {:.6}\n", n.x, n.y, n.z));
        out.push_str("    outer loop\n");
        for p in soup.face_points(face) {
            out.push_str(&format!("      vertex {:.6} {:.6} {:.6}\n", p.x, p.y, p.z));
        }
        out.push_str("    endloop\n");
        out.push_str("  endfacet\n");
    }

    out.push_str(&format!("endsolid {name}\n"));
    out
}

/// Export to BINARY STL (returns `Vec<u8>`)
///
/// Convert this soup to a **binary STL** byte vector. The resulting
/// `Vec<u8>` can then be written to a file or handled in memory:
///
/// ```rust
/// # use soupchop::soup::Soup;
/// # use std::error::Error;
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let soup = Soup::<()>::from_buffers(
///     vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
///     None,
///     None,
/// )?;
/// let bytes = soup.to_stl_binary("my_solid")?;
/// // 80 byte header, then the little-endian facet count.
/// assert_eq!(&bytes[80..84], &1u32.to_le_bytes());
/// # Ok(())
/// # }
/// ```
pub fn to_stl_binary<S: Clone + Send + Sync + Debug>(
    soup: &Soup<S>,
    _name: &str,
) -> std::io::Result<Vec<u8>> {
    use stl_io::{Normal, Triangle, Vertex, write_stl};

    let mut triangles = Vec::<Triangle>::new();

    for face in 0..soup.face_count() {
        if !face_live(soup, face) {
            continue;
        }
        let n = soup.face_normal(face);
        #[allow(clippy::unnecessary_cast)]
        {
            triangles.push(Triangle {
                normal: Normal::new([n.x as f32, n.y as f32, n.z as f32]),
                vertices: soup
                    .face_points(face)
                    .map(|p| Vertex::new([p.x as f32, p.y as f32, p.z as f32])),
            });
        }
    }

    let mut cursor = Cursor::new(Vec::new());
    write_stl(&mut cursor, triangles.iter())?;
    Ok(cursor.into_inner())
}

/// Import from STL (ASCII or binary)
///
/// `stl_io` hands back an indexed mesh; the indices are flattened away here
/// so the result is a plain soup, nine scalars per face. Connectivity is
/// not derived, call [`Soup::find_neighbors`] on the result when you need
/// it.
///
/// ```rust
/// # use soupchop::soup::Soup;
/// # use std::error::Error;
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let soup = Soup::<()>::from_buffers(
///     vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
///     None,
///     None,
/// )?;
/// let bytes = soup.to_stl_binary("tri")?;
/// let back = Soup::<()>::from_stl(&bytes, None)?;
/// assert_eq!(back.face_count(), 1);
/// # Ok(())
/// # }
/// ```
pub fn from_stl<S: Clone + Send + Sync + Debug>(
    bytes: &[u8],
    metadata: Option<S>,
) -> Result<Soup<S>, IoError> {
    let mut cursor = Cursor::new(bytes);
    let indexed = stl_io::read_stl(&mut cursor)?;

    let mut positions = Vec::with_capacity(indexed.faces.len() * 9);
    #[allow(clippy::unnecessary_cast)]
    for tri in &indexed.faces {
        for &vi in &tri.vertices {
            let v = indexed.vertices[vi];
            positions.extend_from_slice(&[v[0] as Real, v[1] as Real, v[2] as Real]);
        }
    }

    Ok(Soup::from_buffers(positions, None, metadata)?)
}

impl<S: Clone + Send + Sync + Debug> Soup<S> {
    pub fn to_stl_ascii(&self, name: &str) -> String {
        self::to_stl_ascii(self, name)
    }
    pub fn to_stl_binary(&self, name: &str) -> std::io::Result<Vec<u8>> {
        self::to_stl_binary(self, name)
    }
    pub fn from_stl(bytes: &[u8], metadata: Option<S>) -> Result<Soup<S>, IoError> {
        self::from_stl(bytes, metadata)
    }
}
