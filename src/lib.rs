//! Connectivity reconstruction and plane chopping for **triangle soups**:
//! flat buffers of nine scalars per face with no index sharing, the format
//! renderers and STL files actually hand around.
//!
//! A [`Soup`](soup::Soup) derives its own edge-to-edge topology with
//! [`find_neighbors`](soup::Soup::find_neighbors), grouping faces into
//! islands as it pairs edges, and every later operation keeps that topology
//! alive incrementally: plane splitting, chopping into two sealed halves,
//! hole repair, degenerate removal, coplanar face merging and local
//! retriangulation.
//!
//! # Features
//! #### Default
//! - **f64**: use f64 as Real
//! - [**stl-io**](https://en.wikipedia.org/wiki/STL_(file_format)): `.stl` import/export
//!
//! #### Optional
//! - **f32**: use f32 as Real, this conflicts with f64

#![forbid(unsafe_code)]
#![deny(unused)]
#![warn(clippy::missing_const_for_fn, clippy::approx_constant, clippy::all)]

pub mod errors;
pub mod float_types;
pub mod io;
pub mod soup;

#[cfg(any(all(feature = "f64", feature = "f32"), not(any(feature = "f64", feature = "f32"))))]
compile_error!("Either 'f64' or 'f32' feature must be specified, but not both");

pub use errors::{SoupError, SoupResult};
pub use soup::{Plane, ResolveMode, Soup, VertexMatching};
