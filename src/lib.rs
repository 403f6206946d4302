//! Meshlet building and per-cluster culling data for GPU-driven cluster
//! rendering.
//!
//! The pipeline partitions an indexed triangle mesh into small bounded
//! clusters, computes a bounding sphere and a quantized visibility cone per
//! cluster, and emits compact flat buffers ready for GPU upload: cluster
//! descriptors, packed per-cluster triangles, a local-to-global vertex
//! mapping, and the deduplicated/reordered vertex array they all refer to.
//!
//! ```no_run
//! use meshlets::{BuildFlags, BuildSettings, MeshletBuilder};
//!
//! # fn main() -> meshlets::Result<()> {
//! let indices: Vec<u32> = vec![0, 1, 2];
//! let vertices: Vec<[f32; 3]> = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
//!
//! let context = MeshletBuilder::new(indices, vertices)
//!     .with_settings(BuildSettings {
//!         flags: BuildFlags::Fuse | BuildFlags::OptimizeClusters,
//!         ..Default::default()
//!     })
//!     .build()?;
//!
//! let packed_triangles: usize = context.iter().map(|c| c.triangles.len()).sum();
//! # Ok(())
//! # }
//! ```

mod bounds;
mod builder;
mod clusterize;
mod error;
mod fuse;
mod remap;
mod vertex;

pub use crate::bounds::{
    cluster_bounding_sphere, cluster_normal_cone, compute_cluster_bounds, pack_cone, unpack_cone,
    BoundsData, NormalCone,
};
pub use crate::builder::{BuildFlags, BuildSettings, ClusterView, MeshletBuilder, MeshletsContext};
pub use crate::clusterize::Meshlet;
pub use crate::error::{Error, Result};
pub use crate::fuse::fuse_vertices;
pub use crate::remap::optimize_vertex_order;
pub use crate::vertex::Vertex;

pub use meshopt::DecodePosition;
