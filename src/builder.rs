use bitflags::bitflags;
use bytemuck::Pod;
use meshopt::DecodePosition;

use crate::bounds::{self, BoundsData};
use crate::clusterize::{self, Meshlet};
use crate::error::{Error, Result};
use crate::fuse;
use crate::remap;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct BuildFlags : u32 {
        const None = 0;
        /// Merge byte-identical vertices before clustering. Cheap exact
        /// deduplication; removes duplicates introduced by unindexed
        /// authoring without touching vertex content.
        const Fuse = 1;
        /// Rebuild a minimal unique-vertex array and reorder indices and
        /// vertices for transform-cache and fetch locality. More thorough
        /// than `Fuse` and changes the caller-visible vertex order.
        const Remap = 2;
        /// Reorder each cluster's local vertex/triangle data for
        /// intra-cluster locality before triangle packing.
        const OptimizeClusters = 4;
    }
}

/// Configuration for a meshlet build; the sole source of variation between
/// pipelines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildSettings {
    pub flags: BuildFlags,
    /// Maximum vertices referenced by one cluster. At most 255, since local
    /// corner indices are stored in 8-bit lanes.
    pub max_vertices: usize,
    /// Maximum triangles in one cluster. At most 255 for the same reason,
    /// and divisible by 4 as the partitioner requires.
    pub max_triangles: usize,
    /// Biases clustering toward directional coherence. 0.0 disables the
    /// bias; values up to 1.0 trade cluster size for cone-culling
    /// efficiency.
    pub cone_weight: f32,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            flags: BuildFlags::OptimizeClusters,
            max_vertices: 64,
            max_triangles: 124,
            cone_weight: 0.25,
        }
    }
}

/// Aggregate output of a build: cluster descriptors, packed per-cluster
/// triangles, the flat local-to-global vertex mapping, per-cluster culling
/// data, and the final vertex array all of it refers to.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshletsContext<V> {
    pub meshlets: Vec<Meshlet>,
    /// One packed 32-bit entry per cluster-local triangle.
    pub triangles: Vec<u32>,
    /// Flat buffer mapping cluster-local vertex slots to indices into
    /// `opt_vertices`.
    pub vertices: Vec<u32>,
    /// Parallel-indexed with `meshlets`.
    pub bounds: Vec<BoundsData>,
    /// The deduplicated/reordered vertex array the build settled on.
    pub opt_vertices: Vec<V>,
}

/// Borrowed view of a single cluster's slices within a context.
#[derive(Copy, Clone)]
pub struct ClusterView<'data> {
    pub meshlet: Meshlet,
    pub bounds: &'data BoundsData,
    pub vertices: &'data [u32],
    pub triangles: &'data [u32],
}

impl<V> MeshletsContext<V> {
    #[inline]
    pub fn len(&self) -> usize {
        self.meshlets.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.meshlets.is_empty()
    }

    fn cluster_view(&self, idx: usize) -> ClusterView<'_> {
        let meshlet = self.meshlets[idx];
        ClusterView {
            meshlet,
            bounds: &self.bounds[idx],
            vertices: &self.vertices
                [meshlet.vertex_offset as usize..][..meshlet.vertex_count as usize],
            triangles: &self.triangles
                [meshlet.triangle_offset as usize..][..meshlet.triangle_count as usize],
        }
    }

    #[inline]
    pub fn get(&self, idx: usize) -> ClusterView<'_> {
        self.cluster_view(idx)
    }

    pub fn iter(&self) -> impl Iterator<Item = ClusterView<'_>> {
        (0..self.meshlets.len()).map(|idx| self.cluster_view(idx))
    }

    /// Copies the descriptor array into a pre-sized destination. Returns the
    /// element count written, or [`Error::Capacity`] without writing anything
    /// when the destination is too small.
    pub fn copy_meshlets_into(&self, dst: &mut [Meshlet]) -> Result<usize> {
        copy_into(&self.meshlets, dst)
    }

    /// Copies the packed triangle buffer out; same contract as
    /// [`Self::copy_meshlets_into`].
    pub fn copy_triangles_into(&self, dst: &mut [u32]) -> Result<usize> {
        copy_into(&self.triangles, dst)
    }

    /// Copies the local-to-global vertex mapping out; same contract as
    /// [`Self::copy_meshlets_into`].
    pub fn copy_vertices_into(&self, dst: &mut [u32]) -> Result<usize> {
        copy_into(&self.vertices, dst)
    }

    /// Copies the per-cluster culling data out; same contract as
    /// [`Self::copy_meshlets_into`].
    pub fn copy_bounds_into(&self, dst: &mut [BoundsData]) -> Result<usize> {
        copy_into(&self.bounds, dst)
    }
}

fn copy_into<T: Copy>(src: &[T], dst: &mut [T]) -> Result<usize> {
    if dst.len() < src.len() {
        return Err(Error::Capacity {
            needed: src.len(),
            capacity: dst.len(),
        });
    }
    dst[..src.len()].copy_from_slice(src);
    Ok(src.len())
}

/// Builds a [`MeshletsContext`] from an indexed triangle mesh.
///
/// The builder consumes its buffers; each enabled stage replaces them
/// wholesale, and the final buffers transfer into the returned context. A
/// build is a pure function of (indices, vertices, settings): identical
/// input produces a byte-identical context.
pub struct MeshletBuilder<V> {
    indices: Vec<u32>,
    vertices: Vec<V>,
    settings: BuildSettings,
}

impl<V: Pod + Default + DecodePosition> MeshletBuilder<V> {
    pub fn new(indices: Vec<u32>, vertices: Vec<V>) -> Self {
        Self {
            indices,
            vertices,
            settings: BuildSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: BuildSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn build(self) -> Result<MeshletsContext<V>> {
        let MeshletBuilder {
            mut indices,
            mut vertices,
            settings,
        } = self;

        validate(&indices, &vertices, &settings)?;

        #[cfg(debug_assertions)]
        let original_triangle_count = indices.len() / 3;

        if settings.flags.contains(BuildFlags::Fuse) {
            let (fused_indices, fused_vertices) = fuse::fuse_vertices(&indices, &vertices);
            indices = fused_indices;
            vertices = fused_vertices;
        }

        if settings.flags.contains(BuildFlags::Remap) {
            remap::optimize_vertex_order(&mut indices, &mut vertices);
        }

        let positions = vertices
            .iter()
            .map(|vertex| vertex.decode_position())
            .collect::<Vec<[f32; 3]>>();

        let mut raw = clusterize::partition(&indices, &positions, &settings)?;

        if settings.flags.contains(BuildFlags::OptimizeClusters) {
            clusterize::optimize_clusters(&mut raw);
        }

        let (meshlets, triangles) = clusterize::pack_triangles(&raw);

        let cluster_bounds = meshlets
            .iter()
            .map(|meshlet| {
                bounds::compute_cluster_bounds(
                    &raw.vertices[meshlet.vertex_offset as usize..]
                        [..meshlet.vertex_count as usize],
                    &triangles[meshlet.triangle_offset as usize..]
                        [..meshlet.triangle_count as usize],
                    &positions,
                )
            })
            .collect::<Vec<_>>();

        let degenerate = cluster_bounds
            .iter()
            .filter(|bounds| bounds.normal_cone >> 24 == 0xff)
            .count();
        log::debug!(
            "computed bounds for {} clusters ({} degenerate cones)",
            cluster_bounds.len(),
            degenerate
        );

        let context = MeshletsContext {
            meshlets,
            triangles,
            vertices: raw.vertices,
            bounds: cluster_bounds,
            opt_vertices: vertices,
        };

        #[cfg(debug_assertions)]
        debug_validate(&context, original_triangle_count);

        Ok(context)
    }
}

fn validate<V>(indices: &[u32], vertices: &[V], settings: &BuildSettings) -> Result<()> {
    if indices.is_empty() {
        return Err(Error::invalid_input("index buffer is empty"));
    }
    if indices.len() % 3 != 0 {
        return Err(Error::invalid_input_dynamic(format!(
            "index count {} is not a multiple of 3",
            indices.len()
        )));
    }
    if vertices.is_empty() {
        return Err(Error::invalid_input("vertex buffer is empty"));
    }
    if let Some(&index) = indices.iter().find(|&&index| index as usize >= vertices.len()) {
        return Err(Error::invalid_input_dynamic(format!(
            "index {} out of range for {} vertices",
            index,
            vertices.len()
        )));
    }
    if !(3..=255).contains(&settings.max_vertices) {
        return Err(Error::invalid_input("max_vertices must be within 3..=255"));
    }
    if settings.max_triangles == 0
        || settings.max_triangles > 255
        || settings.max_triangles % 4 != 0
    {
        return Err(Error::invalid_input(
            "max_triangles must be within 4..=252 and divisible by 4",
        ));
    }
    if !(0.0..=1.0).contains(&settings.cone_weight) {
        return Err(Error::invalid_input("cone_weight must be within 0.0..=1.0"));
    }
    Ok(())
}

// Invariant re-check on debug builds only; user-reachable failures are
// reported through `Error` well before this runs.
#[cfg(debug_assertions)]
fn debug_validate<V>(context: &MeshletsContext<V>, original_triangle_count: usize) {
    assert_eq!(context.meshlets.len(), context.bounds.len());

    let total: usize = context
        .meshlets
        .iter()
        .map(|meshlet| meshlet.triangle_count as usize)
        .sum();
    assert_eq!(total, original_triangle_count);

    for cluster in context.iter() {
        for &global in cluster.vertices {
            assert!((global as usize) < context.opt_vertices.len());
        }
        for &packed in cluster.triangles {
            assert_eq!(packed >> 24, 0);
            for lane in 0..3 {
                assert!(((packed >> (lane * 8)) & 0xff) < cluster.meshlet.vertex_count);
            }
        }
    }
}
