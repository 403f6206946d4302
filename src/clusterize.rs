use bytemuck::{Pod, Zeroable};
use meshopt::ffi;

use crate::builder::BuildSettings;
use crate::error::{Error, Result};

/// Descriptor for a single cluster. Offsets index the shared flat buffers of
/// the owning context: `vertex_offset` into the local-vertex mapping,
/// `triangle_offset` into the packed triangle buffer (in packed-triangle
/// units, not bytes).
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct Meshlet {
    pub vertex_offset: u32,
    pub triangle_offset: u32,
    pub vertex_count: u32,
    pub triangle_count: u32,
}

/// Untrimmed partitioner output: descriptors plus the shared local-vertex and
/// local-triangle-corner scratch buffers, still in the collaborator's layout
/// (3 corner bytes per triangle, 4-byte aligned per cluster).
pub(crate) struct RawClusters {
    pub descriptors: Vec<ffi::meshopt_Meshlet>,
    pub vertices: Vec<u32>,
    pub triangles: Vec<u8>,
}

/// Splits the mesh into clusters where each cluster has a micro index buffer
/// referencing a small window of the original vertex buffer.
///
/// Scratch buffers are pre-sized from the partitioner's own upper-bound
/// estimate, the partitioner runs exactly once, and all three buffers are
/// then trimmed to the sizes implied by the last descriptor; data beyond that
/// boundary is undefined and must never be read.
pub(crate) fn partition(
    indices: &[u32],
    positions: &[[f32; 3]],
    settings: &BuildSettings,
) -> Result<RawClusters> {
    let max_clusters = unsafe {
        ffi::meshopt_buildMeshletsBound(indices.len(), settings.max_vertices, settings.max_triangles)
    };
    let mut descriptors: Vec<ffi::meshopt_Meshlet> =
        vec![unsafe { ::std::mem::zeroed() }; max_clusters];

    let mut cluster_verts: Vec<u32> = vec![0; max_clusters * settings.max_vertices];
    let mut cluster_tris: Vec<u8> = vec![0; max_clusters * settings.max_triangles * 3];

    let count = unsafe {
        ffi::meshopt_buildMeshlets(
            descriptors.as_mut_ptr(),
            cluster_verts.as_mut_ptr(),
            cluster_tris.as_mut_ptr(),
            indices.as_ptr(),
            indices.len(),
            positions.as_ptr().cast(),
            positions.len(),
            ::std::mem::size_of::<[f32; 3]>(),
            settings.max_vertices,
            settings.max_triangles,
            settings.cone_weight,
        )
    };

    if count == 0 {
        return Err(Error::Partition(format!(
            "partitioner returned zero clusters for {} triangles",
            indices.len() / 3
        )));
    }

    descriptors.truncate(count);
    for descriptor in &descriptors {
        if descriptor.vertex_count as usize > settings.max_vertices
            || descriptor.triangle_count as usize > settings.max_triangles
        {
            return Err(Error::Partition(format!(
                "cluster exceeds configured limits: {} vertices (max {}), {} triangles (max {})",
                descriptor.vertex_count,
                settings.max_vertices,
                descriptor.triangle_count,
                settings.max_triangles
            )));
        }
    }

    let last = descriptors[count - 1];
    cluster_verts.truncate(last.vertex_offset as usize + last.vertex_count as usize);
    cluster_tris
        .truncate(last.triangle_offset as usize + ((last.triangle_count as usize * 3 + 3) & !3));

    log::debug!("partitioned {} triangles into {} clusters", indices.len() / 3, count);

    Ok(RawClusters {
        descriptors,
        vertices: cluster_verts,
        triangles: cluster_tris,
    })
}

/// Reorders each cluster's local vertex and triangle data for better
/// intra-cluster locality. Operates strictly within each cluster's own slice
/// of the shared buffers; data never moves across cluster boundaries.
pub(crate) fn optimize_clusters(raw: &mut RawClusters) {
    for i in 0..raw.descriptors.len() {
        let descriptor = raw.descriptors[i];
        unsafe {
            ffi::meshopt_optimizeMeshlet(
                &mut raw.vertices[descriptor.vertex_offset as usize],
                &mut raw.triangles[descriptor.triangle_offset as usize],
                descriptor.triangle_count as usize,
                descriptor.vertex_count as usize,
            );
        }
    }
}

/// Repacks every triangle's three 8-bit corner indices into one 32-bit word
/// (corner 0 in bits 0..8, corner 1 in bits 8..16, corner 2 in bits 16..24,
/// the top byte zero) and rewrites each descriptor's `triangle_offset` to
/// point into the packed buffer.
pub(crate) fn pack_triangles(raw: &RawClusters) -> (Vec<Meshlet>, Vec<u32>) {
    let mut meshlets = Vec::with_capacity(raw.descriptors.len());
    let mut packed = Vec::with_capacity(raw.triangles.len() / 3);

    for descriptor in &raw.descriptors {
        let triangle_offset = packed.len() as u32;

        for i in 0..descriptor.triangle_count as usize {
            let base = descriptor.triangle_offset as usize + 3 * i;
            let c0 = raw.triangles[base] as u32;
            let c1 = raw.triangles[base + 1] as u32;
            let c2 = raw.triangles[base + 2] as u32;
            packed.push(c0 | (c1 << 8) | (c2 << 16));
        }

        meshlets.push(Meshlet {
            vertex_offset: descriptor.vertex_offset,
            triangle_offset,
            vertex_count: descriptor.vertex_count,
            triangle_count: descriptor.triangle_count,
        });
    }

    (meshlets, packed)
}
