use bytemuck::Pod;

/// Rebuilds the mesh around a minimal unique-vertex array and reorders it for
/// GPU consumption. The steps run in a fixed sequence, each feeding the next:
///
/// 1. derive a deduplication remap table over the current vertex array,
/// 2. rewrite the index buffer through the remap,
/// 3. build the reduced vertex array through the remap,
/// 4. reorder indices for transform-cache reuse,
/// 5. reorder vertices (and patch indices) for sequential-fetch locality.
///
/// All five algorithms are delegated; this function owns only the sequencing
/// and the buffer lifetimes. The input buffers are replaced wholesale.
pub fn optimize_vertex_order<V: Pod + Default>(indices: &mut Vec<u32>, vertices: &mut Vec<V>) {
    let (unique_count, remap) = meshopt::generate_vertex_remap(vertices, Some(indices.as_slice()));

    let mut new_indices =
        meshopt::remap_index_buffer(Some(indices.as_slice()), indices.len(), &remap);
    let mut new_vertices = meshopt::remap_vertex_buffer(vertices, unique_count, &remap);

    meshopt::optimize_vertex_cache_in_place(&mut new_indices, new_vertices.len());

    let fetched = meshopt::optimize_vertex_fetch_in_place(&mut new_indices, &mut new_vertices);
    new_vertices.truncate(fetched);

    log::debug!(
        "vertex order optimization: {} -> {} vertices",
        vertices.len(),
        new_vertices.len()
    );

    *indices = new_indices;
    *vertices = new_vertices;
}
