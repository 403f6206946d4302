use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::Hasher;

use bytemuck::Pod;

/// Merges vertices with byte-identical attribute content and rewrites the
/// index buffer consistently.
///
/// The 64-bit content hash is a bucket key only: candidates landing in the
/// same bucket are confirmed with a full byte comparison, so two vertices
/// differing in any attribute byte are never merged. The final vertex order
/// is the order of first appearance in the index buffer; vertices never
/// referenced by an index are dropped.
///
/// Every index must be a valid position in `vertices`.
pub fn fuse_vertices<V: Pod>(indices: &[u32], vertices: &[V]) -> (Vec<u32>, Vec<V>) {
    let mut buckets: HashMap<u64, Vec<u32>> = HashMap::with_capacity(vertices.len());
    let mut fused: Vec<V> = Vec::with_capacity(vertices.len());
    let mut resolved: Vec<Option<u32>> = vec![None; vertices.len()];
    let mut new_indices = Vec::with_capacity(indices.len());

    for &index in indices {
        let slot = &mut resolved[index as usize];
        let new_index = match *slot {
            Some(id) => id,
            None => {
                let vertex = &vertices[index as usize];
                let bytes = bytemuck::bytes_of(vertex);
                let mut hasher = DefaultHasher::new();
                hasher.write(bytes);
                let bucket = buckets.entry(hasher.finish()).or_default();

                let id = match bucket
                    .iter()
                    .copied()
                    .find(|&id| bytemuck::bytes_of(&fused[id as usize]) == bytes)
                {
                    Some(id) => id,
                    None => {
                        let id = fused.len() as u32;
                        fused.push(*vertex);
                        bucket.push(id);
                        id
                    }
                };
                *slot = Some(id);
                id
            }
        };
        new_indices.push(new_index);
    }

    log::debug!("fused {} vertices down to {}", vertices.len(), fused.len());

    (new_indices, fused)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vertices_collapse() {
        let vertices: Vec<[f32; 3]> = vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
        ];
        let indices = [0u32, 1, 3, 2, 3, 1];
        let (new_indices, fused) = fuse_vertices(&indices, &vertices);
        assert_eq!(fused.len(), 3);
        assert_eq!(new_indices, vec![0, 1, 2, 0, 2, 1]);
    }

    #[test]
    fn byte_difference_is_preserved() {
        // differ only in the sign bit of -0.0
        let vertices: Vec<[f32; 3]> = vec![[0.0, 0.0, 0.0], [-0.0, 0.0, 0.0], [1.0, 0.0, 0.0]];
        let indices = [0u32, 1, 2];
        let (new_indices, fused) = fuse_vertices(&indices, &vertices);
        assert_eq!(fused.len(), 3);
        assert_eq!(new_indices, vec![0, 1, 2]);
    }

    #[test]
    fn unreferenced_vertices_are_dropped() {
        let vertices: Vec<[f32; 3]> = vec![[0.0; 3], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]];
        let indices = [1u32, 1, 1];
        let (new_indices, fused) = fuse_vertices(&indices, &vertices);
        assert_eq!(fused.len(), 1);
        assert_eq!(fused[0], [1.0, 0.0, 0.0]);
        assert_eq!(new_indices, vec![0, 0, 0]);
    }
}
