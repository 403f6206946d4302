use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// A triangle normal deviating from the cone axis by more than this (as a
/// dot product) makes the whole cluster's cone unusable for culling.
const DEGENERATE_CONE_DOT: f32 = 0.1;

/// Culling data for one cluster, parallel-indexed with the descriptor array.
///
/// For backface culling with orthographic projection, reject a cluster when
///   `dot(view, cone_axis) >= cone_cutoff`
///
/// For perspective projection, use the cone apex, reconstructed from the
/// sphere center and `apex_offset`:
///   `dot(normalize(cone_apex - camera_position), cone_axis) >= cone_cutoff`
///
/// A packed cutoff of 255 marks a cluster the cone test must never reject.
#[derive(Debug, Default, Copy, Clone, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct BoundsData {
    /// Bounding sphere, center xyz in the first three lanes, radius in w.
    pub sphere: [f32; 4],
    /// Quantized cone axis and cutoff, see [`pack_cone`].
    pub normal_cone: u32,
    /// Signed distance from the sphere center to the cone apex along the
    /// cone axis.
    pub apex_offset: f32,
}

/// Directional cone of a cluster's face normals, before quantization.
#[derive(Debug, Copy, Clone)]
pub struct NormalCone {
    pub axis: Vec3,
    /// Cosine of the half-angle covering every face normal.
    pub cutoff: f32,
    pub apex: Vec3,
    /// True when some face normal diverges too far from the axis (or no
    /// usable normal exists); a degenerate cone must never cull.
    pub degenerate: bool,
}

/// Bounding sphere derived from the axis-aligned extents of the referenced
/// positions: center is the box midpoint, radius the distance from the
/// center to the farthest box corner. A deliberate approximation, not a
/// minimal enclosing sphere.
pub fn cluster_bounding_sphere(vertices: &[u32], positions: &[[f32; 3]]) -> (Vec3, f32) {
    let mut min = Vec3::splat(f32::INFINITY);
    let mut max = Vec3::splat(f32::NEG_INFINITY);
    for &vertex in vertices {
        let p = Vec3::from(positions[vertex as usize]);
        min = min.min(p);
        max = max.max(p);
    }
    let center = (min + max) * 0.5;
    (center, (max - center).length())
}

/// Accumulates the normal cone of a cluster from its packed triangle corners.
///
/// The axis is the normalized sum of unit face normals; the raw cutoff is
/// the smallest dot product between any face normal and the axis.
/// Zero-area triangles contribute no normal. The apex is placed on the axis
/// line behind every triangle plane, so a perspective cone test anchored at
/// the apex stays conservative.
pub fn cluster_normal_cone(
    vertices: &[u32],
    triangles: &[u32],
    positions: &[[f32; 3]],
    center: Vec3,
) -> NormalCone {
    let corner = |packed: u32, lane: u32| {
        let local = (packed >> (lane * 8)) & 0xff;
        Vec3::from(positions[vertices[local as usize] as usize])
    };

    // one entry per non-degenerate triangle: first corner and unit normal
    let mut planes = Vec::with_capacity(triangles.len());
    for &packed in triangles {
        let v0 = corner(packed, 0);
        let v1 = corner(packed, 1);
        let v2 = corner(packed, 2);
        let normal = (v1 - v0).cross(v2 - v0);
        let length = normal.length();
        if length > 0.0 {
            planes.push((v0, normal / length));
        }
    }

    let axis = planes
        .iter()
        .fold(Vec3::ZERO, |sum, &(_, normal)| sum + normal)
        .try_normalize();
    let axis = match axis {
        Some(axis) => axis,
        None => {
            // no usable facing direction at all
            return NormalCone {
                axis: Vec3::Z,
                cutoff: 0.0,
                apex: center,
                degenerate: true,
            };
        }
    };

    let cutoff = planes
        .iter()
        .fold(1.0f32, |min_dot, &(_, normal)| min_dot.min(normal.dot(axis)));

    if cutoff < DEGENERATE_CONE_DOT {
        return NormalCone {
            axis,
            cutoff,
            apex: center,
            degenerate: true,
        };
    }

    let mut max_t = 0.0f32;
    for &(p0, normal) in &planes {
        let t = (center - p0).dot(normal) / normal.dot(axis);
        max_t = max_t.max(t);
    }

    NormalCone {
        axis,
        cutoff,
        apex: center - axis * max_t,
        degenerate: false,
    }
}

/// Computes the full culling record for one cluster from its local vertex
/// mapping, its packed triangles and the global position array.
///
/// The packed cutoff is the backface-safe form `-cos(acos(raw) + 90°)`;
/// degenerate clusters force it to 1.0 so the cone test always passes.
pub fn compute_cluster_bounds(
    vertices: &[u32],
    triangles: &[u32],
    positions: &[[f32; 3]],
) -> BoundsData {
    let (center, radius) = cluster_bounding_sphere(vertices, positions);
    let cone = cluster_normal_cone(vertices, triangles, positions, center);

    let cutoff = if cone.degenerate {
        1.0
    } else {
        let angle = cone.cutoff.clamp(-1.0, 1.0).acos();
        -(angle + std::f32::consts::FRAC_PI_2).cos()
    };

    BoundsData {
        sphere: [center.x, center.y, center.z, radius],
        normal_cone: pack_cone(cone.axis, cutoff),
        apex_offset: (center - cone.apex).dot(cone.axis),
    }
}

/// Quantizes a cone axis and cutoff into one 32-bit word. Axis components
/// are remapped from [-1, 1] to [0, 1]; all four channels are then scaled to
/// [0, 255], clamped, and packed one byte each with the cutoff in the top
/// byte. Maximum reconstruction error is one quantization step per channel.
pub fn pack_cone(axis: Vec3, cutoff: f32) -> u32 {
    let axis = (axis + Vec3::ONE) * 0.5;

    let x = (axis.x * 255.0).clamp(0.0, 255.0) as u32;
    let y = (axis.y * 255.0).clamp(0.0, 255.0) as u32;
    let z = (axis.z * 255.0).clamp(0.0, 255.0) as u32;
    let w = (cutoff * 255.0).clamp(0.0, 255.0) as u32;

    x | (y << 8) | (z << 16) | (w << 24)
}

/// Inverse of [`pack_cone`] up to quantization error.
pub fn unpack_cone(packed: u32) -> (Vec3, f32) {
    let channel = |shift: u32| ((packed >> shift) & 0xff) as f32 / 255.0;
    let axis = Vec3::new(channel(0), channel(8), channel(16)) * 2.0 - Vec3::ONE;
    (axis, channel(24))
}
