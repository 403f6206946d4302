use bytemuck::{Pod, Zeroable};
use float_cmp::ApproxEqUlps;
use meshopt::DecodePosition;

#[derive(Default, Debug, Copy, Clone, PartialOrd, Pod, Zeroable)]
#[repr(C)]
/// A basic interleaved vertex type that can be used with the build pipeline.
/// You don't _need_ to use this type; any `#[repr(C)]` record implementing
/// `bytemuck::Pod` and `DecodePosition` works, as the pipeline treats a
/// vertex as an opaque byte block of known stride.
pub struct Vertex {
    pub p: [f32; 3],
    pub n: [f32; 3],
    pub t: [f32; 2],
}

impl PartialEq for Vertex {
    fn eq(&self, other: &Vertex) -> bool {
        self.p[0].approx_eq_ulps(&other.p[0], 2)
            && self.p[1].approx_eq_ulps(&other.p[1], 2)
            && self.p[2].approx_eq_ulps(&other.p[2], 2)
            && self.n[0].approx_eq_ulps(&other.n[0], 2)
            && self.n[1].approx_eq_ulps(&other.n[1], 2)
            && self.n[2].approx_eq_ulps(&other.n[2], 2)
            && self.t[0].approx_eq_ulps(&other.t[0], 2)
            && self.t[1].approx_eq_ulps(&other.t[1], 2)
    }
}

impl Eq for Vertex {}

impl DecodePosition for Vertex {
    fn decode_position(&self) -> [f32; 3] {
        self.p
    }
}
