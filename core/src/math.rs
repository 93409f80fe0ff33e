//! Math type aliases and helper functions.

pub use nalgebra;

/// 3D vector (f32). Used for vertex positions, normals, colors and object
/// placement.
pub type Vec3 = nalgebra::Vector3<f32>;

/// Wraps an orientation given in degrees into `[0, 360)` per axis.
pub fn wrap_degrees(dir: Vec3) -> Vec3 {
    dir.map(|angle| angle.rem_euclid(360.0))
}

/// Arithmetic mean of a set of points, or the origin for an empty set.
pub fn centroid<'a>(points: impl IntoIterator<Item = &'a Vec3>) -> Vec3 {
    let mut sum = Vec3::zeros();
    let mut count = 0usize;
    for p in points {
        sum += p;
        count += 1;
    }
    if count == 0 {
        return Vec3::zeros();
    }
    sum / count as f32
}
