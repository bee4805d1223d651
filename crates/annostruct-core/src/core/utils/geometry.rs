use nalgebra::{Point3, Vector3};

/// Arithmetic mean of a set of points, `None` for an empty set.
pub fn centroid(points: &[Point3<f64>]) -> Option<Point3<f64>> {
    if points.is_empty() {
        return None;
    }
    let sum: Vector3<f64> = points.iter().map(|p| p.coords).sum();
    Some(Point3::from(sum / points.len() as f64))
}

/// Whether `point` lies strictly closer than `cutoff` to `center`.
///
/// Compares squared distances, so no square root is taken per candidate.
pub fn is_within_distance(point: &Point3<f64>, center: &Point3<f64>, cutoff: f64) -> bool {
    (point - center).norm_squared() < cutoff * cutoff
}
