//! Catmull-Rom curve evaluation over ordered control points
//!
//! Chunk centerlines are Catmull-Rom curves through their control points.
//! Endpoints are clamped (missing neighbors are duplicated), so a two-point
//! list degenerates to the straight segment between them.

use glam::Vec3;

/// A Catmull-Rom curve borrowed over an ordered point list
#[derive(Debug, Clone, Copy)]
pub struct Spline<'a> {
    points: &'a [Vec3],
}

impl<'a> Spline<'a> {
    /// Curves need at least two points; fewer is a caller bug surfaced early.
    pub fn new(points: &'a [Vec3]) -> Option<Self> {
        if points.len() < 2 {
            return None;
        }
        Some(Self { points })
    }

    /// Point on the curve at normalized parameter `t` in [0, 1]
    pub fn point_at(&self, t: f32) -> Vec3 {
        let (p0, p1, p2, p3, s) = self.segment(t);
        let s2 = s * s;
        let s3 = s2 * s;
        0.5 * ((2.0 * p1)
            + (-p0 + p2) * s
            + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * s2
            + (-p0 + 3.0 * p1 - 3.0 * p2 + p3) * s3)
    }

    /// Unit tangent at `t`, falling back to +Z if the curve is degenerate
    pub fn tangent_at(&self, t: f32) -> Vec3 {
        let (p0, p1, p2, p3, s) = self.segment(t);
        let s2 = s * s;
        let d = 0.5
            * ((-p0 + p2)
                + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * (2.0 * s)
                + (-p0 + 3.0 * p1 - 3.0 * p2 + p3) * (3.0 * s2));
        d.try_normalize().unwrap_or(Vec3::Z)
    }

    /// Lateral unit vector (up × tangent) at `t`, on the ground plane
    pub fn side_at(&self, t: f32) -> Vec3 {
        Vec3::Y.cross(self.tangent_at(t)).normalize_or_zero()
    }

    /// Resolve `t` to one cubic segment plus its local parameter
    fn segment(&self, t: f32) -> (Vec3, Vec3, Vec3, Vec3, f32) {
        let n = self.points.len();
        let scaled = t.clamp(0.0, 1.0) * (n - 1) as f32;
        let i = (scaled.floor() as usize).min(n - 2);
        let s = scaled - i as f32;

        let at = |idx: isize| -> Vec3 {
            let clamped = idx.clamp(0, (n - 1) as isize) as usize;
            self.points[clamped]
        };
        let i = i as isize;
        (at(i - 1), at(i), at(i + 1), at(i + 2), s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_short_lists() {
        assert!(Spline::new(&[]).is_none());
        assert!(Spline::new(&[Vec3::ZERO]).is_none());
        assert!(Spline::new(&[Vec3::ZERO, Vec3::Z]).is_some());
    }

    #[test]
    fn test_two_point_curve_is_linear() {
        let points = [Vec3::ZERO, Vec3::new(0.0, 0.0, 40.0)];
        let spline = Spline::new(&points).unwrap();

        let start = spline.point_at(0.0);
        let mid = spline.point_at(0.5);
        let end = spline.point_at(1.0);
        assert!(start.length() < 1e-5);
        assert!((mid - Vec3::new(0.0, 0.0, 20.0)).length() < 1e-4);
        assert!((end - Vec3::new(0.0, 0.0, 40.0)).length() < 1e-4);
    }

    #[test]
    fn test_passes_through_interior_points() {
        let points = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 8.0),
            Vec3::new(3.0, 0.0, 16.0),
            Vec3::new(6.0, 0.0, 24.0),
        ];
        let spline = Spline::new(&points).unwrap();
        // t = i / (n-1) lands exactly on control point i
        for (i, &p) in points.iter().enumerate() {
            let t = i as f32 / 3.0;
            assert!((spline.point_at(t) - p).length() < 1e-4, "point {i}");
        }
    }

    #[test]
    fn test_tangent_points_forward() {
        let points = [Vec3::ZERO, Vec3::new(0.0, 0.0, 40.0)];
        let spline = Spline::new(&points).unwrap();
        let tangent = spline.tangent_at(0.5);
        assert!((tangent - Vec3::Z).length() < 1e-4);
    }

    #[test]
    fn test_side_is_perpendicular() {
        let points = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 10.0),
            Vec3::new(6.0, 0.0, 20.0),
        ];
        let spline = Spline::new(&points).unwrap();
        for i in 0..=10 {
            let t = i as f32 / 10.0;
            let dot = spline.side_at(t).dot(spline.tangent_at(t));
            assert!(dot.abs() < 1e-4);
        }
    }
}
