//! Cutting planes.

use crate::float_types::{Real, tolerance};
use nalgebra::{Point3, Vector3};

// Point classification constants
pub const COPLANAR: i8 = 0;
pub const FRONT: i8 = 1;
pub const BACK: i8 = 2;

/// An oriented plane with unit normal (plane equation: `n · p = offset`).
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    /// Unit normal vector of the plane
    pub normal: Vector3<Real>,
    /// Distance from origin along normal
    pub offset: Real,
}

impl Plane {
    /// Create a new plane from a normal vector and distance.
    /// The normal is normalized; `offset` is taken as-is.
    pub fn from_normal(normal: Vector3<Real>, offset: Real) -> Self {
        Plane {
            normal: normal.normalize(),
            offset,
        }
    }

    /// Create a plane from three points.
    /// The normal direction follows the right-hand rule: `(p2-p1) × (p3-p1)`.
    /// Degenerate triples fall back to the XY plane through the origin.
    pub fn from_points(p1: &Point3<Real>, p2: &Point3<Real>, p3: &Point3<Real>) -> Self {
        let normal = (p2 - p1).cross(&(p3 - p1));
        if normal.norm_squared() < Real::EPSILON * Real::EPSILON {
            return Plane {
                normal: Vector3::z(),
                offset: 0.0,
            };
        }
        let normal = normal.normalize();
        Plane {
            offset: normal.dot(&p1.coords),
            normal,
        }
    }

    /// Signed distance from `p` to the plane, positive on the normal side.
    #[inline]
    pub fn signed_distance(&self, p: &Point3<Real>) -> Real {
        self.normal.dot(&p.coords) - self.offset
    }

    /// Classify `p` as [`COPLANAR`], [`FRONT`] or [`BACK`].
    /// A point within [`tolerance`] of the plane is coplanar.
    #[inline]
    pub fn orient_point(&self, p: &Point3<Real>) -> i8 {
        let d = self.signed_distance(p);
        if d.abs() <= tolerance() {
            COPLANAR
        } else if d > 0.0 {
            FRONT
        } else {
            BACK
        }
    }

    /// Return the same plane with the opposite orientation.
    pub fn flipped(&self) -> Self {
        Plane {
            normal: -self.normal,
            offset: -self.offset,
        }
    }

    /// Interpolation parameter `t` in `(0, 1)` where the segment `a → b`
    /// crosses the plane. Only meaningful when `a` and `b` lie strictly on
    /// opposite sides.
    #[inline]
    pub(crate) fn intersection_parameter(&self, a: &Point3<Real>, b: &Point3<Real>) -> Real {
        let denom = self.normal.dot(&(b - a));
        (self.offset - self.normal.dot(&a.coords)) / denom
    }
}

impl approx::AbsDiffEq for Plane {
    type Epsilon = <Real as approx::AbsDiffEq>::Epsilon;

    fn default_epsilon() -> Self::Epsilon {
        <Real as approx::AbsDiffEq>::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        approx::AbsDiffEq::abs_diff_eq(&self.normal, &other.normal, epsilon)
            && approx::AbsDiffEq::abs_diff_eq(&self.offset, &other.offset, epsilon)
    }
}

impl approx::RelativeEq for Plane {
    fn default_max_relative() -> Self::Epsilon {
        <Real as approx::RelativeEq>::default_max_relative()
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        approx::RelativeEq::relative_eq(&self.normal, &other.normal, epsilon, max_relative)
            && approx::RelativeEq::relative_eq(&self.offset, &other.offset, epsilon, max_relative)
    }
}

impl approx::UlpsEq for Plane {
    fn default_max_ulps() -> u32 {
        <Real as approx::UlpsEq>::default_max_ulps()
    }

    fn ulps_eq(&self, other: &Self, epsilon: Self::Epsilon, max_ulps: u32) -> bool {
        approx::UlpsEq::ulps_eq(&self.normal, &other.normal, epsilon, max_ulps)
            && approx::UlpsEq::ulps_eq(&self.offset, &other.offset, epsilon, max_ulps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn orientation_uses_tolerance() {
        let plane = Plane::from_normal(Vector3::z(), 1.0);
        assert_eq!(plane.orient_point(&Point3::new(0.0, 0.0, 2.0)), FRONT);
        assert_eq!(plane.orient_point(&Point3::new(0.0, 0.0, -2.0)), BACK);
        assert_eq!(plane.orient_point(&Point3::new(5.0, -3.0, 1.0)), COPLANAR);
    }

    #[test]
    fn from_points_follows_right_hand_rule() {
        let plane = Plane::from_points(
            &Point3::origin(),
            &Point3::new(1.0, 0.0, 0.0),
            &Point3::new(0.0, 1.0, 0.0),
        );
        assert_relative_eq!(plane.normal, Vector3::z(), epsilon = 1e-12);
        assert_relative_eq!(plane.offset, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn intersection_parameter_splits_segment() {
        let plane = Plane::from_normal(Vector3::x(), 0.25);
        let a = Point3::new(0.0, 1.0, 0.0);
        let b = Point3::new(1.0, 1.0, 0.0);
        assert_relative_eq!(plane.intersection_parameter(&a, &b), 0.25, epsilon = 1e-12);
    }

    #[test]
    fn same_surface_from_any_cyclic_point_order() {
        let a = Point3::new(0.0, 0.0, 1.0);
        let b = Point3::new(2.0, 0.0, 1.0);
        let c = Point3::new(0.0, 3.0, 1.0);
        let p1 = Plane::from_points(&a, &b, &c);
        let p2 = Plane::from_points(&b, &c, &a);
        assert_relative_eq!(p1, p2, epsilon = 1e-12);
        assert_relative_eq!(p1.flipped().flipped(), p1, epsilon = 1e-12);
    }
}
