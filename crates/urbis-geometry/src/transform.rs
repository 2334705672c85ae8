use glam::{DVec2, DVec3};

/// Affine map between the generation plane and the renderer's world space.
///
/// The renderer lays the city on a ground plane of width `scale²` world units centred
/// on the origin, rotated half a turn about the up (Y) axis. The planar region
/// `[0, region_width]²` maps onto that ground plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaneTransform {
    plane_width: f64,
    divider: f64,
    offset: f64,
}

impl PlaneTransform {
    pub fn new(scale: f64, region_width: f64) -> Self {
        let plane_width = scale * scale;
        Self {
            plane_width,
            divider: region_width * (scale / 10.0) / plane_width,
            offset: plane_width / 2.0 * (10.0 / scale),
        }
    }

    /// Width of the ground plane in world units.
    pub fn plane_width(&self) -> f64 {
        self.plane_width
    }

    pub fn to_world(&self, p: DVec2) -> DVec3 {
        let x = p.x / self.divider - self.offset;
        let z = p.y / self.divider - self.offset;
        DVec3::new(-x, 0.0, -z)
    }

    /// Inverse of [`to_world`](Self::to_world). The Y component is ignored.
    pub fn to_plane(&self, w: DVec3) -> DVec2 {
        DVec2::new(
            (-w.x + self.offset) * self.divider,
            (-w.z + self.offset) * self.divider,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_maps_onto_centred_plane() {
        let t = PlaneTransform::new(10.0, 1350.0);
        assert_eq!(t.plane_width(), 100.0);

        let corner = t.to_world(DVec2::ZERO);
        assert!((corner - DVec3::new(50.0, 0.0, 50.0)).length() < 1e-9, "got {corner}");

        let center = t.to_world(DVec2::new(675.0, 675.0));
        assert!(center.length() < 1e-9, "region centre must land on the origin, got {center}");
    }

    #[test]
    fn test_inverse_recovers_plane_point() {
        let t = PlaneTransform::new(12.0, 900.0);
        for p in [
            DVec2::new(0.0, 0.0),
            DVec2::new(123.4, 567.8),
            DVec2::new(900.0, 12.5),
        ] {
            let back = t.to_plane(t.to_world(p));
            assert!((back - p).length() < 1e-9, "{p} came back as {back}");
        }
    }
}
