//! Lloyd relaxation: move every generator to the centroid of its region.

use glam::DVec2;
use urbis_geometry::polygon_centroid;

use crate::diagram::VoronoiDiagram;

/// Relaxed generators stay this far inside the bounds so they never sit on a side.
const BOUNDS_MARGIN: f64 = 1e-3;

/// One Lloyd step: the centroid of each site's clipped region, in site order.
///
/// Sites whose region collapses to fewer than three points keep their position.
pub(crate) fn relaxed_positions(diagram: &VoronoiDiagram) -> Vec<DVec2> {
    let bounds = diagram.bounds();
    let lo = bounds.min + DVec2::splat(BOUNDS_MARGIN);
    let hi = bounds.max - DVec2::splat(BOUNDS_MARGIN);

    diagram
        .site_ids()
        .map(|id| {
            let polygon = diagram.site_polygon(id);
            let position = diagram.site(id).position;
            if polygon.len() < 3 {
                return position;
            }
            polygon_centroid(&polygon).map_or(position, |c| c.clamp(lo, hi))
        })
        .collect()
}
