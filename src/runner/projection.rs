//! Lane/depth perspective projection.
//!
//! The track is a trapezoid: lane divider lines fan out from near the screen
//! center at the horizon to evenly spaced positions along the bottom edge.
//! Depth 0 sits on the bottom edge, `far_plane` on the horizon line.

use glam::DVec2;

/// Convergence of the lane lines at the horizon when running at base speed.
pub const BASE_CONVERGENCE: f64 = 0.1;
/// Extra convergence added at full speed ("warp" field of view).
pub const WARP_CONVERGENCE: f64 = 0.15;

/// Pixel size of the render target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn mid_x(&self) -> f64 {
        self.width / 2.0
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(800.0, 600.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    pub lane_count: u8,
    pub far_plane: f64,
    pub horizon_ratio: f64,
    /// 0 = all lines meet in one vanishing point, 1 = no perspective at all.
    pub convergence: f64,
}

impl Projection {
    pub fn new(lane_count: u8, far_plane: f64, horizon_ratio: f64) -> Self {
        Self { lane_count, far_plane, horizon_ratio, convergence: BASE_CONVERGENCE }
    }

    /// Widen the vanishing width as the run speeds up.
    pub fn set_speed(&mut self, speed: f64, base_speed: f64, max_speed: f64) {
        self.convergence = convergence_for_speed(speed, base_speed, max_speed);
    }

    pub fn horizon_y(&self, vp: &Viewport) -> f64 {
        vp.height * self.horizon_ratio
    }

    /// 0 at the far plane, 1 at the camera. Not clamped.
    pub fn progress(&self, depth: f64) -> f64 {
        (self.far_plane - depth) / self.far_plane
    }

    pub fn depth_to_y(&self, depth: f64, vp: &Viewport) -> f64 {
        let horizon = self.horizon_y(vp);
        horizon + (vp.height - horizon) * self.progress(depth)
    }

    /// X of lane divider `line` (0..=lane_count) at `depth`. Fractional lines are fine.
    pub fn line_x(&self, line: f64, depth: f64, vp: &Viewport) -> f64 {
        let x_bottom = line / self.lane_count as f64 * vp.width;
        let x_top = vp.mid_x() + (x_bottom - vp.mid_x()) * self.convergence;
        x_top + (x_bottom - x_top) * self.progress(depth)
    }

    /// Lines are linear in their index, so a lane's center is the line at `lane + 0.5`.
    pub fn lane_center_x(&self, lane: f64, depth: f64, vp: &Viewport) -> f64 {
        self.line_x(lane + 0.5, depth, vp)
    }

    pub fn project(&self, lane: f64, depth: f64, vp: &Viewport) -> DVec2 {
        DVec2::new(self.lane_center_x(lane, depth, vp), self.depth_to_y(depth, vp))
    }

    /// Draw scale for sprites at `depth`: 0.1 at the horizon up to 1.0 at the camera.
    pub fn scale_at(&self, depth: f64) -> f64 {
        (0.1 + self.progress(depth) * 0.9).clamp(0.1, 1.0)
    }

    /// Depth that maps to screen-y `y`; inverse of `depth_to_y`.
    pub fn y_to_depth(&self, y: f64, vp: &Viewport) -> f64 {
        let horizon = self.horizon_y(vp);
        let span = vp.height - horizon;
        if span <= 0.0 {
            return self.far_plane;
        }
        self.far_plane - (y - horizon) / span * self.far_plane
    }
}

pub fn convergence_for_speed(speed: f64, base_speed: f64, max_speed: f64) -> f64 {
    let range = max_speed - base_speed;
    let ratio = if range > 0.0 { (speed - base_speed) / range } else { 0.0 };
    BASE_CONVERGENCE + ratio.clamp(0.0, 1.0) * WARP_CONVERGENCE
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proj() -> Projection {
        Projection::new(3, 1000.0, 0.3)
    }

    #[test]
    fn far_plane_sits_on_horizon_and_camera_on_bottom() {
        let p = proj();
        let vp = Viewport::new(900.0, 600.0);
        assert!((p.depth_to_y(1000.0, &vp) - 180.0).abs() < 1e-9);
        assert!((p.depth_to_y(0.0, &vp) - 600.0).abs() < 1e-9);
    }

    #[test]
    fn bottom_edge_lanes_are_evenly_spaced() {
        let p = proj();
        let vp = Viewport::new(900.0, 600.0);
        assert!((p.lane_center_x(0.0, 0.0, &vp) - 150.0).abs() < 1e-9);
        assert!((p.lane_center_x(1.0, 0.0, &vp) - 450.0).abs() < 1e-9);
        assert!((p.lane_center_x(2.0, 0.0, &vp) - 750.0).abs() < 1e-9);
    }

    #[test]
    fn lanes_squeeze_toward_center_at_horizon() {
        let p = proj();
        let vp = Viewport::new(900.0, 600.0);
        let near = p.lane_center_x(2.0, 0.0, &vp) - p.lane_center_x(0.0, 0.0, &vp);
        let far = p.lane_center_x(2.0, 1000.0, &vp) - p.lane_center_x(0.0, 1000.0, &vp);
        assert!((far - near * BASE_CONVERGENCE).abs() < 1e-9);
        // middle lane stays on the center line at every depth
        assert!((p.lane_center_x(1.0, 640.0, &vp) - 450.0).abs() < 1e-9);
    }

    #[test]
    fn out_of_range_values_extrapolate() {
        let p = proj();
        let vp = Viewport::default();
        let step = p.lane_center_x(1.0, 0.0, &vp) - p.lane_center_x(0.0, 0.0, &vp);
        let beyond = p.lane_center_x(3.0, 0.0, &vp) - p.lane_center_x(2.0, 0.0, &vp);
        assert!((step - beyond).abs() < 1e-9);
        assert!(p.depth_to_y(-100.0, &vp) > vp.height);
    }

    #[test]
    fn warp_convergence_is_bounded() {
        assert_eq!(convergence_for_speed(5.0, 5.0, 15.0), BASE_CONVERGENCE);
        assert!((convergence_for_speed(10.0, 5.0, 15.0) - 0.175).abs() < 1e-12);
        assert_eq!(convergence_for_speed(40.0, 5.0, 15.0), BASE_CONVERGENCE + WARP_CONVERGENCE);
        assert_eq!(convergence_for_speed(1.0, 5.0, 5.0), BASE_CONVERGENCE);
    }

    #[test]
    fn y_to_depth_inverts_depth_to_y() {
        let p = proj();
        let vp = Viewport::default();
        for d in [0.0, 80.0, 333.0, 999.0] {
            assert!((p.y_to_depth(p.depth_to_y(d, &vp), &vp) - d).abs() < 1e-9);
        }
    }

    #[test]
    fn scale_is_clamped() {
        let p = proj();
        assert!((p.scale_at(1000.0) - 0.1).abs() < 1e-12);
        assert!((p.scale_at(0.0) - 1.0).abs() < 1e-12);
        assert_eq!(p.scale_at(-500.0), 1.0);
    }
}
