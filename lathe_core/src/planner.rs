//! Feed path planner: geometry for straight and taper power feeds.
//!
//! Straight feeds run along one axis to just inside the soft limit. Taper
//! feeds run at a fixed angle to the spindle axis from the current position
//! toward the soft-limit corner of the joystick's quadrant, stopping at
//! whichever limit is reached first. Taper geometry is in diameter mode: X
//! values (start, corner, destination) are doubled, Z values never are.

use lathe_traits::Axis;

use crate::command::MdiCommand;
use crate::error::PathError;
use crate::limits::SoftLimits;
use crate::types::{CartesianPoint, JoystickDirection, Position};

/// Inset from the soft limit for straight feeds, in machine units.
pub const SAFE_LIMIT_MARGIN: f64 = 0.001;

/// Destination axis and coordinate for a straight feed, or `None` when centered.
pub fn straight_destination(
    direction: JoystickDirection,
    limits: &SoftLimits,
) -> Option<(Axis, f64)> {
    match direction {
        JoystickDirection::None => None,
        JoystickDirection::XPlus => Some((Axis::X, limits.x_max - SAFE_LIMIT_MARGIN)),
        JoystickDirection::XMinus => Some((Axis::X, limits.x_min + SAFE_LIMIT_MARGIN)),
        JoystickDirection::ZPlus => Some((Axis::Z, limits.z_max - SAFE_LIMIT_MARGIN)),
        JoystickDirection::ZMinus => Some((Axis::Z, limits.z_min + SAFE_LIMIT_MARGIN)),
    }
}

/// Soft-limit corner of the quadrant the joystick points into.
pub fn corner_point(direction: JoystickDirection, limits: &SoftLimits) -> Option<CartesianPoint> {
    let (x, z) = match direction {
        JoystickDirection::None => return None,
        JoystickDirection::XPlus => (limits.x_max, limits.z_min),
        JoystickDirection::XMinus => (limits.x_min, limits.z_max),
        JoystickDirection::ZPlus => (limits.x_max, limits.z_max),
        JoystickDirection::ZMinus => (limits.x_min, limits.z_min),
    };
    Some(CartesianPoint::new(x * 2.0, z))
}

pub fn start_point(position: Position) -> CartesianPoint {
    CartesianPoint::new(position.x * 2.0, position.z)
}

fn toward(from: f64, to: f64) -> f64 {
    if to >= from { 1.0 } else { -1.0 }
}

/// Right-triangle intercept from `start` toward `corner` at `angle_deg`.
pub fn taper_destination(
    start: CartesianPoint,
    corner: CartesianPoint,
    angle_deg: f64,
) -> Result<CartesianPoint, PathError> {
    if !(angle_deg > 0.0 && angle_deg <= 90.0) {
        return Err(PathError::InvalidAngle(angle_deg));
    }
    let tan = angle_deg.to_radians().tan();
    let opposite = (corner.x - start.x).abs();
    // halved to undo the diameter doubling of `opposite`
    let adjacent = (opposite / tan) / 2.0;
    let max_dist_z = (corner.z - start.z).abs();

    if adjacent > max_dist_z {
        // Z travel runs out first; stop short of the corner's X.
        let extra_z = adjacent - max_dist_z;
        let small_opposite = extra_z * tan;
        let x = corner.x - 2.0 * small_opposite * toward(start.x, corner.x);
        Ok(CartesianPoint::new(x, corner.z))
    } else {
        let z = start.z + adjacent * toward(start.z, corner.z);
        Ok(CartesianPoint::new(corner.x, z))
    }
}

/// Feed move to the soft limit along the joystick axis.
pub fn straight_turning_command(
    direction: JoystickDirection,
    feed_per_rev: f64,
    limits: &SoftLimits,
) -> Result<MdiCommand, PathError> {
    let (axis, target) = straight_destination(direction, limits).ok_or(PathError::NoDirection)?;
    Ok(MdiCommand::StraightMove {
        feed_per_rev,
        axis,
        target,
    })
}

/// Angled feed move from `position` bounded by the soft-limit envelope.
pub fn taper_turning_command(
    direction: JoystickDirection,
    angle_deg: f64,
    feed_per_rev: f64,
    limits: &SoftLimits,
    position: Option<Position>,
) -> Result<MdiCommand, PathError> {
    let corner = corner_point(direction, limits).ok_or(PathError::NoDirection)?;
    let start = start_point(position.ok_or(PathError::UnknownPosition)?);
    let dest = taper_destination(start, corner, angle_deg)?;
    Ok(MdiCommand::TaperMove {
        feed_per_rev,
        x_diameter: dest.x,
        z: dest.z,
    })
}

/// Inputs of one feed plan.
#[derive(Debug, Clone, Copy)]
pub struct FeedRequest {
    pub direction: JoystickDirection,
    pub feed_per_rev: f64,
    /// Taper angle in degrees when taper turning is enabled.
    pub taper_angle_deg: Option<f64>,
    pub position: Option<Position>,
}

/// Pick straight or taper geometry for a feed request.
pub fn plan_feed(req: &FeedRequest, limits: &SoftLimits) -> Result<MdiCommand, PathError> {
    let cmd = match req.taper_angle_deg {
        Some(angle) => taper_turning_command(
            req.direction,
            angle,
            req.feed_per_rev,
            limits,
            req.position,
        )?,
        None => straight_turning_command(req.direction, req.feed_per_rev, limits)?,
    };
    tracing::debug!(direction = ?req.direction, command = %cmd, "feed planned");
    Ok(cmd)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toward_picks_travel_sign() {
        assert_eq!(toward(0.0, 10.0), 1.0);
        assert_eq!(toward(10.0, 0.0), -1.0);
    }

    #[test]
    fn ninety_degrees_is_plunge_to_x_corner() {
        let d = taper_destination(
            CartesianPoint::new(40.0, -20.0),
            CartesianPoint::new(200.0, -300.0),
            90.0,
        )
        .unwrap();
        assert!((d.x - 200.0).abs() < 1e-9);
        assert!((d.z + 20.0).abs() < 1e-9);
    }
}
