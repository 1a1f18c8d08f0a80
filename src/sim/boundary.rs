//! World-edge policies
//!
//! `wrap` and `remove` use a radius margin so an entity is only wrapped or
//! dropped once it is fully off-screen. An entity sitting exactly on the margin
//! is left alone. `bounce` clamps to the rectangle edge itself.

use glam::Vec2;

use super::config::BoundaryPolicy;
use super::state::Bounds;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryOutcome {
    /// Nothing changed
    Inside,
    /// Position and/or velocity were rewritten
    Adjusted,
    /// Entity must leave the live set
    Remove,
}

fn wrap_axis(v: &mut f32, extent: f32, margin: f32) -> bool {
    if *v < -margin {
        *v = extent + margin;
        true
    } else if *v > extent + margin {
        *v = -margin;
        true
    } else {
        false
    }
}

fn bounce_axis(v: &mut f32, vel: &mut f32, extent: f32) -> bool {
    if *v < 0.0 {
        *v = 0.0;
        *vel = vel.abs();
        true
    } else if *v > extent {
        *v = extent;
        *vel = -vel.abs();
        true
    } else {
        false
    }
}

/// Apply `policy` to an entity of radius `margin`
pub fn apply_boundary(
    pos: &mut Vec2,
    vel: &mut Vec2,
    margin: f32,
    bounds: Bounds,
    policy: BoundaryPolicy,
) -> BoundaryOutcome {
    let margin = margin.max(0.0);
    match policy {
        BoundaryPolicy::Remove => {
            let outside = pos.x < -margin
                || pos.x > bounds.width + margin
                || pos.y < -margin
                || pos.y > bounds.height + margin;
            if outside {
                BoundaryOutcome::Remove
            } else {
                BoundaryOutcome::Inside
            }
        }
        BoundaryPolicy::Wrap => {
            let wrapped_x = wrap_axis(&mut pos.x, bounds.width, margin);
            let wrapped_y = wrap_axis(&mut pos.y, bounds.height, margin);
            if wrapped_x || wrapped_y {
                BoundaryOutcome::Adjusted
            } else {
                BoundaryOutcome::Inside
            }
        }
        BoundaryPolicy::Bounce => {
            let bounced_x = bounce_axis(&mut pos.x, &mut vel.x, bounds.width);
            let bounced_y = bounce_axis(&mut pos.y, &mut vel.y, bounds.height);
            if bounced_x || bounced_y {
                BoundaryOutcome::Adjusted
            } else {
                BoundaryOutcome::Inside
            }
        }
    }
}
