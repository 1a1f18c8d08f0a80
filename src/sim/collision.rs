//! Exact collision tests
//!
//! The broad-phase grid only shortlists candidates; these functions decide.
//! Bullets are tested both at their end position and along the segment they
//! swept this tick so fast rounds cannot tunnel through small hulls.

use glam::Vec2;

use super::state::{Bullet, Ship};

/// Closest point to `p` on the segment `start..end`
#[inline]
pub fn closest_point_on_segment(start: Vec2, end: Vec2, p: Vec2) -> Vec2 {
    let seg = end - start;
    let len_sq = seg.length_squared();
    if len_sq <= f32::EPSILON {
        return start;
    }
    let t = ((p - start).dot(seg) / len_sq).clamp(0.0, 1.0);
    start + seg * t
}

/// Center distance within combined radii (touching counts)
#[inline]
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    let r = ra + rb;
    a.distance_squared(b) <= r * r
}

/// Whether the segment `start..end` passes within `radius` of `center`
#[inline]
pub fn segment_circle_hit(start: Vec2, end: Vec2, center: Vec2, radius: f32) -> bool {
    let closest = closest_point_on_segment(start, end, center);
    closest.distance_squared(center) <= radius * radius
}

/// Point test at the current position, then the swept test
pub fn bullet_hits_ship(bullet: &Bullet, ship: &Ship) -> bool {
    if circles_overlap(bullet.pos, bullet.radius, ship.pos, ship.radius) {
        return true;
    }
    segment_circle_hit(
        bullet.prev_pos,
        bullet.pos,
        ship.pos,
        bullet.radius + ship.radius,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::pool::Poolable;
    use crate::sim::state::{BulletSpec, ShipClass, ShipStats};

    fn bullet_at(prev: Vec2, pos: Vec2) -> Bullet {
        let mut bullet = Bullet::create(BulletSpec {
            owner_id: 1,
            team: 0,
            pos,
            vel: Vec2::ZERO,
            damage: 1.0,
            ttl: 1.0,
            radius: 1.0,
        });
        bullet.prev_pos = prev;
        bullet
    }

    fn fighter_at(pos: Vec2) -> Ship {
        Ship::new(2, 1, &ShipStats::for_class(ShipClass::Fighter), pos, 0.0)
    }

    #[test]
    fn test_closest_point_clamps_to_ends() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(10.0, 0.0);
        assert_eq!(closest_point_on_segment(a, b, Vec2::new(5.0, 3.0)), Vec2::new(5.0, 0.0));
        assert_eq!(closest_point_on_segment(a, b, Vec2::new(-5.0, 3.0)), a);
        assert_eq!(closest_point_on_segment(a, b, Vec2::new(15.0, 3.0)), b);
        assert_eq!(closest_point_on_segment(a, a, Vec2::new(1.0, 1.0)), a);
    }

    #[test]
    fn test_circles_touching_overlap() {
        assert!(circles_overlap(Vec2::ZERO, 1.0, Vec2::new(3.0, 0.0), 2.0));
        assert!(!circles_overlap(Vec2::ZERO, 1.0, Vec2::new(3.1, 0.0), 2.0));
    }

    #[test]
    fn test_point_hit() {
        let ship = fighter_at(Vec2::new(100.0, 100.0));
        let bullet = bullet_at(Vec2::new(104.0, 100.0), Vec2::new(104.0, 100.0));
        assert!(bullet_hits_ship(&bullet, &ship));
    }

    #[test]
    fn test_swept_hit_catches_tunneling() {
        let ship = fighter_at(Vec2::new(100.0, 100.0));
        // Passes straight through the hull in one tick
        let bullet = bullet_at(Vec2::new(50.0, 100.0), Vec2::new(150.0, 100.0));
        assert!(!circles_overlap(bullet.pos, bullet.radius, ship.pos, ship.radius));
        assert!(bullet_hits_ship(&bullet, &ship));
    }

    #[test]
    fn test_swept_miss() {
        let ship = fighter_at(Vec2::new(100.0, 100.0));
        let bullet = bullet_at(Vec2::new(50.0, 130.0), Vec2::new(150.0, 130.0));
        assert!(!bullet_hits_ship(&bullet, &ship));
    }
}
