//! Axis-aligned bounding-box overlap
//!
//! The one geometry primitive in the game. Boxes are centered, with strict
//! inequality on both axes: edges that merely touch do not collide. There is
//! no swept test; tunneling at extreme relative speed is an accepted
//! limitation of the discrete step.

use glam::Vec2;

use super::state::Body;

/// Centered axis-aligned box
#[derive(Debug, Clone, Copy)]
pub struct Aabb {
    pub center: Vec2,
    pub half: Vec2,
}

impl Aabb {
    pub fn of(body: &Body) -> Self {
        Self {
            center: body.pos,
            half: body.half,
        }
    }

    /// Shrink both half extents, bottoming out at zero
    pub fn shrink(self, margin: f32) -> Self {
        Self {
            center: self.center,
            half: (self.half - Vec2::splat(margin)).max(Vec2::ZERO),
        }
    }

    pub fn overlaps(&self, other: &Aabb) -> bool {
        (self.center.x - other.center.x).abs() < self.half.x + other.half.x
            && (self.center.y - other.center.y).abs() < self.half.y + other.half.y
    }
}

/// Player-vs-entity check with the forgiveness margin applied to the player
pub fn player_hits(player: &Body, forgiveness: f32, other: &Body) -> bool {
    other.active && Aabb::of(player).shrink(forgiveness).overlaps(&Aabb::of(other))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_at(x: f32, y: f32, w: f32, h: f32) -> Body {
        Body::new(Vec2::new(x, y), Vec2::new(w, h))
    }

    #[test]
    fn test_overlap_basic() {
        let a = Aabb::of(&body_at(0.0, 0.0, 20.0, 20.0));
        let b = Aabb::of(&body_at(15.0, 0.0, 20.0, 20.0));
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
    }

    #[test]
    fn test_touching_edges_do_not_overlap() {
        // Centers 20 apart, half extents 10 + 10: edges touch exactly
        let a = Aabb::of(&body_at(0.0, 0.0, 20.0, 20.0));
        let b = Aabb::of(&body_at(20.0, 0.0, 20.0, 20.0));
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn test_overlap_requires_both_axes() {
        let a = Aabb::of(&body_at(0.0, 0.0, 20.0, 20.0));
        let b = Aabb::of(&body_at(15.0, 50.0, 20.0, 20.0));
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn test_forgiveness_margin_shrinks_player() {
        let player = body_at(0.0, 0.0, 20.0, 20.0);
        let other = body_at(18.0, 0.0, 20.0, 20.0);
        assert!(player_hits(&player, 0.0, &other));
        // A 5-unit margin turns the grazing contact into a miss
        assert!(!player_hits(&player, 5.0, &other));
    }

    #[test]
    fn test_inactive_bodies_never_collide() {
        let player = body_at(0.0, 0.0, 20.0, 20.0);
        let mut other = body_at(0.0, 0.0, 20.0, 20.0);
        other.active = false;
        assert!(!player_hits(&player, 0.0, &other));
    }
}
