//! Ray and segment intersection on the ground plane
//!
//! Used for monster line of sight and for hitscan fire. Rays stop at wall
//! segments and door rectangles; monster rectangles are tested separately so
//! a look check never touches monster health.

use crate::math::Vec2;
use super::collision::Obstacles;
use super::components::Footprint;

/// Intersection of two segments, `None` when parallel or when either
/// parameter falls outside the open interval (0, 1).
pub fn line_intersect(start1: Vec2, end1: Vec2, start2: Vec2, end2: Vec2) -> Option<Vec2> {
    let line1 = end1 - start1;
    let line2 = end2 - start2;

    let cross = line1.cross(line2);
    if cross == 0.0 {
        return None;
    }

    let between = start2 - start1;
    let a = between.cross(line2) / cross;
    let b = between.cross(line1) / cross;

    if 0.0 < a && a < 1.0 && 0.0 < b && b < 1.0 {
        Some(start1 + line1 * a)
    } else {
        None
    }
}

/// Whichever of two candidates lies closer to `origin`
pub fn nearest(a: Option<Vec2>, b: Option<Vec2>, origin: Vec2) -> Option<Vec2> {
    match (a, b) {
        (Some(a), Some(b)) if b.distance(origin) < a.distance(origin) => Some(b),
        (Some(a), _) => Some(a),
        (None, b) => b,
    }
}

/// Nearest crossing of a segment with the four edges of a rectangle
pub fn line_intersect_rect(start: Vec2, end: Vec2, rect: Footprint) -> Option<Vec2> {
    let p = rect.pos;
    let q = rect.pos + rect.size;
    let corner_x = Vec2::new(q.x, p.y);
    let corner_y = Vec2::new(p.x, q.y);

    [(p, corner_x), (p, corner_y), (corner_y, q), (corner_x, q)]
        .into_iter()
        .fold(None, |best, (a, b)| nearest(best, line_intersect(start, end, a, b), start))
}

/// Closest rectangle crossed by the segment, with its index
pub fn nearest_rect_hit<I>(start: Vec2, end: Vec2, rects: I) -> Option<(usize, Vec2)>
where
    I: IntoIterator<Item = (usize, Footprint)>,
{
    let mut best: Option<(usize, Vec2)> = None;
    for (index, rect) in rects {
        let Some(hit) = line_intersect_rect(start, end, rect) else {
            continue;
        };
        let closer = best.map_or(true, |(_, b)| hit.distance(start) < b.distance(start));
        if closer {
            best = Some((index, hit));
        }
    }
    best
}

impl<'a> Obstacles<'a> {
    /// Nearest point where the segment hits a wall or a door
    pub fn cast(&self, start: Vec2, end: Vec2) -> Option<Vec2> {
        let walls = self
            .segments
            .iter()
            .map(|s| line_intersect(start, end, s.start, s.end))
            .fold(None, |best, hit| nearest(best, hit, start));

        self.doors
            .iter()
            .map(|d| line_intersect_rect(start, end, d.footprint()))
            .fold(walls, |best, hit| nearest(best, hit, start))
    }

    /// True when `target` is not farther along the ray than the first obstacle
    pub fn can_see(&self, start: Vec2, end: Vec2, target: Vec2) -> bool {
        match self.cast(start, end) {
            Some(hit) => target.distance(start) <= hit.distance(start),
            None => true,
        }
    }
}
