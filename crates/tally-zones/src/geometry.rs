use tally_proto::Point;

/// Coordinates are clamped to this magnitude so every cross product fits in i128.
const LIMIT: i64 = 1 << 61;

/// Even-odd (ray casting) containment, boundary inclusive.
///
/// All arithmetic is exact integer math, so the answer is deterministic for any
/// vertex list. Self-intersecting outlines follow the even-odd rule: regions
/// covered an even number of times count as outside. Fewer than three vertices
/// enclose nothing, only points on the degenerate outline itself match.
/// Coordinates beyond `±2^61` are clamped to it first.
pub fn point_in_polygon(poly: &[Point], p: Point) -> bool {
    let n = poly.len();
    if n == 0 {
        return false;
    }

    let p = clamp(p);
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (clamp(poly[i]), clamp(poly[j]));
        if on_segment(a, b, p) {
            return true;
        }
        if (a.1 > p.1) != (b.1 > p.1) {
            // p.x < a.x + (b.x - a.x) * (p.y - a.y) / (b.y - a.y), without dividing
            let lhs = (p.0 - a.0) * (b.1 - a.1);
            let rhs = (b.0 - a.0) * (p.1 - a.1);
            let crosses = if b.1 > a.1 { lhs < rhs } else { lhs > rhs };
            if crosses {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

fn clamp(p: Point) -> (i128, i128) {
    (p.x.clamp(-LIMIT, LIMIT) as i128, p.y.clamp(-LIMIT, LIMIT) as i128)
}

fn on_segment(a: (i128, i128), b: (i128, i128), p: (i128, i128)) -> bool {
    let cross = (b.0 - a.0) * (p.1 - a.1) - (b.1 - a.1) * (p.0 - a.0);
    cross == 0
        && p.0 >= a.0.min(b.0)
        && p.0 <= a.0.max(b.0)
        && p.1 >= a.1.min(b.1)
        && p.1 <= a.1.max(b.1)
}
