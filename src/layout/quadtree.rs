//! Barnes-Hut quadtree for approximate all-pairs repulsion.

use egui::{Pos2, Rect, Vec2};

// Beyond this depth coincident bodies share a leaf instead of splitting forever
const MAX_DEPTH: usize = 24;

#[derive(Debug)]
struct Quad {
    bounds: Rect,
    mass: f32,
    center_of_mass: Vec2,
    children: Option<[usize; 4]>,
    bodies: Vec<usize>,
}

impl Quad {
    fn new(bounds: Rect) -> Self {
        Self { bounds, mass: 0.0, center_of_mass: Vec2::ZERO, children: None, bodies: Vec::new() }
    }
}

#[derive(Debug)]
pub struct QuadTree {
    quads: Vec<Quad>,
    points: Vec<Pos2>,
}

impl QuadTree {
    pub fn build(points: &[Pos2]) -> Self {
        let mut bounds = Rect::NOTHING;
        for p in points {
            bounds.extend_with(*p);
        }
        if points.is_empty() {
            bounds = Rect::from_center_size(Pos2::ZERO, Vec2::splat(1.0));
        }
        // square it up so children stay square
        let side = bounds.width().max(bounds.height()).max(1.0) + 1.0;
        let root = Rect::from_center_size(bounds.center(), Vec2::splat(side));

        let mut tree = Self { quads: vec![Quad::new(root)], points: points.to_vec() };
        for i in 0..points.len() {
            tree.insert(0, i, 0);
        }
        tree
    }

    fn child_for(bounds: Rect, p: Pos2) -> usize {
        let c = bounds.center();
        match (p.x >= c.x, p.y >= c.y) {
            (false, false) => 0,
            (true, false) => 1,
            (false, true) => 2,
            (true, true) => 3,
        }
    }

    fn split(&mut self, q: usize) -> [usize; 4] {
        let b = self.quads[q].bounds;
        let c = b.center();
        let rects = [
            Rect::from_min_max(b.min, c),
            Rect::from_min_max(Pos2::new(c.x, b.min.y), Pos2::new(b.max.x, c.y)),
            Rect::from_min_max(Pos2::new(b.min.x, c.y), Pos2::new(c.x, b.max.y)),
            Rect::from_min_max(c, b.max),
        ];
        let base = self.quads.len();
        self.quads.extend(rects.into_iter().map(Quad::new));
        let children = [base, base + 1, base + 2, base + 3];
        self.quads[q].children = Some(children);
        children
    }

    fn insert(&mut self, q: usize, body: usize, depth: usize) {
        let p = self.points[body].to_vec2();
        {
            let quad = &mut self.quads[q];
            let total = quad.mass + 1.0;
            quad.center_of_mass = (quad.center_of_mass * quad.mass + p) / total;
            quad.mass = total;
        }

        if let Some(children) = self.quads[q].children {
            let c = Self::child_for(self.quads[q].bounds, self.points[body]);
            self.insert(children[c], body, depth + 1);
            return;
        }
        if self.quads[q].bodies.is_empty() || depth >= MAX_DEPTH {
            self.quads[q].bodies.push(body);
            return;
        }

        // occupied leaf: push existing bodies down and retry
        let existing = std::mem::take(&mut self.quads[q].bodies);
        let children = self.split(q);
        for b in existing.into_iter().chain(std::iter::once(body)) {
            let c = Self::child_for(self.quads[q].bounds, self.points[b]);
            self.insert(children[c], b, depth + 1);
        }
    }

    /// Approximate inverse-square repulsion on body `i` located at `p`.
    pub fn repulsion_on(&self, i: usize, p: Pos2, theta: f32, strength: f32) -> Vec2 {
        let mut force = Vec2::ZERO;
        let mut stack = vec![0usize];
        while let Some(q) = stack.pop() {
            let quad = &self.quads[q];
            if quad.mass <= 0.0 {
                continue;
            }
            match quad.children {
                None => {
                    for &b in &quad.bodies {
                        if b != i {
                            force += super::force::repulsion_pair(p - self.points[b], strength, i, b);
                        }
                    }
                }
                Some(children) => {
                    let d = p.to_vec2() - quad.center_of_mass;
                    let dist_sq = d.length_sq();
                    let size = quad.bounds.width();
                    // far enough to treat the whole cell as one body (never when we are inside it)
                    if dist_sq > f32::EPSILON && size * size < theta * theta * dist_sq && !quad.bounds.contains(p) {
                        force += super::force::repulsion_pair(d, strength * quad.mass, i, q);
                    } else {
                        stack.extend(children);
                    }
                }
            }
        }
        force
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn far_cluster_matches_exact_sum_roughly() {
        let mut pts = vec![Pos2::new(0.0, 0.0)];
        for i in 0..10 {
            pts.push(Pos2::new(1000.0 + i as f32, 1000.0 + (i % 3) as f32));
        }
        let tree = QuadTree::build(&pts);
        let approx = tree.repulsion_on(0, pts[0], 0.8, 100.0);
        let mut exact = Vec2::ZERO;
        for (b, q) in pts.iter().enumerate().skip(1) {
            exact += crate::layout::force::repulsion_pair(pts[0] - *q, 100.0, 0, b);
        }
        assert!((approx - exact).length() <= exact.length() * 0.05);
    }

    #[test]
    fn coincident_points_do_not_recurse_forever() {
        let pts = vec![Pos2::new(3.0, 3.0); 50];
        let tree = QuadTree::build(&pts);
        assert!(tree.repulsion_on(0, pts[0], 0.8, 1.0).is_finite());
    }
}
