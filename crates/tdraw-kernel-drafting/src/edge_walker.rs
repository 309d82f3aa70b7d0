//! Planar wire reconstruction from an unordered set of 2D edges.
//!
//! The walker merges coincident endpoints, removes zero-length and dangling
//! edges, then traverses the planar embedding: at every vertex the outgoing
//! half-edges are ordered by angle, and the walk continues with the
//! half-edge clockwise-next from the twin of the one it arrived on. This
//! visits every face cycle of the graph, including the unbounded one, so a
//! simple polygon comes back twice (once per side); [`EdgeWalker::result_no_dups`]
//! keeps one of each.

use std::collections::{HashMap, HashSet};

use tdraw_kernel_math::Point2;
use tracing::debug;

/// A closed wire found by the walker.
#[derive(Debug, Clone, PartialEq)]
pub struct WalkerWire {
    /// Vertices in traversal order; the closing edge is implicit.
    pub points: Vec<Point2>,
    /// Sorted indices of the loaded edges the wire uses.
    pub edges: Vec<usize>,
    /// Signed area (positive counter-clockwise).
    pub area: f64,
}

impl WalkerWire {
    /// Absolute enclosed area.
    pub fn abs_area(&self) -> f64 {
        self.area.abs()
    }
}

/// Wire reconstruction engine.
#[derive(Debug, Clone)]
pub struct EdgeWalker {
    tolerance: f64,
    vertices: Vec<Point2>,
    vertex_index: HashMap<(i64, i64), usize>,
    edges: Vec<(usize, usize)>,
    wires: Vec<WalkerWire>,
}

impl EdgeWalker {
    /// Create a walker merging endpoints closer than `tolerance`.
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            vertices: Vec::new(),
            vertex_index: HashMap::new(),
            edges: Vec::new(),
            wires: Vec::new(),
        }
    }

    fn vertex(&mut self, p: &Point2) -> usize {
        let scale = 1.0 / self.tolerance;
        let key = ((p.x * scale).round() as i64, (p.y * scale).round() as i64);
        if let Some(&i) = self.vertex_index.get(&key) {
            return i;
        }
        let i = self.vertices.len();
        self.vertices.push(*p);
        self.vertex_index.insert(key, i);
        i
    }

    /// Load edges. Zero-length edges and repeats of an already loaded edge
    /// are skipped. Returns the number of edges kept.
    pub fn load_edges(&mut self, edges: &[(Point2, Point2)]) -> usize {
        let mut known: HashSet<(usize, usize)> = self
            .edges
            .iter()
            .map(|&(a, b)| (a.min(b), a.max(b)))
            .collect();
        for (a, b) in edges {
            let (ia, ib) = (self.vertex(a), self.vertex(b));
            if ia == ib {
                debug!("skipping zero-length edge at ({:.6}, {:.6})", a.x, a.y);
                continue;
            }
            if known.insert((ia.min(ib), ia.max(ib))) {
                self.edges.push((ia, ib));
            }
        }
        self.edges.len()
    }

    /// Edges still in play after iteratively removing those with a free end.
    fn prune_dangling(&self) -> Vec<bool> {
        let mut alive = vec![true; self.edges.len()];
        let mut degree = vec![0usize; self.vertices.len()];
        for &(a, b) in &self.edges {
            degree[a] += 1;
            degree[b] += 1;
        }
        loop {
            let mut changed = false;
            for (i, &(a, b)) in self.edges.iter().enumerate() {
                if alive[i] && (degree[a] < 2 || degree[b] < 2) {
                    alive[i] = false;
                    degree[a] -= 1;
                    degree[b] -= 1;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
        alive
    }

    /// Walk the planar embedding. Returns true if at least one wire was found.
    pub fn perform(&mut self) -> bool {
        self.wires.clear();
        let alive = self.prune_dangling();

        // Half-edge h = 2e runs a→b, 2e+1 runs b→a.
        let edges = &self.edges;
        let tail = |h: usize| {
            let (a, b) = edges[h / 2];
            if h % 2 == 0 {
                a
            } else {
                b
            }
        };
        let head = |h: usize| tail(h ^ 1);

        let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); self.vertices.len()];
        for e in (0..edges.len()).filter(|&e| alive[e]) {
            outgoing[tail(2 * e)].push(2 * e);
            outgoing[tail(2 * e + 1)].push(2 * e + 1);
        }
        for (v, list) in outgoing.iter_mut().enumerate() {
            let origin = self.vertices[v];
            list.sort_by(|&h1, &h2| {
                let d1 = self.vertices[head(h1)] - origin;
                let d2 = self.vertices[head(h2)] - origin;
                d1.y.atan2(d1.x).total_cmp(&d2.y.atan2(d2.x))
            });
        }
        let mut position = vec![0usize; self.edges.len() * 2];
        for list in &outgoing {
            for (k, &h) in list.iter().enumerate() {
                position[h] = k;
            }
        }

        let min_area = self.tolerance * self.tolerance;
        let mut visited = vec![false; self.edges.len() * 2];
        for start in 0..self.edges.len() * 2 {
            if !alive[start / 2] || visited[start] {
                continue;
            }
            let mut cycle = Vec::new();
            let mut h = start;
            while !visited[h] {
                visited[h] = true;
                cycle.push(h);
                let list = &outgoing[head(h)];
                let twin_pos = position[h ^ 1];
                h = list[(twin_pos + list.len() - 1) % list.len()];
            }
            if h != start {
                debug!("walk did not close, dropping {} half-edges", cycle.len());
                continue;
            }

            let points: Vec<Point2> = cycle.iter().map(|&h| self.vertices[tail(h)]).collect();
            let area = signed_area(&points);
            if area.abs() <= min_area {
                continue;
            }
            let mut used: Vec<usize> = cycle.iter().map(|&h| h / 2).collect();
            used.sort_unstable();
            self.wires.push(WalkerWire {
                points,
                edges: used,
                area,
            });
        }

        !self.wires.is_empty()
    }

    /// Every wire found by [`perform`](Self::perform).
    pub fn result(&self) -> &[WalkerWire] {
        &self.wires
    }

    /// Wires with duplicates (same edge set as an earlier wire) removed.
    pub fn result_no_dups(&self) -> Vec<WalkerWire> {
        let mut seen: HashSet<&[usize]> = HashSet::new();
        self.wires
            .iter()
            .filter(|w| seen.insert(w.edges.as_slice()))
            .cloned()
            .collect()
    }

    /// Order wires by enclosed area.
    pub fn sort_strip(mut wires: Vec<WalkerWire>, descending: bool) -> Vec<WalkerWire> {
        wires.sort_by(|a, b| a.abs_area().total_cmp(&b.abs_area()));
        if descending {
            wires.reverse();
        }
        wires
    }
}

/// Shoelace signed area.
pub fn signed_area(points: &[Point2]) -> f64 {
    let n = points.len();
    let mut acc = 0.0;
    for i in 0..n {
        let (a, b) = (points[i], points[(i + 1) % n]);
        acc += a.x * b.y - b.x * a.y;
    }
    acc * 0.5
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x0: f64, y0: f64, size: f64) -> Vec<(Point2, Point2)> {
        let p = [
            Point2::new(x0, y0),
            Point2::new(x0 + size, y0),
            Point2::new(x0 + size, y0 + size),
            Point2::new(x0, y0 + size),
        ];
        vec![(p[0], p[1]), (p[2], p[1]), (p[3], p[2]), (p[3], p[0])]
    }

    #[test]
    fn test_square_gives_two_cycles_one_wire() {
        let mut walker = EdgeWalker::new(1e-6);
        assert_eq!(walker.load_edges(&square(0.0, 0.0, 1.0)), 4);
        assert!(walker.perform());
        assert_eq!(walker.result().len(), 2);

        let wires = walker.result_no_dups();
        assert_eq!(wires.len(), 1);
        assert_eq!(wires[0].points.len(), 4);
        assert!((wires[0].abs_area() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_nested_squares_sort_outer_first() {
        let mut edges = square(2.0, 2.0, 1.0);
        edges.extend(square(0.0, 0.0, 5.0));
        let mut walker = EdgeWalker::new(1e-6);
        walker.load_edges(&edges);
        assert!(walker.perform());

        let wires = EdgeWalker::sort_strip(walker.result_no_dups(), true);
        assert_eq!(wires.len(), 2);
        assert!((wires[0].abs_area() - 25.0).abs() < 1e-12);
        assert!((wires[1].abs_area() - 1.0).abs() < 1e-12);

        let ascending = EdgeWalker::sort_strip(wires, false);
        assert!((ascending[0].abs_area() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_dangling_and_null_edges_are_dropped() {
        let mut edges = square(0.0, 0.0, 1.0);
        edges.push((Point2::new(1.0, 1.0), Point2::new(3.0, 3.0)));
        edges.push((Point2::new(3.0, 3.0), Point2::new(4.0, 3.0)));
        edges.push((Point2::new(0.5, 0.5), Point2::new(0.5, 0.5 + 1e-9)));
        let mut walker = EdgeWalker::new(1e-6);
        assert_eq!(walker.load_edges(&edges), 6);
        assert!(walker.perform());
        let wires = walker.result_no_dups();
        assert_eq!(wires.len(), 1);
        assert!((wires[0].abs_area() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_shared_edge_splits_into_two_faces() {
        // Two unit squares side by side sharing the edge x = 1.
        let mut edges = square(0.0, 0.0, 1.0);
        edges.extend(square(1.0, 0.0, 1.0));
        let mut walker = EdgeWalker::new(1e-6);
        assert_eq!(walker.load_edges(&edges), 7);
        assert!(walker.perform());
        // Two inner faces plus the outer boundary.
        let wires = walker.result_no_dups();
        assert_eq!(wires.len(), 3);
        let sorted = EdgeWalker::sort_strip(wires, true);
        assert!((sorted[0].abs_area() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_no_edges_finds_nothing() {
        let mut walker = EdgeWalker::new(1e-6);
        walker.load_edges(&[]);
        assert!(!walker.perform());
        assert!(walker.result_no_dups().is_empty());
    }
}
