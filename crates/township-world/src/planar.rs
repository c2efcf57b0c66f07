//! Planar street graph construction.
//!
//! The graph starts as a Euclidean minimum spanning tree (Kruskal with
//! union-find), which is connected and can never self-cross. A handful of
//! short supplementary streets are then offered per node; each is kept only
//! if it is local (within 1.3x the median tree edge), does not duplicate an
//! existing street, and does not cross any street already placed.
//!
//! Nodes and segments are plain indices into dense vectors; the world map
//! turns them into [`LocationId`](township_types::LocationId)s and
//! [`StreetId`](township_types::StreetId)s afterwards.

use rand::Rng;
use township_types::Point;

use crate::geometry::segments_cross;

/// Supplementary streets may be at most this multiple of the median tree edge.
const LOCALITY_FACTOR: f64 = 1.3;

/// Inclusive range of street travel times in minutes.
const MIN_MINUTES: u32 = 1;
const MAX_MINUTES: u32 = 5;

/// An undirected street between two node indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    /// First endpoint.
    pub a: usize,
    /// Second endpoint.
    pub b: usize,
    /// Travel time in minutes.
    pub minutes: u32,
}

impl Segment {
    /// The endpoint opposite `node`, or `None` if `node` is not an endpoint.
    pub const fn other_end(&self, node: usize) -> Option<usize> {
        if self.a == node {
            Some(self.b)
        } else if self.b == node {
            Some(self.a)
        } else {
            None
        }
    }

    /// Whether `node` is one of the endpoints.
    pub const fn touches(&self, node: usize) -> bool {
        self.a == node || self.b == node
    }
}

/// Positions plus undirected segments, with per-node incidence lists.
#[derive(Debug, Clone, PartialEq)]
pub struct RoadGraph {
    positions: Vec<Point>,
    segments: Vec<Segment>,
    incidence: Vec<Vec<usize>>,
}

impl RoadGraph {
    /// A graph with the given nodes and no segments.
    pub fn new(positions: Vec<Point>) -> Self {
        let incidence = vec![Vec::new(); positions.len()];
        Self {
            positions,
            segments: Vec::new(),
            incidence,
        }
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.positions.len()
    }

    /// Node positions, by index.
    pub fn positions(&self) -> &[Point] {
        &self.positions
    }

    /// Position of one node.
    pub fn position(&self, node: usize) -> Option<Point> {
        self.positions.get(node).copied()
    }

    /// All segments, in insertion order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// One segment by index.
    pub fn segment(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index)
    }

    /// Indices of the segments touching `node`, in insertion order.
    pub fn incident(&self, node: usize) -> &[usize] {
        self.incidence.get(node).map_or(&[], Vec::as_slice)
    }

    /// Number of segments touching `node`.
    pub fn degree(&self, node: usize) -> usize {
        self.incident(node).len()
    }

    /// Whether a segment already joins `a` and `b`.
    pub fn are_connected(&self, a: usize, b: usize) -> bool {
        self.incident(a)
            .iter()
            .filter_map(|&s| self.segments.get(s))
            .any(|s| s.other_end(a) == Some(b))
    }

    /// Euclidean length of a segment.
    pub fn length(&self, segment: &Segment) -> f64 {
        match (self.position(segment.a), self.position(segment.b)) {
            (Some(pa), Some(pb)) => pa.distance(pb),
            _ => 0.0,
        }
    }

    /// Whether a street from `a` to `b` would cross any existing segment.
    pub fn crosses_existing(&self, a: usize, b: usize) -> bool {
        let (Some(pa), Some(pb)) = (self.position(a), self.position(b)) else {
            return false;
        };
        self.segments.iter().any(|s| {
            if s.touches(a) || s.touches(b) {
                return false;
            }
            match (self.position(s.a), self.position(s.b)) {
                (Some(sa), Some(sb)) => segments_cross(pa, pb, sa, sb),
                _ => false,
            }
        })
    }

    /// Add a segment and return its index.
    ///
    /// Callers are responsible for the planarity and uniqueness checks.
    pub fn add_segment(&mut self, a: usize, b: usize, minutes: u32) -> usize {
        let index = self.segments.len();
        self.segments.push(Segment { a, b, minutes });
        if let Some(list) = self.incidence.get_mut(a) {
            list.push(index);
        }
        if let Some(list) = self.incidence.get_mut(b) {
            list.push(index);
        }
        index
    }

    /// Whether every node can reach every other node.
    pub fn is_connected(&self) -> bool {
        let n = self.node_count();
        if n == 0 {
            return true;
        }
        let mut seen = vec![false; n];
        let mut stack = vec![0_usize];
        if let Some(first) = seen.first_mut() {
            *first = true;
        }
        let mut reached = 1_usize;
        while let Some(node) = stack.pop() {
            for &s in self.incident(node) {
                let Some(next) = self.segments.get(s).and_then(|seg| seg.other_end(node)) else {
                    continue;
                };
                if let Some(flag) = seen.get_mut(next) {
                    if !*flag {
                        *flag = true;
                        reached = reached.saturating_add(1);
                        stack.push(next);
                    }
                }
            }
        }
        reached == n
    }
}

/// Disjoint-set forest with path halving and union by rank.
#[derive(Debug, Clone)]
struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while let Some(&p) = self.parent.get(x) {
            if p == x {
                break;
            }
            let grandparent = self.parent.get(p).copied().unwrap_or(p);
            if let Some(slot) = self.parent.get_mut(x) {
                *slot = grandparent;
            }
            x = grandparent;
        }
        x
    }

    /// Merge the sets of `a` and `b`; `false` if they were already one set.
    fn union(&mut self, a: usize, b: usize) -> bool {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return false;
        }
        let rank_a = self.rank.get(ra).copied().unwrap_or(0);
        let rank_b = self.rank.get(rb).copied().unwrap_or(0);
        let (child, root) = if rank_a < rank_b { (ra, rb) } else { (rb, ra) };
        if let Some(slot) = self.parent.get_mut(child) {
            *slot = root;
        }
        if rank_a == rank_b {
            if let Some(r) = self.rank.get_mut(root) {
                *r = r.saturating_add(1);
            }
        }
        true
    }
}

fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        values.get(mid).copied()
    } else {
        let lo = values.get(mid.saturating_sub(1))?;
        let hi = values.get(mid)?;
        Some((lo + hi) / 2.0)
    }
}

/// Build a connected, non-self-crossing street graph over `positions`.
///
/// Randomness is consumed in a fixed order: one travel time per tree edge in
/// Kruskal order, then per node one roll for its candidate count followed by
/// one travel time per accepted supplementary street.
pub fn build_planar_graph(positions: Vec<Point>, density: f64, rng: &mut impl Rng) -> RoadGraph {
    let mut graph = RoadGraph::new(positions);
    let n = graph.node_count();

    let mut pairs: Vec<(f64, usize, usize)> = Vec::new();
    for i in 0..n {
        for j in (i + 1)..n {
            if let (Some(pi), Some(pj)) = (graph.position(i), graph.position(j)) {
                pairs.push((pi.distance(pj), i, j));
            }
        }
    }
    pairs.sort_by(|x, y| x.0.total_cmp(&y.0).then(x.1.cmp(&y.1)).then(x.2.cmp(&y.2)));

    let mut forest = UnionFind::new(n);
    let mut tree_lengths = Vec::with_capacity(n.saturating_sub(1));
    for &(length, i, j) in &pairs {
        if forest.union(i, j) {
            let minutes = rng.random_range(MIN_MINUTES..=MAX_MINUTES);
            graph.add_segment(i, j, minutes);
            tree_lengths.push(length);
            if tree_lengths.len() + 1 == n {
                break;
            }
        }
    }

    let Some(median_length) = median(&mut tree_lengths) else {
        tracing::debug!(nodes = n, "no tree edges, skipping supplementary streets");
        return graph;
    };
    let cap = median_length * LOCALITY_FACTOR;
    let three_candidates = 0.5_f64.mul_add(density.clamp(0.0, 1.0), 0.25);

    let mut supplementary = 0_usize;
    for i in 0..n {
        let wanted = if rng.random_bool(three_candidates) { 3 } else { 2 };
        let Some(origin) = graph.position(i) else {
            continue;
        };
        let mut nearest: Vec<(f64, usize)> = (0..n)
            .filter(|&j| j != i)
            .filter_map(|j| graph.position(j).map(|p| (origin.distance(p), j)))
            .collect();
        nearest.sort_by(|x, y| x.0.total_cmp(&y.0).then(x.1.cmp(&y.1)));

        for &(length, j) in nearest.iter().take(wanted) {
            if length > cap || graph.are_connected(i, j) || graph.crosses_existing(i, j) {
                continue;
            }
            let minutes = rng.random_range(MIN_MINUTES..=MAX_MINUTES);
            graph.add_segment(i, j, minutes);
            supplementary = supplementary.saturating_add(1);
        }
    }

    tracing::debug!(
        nodes = n,
        tree_edges = tree_lengths.len(),
        supplementary,
        locality_cap = cap,
        "street graph built"
    );
    graph
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::layout::grid_layout;

    fn no_crossings(graph: &RoadGraph) -> bool {
        let segs = graph.segments();
        for (i, s) in segs.iter().enumerate() {
            for t in segs.iter().skip(i + 1) {
                if s.touches(t.a) || s.touches(t.b) {
                    continue;
                }
                let (Some(a), Some(b), Some(c), Some(d)) = (
                    graph.position(s.a),
                    graph.position(s.b),
                    graph.position(t.a),
                    graph.position(t.b),
                ) else {
                    return false;
                };
                if segments_cross(a, b, c, d) {
                    return false;
                }
            }
        }
        true
    }

    #[test]
    fn union_find_merges_once() {
        let mut uf = UnionFind::new(4);
        assert!(uf.union(0, 1));
        assert!(uf.union(2, 3));
        assert!(!uf.union(1, 0));
        assert!(uf.union(1, 3));
        assert_eq!(uf.find(0), uf.find(2));
    }

    #[test]
    fn median_of_even_and_odd() {
        assert_eq!(median(&mut []), None);
        assert_eq!(median(&mut [3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&mut [4.0, 1.0, 2.0, 3.0]), Some(2.5));
    }

    #[test]
    fn two_nodes_give_one_street() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let graph = build_planar_graph(
            vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)],
            0.5,
            &mut rng,
        );
        assert_eq!(graph.segments().len(), 1);
        assert!(graph.is_connected());
        let minutes = graph.segments().first().map_or(0, |s| s.minutes);
        assert!((MIN_MINUTES..=MAX_MINUTES).contains(&minutes));
    }

    #[test]
    fn single_node_has_no_streets() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let graph = build_planar_graph(vec![Point::new(5.0, 5.0)], 0.5, &mut rng);
        assert!(graph.segments().is_empty());
        assert!(graph.is_connected());
    }

    #[test]
    fn generated_graphs_are_connected_and_planar() {
        for seed in 0..25 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let positions = grid_layout(20, 1000.0, 800.0, &mut rng);
            let density = (seed % 5) as f64 / 4.0;
            let graph = build_planar_graph(positions, density, &mut rng);
            assert!(graph.is_connected(), "seed {seed} disconnected");
            assert!(no_crossings(&graph), "seed {seed} has crossing streets");
            assert!(graph.segments().len() >= 19);
        }
    }

    #[test]
    fn no_duplicate_segments() {
        let mut rng = ChaCha8Rng::seed_from_u64(77);
        let positions = grid_layout(16, 800.0, 800.0, &mut rng);
        let graph = build_planar_graph(positions, 1.0, &mut rng);
        let mut seen = std::collections::BTreeSet::new();
        for s in graph.segments() {
            assert!(seen.insert((s.a.min(s.b), s.a.max(s.b))));
        }
    }
}
