use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeSet, BinaryHeap};

use hashbrown::{HashMap, HashSet};

use super::PathUnreachable;
use crate::problem::Problem;

/// A path as the ordered sequence of visited vertices.
pub type Path = Vec<usize>;

#[derive(Debug, Clone, Copy)]
pub struct LightEdge {
    pub src: usize,
    pub dst: usize,
    pub cost: f64,
    /// Toll overlay, added to `cost` in shortest-path computations.
    pub toll: f64,
    pub is_tolled: bool,
    /// Persistent mask, flipped by branching decisions.
    pub enabled: bool,
    /// Scratch mask, only meaningful within one path-enumeration run.
    pub temp_enabled: bool,
}

/// Adjacency-list digraph over `cost + toll` weights.
///
/// An edge takes part in shortest-path computations iff `enabled`,
/// `temp_enabled` and the head vertex's `temp_enabled` all hold. At most one
/// edge exists per `(src, dst)` pair.
#[derive(Debug, Clone)]
pub struct LightGraph {
    num_verts: usize,
    edges: Vec<LightEdge>,
    /// Outgoing edge ids per vertex, in insertion order.
    adj: Vec<Vec<usize>>,
    /// Incoming edge ids per vertex, for the reverse sweep of
    /// [`LightGraph::price_to_dst`].
    radj: Vec<Vec<usize>>,
    index: HashMap<(usize, usize), usize>,
    temp_enabled_v: Vec<bool>,
}

/// Heap key for Dijkstra. Ties on the label break toward the smaller vertex
/// id, which together with insertion-ordered adjacency and strict-improvement
/// relaxation makes every returned path deterministic.
#[derive(PartialEq)]
struct Label {
    dist: f64,
    vertex: usize,
}

impl Eq for Label {}

impl Ord for Label {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dist
            .total_cmp(&other.dist)
            .then_with(|| self.vertex.cmp(&other.vertex))
    }
}

impl PartialOrd for Label {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Candidate entry of the k-shortest-path heap, ordered by `(cost, path)`.
#[derive(PartialEq)]
struct PathCandidate {
    cost: f64,
    path: Path,
}

impl Eq for PathCandidate {}

impl Ord for PathCandidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cost
            .total_cmp(&other.cost)
            .then_with(|| self.path.cmp(&other.path))
    }
}

impl PartialOrd for PathCandidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl LightGraph {
    pub fn new(num_verts: usize) -> Self {
        LightGraph {
            num_verts,
            edges: vec![],
            adj: vec![vec![]; num_verts],
            radj: vec![vec![]; num_verts],
            index: HashMap::new(),
            temp_enabled_v: vec![true; num_verts],
        }
    }

    pub fn from_problem(prob: &Problem) -> Self {
        let mut graph = LightGraph::new(prob.num_verts);
        for arc in &prob.arcs {
            graph.add_edge(arc.src, arc.dst, arc.cost, arc.tolled);
        }
        graph
    }

    /// Adds an edge; the edge id is the insertion index (which matches the
    /// arc index when built through [`LightGraph::from_problem`]).
    pub fn add_edge(&mut self, src: usize, dst: usize, cost: f64, is_tolled: bool) -> usize {
        debug_assert!(src < self.num_verts && dst < self.num_verts);
        debug_assert!(!self.index.contains_key(&(src, dst)));
        let id = self.edges.len();
        self.edges.push(LightEdge {
            src,
            dst,
            cost,
            toll: 0.0,
            is_tolled,
            enabled: true,
            temp_enabled: true,
        });
        self.adj[src].push(id);
        self.radj[dst].push(id);
        self.index.insert((src, dst), id);
        id
    }

    pub fn num_verts(&self) -> usize {
        self.num_verts
    }

    pub fn try_edge(&self, src: usize, dst: usize) -> Option<&LightEdge> {
        self.index.get(&(src, dst)).map(|&id| &self.edges[id])
    }

    /// Panics if no `(src, dst)` edge exists.
    pub fn edge(&self, src: usize, dst: usize) -> &LightEdge {
        &self.edges[self.index[&(src, dst)]]
    }

    /// Panics if no `(src, dst)` edge exists.
    pub fn edge_mut(&mut self, src: usize, dst: usize) -> &mut LightEdge {
        &mut self.edges[self.index[&(src, dst)]]
    }

    pub fn edges(&self) -> impl Iterator<Item = &LightEdge> {
        self.edges.iter()
    }

    pub fn set_toll_arcs_enabled(&mut self, enabled: bool) {
        for edge in self.edges.iter_mut().filter(|e| e.is_tolled) {
            edge.enabled = enabled;
        }
    }

    pub fn clear_temp_states(&mut self) {
        self.temp_enabled_v.fill(true);
        for edge in &mut self.edges {
            edge.temp_enabled = true;
        }
    }

    fn usable(&self, edge: &LightEdge) -> bool {
        edge.enabled && edge.temp_enabled && self.temp_enabled_v[edge.dst]
    }

    /// Dijkstra labels from every vertex reachable from `from`; stops early
    /// once `to` is settled when a target is given.
    fn dijkstra(&self, from: usize, to: Option<usize>, reverse: bool) -> (Vec<f64>, Vec<usize>) {
        let mut dist = vec![f64::INFINITY; self.num_verts];
        let mut parent = vec![usize::MAX; self.num_verts];
        let mut closed = vec![false; self.num_verts];
        let mut heap = BinaryHeap::new();

        dist[from] = 0.0;
        parent[from] = from;
        heap.push(Reverse(Label { dist: 0.0, vertex: from }));

        while let Some(Reverse(Label { vertex, .. })) = heap.pop() {
            if Some(vertex) == to {
                break;
            }
            if closed[vertex] {
                continue;
            }
            let here = dist[vertex];
            let out = if reverse { &self.radj[vertex] } else { &self.adj[vertex] };
            for &id in out {
                let edge = &self.edges[id];
                if reverse {
                    if !(edge.enabled && edge.temp_enabled && self.temp_enabled_v[edge.src]) {
                        continue;
                    }
                } else if !self.usable(edge) {
                    continue;
                }
                let next = if reverse { edge.src } else { edge.dst };
                let cand = here + edge.cost + edge.toll;
                if cand < dist[next] {
                    dist[next] = cand;
                    parent[next] = vertex;
                    heap.push(Reverse(Label { dist: cand, vertex: next }));
                }
            }
            closed[vertex] = true;
        }

        (dist, parent)
    }

    /// Shortest path under `cost + toll`, or `None` when `to` is unreachable
    /// through the currently usable edges.
    pub fn shortest_path(&self, from: usize, to: usize) -> Option<Path> {
        if from == to {
            return Some(vec![from]);
        }
        let (_, parent) = self.dijkstra(from, Some(to), false);
        if parent[to] == usize::MAX {
            return None;
        }
        let mut path = vec![to];
        let mut curr = to;
        while curr != from {
            curr = parent[curr];
            path.push(curr);
        }
        path.reverse();
        Some(path)
    }

    pub fn require_path(&self, from: usize, to: usize) -> Result<Path, PathUnreachable> {
        self.shortest_path(from, to).ok_or(PathUnreachable { from, to })
    }

    /// Cost labels from `src` to every vertex; unreachable vertices carry
    /// `f64::INFINITY`. Never fails.
    pub fn price_from_src(&self, src: usize) -> Vec<f64> {
        self.dijkstra(src, None, false).0
    }

    /// Cost labels from every vertex to `dst`.
    pub fn price_to_dst(&self, dst: usize) -> Vec<f64> {
        self.dijkstra(dst, None, true).0
    }

    pub fn get_path_cost(&self, path: &[usize], include_tolls: bool) -> f64 {
        path.windows(2)
            .map(|w| {
                let edge = self.edge(w[0], w[1]);
                edge.cost + if include_tolls { edge.toll } else { 0.0 }
            })
            .sum()
    }

    /// The tolled `(src, dst)` pairs along `path`, in traversal order.
    pub fn get_toll_list(&self, path: &[usize]) -> Vec<(usize, usize)> {
        path.windows(2)
            .filter(|w| self.edge(w[0], w[1]).is_tolled)
            .map(|w| (w[0], w[1]))
            .collect()
    }

    pub fn get_toll_set(&self, path: &[usize]) -> BTreeSet<(usize, usize)> {
        self.get_toll_list(path).into_iter().collect()
    }

    /// Yen's algorithm. Stops after `k` paths, or earlier when
    /// `toll_free_break` is set and a toll-free path is produced (no follower
    /// ever prefers a path listed after its toll-free fallback).
    pub fn k_shortest_paths(
        &mut self,
        from: usize,
        to: usize,
        k: usize,
        toll_free_break: bool,
    ) -> Vec<Path> {
        self.clear_temp_states();

        let mut found: Vec<Path> = vec![];
        let mut candidates: BinaryHeap<Reverse<PathCandidate>> = BinaryHeap::new();

        match self.shortest_path(from, to) {
            Some(p) => found.push(p),
            None => return found,
        }

        for _ in 1..k {
            let last_path = found.last().cloned().unwrap_or_default();
            let mut root_path_matchable = vec![true; found.len()];

            // Spur from every vertex of the last path except its endpoint.
            for i in 0..last_path.len().saturating_sub(1) {
                let spur_node = last_path[i];
                let root_path = &last_path[..=i];

                // Any found path sharing the root prefix loses its next edge.
                for (j, p) in found.iter().enumerate() {
                    if !root_path_matchable[j] {
                        continue;
                    }
                    if i + 1 < p.len() && p[i] == spur_node {
                        let id = self.index[&(p[i], p[i + 1])];
                        self.edges[id].temp_enabled = false;
                    } else {
                        root_path_matchable[j] = false;
                    }
                }

                // Mask the root path vertices so the spur cannot loop back.
                for &v in root_path {
                    if v != spur_node {
                        self.temp_enabled_v[v] = false;
                    }
                }

                if let Some(spur_path) = self.shortest_path(spur_node, to) {
                    let mut new_path = root_path.to_vec();
                    new_path.extend_from_slice(&spur_path[1..]);
                    let cost = self.get_path_cost(&new_path, true);
                    candidates.push(Reverse(PathCandidate { cost, path: new_path }));
                }

                self.clear_temp_states();
            }

            let best = match candidates.pop() {
                Some(Reverse(best)) => best,
                None => break,
            };
            // Duplicates of the winner are dropped as they surface.
            while candidates
                .peek()
                .is_some_and(|Reverse(c)| c.path == best.path)
            {
                candidates.pop();
            }

            let is_toll_free = toll_free_break && self.get_toll_list(&best.path).is_empty();
            found.push(best.path);
            if is_toll_free {
                break;
            }
        }

        found
    }

    /// K-shortest paths reduced to one representative per toll-arc set,
    /// cut at the first toll-free path.
    pub fn toll_unique_paths(&mut self, from: usize, to: usize, k: usize) -> Vec<Path> {
        let kpaths = self.k_shortest_paths(from, to, k, true);
        let mut visited: HashSet<BTreeSet<(usize, usize)>> = HashSet::new();
        let mut result = vec![];

        for path in kpaths {
            let toll_set = self.get_toll_set(&path);
            // A toll-free path is the commodity's last resort.
            if toll_set.is_empty() {
                result.push(path);
                break;
            }
            if visited.insert(toll_set) {
                result.push(path);
            }
        }

        result
    }

    /// Drops every path whose toll set is a superset of an earlier (cheaper)
    /// path's toll set: no toll vector can make a follower pick it.
    pub fn filter_bilevel_feasible(&self, input: &[Path]) -> Vec<Path> {
        let mut output = vec![];
        let mut visited_sets: Vec<BTreeSet<(usize, usize)>> = vec![];

        for path in input {
            let toll_set = self.get_toll_set(path);
            if toll_set.is_empty() {
                output.push(path.clone());
                break;
            }
            let eliminated = visited_sets.iter().any(|s| toll_set.is_superset(s));
            if !eliminated {
                visited_sets.push(toll_set);
                output.push(path.clone());
            }
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 0 -> 1 -> 3 against 0 -> 2 -> 3, with a direct 0 -> 3.
    fn diamond() -> LightGraph {
        let mut g = LightGraph::new(4);
        g.add_edge(0, 1, 1.0, true);
        g.add_edge(1, 3, 1.0, false);
        g.add_edge(0, 2, 2.0, false);
        g.add_edge(2, 3, 2.0, false);
        g.add_edge(0, 3, 10.0, false);
        g
    }

    #[test]
    fn shortest_path_takes_cheapest_route() {
        let g = diamond();
        assert_eq!(g.shortest_path(0, 3), Some(vec![0, 1, 3]));
        assert_eq!(g.get_path_cost(&[0, 1, 3], true), 2.0);
    }

    #[test]
    fn tolls_reroute_the_shortest_path() {
        let mut g = diamond();
        g.edge_mut(0, 1).toll = 5.0;
        assert_eq!(g.shortest_path(0, 3), Some(vec![0, 2, 3]));
        assert_eq!(g.get_path_cost(&[0, 1, 3], true), 7.0);
        assert_eq!(g.get_path_cost(&[0, 1, 3], false), 2.0);
    }

    #[test]
    fn disabled_edges_are_invisible() {
        let mut g = diamond();
        g.edge_mut(0, 1).enabled = false;
        assert_eq!(g.shortest_path(0, 3), Some(vec![0, 2, 3]));
        g.edge_mut(0, 2).enabled = false;
        assert_eq!(g.shortest_path(0, 3), Some(vec![0, 3]));
        g.edge_mut(0, 3).enabled = false;
        assert_eq!(g.shortest_path(0, 3), None);
        assert!(g.require_path(0, 3).is_err());
    }

    #[test]
    fn equal_cost_ties_are_deterministic() {
        // Two cost-4 routes; the tie must resolve to the smaller vertex id.
        let mut g = LightGraph::new(4);
        g.add_edge(0, 2, 2.0, false);
        g.add_edge(0, 1, 2.0, false);
        g.add_edge(1, 3, 2.0, false);
        g.add_edge(2, 3, 2.0, false);
        assert_eq!(g.shortest_path(0, 3), Some(vec![0, 1, 3]));
    }

    #[test]
    fn price_functions_never_fail() {
        let g = diamond();
        let from0 = g.price_from_src(0);
        assert_eq!(from0, vec![0.0, 1.0, 2.0, 2.0]);
        let to3 = g.price_to_dst(3);
        assert_eq!(to3, vec![2.0, 1.0, 2.0, 0.0]);
        // Vertex 0 has no incoming arc.
        let to0 = g.price_to_dst(0);
        assert_eq!(to0[1], f64::INFINITY);
        assert_eq!(to0[0], 0.0);
    }

    #[test]
    fn toll_arcs_bulk_toggle() {
        let mut g = diamond();
        g.set_toll_arcs_enabled(false);
        assert_eq!(g.shortest_path(0, 3), Some(vec![0, 2, 3]));
        g.set_toll_arcs_enabled(true);
        assert_eq!(g.shortest_path(0, 3), Some(vec![0, 1, 3]));
    }

    #[test]
    fn yen_enumerates_in_cost_order() {
        let mut g = diamond();
        let paths = g.k_shortest_paths(0, 3, 5, false);
        assert_eq!(paths, vec![vec![0, 1, 3], vec![0, 2, 3], vec![0, 3]]);
    }

    #[test]
    fn yen_stops_at_the_first_toll_free_path() {
        let mut g = diamond();
        let paths = g.k_shortest_paths(0, 3, 5, true);
        assert_eq!(paths, vec![vec![0, 1, 3], vec![0, 2, 3]]);
    }

    #[test]
    fn bilevel_filter_drops_dominated_toll_sets() {
        let mut g = LightGraph::new(4);
        g.add_edge(0, 1, 0.0, true);
        g.add_edge(1, 3, 0.0, false);
        g.add_edge(0, 2, 1.0, true);
        g.add_edge(2, 3, 0.0, true);
        g.add_edge(0, 3, 5.0, false);

        // {(0,1)} then a path whose toll set strictly contains it.
        let input = vec![
            vec![0, 1, 3],
            vec![0, 2, 3],
            vec![0, 3],
        ];
        let filtered = g.filter_bilevel_feasible(&input);
        assert_eq!(filtered, input);

        let dominated = vec![vec![0, 1, 3], vec![0, 1, 3], vec![0, 3]];
        let filtered = g.filter_bilevel_feasible(&dominated);
        assert_eq!(filtered, vec![vec![0, 1, 3], vec![0, 3]]);
    }

    #[test]
    fn toll_unique_paths_dedupe_by_toll_set() {
        let mut g = diamond();
        let paths = g.toll_unique_paths(0, 3, 5);
        // One tolled representative, then the toll-free fallback.
        assert_eq!(paths, vec![vec![0, 1, 3], vec![0, 2, 3]]);
    }
}
