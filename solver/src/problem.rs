//! Problem data: the tolled network and the commodities routed through it.

use anyhow::ensure;
use hashbrown::HashMap;

use crate::graph::LightGraph;

/// One unit of demand to route from an origin to a destination.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Commodity {
    pub origin: usize,
    pub destination: usize,
    pub demand: f64,
}

/// A directed arc of the network. Arcs are identified by their insertion
/// index; tolled arcs additionally carry a dense index into `0..A1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arc {
    pub src: usize,
    pub dst: usize,
    pub cost: f64,
    pub tolled: bool,
}

/// The network pricing instance, immutable during a solve.
///
/// `big_m[k][a1]` and `big_n[a1]` cap the toll that can profitably be charged
/// on a tolled arc (per commodity, and over all commodities). They can be
/// computed from the graph with [`Problem::compute_caps`] or supplied
/// directly when an external preprocessor already knows them.
#[derive(Debug, Clone)]
pub struct Problem {
    pub num_verts: usize,
    pub arcs: Vec<Arc>,
    pub commodities: Vec<Commodity>,

    /// Tolled index `a1` of each arc, `None` for toll-free arcs.
    tolled_index: Vec<Option<usize>>,
    /// Arc index of each tolled arc, by tolled index.
    tolled_arcs: Vec<usize>,
    /// `(src, dst)` to arc index.
    index: HashMap<(usize, usize), usize>,

    pub big_m: Vec<Vec<f64>>,
    pub big_n: Vec<f64>,
}

impl Problem {
    pub fn new(num_verts: usize, arcs: Vec<Arc>, commodities: Vec<Commodity>) -> Self {
        let mut tolled_index = Vec::with_capacity(arcs.len());
        let mut tolled_arcs = Vec::new();
        let mut index = HashMap::with_capacity(arcs.len());
        for (a, arc) in arcs.iter().enumerate() {
            if arc.tolled {
                tolled_index.push(Some(tolled_arcs.len()));
                tolled_arcs.push(a);
            } else {
                tolled_index.push(None);
            }
            index.insert((arc.src, arc.dst), a);
        }
        let num_tolled = tolled_arcs.len();
        Problem {
            num_verts,
            arcs,
            commodities,
            tolled_index,
            tolled_arcs,
            index,
            big_m: vec![],
            big_n: vec![0.0; num_tolled],
        }
    }

    pub fn num_arcs(&self) -> usize {
        self.arcs.len()
    }

    pub fn num_tolled(&self) -> usize {
        self.tolled_arcs.len()
    }

    pub fn num_commodities(&self) -> usize {
        self.commodities.len()
    }

    /// Tolled index of arc `a`, if it is tolled.
    pub fn a1_of(&self, a: usize) -> Option<usize> {
        self.tolled_index[a]
    }

    /// Arc index of the tolled arc `a1`.
    pub fn arc_of_a1(&self, a1: usize) -> usize {
        self.tolled_arcs[a1]
    }

    pub fn arc_index(&self, src: usize, dst: usize) -> Option<usize> {
        self.index.get(&(src, dst)).copied()
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        for (a, arc) in self.arcs.iter().enumerate() {
            ensure!(
                arc.src < self.num_verts && arc.dst < self.num_verts,
                "arc {} ({} -> {}) has an endpoint outside 0..{}",
                a,
                arc.src,
                arc.dst,
                self.num_verts
            );
            ensure!(arc.src != arc.dst, "arc {} is a self-loop", a);
            ensure!(arc.cost >= 0.0, "arc {} has negative cost", a);
        }
        for (k, c) in self.commodities.iter().enumerate() {
            ensure!(
                c.origin < self.num_verts && c.destination < self.num_verts,
                "commodity {} has an endpoint outside 0..{}",
                k,
                self.num_verts
            );
            ensure!(c.demand > 0.0, "commodity {} has nonpositive demand", k);
        }
        Ok(())
    }

    /// Set the toll caps directly (tests, external preprocessing).
    pub fn set_caps(&mut self, big_m: Vec<Vec<f64>>, big_n: Vec<f64>) {
        debug_assert_eq!(big_n.len(), self.num_tolled());
        self.big_m = big_m;
        self.big_n = big_n;
    }

    /// Compute `big_m` / `big_n` from shortest-path differences.
    ///
    /// For a tolled arc `a = (i, j)` with cost `c` and a commodity `(o, d)`,
    /// the cap is `max(0, min(m1, m2, m3, m4))` where `tf` are distances in
    /// the toll-free subgraph and `nt` distances in the full graph with zero
    /// tolls:
    ///
    /// * `m1 = tf(i -> j) - c`
    /// * `m2 = tf(o -> j) - nt(o -> i) - c`
    /// * `m3 = tf(i -> d) - c - nt(j -> d)`
    /// * `m4 = tf(o -> d) - nt(o -> i) - c - nt(j -> d)`
    ///
    /// `big_n[a1]` is the maximum of `big_m[k][a1]` over all commodities.
    pub fn compute_caps(&mut self) {
        let k_count = self.num_commodities();
        let a1_count = self.num_tolled();

        let mut graph = LightGraph::from_problem(self);

        // Origin-rooted labels in both graphs.
        let nulltoll_o: Vec<Vec<f64>> = self
            .commodities
            .iter()
            .map(|c| graph.price_from_src(c.origin))
            .collect();
        graph.set_toll_arcs_enabled(false);
        let tollfree_o: Vec<Vec<f64>> = self
            .commodities
            .iter()
            .map(|c| graph.price_from_src(c.origin))
            .collect();
        graph.set_toll_arcs_enabled(true);

        self.big_m = vec![vec![0.0; a1_count]; k_count];
        self.big_n = vec![0.0; a1_count];

        for a1 in 0..a1_count {
            let arc = self.arcs[self.arc_of_a1(a1)];
            let (i, j, c) = (arc.src, arc.dst, arc.cost);

            let nulltoll_j = graph.price_from_src(j);
            graph.set_toll_arcs_enabled(false);
            let tollfree_i = graph.price_from_src(i);
            graph.set_toll_arcs_enabled(true);

            for k in 0..k_count {
                let o = self.commodities[k].origin;
                let d = self.commodities[k].destination;

                let m1 = tollfree_i[j] - c;
                let m2 = tollfree_o[k][j] - nulltoll_o[k][i] - c;
                let m3 = tollfree_i[d] - c - nulltoll_j[d];
                let m4 = tollfree_o[k][d] - nulltoll_o[k][i] - c - nulltoll_j[d];

                let m = m1.min(m2).min(m3).min(m4).max(0.0);
                self.big_m[k][a1] = m;
                if m > self.big_n[a1] {
                    self.big_n[a1] = m;
                }
            }
        }
    }

    /// Upper bound on the revenue: each commodity pays at most the margin
    /// between its toll-free and its free-ride shortest path.
    pub fn objective_upper_bound(&self) -> f64 {
        let mut graph = LightGraph::from_problem(self);
        let mut sum = 0.0;
        for c in &self.commodities {
            let nulltoll = graph.price_from_src(c.origin)[c.destination];
            graph.set_toll_arcs_enabled(false);
            let tollfree = graph.price_from_src(c.origin)[c.destination];
            graph.set_toll_arcs_enabled(true);
            sum += (tollfree - nulltoll) * c.demand;
        }
        sum
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arc(src: usize, dst: usize, cost: f64, tolled: bool) -> Arc {
        Arc { src, dst, cost, tolled }
    }

    /// A tolled arc 0 -> 1 of cost 2 against a toll-free detour 0 -> 2 -> 1
    /// of cost 10. The margin on the tolled arc is 8.
    #[test]
    fn caps_against_a_detour() {
        let mut prob = Problem::new(
            3,
            vec![
                arc(0, 1, 2.0, true),
                arc(0, 2, 4.0, false),
                arc(2, 1, 6.0, false),
            ],
            vec![Commodity { origin: 0, destination: 1, demand: 1.0 }],
        );
        prob.compute_caps();
        assert_eq!(prob.big_m, vec![vec![8.0]]);
        assert_eq!(prob.big_n, vec![8.0]);
    }

    #[test]
    fn caps_take_the_tightest_detour() {
        // 0 -> 1 tolled (cost 0), toll-free detour 0 -> 2 -> 1 of cost 6,
        // commodity 0 -> 3 must then cross 1 -> 3.
        let mut prob = Problem::new(
            4,
            vec![
                arc(0, 1, 0.0, true),
                arc(0, 2, 1.0, false),
                arc(2, 1, 5.0, false),
                arc(1, 3, 1.0, false),
            ],
            vec![Commodity { origin: 0, destination: 3, demand: 2.0 }],
        );
        prob.compute_caps();
        // tf(0 -> 1) = 6, nt(0 -> 0) = 0, cost = 0: every m_i equals 6.
        assert_eq!(prob.big_m, vec![vec![6.0]]);
        assert_eq!(prob.big_n, vec![6.0]);
        assert!((prob.objective_upper_bound() - 12.0).abs() < 1e-9);
    }

    #[test]
    fn validate_rejects_bad_instances() {
        let prob = Problem::new(
            2,
            vec![arc(0, 5, 1.0, false)],
            vec![Commodity { origin: 0, destination: 1, demand: 1.0 }],
        );
        assert!(prob.validate().is_err());

        let prob = Problem::new(
            2,
            vec![arc(0, 1, 1.0, false)],
            vec![Commodity { origin: 0, destination: 1, demand: 0.0 }],
        );
        assert!(prob.validate().is_err());
    }
}
