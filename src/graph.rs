//! A typed DAG substrate: nodes, labeled edges, successors/predecessors,
//! path enumeration, and structural splitting.
//!
//! This module knows nothing about tasks, buffers or GPUs — it is
//! deliberately generic over the node payload, the way the teacher's own
//! `graph::edge::Edge<Graph>` trait separates graph mechanics from the
//! concrete resource types bound into it.

pub type NodeIndex = usize;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Edge {
    source: NodeIndex,
    dest: NodeIndex,
    label: u32,
}

/// A directed acyclic graph over node payloads of type `N`.
///
/// Acyclicity is the caller's responsibility; traversals here assume it and
/// will loop forever over a graph that contains a cycle.
#[derive(Clone, Debug)]
pub struct Graph<N> {
    nodes: Vec<N>,
    edges: Vec<Edge>,
}

impl<N> Default for Graph<N> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }
}

impl<N: Clone> Graph<N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: N) -> NodeIndex {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub fn node(&self, index: NodeIndex) -> &N {
        &self.nodes[index]
    }

    pub fn node_mut(&mut self, index: NodeIndex) -> &mut N {
        &mut self.nodes[index]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> {
        0..self.nodes.len()
    }

    /// Connects `source` to `dest` on input port `label`.
    ///
    /// # Panics
    ///
    /// Panics on a self-loop or a duplicate edge with the same label between
    /// the same pair of nodes.
    pub fn connect(&mut self, source: NodeIndex, dest: NodeIndex, label: u32) {
        assert_ne!(source, dest, "self-loops are not permitted");
        assert!(
            !self.edges.iter().any(|e| e.source == source
                && e.dest == dest
                && e.label == label),
            "duplicate edge with the same label between the same pair of nodes"
        );
        self.edges.push(Edge {
            source,
            dest,
            label,
        });
    }

    /// Successors of `node`, paired with the input-port label of the edge
    /// that connects them.
    pub fn successors(&self, node: NodeIndex) -> Vec<(NodeIndex, u32)> {
        self.edges
            .iter()
            .filter(|e| e.source == node)
            .map(|e| (e.dest, e.label))
            .collect()
    }

    pub fn predecessors(&self, node: NodeIndex) -> Vec<(NodeIndex, u32)> {
        self.edges
            .iter()
            .filter(|e| e.dest == node)
            .map(|e| (e.source, e.label))
            .collect()
    }

    /// Nodes with no predecessors.
    pub fn roots(&self) -> Vec<NodeIndex> {
        self.node_indices()
            .filter(|&n| self.predecessors(n).is_empty())
            .collect()
    }

    /// Nodes with no successors.
    pub fn leaves(&self) -> Vec<NodeIndex> {
        self.node_indices()
            .filter(|&n| self.successors(n).is_empty())
            .collect()
    }

    /// Enumerates maximal simple node sequences whose every node satisfies
    /// `predicate`: a path starts at a node satisfying `predicate` whose
    /// predecessors do not (or which has none), follows successors while
    /// they keep satisfying `predicate` and have exactly one such successor,
    /// and ends when branching or the predicate stops holding.
    pub fn get_paths(&self, predicate: impl Fn(&N) -> bool) -> Vec<Vec<NodeIndex>> {
        let mut paths = Vec::new();

        for start in self.node_indices() {
            if !predicate(self.node(start)) {
                continue;
            }

            let starts_path = self
                .predecessors(start)
                .iter()
                .all(|&(p, _)| !predicate(self.node(p)));

            if !starts_path {
                continue;
            }

            let mut path = vec![start];
            let mut current = start;

            loop {
                let successors = self.successors(current);
                if successors.len() != 1 {
                    break;
                }

                let (next, _) = successors[0];
                if !predicate(self.node(next)) {
                    break;
                }

                // A node with more than one predecessor can't extend a
                // single maximal path; stop here.
                if self.predecessors(next).len() != 1 {
                    break;
                }

                path.push(next);
                current = next;
            }

            paths.push(path);
        }

        paths
    }

    /// Duplicates `path` (new nodes cloned from the originals, new edges
    /// preserving labels) and attaches the duplicate parallel to the
    /// original: the path head's predecessors connect to the duplicate
    /// head (preserving labels), and the duplicate tail connects to the
    /// original tail's successors (preserving labels).
    pub fn split(&mut self, path: &[NodeIndex]) -> Vec<NodeIndex> {
        assert!(!path.is_empty());

        let head = path[0];
        let tail = *path.last().unwrap();

        let new_nodes: Vec<NodeIndex> = path
            .iter()
            .map(|&n| self.add_node(self.node(n).clone()))
            .collect();

        for (i, window) in path.windows(2).enumerate() {
            let original_dest = window[1];
            let label = self
                .successors(window[0])
                .into_iter()
                .find(|&(dest, _)| dest == original_dest)
                .map(|(_, label)| label)
                .unwrap_or(0);
            self.connect(new_nodes[i], new_nodes[i + 1], label);
        }

        for (source, label) in self.predecessors(head) {
            self.connect(source, new_nodes[0], label);
        }

        for (dest, label) in self.successors(tail) {
            self.connect(*new_nodes.last().unwrap(), dest, label);
        }

        new_nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq)]
    struct Label(&'static str);

    #[test]
    fn roots_and_leaves() {
        let mut g: Graph<Label> = Graph::new();
        let a = g.add_node(Label("a"));
        let b = g.add_node(Label("b"));
        g.connect(a, b, 0);
        assert_eq!(g.roots(), vec![a]);
        assert_eq!(g.leaves(), vec![b]);
    }

    #[test]
    fn split_is_noop_shaped_with_one_duplicate() {
        // R -> G1 -> G2 -> S, split with n_gpus=1 performs zero duplicate calls
        // (the scheduler decides how many times to call split); split() itself
        // always produces exactly one duplicate path per call.
        let mut g: Graph<Label> = Graph::new();
        let r = g.add_node(Label("R"));
        let g1 = g.add_node(Label("G1"));
        let g2 = g.add_node(Label("G2"));
        let s = g.add_node(Label("S"));
        g.connect(r, g1, 0);
        g.connect(g1, g2, 0);
        g.connect(g2, s, 0);

        let duplicate = g.split(&[g1, g2]);
        assert_eq!(duplicate.len(), 2);

        // Between R and S there are now exactly two parallel G1->G2 paths.
        let paths = g.get_paths(|l| l.0.starts_with('G'));
        assert_eq!(paths.len(), 2);
        for path in &paths {
            assert_eq!(g.predecessors(path[0]), vec![(r, 0)]);
            assert_eq!(g.successors(*path.last().unwrap()), vec![(s, 0)]);
        }
    }

    #[test]
    fn get_paths_respects_branching() {
        // R -> G1 -> G2 ; R -> G3  (G1,G2,G3 all satisfy predicate)
        let mut g: Graph<Label> = Graph::new();
        let r = g.add_node(Label("R"));
        let g1 = g.add_node(Label("G1"));
        let g2 = g.add_node(Label("G2"));
        let g3 = g.add_node(Label("G3"));
        g.connect(r, g1, 0);
        g.connect(g1, g2, 0);
        g.connect(r, g3, 0);

        let paths = g.get_paths(|l| l.0.starts_with('G'));
        assert_eq!(paths.len(), 2);
        assert!(paths.contains(&vec![g1, g2]));
        assert!(paths.contains(&vec![g3]));
    }
}
