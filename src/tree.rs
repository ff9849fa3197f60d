//! Search tree backed by a node arena.
//!
//! Nodes live in one `Vec` owned by the tree and refer to each other by
//! index. Children are owned through the parent's child list; `parent` is a
//! plain back-reference used only to walk up during backpropagation. Nothing
//! is freed individually: the whole arena is dropped with the tree.

use crate::game::Game;

/// Index of a node inside its tree's arena.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One node of the search tree.
#[derive(Clone, Debug)]
pub struct Node<G: Game> {
    /// Simulations that passed through or ended at this node
    pub visits: u32,
    /// Sum of outcomes, from the root-decision side's perspective
    pub reward_sum: f64,
    /// Side to move in `state`
    pub side_to_move: G::Side,
    /// Position after `mv` (the root holds the search's starting position)
    pub state: G,
    /// Move that created this node; `None` for the root
    pub mv: Option<G::Move>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Whether legal replies have been generated
    pub expanded: bool,
}

impl<G: Game> Node<G> {
    fn new(state: G, mv: Option<G::Move>, parent: Option<NodeId>) -> Self {
        Self {
            visits: 0,
            reward_sum: 0.0,
            side_to_move: state.side_to_move(),
            state,
            mv,
            parent,
            children: Vec::new(),
            expanded: false,
        }
    }

    /// Mean outcome, or 0 for an unvisited node.
    #[inline]
    pub fn mean(&self) -> f64 {
        if self.visits > 0 {
            self.reward_sum / self.visits as f64
        } else {
            0.0
        }
    }

    /// UCT score of this node seen from a parent with `parent_visits` visits.
    ///
    /// `maximizing` is false when the side choosing at the parent is not the
    /// root-decision side, which then minimises the stored mean. Unvisited
    /// nodes score infinity.
    #[inline]
    pub fn uct(&self, parent_visits: u32, c: f64, maximizing: bool) -> f64 {
        if self.visits == 0 {
            return f64::INFINITY;
        }
        let exploit = if maximizing { self.mean() } else { -self.mean() };
        let explore = c * ((parent_visits as f64).ln() / self.visits as f64).sqrt();
        exploit + explore
    }

    /// Expanded with no legal reply.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.expanded && self.children.is_empty()
    }
}

/// A search tree for one move decision.
#[derive(Clone, Debug)]
pub struct SearchTree<G: Game> {
    nodes: Vec<Node<G>>,
}

impl<G: Game> SearchTree<G> {
    /// A tree holding only the root position.
    pub fn new(root_state: G) -> Self {
        Self {
            nodes: vec![Node::new(root_state, None, None)],
        }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> &Node<G> {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut Node<G> {
        &mut self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All node ids in allocation order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + use<G> {
        (0..self.nodes.len() as u32).map(NodeId)
    }

    /// Allocate a child of `parent` reached by `mv`.
    pub fn add_child(&mut self, parent: NodeId, mv: G::Move, state: G) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new(state, Some(mv), Some(parent)));
        self.get_mut(parent).children.push(id);
        id
    }

    /// `id` and its ancestors, ending with the root.
    pub fn path_to_root(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = vec![id];
        let mut cur = self.get(id).parent;
        while let Some(p) = cur {
            path.push(p);
            cur = self.get(p).parent;
        }
        path
    }

    /// Distance from the root.
    pub fn depth(&self, id: NodeId) -> usize {
        self.path_to_root(id).len() - 1
    }

    /// Children of `id` as (move, visits) pairs, in child order.
    pub fn child_visits(&self, id: NodeId) -> Vec<(G::Move, u32)> {
        self.get(id)
            .children
            .iter()
            .filter_map(|&c| {
                let child = self.get(c);
                child.mv.map(|mv| (mv, child.visits))
            })
            .collect()
    }
}
