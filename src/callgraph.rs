use std::collections::BTreeSet;

use indexmap::IndexSet;
use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::types::MethodSignature;

/// Context-insensitive call graph: one node per method, deduplicated edges.
///
/// Methods are interned into dense ids on first sight, so edge sets only hold
/// integers. The graph only grows; there is no removal.
#[derive(Clone, Debug, Default)]
pub struct CallGraph {
    methods: IndexSet<MethodSignature>,
    callees: Vec<IndexSet<usize>>,
    callers: Vec<IndexSet<usize>>,
    edge_count: usize,
}

impl CallGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `method` as contained even without edges. Returns its node id.
    pub fn add_method(&mut self, method: &MethodSignature) -> usize {
        if let Some(id) = self.methods.get_index_of(method) {
            return id;
        }
        let (id, _) = self.methods.insert_full(method.clone());
        self.callees.push(IndexSet::new());
        self.callers.push(IndexSet::new());
        id
    }

    /// Adds a call edge, marking both endpoints as contained. Returns whether it was new.
    pub fn add_call(&mut self, caller: &MethodSignature, callee: &MethodSignature) -> bool {
        let from = self.add_method(caller);
        let to = self.add_method(callee);
        if !self.callees[from].insert(to) {
            return false;
        }
        self.callers[to].insert(from);
        self.edge_count += 1;
        true
    }

    pub fn contains_method(&self, method: &MethodSignature) -> bool {
        self.methods.contains(method)
    }

    pub fn contains_call(&self, caller: &MethodSignature, callee: &MethodSignature) -> bool {
        match (
            self.methods.get_index_of(caller),
            self.methods.get_index_of(callee),
        ) {
            (Some(from), Some(to)) => self.callees[from].contains(&to),
            _ => false,
        }
    }

    /// Methods called from `method`; empty if it is not contained.
    pub fn calls_from(&self, method: &MethodSignature) -> BTreeSet<&MethodSignature> {
        self.neighbors(method, &self.callees)
    }

    /// Methods calling `method`; empty if it is not contained.
    pub fn calls_to(&self, method: &MethodSignature) -> BTreeSet<&MethodSignature> {
        self.neighbors(method, &self.callers)
    }

    fn neighbors<'g>(
        &'g self,
        method: &MethodSignature,
        adjacency: &'g [IndexSet<usize>],
    ) -> BTreeSet<&'g MethodSignature> {
        let Some(id) = self.methods.get_index_of(method) else {
            return BTreeSet::new();
        };
        adjacency[id]
            .iter()
            .filter_map(|other| self.methods.get_index(*other))
            .collect()
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodSignature> {
        self.methods.iter()
    }

    /// Edges as (caller, callee) pairs, in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (&MethodSignature, &MethodSignature)> {
        self.callees.iter().enumerate().flat_map(move |(from, targets)| {
            targets
                .iter()
                .map(move |to| (&self.methods[from], &self.methods[*to]))
        })
    }

    pub fn method_count(&self) -> usize {
        self.methods.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Whether every method and edge of `self` is also in `other`.
    pub fn is_subgraph_of(&self, other: &CallGraph) -> bool {
        self.methods().all(|method| other.contains_method(method))
            && self
                .edges()
                .all(|(caller, callee)| other.contains_call(caller, callee))
    }
}

#[derive(serde::Serialize)]
struct EdgeRecord<'g> {
    caller: &'g MethodSignature,
    callee: &'g MethodSignature,
}

impl Serialize for CallGraph {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let methods: BTreeSet<&MethodSignature> = self.methods().collect();
        let edges: BTreeSet<(&MethodSignature, &MethodSignature)> = self.edges().collect();
        let edges: Vec<EdgeRecord<'_>> = edges
            .into_iter()
            .map(|(caller, callee)| EdgeRecord { caller, callee })
            .collect();

        let mut state = serializer.serialize_struct("CallGraph", 2)?;
        state.serialize_field("methods", &methods)?;
        state.serialize_field("edges", &edges)?;
        state.end()
    }
}
