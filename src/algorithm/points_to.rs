use std::collections::{BTreeMap, BTreeSet};

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::algorithm::{
    AlgorithmMetadata, AnalysisContext, CallGraphAlgorithm, ClassHierarchyAnalysis, Dispatcher,
    construct_call_graph,
};
use crate::callgraph::CallGraph;
use crate::dispatch::{resolve_abstract_dispatch_in_classes, resolve_special_dispatch};
use crate::error::CallGraphResult;
use crate::hierarchy::ClassLookup;
use crate::ir::{CallKind, CallSite};
use crate::types::{ClassType, MethodSignature};

/// Precomputed allocation facts, treated as authoritative.
pub trait PointsToOracle {
    /// Classes whose allocation nodes are reachable inside `method`.
    fn allocated_classes_in(&self, method: &MethodSignature) -> BTreeSet<ClassType>;
}

/// Intraprocedural oracle: a method allocates exactly the `new` expressions in its body.
pub struct MethodAllocationOracle<'a> {
    classes: &'a dyn ClassLookup,
}

impl<'a> MethodAllocationOracle<'a> {
    pub fn new(classes: &'a dyn ClassLookup) -> Self {
        Self { classes }
    }
}

impl PointsToOracle for MethodAllocationOracle<'_> {
    fn allocated_classes_in(&self, method: &MethodSignature) -> BTreeSet<ClassType> {
        self.classes.allocation_sites(method)
    }
}

/// Oracle results computed elsewhere and loaded from JSON, keyed by method.
///
/// ```json
/// { "<a.Main: void main(java.lang.String[])>": ["a.Impl"] }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaticPointsTo {
    allocations: BTreeMap<MethodSignature, BTreeSet<ClassType>>,
}

impl StaticPointsTo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, method: MethodSignature, classes: impl IntoIterator<Item = ClassType>) {
        self.allocations.entry(method).or_default().extend(classes);
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

impl PointsToOracle for StaticPointsTo {
    fn allocated_classes_in(&self, method: &MethodSignature) -> BTreeSet<ClassType> {
        self.allocations.get(method).cloned().unwrap_or_default()
    }
}

/// RTA refined by an external points-to oracle.
///
/// Reachability is bounded by a class hierarchy graph: only methods that
/// graph contains contribute allocations, and only their virtual and
/// interface call sites are narrowed. Every allocated class and its direct
/// superclass count as instantiated. The instantiated set is collected from
/// the whole bounding graph before the traversal starts, so one pass is
/// enough and visitation order does not matter.
pub struct PointsToRefinedRta<'a, O: ?Sized> {
    context: AnalysisContext<'a>,
    oracle: &'a O,
    cha_graph: Option<CallGraph>,
    instantiated: IndexSet<ClassType>,
}

impl<'a, O: PointsToOracle + ?Sized> PointsToRefinedRta<'a, O> {
    pub fn new(context: AnalysisContext<'a>, oracle: &'a O) -> Self {
        Self {
            context,
            oracle,
            cha_graph: None,
            instantiated: IndexSet::new(),
        }
    }

    /// Uses a previously computed class hierarchy graph instead of building one.
    pub fn with_cha_graph(mut self, graph: CallGraph) -> Self {
        self.cha_graph = Some(graph);
        self
    }

    pub fn cha_graph(&self) -> Option<&CallGraph> {
        self.cha_graph.as_ref()
    }

    pub fn instantiated_classes(&self) -> &IndexSet<ClassType> {
        &self.instantiated
    }

    fn collect_instantiated(&self, cha_graph: &CallGraph) -> IndexSet<ClassType> {
        let mut instantiated = IndexSet::new();
        for method in cha_graph.methods() {
            for class in self.oracle.allocated_classes_in(method) {
                if let Some(super_class) = self.context.hierarchy.super_class_of(&class) {
                    instantiated.insert(super_class);
                }
                instantiated.insert(class);
            }
        }
        instantiated
    }
}

impl<O: PointsToOracle + ?Sized> CallGraphAlgorithm for PointsToRefinedRta<'_, O> {
    fn metadata(&self) -> AlgorithmMetadata {
        AlgorithmMetadata {
            id: "PTA-RTA",
            name: "Points-to refined rapid type analysis",
        }
    }

    fn context(&self) -> AnalysisContext<'_> {
        self.context
    }

    fn build(&mut self, entry_points: &[MethodSignature]) -> CallGraphResult<CallGraph> {
        let cha_graph = match self.cha_graph.take() {
            Some(graph) => graph,
            None => ClassHierarchyAnalysis::new(self.context).build(entry_points)?,
        };
        let instantiated = self.collect_instantiated(&cha_graph);
        debug!(
            entry_points = entry_points.len(),
            bounding_methods = cha_graph.method_count(),
            instantiated = instantiated.len(),
            "running points-to refined rapid type analysis"
        );

        let mut dispatcher = PointsToDispatcher {
            cha_graph: &cha_graph,
            instantiated: &instantiated,
        };
        let graph = construct_call_graph(&self.context, entry_points, &mut dispatcher)?;

        self.cha_graph = Some(cha_graph);
        self.instantiated = instantiated;
        Ok(graph)
    }
}

struct PointsToDispatcher<'g> {
    cha_graph: &'g CallGraph,
    instantiated: &'g IndexSet<ClassType>,
}

impl Dispatcher for PointsToDispatcher<'_> {
    fn resolve_call(
        &mut self,
        context: &AnalysisContext<'_>,
        site: &CallSite,
    ) -> CallGraphResult<BTreeSet<MethodSignature>> {
        if !self.cha_graph.contains_method(&site.caller) {
            return Ok(BTreeSet::from([site.target.clone()]));
        }
        match site.kind {
            CallKind::Static => Ok(BTreeSet::from([site.target.clone()])),
            CallKind::Special => Ok(BTreeSet::from([resolve_special_dispatch(
                context.hierarchy,
                context.classes,
                &site.target,
                &site.caller,
            )?])),
            CallKind::Virtual | CallKind::Interface => {
                let mut targets = resolve_abstract_dispatch_in_classes(
                    context.hierarchy,
                    context.classes,
                    &site.target,
                    self.instantiated,
                )?;
                targets.insert(site.target.clone());
                Ok(targets)
            }
        }
    }
}
