use std::collections::{BTreeSet, HashSet, VecDeque};

use tracing::{debug, trace, warn};

use crate::callgraph::CallGraph;
use crate::config::{AnalysisConfig, ResolutionPolicy, WorklistOrder};
use crate::error::{CallGraphError, CallGraphResult};
use crate::hierarchy::{ClassLookup, TypeHierarchy};
use crate::ir::CallSite;
use crate::types::{MethodSignature, Type};

pub mod cha;
pub mod points_to;
pub mod rta;

pub use cha::ClassHierarchyAnalysis;
pub use points_to::{MethodAllocationOracle, PointsToOracle, PointsToRefinedRta, StaticPointsTo};
pub use rta::RapidTypeAnalysis;

/// Read-only inputs shared by one analysis run.
#[derive(Clone, Copy)]
pub struct AnalysisContext<'a> {
    pub hierarchy: &'a dyn TypeHierarchy,
    pub classes: &'a dyn ClassLookup,
    pub config: AnalysisConfig,
}

impl<'a> AnalysisContext<'a> {
    pub fn new(
        hierarchy: &'a dyn TypeHierarchy,
        classes: &'a dyn ClassLookup,
        config: AnalysisConfig,
    ) -> Self {
        Self {
            hierarchy,
            classes,
            config,
        }
    }

    /// Applies the resolution policy to the outcome of resolving `site`.
    ///
    /// `Ok(None)` means the call site is dropped.
    pub(crate) fn tolerate<T>(
        &self,
        site: &CallSite,
        result: CallGraphResult<T>,
    ) -> CallGraphResult<Option<T>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(err)
                if self.config.resolution == ResolutionPolicy::Lenient && err.is_recoverable() =>
            {
                warn!(
                    caller = %site.caller,
                    target = %site.target,
                    offset = site.offset,
                    error = %err,
                    "dropping unresolved call site"
                );
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}

/// Metadata describing a call graph algorithm.
#[derive(Clone, Debug)]
pub struct AlgorithmMetadata {
    pub id: &'static str,
    pub name: &'static str,
}

/// A call graph construction algorithm.
pub trait CallGraphAlgorithm {
    fn metadata(&self) -> AlgorithmMetadata;

    fn context(&self) -> AnalysisContext<'_>;

    /// Builds the call graph reachable from `entry_points`.
    fn build(&mut self, entry_points: &[MethodSignature]) -> CallGraphResult<CallGraph>;

    /// Builds the call graph reachable from the program's single `main` method.
    fn build_from_main(&mut self) -> CallGraphResult<CallGraph> {
        let main = find_main_method(self.context().classes)?;
        self.build(&[main])
    }
}

/// Finds the unique `public static void main(java.lang.String[])` method.
pub fn find_main_method(classes: &dyn ClassLookup) -> CallGraphResult<MethodSignature> {
    let main_parameters = [Type::Array(Box::new(Type::class("java.lang.String")))];
    let mut candidates: Vec<MethodSignature> = classes
        .classes()
        .flat_map(|class| class.methods.iter())
        .filter(|method| {
            let signature = &method.signature;
            method.access.is_static
                && method.access.is_public
                && signature.name() == "main"
                && signature.return_type() == &Type::Void
                && signature.parameter_types() == main_parameters
        })
        .map(|method| method.signature.clone())
        .collect();
    candidates.sort();

    if candidates.len() == 1 {
        Ok(candidates.remove(0))
    } else {
        Err(CallGraphError::EntryPointNotFound { candidates })
    }
}

/// Reachable-method frontier together with the graph being built.
///
/// Every method is handed out at most once.
pub(crate) struct Frontier {
    graph: CallGraph,
    queue: VecDeque<MethodSignature>,
    visited: HashSet<MethodSignature>,
    order: WorklistOrder,
}

impl Frontier {
    fn new(order: WorklistOrder) -> Self {
        Self {
            graph: CallGraph::new(),
            queue: VecDeque::new(),
            visited: HashSet::new(),
            order,
        }
    }

    fn seed(&mut self, method: &MethodSignature) {
        self.graph.add_method(method);
        self.enqueue(method);
    }

    fn pop(&mut self) -> Option<MethodSignature> {
        match self.order {
            WorklistOrder::Fifo => self.queue.pop_front(),
            WorklistOrder::Lifo => self.queue.pop_back(),
        }
    }

    fn enqueue(&mut self, method: &MethodSignature) {
        if self.visited.insert(method.clone()) {
            self.queue.push_back(method.clone());
        }
    }

    /// Records an edge and schedules the callee if it has not been seen yet.
    pub(crate) fn add_call(&mut self, caller: &MethodSignature, callee: &MethodSignature) {
        self.graph.add_call(caller, callee);
        self.enqueue(callee);
    }

    fn into_graph(self) -> CallGraph {
        self.graph
    }
}

/// Per-algorithm dispatch policy plugged into the shared worklist loop.
pub(crate) trait Dispatcher {
    /// Runs before the call sites of `method` are resolved.
    fn pre_process_method(
        &mut self,
        _context: &AnalysisContext<'_>,
        _method: &MethodSignature,
        _frontier: &mut Frontier,
    ) -> CallGraphResult<()> {
        Ok(())
    }

    /// Targets of one call site.
    fn resolve_call(
        &mut self,
        context: &AnalysisContext<'_>,
        site: &CallSite,
    ) -> CallGraphResult<BTreeSet<MethodSignature>>;
}

/// Worklist loop shared by all algorithms: pop a method, resolve each of its
/// call sites, add edges and schedule unseen targets until nothing is left.
pub(crate) fn construct_call_graph(
    context: &AnalysisContext<'_>,
    entry_points: &[MethodSignature],
    dispatcher: &mut dyn Dispatcher,
) -> CallGraphResult<CallGraph> {
    let mut frontier = Frontier::new(context.config.worklist_order);
    for entry_point in entry_points {
        frontier.seed(entry_point);
    }

    while let Some(method) = frontier.pop() {
        trace!(%method, "processing method");
        dispatcher.pre_process_method(context, &method, &mut frontier)?;
        for site in context.classes.call_sites(&method) {
            let resolved = dispatcher.resolve_call(context, &site);
            let Some(targets) = context.tolerate(&site, resolved)? else {
                continue;
            };
            for target in &targets {
                frontier.add_call(&method, target);
            }
        }
    }

    let graph = frontier.into_graph();
    debug!(
        methods = graph.method_count(),
        edges = graph.edge_count(),
        "call graph constructed"
    );
    Ok(graph)
}
