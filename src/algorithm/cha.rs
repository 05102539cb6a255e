use std::collections::BTreeSet;

use tracing::debug;

use crate::algorithm::{
    AlgorithmMetadata, AnalysisContext, CallGraphAlgorithm, Dispatcher, construct_call_graph,
};
use crate::callgraph::CallGraph;
use crate::dispatch::{resolve_abstract_dispatch, resolve_special_dispatch};
use crate::error::CallGraphResult;
use crate::ir::{CallKind, CallSite};
use crate::types::MethodSignature;

/// Class hierarchy analysis: a virtual or interface call may reach every
/// override declared in any subtype of its static receiver type.
pub struct ClassHierarchyAnalysis<'a> {
    context: AnalysisContext<'a>,
}

impl<'a> ClassHierarchyAnalysis<'a> {
    pub fn new(context: AnalysisContext<'a>) -> Self {
        Self { context }
    }
}

impl CallGraphAlgorithm for ClassHierarchyAnalysis<'_> {
    fn metadata(&self) -> AlgorithmMetadata {
        AlgorithmMetadata {
            id: "CHA",
            name: "Class hierarchy analysis",
        }
    }

    fn context(&self) -> AnalysisContext<'_> {
        self.context
    }

    fn build(&mut self, entry_points: &[MethodSignature]) -> CallGraphResult<CallGraph> {
        debug!(entry_points = entry_points.len(), "running class hierarchy analysis");
        construct_call_graph(&self.context, entry_points, &mut ChaDispatcher)
    }
}

/// Candidate sets never change during a run, so no call site is revisited.
struct ChaDispatcher;

impl Dispatcher for ChaDispatcher {
    fn resolve_call(
        &mut self,
        context: &AnalysisContext<'_>,
        site: &CallSite,
    ) -> CallGraphResult<BTreeSet<MethodSignature>> {
        match site.kind {
            CallKind::Static => Ok(BTreeSet::from([site.target.clone()])),
            CallKind::Special => Ok(BTreeSet::from([resolve_special_dispatch(
                context.hierarchy,
                context.classes,
                &site.target,
                &site.caller,
            )?])),
            CallKind::Virtual | CallKind::Interface => {
                let mut targets =
                    resolve_abstract_dispatch(context.hierarchy, context.classes, &site.target)?;
                targets.insert(site.target.clone());
                Ok(targets)
            }
        }
    }
}
