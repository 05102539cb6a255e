use std::collections::BTreeSet;

use indexmap::IndexSet;
use tracing::debug;

use crate::algorithm::{
    AlgorithmMetadata, AnalysisContext, CallGraphAlgorithm, Dispatcher, Frontier,
    construct_call_graph,
};
use crate::callgraph::CallGraph;
use crate::dispatch::{
    resolve_abstract_dispatch_in_classes, resolve_receiver_dispatch, resolve_special_dispatch,
};
use crate::error::CallGraphResult;
use crate::ir::{CallKind, CallSite};
use crate::types::{ClassType, MethodSignature, Type};

/// Rapid type analysis: a virtual or interface call may only reach overrides
/// in classes allocated somewhere in the reachable program.
///
/// The instantiated set grows while methods are processed. Whenever it does,
/// every virtual and interface call site seen so far is re-resolved against
/// the new classes, so the final graph does not depend on worklist order.
pub struct RapidTypeAnalysis<'a> {
    context: AnalysisContext<'a>,
    instantiated: IndexSet<ClassType>,
}

impl<'a> RapidTypeAnalysis<'a> {
    pub fn new(context: AnalysisContext<'a>) -> Self {
        Self {
            context,
            instantiated: IndexSet::new(),
        }
    }

    /// Classes found allocated by the last run, in discovery order.
    pub fn instantiated_classes(&self) -> &IndexSet<ClassType> {
        &self.instantiated
    }
}

impl CallGraphAlgorithm for RapidTypeAnalysis<'_> {
    fn metadata(&self) -> AlgorithmMetadata {
        AlgorithmMetadata {
            id: "RTA",
            name: "Rapid type analysis",
        }
    }

    fn context(&self) -> AnalysisContext<'_> {
        self.context
    }

    fn build(&mut self, entry_points: &[MethodSignature]) -> CallGraphResult<CallGraph> {
        debug!(entry_points = entry_points.len(), "running rapid type analysis");
        let mut dispatcher = RtaDispatcher::default();
        let graph = construct_call_graph(&self.context, entry_points, &mut dispatcher)?;
        debug!(
            instantiated = dispatcher.instantiated.len(),
            revisited = dispatcher.revisits,
            "rapid type analysis finished"
        );
        self.instantiated = dispatcher.instantiated;
        Ok(graph)
    }
}

#[derive(Default)]
struct RtaDispatcher {
    instantiated: IndexSet<ClassType>,
    /// Every virtual and interface call site resolved so far.
    dynamic_calls: Vec<CallSite>,
    revisits: usize,
}

impl RtaDispatcher {
    /// Overrides `site` may reach when receivers are drawn from `classes`.
    ///
    /// First visits and revisits both go through here, so a call site ends
    /// up with the same targets whichever comes first.
    fn targets_in(
        context: &AnalysisContext<'_>,
        site: &CallSite,
        classes: &IndexSet<ClassType>,
    ) -> CallGraphResult<BTreeSet<MethodSignature>> {
        let mut targets = resolve_abstract_dispatch_in_classes(
            context.hierarchy,
            context.classes,
            &site.target,
            classes,
        )?;
        for class in classes {
            if let Some(target) = Self::receiver_target(context, site, class)? {
                targets.insert(target);
            }
        }
        Ok(targets)
    }

    /// Inherited implementation `site` reaches for receivers of runtime type `class`.
    fn receiver_target(
        context: &AnalysisContext<'_>,
        site: &CallSite,
        class: &ClassType,
    ) -> CallGraphResult<Option<MethodSignature>> {
        // Allocations of classes outside the program are never dispatched through.
        if context.classes.class(class).is_none() {
            return Ok(None);
        }
        let declaring = site.target.declaring_class();
        let compatible = class == declaring
            || context
                .hierarchy
                .is_subtype(&Type::Class(class.clone()), &Type::Class(declaring.clone()));
        if !compatible {
            return Ok(None);
        }
        resolve_receiver_dispatch(context.hierarchy, context.classes, &site.target, class)
    }
}

impl Dispatcher for RtaDispatcher {
    fn pre_process_method(
        &mut self,
        context: &AnalysisContext<'_>,
        method: &MethodSignature,
        frontier: &mut Frontier,
    ) -> CallGraphResult<()> {
        let discovered: IndexSet<ClassType> = context
            .classes
            .allocation_sites(method)
            .into_iter()
            .filter(|class| self.instantiated.insert(class.clone()))
            .collect();
        if discovered.is_empty() {
            return Ok(());
        }
        debug!(
            %method,
            discovered = ?discovered,
            call_sites = self.dynamic_calls.len(),
            "new instantiated classes, revisiting call sites"
        );

        for site in &self.dynamic_calls {
            let resolved = Self::targets_in(context, site, &discovered);
            for target in context.tolerate(site, resolved)?.unwrap_or_default() {
                frontier.add_call(&site.caller, &target);
            }
        }
        self.revisits += self.dynamic_calls.len();
        Ok(())
    }

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
                self.dynamic_calls.push(site.clone());
                let mut targets = Self::targets_in(context, site, &self.instantiated)?;
                targets.insert(site.target.clone());
                Ok(targets)
            }
        }
    }
}
