//! Whole-program call graph construction for JVM programs.
//!
//! Three algorithms share one worklist engine and one dispatch resolver:
//! class hierarchy analysis, rapid type analysis and an RTA variant refined
//! by an external points-to oracle.

pub mod algorithm;
pub mod callgraph;
pub mod classpath;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod hierarchy;
pub mod ir;
pub mod trace;
pub mod types;

#[cfg(test)]
mod test_support;

pub use algorithm::{
    AlgorithmMetadata, AnalysisContext, CallGraphAlgorithm, ClassHierarchyAnalysis,
    MethodAllocationOracle, PointsToOracle, PointsToRefinedRta, RapidTypeAnalysis,
    StaticPointsTo, find_main_method,
};
pub use callgraph::CallGraph;
pub use classpath::ClassPath;
pub use config::{AnalysisConfig, ResolutionPolicy, WorklistOrder};
pub use error::{CallGraphError, CallGraphResult};
pub use hierarchy::{ClassLookup, TypeHierarchy};
pub use types::{ClassType, MethodSignature, Type};
