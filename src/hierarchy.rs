//! Read-only views of the analyzed program consumed by dispatch resolution
//! and the call graph algorithms.

use std::collections::BTreeSet;

use crate::error::{CallGraphError, CallGraphResult};
use crate::ir::{CallSite, Class, Method};
use crate::types::{ClassType, MethodSignature, Type};

/// Subtype and superclass queries over declared classes.
pub trait TypeHierarchy {
    /// All proper subtypes (transitively, including implementers of interfaces).
    fn subtypes_of(&self, ty: &ClassType) -> BTreeSet<ClassType>;

    /// Declared superclass, `None` for `java.lang.Object`, interfaces and unknown classes.
    fn super_class_of(&self, ty: &ClassType) -> Option<ClassType>;

    /// Whether `sub` is a proper subtype of `sup`. Never true for equal types.
    fn is_subtype(&self, sub: &Type, sup: &Type) -> bool;
}

/// Class declarations and method bodies.
pub trait ClassLookup {
    fn class(&self, ty: &ClassType) -> Option<&Class>;

    fn classes(&self) -> Box<dyn Iterator<Item = &Class> + '_>;

    fn resolve_class(&self, ty: &ClassType) -> CallGraphResult<&Class> {
        self.class(ty).ok_or_else(|| CallGraphError::ClassResolution { class: ty.clone() })
    }

    fn method(&self, signature: &MethodSignature) -> Option<&Method> {
        self.class(signature.declaring_class())?.method(signature)
    }

    /// Call sites of a method body; empty for phantom, abstract and native methods.
    fn call_sites(&self, signature: &MethodSignature) -> Vec<CallSite> {
        self.method(signature)
            .map(Method::call_sites)
            .unwrap_or_default()
    }

    fn allocation_sites(&self, signature: &MethodSignature) -> BTreeSet<ClassType> {
        self.method(signature)
            .map(Method::allocated_classes)
            .unwrap_or_default()
    }
}
