//! Method dispatch resolution.
//!
//! Turns the declared target of a call site into the concrete methods it may
//! invoke, using only declared signatures and the type hierarchy. Every
//! function here is pure apart from read access to the hierarchy and the
//! class declarations.

use std::collections::{BTreeSet, VecDeque};

use indexmap::IndexSet;

use crate::error::{CallGraphError, CallGraphResult};
use crate::hierarchy::{ClassLookup, TypeHierarchy};
use crate::ir::{Class, Method};
use crate::types::{ClassType, MethodSignature, Type};

/// Whether `candidate` may override `called`.
///
/// Precondition: `candidate` is declared in the declaring class of `called`
/// or one of its subtypes. The return type of `candidate` may be narrower.
pub fn matches_override(
    called: &MethodSignature,
    candidate: &MethodSignature,
    hierarchy: &dyn TypeHierarchy,
) -> bool {
    same_name_and_parameters(called, candidate)
        && return_type_fits(candidate.return_type(), called.return_type(), hierarchy)
}

/// Whether `called` may be implemented by the inherited `candidate`.
///
/// Precondition: `candidate` is declared in the declaring class of `called`
/// or one of its supertypes. The return type of `called` may be narrower.
pub fn matches_super(
    called: &MethodSignature,
    candidate: &MethodSignature,
    hierarchy: &dyn TypeHierarchy,
) -> bool {
    same_name_and_parameters(called, candidate)
        && return_type_fits(called.return_type(), candidate.return_type(), hierarchy)
}

fn same_name_and_parameters(called: &MethodSignature, candidate: &MethodSignature) -> bool {
    called.name() == candidate.name() && called.parameter_types() == candidate.parameter_types()
}

fn return_type_fits(narrow: &Type, wide: &Type, hierarchy: &dyn TypeHierarchy) -> bool {
    narrow == wide || hierarchy.is_subtype(narrow, wide)
}

/// Every concrete method system-wide that a virtual or interface call to
/// `called` may reach: non-abstract overrides declared in the declaring class
/// of `called` or any of its subtypes.
pub fn resolve_abstract_dispatch(
    hierarchy: &dyn TypeHierarchy,
    classes: &dyn ClassLookup,
    called: &MethodSignature,
) -> CallGraphResult<BTreeSet<MethodSignature>> {
    collect_overrides(hierarchy, classes, called, |_| true)
}

/// Like [`resolve_abstract_dispatch`], restricted to overrides declared in `allowed` classes.
pub fn resolve_abstract_dispatch_in_classes(
    hierarchy: &dyn TypeHierarchy,
    classes: &dyn ClassLookup,
    called: &MethodSignature,
    allowed: &IndexSet<ClassType>,
) -> CallGraphResult<BTreeSet<MethodSignature>> {
    collect_overrides(hierarchy, classes, called, |class| allowed.contains(class))
}

/// Like [`resolve_abstract_dispatch_in_classes`], but every override outside
/// `allowed` is added to `filtered` instead of being dropped.
pub fn resolve_abstract_dispatch_in_classes_filtered(
    hierarchy: &dyn TypeHierarchy,
    classes: &dyn ClassLookup,
    called: &MethodSignature,
    allowed: &IndexSet<ClassType>,
    filtered: &mut BTreeSet<MethodSignature>,
) -> CallGraphResult<BTreeSet<MethodSignature>> {
    let (kept, dropped): (BTreeSet<_>, BTreeSet<_>) =
        resolve_abstract_dispatch(hierarchy, classes, called)?
            .into_iter()
            .partition(|signature| allowed.contains(signature.declaring_class()));
    filtered.extend(dropped);
    Ok(kept)
}

fn collect_overrides(
    hierarchy: &dyn TypeHierarchy,
    classes: &dyn ClassLookup,
    called: &MethodSignature,
    include: impl Fn(&ClassType) -> bool,
) -> CallGraphResult<BTreeSet<MethodSignature>> {
    let declaring = called.declaring_class();
    let mut targets = BTreeSet::new();

    // A declaring class unknown to the lookup is a phantom; only classes the
    // hierarchy reports must resolve.
    if let Some(class) = classes.class(declaring) {
        if include(declaring) {
            targets.extend(concrete_overrides(class, called, hierarchy));
        }
    }
    for subtype in hierarchy.subtypes_of(declaring) {
        if !include(&subtype) {
            continue;
        }
        let class = classes.resolve_class(&subtype)?;
        targets.extend(concrete_overrides(class, called, hierarchy));
    }
    Ok(targets)
}

fn concrete_overrides<'c>(
    class: &'c Class,
    called: &'c MethodSignature,
    hierarchy: &'c dyn TypeHierarchy,
) -> impl Iterator<Item = MethodSignature> + 'c {
    class
        .methods
        .iter()
        .filter(move |method| matches_override(called, &method.signature, hierarchy))
        .filter(|method| !method.access.is_abstract)
        .map(|method| method.signature.clone())
}

/// The closest concrete definition of `called`, searching its declaring class
/// and then each superclass in turn.
pub fn resolve_concrete_dispatch(
    hierarchy: &dyn TypeHierarchy,
    classes: &dyn ClassLookup,
    called: &MethodSignature,
) -> CallGraphResult<MethodSignature> {
    let mut current = Some(called.declaring_class().clone());
    while let Some(class_type) = current {
        let class = classes.resolve_class(&class_type)?;
        let candidate = class
            .methods
            .iter()
            .find(|method| matches_super(called, &method.signature, hierarchy));
        if let Some(method) = candidate {
            if !method.access.is_abstract {
                return Ok(method.signature.clone());
            }
        }
        current = hierarchy.super_class_of(&class_type);
    }

    Err(CallGraphError::DispatchResolution {
        method: called.clone(),
    })
}

/// Target of an `invokespecial` to `target` appearing in `container`.
///
/// Constructors, private methods and methods of phantom classes bind to
/// themselves. A call into a superclass of the container (`super.m()`) binds
/// to the closest concrete definition from there upwards. Anything else binds
/// to the declared target.
pub fn resolve_special_dispatch(
    hierarchy: &dyn TypeHierarchy,
    classes: &dyn ClassLookup,
    target: &MethodSignature,
    container: &MethodSignature,
) -> CallGraphResult<MethodSignature> {
    if target.is_constructor() {
        return Ok(target.clone());
    }

    let is_private = classes
        .method(target)
        .is_some_and(|method| method.access.is_private);
    if is_private {
        return Ok(target.clone());
    }

    // Nothing to search in a phantom class; the call binds to the declared target.
    if classes.class(target.declaring_class()).is_none() {
        return Ok(target.clone());
    }

    let container_type = Type::Class(container.declaring_class().clone());
    let target_type = Type::Class(target.declaring_class().clone());
    if hierarchy.is_subtype(&container_type, &target_type) {
        return resolve_concrete_dispatch(hierarchy, classes, target);
    }

    Ok(target.clone())
}

/// The method a virtual or interface call to `called` executes when the
/// receiver's runtime class is `receiver`, as far as it is declared at or
/// below the declaring class of `called`.
///
/// Walks up the superclass chain from `receiver` while still inside the
/// subtree of the declaring class, then falls back to default methods of
/// interfaces in that subtree. Returns `None` for abstract or interface
/// receivers, for receivers outside the subtree and when nothing matches.
pub fn resolve_receiver_dispatch(
    hierarchy: &dyn TypeHierarchy,
    classes: &dyn ClassLookup,
    called: &MethodSignature,
    receiver: &ClassType,
) -> CallGraphResult<Option<MethodSignature>> {
    let receiver_class = classes.resolve_class(receiver)?;
    if !receiver_class.is_instantiable() {
        return Ok(None);
    }

    let mut current = Some(receiver.clone());
    while let Some(class_type) = current {
        if !is_at_or_below(hierarchy, &class_type, called.declaring_class()) {
            break;
        }
        let class = classes.resolve_class(&class_type)?;
        let candidate = class
            .methods
            .iter()
            .find(|method| matches_override(called, &method.signature, hierarchy));
        if let Some(method) = candidate {
            if !method.access.is_abstract {
                return Ok(Some(method.signature.clone()));
            }
        }
        current = hierarchy.super_class_of(&class_type);
    }

    Ok(default_method(hierarchy, classes, called, receiver_class))
}

fn is_at_or_below(hierarchy: &dyn TypeHierarchy, ty: &ClassType, ancestor: &ClassType) -> bool {
    ty == ancestor
        || hierarchy.is_subtype(&Type::Class(ty.clone()), &Type::Class(ancestor.clone()))
}

fn default_method(
    hierarchy: &dyn TypeHierarchy,
    classes: &dyn ClassLookup,
    called: &MethodSignature,
    receiver: &Class,
) -> Option<MethodSignature> {
    let mut seen = BTreeSet::new();
    let mut queue: VecDeque<&Class> = VecDeque::from([receiver]);
    while let Some(class) = queue.pop_front() {
        let parents = class.interfaces.iter().chain(class.super_class.iter());
        for parent in parents {
            if !seen.insert(parent.clone()) {
                continue;
            }
            let Some(parent_class) = classes.class(parent) else {
                continue;
            };
            if parent_class.is_interface
                && is_at_or_below(hierarchy, parent, called.declaring_class())
            {
                let found = parent_class.methods.iter().find(|method: &&Method| {
                    !method.access.is_abstract
                        && !method.access.is_static
                        && matches_override(called, &method.signature, hierarchy)
                });
                if let Some(method) = found {
                    return Some(method.signature.clone());
                }
            }
            queue.push_back(parent_class);
        }
    }
    None
}
