use std::collections::{BTreeMap, BTreeSet, VecDeque};

use tracing::debug;

use crate::algorithm::AnalysisContext;
use crate::config::AnalysisConfig;
use crate::error::{CallGraphError, CallGraphResult};
use crate::hierarchy::{ClassLookup, TypeHierarchy};
use crate::ir::Class;
use crate::types::{ClassType, Type};

const ARRAY_SUPERTYPES: [&str; 2] = ["java.lang.Cloneable", "java.io.Serializable"];

/// In-memory program: class declarations indexed by name plus the derived
/// type hierarchy.
#[derive(Clone, Debug, Default)]
pub struct ClassPath {
    classes: BTreeMap<ClassType, Class>,
    direct_subtypes: BTreeMap<ClassType, BTreeSet<ClassType>>,
}

impl ClassPath {
    pub fn new(classes: impl IntoIterator<Item = Class>) -> CallGraphResult<Self> {
        let mut by_name = BTreeMap::new();
        for class in classes {
            if by_name.contains_key(&class.name) {
                return Err(CallGraphError::DuplicateClass { class: class.name });
            }
            by_name.insert(class.name.clone(), class);
        }

        if let Some(class) = find_superclass_cycle(&by_name) {
            return Err(CallGraphError::CyclicInheritance { class });
        }

        let mut direct_subtypes: BTreeMap<ClassType, BTreeSet<ClassType>> = BTreeMap::new();
        for class in by_name.values() {
            for parent in class.super_class.iter().chain(&class.interfaces) {
                direct_subtypes
                    .entry(parent.clone())
                    .or_default()
                    .insert(class.name.clone());
            }
        }

        debug!(classes = by_name.len(), "built class path");
        Ok(Self {
            classes: by_name,
            direct_subtypes,
        })
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Analysis context reading both the hierarchy and the declarations from this class path.
    pub fn context(&self, config: AnalysisConfig) -> AnalysisContext<'_> {
        AnalysisContext::new(self, self, config)
    }

    /// Proper supertypes of a class: superclasses and interfaces, transitively.
    fn supertypes_of(&self, ty: &ClassType) -> BTreeSet<ClassType> {
        let mut seen = BTreeSet::new();
        let mut queue = VecDeque::from([ty.clone()]);
        while let Some(current) = queue.pop_front() {
            let Some(class) = self.classes.get(&current) else {
                continue;
            };
            for parent in class.super_class.iter().chain(&class.interfaces) {
                if parent != ty && seen.insert(parent.clone()) {
                    queue.push_back(parent.clone());
                }
            }
        }
        seen
    }

    fn is_class_subtype(&self, sub: &ClassType, sup: &ClassType) -> bool {
        if sub == sup {
            return false;
        }
        if sup.is_object() {
            return true;
        }
        self.supertypes_of(sub).contains(sup)
    }
}

/// First class, in name order, that reaches itself by following superclass links.
fn find_superclass_cycle(classes: &BTreeMap<ClassType, Class>) -> Option<ClassType> {
    let mut acyclic: BTreeSet<&ClassType> = BTreeSet::new();
    for start in classes.keys() {
        let mut chain = BTreeSet::new();
        let mut current = Some(start);
        while let Some(name) = current {
            if acyclic.contains(name) {
                break;
            }
            if !chain.insert(name) {
                return Some(name.clone());
            }
            current = classes
                .get(name)
                .and_then(|class| class.super_class.as_ref());
        }
        acyclic.extend(chain);
    }
    None
}

impl TypeHierarchy for ClassPath {
    fn subtypes_of(&self, ty: &ClassType) -> BTreeSet<ClassType> {
        let mut seen = BTreeSet::new();
        let mut queue = VecDeque::from([ty.clone()]);
        while let Some(current) = queue.pop_front() {
            let Some(children) = self.direct_subtypes.get(&current) else {
                continue;
            };
            for child in children {
                if child != ty && seen.insert(child.clone()) {
                    queue.push_back(child.clone());
                }
            }
        }
        seen
    }

    fn super_class_of(&self, ty: &ClassType) -> Option<ClassType> {
        self.classes
            .get(ty)
            .filter(|class| !class.is_interface)
            .and_then(|class| class.super_class.clone())
    }

    fn is_subtype(&self, sub: &Type, sup: &Type) -> bool {
        match (sub, sup) {
            (Type::Class(sub), Type::Class(sup)) => self.is_class_subtype(sub, sup),
            (Type::Array(_), Type::Class(sup)) => {
                sup.is_object() || ARRAY_SUPERTYPES.contains(&sup.name())
            }
            (Type::Array(sub), Type::Array(sup)) => {
                sub.is_reference() && sup.is_reference() && self.is_subtype(sub, sup)
            }
            _ => false,
        }
    }
}

impl ClassLookup for ClassPath {
    fn class(&self, ty: &ClassType) -> Option<&Class> {
        self.classes.get(ty)
    }

    fn classes(&self) -> Box<dyn Iterator<Item = &Class> + '_> {
        Box::new(self.classes.values())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{class, interface, object_class};

    fn class_path() -> ClassPath {
        ClassPath::new(vec![
            object_class(),
            interface("a.I", &[], vec![]),
            interface("a.J", &["a.I"], vec![]),
            class("a.A", Some("java.lang.Object"), vec![]),
            class("a.B", Some("a.A"), vec![]).implementing(&["a.J"]),
            class("a.C", Some("a.B"), vec![]),
            class("a.D", Some("a.A"), vec![]),
        ])
        .expect("class path")
    }

    fn names(types: &BTreeSet<ClassType>) -> Vec<&str> {
        types.iter().map(ClassType::name).collect()
    }

    #[test]
    fn subtypes_are_transitive_and_exclude_self() {
        let path = class_path();

        assert_eq!(
            vec!["a.B", "a.C", "a.D"],
            names(&path.subtypes_of(&ClassType::new("a.A")))
        );
        assert_eq!(
            vec!["a.B", "a.C", "a.J"],
            names(&path.subtypes_of(&ClassType::new("a.I")))
        );
        assert!(path.subtypes_of(&ClassType::new("a.C")).is_empty());
    }

    #[test]
    fn super_class_follows_declarations() {
        let path = class_path();

        assert_eq!(
            Some(ClassType::new("a.B")),
            path.super_class_of(&ClassType::new("a.C"))
        );
        assert_eq!(None, path.super_class_of(&ClassType::object()));
        assert_eq!(None, path.super_class_of(&ClassType::new("a.J")));
        assert_eq!(None, path.super_class_of(&ClassType::new("missing.X")));
    }

    #[test]
    fn subtype_checks_cover_interfaces_arrays_and_object() {
        let path = class_path();

        assert!(path.is_subtype(&Type::class("a.C"), &Type::class("a.A")));
        assert!(path.is_subtype(&Type::class("a.C"), &Type::class("a.I")));
        assert!(path.is_subtype(&Type::class("a.J"), &Type::class("java.lang.Object")));
        assert!(!path.is_subtype(&Type::class("a.A"), &Type::class("a.A")));
        assert!(!path.is_subtype(&Type::class("a.A"), &Type::class("a.C")));
        assert!(!path.is_subtype(&Type::class("a.D"), &Type::class("a.I")));

        let c_array: Type = "a.C[]".parse().expect("type");
        let a_array: Type = "a.A[]".parse().expect("type");
        let int_array: Type = "int[]".parse().expect("type");
        assert!(path.is_subtype(&c_array, &a_array));
        assert!(path.is_subtype(&c_array, &Type::class("java.lang.Object")));
        assert!(!path.is_subtype(&int_array, &"long[]".parse().expect("type")));
        assert!(!path.is_subtype(&Type::Int, &Type::Long));
    }

    #[test]
    fn superclass_cycles_are_rejected() {
        let result = ClassPath::new(vec![
            object_class(),
            class("c.A", Some("c.B"), vec![]),
            class("c.B", Some("c.A"), vec![]),
            class("c.C", Some("c.A"), vec![]),
        ]);

        assert_eq!(
            Err(CallGraphError::CyclicInheritance {
                class: ClassType::new("c.A")
            }),
            result.map(|path| path.len())
        );
    }

    #[test]
    fn self_inheritance_is_rejected() {
        let result = ClassPath::new(vec![class("c.Loop", Some("c.Loop"), vec![])]);

        assert!(matches!(
            result,
            Err(CallGraphError::CyclicInheritance { .. })
        ));
    }

    #[test]
    fn duplicate_classes_are_rejected() {
        let result = ClassPath::new(vec![
            class("a.A", None, vec![]),
            class("a.A", None, vec![]),
        ]);

        assert_eq!(
            Err(CallGraphError::DuplicateClass {
                class: ClassType::new("a.A")
            }),
            result.map(|path| path.len())
        );
    }
}
