use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::types::{ClassType, MethodSignature};

/// Intermediate representation for a declared class or interface.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Class {
    pub name: ClassType,
    #[serde(default)]
    pub super_class: Option<ClassType>,
    #[serde(default)]
    pub interfaces: Vec<ClassType>,
    #[serde(default)]
    pub is_interface: bool,
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub methods: Vec<Method>,
}

impl Class {
    /// Look up a declared method with the same name, parameters and return type.
    pub fn method(&self, signature: &MethodSignature) -> Option<&Method> {
        self.methods
            .iter()
            .find(|method| method.signature.has_same_sub_signature(signature))
    }

    /// Whether the class can be the runtime type of an object.
    pub fn is_instantiable(&self) -> bool {
        !self.is_interface && !self.is_abstract
    }
}

/// Intermediate representation for a method and its body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Method {
    pub signature: MethodSignature,
    #[serde(default)]
    pub access: MethodAccess,
    #[serde(default)]
    pub body: Vec<Instruction>,
}

impl Method {
    /// Call sites in body order; offsets are instruction indices.
    pub fn call_sites(&self) -> Vec<CallSite> {
        self.body
            .iter()
            .enumerate()
            .filter_map(|(offset, instruction)| match instruction {
                Instruction::Invoke(expr) => Some(CallSite {
                    caller: self.signature.clone(),
                    target: expr.target().clone(),
                    kind: expr.kind(),
                    offset: offset as u32,
                }),
                _ => None,
            })
            .collect()
    }

    /// Classes allocated directly in the body.
    pub fn allocated_classes(&self) -> BTreeSet<ClassType> {
        self.body
            .iter()
            .filter_map(|instruction| match instruction {
                Instruction::New(class) => Some(class.clone()),
                _ => None,
            })
            .collect()
    }
}

/// Method access flags used for dispatch filtering.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MethodAccess {
    pub is_public: bool,
    pub is_private: bool,
    pub is_static: bool,
    pub is_abstract: bool,
}

/// Statement kinds needed for call graph construction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Instruction {
    New(ClassType),
    Invoke(InvokeExpr),
    Other,
}

/// Invoke expression, one variant per JVM invoke opcode family.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InvokeExpr {
    Static {
        target: MethodSignature,
    },
    Special {
        receiver: String,
        target: MethodSignature,
    },
    Virtual {
        receiver: String,
        target: MethodSignature,
    },
    Interface {
        receiver: String,
        target: MethodSignature,
    },
}

impl InvokeExpr {
    pub fn target(&self) -> &MethodSignature {
        match self {
            InvokeExpr::Static { target }
            | InvokeExpr::Special { target, .. }
            | InvokeExpr::Virtual { target, .. }
            | InvokeExpr::Interface { target, .. } => target,
        }
    }

    pub fn receiver(&self) -> Option<&str> {
        match self {
            InvokeExpr::Static { .. } => None,
            InvokeExpr::Special { receiver, .. }
            | InvokeExpr::Virtual { receiver, .. }
            | InvokeExpr::Interface { receiver, .. } => Some(receiver),
        }
    }

    pub fn kind(&self) -> CallKind {
        match self {
            InvokeExpr::Static { .. } => CallKind::Static,
            InvokeExpr::Special { .. } => CallKind::Special,
            InvokeExpr::Virtual { .. } => CallKind::Virtual,
            InvokeExpr::Interface { .. } => CallKind::Interface,
        }
    }
}

/// Call site extracted from a method body.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CallSite {
    pub caller: MethodSignature,
    pub target: MethodSignature,
    pub kind: CallKind,
    pub offset: u32,
}

/// Call opcode classification used by the call graph algorithms.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum CallKind {
    Virtual,
    Interface,
    Special,
    Static,
}
