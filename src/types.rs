use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

pub(crate) const OBJECT: &str = "java.lang.Object";
pub(crate) const CONSTRUCTOR_NAME: &str = "<init>";

/// Fully-qualified name of a declared class or interface.
///
/// Internal names (`java/lang/Object`) are normalized to the dotted form on
/// construction, so both spellings compare equal.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClassType {
    name: Arc<str>,
}

impl ClassType {
    pub fn new(name: &str) -> Self {
        let name: Arc<str> = if name.contains('/') {
            name.replace('/', ".").into()
        } else {
            name.into()
        };
        Self { name }
    }

    pub fn object() -> Self {
        Self::new(OBJECT)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Package part of the name; empty for the default package.
    pub fn package(&self) -> &str {
        self.name.rsplit_once('.').map(|(package, _)| package).unwrap_or("")
    }

    pub fn simple_name(&self) -> &str {
        self.name
            .rsplit_once('.')
            .map(|(_, simple)| simple)
            .unwrap_or(&self.name)
    }

    pub fn is_object(&self) -> bool {
        &*self.name == OBJECT
    }
}

impl FromStr for ClassType {
    type Err = ParseError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let valid = !text.is_empty()
            && !text.starts_with('.')
            && !text.ends_with('.')
            && text
                .chars()
                .all(|c| c.is_alphanumeric() || matches!(c, '.' | '/' | '_' | '$'));
        if valid {
            Ok(Self::new(text))
        } else {
            Err(ParseError::InvalidType(text.to_string()))
        }
    }
}

impl TryFrom<String> for ClassType {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ClassType> for String {
    fn from(value: ClassType) -> Self {
        value.name.to_string()
    }
}

impl fmt::Display for ClassType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl fmt::Debug for ClassType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassType({})", self.name)
    }
}

/// Type appearing in a method signature.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Type {
    Void,
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    Class(ClassType),
    Array(Box<Type>),
}

impl Type {
    pub fn class(name: &str) -> Self {
        Type::Class(ClassType::new(name))
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Type::Class(_) | Type::Array(_))
    }
}

impl FromStr for Type {
    type Err = ParseError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let text = text.trim();
        if let Some(element) = text.strip_suffix("[]") {
            let element: Type = element.parse()?;
            if element == Type::Void {
                return Err(ParseError::InvalidType(text.to_string()));
            }
            return Ok(Type::Array(Box::new(element)));
        }
        let ty = match text {
            "void" => Type::Void,
            "boolean" => Type::Boolean,
            "byte" => Type::Byte,
            "char" => Type::Char,
            "short" => Type::Short,
            "int" => Type::Int,
            "long" => Type::Long,
            "float" => Type::Float,
            "double" => Type::Double,
            _ => Type::Class(text.parse()?),
        };
        Ok(ty)
    }
}

impl TryFrom<String> for Type {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Type> for String {
    fn from(value: Type) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Void => f.write_str("void"),
            Type::Boolean => f.write_str("boolean"),
            Type::Byte => f.write_str("byte"),
            Type::Char => f.write_str("char"),
            Type::Short => f.write_str("short"),
            Type::Int => f.write_str("int"),
            Type::Long => f.write_str("long"),
            Type::Float => f.write_str("float"),
            Type::Double => f.write_str("double"),
            Type::Class(class) => write!(f, "{class}"),
            Type::Array(element) => write!(f, "{element}[]"),
        }
    }
}

/// Identity of a method: declaring class, name, parameter types and return type.
///
/// The textual form is `<pkg.Class: ret name(p1,p2)>`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MethodSignature {
    declaring_class: ClassType,
    name: Arc<str>,
    parameter_types: Vec<Type>,
    return_type: Type,
}

impl MethodSignature {
    pub fn new(
        declaring_class: ClassType,
        name: &str,
        parameter_types: Vec<Type>,
        return_type: Type,
    ) -> Self {
        Self {
            declaring_class,
            name: name.into(),
            parameter_types,
            return_type,
        }
    }

    pub fn declaring_class(&self) -> &ClassType {
        &self.declaring_class
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameter_types(&self) -> &[Type] {
        &self.parameter_types
    }

    pub fn return_type(&self) -> &Type {
        &self.return_type
    }

    pub fn is_constructor(&self) -> bool {
        &*self.name == CONSTRUCTOR_NAME
    }

    /// Name, parameters and return type match, ignoring the declaring class.
    pub fn has_same_sub_signature(&self, other: &MethodSignature) -> bool {
        self.name == other.name
            && self.parameter_types == other.parameter_types
            && self.return_type == other.return_type
    }
}

impl FromStr for MethodSignature {
    type Err = ParseError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let malformed = || ParseError::MalformedSignature(text.to_string());
        let inner = text
            .trim()
            .strip_prefix('<')
            .and_then(|rest| rest.strip_suffix('>'))
            .ok_or_else(malformed)?;
        let (class, rest) = inner.split_once(':').ok_or_else(malformed)?;
        let (return_type, rest) = rest.trim().split_once(' ').ok_or_else(malformed)?;
        let (name, rest) = rest.trim().split_once('(').ok_or_else(malformed)?;
        let parameters = rest.strip_suffix(')').ok_or_else(malformed)?;
        if name.is_empty() {
            return Err(malformed());
        }

        let parameter_types = if parameters.trim().is_empty() {
            Vec::new()
        } else {
            parameters
                .split(',')
                .map(str::parse)
                .collect::<Result<Vec<Type>, _>>()?
        };

        Ok(Self::new(
            class.trim().parse()?,
            name,
            parameter_types,
            return_type.parse()?,
        ))
    }
}

impl TryFrom<String> for MethodSignature {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MethodSignature> for String {
    fn from(value: MethodSignature) -> Self {
        value.to_string()
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<{}: {} {}(",
            self.declaring_class, self.return_type, self.name
        )?;
        for (index, parameter) in self.parameter_types.iter().enumerate() {
            if index > 0 {
                f.write_str(",")?;
            }
            write!(f, "{parameter}")?;
        }
        f.write_str(")>")
    }
}

impl fmt::Debug for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
