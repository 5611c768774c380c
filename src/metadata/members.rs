//! Resolved metadata entities.
//!
//! A [`crate::metadata::TokenResolver`] turns the tokens embedded in bytecode into these value
//! types. They carry just enough information to render an operand: names, the declaring type and,
//! for methods and fields, the type names that make up their signature. Their [`std::fmt::Display`]
//! output follows the host runtime's reflection conventions, so a field prints as
//! `Int32 counter` and a method as `Void WriteLine(System.String)`.

use std::fmt;

/// A resolved type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeInfo {
    /// Fully qualified name, e.g. `System.Collections.Generic.List`1[System.Int32]`
    pub full_name: String,
    /// Full name of the enclosing type for nested types
    pub declaring_type: Option<String>,
}

impl TypeInfo {
    /// Creates a top-level type.
    #[must_use]
    pub fn new(full_name: impl Into<String>) -> Self {
        TypeInfo {
            full_name: full_name.into(),
            declaring_type: None,
        }
    }

    /// Marks this type as nested inside `declaring_type`.
    #[must_use]
    pub fn nested_in(mut self, declaring_type: impl Into<String>) -> Self {
        self.declaring_type = Some(declaring_type.into());
        self
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name)
    }
}

/// A resolved field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    /// Field name
    pub name: String,
    /// Full name of the field's type
    pub field_type: String,
    /// Full name of the type declaring the field
    pub declaring_type: Option<String>,
}

impl FieldInfo {
    /// Creates a field declared on `declaring_type`.
    #[must_use]
    pub fn new(
        declaring_type: impl Into<String>,
        field_type: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        FieldInfo {
            name: name.into(),
            field_type: field_type.into(),
            declaring_type: Some(declaring_type.into()),
        }
    }
}

impl fmt::Display for FieldInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field_type, self.name)
    }
}

/// A resolved method, constructor, or dynamic method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodInfo {
    /// Method name, `.ctor` for constructors
    pub name: String,
    /// Full name of the return type (`Void` when nothing is returned)
    pub return_type: String,
    /// Full names of the parameter types in declaration order
    pub parameters: Vec<String>,
    /// Full name of the declaring type; dynamic methods have none
    pub declaring_type: Option<String>,
}

impl MethodInfo {
    /// Creates a method declared on `declaring_type`.
    #[must_use]
    pub fn new<P, S>(
        declaring_type: impl Into<String>,
        return_type: impl Into<String>,
        name: impl Into<String>,
        parameters: P,
    ) -> Self
    where
        P: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MethodInfo {
            name: name.into(),
            return_type: return_type.into(),
            parameters: parameters.into_iter().map(Into::into).collect(),
            declaring_type: Some(declaring_type.into()),
        }
    }

    /// Creates a method without a declaring type, the way dynamic methods appear.
    #[must_use]
    pub fn dynamic<P, S>(return_type: impl Into<String>, name: impl Into<String>, parameters: P) -> Self
    where
        P: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MethodInfo {
            name: name.into(),
            return_type: return_type.into(),
            parameters: parameters.into_iter().map(Into::into).collect(),
            declaring_type: None,
        }
    }

    /// Returns this method as a member of the instantiated generic type `context`.
    #[must_use]
    pub fn in_context(&self, context: &TypeInfo) -> Self {
        MethodInfo {
            declaring_type: Some(context.full_name.clone()),
            ..self.clone()
        }
    }
}

impl fmt::Display for MethodInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}({})",
            self.return_type,
            self.name,
            self.parameters.join(", ")
        )
    }
}

/// Any entity an `ldtoken` operand can name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Member {
    /// A type handle
    Type(TypeInfo),
    /// A method handle
    Method(MethodInfo),
    /// A field handle
    Field(FieldInfo),
}

impl Member {
    /// Full name of the type declaring this member, if any.
    #[must_use]
    pub fn declaring_type(&self) -> Option<&str> {
        match self {
            Member::Type(ty) => ty.declaring_type.as_deref(),
            Member::Method(method) => method.declaring_type.as_deref(),
            Member::Field(field) => field.declaring_type.as_deref(),
        }
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Member::Type(ty) => fmt::Display::fmt(ty, f),
            Member::Method(method) => fmt::Display::fmt(method, f),
            Member::Field(field) => fmt::Display::fmt(field, f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_display() {
        let field = FieldInfo::new("Demo.Counter", "System.Int32", "count");
        assert_eq!(field.to_string(), "System.Int32 count");
    }

    #[test]
    fn method_display() {
        let method = MethodInfo::new(
            "System.Console",
            "Void",
            "WriteLine",
            ["System.String", "System.Object"],
        );
        assert_eq!(
            method.to_string(),
            "Void WriteLine(System.String, System.Object)"
        );

        let no_args = MethodInfo::dynamic("Int32", "Compute", Vec::<String>::new());
        assert_eq!(no_args.to_string(), "Int32 Compute()");
        assert!(no_args.declaring_type.is_none());
    }

    #[test]
    fn method_in_context() {
        let open = MethodInfo::new("System.Collections.Generic.List`1", "Void", "Add", ["T"]);
        let closed = open.in_context(&TypeInfo::new(
            "System.Collections.Generic.List`1[System.Int32]",
        ));

        assert_eq!(
            closed.declaring_type.as_deref(),
            Some("System.Collections.Generic.List`1[System.Int32]")
        );
        assert_eq!(closed.name, "Add");
    }

    #[test]
    fn member_declaring_type() {
        let nested = Member::Type(TypeInfo::new("Outer+Inner").nested_in("Outer"));
        assert_eq!(nested.declaring_type(), Some("Outer"));
        assert_eq!(nested.to_string(), "Outer+Inner");

        let top = Member::Type(TypeInfo::new("System.String"));
        assert_eq!(top.declaring_type(), None);
    }
}
