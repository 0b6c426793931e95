// Strongly-typed schema tree. No serde_json::Value here.
//
// Built once by the parser and never mutated afterwards; safe to share
// read-only across threads.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Post,
    Get,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl Method {
    pub const ALL: [Method; 7] = [
        Method::Post,
        Method::Get,
        Method::Put,
        Method::Delete,
        Method::Patch,
        Method::Head,
        Method::Options,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Method::Post => "POST",
            Method::Get => "GET",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = ();

    /// ASCII case-insensitive; hosts disagree on method casing.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Method::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ScalarType {
    Bool,
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    Float,
    String { max_len: Option<u64> },
}

impl ScalarType {
    /// Inclusive integer bounds, `None` for non-integer scalars.
    pub fn int_bounds(self) -> Option<(i128, i128)> {
        let bounds = match self {
            ScalarType::U8 => (0, u8::MAX as i128),
            ScalarType::U16 => (0, u16::MAX as i128),
            ScalarType::U32 => (0, u32::MAX as i128),
            ScalarType::U64 => (0, u64::MAX as i128),
            ScalarType::I8 => (i8::MIN as i128, i8::MAX as i128),
            ScalarType::I16 => (i16::MIN as i128, i16::MAX as i128),
            ScalarType::I32 => (i32::MIN as i128, i32::MAX as i128),
            ScalarType::I64 => (i64::MIN as i128, i64::MAX as i128),
            _ => return None,
        };
        Some(bounds)
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarType::Bool => f.write_str("bool"),
            ScalarType::U8 => f.write_str("u8"),
            ScalarType::U16 => f.write_str("u16"),
            ScalarType::U32 => f.write_str("u32"),
            ScalarType::U64 => f.write_str("u64"),
            ScalarType::I8 => f.write_str("i8"),
            ScalarType::I16 => f.write_str("i16"),
            ScalarType::I32 => f.write_str("i32"),
            ScalarType::I64 => f.write_str("i64"),
            ScalarType::Float => f.write_str("float"),
            ScalarType::String { max_len: None } => f.write_str("string"),
            ScalarType::String { max_len: Some(n) } => write!(f, "string({n})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeNode {
    pub shape: Shape,
    pub nullable: bool,      // trailing `*`
}

impl TypeNode {
    pub fn new(shape: Shape) -> Self {
        Self { shape, nullable: false }
    }

    pub fn scalar(ty: ScalarType) -> Self {
        Self::new(Shape::Scalar(ty))
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Same shape with `nullable` cleared; used for body roots, which may never be null.
    pub fn required(&self) -> Self {
        Self { shape: self.shape.clone(), nullable: false }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Scalar(ScalarType),
    Object(ObjectType),
    Array(ArrayType),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ObjectType {
    pub fields: IndexMap<String, TypeNode>,  // declaration order kept for display only
    pub allow_extra_keys: bool,              // trailing `...`
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ArrayType {
    pub items: Vec<TypeNode>,
    /// The last entry repeats for all remaining elements (zero or more).
    /// Never set when `items` is empty.
    pub repeating: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteVar {
    pub name: String,
    pub ty: Option<ScalarType>,  // `<id>` without a type is unconstrained
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteSegment {
    Static(String),
    Var(RouteVar),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Route {
    pub segments: Vec<RouteSegment>,
}

impl Route {
    /// Flattened path with `<name>` placeholders, e.g. `/user/<id>`.
    pub fn template(&self) -> String {
        let mut out = String::new();
        for seg in &self.segments {
            match seg {
                RouteSegment::Static(s) => out.push_str(s),
                RouteSegment::Var(v) => {
                    out.push('<');
                    out.push_str(&v.name);
                    out.push('>');
                }
            }
        }
        out
    }

    pub fn vars(&self) -> impl Iterator<Item = &RouteVar> {
        self.segments.iter().filter_map(|seg| match seg {
            RouteSegment::Var(v) => Some(v),
            RouteSegment::Static(_) => None,
        })
    }

    pub fn variables(&self) -> IndexMap<&str, Option<ScalarType>> {
        self.vars().map(|v| (v.name.as_str(), v.ty)).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusMatcher {
    Literal(u16),
    /// Digits and `X`; each `X` matches any single digit.
    Pattern(String),
}

impl StatusMatcher {
    pub const WILDCARD: char = 'X';
}

impl fmt::Display for StatusMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusMatcher::Literal(code) => write!(f, "{code}"),
            StatusMatcher::Pattern(p) => f.write_str(p),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Request {
    pub methods: Vec<Method>,      // never empty; duplicates kept in source order
    pub route: Route,
    pub schema: Option<TypeNode>,  // root is always Object or Array
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseCase {
    pub matchers: Vec<StatusMatcher>,  // never empty
    pub schema: Option<TypeNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schema {
    pub request: Request,
    pub responses: Vec<ResponseCase>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_template_and_variables() {
        let route = Route {
            segments: vec![
                RouteSegment::Static("/user/".into()),
                RouteSegment::Var(RouteVar { name: "id".into(), ty: Some(ScalarType::I32) }),
                RouteSegment::Static("/posts/".into()),
                RouteSegment::Var(RouteVar { name: "slug".into(), ty: None }),
            ],
        };
        assert_eq!(route.template(), "/user/<id>/posts/<slug>");
        let vars = route.variables();
        assert_eq!(vars.get("id"), Some(&Some(ScalarType::I32)));
        assert_eq!(vars.get("slug"), Some(&None));
    }

    #[test]
    fn method_names_parse_case_insensitively() {
        assert_eq!("post".parse::<Method>(), Ok(Method::Post));
        assert_eq!("OPTIONS".parse::<Method>(), Ok(Method::Options));
        assert!("TRACE".parse::<Method>().is_err());
    }

    #[test]
    fn object_equality_ignores_key_order() {
        let mut a = ObjectType::default();
        a.fields.insert("x".into(), TypeNode::scalar(ScalarType::Bool));
        a.fields.insert("y".into(), TypeNode::scalar(ScalarType::U8));
        let mut b = ObjectType::default();
        b.fields.insert("y".into(), TypeNode::scalar(ScalarType::U8));
        b.fields.insert("x".into(), TypeNode::scalar(ScalarType::Bool));
        assert_eq!(a, b);
    }
}
