use super::interpolation::StringTemplate;
use crate::ast::Expression;
use crate::eval::Value;

/// Parsed template tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Document-position children of the `resources` field, in order.
    Root(Vec<Node>),
    ForLoop {
        variable: String,
        iterable: Expression,
        filter: Option<Expression>,
        body: Box<Node>,
    },
    Conditional {
        condition: Expression,
        then_branch: Box<Node>,
        else_branch: Option<Box<Node>>,
    },
    /// Entries in declaration order.
    Map(Vec<MapEntry>),
    Array(Vec<Node>),
    Literal(Value),
    /// `@expr(...)`
    Expression(Expression),
    Interpolated(StringTemplate),
    /// Sibling control keys of one map that run independently.
    MultiControlFlow(Vec<Node>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum MapEntry {
    Field(String, Node),
    /// A control key whose map results merge into the enclosing map.
    Control(Node),
}

impl Node {
    pub fn is_control(&self) -> bool {
        matches!(
            self,
            Node::ForLoop { .. } | Node::Conditional { .. } | Node::MultiControlFlow(_)
        )
    }

    /// Value node of a plain field, if this is a map that has it.
    pub fn field(&self, name: &str) -> Option<&Node> {
        match self {
            Node::Map(entries) => entries.iter().find_map(|entry| match entry {
                MapEntry::Field(key, node) if key == name => Some(node),
                _ => None,
            }),
            _ => None,
        }
    }

    /// Whether this map declares both identity fields, making it an output
    /// document rather than a nested value.
    pub fn is_resource_shaped(&self, api_version_field: &str, kind_field: &str) -> bool {
        self.field(api_version_field).is_some() && self.field(kind_field).is_some()
    }

    /// Whether the value this node produces has list shape.
    pub fn yields_list(&self) -> bool {
        match self {
            Node::Array(_) => true,
            Node::ForLoop { body, .. } => body.yields_list(),
            Node::Conditional { then_branch, .. } => then_branch.yields_list(),
            Node::MultiControlFlow(children) => children.iter().any(Node::yields_list),
            _ => false,
        }
    }
}
