use super::value::Value;

/// Data an expression can see: the instance document plus the loop
/// variables in scope.
///
/// Bindings form a parent-linked chain. [`Context::bind`] returns a child
/// that borrows its parent, so leaving a loop iteration is just dropping the
/// child and no restore step exists.
#[derive(Debug, Clone)]
pub struct Context<'a> {
    root: &'a Value,
    parent: Option<&'a Context<'a>>,
    binding: Option<(String, Value)>,
}

impl<'a> Context<'a> {
    pub fn new(root: &'a Value) -> Self {
        Self {
            root,
            parent: None,
            binding: None,
        }
    }

    pub fn root(&self) -> &'a Value {
        self.root
    }

    pub fn bind<'b>(&'b self, name: impl Into<String>, value: Value) -> Context<'b>
    where
        'a: 'b,
    {
        Context {
            root: self.root,
            parent: Some(self),
            binding: Some((name.into(), value)),
        }
    }

    /// Innermost binding of `name`, if any.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        let mut current = Some(self);
        while let Some(context) = current {
            if let Some((bound, value)) = &context.binding {
                if bound == name {
                    return Some(value);
                }
            }
            current = context.parent;
        }
        None
    }

    /// Names of all bound variables, innermost first.
    pub fn variables(&self) -> Vec<&str> {
        let mut names = Vec::new();
        let mut current = Some(self);
        while let Some(context) = current {
            if let Some((bound, _)) = &context.binding {
                names.push(bound.as_str());
            }
            current = context.parent;
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bind_and_lookup() {
        let instance = Value::from(json!({"spec": {"replicas": 3}}));
        let root = Context::new(&instance);
        assert_eq!(root.lookup("item"), None);

        let outer = root.bind("item", Value::from("a"));
        let inner = outer.bind("port", Value::Integer(80));
        assert_eq!(inner.lookup("item"), Some(&Value::from("a")));
        assert_eq!(inner.lookup("port"), Some(&Value::Integer(80)));
        assert_eq!(inner.variables(), vec!["port", "item"]);
        assert_eq!(inner.root(), &instance);

        // parent is untouched by the child binding
        assert_eq!(outer.lookup("port"), None);
    }

    #[test]
    fn test_shadowing_prefers_innermost() {
        let instance = Value::Null;
        let root = Context::new(&instance);
        let outer = root.bind("x", Value::Integer(1));
        let inner = outer.bind("x", Value::Integer(2));
        assert_eq!(inner.lookup("x"), Some(&Value::Integer(2)));
    }
}
