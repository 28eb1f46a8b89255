use dl_ast::types::VariableDeclaration;

/// Lexically scoped table of in-scope variable declarations. Each function
/// body starts a fresh root; each block pushes a child that is dropped when
/// the block ends. The parent chain strictly nests, so plain ownership of
/// the parent suffices.
#[derive(Debug, Default)]
pub struct Environment {
    variables: Vec<VariableDeclaration>,
    parent: Option<Box<Environment>>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// New innermost scope whose lookups fall through to `parent`.
    pub fn child_of(parent: Environment) -> Self {
        Self {
            variables: Vec::new(),
            parent: Some(Box::new(parent)),
        }
    }

    /// Leave the current scope, dropping its declarations.
    pub fn into_parent(self) -> Environment {
        self.parent.map(|parent| *parent).unwrap_or_default()
    }

    pub fn enscope(&mut self, declaration: VariableDeclaration) {
        self.variables.push(declaration);
    }

    /// Most-recently-enscoped declaration of `name` visible from this
    /// scope: local declarations shadow outer ones, later local
    /// declarations shadow earlier ones.
    pub fn find(&self, name: &str) -> Option<&VariableDeclaration> {
        self.variables
            .iter()
            .rev()
            .find(|declaration| declaration.name == name)
            .or_else(|| self.parent.as_ref().and_then(|parent| parent.find(name)))
    }
}
