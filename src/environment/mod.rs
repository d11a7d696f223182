use crate::value::ScriptValue;
use compact_str::CompactString;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    Let,
    Const,
    Var,
    Parameter,
    Function,
}

impl BindingKind {
    pub fn to_u8(self) -> u8 {
        match self {
            BindingKind::Let => 0,
            BindingKind::Const => 1,
            BindingKind::Var => 2,
            BindingKind::Parameter => 3,
            BindingKind::Function => 4,
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(BindingKind::Let),
            1 => Some(BindingKind::Const),
            2 => Some(BindingKind::Var),
            3 => Some(BindingKind::Parameter),
            4 => Some(BindingKind::Function),
            _ => None,
        }
    }

    /// Bindings of these kinds may be declared again in the same scope.
    fn is_redeclarable(self) -> bool {
        matches!(
            self,
            BindingKind::Var | BindingKind::Parameter | BindingKind::Function
        )
    }
}

impl std::fmt::Display for BindingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BindingKind::Let => write!(f, "let"),
            BindingKind::Const => write!(f, "const"),
            BindingKind::Var => write!(f, "var"),
            BindingKind::Parameter => write!(f, "param"),
            BindingKind::Function => write!(f, "function"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Binding {
    pub name: CompactString,
    pub value: ScriptValue,
    pub kind: BindingKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(u32);

#[derive(Debug)]
struct Scope {
    bindings: Vec<Binding>,
    parent: Option<ScopeId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvironmentError {
    Undeclared,
    AssignToConstant,
    AlreadyDeclared,
}

/// Every scope created during a run. Scopes refer to their parent by id, so
/// closures that capture a scope never form reference cycles.
#[derive(Debug)]
pub struct ScopeArena {
    scopes: Vec<Scope>,
}

impl ScopeArena {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope {
                bindings: Vec::new(),
                parent: None,
            }],
        }
    }

    pub fn global(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn new_scope(&mut self, parent: ScopeId) -> ScopeId {
        self.scopes.push(Scope {
            bindings: Vec::new(),
            parent: Some(parent),
        });
        ScopeId((self.scopes.len() - 1) as u32)
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    pub fn parent(&self, scope: ScopeId) -> Option<ScopeId> {
        self.scopes.get(scope.0 as usize)?.parent
    }

    pub fn bindings(&self, scope: ScopeId) -> &[Binding] {
        self.scopes
            .get(scope.0 as usize)
            .map(|scope| scope.bindings.as_slice())
            .unwrap_or_default()
    }

    fn find(&self, scope: ScopeId, name: &str) -> Option<(ScopeId, usize)> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let scope = self.scopes.get(id.0 as usize)?;
            if let Some(index) = scope.bindings.iter().position(|b| b.name == name) {
                return Some((id, index));
            }
            current = scope.parent;
        }
        None
    }

    pub fn access(&self, scope: ScopeId, name: &str) -> Option<&ScriptValue> {
        let (id, index) = self.find(scope, name)?;
        Some(&self.scopes[id.0 as usize].bindings[index].value)
    }

    pub fn assign(
        &mut self,
        scope: ScopeId,
        name: &str,
        value: ScriptValue,
    ) -> Result<(), EnvironmentError> {
        let (id, index) = self
            .find(scope, name)
            .ok_or(EnvironmentError::Undeclared)?;
        let binding = &mut self.scopes[id.0 as usize].bindings[index];
        if binding.kind == BindingKind::Const {
            return Err(EnvironmentError::AssignToConstant);
        }
        binding.value = value;
        Ok(())
    }

    pub fn declare(
        &mut self,
        scope: ScopeId,
        name: &str,
        value: ScriptValue,
        kind: BindingKind,
    ) -> Result<(), EnvironmentError> {
        let scope = self
            .scopes
            .get_mut(scope.0 as usize)
            .ok_or(EnvironmentError::Undeclared)?;
        match scope.bindings.iter_mut().find(|b| b.name == name) {
            Some(existing) if existing.kind.is_redeclarable() && kind.is_redeclarable() => {
                existing.value = value;
                Ok(())
            }
            Some(_) => Err(EnvironmentError::AlreadyDeclared),
            None => {
                scope.bindings.push(Binding {
                    name: name.into(),
                    value,
                    kind,
                });
                Ok(())
            }
        }
    }
}

impl Default for ScopeArena {
    fn default() -> Self {
        Self::new()
    }
}
