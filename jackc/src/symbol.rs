use std::collections::HashMap;

use getset::{CopyGetters, Getters};
use jackvm::Segment;

/// Storage class of a declared name, which fixes the segment its slots
/// live in at code-generation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    Static,
    Field,
    Argument,
    Local,
}

impl ScopeKind {
    pub fn segment(self) -> Segment {
        match self {
            ScopeKind::Static => Segment::Static,
            ScopeKind::Field => Segment::This,
            ScopeKind::Argument => Segment::Argument,
            ScopeKind::Local => Segment::Local,
        }
    }
}

#[derive(Debug, Clone, Getters, CopyGetters)]
pub struct Entry {
    #[getset(get = "pub")]
    name: String,

    #[getset(get = "pub")]
    typ: String,

    #[getset(get_copy = "pub")]
    scope: ScopeKind,

    #[getset(get_copy = "pub")]
    index: u16,
}

/// Two-level scope store: static/field names live for a whole class
/// compilation, argument/local names for one subroutine. Each scope kind
/// allocates slot indices from its own monotonic counter.
pub struct SymbolTable {
    class_scope: HashMap<String, Entry>,
    local_scope: HashMap<String, Entry>,
    next_index: HashMap<ScopeKind, u16>,
}

impl SymbolTable {
    pub fn new() -> SymbolTable {
        SymbolTable {
            class_scope: HashMap::new(),
            local_scope: HashMap::new(),
            next_index: HashMap::new(),
        }
    }

    fn issue_index(&mut self, scope: ScopeKind) -> u16 {
        let next = self.next_index.entry(scope).or_insert(0);
        let index = *next;
        *next += 1;
        index
    }

    fn table_for(&mut self, scope: ScopeKind) -> &mut HashMap<String, Entry> {
        match scope {
            ScopeKind::Static | ScopeKind::Field => &mut self.class_scope,
            ScopeKind::Argument | ScopeKind::Local => &mut self.local_scope,
        }
    }

    /// Declares a name. Redefining a name in the same scope overwrites the
    /// earlier entry and still consumes a fresh slot index.
    pub fn define(&mut self, name: &str, typ: &str, scope: ScopeKind) {
        let index = self.issue_index(scope);
        let entry = Entry {
            name: name.to_string(),
            typ: typ.to_string(),
            scope,
            index,
        };
        self.table_for(scope).insert(name.to_string(), entry);
    }

    /// Looks a name up, local scope first. `None` is not an error: an
    /// unresolved name denotes a subroutine or class.
    pub fn find(&self, name: &str) -> Option<&Entry> {
        self.local_scope
            .get(name)
            .or_else(|| self.class_scope.get(name))
    }

    pub fn count(&self, scope: ScopeKind) -> usize {
        let table = match scope {
            ScopeKind::Static | ScopeKind::Field => &self.class_scope,
            ScopeKind::Argument | ScopeKind::Local => &self.local_scope,
        };
        table.values().filter(|e| e.scope == scope).count()
    }

    /// Drops every argument/local entry and rewinds both counters. Called
    /// once at the start of each subroutine, before parameters are defined.
    pub fn reset_local_scope(&mut self) {
        self.local_scope.clear();
        self.next_index.insert(ScopeKind::Argument, 0);
        self.next_index.insert(ScopeKind::Local, 0);
    }
}
