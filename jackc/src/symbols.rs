use std::collections::HashMap;

use vmcode::Segment;

use crate::error::{CompileError, ErrorKind};

/// Storage class of a declared name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Static,
    Field,
    Argument,
    Local,
}

impl SymbolKind {
    /// Memory segment holding variables of this kind.
    pub fn segment(self) -> Segment {
        match self {
            SymbolKind::Static => Segment::Static,
            SymbolKind::Field => Segment::This,
            SymbolKind::Argument => Segment::Argument,
            SymbolKind::Local => Segment::Local,
        }
    }

    fn is_class_level(self) -> bool {
        matches!(self, SymbolKind::Static | SymbolKind::Field)
    }

    fn slot(self) -> usize {
        match self {
            SymbolKind::Static | SymbolKind::Argument => 0,
            SymbolKind::Field | SymbolKind::Local => 1,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SymbolKind::Static => "static",
            SymbolKind::Field => "field",
            SymbolKind::Argument => "argument",
            SymbolKind::Local => "local",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub ty: String,
    pub kind: SymbolKind,
    pub index: u16,
}

#[derive(Debug, Default)]
struct Scope {
    symbols: HashMap<String, Symbol>,
    /// Next index per kind; see [`SymbolKind::slot`].
    counts: [u16; 2],
}

impl Scope {
    fn define(
        &mut self,
        name: &str,
        ty: &str,
        kind: SymbolKind,
    ) -> Result<u16, CompileError> {
        if let Some(existing) = self.symbols.get(name) {
            return Err(CompileError::no_span(
                ErrorKind::DuplicateSymbol,
                format!(
                    "`{name}` is already declared as {} {}",
                    existing.kind.name(),
                    existing.index
                ),
            ));
        }
        let index = self.counts[kind.slot()];
        self.counts[kind.slot()] = index.checked_add(1).ok_or_else(|| {
            CompileError::no_span(
                ErrorKind::UnexpectedToken,
                format!("too many {} variables to declare `{name}`", kind.name()),
            )
        })?;
        self.symbols.insert(
            name.to_string(),
            Symbol {
                ty: ty.to_string(),
                kind,
                index,
            },
        );
        Ok(index)
    }

    fn clear(&mut self) {
        self.symbols.clear();
        self.counts = [0; 2];
    }
}

/// Two-level scoped symbol table.
///
/// Statics and fields live in the class scope for the whole class.
/// Arguments and locals live in the subroutine scope, which
/// [`start_subroutine`](Self::start_subroutine) clears. Lookups try the
/// subroutine scope first, so a local may shadow a field.
#[derive(Debug, Default)]
pub struct SymbolTable {
    class: Scope,
    subroutine: Scope,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every argument and local; class scope is untouched.
    pub fn start_subroutine(&mut self) {
        self.subroutine.clear();
    }

    /// Declare `name` and return its ordinal index within `kind`.
    ///
    /// Fails with [`ErrorKind::DuplicateSymbol`] when `name` already exists
    /// in the scope that `kind` targets.
    pub fn define(
        &mut self,
        name: &str,
        ty: &str,
        kind: SymbolKind,
    ) -> Result<u16, CompileError> {
        let scope = if kind.is_class_level() {
            &mut self.class
        } else {
            &mut self.subroutine
        };
        scope.define(name, ty, kind)
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.subroutine
            .symbols
            .get(name)
            .or_else(|| self.class.symbols.get(name))
    }

    pub fn kind_of(&self, name: &str) -> Option<SymbolKind> {
        self.lookup(name).map(|s| s.kind)
    }

    pub fn type_of(&self, name: &str) -> Option<&str> {
        self.lookup(name).map(|s| s.ty.as_str())
    }

    pub fn index_of(&self, name: &str) -> Option<u16> {
        self.lookup(name).map(|s| s.index)
    }

    /// Number of symbols of `kind` in the scope that holds that kind.
    pub fn count(&self, kind: SymbolKind) -> u16 {
        let scope = if kind.is_class_level() {
            &self.class
        } else {
            &self.subroutine
        };
        scope.counts[kind.slot()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_are_contiguous_per_kind() {
        let mut table = SymbolTable::new();
        assert_eq!(table.define("a", "int", SymbolKind::Field).unwrap(), 0);
        assert_eq!(table.define("s", "int", SymbolKind::Static).unwrap(), 0);
        assert_eq!(table.define("b", "int", SymbolKind::Field).unwrap(), 1);
        assert_eq!(table.define("x", "int", SymbolKind::Argument).unwrap(), 0);
        assert_eq!(table.define("i", "int", SymbolKind::Local).unwrap(), 0);
        assert_eq!(table.define("j", "int", SymbolKind::Local).unwrap(), 1);
        assert_eq!(table.define("y", "int", SymbolKind::Argument).unwrap(), 1);

        assert_eq!(table.count(SymbolKind::Field), 2);
        assert_eq!(table.count(SymbolKind::Static), 1);
        assert_eq!(table.count(SymbolKind::Argument), 2);
        assert_eq!(table.count(SymbolKind::Local), 2);

        let mut locals: Vec<u16> =
            ["i", "j"].iter().map(|n| table.index_of(n).unwrap()).collect();
        locals.sort();
        assert_eq!(locals, vec![0, 1]);
    }

    #[test]
    fn lookups_report_type_and_kind() {
        let mut table = SymbolTable::new();
        table.define("p", "Point", SymbolKind::Field).unwrap();
        assert_eq!(table.kind_of("p"), Some(SymbolKind::Field));
        assert_eq!(table.type_of("p"), Some("Point"));
        assert_eq!(table.index_of("p"), Some(0));
        assert_eq!(table.lookup("q"), None);
        assert_eq!(SymbolKind::Field.segment(), Segment::This);
    }

    #[test]
    fn start_subroutine_clears_only_subroutine_scope() {
        let mut table = SymbolTable::new();
        table.define("f", "int", SymbolKind::Field).unwrap();
        table.define("x", "int", SymbolKind::Local).unwrap();
        table.define("a", "int", SymbolKind::Argument).unwrap();

        table.start_subroutine();
        assert_eq!(table.kind_of("x"), None);
        assert_eq!(table.kind_of("a"), None);
        assert_eq!(table.kind_of("f"), Some(SymbolKind::Field));
        assert_eq!(table.count(SymbolKind::Local), 0);
        assert_eq!(table.count(SymbolKind::Field), 1);

        assert_eq!(table.define("x", "int", SymbolKind::Local).unwrap(), 0);
    }

    #[test]
    fn duplicate_in_same_scope_fails() {
        let mut table = SymbolTable::new();
        table.define("x", "int", SymbolKind::Local).unwrap();
        let err = table.define("x", "char", SymbolKind::Local).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DuplicateSymbol);

        let err = table.define("x", "int", SymbolKind::Argument).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DuplicateSymbol);

        table.define("s", "int", SymbolKind::Static).unwrap();
        let err = table.define("s", "int", SymbolKind::Field).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DuplicateSymbol);
    }

    #[test]
    fn receiver_slot_collides_with_argument_named_this() {
        let mut table = SymbolTable::new();
        table.define("this", "Point", SymbolKind::Argument).unwrap();
        let err = table.define("this", "int", SymbolKind::Argument).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DuplicateSymbol);
        assert_eq!(table.index_of("this"), Some(0));
    }

    #[test]
    fn index_space_exhaustion_is_an_error() {
        let mut table = SymbolTable::new();
        for i in 0..=u32::from(u16::MAX) - 1 {
            table.define(&format!("v{i}"), "int", SymbolKind::Local).unwrap();
        }
        assert_eq!(table.count(SymbolKind::Local), u16::MAX);
        let err = table.define("last", "int", SymbolKind::Local).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnexpectedToken);
        assert_eq!(table.lookup("last"), None);
        // Other kinds keep their own counters.
        assert_eq!(table.define("a", "int", SymbolKind::Argument).unwrap(), 0);
    }

    #[test]
    fn local_shadows_field() {
        let mut table = SymbolTable::new();
        table.define("x", "int", SymbolKind::Field).unwrap();
        table.define("y", "int", SymbolKind::Field).unwrap();
        table.define("x", "boolean", SymbolKind::Local).unwrap();

        assert_eq!(table.kind_of("x"), Some(SymbolKind::Local));
        assert_eq!(table.type_of("x"), Some("boolean"));
        assert_eq!(table.kind_of("y"), Some(SymbolKind::Field));

        table.start_subroutine();
        assert_eq!(table.kind_of("x"), Some(SymbolKind::Field));
    }
}
