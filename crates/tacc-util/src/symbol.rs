//! Global string interning for identifiers.
//!
//! Every `IDENTIFIER` lexeme the lexer produces, and every `Variable`/
//! `Declaration`/`Assignment`/`Function`/`Call`/param name the parser
//! stores, is interned here rather than kept as an owned `String`. There
//! is no interning statistics or "known symbol" fast path, since this
//! crate has no fixed keyword-symbol table to special-case (keywords are
//! reclassified to dedicated `TokenKind` variants in `tacc-lex`, not
//! represented as `Symbol`s at all).

use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::fmt;

/// An interned identifier. Cheap to copy and compare.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symbol(u32);

thread_local! {
    static INTERNER: RefCell<Interner> = RefCell::new(Interner::new());
}

struct Interner {
    strings: Vec<&'static str>,
    lookup: FxHashMap<&'static str, u32>,
}

impl Interner {
    fn new() -> Self {
        Self {
            strings: Vec::new(),
            lookup: FxHashMap::default(),
        }
    }

    fn intern(&mut self, s: &str) -> u32 {
        if let Some(&id) = self.lookup.get(s) {
            return id;
        }
        // Leaked once per distinct identifier for the process's lifetime.
        // A toy compiler front-end never interns enough distinct names for
        // this to matter; a long-lived server would need an arena instead.
        let leaked: &'static str = Box::leak(s.to_string().into_boxed_str());
        let id = self.strings.len() as u32;
        self.strings.push(leaked);
        self.lookup.insert(leaked, id);
        id
    }

    fn resolve(&self, id: u32) -> &'static str {
        self.strings[id as usize]
    }
}

impl Symbol {
    pub fn intern(s: &str) -> Self {
        INTERNER.with(|i| Symbol(i.borrow_mut().intern(s)))
    }

    pub fn as_str(&self) -> &'static str {
        INTERNER.with(|i| i.borrow().resolve(self.0))
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({:?})", self.as_str())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl serde::Serialize for Symbol {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_text_interns_to_same_symbol() {
        let a = Symbol::intern("foo");
        let b = Symbol::intern("foo");
        assert_eq!(a, b);
    }

    #[test]
    fn different_text_interns_to_different_symbols() {
        let a = Symbol::intern("foo");
        let b = Symbol::intern("bar");
        assert_ne!(a, b);
    }

    #[test]
    fn round_trips_through_as_str() {
        let s = Symbol::intern("hello_world");
        assert_eq!(s.as_str(), "hello_world");
    }
}
