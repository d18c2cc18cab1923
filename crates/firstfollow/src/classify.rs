//! Partition of grammar symbols into terminals and nonterminals.

use crate::{
    grammar::{Grammar, SymbolID},
    types::Set,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SymbolKind {
    Terminal,
    Nonterminal,
    Epsilon,
    EndMarker,
    /// Interned in the grammar, but neither a left-hand side nor used in any production.
    Unknown,
}

#[derive(Debug, Default, Clone)]
pub struct Classification {
    pub nonterminals: Set<SymbolID>,
    pub terminals: Set<SymbolID>,
}

impl Classification {
    pub fn kind(&self, id: SymbolID) -> SymbolKind {
        match id {
            SymbolID::EPSILON => SymbolKind::Epsilon,
            SymbolID::END_MARKER => SymbolKind::EndMarker,
            id if self.nonterminals.contains(&id) => SymbolKind::Nonterminal,
            id if self.terminals.contains(&id) => SymbolKind::Terminal,
            _ => SymbolKind::Unknown,
        }
    }
}

/// Derive the terminal/nonterminal partition from the production set.
///
/// Every left-hand side is a nonterminal. Every other symbol that appears in
/// a production body is a terminal, except for the reserved symbols.
pub fn classify(g: &Grammar) -> Classification {
    let nonterminals: Set<SymbolID> = g.rules.keys().copied().collect();
    let terminals = g
        .rules
        .values()
        .flatten()
        .flat_map(|p| p.right.iter().copied())
        .filter(|s| !s.is_reserved() && !nonterminals.contains(s))
        .collect();
    Classification {
        nonterminals,
        terminals,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::examples;

    fn names<'g>(g: &'g Grammar, set: &Set<SymbolID>) -> Vec<&'g str> {
        set.iter().map(|id| g.name(*id)).collect()
    }

    #[test]
    fn expression_grammar() {
        let g = Grammar::define(examples::expression).unwrap();
        let classes = classify(&g);
        assert_eq!(names(&g, &classes.nonterminals), ["E", "E'", "T", "T'", "F"]);
        assert_eq!(names(&g, &classes.terminals), ["+", "*", "(", ")", "id"]);
        assert_eq!(classes.kind(SymbolID::EPSILON), SymbolKind::Epsilon);
        assert_eq!(classes.kind(g.lookup("id").unwrap()), SymbolKind::Terminal);
        assert_eq!(classes.kind(g.lookup("T'").unwrap()), SymbolKind::Nonterminal);
    }

    #[test]
    fn end_marker_is_not_a_terminal() {
        let g = Grammar::from_productions([("S", vec!["a", "$"])], None).unwrap();
        let classes = classify(&g);
        assert_eq!(names(&g, &classes.terminals), ["a"]);
        assert_eq!(classes.kind(SymbolID::END_MARKER), SymbolKind::EndMarker);
    }

    #[test]
    fn unused_symbol_is_unknown() {
        let mut unused = None;
        let g = Grammar::define(|g| {
            unused = Some(g.symbol("unused")?);
            let s = g.nonterminal("S")?;
            g.production(s, [])
        })
        .unwrap();
        assert_eq!(classify(&g).kind(unused.unwrap()), SymbolKind::Unknown);
    }

    #[test]
    fn empty_grammar() {
        let g = Grammar::define(|_| Ok(())).unwrap();
        let classes = classify(&g);
        assert!(classes.nonterminals.is_empty());
        assert!(classes.terminals.is_empty());
    }
}
