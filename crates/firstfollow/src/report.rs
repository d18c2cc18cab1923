//! Human-readable reports of an analysis.

use crate::{
    engine::Analysis,
    grammar::{Grammar, SymbolID, SymbolSet},
};
use std::{fmt, path::Path};

/// Formatting of the analysis results.
///
/// Nonterminals and the elements of every set are listed in lexicographic
/// order, so that the report does not depend on the layout of the grammar.
#[derive(Debug, Clone, Copy)]
pub struct Report<'a> {
    grammar: &'a Grammar,
    analysis: &'a Analysis,
    source: Option<&'a Path>,
}

impl<'a> Report<'a> {
    pub fn new(grammar: &'a Grammar, analysis: &'a Analysis) -> Self {
        Self {
            grammar,
            analysis,
            source: None,
        }
    }

    /// Specify the path of the grammar file shown in the summary.
    pub fn source(mut self, path: &'a Path) -> Self {
        self.source = Some(path);
        self
    }

    /// The analysed grammar: start symbol, nonterminals and terminals.
    pub fn summary(self) -> impl fmt::Display + 'a {
        struct Summary<'a>(Report<'a>);
        impl fmt::Display for Summary<'_> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let Report {
                    grammar: g,
                    analysis,
                    source,
                } = self.0;
                if let Some(path) = source {
                    writeln!(f, "grammar: {}", path.display())?;
                }
                writeln!(
                    f,
                    "start symbol: {}",
                    g.start_symbol.map_or("<none>", |s| g.name(s))
                )?;
                let nonterminals = sorted_names(g, &analysis.classification.nonterminals);
                writeln!(f, "nonterminals: {}", nonterminals.join(", "))?;
                let terminals = sorted_names(g, &analysis.classification.terminals);
                writeln!(f, "terminals: {}", terminals.join(", "))
            }
        }
        Summary(self)
    }

    /// The FIRST and FOLLOW sets of every nonterminal.
    pub fn sets(self) -> impl fmt::Display + 'a {
        struct Sets<'a>(Report<'a>);
        impl fmt::Display for Sets<'_> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let Report {
                    grammar: g,
                    analysis,
                    ..
                } = self.0;
                let nonterminals = sorted(g, &analysis.classification.nonterminals);

                writeln!(f, "== FIRST sets ==")?;
                for &id in &nonterminals {
                    let first = analysis.first.get(id);
                    writeln!(f, "FIRST({}) = {}", g.name(id), display_set(g, first))?;
                }

                writeln!(f)?;
                let follow = &analysis.follow;
                if follow.is_converged() {
                    writeln!(f, "== FOLLOW sets ==")?;
                } else {
                    writeln!(
                        f,
                        "== FOLLOW sets (lower bound, not converged after {} pass{}) ==",
                        follow.passes(),
                        plural(follow.passes())
                    )?;
                }
                for &id in &nonterminals {
                    let set = follow.get(id);
                    writeln!(f, "FOLLOW({}) = {}", g.name(id), display_set(g, set))?;
                }
                Ok(())
            }
        }
        Sets(self)
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.summary())?;
        write!(f, "{}", self.sets())
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "es"
    }
}

fn sorted<'s>(g: &Grammar, symbols: impl IntoIterator<Item = &'s SymbolID>) -> Vec<SymbolID> {
    let mut symbols: Vec<_> = symbols.into_iter().copied().collect();
    symbols.sort_by(|a, b| g.name(*a).cmp(g.name(*b)));
    symbols
}

fn sorted_names<'g, 's>(
    g: &'g Grammar,
    symbols: impl IntoIterator<Item = &'s SymbolID>,
) -> Vec<&'g str> {
    sorted(g, symbols).into_iter().map(|id| g.name(id)).collect()
}

fn display_set<'g>(g: &'g Grammar, set: Option<&'g SymbolSet>) -> impl fmt::Display + 'g {
    struct OptionalSet<'g>(&'g Grammar, Option<&'g SymbolSet>);
    impl fmt::Display for OptionalSet<'_> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self.1 {
                Some(set) => write!(f, "{}", set.display(self.0)),
                None => f.write_str("{ }"),
            }
        }
    }
    OptionalSet(g, set)
}
