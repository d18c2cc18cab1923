//! FIRST set inference and the analysis entry point.

use crate::{
    classify::{classify, Classification, SymbolKind},
    follow::{FollowSets, FollowSolver},
    grammar::{Grammar, SymbolID, SymbolSet},
    types::Map,
};
use std::cmp;

/// Tunables of a [`SetEngine`].
#[derive(Debug, Default, Clone)]
#[non_exhaustive]
pub struct Config {
    pub max_follow_passes: Option<usize>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Give up the FOLLOW fixpoint after the specified number of passes.
    ///
    /// The FOLLOW sets returned after hitting the limit are only a lower bound
    /// and are reported through [`Diagnostic::NonConvergence`].
    pub fn max_follow_passes(mut self, passes: usize) -> Self {
        self.max_follow_passes = Some(passes);
        self
    }
}

/// Non-fatal conditions found during an analysis.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Diagnostic {
    #[error("symbol `{name}' is not defined in the grammar")]
    UndefinedSymbol { symbol: SymbolID, name: String },

    #[error("FOLLOW sets did not converge within the pass limit ({passes}); the result is a lower bound")]
    NonConvergence { passes: usize },
}

/// FIRST sets of every terminal, nonterminal and `ε`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirstSets {
    map: Map<SymbolID, SymbolSet>,
}

impl FirstSets {
    pub fn get(&self, id: SymbolID) -> Option<&SymbolSet> {
        self.map.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymbolID, &SymbolSet)> + '_ {
        self.map.iter().map(|(id, set)| (*id, set))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// The result of [`analyze`].
#[derive(Debug)]
pub struct Analysis {
    pub classification: Classification,
    pub first: FirstSets,
    pub follow: FollowSets,
    pub diagnostics: Vec<Diagnostic>,
}

/// Compute FIRST and FOLLOW sets of the specified grammar.
pub fn analyze(grammar: &Grammar) -> Analysis {
    SetEngine::new(grammar).analyze()
}

/// The owner of the memoized FIRST sets of a grammar.
///
/// FIRST sets are resolved recursively. The symbols currently being resolved
/// are kept on `stack`; a symbol that is reached again while on the stack
/// contributes its provisional value instead of recursing. Results that
/// depend on a provisional value of a lower stack entry are not memoized, and
/// the lowest entry of such a cycle re-evaluates itself until nothing grows,
/// and then finalizes every member of the cycle at once.
#[derive(Debug)]
pub struct SetEngine<'g> {
    grammar: &'g Grammar,
    classification: Classification,
    config: Config,
    first: Map<SymbolID, SymbolSet>,
    provisional: Map<SymbolID, SymbolSet>,
    stack: Vec<SymbolID>,
    /// Cycle members evaluated in the current iteration of their root, with
    /// the lowest stack depth they depend on.
    settled: Map<SymbolID, usize>,
    growth: usize,
    diagnostics: Vec<Diagnostic>,
}

impl<'g> SetEngine<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        Self::with_config(grammar, Config::default())
    }

    pub fn with_config(grammar: &'g Grammar, config: Config) -> Self {
        Self {
            grammar,
            classification: classify(grammar),
            config,
            first: Map::default(),
            provisional: Map::default(),
            stack: vec![],
            settled: Map::default(),
            growth: 0,
            diagnostics: vec![],
        }
    }

    pub fn grammar(&self) -> &'g Grammar {
        self.grammar
    }

    pub fn classification(&self) -> &Classification {
        &self.classification
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// `First(symbol)`
    pub fn first(&mut self, symbol: SymbolID) -> SymbolSet {
        self.resolve(symbol).0
    }

    /// `First(sequence[start..])`
    ///
    /// The result contains `ε` if every symbol of the suffix is nullable,
    /// in particular when the suffix is empty.
    pub fn first_of_sequence(&mut self, sequence: &[SymbolID], start: usize) -> SymbolSet {
        self.scan(sequence, start).0
    }

    /// Compute FIRST sets for every symbol of the grammar.
    pub fn first_sets(&mut self) -> FirstSets {
        let span = tracing::trace_span!("first_sets");
        let _entered = span.enter();

        let symbols: Vec<_> = self
            .classification
            .nonterminals
            .iter()
            .chain(&self.classification.terminals)
            .copied()
            .chain(Some(SymbolID::EPSILON))
            .collect();
        let map = symbols
            .into_iter()
            .map(|symbol| (symbol, self.first(symbol)))
            .collect();
        FirstSets { map }
    }

    /// Run the FOLLOW fixpoint over the grammar.
    pub fn follow_sets(&mut self) -> FollowSets {
        let span = tracing::trace_span!("follow_sets");
        let _entered = span.enter();

        let follow = FollowSolver::new(self).solve(self.config.max_follow_passes);
        tracing::debug!("FOLLOW sets settled after {} passes", follow.passes());
        if !follow.is_converged() {
            self.report(Diagnostic::NonConvergence {
                passes: follow.passes(),
            });
        }
        follow
    }

    pub fn analyze(mut self) -> Analysis {
        let span = tracing::trace_span!("analyze");
        let _entered = span.enter();

        let first = self.first_sets();
        let follow = self.follow_sets();
        Analysis {
            classification: self.classification,
            first,
            follow,
            diagnostics: self.diagnostics,
        }
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        tracing::warn!("{}", diagnostic);
        self.diagnostics.push(diagnostic);
    }

    /// Return `First(symbol)` and the lowest stack depth consulted while
    /// computing it (`usize::MAX` if the result is final).
    fn resolve(&mut self, symbol: SymbolID) -> (SymbolSet, usize) {
        if let Some(set) = self.first.get(&symbol) {
            return (set.clone(), usize::MAX);
        }

        match self.classification.kind(symbol) {
            SymbolKind::Terminal | SymbolKind::Epsilon | SymbolKind::EndMarker => {
                let set: SymbolSet = Some(symbol).into_iter().collect();
                self.first.insert(symbol, set.clone());
                return (set, usize::MAX);
            }
            SymbolKind::Nonterminal if !self.grammar.productions(symbol).is_empty() => (),
            SymbolKind::Nonterminal | SymbolKind::Unknown => {
                self.report(Diagnostic::UndefinedSymbol {
                    symbol,
                    name: self.grammar.name(symbol).to_owned(),
                });
                self.first.insert(symbol, SymbolSet::default());
                return (SymbolSet::default(), usize::MAX);
            }
        }

        if let Some(depth) = self.stack.iter().position(|s| *s == symbol) {
            let set = self.provisional.get(&symbol).cloned().unwrap_or_default();
            return (set, depth);
        }
        if let Some(&low) = self.settled.get(&symbol) {
            let set = self.provisional.get(&symbol).cloned().unwrap_or_default();
            return (set, low);
        }

        let depth = self.stack.len();
        let base = self.settled.len();
        self.stack.push(symbol);
        let (set, low) = loop {
            let growth = self.growth;
            let (set, low) = self.evaluate(symbol);

            let provisional = self.provisional.entry(symbol).or_default();
            if provisional.union_with(&set) {
                self.growth += 1;
            }

            // 循環の根でなければ、値が安定するまで繰り返す必要はない
            if low != depth || self.growth == growth {
                break (set, low);
            }
            self.settled.truncate(base);
        };
        self.stack.pop();

        if low < depth {
            // the members below no longer see this entry on the stack.
            for (_, l) in self.settled.iter_mut().skip(base) {
                *l = cmp::min(*l, low);
            }
            self.settled.insert(symbol, low);
            return (set, low);
        }

        for (member, _) in self.settled.drain(base..) {
            let value = self.provisional.swap_remove(&member).unwrap_or_default();
            self.first.insert(member, value);
        }
        self.provisional.swap_remove(&symbol);
        self.first.insert(symbol, set.clone());
        (set, usize::MAX)
    }

    fn evaluate(&mut self, symbol: SymbolID) -> (SymbolSet, usize) {
        let grammar = self.grammar;
        let mut result = SymbolSet::default();
        let mut low = usize::MAX;
        for production in grammar.productions(symbol) {
            let (set, l) = self.scan(&production.right, 0);
            result.union_with(&set);
            low = cmp::min(low, l);
        }
        (result, low)
    }

    fn scan(&mut self, sequence: &[SymbolID], start: usize) -> (SymbolSet, usize) {
        let mut result = SymbolSet::default();
        let mut low = usize::MAX;
        for &symbol in sequence.get(start..).unwrap_or(&[]) {
            let (first, l) = self.resolve(symbol);
            low = cmp::min(low, l);
            result.union_with(&first);
            result.remove(SymbolID::EPSILON);
            if !first.contains(SymbolID::EPSILON) {
                return (result, low);
            }
        }
        result.insert(SymbolID::EPSILON);
        (result, low)
    }
}
