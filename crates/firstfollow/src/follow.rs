//! FOLLOW sets.

use crate::{
    engine::SetEngine,
    grammar::{SymbolID, SymbolSet},
    types::Map,
};

/// FOLLOW sets of every nonterminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowSets {
    map: Map<SymbolID, SymbolSet>,
    passes: usize,
    converged: bool,
}

impl FollowSets {
    pub fn get(&self, id: SymbolID) -> Option<&SymbolSet> {
        self.map.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymbolID, &SymbolSet)> + '_ {
        self.map.iter().map(|(id, set)| (*id, set))
    }

    /// The number of passes run over the relaxations.
    pub fn passes(&self) -> usize {
        self.passes
    }

    /// Whether the fixpoint has been reached.
    ///
    /// If not, every set is a subset of the exact FOLLOW set.
    pub fn is_converged(&self) -> bool {
        self.converged
    }
}

/// One occurrence of a nonterminal `target` in a production of `source`,
/// `source -> α target β`.
#[derive(Debug)]
struct Relaxation {
    target: SymbolID,
    source: SymbolID,
    /// `First(β) - {ε}`
    first_beta: SymbolSet,
    /// `ε ∈ First(β)`, the target inherits `Follow(source)`.
    inherits: bool,
}

/// Iterative solver of the FOLLOW fixpoint.
#[derive(Debug)]
pub struct FollowSolver {
    relaxations: Vec<Relaxation>,
    sets: Map<SymbolID, SymbolSet>,
    passes: usize,
}

impl FollowSolver {
    /// Extract the relaxations from the grammar owned by `engine`, and seed
    /// the FOLLOW set of the start symbol with `$`.
    pub fn new(engine: &mut SetEngine<'_>) -> Self {
        let grammar = engine.grammar();
        let nonterminals = engine.classification().nonterminals.clone();

        let mut sets: Map<SymbolID, SymbolSet> = nonterminals
            .iter()
            .map(|id| (*id, SymbolSet::default()))
            .collect();
        if let Some(start) = grammar.start_symbol {
            sets.entry(start).or_default().insert(SymbolID::END_MARKER);
        }

        let mut relaxations = vec![];
        for (&source, productions) in &grammar.rules {
            for production in productions {
                for (i, &target) in production.right.iter().enumerate() {
                    if !nonterminals.contains(&target) {
                        continue;
                    }
                    let mut first_beta = engine.first_of_sequence(&production.right, i + 1);
                    let inherits = first_beta.remove(SymbolID::EPSILON);
                    relaxations.push(Relaxation {
                        target,
                        source,
                        first_beta,
                        inherits,
                    });
                }
            }
        }

        Self {
            relaxations,
            sets,
            passes: 0,
        }
    }

    /// Apply every relaxation once, returning whether any set has grown.
    pub fn pass(&mut self) -> bool {
        let mut changed = false;
        for r in &self.relaxations {
            let mut added = r.first_beta.clone();
            if r.inherits {
                if let Some(follow) = self.sets.get(&r.source) {
                    added.union_with(follow);
                }
            }
            if let Some(follow) = self.sets.get_mut(&r.target) {
                changed |= follow.union_with(&added);
            }
        }
        self.passes += 1;
        changed
    }

    /// The current, possibly intermediate, FOLLOW sets.
    pub fn sets(&self) -> &Map<SymbolID, SymbolSet> {
        &self.sets
    }

    pub fn passes(&self) -> usize {
        self.passes
    }

    /// Repeat passes until no set grows, or until `max_passes` passes have run.
    pub fn solve(mut self, max_passes: Option<usize>) -> FollowSets {
        // 値が更新されなくなるまで繰り返す
        let converged = loop {
            if max_passes.map_or(false, |max| self.passes >= max) {
                break false;
            }
            if !self.pass() {
                break true;
            }
        };
        FollowSets {
            map: self.sets,
            passes: self.passes,
            converged,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        engine::Config,
        grammar::{examples, Grammar},
    };

    fn follow_names(g: &Grammar, follow: &FollowSets, name: &str) -> Vec<String> {
        let id = g.lookup(name).unwrap();
        let set = follow.get(id).unwrap();
        set.names(g).into_iter().map(String::from).collect()
    }

    #[test]
    fn follow_of_expression_grammar() {
        let g = Grammar::define(examples::expression).unwrap();
        let follow = SetEngine::new(&g).follow_sets();
        assert!(follow.is_converged());
        assert_eq!(follow_names(&g, &follow, "E"), ["$", ")"]);
        assert_eq!(follow_names(&g, &follow, "E'"), ["$", ")"]);
        assert_eq!(follow_names(&g, &follow, "T"), ["$", ")", "+"]);
        assert_eq!(follow_names(&g, &follow, "T'"), ["$", ")", "+"]);
        assert_eq!(follow_names(&g, &follow, "F"), ["$", ")", "*", "+"]);
    }

    #[test]
    fn follow_of_left_recursive_grammar() {
        let g = Grammar::define(examples::arithmetic).unwrap();
        let follow = SetEngine::new(&g).follow_sets();
        assert_eq!(follow_names(&g, &follow, "expr"), ["$", ")", "+", "-"]);
        for name in ["term", "factor", "atom"] {
            assert_eq!(
                follow_names(&g, &follow, name),
                ["$", ")", "*", "+", "-", "/"]
            );
        }
    }

    #[test]
    fn follow_through_nullable_suffix() {
        let g = Grammar::define(examples::with_nullable).unwrap();
        let follow = SetEngine::new(&g).follow_sets();
        assert_eq!(follow_names(&g, &follow, "E"), ["$", ")", "+", "num"]);
        assert_eq!(follow_names(&g, &follow, "T"), ["$", ")", "+", "num"]);
        assert_eq!(follow_names(&g, &follow, "n"), ["$", ")", "+", "a", "num"]);
    }

    #[test]
    fn passes_are_monotone() {
        let g = Grammar::define(examples::expression).unwrap();
        let mut engine = SetEngine::new(&g);
        engine.first_sets();
        let mut solver = FollowSolver::new(&mut engine);

        let mut history = vec![solver.sets().clone()];
        while solver.pass() {
            history.push(solver.sets().clone());
        }
        let last = solver.sets().clone();
        assert_eq!(history.last(), Some(&last));

        for (prev, next) in history.iter().zip(&history[1..]) {
            for (id, set) in prev {
                assert!(set.is_subset(&next[id]));
            }
        }
        for snapshot in &history {
            for (id, set) in snapshot {
                assert!(set.is_subset(&last[id]));
            }
        }
    }

    #[test]
    fn trivial_grammar_is_seeded() {
        let g = Grammar::from_productions([("S", vec!["a"])], None).unwrap();
        let follow = SetEngine::new(&g).follow_sets();
        assert_eq!(follow_names(&g, &follow, "S"), ["$"]);
    }

    #[test]
    fn pass_limit_is_reported() {
        let g = Grammar::define(examples::expression).unwrap();
        let mut engine = SetEngine::with_config(&g, Config::new().max_follow_passes(1));
        let follow = engine.follow_sets();
        assert!(!follow.is_converged());
        assert_eq!(follow.passes(), 1);
        assert!(engine
            .diagnostics()
            .iter()
            .any(|d| matches!(d, crate::engine::Diagnostic::NonConvergence { passes: 1 })));

        // the partial result is a lower bound of the exact one.
        let exact = SetEngine::new(&g).follow_sets();
        for (id, set) in follow.iter() {
            assert!(set.is_subset(exact.get(id).unwrap()));
        }
    }

    #[test]
    fn zero_pass_limit() {
        let g = Grammar::define(examples::expression).unwrap();
        let follow = SetEngine::with_config(&g, Config::new().max_follow_passes(0)).follow_sets();
        assert!(!follow.is_converged());
        assert_eq!(follow.passes(), 0);
        assert_eq!(follow_names(&g, &follow, "E"), ["$"]);
        assert!(follow_names(&g, &follow, "T").is_empty());
    }

    #[test]
    fn epsilon_never_follows() {
        for def in [
            examples::expression,
            examples::arithmetic,
            examples::with_nullable,
            examples::mutual_left_recursion,
        ] {
            let g = Grammar::define(def).unwrap();
            let follow = SetEngine::new(&g).follow_sets();
            for (_, set) in follow.iter() {
                assert!(!set.contains(SymbolID::EPSILON));
            }
        }
    }
}
