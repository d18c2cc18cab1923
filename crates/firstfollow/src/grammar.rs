//! Grammar types.

use crate::types::Map;
use std::fmt;

/// The textual name of [`SymbolID::EPSILON`].
pub const EPSILON_NAME: &str = "ε";

/// The textual name of [`SymbolID::END_MARKER`].
pub const END_MARKER_NAME: &str = "$";

/// An interned grammar symbol.
///
/// Whether a symbol is a terminal or a nonterminal is not recorded here;
/// it is derived from the production set by [`crate::classify`].
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolID(u16);

impl SymbolID {
    /// Reserved symbol that denotes the empty derivation.
    pub const EPSILON: Self = Self(0);

    /// Reserved symbol that denotes the end of input.
    pub const END_MARKER: Self = Self(1);

    const OFFSET: u16 = 2;

    #[inline]
    pub const fn into_raw(self) -> u16 {
        self.0
    }

    #[inline]
    pub const fn is_reserved(self) -> bool {
        self.0 < Self::OFFSET
    }

    #[inline]
    fn index(self) -> usize {
        self.0.into()
    }
}

impl fmt::Debug for SymbolID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            &Self::EPSILON => write!(f, "S#Eps"),
            &Self::END_MARKER => write!(f, "S#End"),
            _ => write!(f, "S#{:03}", self.0),
        }
    }
}

/// A set of grammar symbols, stored as a bit set over the symbol indices.
#[derive(Debug, Default, Clone)]
pub struct SymbolSet {
    inner: bit_set::BitSet,
}

impl SymbolSet {
    pub fn contains(&self, id: SymbolID) -> bool {
        self.inner.contains(id.index())
    }

    pub fn insert(&mut self, id: SymbolID) -> bool {
        self.inner.insert(id.index())
    }

    pub fn remove(&mut self, id: SymbolID) -> bool {
        self.inner.remove(id.index())
    }

    /// Add all elements of `other`, returning whether this set has grown.
    pub fn union_with(&mut self, other: &Self) -> bool {
        let before = self.inner.len();
        self.inner.union_with(&other.inner);
        self.inner.len() != before
    }

    pub fn is_subset(&self, other: &Self) -> bool {
        self.inner.is_subset(&other.inner)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = SymbolID> + '_ {
        self.inner
            .iter()
            .filter_map(|raw| u16::try_from(raw).ok().map(SymbolID))
    }

    /// Return the element names in lexicographic order.
    pub fn names<'g>(&self, g: &'g Grammar) -> Vec<&'g str> {
        let mut names: Vec<_> = self.iter().map(|id| g.name(id)).collect();
        names.sort_unstable();
        names
    }

    // `"{ a, b, c }"`
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        struct SymbolSetDisplay<'g> {
            set: &'g SymbolSet,
            grammar: &'g Grammar,
        }
        impl fmt::Display for SymbolSetDisplay<'_> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let names = self.set.names(self.grammar);
                if names.is_empty() {
                    return f.write_str("{ }");
                }
                write!(f, "{{ {} }}", names.join(", "))
            }
        }
        SymbolSetDisplay { set: self, grammar: g }
    }
}

impl PartialEq for SymbolSet {
    fn eq(&self, other: &Self) -> bool {
        self.inner.iter().eq(other.inner.iter())
    }
}
impl Eq for SymbolSet {}

impl FromIterator<SymbolID> for SymbolSet {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = SymbolID>,
    {
        Self {
            inner: iter.into_iter().map(SymbolID::index).collect(),
        }
    }
}

/// A right-hand side alternative of a nonterminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Production {
    pub left: SymbolID,
    pub right: Vec<SymbolID>,
}

impl Production {
    // `"LHS -> R1 R2 R3"`
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        struct ProductionDisplay<'g> {
            production: &'g Production,
            grammar: &'g Grammar,
        }
        impl fmt::Display for ProductionDisplay<'_> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let g = self.grammar;
                write!(f, "{} ->", g.name(self.production.left))?;
                if self.production.right.is_empty() {
                    write!(f, " {}", EPSILON_NAME)?;
                }
                for symbol in &self.production.right {
                    write!(f, " {}", g.name(*symbol))?;
                }
                Ok(())
            }
        }
        ProductionDisplay {
            production: self,
            grammar: g,
        }
    }
}

/// A context-free grammar.
///
/// The keys of `rules` are the nonterminals of the grammar. A nonterminal
/// may be declared without any production, which is reported as an
/// undefined symbol during the analysis.
#[derive(Debug)]
#[non_exhaustive]
pub struct Grammar {
    pub symbols: Map<SymbolID, String>,
    pub rules: Map<SymbolID, Vec<Production>>,
    /// `None` only when the grammar has no rules at all.
    pub start_symbol: Option<SymbolID>,
}

impl Grammar {
    /// Define a grammar using the specified function.
    pub fn define<F>(f: F) -> Result<Self, GrammarDefError>
    where
        F: FnOnce(&mut GrammarDef) -> Result<(), GrammarDefError>,
    {
        let mut def = GrammarDef {
            symbols: Map::default(),
            names: Map::default(),
            rules: Map::default(),
            start_symbol: None,
            next_symbol: SymbolID::OFFSET,
        };
        def.register(SymbolID::EPSILON, EPSILON_NAME);
        def.register(SymbolID::END_MARKER, END_MARKER_NAME);

        f(&mut def)?;

        def.end()
    }

    /// Build a grammar from a list of `(left, right)` productions.
    ///
    /// The start symbol is `start_hint` if specified, otherwise the
    /// left-hand side of the first production.
    pub fn from_productions<I, L, R, S>(
        productions: I,
        start_hint: Option<&str>,
    ) -> Result<Self, GrammarDefError>
    where
        I: IntoIterator<Item = (L, R)>,
        L: AsRef<str>,
        R: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::define(|g| {
            for (left, right) in productions {
                let left = g.nonterminal(left.as_ref())?;
                let right = right
                    .into_iter()
                    .map(|s| g.symbol(s.as_ref()))
                    .collect::<Result<Vec<_>, _>>()?;
                g.production(left, right)?;
            }
            if let Some(name) = start_hint {
                let start = g
                    .lookup(name)
                    .ok_or_else(|| GrammarDefError::UnknownStartSymbol { name: name.into() })?;
                g.start_symbol(start);
            }
            Ok(())
        })
    }

    /// Return the name of the specified symbol.
    pub fn name(&self, id: SymbolID) -> &str {
        self.symbols.get(&id).map_or("<unknown>", |s| s.as_str())
    }

    pub fn lookup(&self, name: &str) -> Option<SymbolID> {
        self.symbols
            .iter()
            .find_map(|(id, n)| (n == name).then_some(*id))
    }

    /// Return the productions of `id`, or an empty slice if it has none.
    pub fn productions(&self, id: SymbolID) -> &[Production] {
        self.rules.get(&id).map_or(&[], |p| &p[..])
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#### nonterminals: ")?;
        for (i, id) in self.rules.keys().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", self.name(*id))?;
            if Some(*id) == self.start_symbol {
                f.write_str(" (start)")?;
            }
        }
        writeln!(f, "\n#### productions:")?;
        for p in self.rules.values().flatten() {
            writeln!(f, "- {}", p.display(self))?;
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum GrammarDefError {
    #[error("the start symbol `{name}' is not a nonterminal")]
    UnknownStartSymbol { name: String },

    #[error("the reserved symbol `{name}' cannot have productions")]
    ReservedSymbol { name: String },

    #[error("the symbol {id:?} is not declared in this grammar")]
    UnknownSymbol { id: SymbolID },

    #[error("too many symbols in the grammar")]
    TooManySymbols,
}

/// The contextual values for building a `Grammar`.
#[derive(Debug)]
pub struct GrammarDef {
    symbols: Map<SymbolID, String>,
    names: Map<String, SymbolID>,
    rules: Map<SymbolID, Vec<Production>>,
    start_symbol: Option<SymbolID>,
    next_symbol: u16,
}

impl GrammarDef {
    fn register(&mut self, id: SymbolID, name: &str) {
        self.symbols.insert(id, name.to_owned());
        self.names.insert(name.to_owned(), id);
    }

    /// Intern a symbol used in this grammar.
    ///
    /// `ε` and `$` resolve to the reserved symbols.
    pub fn symbol(&mut self, name: &str) -> Result<SymbolID, GrammarDefError> {
        if let Some(id) = self.names.get(name) {
            return Ok(*id);
        }
        let id = SymbolID(self.next_symbol);
        self.next_symbol = self
            .next_symbol
            .checked_add(1)
            .ok_or(GrammarDefError::TooManySymbols)?;
        self.register(id, name);
        Ok(id)
    }

    /// Declare a nonterminal symbol, even if it has no productions.
    pub fn nonterminal(&mut self, name: &str) -> Result<SymbolID, GrammarDefError> {
        let id = self.symbol(name)?;
        if id.is_reserved() {
            return Err(GrammarDefError::ReservedSymbol { name: name.into() });
        }
        self.rules.entry(id).or_default();
        Ok(id)
    }

    pub fn lookup(&self, name: &str) -> Option<SymbolID> {
        self.names.get(name).copied()
    }

    /// Specify a production rule into this grammar.
    pub fn production<I>(&mut self, left: SymbolID, right: I) -> Result<(), GrammarDefError>
    where
        I: IntoIterator<Item = SymbolID>,
    {
        if left.is_reserved() {
            return Err(GrammarDefError::ReservedSymbol {
                name: self.symbols[&left].clone(),
            });
        }
        let right: Vec<_> = right.into_iter().collect();
        for id in Some(&left).into_iter().chain(&right) {
            if !self.symbols.contains_key(id) {
                return Err(GrammarDefError::UnknownSymbol { id: *id });
            }
        }

        let productions = self.rules.entry(left).or_default();
        if productions.iter().any(|p| p.right == right) {
            tracing::warn!(
                "duplicated production rule for `{}' is ignored",
                self.symbols[&left]
            );
            return Ok(());
        }
        productions.push(Production { left, right });
        Ok(())
    }

    pub fn start_symbol(&mut self, start: SymbolID) {
        self.start_symbol.replace(start);
    }

    fn end(self) -> Result<Grammar, GrammarDefError> {
        let start_symbol = match self.start_symbol {
            Some(start) if !self.rules.contains_key(&start) => {
                return Err(GrammarDefError::UnknownStartSymbol {
                    name: self
                        .symbols
                        .get(&start)
                        .cloned()
                        .unwrap_or_else(|| format!("{:?}", start)),
                });
            }
            Some(start) => Some(start),
            None => self.rules.first().map(|(id, _)| *id),
        };

        Ok(Grammar {
            symbols: self.symbols,
            rules: self.rules,
            start_symbol,
        })
    }
}

pub mod examples {
    //! Grammars shared by the tests and the benchmarks.

    use super::*;

    /// The classic expression grammar without left recursion.
    ///
    /// ```text
    /// E  -> T E'
    /// E' -> + T E' | ε
    /// T  -> F T'
    /// T' -> * F T' | ε
    /// F  -> ( E ) | id
    /// ```
    pub fn expression(g: &mut GrammarDef) -> Result<(), GrammarDefError> {
        let plus = g.symbol("+")?;
        let star = g.symbol("*")?;
        let lparen = g.symbol("(")?;
        let rparen = g.symbol(")")?;
        let id = g.symbol("id")?;

        let e = g.nonterminal("E")?;
        let e_ = g.nonterminal("E'")?;
        let t = g.nonterminal("T")?;
        let t_ = g.nonterminal("T'")?;
        let f = g.nonterminal("F")?;

        g.start_symbol(e);

        g.production(e, [t, e_])?;
        g.production(e_, [plus, t, e_])?;
        g.production(e_, [SymbolID::EPSILON])?;
        g.production(t, [f, t_])?;
        g.production(t_, [star, f, t_])?;
        g.production(t_, [SymbolID::EPSILON])?;
        g.production(f, [lparen, e, rparen])?;
        g.production(f, [id])?;
        Ok(())
    }

    /// Left-recursive arithmetic expressions.
    pub fn arithmetic(g: &mut GrammarDef) -> Result<(), GrammarDefError> {
        let lparen = g.symbol("(")?;
        let rparen = g.symbol(")")?;
        let plus = g.symbol("+")?;
        let minus = g.symbol("-")?;
        let star = g.symbol("*")?;
        let slash = g.symbol("/")?;
        let num = g.symbol("NUM")?;

        let expr = g.nonterminal("expr")?;
        let term = g.nonterminal("term")?;
        let factor = g.nonterminal("factor")?;
        let atom = g.nonterminal("atom")?;

        g.start_symbol(expr);

        g.production(expr, [expr, plus, term])?;
        g.production(expr, [expr, minus, term])?;
        g.production(expr, [term])?;

        g.production(term, [term, star, factor])?;
        g.production(term, [term, slash, factor])?;
        g.production(term, [factor])?;

        g.production(factor, [minus, factor])?;
        g.production(factor, [atom])?;

        g.production(atom, [num])?;
        g.production(atom, [lparen, expr, rparen])?;
        Ok(())
    }

    /// A grammar with nullable nonterminals in the middle of productions.
    pub fn with_nullable(g: &mut GrammarDef) -> Result<(), GrammarDefError> {
        // E → E + T n | T
        // T → a | ( E n ) | n a
        // n → ε | num
        let lparen = g.symbol("(")?;
        let rparen = g.symbol(")")?;
        let plus = g.symbol("+")?;
        let a = g.symbol("a")?;
        let num = g.symbol("num")?;

        let expr = g.nonterminal("E")?;
        let term = g.nonterminal("T")?;
        let nullable = g.nonterminal("n")?;

        g.production(expr, [expr, plus, term, nullable])?;
        g.production(expr, [term])?;

        g.production(term, [a])?;
        g.production(term, [lparen, expr, nullable, rparen])?;
        g.production(term, [nullable, a])?;

        g.production(nullable, [])?;
        g.production(nullable, [num])?;
        Ok(())
    }

    /// Mutual left recursion through two nonterminals.
    #[allow(nonstandard_style)]
    pub fn mutual_left_recursion(g: &mut GrammarDef) -> Result<(), GrammarDefError> {
        // A → B a | c
        // B → A b | ε
        let a = g.symbol("a")?;
        let b = g.symbol("b")?;
        let c = g.symbol("c")?;

        let A = g.nonterminal("A")?;
        let B = g.nonterminal("B")?;

        g.production(A, [B, a])?;
        g.production(A, [c])?;
        g.production(B, [A, b])?;
        g.production(B, [])?;
        Ok(())
    }
}
