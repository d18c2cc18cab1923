//! Syntax support for the line-oriented grammar description.
//!
//! ```text
//! # comment
//! E  -> T E'
//! E' -> + T E' | ε
//! ```
//!
//! Each line defines the alternatives of one nonterminal. Symbols are
//! separated by whitespace, and `ε` denotes the empty derivation. A malformed
//! line is reported and skipped, and the remaining lines are still parsed.

pub mod lexer;

use self::lexer::{Lexer, Token};
use crate::grammar::{Grammar, GrammarDefError, END_MARKER_NAME, EPSILON_NAME};
use std::{
    fs, io, mem,
    path::{Path, PathBuf},
};

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SyntaxError {
    #[error("failed to read the grammar file `{}'", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("line {line}: {kind}")]
    Malformed {
        line: usize,
        #[source]
        kind: LineError,
    },

    #[error(transparent)]
    Grammar(#[from] GrammarDefError),
}

/// The reason why a rule line is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum LineError {
    #[error("missing `->'")]
    MissingArrow,

    #[error("empty left-hand side")]
    EmptyLeftHandSide,

    #[error("the left-hand side `{0}' must be a single symbol")]
    InvalidLeftHandSide(String),

    #[error("the reserved symbol `{0}' cannot be used as the left-hand side")]
    ReservedLeftHandSide(String),

    #[error("unexpected character at byte {0}")]
    UnexpectedChar(usize),
}

/// A grammar together with the errors of the lines that were skipped.
#[derive(Debug)]
pub struct ParsedGrammar {
    pub grammar: Grammar,
    pub errors: Vec<SyntaxError>,
}

/// A rule line, `left -> alternatives[0] | alternatives[1] | ...`.
#[derive(Debug, PartialEq)]
struct RuleLine<'input> {
    left: &'input str,
    alternatives: Vec<Vec<&'input str>>,
}

pub fn parse_file(
    path: impl AsRef<Path>,
    start: Option<&str>,
) -> Result<ParsedGrammar, SyntaxError> {
    let path = path.as_ref();
    let source = fs::read_to_string(path).map_err(|source| SyntaxError::Io {
        path: path.to_owned(),
        source,
    })?;
    parse(&source, start)
}

/// Parse a grammar description.
///
/// The start symbol is `start` if specified, otherwise the left-hand side
/// of the first well-formed rule line.
pub fn parse(source: &str, start: Option<&str>) -> Result<ParsedGrammar, SyntaxError> {
    let span = tracing::trace_span!("parse");
    let _entered = span.enter();

    let mut rules = vec![];
    let mut errors = vec![];
    for (i, line) in source.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match parse_line(line) {
            Ok(rule) => {
                tracing::trace!("rule line: {:?}", rule);
                rules.push(rule);
            }
            Err(kind) => {
                let err = SyntaxError::Malformed { line: i + 1, kind };
                tracing::warn!("{}", err);
                errors.push(err);
            }
        }
    }

    let grammar = Grammar::define(|g| {
        for RuleLine { left, alternatives } in &rules {
            let left = g.nonterminal(left)?;
            for alternative in alternatives {
                let right = alternative
                    .iter()
                    .map(|s| g.symbol(s))
                    .collect::<Result<Vec<_>, _>>()?;
                g.production(left, right)?;
            }
        }
        if let Some(name) = start {
            let start = g
                .lookup(name)
                .ok_or_else(|| GrammarDefError::UnknownStartSymbol { name: name.into() })?;
            g.start_symbol(start);
        }
        Ok(())
    })?;

    Ok(ParsedGrammar { grammar, errors })
}

fn parse_line(line: &str) -> Result<RuleLine<'_>, LineError> {
    let (left, right) = line.split_once("->").ok_or(LineError::MissingArrow)?;
    let offset = left.len() + 2;

    let left = left.trim();
    if left.is_empty() {
        return Err(LineError::EmptyLeftHandSide);
    }
    if left.split_whitespace().nth(1).is_some() {
        return Err(LineError::InvalidLeftHandSide(left.into()));
    }
    if left == EPSILON_NAME || left == END_MARKER_NAME {
        return Err(LineError::ReservedLeftHandSide(left.into()));
    }

    // 空の選択肢は読み飛ばす
    let mut alternatives = vec![];
    let mut current = vec![];
    for token in Lexer::new(right) {
        let (_, token, _) =
            token.map_err(|e| LineError::UnexpectedChar(offset + e.location.byte_idx))?;
        match token {
            Token::VertBar => {
                if !current.is_empty() {
                    alternatives.push(mem::take(&mut current));
                }
            }
            Token::Symbol(symbol) => current.push(symbol),
        }
    }
    if !current.is_empty() {
        alternatives.push(current);
    }

    Ok(RuleLine { left, alternatives })
}
