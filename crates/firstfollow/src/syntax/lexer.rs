//! Lexer for the right-hand side of a rule line.

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Token<'input> {
    VertBar,
    Symbol(&'input str),
}

lexgen::lexer! {
    pub Lexer -> Token<'input>;

    rule Init {
        $$whitespace+,
        "|" = Token::VertBar,
        (_ # $$whitespace # '|')+ => |lexer| {
            let token = Token::Symbol(lexer.match_());
            lexer.return_(token)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Token::*;

    #[test]
    fn smoketest() {
        let input = " + T E' |ε| ( id->x )\t* ";
        let lexer = Lexer::new(input);
        let tokens = lexer
            .map(|res| res.map(|(_, t, _)| t))
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert!(matches!(
            dbg!(&tokens[..]),
            [
                Symbol("+"),
                Symbol("T"),
                Symbol("E'"),
                VertBar,
                Symbol("ε"),
                VertBar,
                Symbol("("),
                Symbol("id->x"),
                Symbol(")"),
                Symbol("*"),
            ]
        ));
    }

    #[test]
    fn unicode_whitespace() {
        let input = "a\u{a0}b\u{b}c\u{c}|\u{3000}d";
        let tokens = Lexer::new(input)
            .map(|res| res.map(|(_, t, _)| t))
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(
            tokens,
            [Symbol("a"), Symbol("b"), Symbol("c"), VertBar, Symbol("d")]
        );
    }
}
