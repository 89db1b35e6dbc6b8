use std::fmt::{Debug, Display, Formatter};

use compact_str::CompactString;

use crate::errors::ParseError;

/// Position of a single character in the input, 0-based. Displayed 1-based.
#[derive(Copy, Clone, Debug, Ord, PartialOrd, Eq, PartialEq)]
pub struct Pos {
    pub line: u32,
    pub column: u32,
}

impl Display for Pos {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.column + 1)
    }
}

/// A bare symbol together with the position it was read from.
///
/// Symbols are kept exactly as written; callers that want case-insensitive
/// comparison normalize on their side.
#[derive(Clone, Debug)]
pub struct Sym {
    text: CompactString,
    pos: Pos,
}

impl Sym {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn canonical(&self) -> CompactString {
        self.text.clone()
    }

    pub fn pos(&self) -> Pos {
        self.pos
    }

    pub fn invalid(&self, error: impl Into<String>) -> ParseError {
        ParseError::new(error, Some(self.pos))
    }
}

impl Display for Sym {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}

#[derive(Clone)]
pub struct SList {
    list: Vec<SExpr>,
    pos: Pos,
}

impl SList {
    pub fn iter(&self) -> ListIter {
        ListIter {
            elems: self.list.as_slice(),
            pos: self.pos,
        }
    }

    pub fn pos(&self) -> Pos {
        self.pos
    }

    pub fn invalid(&self, error: impl Into<String>) -> ParseError {
        ParseError::new(error, Some(self.pos))
    }
}

#[derive(Clone)]
pub enum SExpr {
    Atom(Sym),
    List(SList),
}

impl SExpr {
    pub fn pos(&self) -> Pos {
        match self {
            SExpr::Atom(atom) => atom.pos,
            SExpr::List(list) => list.pos,
        }
    }

    pub fn invalid(&self, error: impl Into<String>) -> ParseError {
        ParseError::new(error, Some(self.pos()))
    }

    pub fn is_atom(&self, expected: &str) -> bool {
        self.as_atom().map(|a| a.as_str() == expected).unwrap_or(false)
    }

    pub fn as_atom(&self) -> Option<&Sym> {
        match self {
            SExpr::Atom(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&SList> {
        match self {
            SExpr::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_list_iter(&self) -> Option<ListIter> {
        self.as_list().map(SList::iter)
    }

    /// If this s-expression is the application of `head`, returns the
    /// arguments of the application.
    pub fn as_application(&self, head: &str) -> Option<&[SExpr]> {
        match self {
            SExpr::Atom(_) => None,
            SExpr::List(l) => match l.list.as_slice() {
                [SExpr::Atom(first), rest @ ..] if first.as_str() == head => Some(rest),
                _ => None,
            },
        }
    }
}

impl Display for SExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SExpr::Atom(a) => write!(f, "{a}"),
            SExpr::List(l) => {
                write!(f, "(")?;
                let mut it = l.list.iter().peekable();
                while let Some(e) = it.next() {
                    write!(f, "{e}")?;
                    if it.peek().is_some() {
                        write!(f, " ")?;
                    }
                }
                write!(f, ")")
            }
        }
    }
}

impl Debug for SExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self}")
    }
}

pub struct ListIter<'a> {
    elems: &'a [SExpr],
    pos: Pos,
}

impl<'a> ListIter<'a> {
    pub fn peek(&self) -> Option<&'a SExpr> {
        self.elems.first()
    }

    pub fn pop(&mut self) -> Result<&'a SExpr, ParseError> {
        self.next()
            .ok_or_else(|| ParseError::new("Unexpected end of list", Some(self.pos)))
    }

    pub fn pop_atom(&mut self) -> Result<&'a Sym, ParseError> {
        match self.next() {
            None => Err(ParseError::new("Expected an atom but got end of list", Some(self.pos))),
            Some(sexpr) => sexpr.as_atom().ok_or_else(|| sexpr.invalid("Expected an atom")),
        }
    }

    pub fn pop_known_atom(&mut self, expected: &str) -> Result<(), ParseError> {
        let sym = self
            .next()
            .ok_or_else(|| ParseError::new(format!("Expected atom `{expected}` but got end of list"), Some(self.pos)))?;
        let sym = sym
            .as_atom()
            .ok_or_else(|| sym.invalid(format!("Expected the atom `{expected}`")))?;
        if sym.as_str() == expected {
            Ok(())
        } else {
            Err(sym.invalid(format!("Expected the atom `{expected}`")))
        }
    }

    pub fn pop_list(&mut self) -> Result<&'a SList, ParseError> {
        match self.next() {
            None => Err(ParseError::new("Expected a list but got end of list", Some(self.pos))),
            Some(sexpr) => sexpr.as_list().ok_or_else(|| sexpr.invalid("Expected a list")),
        }
    }

    pub fn len(&self) -> usize {
        self.elems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    pub fn invalid(&self, error: impl Into<String>) -> ParseError {
        ParseError::new(error, Some(self.pos))
    }
}

impl<'a> Iterator for ListIter<'a> {
    type Item = &'a SExpr;

    fn next(&mut self) -> Option<Self::Item> {
        let (head, tail) = self.elems.split_first()?;
        self.elems = tail;
        Some(head)
    }
}

#[derive(Debug, PartialEq)]
enum Token<'a> {
    Sym { text: &'a str, pos: Pos },
    LParen(Pos),
    RParen(Pos),
}

impl<'a> Token<'a> {
    fn pos(&self) -> Pos {
        match *self {
            Token::Sym { pos, .. } => pos,
            Token::LParen(pos) => pos,
            Token::RParen(pos) => pos,
        }
    }
}

/// Parses the input into a single s-expression.
///
/// Comments run from `;` to the end of the line. Anything left over after the
/// first complete expression (for instance the closing parenthesis of an
/// unbalanced input) is an error.
pub fn parse(input: &str) -> Result<SExpr, ParseError> {
    let tokens = tokenize(input);
    let mut tokens = tokens.iter().peekable();
    let expr = read(&mut tokens)?;
    match tokens.next() {
        None => Ok(expr),
        Some(tok) => Err(ParseError::new("Unexpected token after expression", Some(tok.pos()))),
    }
}

/// Scans the input into parentheses and maximal runs of non-whitespace,
/// non-parenthesis characters.
fn tokenize(input: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();

    // start of the symbol currently being scanned, with its position
    let mut cur_start: Option<(usize, Pos)> = None;
    let mut line: u32 = 0;
    let mut column: u32 = 0;
    let mut in_comment = false;

    for (index, c) in input.char_indices() {
        if c.is_whitespace() || c == '(' || c == ')' || c == ';' || in_comment {
            if let Some((start, pos)) = cur_start.take() {
                tokens.push(Token::Sym {
                    text: &input[start..index],
                    pos,
                });
            }
            if c == '\n' {
                line += 1;
                column = 0;
                in_comment = false;
                continue;
            } else if c == ';' {
                in_comment = true;
            } else if !in_comment {
                let pos = Pos { line, column };
                if c == '(' {
                    tokens.push(Token::LParen(pos));
                } else if c == ')' {
                    tokens.push(Token::RParen(pos));
                }
            }
        } else if cur_start.is_none() {
            cur_start = Some((index, Pos { line, column }));
        }
        column += 1;
    }
    if let Some((start, pos)) = cur_start {
        tokens.push(Token::Sym {
            text: &input[start..],
            pos,
        });
    }
    tokens
}

fn read<'a>(tokens: &mut std::iter::Peekable<core::slice::Iter<'_, Token<'a>>>) -> Result<SExpr, ParseError> {
    match tokens.next() {
        Some(Token::Sym { text, pos }) => Ok(SExpr::Atom(Sym {
            text: CompactString::from(*text),
            pos: *pos,
        })),
        Some(Token::LParen(start)) => {
            let mut list = Vec::new();
            loop {
                match tokens.peek() {
                    Some(Token::RParen(_)) => {
                        let _ = tokens.next();
                        break Ok(SExpr::List(SList { list, pos: *start }));
                    }
                    Some(_) => list.push(read(tokens)?),
                    None => break Err(ParseError::new("Unclosed parenthesis", Some(*start))),
                }
            }
        }
        Some(Token::RParen(pos)) => Err(ParseError::new("Unexpected closing parenthesis", Some(*pos))),
        None => Err(ParseError::new("Unexpected end of input", None)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn formats_as(input: &str, output: &str) {
        let res = parse(input).unwrap();
        let formatted = format!("{res}");
        assert_eq!(&formatted, output);
    }

    #[test]
    fn parsing() {
        formats_as("aa", "aa");
        formats_as(" aa", "aa");
        formats_as("aa ", "aa");
        formats_as(" aa ", "aa");
        formats_as("(a b)", "(a b)");
        formats_as("(a (b c) d)", "(a (b c) d)");
        formats_as(" ( a  ( b  c )   d  )   ", "(a (b c) d)");
        formats_as(
            " ( a  (
        b  c )   d  )   ",
            "(a (b c) d)",
        );
        formats_as(
            " ( a  ( b ; (y x)
         c )   d
           )
          ",
            "(a (b c) d)",
        );
    }

    #[test]
    fn case_is_preserved() {
        formats_as("(Define PRED)", "(Define PRED)");
    }

    #[test]
    fn malformed_inputs() {
        assert!(parse("").is_err());
        assert!(parse("; only a comment").is_err());
        assert!(parse("(a (b c)").is_err());
        assert!(parse("(a b))").is_err());
        assert!(parse(")").is_err());
    }

    #[test]
    fn positions() {
        let e = parse("(a\n  (b c))").unwrap();
        let l = e.as_list().unwrap();
        let inner = l.iter().nth(1).unwrap();
        assert_eq!(inner.pos(), Pos { line: 1, column: 2 });
        let c = inner.as_list_iter().unwrap().nth(1).unwrap();
        assert_eq!(c.pos(), Pos { line: 1, column: 5 });
    }

    #[test]
    fn applications() {
        let e = parse("(and (p a) (q b))").unwrap();
        let args = e.as_application("and").unwrap();
        assert_eq!(args.len(), 2);
        assert!(e.as_application("or").is_none());
    }
}
