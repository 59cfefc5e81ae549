//! XPath-style element selection.
//!
//! Supports the path-and-predicate subset that configuration transforms
//! use in practice:
//!
//! - `/a/b` absolute paths, `//b` descendants, `a/b` relative to the root
//!   element, `.` and `*` steps
//! - predicates `[@x='v']`, `[@x!='v']`, `[@x]`, `[child]`,
//!   `[child='v']`, `[text()='v']`, `[.='v']`, `[2]`, `[last()]`,
//!   `contains(...)`, `starts-with(...)`, `not(...)`, `and`, `or` and
//!   parentheses
//!
//! Other axes, unions and attribute selection are rejected when parsing,
//! never silently ignored.

use std::fmt;
use std::str::FromStr;

use crate::document::{Document, Element, ElementPath, Node};
use crate::error::{Error, Result};

/// A parsed, immutable selector expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    source: String,
    absolute: bool,
    steps: Vec<Step>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    Descendant,
}

#[derive(Debug, Clone, PartialEq)]
enum NameTest {
    Any,
    Name(String),
    SelfNode,
}

#[derive(Debug, Clone, PartialEq)]
struct Step {
    axis: Axis,
    test: NameTest,
    predicates: Vec<Predicate>,
}

#[derive(Debug, Clone, PartialEq)]
enum Predicate {
    Position(usize),
    Last,
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Or(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    Exists(Operand),
    Compare {
        operand: Operand,
        equal: bool,
        literal: Literal,
    },
    Contains(Operand, String),
    StartsWith(Operand, String),
}

#[derive(Debug, Clone, PartialEq)]
enum Operand {
    Attribute(String),
    Child(String),
    Text,
    SelfValue,
}

#[derive(Debug, Clone, PartialEq)]
enum Literal {
    String(String),
    Number(f64),
}

impl Literal {
    fn matches(&self, value: &str) -> bool {
        match self {
            Literal::String(s) => value == s,
            Literal::Number(n) => value.trim().parse::<f64>().is_ok_and(|v| v == *n),
        }
    }
}

impl Selector {
    /// Parse an expression.
    pub fn parse(expression: &str) -> Result<Self> {
        let invalid = |message: String| Error::InvalidExpression {
            expression: expression.to_string(),
            message,
        };

        let tokens = tokenize(expression).map_err(invalid)?;
        let mut parser = Parser {
            tokens: &tokens,
            pos: 0,
            len: expression.len(),
        };
        let (absolute, steps) = parser.path().map_err(invalid)?;

        Ok(Self {
            source: expression.to_string(),
            absolute,
            steps,
        })
    }

    /// The expression as written.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Evaluate against a document, returning matches in document order.
    pub fn select(&self, document: &Document) -> Vec<ElementPath> {
        let mut contexts = if self.absolute {
            vec![Context::Document]
        } else {
            vec![Context::Element(ElementPath::root())]
        };

        for step in &self.steps {
            let mut matched = Vec::new();
            for context in &contexts {
                let bases = match step.axis {
                    Axis::Child => vec![context.clone()],
                    Axis::Descendant => descendants_or_self(document, context),
                };
                for base in &bases {
                    matched.extend(step.evaluate(document, base));
                }
            }
            matched.sort();
            matched.dedup();
            contexts = matched.into_iter().map(Context::Element).collect();
        }

        contexts
            .into_iter()
            .filter_map(|c| match c {
                Context::Element(path) => Some(path),
                Context::Document => None,
            })
            .collect()
    }
}

impl FromStr for Selector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

// ============================================================================
// Evaluation
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum Context {
    Document,
    Element(ElementPath),
}

fn descendants_or_self(document: &Document, context: &Context) -> Vec<Context> {
    let mut out = vec![context.clone()];
    let start = match context {
        Context::Document => {
            out.push(Context::Element(ElementPath::root()));
            ElementPath::root()
        }
        Context::Element(path) => path.clone(),
    };
    if let Some(element) = document.element(&start) {
        collect_descendants(element, &start, &mut out);
    }
    out
}

fn collect_descendants(element: &Element, path: &ElementPath, out: &mut Vec<Context>) {
    for (index, child) in element.children.iter().enumerate() {
        if let Node::Element(child) = child {
            let child_path = path.child(index);
            out.push(Context::Element(child_path.clone()));
            collect_descendants(child, &child_path, out);
        }
    }
}

impl Step {
    fn evaluate(&self, document: &Document, base: &Context) -> Vec<ElementPath> {
        let mut candidates: Vec<ElementPath> = match (&self.test, base) {
            (NameTest::SelfNode, Context::Element(path)) => vec![path.clone()],
            (NameTest::SelfNode, Context::Document) => Vec::new(),
            (test, Context::Document) => {
                if test.matches(&document.root) {
                    vec![ElementPath::root()]
                } else {
                    Vec::new()
                }
            }
            (test, Context::Element(path)) => match document.element(path) {
                Some(element) => element
                    .children
                    .iter()
                    .enumerate()
                    .filter_map(|(index, child)| match child {
                        Node::Element(child) if test.matches(child) => Some(path.child(index)),
                        _ => None,
                    })
                    .collect(),
                None => Vec::new(),
            },
        };

        for predicate in &self.predicates {
            candidates = match predicate {
                Predicate::Position(n) => candidates.into_iter().skip(n - 1).take(1).collect(),
                Predicate::Last => candidates.pop().into_iter().collect(),
                Predicate::Expr(expr) => candidates
                    .into_iter()
                    .filter(|path| {
                        document
                            .element(path)
                            .is_some_and(|element| expr.evaluate(element))
                    })
                    .collect(),
            };
        }
        candidates
    }
}

impl NameTest {
    fn matches(&self, element: &Element) -> bool {
        match self {
            NameTest::Any => true,
            NameTest::Name(name) => element.name == *name,
            NameTest::SelfNode => false,
        }
    }
}

impl Expr {
    fn evaluate(&self, element: &Element) -> bool {
        match self {
            Expr::Or(a, b) => a.evaluate(element) || b.evaluate(element),
            Expr::And(a, b) => a.evaluate(element) && b.evaluate(element),
            Expr::Not(inner) => !inner.evaluate(element),
            Expr::Exists(operand) => !operand.values(element).is_empty(),
            Expr::Compare {
                operand,
                equal,
                literal,
            } => operand
                .values(element)
                .iter()
                .any(|value| literal.matches(value) == *equal),
            Expr::Contains(operand, needle) => operand
                .values(element)
                .iter()
                .any(|value| value.contains(needle.as_str())),
            Expr::StartsWith(operand, prefix) => operand
                .values(element)
                .iter()
                .any(|value| value.starts_with(prefix.as_str())),
        }
    }
}

impl Operand {
    /// The node-set an operand selects, as string values.
    fn values(&self, element: &Element) -> Vec<String> {
        match self {
            Operand::Attribute(name) => element
                .attribute(name)
                .map(str::to_string)
                .into_iter()
                .collect(),
            Operand::Child(name) => element
                .elements()
                .filter(|child| child.name == *name)
                .map(string_value)
                .collect(),
            Operand::Text => element
                .children
                .iter()
                .filter_map(|child| match child {
                    Node::Text(t) | Node::CData(t) => Some(t.clone()),
                    _ => None,
                })
                .collect(),
            Operand::SelfValue => vec![string_value(element)],
        }
    }
}

/// Concatenated text of all descendants.
fn string_value(element: &Element) -> String {
    let mut out = String::new();
    push_string_value(element, &mut out);
    out
}

fn push_string_value(element: &Element, out: &mut String) {
    for child in &element.children {
        match child {
            Node::Text(t) | Node::CData(t) => out.push_str(t),
            Node::Element(e) => push_string_value(e, out),
            _ => {}
        }
    }
}

// ============================================================================
// Tokenizer
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Slash,
    DoubleSlash,
    LBracket,
    RBracket,
    LParen,
    RParen,
    At,
    Eq,
    NotEq,
    Comma,
    Star,
    Dot,
    DotDot,
    Pipe,
    Name(String),
    Literal(String),
    Number(f64),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Slash => write!(f, "'/'"),
            Token::DoubleSlash => write!(f, "'//'"),
            Token::LBracket => write!(f, "'['"),
            Token::RBracket => write!(f, "']'"),
            Token::LParen => write!(f, "'('"),
            Token::RParen => write!(f, "')'"),
            Token::At => write!(f, "'@'"),
            Token::Eq => write!(f, "'='"),
            Token::NotEq => write!(f, "'!='"),
            Token::Comma => write!(f, "','"),
            Token::Star => write!(f, "'*'"),
            Token::Dot => write!(f, "'.'"),
            Token::DotDot => write!(f, "'..'"),
            Token::Pipe => write!(f, "'|'"),
            Token::Name(name) => write!(f, "'{name}'"),
            Token::Literal(s) => write!(f, "string '{s}'"),
            Token::Number(n) => write!(f, "number {n}"),
        }
    }
}

#[derive(Debug, Clone)]
struct Spanned {
    token: Token,
    offset: usize,
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':')
}

fn tokenize(source: &str) -> std::result::Result<Vec<Spanned>, String> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some((offset, c)) = chars.next() {
        let token = match c {
            c if c.is_whitespace() => continue,
            '/' => {
                if chars.next_if(|(_, c)| *c == '/').is_some() {
                    Token::DoubleSlash
                } else {
                    Token::Slash
                }
            }
            '[' => Token::LBracket,
            ']' => Token::RBracket,
            '(' => Token::LParen,
            ')' => Token::RParen,
            '@' => Token::At,
            '=' => Token::Eq,
            ',' => Token::Comma,
            '*' => Token::Star,
            '|' => Token::Pipe,
            '!' => {
                if chars.next_if(|(_, c)| *c == '=').is_some() {
                    Token::NotEq
                } else {
                    return Err(format!("expected '=' after '!' at offset {offset}"));
                }
            }
            '.' => {
                if chars.next_if(|(_, c)| *c == '.').is_some() {
                    Token::DotDot
                } else {
                    Token::Dot
                }
            }
            '\'' | '"' => {
                let mut literal = String::new();
                let mut closed = false;
                for (_, next) in chars.by_ref() {
                    if next == c {
                        closed = true;
                        break;
                    }
                    literal.push(next);
                }
                if !closed {
                    return Err(format!("unterminated string literal at offset {offset}"));
                }
                Token::Literal(literal)
            }
            c if c.is_ascii_digit() => {
                let mut number = String::from(c);
                while let Some((_, next)) = chars.next_if(|(_, c)| c.is_ascii_digit() || *c == '.') {
                    number.push(next);
                }
                let value = number
                    .parse::<f64>()
                    .map_err(|_| format!("invalid number '{number}' at offset {offset}"))?;
                Token::Number(value)
            }
            c if is_name_start(c) => {
                let mut name = String::from(c);
                while let Some((_, next)) = chars.next_if(|(_, c)| is_name_char(*c)) {
                    name.push(next);
                }
                Token::Name(name)
            }
            other => {
                return Err(format!(
                    "unsupported character '{other}' at offset {offset}"
                ));
            }
        };
        tokens.push(Spanned { token, offset });
    }

    Ok(tokens)
}

// ============================================================================
// Parser
// ============================================================================

type ParseResult<T> = std::result::Result<T, String>;

struct Parser<'a> {
    tokens: &'a [Spanned],
    pos: usize,
    len: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn peek_at(&self, ahead: usize) -> Option<&'a Token> {
        self.tokens.get(self.pos + ahead).map(|s| &s.token)
    }

    fn offset(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.len, |s| s.offset)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|s| s.token.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn unexpected<T>(&self, expected: &str) -> ParseResult<T> {
        match self.peek() {
            Some(token) => Err(format!(
                "expected {expected}, found {token} at offset {}",
                self.offset()
            )),
            None => Err(format!("expected {expected}, found end of expression")),
        }
    }

    fn expect(&mut self, token: &Token, expected: &str) -> ParseResult<()> {
        if self.peek() == Some(token) {
            self.pos += 1;
            Ok(())
        } else {
            self.unexpected(expected)
        }
    }

    fn path(&mut self) -> ParseResult<(bool, Vec<Step>)> {
        let (absolute, mut axis) = match self.peek() {
            Some(Token::Slash) => {
                self.pos += 1;
                (true, Axis::Child)
            }
            Some(Token::DoubleSlash) => {
                self.pos += 1;
                (true, Axis::Descendant)
            }
            None => return Err("expression is empty".to_string()),
            _ => (false, Axis::Child),
        };

        let mut steps = Vec::new();
        loop {
            steps.push(self.step(axis)?);
            axis = match self.peek() {
                Some(Token::Slash) => Axis::Child,
                Some(Token::DoubleSlash) => Axis::Descendant,
                None => break,
                Some(Token::Pipe) => {
                    return Err(format!(
                        "unions ('|') are not supported, at offset {}",
                        self.offset()
                    ));
                }
                _ => return self.unexpected("'/', '//' or end of expression"),
            };
            self.pos += 1;
        }

        Ok((absolute, steps))
    }

    fn step(&mut self, axis: Axis) -> ParseResult<Step> {
        let offset = self.offset();
        let test = match self.advance() {
            Some(Token::Star) => NameTest::Any,
            Some(Token::Dot) => NameTest::SelfNode,
            Some(Token::Name(name)) => {
                if name.contains("::") {
                    return Err(format!("axes are not supported ('{name}' at offset {offset})"));
                }
                if self.peek() == Some(&Token::LParen) {
                    return Err(format!(
                        "node tests like '{name}()' are not supported, at offset {offset}"
                    ));
                }
                NameTest::Name(name)
            }
            Some(Token::At) => {
                return Err(format!(
                    "selecting attributes is not supported, selectors must address elements (offset {offset})"
                ));
            }
            Some(Token::DotDot) => {
                return Err(format!("the parent step '..' is not supported (offset {offset})"));
            }
            Some(_) => {
                self.pos -= 1;
                return self.unexpected("an element name, '*' or '.'");
            }
            None => return self.unexpected("an element name, '*' or '.'"),
        };

        let mut predicates = Vec::new();
        while self.peek() == Some(&Token::LBracket) {
            self.pos += 1;
            predicates.push(self.predicate()?);
            self.expect(&Token::RBracket, "']'")?;
        }

        Ok(Step {
            axis,
            test,
            predicates,
        })
    }

    fn predicate(&mut self) -> ParseResult<Predicate> {
        match (self.peek(), self.peek_at(1)) {
            (Some(Token::Number(n)), Some(Token::RBracket)) => {
                let n = *n;
                if n < 1.0 || n.fract() != 0.0 {
                    return Err(format!(
                        "position must be a positive integer, found {n} at offset {}",
                        self.offset()
                    ));
                }
                self.pos += 1;
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let position = n as usize;
                Ok(Predicate::Position(position))
            }
            (Some(Token::Name(name)), Some(Token::LParen)) if name == "last" => {
                self.pos += 2;
                self.expect(&Token::RParen, "')'")?;
                Ok(Predicate::Last)
            }
            _ => Ok(Predicate::Expr(self.or_expr()?)),
        }
    }

    fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), Some(Token::Name(name)) if name == keyword)
    }

    fn or_expr(&mut self) -> ParseResult<Expr> {
        let mut expr = self.and_expr()?;
        while self.is_keyword("or") {
            self.pos += 1;
            expr = Expr::Or(Box::new(expr), Box::new(self.and_expr()?));
        }
        Ok(expr)
    }

    fn and_expr(&mut self) -> ParseResult<Expr> {
        let mut expr = self.unary()?;
        while self.is_keyword("and") {
            self.pos += 1;
            expr = Expr::And(Box::new(expr), Box::new(self.unary()?));
        }
        Ok(expr)
    }

    fn unary(&mut self) -> ParseResult<Expr> {
        if self.peek() == Some(&Token::LParen) {
            self.pos += 1;
            let expr = self.or_expr()?;
            self.expect(&Token::RParen, "')'")?;
            return Ok(expr);
        }

        if let (Some(Token::Name(name)), Some(Token::LParen)) = (self.peek(), self.peek_at(1)) {
            match name.as_str() {
                "not" => {
                    self.pos += 2;
                    let expr = self.or_expr()?;
                    self.expect(&Token::RParen, "')'")?;
                    return Ok(Expr::Not(Box::new(expr)));
                }
                "contains" | "starts-with" => {
                    let contains = name == "contains";
                    self.pos += 2;
                    let operand = self.operand()?;
                    self.expect(&Token::Comma, "','")?;
                    let needle = match self.peek() {
                        Some(Token::Literal(s)) => s.clone(),
                        _ => return self.unexpected("a string literal"),
                    };
                    self.pos += 1;
                    self.expect(&Token::RParen, "')'")?;
                    return Ok(if contains {
                        Expr::Contains(operand, needle)
                    } else {
                        Expr::StartsWith(operand, needle)
                    });
                }
                "text" => {}
                other => {
                    return Err(format!(
                        "function '{other}()' is not supported, at offset {}",
                        self.offset()
                    ));
                }
            }
        }

        let operand = self.operand()?;
        let equal = match self.peek() {
            Some(Token::Eq) => true,
            Some(Token::NotEq) => false,
            _ => return Ok(Expr::Exists(operand)),
        };
        self.pos += 1;

        let literal = match self.peek() {
            Some(Token::Literal(s)) => Literal::String(s.clone()),
            Some(Token::Number(n)) => Literal::Number(*n),
            _ => return self.unexpected("a string or number literal"),
        };
        self.pos += 1;

        Ok(Expr::Compare {
            operand,
            equal,
            literal,
        })
    }

    fn operand(&mut self) -> ParseResult<Operand> {
        match self.peek().cloned() {
            Some(Token::At) => {
                self.pos += 1;
                match self.peek() {
                    Some(Token::Name(name)) => {
                        self.pos += 1;
                        Ok(Operand::Attribute(name.clone()))
                    }
                    _ => self.unexpected("an attribute name"),
                }
            }
            Some(Token::Name(name)) if name == "text" && self.peek_at(1) == Some(&Token::LParen) => {
                self.pos += 2;
                self.expect(&Token::RParen, "')'")?;
                Ok(Operand::Text)
            }
            Some(Token::Name(name)) => {
                self.pos += 1;
                Ok(Operand::Child(name))
            }
            Some(Token::Dot) => {
                self.pos += 1;
                Ok(Operand::SelfValue)
            }
            _ => self.unexpected("'@attribute', a child name, 'text()' or '.'"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WEB_CONFIG: &str = r#"<configuration>
    <connectionStrings>
        <add name="SomeDB" connectionString="old" />
        <add name="Other" connectionString="x" />
    </connectionStrings>
    <system.diagnostics>
        <trace autoflush="true" />
    </system.diagnostics>
    <appSettings>
        <add key="a" value="1" />
        <add key="b" value="2" />
        <add key="c" value="3" />
    </appSettings>
</configuration>"#;

    fn doc() -> Document {
        Document::parse(WEB_CONFIG.as_bytes()).unwrap()
    }

    fn names(document: &Document, expression: &str) -> Vec<String> {
        Selector::parse(expression)
            .unwrap()
            .select(document)
            .iter()
            .map(|path| {
                let element = document.element(path).unwrap();
                match element
                    .attribute("name")
                    .or_else(|| element.attribute("key"))
                {
                    Some(id) => format!("{}:{id}", element.name),
                    None => element.name.clone(),
                }
            })
            .collect()
    }

    #[test]
    fn test_descendant_with_attribute_predicate() {
        let doc = doc();
        assert_eq!(
            names(&doc, "//connectionStrings/add[@name='SomeDB']"),
            vec!["add:SomeDB"]
        );
        assert_eq!(
            names(&doc, "//add[@name=\"Other\"]"),
            vec!["add:Other"]
        );
    }

    #[test]
    fn test_descendant_preserves_document_order() {
        let doc = doc();
        assert_eq!(
            names(&doc, "//add"),
            vec!["add:SomeDB", "add:Other", "add:a", "add:b", "add:c"]
        );
    }

    #[test]
    fn test_dotted_element_names() {
        let doc = doc();
        assert_eq!(names(&doc, "//system.diagnostics"), vec!["system.diagnostics"]);
    }

    #[test]
    fn test_absolute_and_relative_paths() {
        let doc = doc();
        assert_eq!(names(&doc, "/configuration/appSettings"), vec!["appSettings"]);
        assert_eq!(names(&doc, "appSettings/add[@key='b']"), vec!["add:b"]);
        assert_eq!(names(&doc, "/configuration"), vec!["configuration"]);
        assert!(names(&doc, "/appSettings").is_empty());
        assert_eq!(names(&doc, "."), vec!["configuration"]);
    }

    #[test]
    fn test_wildcard_and_nested_descendants() {
        let doc = doc();
        assert_eq!(
            names(&doc, "/configuration/*"),
            vec!["connectionStrings", "system.diagnostics", "appSettings"]
        );
        assert_eq!(names(&doc, "//system.diagnostics//trace"), vec!["trace"]);
        // `//` results must not contain duplicates
        assert_eq!(names(&doc, "//*//trace"), vec!["trace"]);
    }

    #[test]
    fn test_positional_predicates() {
        let doc = doc();
        assert_eq!(names(&doc, "//appSettings/add[2]"), vec!["add:b"]);
        assert_eq!(names(&doc, "//appSettings/add[last()]"), vec!["add:c"]);
        // Positions are relative to each parent
        assert_eq!(names(&doc, "//add[1]"), vec!["add:SomeDB", "add:a"]);
        assert!(names(&doc, "//appSettings/add[9]").is_empty());
    }

    #[test]
    fn test_boolean_predicates() {
        let doc = doc();
        assert_eq!(
            names(&doc, "//add[@key='a' or @key='c']"),
            vec!["add:a", "add:c"]
        );
        assert_eq!(
            names(&doc, "//add[@key and @value!='2']"),
            vec!["add:a", "add:c"]
        );
        assert_eq!(
            names(&doc, "//add[not(@key)]"),
            vec!["add:SomeDB", "add:Other"]
        );
        assert_eq!(
            names(&doc, "//add[(@key='a' or @key='b') and @value=2]"),
            vec!["add:b"]
        );
    }

    #[test]
    fn test_string_functions() {
        let doc = doc();
        assert_eq!(
            names(&doc, "//add[starts-with(@name, 'Some')]"),
            vec!["add:SomeDB"]
        );
        assert_eq!(
            names(&doc, "//add[contains(@connectionString,'ol')]"),
            vec!["add:SomeDB"]
        );
    }

    #[test]
    fn test_child_and_text_predicates() {
        let doc = Document::parse(
            b"<root><item><id>1</id></item><item><id>2</id><tag/></item><note>hi</note></root>",
        )
        .unwrap();
        let count = |expr: &str| Selector::parse(expr).unwrap().select(&doc).len();

        assert_eq!(count("//item[tag]"), 1);
        assert_eq!(count("//item[id='2']"), 1);
        assert_eq!(count("//note[text()='hi']"), 1);
        assert_eq!(count("//note[.='hi']"), 1);
        assert_eq!(count("//note[text()='bye']"), 0);
    }

    #[test]
    fn test_selection_is_side_effect_free() {
        let doc = doc();
        let before = doc.clone();
        let _ = Selector::parse("//add[@key='a']").unwrap().select(&doc);
        assert_eq!(doc, before);
    }

    #[test]
    fn test_invalid_expressions() {
        for bad in [
            "",
            "//",
            "//add[",
            "//add[@name='x'",
            "//add[@name='x]",
            "//add/@name",
            "//a | //b",
            "//a/..",
            "ancestor::a",
            "//add[@name=x]",
            "//add[0]",
            "//add[count(x)]",
            "//a[@x>1]",
            "//node()",
        ] {
            let err = Selector::parse(bad).unwrap_err();
            assert!(
                matches!(err, Error::InvalidExpression { .. }),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_error_reports_offset() {
        let err = Selector::parse("//add[@name='x'").unwrap_err();
        assert!(err.to_string().contains("end of expression"), "{err}");

        let err = Selector::parse("//a | //b").unwrap_err();
        assert!(err.to_string().contains("offset 4"), "{err}");
    }

    #[test]
    fn test_display_round_trips_source() {
        let selector: Selector = "//connectionStrings".parse().unwrap();
        assert_eq!(selector.to_string(), "//connectionStrings");
        assert_eq!(selector.as_str(), "//connectionStrings");
    }
}
