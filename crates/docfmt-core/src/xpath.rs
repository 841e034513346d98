//! A small XPath subset evaluated over [`Element`] trees.
//!
//! Supported: absolute (`/a/b`), descendant (`//b`, `/a//b`) and relative
//! paths (relative to the root element), `*`, `.`, `..`, and the predicates
//! `[n]`, `[last()]`, `[@attr]`, `[@attr='v']`, `[child]`, `[child='v']`,
//! `[text()='v']`. Results come back in document order without duplicates.

use crate::error::{Error, Result};
use crate::xml::{Element, is_name_char, is_name_start};

/// Child-index path from the root element. `None` stands for the document
/// node that sits above the root element.
type Pos = Option<Vec<usize>>;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Query {
    absolute: bool,
    steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq)]
struct Step {
    /// Preceded by `//`.
    descendant: bool,
    test: NodeTest,
    predicates: Vec<Predicate>,
}

#[derive(Debug, Clone, PartialEq)]
enum NodeTest {
    Any,
    Name(String),
    SelfNode,
    Parent,
}

#[derive(Debug, Clone, PartialEq)]
enum Predicate {
    Position(usize),
    Last,
    HasAttr(String),
    AttrEq(String, String),
    HasChild(String),
    ChildEq(String, String),
    TextEq(String),
}

pub(crate) fn parse(query: &str) -> Result<Query> {
    let mut p = Parser {
        query,
        src: query.trim(),
        pos: 0,
    };
    p.parse_query()
}

/// Evaluates `query` against the tree rooted at `root`.
pub(crate) fn evaluate(root: &Element, query: &Query) -> Vec<Vec<usize>> {
    let mut ctx: Vec<Pos> = if query.absolute {
        vec![None]
    } else {
        vec![Some(Vec::new())]
    };
    for step in &query.steps {
        let mut next = Vec::new();
        for c in &ctx {
            let bases = if step.descendant {
                descendant_or_self(root, c)
            } else {
                vec![c.clone()]
            };
            for base in bases {
                let mut cands = match &step.test {
                    NodeTest::SelfNode => vec![base],
                    NodeTest::Parent => parent_of(&base).into_iter().collect(),
                    NodeTest::Any => children(root, &base, None),
                    NodeTest::Name(n) => children(root, &base, Some(n.as_str())),
                };
                for pred in &step.predicates {
                    cands = apply_predicate(root, cands, pred);
                }
                next.extend(cands);
            }
        }
        next.sort();
        next.dedup();
        ctx = next;
    }
    ctx.into_iter().flatten().collect()
}

pub(crate) fn resolve<'a>(root: &'a Element, pos: &[usize]) -> Option<&'a Element> {
    let mut cur = root;
    for &i in pos {
        cur = cur.children.get(i)?;
    }
    Some(cur)
}

/// Concatenated text of an element and its descendants.
pub(crate) fn string_value(el: &Element) -> String {
    let mut out = el.text.clone();
    for child in &el.children {
        out.push_str(&string_value(child));
    }
    out
}

fn element_at<'a>(root: &'a Element, pos: &Pos) -> Option<&'a Element> {
    pos.as_deref().and_then(|p| resolve(root, p))
}

fn children(root: &Element, base: &Pos, name: Option<&str>) -> Vec<Pos> {
    let matches = |el: &Element| name.is_none_or(|n| el.name == n);
    match base {
        None => {
            if matches(root) {
                vec![Some(Vec::new())]
            } else {
                Vec::new()
            }
        }
        Some(p) => {
            let Some(el) = resolve(root, p) else {
                return Vec::new();
            };
            el.children
                .iter()
                .enumerate()
                .filter(|(_, c)| matches(c))
                .map(|(i, _)| {
                    let mut child = p.clone();
                    child.push(i);
                    Some(child)
                })
                .collect()
        }
    }
}

fn parent_of(pos: &Pos) -> Option<Pos> {
    let p = pos.as_ref()?;
    match p.split_last() {
        Some((_, parent)) => Some(Some(parent.to_vec())),
        None => Some(None),
    }
}

fn descendant_or_self(root: &Element, start: &Pos) -> Vec<Pos> {
    let mut out = vec![start.clone()];
    let (el, prefix) = match start {
        None => {
            out.push(Some(Vec::new()));
            (Some(root), Vec::new())
        }
        Some(p) => (resolve(root, p), p.clone()),
    };
    if let Some(el) = el {
        collect_descendants(el, &prefix, &mut out);
    }
    out
}

fn collect_descendants(el: &Element, prefix: &[usize], out: &mut Vec<Pos>) {
    for (i, child) in el.children.iter().enumerate() {
        let mut p = prefix.to_vec();
        p.push(i);
        out.push(Some(p.clone()));
        collect_descendants(child, &p, out);
    }
}

fn apply_predicate(root: &Element, cands: Vec<Pos>, pred: &Predicate) -> Vec<Pos> {
    match pred {
        Predicate::Position(n) => cands.into_iter().nth(n - 1).into_iter().collect(),
        Predicate::Last => cands.into_iter().last().into_iter().collect(),
        _ => cands
            .into_iter()
            .filter(|c| element_at(root, c).is_some_and(|el| test_predicate(el, pred)))
            .collect(),
    }
}

fn test_predicate(el: &Element, pred: &Predicate) -> bool {
    match pred {
        Predicate::HasAttr(a) => el.attributes.contains_key(a),
        Predicate::AttrEq(a, v) => el.attributes.get(a).is_some_and(|x| x == v),
        Predicate::HasChild(n) => el.children.iter().any(|c| c.name == *n),
        Predicate::ChildEq(n, v) => el
            .children
            .iter()
            .any(|c| c.name == *n && string_value(c) == *v),
        Predicate::TextEq(v) => el.text == *v,
        Predicate::Position(_) | Predicate::Last => true,
    }
}

struct Parser<'a> {
    query: &'a str,
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &str {
        &self.src[self.pos..]
    }

    fn error(&self, reason: impl Into<String>) -> Error {
        Error::InvalidQuery {
            query: self.query.to_string(),
            reason: reason.into(),
        }
    }

    fn parse_query(&mut self) -> Result<Query> {
        if self.src.is_empty() {
            return Err(self.error("empty query"));
        }
        let mut absolute = false;
        let mut descendant = false;
        if self.rest().starts_with("//") {
            absolute = true;
            descendant = true;
            self.pos += 2;
        } else if self.rest().starts_with('/') {
            absolute = true;
            self.pos += 1;
        }
        let mut steps = Vec::new();
        if absolute && !descendant && self.rest().is_empty() {
            return Ok(Query { absolute, steps });
        }
        loop {
            steps.push(self.parse_step(descendant)?);
            if self.rest().is_empty() {
                break;
            }
            if self.rest().starts_with("//") {
                descendant = true;
                self.pos += 2;
            } else if self.rest().starts_with('/') {
                descendant = false;
                self.pos += 1;
            } else {
                return Err(self.error(format!("unexpected input at offset {}", self.pos)));
            }
        }
        Ok(Query { absolute, steps })
    }

    fn parse_step(&mut self, descendant: bool) -> Result<Step> {
        let test = if self.rest().starts_with("..") {
            self.pos += 2;
            NodeTest::Parent
        } else if self.rest().starts_with('.') {
            self.pos += 1;
            NodeTest::SelfNode
        } else if self.rest().starts_with('*') {
            self.pos += 1;
            NodeTest::Any
        } else {
            let name = self.take_name();
            if name.is_empty() {
                return Err(self.error(format!("expected a step at offset {}", self.pos)));
            }
            NodeTest::Name(name.to_string())
        };
        let mut predicates = Vec::new();
        while self.rest().starts_with('[') {
            self.pos += 1;
            let inner = self.take_bracketed()?;
            predicates.push(self.parse_predicate(inner.trim())?);
        }
        Ok(Step {
            descendant,
            test,
            predicates,
        })
    }

    fn take_name(&mut self) -> &'a str {
        let src: &'a str = self.src;
        let rest = &src[self.pos..];
        let mut end = 0;
        for (i, c) in rest.char_indices() {
            let ok = if i == 0 { is_name_start(c) } else { is_name_char(c) };
            if !ok {
                break;
            }
            end = i + c.len_utf8();
        }
        self.pos += end;
        &rest[..end]
    }

    /// Consumes up to the matching `]`, skipping over quoted literals.
    fn take_bracketed(&mut self) -> Result<&'a str> {
        let src: &'a str = self.src;
        let rest = &src[self.pos..];
        let mut quote: Option<char> = None;
        for (i, c) in rest.char_indices() {
            match (quote, c) {
                (Some(q), c) if c == q => quote = None,
                (Some(_), _) => {}
                (None, '\'' | '"') => quote = Some(c),
                (None, ']') => {
                    self.pos += i + 1;
                    return Ok(&rest[..i]);
                }
                (None, _) => {}
            }
        }
        Err(self.error("unterminated predicate"))
    }

    fn parse_predicate(&self, expr: &str) -> Result<Predicate> {
        if expr.is_empty() {
            return Err(self.error("empty predicate"));
        }
        if expr.chars().all(|c| c.is_ascii_digit()) {
            let n: usize = expr
                .parse()
                .map_err(|_| self.error(format!("bad position '{}'", expr)))?;
            if n == 0 {
                return Err(self.error("positions start at 1"));
            }
            return Ok(Predicate::Position(n));
        }
        if expr == "last()" {
            return Ok(Predicate::Last);
        }
        if let Some(rest) = expr.strip_prefix("text()") {
            let lit = self.parse_comparison(rest)?;
            return lit
                .map(Predicate::TextEq)
                .ok_or_else(|| self.error("text() needs a comparison"));
        }
        let (is_attr, body) = match expr.strip_prefix('@') {
            Some(b) => (true, b),
            None => (false, expr),
        };
        let name_len = body
            .char_indices()
            .take_while(|&(i, c)| if i == 0 { is_name_start(c) } else { is_name_char(c) })
            .map(|(i, c)| i + c.len_utf8())
            .last()
            .unwrap_or(0);
        if name_len == 0 {
            return Err(self.error(format!("unsupported predicate '{}'", expr)));
        }
        let name = body[..name_len].to_string();
        let lit = self.parse_comparison(&body[name_len..])?;
        Ok(match (is_attr, lit) {
            (true, None) => Predicate::HasAttr(name),
            (true, Some(v)) => Predicate::AttrEq(name, v),
            (false, None) => Predicate::HasChild(name),
            (false, Some(v)) => Predicate::ChildEq(name, v),
        })
    }

    /// Parses an optional `= 'literal'` tail.
    fn parse_comparison(&self, tail: &str) -> Result<Option<String>> {
        let tail = tail.trim();
        if tail.is_empty() {
            return Ok(None);
        }
        let lit = tail
            .strip_prefix('=')
            .ok_or_else(|| self.error(format!("expected '=' in '{}'", tail)))?
            .trim();
        let mut chars = lit.chars();
        match (chars.next(), chars.next_back()) {
            (Some(open @ ('\'' | '"')), Some(close)) if open == close && lit.len() >= 2 => {
                Ok(Some(lit[1..lit.len() - 1].to_string()))
            }
            _ => Err(self.error(format!("expected a quoted literal, got '{}'", lit))),
        }
    }
}
