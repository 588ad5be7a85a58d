use std::collections::HashMap;
use std::fmt;

use crate::equation::Schema;

#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
  pub name: String,
}

impl Symbol {
  pub fn new(name: impl Into<String>) -> Self {
    Self { name: name.into() }
  }
}

impl fmt::Display for Symbol {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.name)
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Production {
  Terminal(String),
  Nonterminal(Symbol),
}

impl Production {
  pub fn symbol_str(&self) -> &str {
    match self {
      Self::Terminal(s) => s,
      Self::Nonterminal(s) => &s.name,
    }
  }

  pub fn is_terminal(&self) -> bool {
    matches!(self, Self::Terminal(_))
  }

  pub fn is_nonterminal(&self) -> bool {
    matches!(self, Self::Nonterminal(_))
  }
}

impl fmt::Display for Production {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Terminal(s) => write!(f, "{}", s),
      Self::Nonterminal(s) => write!(f, "{}", s),
    }
  }
}

/// The context-free projection of one or more LFG rules. This is what the
/// chart parser sees; the annotation schemas stay in the LFG layer, grouped
/// by projection.
#[derive(Debug, PartialEq)]
pub struct CfgRule {
  pub symbol: Symbol,
  pub productions: Vec<Production>,
}

impl CfgRule {
  pub fn len(&self) -> usize {
    self.productions.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn symbol_str(&self) -> &str {
    &self.symbol.name
  }

  /// The surface token if this is the projection of a lexicon entry
  pub fn lexical_token(&self) -> Option<&str> {
    match self.productions.as_slice() {
      [Production::Terminal(t)] => Some(t),
      _ => None,
    }
  }
}

impl fmt::Display for CfgRule {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} ->", self.symbol)?;
    for p in self.productions.iter() {
      write!(f, " {}", p)?;
    }
    Ok(())
  }
}

/// An LFG production: a parent symbol and an ordered list of children, each
/// paired with the annotation schema that child inherits. The RHS length and
/// the schema list cannot disagree: they are stored as pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
  pub symbol: Symbol,
  pub rhs: Vec<(Symbol, Schema)>,
}

impl Rule {
  pub fn new(symbol: Symbol, rhs: Vec<(Symbol, Schema)>) -> Self {
    Self { symbol, rhs }
  }

  pub fn len(&self) -> usize {
    self.rhs.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

impl fmt::Display for Rule {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} ->", self.symbol)?;
    for (child, schema) in self.rhs.iter() {
      write!(f, " {} {{ {} }}", child, schema)?;
    }
    write!(f, ";")
  }
}

/// A lexical category: a preterminal symbol and a mapping from surface
/// tokens to the annotation schemas each reading of the token carries.
/// One schema per reading; a multi-equation entry is one `And` schema.
#[derive(Debug, Clone, PartialEq)]
pub struct LexCategory {
  pub symbol: Symbol,
  entries: HashMap<String, Vec<Schema>>,
}

impl LexCategory {
  pub fn new(symbol: Symbol) -> Self {
    Self {
      symbol,
      entries: HashMap::new(),
    }
  }

  pub fn add(&mut self, token: impl Into<String>, schema: Schema) {
    self.entries.entry(token.into()).or_default().push(schema);
  }

  /// All readings of a token under this category; empty if the category
  /// doesn't list the token.
  pub fn schemas(&self, token: &str) -> &[Schema] {
    self.entries.get(token).map(Vec::as_slice).unwrap_or(&[])
  }

  pub fn tokens(&self) -> impl Iterator<Item = &str> {
    self.entries.keys().map(String::as_str)
  }
}

impl fmt::Display for LexCategory {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (token, schemas) in self.entries.iter() {
      for schema in schemas {
        writeln!(f, "{} -> {} {{ {} }};", self.symbol, token, schema)?;
      }
    }
    Ok(())
  }
}
