use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::equation::{Atom, FsId};

use super::graph::{FsGraph, FsValue};

/// A solved, canonical f-structure: every identifier replaced by its class
/// representative and rendered as an immutable value tree. Attribute maps
/// are ordered and set members sorted, so structural equality, hashing and
/// ordering are all well defined and ambiguous parses deduplicate cleanly.
///
/// Shared sub-structures are duplicated; a class reached again on the same
/// path (a cyclic graph) is cut with `Cycle`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Fstructure {
  /// A class the description constrained but never gave a value
  Pending,
  Atom(Atom),
  Avm(BTreeMap<String, Fstructure>),
  Set(Vec<Fstructure>),
  Cycle,
}

impl Fstructure {
  /// Canonicalize the portion of a graph reachable from `root`.
  /// Deterministic in the graph contents, so calling it twice on the same
  /// graph is idempotent, and it is invariant under renaming of ids.
  pub fn from_graph(graph: &FsGraph, root: FsId) -> Self {
    let mut on_path = HashSet::new();
    Self::build(graph, graph.find(root), &mut on_path)
  }

  fn build(graph: &FsGraph, id: FsId, on_path: &mut HashSet<FsId>) -> Self {
    if on_path.contains(&id) {
      return Fstructure::Cycle;
    }

    match graph.value(id) {
      FsValue::Unset => Fstructure::Pending,
      FsValue::Atom(a) => Fstructure::Atom(a.clone()),
      FsValue::Avm(m) => {
        on_path.insert(id);
        let map = m
          .iter()
          .map(|(attr, target)| {
            (
              attr.clone(),
              Self::build(graph, graph.find(*target), on_path),
            )
          })
          .collect::<BTreeMap<_, _>>();
        on_path.remove(&id);
        Fstructure::Avm(map)
      }
      FsValue::Set(members) => {
        on_path.insert(id);
        // members whose classes merged after insertion collapse here
        let mut member_roots = HashSet::new();
        let mut vs = Vec::new();
        for member in members.iter() {
          let root = graph.find(*member);
          if member_roots.insert(root) {
            vs.push(Self::build(graph, root, on_path));
          }
        }
        on_path.remove(&id);
        vs.sort();
        Fstructure::Set(vs)
      }
    }
  }

  pub fn as_atom(&self) -> Option<&Atom> {
    match self {
      Self::Atom(a) => Some(a),
      _ => None,
    }
  }

  pub fn as_avm(&self) -> Option<&BTreeMap<String, Fstructure>> {
    match self {
      Self::Avm(m) => Some(m),
      _ => None,
    }
  }

  pub fn as_set(&self) -> Option<&[Fstructure]> {
    match self {
      Self::Set(vs) => Some(vs),
      _ => None,
    }
  }

  /// Walk a dotted attribute path
  pub fn get_path(&self, path: &[&str]) -> Option<&Fstructure> {
    let mut node = self;
    for attr in path {
      node = node.as_avm()?.get(*attr)?;
    }
    Some(node)
  }

  /// The symbol atom at a path, for terse test assertions
  pub fn get_path_sym(&self, path: &[&str]) -> Option<&str> {
    match self.get_path(path)?.as_atom()? {
      Atom::Sym(s) => Some(s),
      _ => None,
    }
  }
}

fn write_indented(fs: &Fstructure, indent: usize, f: &mut fmt::Formatter<'_>) -> fmt::Result {
  match fs {
    Fstructure::Pending => write!(f, "**pending**"),
    Fstructure::Cycle => write!(f, "**cycle**"),
    Fstructure::Atom(a) => write!(f, "{}", a),
    Fstructure::Avm(m) => {
      if m.is_empty() {
        write!(f, "[]")
      } else if m.len() == 1 {
        let (attr, value) = m.iter().next().unwrap();
        write!(f, "[ {}: ", attr)?;
        write_indented(value, 0, f)?;
        write!(f, " ]")
      } else {
        writeln!(f, "[")?;
        for (attr, value) in m.iter() {
          write!(f, "{:indent$}{}: ", "", attr, indent = indent + 2)?;
          write_indented(value, indent + 2, f)?;
          writeln!(f)?;
        }
        write!(f, "{:indent$}]", "", indent = indent)
      }
    }
    Fstructure::Set(vs) => {
      write!(f, "{{")?;
      for (idx, v) in vs.iter().enumerate() {
        if idx > 0 {
          write!(f, ",")?;
        }
        write!(f, " ")?;
        write_indented(v, indent, f)?;
      }
      write!(f, " }}")
    }
  }
}

impl fmt::Display for Fstructure {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write_indented(self, 0, f)
  }
}
