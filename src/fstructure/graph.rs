use std::collections::HashMap;

use crate::equation::{Atom, Expr, FsId};
use crate::utils::Err;

/// Value held by an equivalence class of identifiers
#[derive(Debug, Clone, PartialEq)]
pub enum FsValue {
  /// No value yet; unifies with anything
  Unset,
  /// An atomic value. Semantic forms only unify with an equal semantic form.
  Atom(Atom),
  /// A feature map; attribute values are referenced indirectly through ids
  Avm(HashMap<String, FsId>),
  /// A set of member ids
  Set(Vec<FsId>),
}

#[derive(Debug, Clone)]
enum Entry {
  Value(FsValue),
  /// Forwarded to another class through unification. Chase with `find`
  /// before using an entry.
  Forwarded(FsId),
}

/// The result of read-only expression evaluation: a class representative or
/// a bare atomic value.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
  Class(FsId),
  Val(Atom),
}

/// An attribute-value graph under construction: a disjoint-set union over
/// ids, where the class representative's entry holds the value. Each solver
/// branch owns its own copy; nothing here is shared.
#[derive(Debug, Clone, Default)]
pub struct FsGraph {
  entries: Vec<Entry>,
}

impl FsGraph {
  /// A graph where ids `0..n` are allocated and pending. The description
  /// builder mints ids densely from zero, so its watermark is our capacity.
  pub fn with_ids(n: u32) -> Self {
    Self {
      entries: vec![Entry::Value(FsValue::Unset); n as usize],
    }
  }

  /// Mint an id unknown to the description, for lazily created links
  pub fn fresh(&mut self) -> FsId {
    let id = FsId(self.entries.len() as u32);
    self.entries.push(Entry::Value(FsValue::Unset));
    id
  }

  /// Class representative of an id
  pub fn find(&self, mut id: FsId) -> FsId {
    while let Entry::Forwarded(next) = &self.entries[id.0 as usize] {
      id = *next;
    }
    id
  }

  /// The value of an id's class
  pub fn value(&self, id: FsId) -> &FsValue {
    let root = self.find(id);
    match &self.entries[root.0 as usize] {
      Entry::Value(v) => v,
      Entry::Forwarded(_) => unreachable!("find returned a forwarded entry"),
    }
  }

  fn value_mut(&mut self, id: FsId) -> &mut FsValue {
    let root = self.find(id);
    match &mut self.entries[root.0 as usize] {
      Entry::Value(v) => v,
      Entry::Forwarded(_) => unreachable!("find returned a forwarded entry"),
    }
  }

  /// Merge two classes. Returns whether anything changed; fails on a clash
  /// between incompatible values.
  pub fn union(&mut self, a: FsId, b: FsId) -> Result<bool, Err> {
    let a = self.find(a);
    let b = self.find(b);
    if a == b {
      return Ok(false);
    }

    // detach a's value, forward a into b's class, then fold the value in
    let detached = match std::mem::replace(&mut self.entries[a.0 as usize], Entry::Forwarded(b)) {
      Entry::Value(v) => v,
      Entry::Forwarded(_) => unreachable!("find returned a forwarded entry"),
    };

    match detached {
      FsValue::Unset => Ok(true),
      FsValue::Atom(x) => match self.value(b) {
        FsValue::Unset => {
          *self.value_mut(b) = FsValue::Atom(x);
          Ok(true)
        }
        FsValue::Atom(y) => {
          if *y == x {
            Ok(true)
          } else {
            Err(format!("unification clash: {} & {}", x, y).into())
          }
        }
        FsValue::Avm(_) => Err(format!("unification clash: {} & feature map", x).into()),
        FsValue::Set(_) => Err(format!("unification clash: {} & set", x).into()),
      },
      FsValue::Avm(m1) => match self.value(b) {
        FsValue::Unset => {
          *self.value_mut(b) = FsValue::Avm(m1);
          Ok(true)
        }
        FsValue::Avm(_) => {
          for (attr, v1) in m1 {
            // b may meanwhile have been drawn into a larger class by a
            // recursive union; value lookups chase forwards, so they stay
            // on the live map
            let existing = match self.value(b) {
              FsValue::Avm(m2) => m2.get(&attr).copied(),
              _ => None,
            };
            match existing {
              Some(v2) => {
                self.union(v1, v2)?;
              }
              None => {
                if let FsValue::Avm(m2) = self.value_mut(b) {
                  m2.insert(attr, v1);
                }
              }
            }
          }
          Ok(true)
        }
        FsValue::Atom(y) => Err(format!("unification clash: feature map & {}", y).into()),
        FsValue::Set(_) => Err("unification clash: feature map & set".into()),
      },
      FsValue::Set(s1) => match self.value(b) {
        FsValue::Unset => {
          *self.value_mut(b) = FsValue::Set(s1);
          Ok(true)
        }
        FsValue::Set(_) => {
          for member in s1 {
            self.add_member(b, member)?;
          }
          Ok(true)
        }
        FsValue::Atom(y) => Err(format!("unification clash: set & {}", y).into()),
        FsValue::Avm(_) => Err("unification clash: set & feature map".into()),
      },
    }
  }

  /// Set an atomic value on a class. Returns whether the value is new.
  pub fn set_atom(&mut self, id: FsId, atom: Atom) -> Result<bool, Err> {
    match self.value_mut(id) {
      v @ FsValue::Unset => {
        *v = FsValue::Atom(atom);
        Ok(true)
      }
      FsValue::Atom(existing) => {
        if *existing == atom {
          Ok(false)
        } else {
          Err(format!("unification clash: {} & {}", existing, atom).into())
        }
      }
      FsValue::Avm(_) => Err(format!("unification clash: feature map & {}", atom).into()),
      FsValue::Set(_) => Err(format!("unification clash: set & {}", atom).into()),
    }
  }

  fn ensure_set(&mut self, id: FsId) -> Result<(), Err> {
    match self.value_mut(id) {
      v @ FsValue::Unset => {
        *v = FsValue::Set(Vec::new());
        Ok(())
      }
      FsValue::Set(_) => Ok(()),
      FsValue::Atom(a) => Err(format!("containment target holds {}, not a set", a).into()),
      FsValue::Avm(_) => Err("containment target holds a feature map, not a set".into()),
    }
  }

  /// Add a member class to a set-valued container. Membership is by class,
  /// so re-adding an id already in the set is a no-op.
  pub fn add_member(&mut self, container: FsId, member: FsId) -> Result<bool, Err> {
    let c = self.find(container);
    let m = self.find(member);
    self.ensure_set(c)?;

    let present = match self.value(c) {
      FsValue::Set(members) => members.iter().any(|x| self.find(*x) == m),
      _ => unreachable!("ensure_set left a non-set"),
    };
    if present {
      return Ok(false);
    }

    if let FsValue::Set(members) = self.value_mut(c) {
      members.push(m);
    }
    Ok(true)
  }

  /// Add an atomic member to a set-valued container, deduplicated by value
  pub fn add_member_atom(&mut self, container: FsId, atom: &Atom) -> Result<bool, Err> {
    let c = self.find(container);
    self.ensure_set(c)?;

    let present = match self.value(c) {
      FsValue::Set(members) => members
        .iter()
        .any(|x| matches!(self.value(*x), FsValue::Atom(a) if a == atom)),
      _ => unreachable!("ensure_set left a non-set"),
    };
    if present {
      return Ok(false);
    }

    let member = self.fresh();
    *self.value_mut(member) = FsValue::Atom(atom.clone());
    if let FsValue::Set(members) = self.value_mut(c) {
      members.push(member);
    }
    Ok(true)
  }

  /// The id holding attribute `attr` of `id`'s class, creating the link to
  /// a fresh pending id if the attribute is unbound. A pending class
  /// becomes a feature map here; an atom or set cannot take attributes.
  fn attr_or_insert(&mut self, id: FsId, attr: &str) -> Result<FsId, Err> {
    let root = self.find(id);
    match self.value_mut(root) {
      v @ FsValue::Unset => {
        *v = FsValue::Avm(HashMap::new());
      }
      FsValue::Avm(_) => {}
      FsValue::Atom(a) => {
        return Err(format!("cannot take attribute {} of atom {}", attr, a).into());
      }
      FsValue::Set(_) => {
        return Err(format!("cannot take attribute {} of a set", attr).into());
      }
    }

    let existing = match self.value(root) {
      FsValue::Avm(m) => m.get(attr).copied(),
      _ => unreachable!("just ensured a feature map"),
    };
    match existing {
      Some(target) => Ok(self.find(target)),
      None => {
        let target = self.fresh();
        if let FsValue::Avm(m) = self.value_mut(root) {
          m.insert(attr.to_string(), target);
        }
        Ok(target)
      }
    }
  }

  /// Resolve an expression to a class id while applying defining equations,
  /// lazily extending feature chains through fresh pending ids. An atomic
  /// expression resolves to a fresh class holding the atom.
  pub fn resolve_mut(&mut self, expr: &Expr<FsId>) -> Result<FsId, Err> {
    match expr {
      Expr::Id(i) => Ok(self.find(*i)),
      Expr::Attr(base, attr) => {
        let root = self.resolve_mut(base)?;
        self.attr_or_insert(root, attr)
      }
      Expr::Lit(a) => {
        let id = self.fresh();
        *self.value_mut(id) = FsValue::Atom(a.clone());
        Ok(id)
      }
    }
  }

  /// Read-only resolution for constraint checking: never allocates, never
  /// mutates, returns None when a link is missing.
  pub fn eval(&self, expr: &Expr<FsId>) -> Option<Resolved> {
    match expr {
      Expr::Id(i) => Some(Resolved::Class(self.find(*i))),
      Expr::Lit(a) => Some(Resolved::Val(a.clone())),
      Expr::Attr(base, attr) => match self.eval(base)? {
        Resolved::Class(root) => match self.value(root) {
          FsValue::Avm(m) => m.get(attr).map(|t| Resolved::Class(self.find(*t))),
          _ => None,
        },
        Resolved::Val(_) => None,
      },
    }
  }

  /// Reduce a class that holds an atomic value to the value itself, so that
  /// constraint equality can compare a path against a literal
  pub fn reduce(&self, r: Resolved) -> Resolved {
    match r {
      Resolved::Class(id) => match self.value(id) {
        FsValue::Atom(a) => Resolved::Val(a.clone()),
        _ => Resolved::Class(id),
      },
      val => val,
    }
  }
}
