use std::collections::HashSet;

use crate::describe::FDescription;
use crate::equation::{Atom, Equation, Expr, FsId};
use crate::fstructure::{FsGraph, FsValue, Fstructure, Resolved};
use crate::utils::Err;

/// All minimal f-structures satisfying a description: expand disjunctions
/// into independent branches, run each branch's defining equations to a
/// fixed point, then check its constraints and semantic-form governance.
/// Branches that fail in any way are absorbed silently.
pub fn solve(desc: &FDescription) -> Vec<Fstructure> {
  let mut seen = HashSet::new();
  let mut out = Vec::new();
  for branch in expand(&desc.equations) {
    if let Some(fs) = solve_branch(desc, &branch) {
      if seen.insert(fs.clone()) {
        out.push(fs);
      }
    }
  }
  out
}

/// Flatten compound equations into disjunction-free branches: `And` splits
/// into two required equations, `Or` forks the branch. Exponential in the
/// number of disjunctions, like the search space it denotes.
fn expand(equations: &[Equation<FsId>]) -> Vec<Vec<Equation<FsId>>> {
  let mut branches = vec![Vec::new()];
  for eq in equations {
    branches = branches
      .into_iter()
      .flat_map(|branch| split(eq, branch))
      .collect();
  }
  branches
}

fn split(eq: &Equation<FsId>, prefix: Vec<Equation<FsId>>) -> Vec<Vec<Equation<FsId>>> {
  match eq {
    Equation::And(a, b) => split(a, prefix)
      .into_iter()
      .flat_map(|p| split(b, p))
      .collect(),
    Equation::Or(a, b) => {
      let mut branches = split(a, prefix.clone());
      branches.extend(split(b, prefix));
      branches
    }
    _ => {
      let mut branch = prefix;
      branch.push(eq.clone());
      vec![branch]
    }
  }
}

fn solve_branch(desc: &FDescription, equations: &[Equation<FsId>]) -> Option<Fstructure> {
  // each branch owns its own graph; nothing is shared across branches
  let mut graph = FsGraph::with_ids(desc.next_id);

  let (defining, constraints): (Vec<_>, Vec<_>) =
    equations.iter().partition(|eq| eq.is_defining());

  // monotone fixed point: every step only merges classes or binds values,
  // so iteration order affects path length but not the result
  loop {
    let mut changed = false;
    for &eq in defining.iter() {
      match apply(&mut graph, eq) {
        Ok(c) => changed |= c,
        Err(_) => return None,
      }
    }
    if !changed {
      break;
    }
  }

  for &eq in constraints.iter() {
    if !holds(&graph, eq) {
      return None;
    }
  }

  if !governance_ok(&graph, desc.root) {
    return None;
  }

  Some(Fstructure::from_graph(&graph, desc.root))
}

/// Apply one defining equation, lazily extending feature chains as needed.
/// Returns whether the graph gained any information.
fn apply(graph: &mut FsGraph, eq: &Equation<FsId>) -> Result<bool, Err> {
  match eq {
    Equation::Assign(lhs, rhs) => match (lhs, rhs) {
      (Expr::Lit(a), Expr::Lit(b)) => {
        if a == b {
          Ok(false)
        } else {
          Err(format!("unification clash: {} & {}", a, b).into())
        }
      }
      (lhs, Expr::Lit(atom)) => {
        let id = graph.resolve_mut(lhs)?;
        graph.set_atom(id, atom.clone())
      }
      (Expr::Lit(atom), rhs) => {
        let id = graph.resolve_mut(rhs)?;
        graph.set_atom(id, atom.clone())
      }
      (lhs, rhs) => {
        let l = graph.resolve_mut(lhs)?;
        let r = graph.resolve_mut(rhs)?;
        graph.union(l, r)
      }
    },
    Equation::Contain(element, container) => {
      let c = graph.resolve_mut(container)?;
      match element {
        Expr::Lit(atom) => graph.add_member_atom(c, atom),
        _ => {
          let m = graph.resolve_mut(element)?;
          graph.add_member(c, m)
        }
      }
    }
    _ => panic!("tried to apply a non-defining equation"),
  }
}

/// Evaluate one constraint without mutation. A side that fails to resolve
/// never equals, never contains, and does not exist.
fn holds(graph: &FsGraph, eq: &Equation<FsId>) -> bool {
  match eq {
    Equation::Equals(pol, l, r) => {
      let same = match (graph.eval(l), graph.eval(r)) {
        (Some(a), Some(b)) => match (graph.reduce(a), graph.reduce(b)) {
          (Resolved::Val(x), Resolved::Val(y)) => x == y,
          (Resolved::Class(i), Resolved::Class(j)) => i == j,
          _ => false,
        },
        _ => false,
      };
      same == *pol
    }
    Equation::Contains(pol, element, container) => {
      let member = match graph.eval(container) {
        Some(Resolved::Class(c)) => match graph.value(c) {
          FsValue::Set(members) => match element {
            Expr::Lit(atom) => members
              .iter()
              .any(|m| matches!(graph.value(*m), FsValue::Atom(a) if a == atom)),
            _ => match graph.eval(element) {
              Some(Resolved::Class(m)) => members.iter().any(|x| graph.find(*x) == m),
              _ => false,
            },
          },
          _ => false,
        },
        _ => false,
      };
      member == *pol
    }
    Equation::Exists(pol, e) => graph.eval(e).is_some() == *pol,
    _ => panic!("tried to check a non-constraint equation"),
  }
}

/// Completeness and coherence for semantic-form-governed attributes, over
/// the portion of the graph reachable from the root. Wherever an attribute
/// holds a semantic form, every governed role must be realized as a sister
/// attribute, and no other sister may hold a pred-bearing feature map
/// unless it is named as a role. Set-valued sisters (adjuncts) are exempt.
fn governance_ok(graph: &FsGraph, root: FsId) -> bool {
  let mut seen = HashSet::new();
  let mut stack = vec![graph.find(root)];

  while let Some(id) = stack.pop() {
    if !seen.insert(id) {
      continue;
    }

    match graph.value(id) {
      FsValue::Avm(m) => {
        for target in m.values() {
          stack.push(graph.find(*target));
        }

        for target in m.values() {
          if let FsValue::Atom(Atom::Sem(sf)) = graph.value(*target) {
            if sf.roles.iter().any(|role| !m.contains_key(role)) {
              return false; // incomplete: a governed role is unrealized
            }
            for (sister, sister_target) in m.iter() {
              if sf.roles.contains(sister) {
                continue;
              }
              if let FsValue::Avm(inner) = graph.value(*sister_target) {
                let pred_bearing = inner
                  .values()
                  .any(|t| matches!(graph.value(*t), FsValue::Atom(Atom::Sem(_))));
                if pred_bearing {
                  return false; // incoherent: an ungoverned pred-bearing sister
                }
              }
            }
          }
        }
      }
      FsValue::Set(members) => {
        for member in members.iter() {
          stack.push(graph.find(*member));
        }
      }
      _ => {}
    }
  }

  true
}
