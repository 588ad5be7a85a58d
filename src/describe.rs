use crate::annotate::AnnTree;
use crate::equation::{Equation, FsId};

/// An f-description: the conjunction of every equation grounded over an
/// annotated tree, the id of the tree's root, and the id watermark so the
/// solver can mint fresh ids that don't collide with described ones.
#[derive(Debug, Clone, PartialEq)]
pub struct FDescription {
  pub equations: Vec<Equation<FsId>>,
  pub root: FsId,
  pub next_id: u32,
}

/// Ground an annotated tree into an f-description. Every node visit mints a
/// fresh id; each child's schema is grounded with `up` the mother's id and
/// `down` the child's own. A word's lexical schema grounds with both ends at
/// the word's id, so lexical `^` names the preterminal's f-structure.
pub fn describe(tree: &AnnTree) -> FDescription {
  let mut equations = Vec::new();
  let mut next_id = 0;
  let root = walk(tree, &mut equations, &mut next_id);
  FDescription {
    equations,
    root,
    next_id,
  }
}

fn walk(tree: &AnnTree, equations: &mut Vec<Equation<FsId>>, next_id: &mut u32) -> FsId {
  let id = FsId(*next_id);
  *next_id += 1;

  match tree {
    AnnTree::Word(_, _, schema) => equations.push(schema.ground(id, id)),
    AnnTree::Phrase(_, children) => {
      for (child, schema) in children.iter() {
        let child_id = walk(child, equations, next_id);
        equations.push(schema.ground(id, child_id));
      }
    }
    AnnTree::Hole(_) | AnnTree::Empty => {}
  }

  id
}
