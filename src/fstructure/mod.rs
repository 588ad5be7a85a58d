mod graph;
mod solved;

pub use graph::{FsGraph, FsValue, Resolved};
pub use solved::Fstructure;

#[cfg(test)]
mod tests {
  use super::*;
  use crate::equation::{Atom, Expr, FsId, SemForm};

  fn sym(s: &str) -> Atom {
    Atom::Sym(s.to_string())
  }

  #[test]
  fn test_union_merges_feature_maps() {
    let mut g = FsGraph::with_ids(2);
    let a = g
      .resolve_mut(&Expr::Id(FsId(0)).attr("NUM"))
      .unwrap();
    g.set_atom(a, sym("SG")).unwrap();
    let b = g
      .resolve_mut(&Expr::Id(FsId(1)).attr("CASE"))
      .unwrap();
    g.set_atom(b, sym("NOM")).unwrap();

    g.union(FsId(0), FsId(1)).unwrap();

    let fs = Fstructure::from_graph(&g, FsId(0));
    assert_eq!(fs.get_path_sym(&["NUM"]), Some("SG"));
    assert_eq!(fs.get_path_sym(&["CASE"]), Some("NOM"));
    // both ids canonicalize identically after the merge
    assert_eq!(fs, Fstructure::from_graph(&g, FsId(1)));
  }

  #[test]
  fn test_union_clash_on_incompatible_atoms() {
    let mut g = FsGraph::with_ids(2);
    g.set_atom(FsId(0), sym("SG")).unwrap();
    g.set_atom(FsId(1), sym("PL")).unwrap();
    assert!(g.union(FsId(0), FsId(1)).is_err());
  }

  #[test]
  fn test_atom_never_takes_attributes() {
    let mut g = FsGraph::with_ids(1);
    g.set_atom(FsId(0), sym("SG")).unwrap();
    assert!(g.resolve_mut(&Expr::Id(FsId(0)).attr("NUM")).is_err());
  }

  #[test]
  fn test_shared_attribute_unifies_recursively() {
    let mut g = FsGraph::with_ids(2);
    let a = g.resolve_mut(&Expr::Id(FsId(0)).attr("SUBJ").attr("NUM")).unwrap();
    g.set_atom(a, sym("SG")).unwrap();
    let b = g.resolve_mut(&Expr::Id(FsId(1)).attr("SUBJ").attr("NUM")).unwrap();
    g.set_atom(b, sym("PL")).unwrap();

    assert!(g.union(FsId(0), FsId(1)).is_err());
  }

  #[test]
  fn test_semantic_forms_unify_by_identity() {
    let kiss = Atom::Sem(SemForm {
      pred: "kiss".to_string(),
      roles: vec!["SUBJ".to_string(), "OBJ".to_string()],
    });
    let sleep = Atom::Sem(SemForm {
      pred: "sleep".to_string(),
      roles: vec!["SUBJ".to_string()],
    });

    let mut g = FsGraph::with_ids(3);
    g.set_atom(FsId(0), kiss.clone()).unwrap();
    g.set_atom(FsId(1), kiss).unwrap();
    g.set_atom(FsId(2), sleep).unwrap();

    assert!(g.union(FsId(0), FsId(1)).is_ok());
    assert!(g.union(FsId(0), FsId(2)).is_err());
  }

  #[test]
  fn test_eval_is_read_only() {
    let g = FsGraph::with_ids(1);
    // a pending class has no attributes to follow
    assert_eq!(g.eval(&Expr::Id(FsId(0)).attr("OBJ")), None);
    // and checking didn't create one
    assert_eq!(g.value(FsId(0)), &FsValue::Unset);
  }

  #[test]
  fn test_set_members_dedup_by_class() {
    let mut g = FsGraph::with_ids(3);
    g.add_member(FsId(0), FsId(1)).unwrap();
    g.add_member(FsId(0), FsId(2)).unwrap();

    match Fstructure::from_graph(&g, FsId(0)) {
      Fstructure::Set(vs) => assert_eq!(vs.len(), 2),
      other => panic!("expected a set, got {:?}", other),
    }

    // merging two members collapses them in the canonical set
    g.union(FsId(1), FsId(2)).unwrap();
    assert!(!g.add_member(FsId(0), FsId(1)).unwrap());

    match Fstructure::from_graph(&g, FsId(0)) {
      Fstructure::Set(vs) => assert_eq!(vs.len(), 1),
      other => panic!("expected a set, got {:?}", other),
    }
  }

  #[test]
  fn test_canonical_invariant_under_renaming() {
    let build = |root: u32, other: u32| {
      let mut g = FsGraph::with_ids(2);
      let subj = g
        .resolve_mut(&Expr::Id(FsId(root)).attr("SUBJ"))
        .unwrap();
      g.union(subj, FsId(other)).unwrap();
      let num = g.resolve_mut(&Expr::Id(FsId(other)).attr("NUM")).unwrap();
      g.set_atom(num, sym("SG")).unwrap();
      Fstructure::from_graph(&g, FsId(root))
    };

    assert_eq!(build(0, 1), build(1, 0));
  }

  #[test]
  fn test_canonicalization_idempotent() {
    let mut g = FsGraph::with_ids(2);
    g.add_member(FsId(0), FsId(1)).unwrap();
    let p = g.resolve_mut(&Expr::Id(FsId(1)).attr("PRED")).unwrap();
    g.set_atom(p, sym("quickly")).unwrap();

    let once = Fstructure::from_graph(&g, FsId(0));
    let twice = Fstructure::from_graph(&g, FsId(0));
    assert_eq!(once, twice);
  }

  #[test]
  fn test_cycle_is_cut() {
    let mut g = FsGraph::with_ids(1);
    let inner = g.resolve_mut(&Expr::Id(FsId(0)).attr("SELF")).unwrap();
    g.union(inner, FsId(0)).unwrap();

    let fs = Fstructure::from_graph(&g, FsId(0));
    assert_eq!(fs.get_path(&["SELF"]), Some(&Fstructure::Cycle));
  }
}
