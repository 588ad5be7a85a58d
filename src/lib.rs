#[macro_use]
extern crate lazy_static;

pub mod annotate;
pub mod describe;
pub mod earley;
pub mod equation;
pub mod forest;
pub mod fstructure;
pub mod grammar;
pub mod parse_grammar;
pub mod rules;
pub mod solver;
pub mod syntree;
pub mod utils;

use std::collections::HashSet;

use crate::annotate::annotate;
use crate::describe::describe;
use crate::earley::{parse_chart, Chart};
use crate::forest::Forest;
pub use crate::fstructure::Fstructure;
pub use crate::grammar::Grammar;
use crate::syntree::SynTree;
pub use crate::utils::Err;

impl Grammar {
  pub fn parse_chart(&self, input: &[&str]) -> Chart {
    parse_chart(self, input)
  }

  fn parse_forest(&self, input: &[&str]) -> Forest {
    Forest::from(self.parse_chart(input))
  }

  /// Every (c-structure, f-structure) analysis of the input: for each parse
  /// tree, for each annotated version of it, the solutions of its
  /// f-description. One tree can yield many f-structures and many trees can
  /// yield the same one; nothing is collapsed here.
  pub fn analyses(&self, input: &[&str]) -> Vec<(SynTree<String, String>, Fstructure)> {
    let mut out = Vec::new();
    for tree in self.parse_forest(input).trees(self) {
      let bare = tree.map(|c| c.value.symbol.name.clone(), |w| w.value.clone());
      for annotated in annotate(self, &tree) {
        let description = describe(&annotated);
        for fs in solver::solve(&description) {
          out.push((bare.clone(), fs));
        }
      }
    }
    out
  }

  /// Parse a token sequence into the set of f-structures it denotes: the
  /// union over all parse trees and annotation choices, with duplicates
  /// collapsed by structural equality. No ordering is promised.
  pub fn parse(&self, input: &[&str]) -> Vec<Fstructure> {
    let mut seen = HashSet::new();
    self
      .analyses(input)
      .into_iter()
      .filter_map(|(_, fs)| seen.insert(fs.clone()).then_some(fs))
      .collect()
  }
}

#[cfg(test)]
fn sem(pred: &str, roles: &[&str]) -> equation::Atom {
  equation::Atom::Sem(equation::SemForm {
    pred: pred.to_string(),
    roles: roles.iter().map(|r| r.to_string()).collect(),
  })
}

#[test]
fn test_lexical_atom() {
  // the smallest possible grammar: one lexicon entry, no phrasal rules
  let g: Grammar = "N -> john { ^.PRED = 'john<>' };".parse().unwrap();

  let solutions = g.parse(&["john"]);
  assert_eq!(solutions.len(), 1);
  assert_eq!(
    solutions[0].get_path(&["PRED"]).and_then(|f| f.as_atom()),
    Some(&sem("john", &[]))
  );
}

#[test]
fn test_subject_verb_agreement() {
  let g: Grammar = include_str!("../grammars/agreement.lfg").parse().unwrap();

  let solutions = g.parse(&["john", "sleeps"]);
  assert_eq!(solutions.len(), 1);

  let fs = &solutions[0];
  assert_eq!(
    fs.get_path(&["PRED"]).and_then(|f| f.as_atom()),
    Some(&sem("sleep", &["SUBJ"]))
  );
  assert_eq!(
    fs.get_path(&["SUBJ", "PRED"]).and_then(|f| f.as_atom()),
    Some(&sem("john", &[]))
  );
  assert_eq!(fs.get_path_sym(&["SUBJ", "NUM"]), Some("SG"));
}

#[test]
fn test_agreement_failure() {
  let g: Grammar = include_str!("../grammars/agreement.lfg").parse().unwrap();

  // boys is PL, sleeps constrains its subject to SG
  assert!(g.parse(&["boys", "sleeps"]).is_empty());
  assert_eq!(g.parse(&["boys", "sleep"]).len(), 1);
}

#[test]
fn test_disjunction_fans_out() {
  let g: Grammar = include_str!("../grammars/tense.lfg").parse().unwrap();

  let mut tenses = g
    .parse(&["mary", "read"])
    .iter()
    .map(|fs| fs.get_path_sym(&["TENSE"]).unwrap().to_string())
    .collect::<Vec<_>>();
  tenses.sort();

  assert_eq!(tenses, vec!["PAST".to_string(), "PRES".to_string()]);
}

#[test]
fn test_negative_existence() {
  let g: Grammar = include_str!("../grammars/agreement.lfg").parse().unwrap();

  // the intransitive parse passes its ~^.OBJ annotation
  assert_eq!(g.parse(&["john", "sleeps"]).len(), 1);
  // a transitive frame under sleeps assigns OBJ and fails it
  assert!(g.parse(&["john", "sleeps", "mary"]).is_empty());
  // while a genuinely transitive verb goes through
  assert_eq!(g.parse(&["john", "kisses", "mary"]).len(), 1);
}

#[test]
fn test_incomplete_transitive_rejected() {
  let g: Grammar = include_str!("../grammars/agreement.lfg").parse().unwrap();

  // kiss<SUBJ,OBJ> parses intransitively but fails completeness
  assert!(g.parse(&["john", "kisses"]).is_empty());
}

#[test]
fn test_adjunct_set_cardinality() {
  let g: Grammar = include_str!("../grammars/adjuncts.lfg").parse().unwrap();

  let solutions = g.parse(&["mary", "sleeps", "quickly", "quietly"]);
  assert_eq!(solutions.len(), 1);

  let adjuncts = solutions[0]
    .get_path(&["ADJUNCTS"])
    .and_then(|f| f.as_set())
    .unwrap();
  assert_eq!(adjuncts.len(), 2);
}

#[test]
fn test_ambiguity_union() {
  // "x x x" brackets two ways; the result is the union over both trees
  let g: Grammar = r#"
    S -> S { ^.L = ! } S { ^.R = ! };
    S -> x { ^.PRED = 'x<>' };
  "#
  .parse()
  .unwrap();

  let analyses = g.analyses(&["x", "x", "x"]);
  assert_eq!(analyses.len(), 2);

  let solutions = g.parse(&["x", "x", "x"]);
  assert_eq!(solutions.len(), 2);
  let union: HashSet<_> = analyses.into_iter().map(|(_, fs)| fs).collect();
  let collapsed: HashSet<_> = solutions.into_iter().collect();
  assert_eq!(union, collapsed);
}

#[test]
fn test_duplicate_analyses_collapse() {
  // two identical readings of john: two analyses, one f-structure
  let g: Grammar = r#"
    N -> john { ^.PRED = 'john<>' };
    N -> john { ^.PRED = 'john<>' };
  "#
  .parse()
  .unwrap();

  assert_eq!(g.analyses(&["john"]).len(), 2);
  assert_eq!(g.parse(&["john"]).len(), 1);
}

#[test]
fn test_epsilon_rule() {
  // OPT produces nothing but still contributes its annotation slot
  let g: Grammar = r#"
    S -> OPT { ^ = ! } N { ^ = ! };
    OPT -> ;
    N -> john { ^.PRED = 'john<>' };
  "#
  .parse()
  .unwrap();

  let solutions = g.parse(&["john"]);
  assert_eq!(solutions.len(), 1);
  assert_eq!(
    solutions[0].get_path(&["PRED"]).and_then(|f| f.as_atom()),
    Some(&sem("john", &[]))
  );
}

#[test]
fn test_no_parse_is_empty_result() {
  let g: Grammar = include_str!("../grammars/agreement.lfg").parse().unwrap();

  assert!(g.parse(&["sleeps", "john"]).is_empty());
  assert!(g.parse(&["unknown", "tokens"]).is_empty());
}
