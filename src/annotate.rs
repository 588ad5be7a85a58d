use std::rc::Rc;

use crate::equation::Schema;
use crate::grammar::Grammar;
use crate::rules::{CfgRule, Symbol};
use crate::syntree::SynTree;
use crate::utils::combinations;

/// A parse tree decorated with annotation schemas: every phrase pairs each
/// child with the schema that child inherits from its mother's annotation,
/// and every word carries the schema its lexicon entry supplies.
#[derive(Debug, Clone, PartialEq)]
pub enum AnnTree {
  Phrase(Symbol, Vec<(AnnTree, Schema)>),
  Word(Symbol, String, Schema),
  /// A deferred constituent: no content and no equations of its own
  Hole(Symbol),
  /// An empty node, from an epsilon realization handed in by the parser
  Empty,
}

impl AnnTree {
  pub fn symbol_str(&self) -> Option<&str> {
    match self {
      Self::Phrase(s, _) | Self::Word(s, _, _) | Self::Hole(s) => Some(&s.name),
      Self::Empty => None,
    }
  }
}

/// All annotated versions of a c-structure tree: the Cartesian product of
/// per-child annotation choices with the schema lists of every LFG rule
/// sharing the node's CFG projection. A pure, terminating enumeration; a
/// node with no readings simply contributes no annotated versions.
pub fn annotate(g: &Grammar, tree: &SynTree<Rc<CfgRule>, String>) -> Vec<AnnTree> {
  match tree {
    // a bare token with no preterminal above it has no lexical identity
    SynTree::Leaf(_) => Vec::new(),
    SynTree::Hole(cons) => vec![AnnTree::Hole(cons.value.symbol.clone())],
    SynTree::Empty => vec![AnnTree::Empty],
    SynTree::Branch(cons, children) => {
      let rule = &cons.value;
      if let Some(token) = rule.lexical_token() {
        g.lex_schemas(rule.symbol_str(), token)
          .into_iter()
          .map(|schema| AnnTree::Word(rule.symbol.clone(), token.to_string(), schema.clone()))
          .collect()
      } else {
        let choices: Vec<Vec<AnnTree>> = children.iter().map(|c| annotate(g, c)).collect();
        let combos = combinations(&choices);

        let mut out = Vec::new();
        for specs in g.annotations_for(rule) {
          for combo in combos.iter() {
            out.push(AnnTree::Phrase(
              rule.symbol.clone(),
              combo.iter().cloned().zip(specs.iter().cloned()).collect(),
            ));
          }
        }
        out
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::syntree::Constituent;

  fn parses_of(grammar: &str, input: &[&str]) -> (Grammar, Vec<SynTree<Rc<CfgRule>, String>>) {
    let g: Grammar = grammar.parse().unwrap();
    let trees = crate::forest::Forest::from(crate::earley::parse_chart(&g, input)).trees(&g);
    (g, trees)
  }

  #[test]
  fn test_lexical_ambiguity_fans_out() {
    // two readings of the single token
    let (g, trees) = parses_of(
      r#"
        S -> N { ^ = ! };
        N -> duck { ^.PRED = 'duck<>', ^.NUM = SG };
        N -> duck { ^.PRED = 'duck<>', ^.NUM = PL };
      "#,
      &["duck"],
    );

    assert_eq!(trees.len(), 1);
    assert_eq!(annotate(&g, &trees[0]).len(), 2);
  }

  #[test]
  fn test_rule_alternatives_multiply_with_children() {
    // two schema lists for S's projection x two readings of the noun
    let (g, trees) = parses_of(
      r#"
        S -> N { ^.LEFT = ! };
        S -> N { ^.RIGHT = ! };
        N -> duck { ^.NUM = SG };
        N -> duck { ^.NUM = PL };
      "#,
      &["duck"],
    );

    assert_eq!(trees.len(), 1);
    assert_eq!(annotate(&g, &trees[0]).len(), 4);
  }

  #[test]
  fn test_holes_and_empties_pass_through() {
    let (g, _) = parses_of(
      r#"
        S -> N { ^ = ! };
        N -> duck { ^.NUM = SG };
      "#,
      &["duck"],
    );

    let hole: SynTree<Rc<CfgRule>, String> = SynTree::Hole(Constituent {
      value: g.rules_for("S").unwrap()[0].clone(),
      span: (0, 1),
    });
    assert_eq!(annotate(&g, &hole), vec![AnnTree::Hole(Symbol::new("S"))]);

    let empty: SynTree<Rc<CfgRule>, String> = SynTree::Empty;
    assert_eq!(annotate(&g, &empty), vec![AnnTree::Empty]);
  }
}
