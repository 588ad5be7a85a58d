use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;
use std::rc::Rc;

use crate::equation::Schema;
use crate::rules::{CfgRule, LexCategory, Production, Rule, Symbol};
use crate::utils::Err;

/// CFG projection of an LFG rule: parent symbol plus RHS symbol names.
/// All LFG rules sharing a projection contribute alternative schema lists
/// for the same chart-parser rule.
type Projection = (String, Vec<String>);

#[derive(Debug)]
pub struct Grammar {
  pub start: String,
  rules: Vec<Rc<Rule>>,
  categories: Vec<LexCategory>,
  cfg: HashMap<String, Vec<Rc<CfgRule>>>,
  annotations: HashMap<Projection, Vec<Vec<Schema>>>,
  nullables: HashSet<String>,
}

impl Grammar {
  /// Builds a grammar from LFG rules and lexical categories. A malformed
  /// grammar is a programmer error and fails here, not during parsing:
  /// empty grammars, undefined RHS symbols, and undefined start symbols
  /// are all rejected loudly.
  pub fn new(
    rules: Vec<Rule>,
    categories: Vec<LexCategory>,
    start: Option<String>,
  ) -> Result<Self, Err> {
    if rules.is_empty() && categories.is_empty() {
      return Err("empty grammar".into());
    }

    let start = start
      .or_else(|| rules.first().map(|r| r.symbol.name.clone()))
      .or_else(|| categories.first().map(|c| c.symbol.name.clone()))
      .expect("either rules or categories is nonempty");

    let defined: HashSet<&str> = rules
      .iter()
      .map(|r| r.symbol.name.as_str())
      .chain(categories.iter().map(|c| c.symbol.name.as_str()))
      .collect();

    for rule in rules.iter() {
      for (child, _) in rule.rhs.iter() {
        if !defined.contains(child.name.as_str()) {
          return Err(format!("rule {} uses undefined symbol {}", rule, child).into());
        }
      }
    }

    if !defined.contains(start.as_str()) {
      return Err(format!("start symbol {} is not defined by any rule", start).into());
    }

    let rules: Vec<Rc<Rule>> = rules.into_iter().map(Rc::new).collect();

    // group schema lists by cfg projection; mint one chart rule per projection
    let mut cfg: HashMap<String, Vec<Rc<CfgRule>>> = HashMap::new();
    let mut annotations: HashMap<Projection, Vec<Vec<Schema>>> = HashMap::new();
    for rule in rules.iter() {
      let key: Projection = (
        rule.symbol.name.clone(),
        rule.rhs.iter().map(|(s, _)| s.name.clone()).collect(),
      );
      let specs: Vec<Schema> = rule.rhs.iter().map(|(_, eq)| eq.clone()).collect();

      let lists = annotations.entry(key.clone()).or_default();
      if lists.is_empty() {
        cfg
          .entry(key.0.clone())
          .or_default()
          .push(Rc::new(CfgRule {
            symbol: rule.symbol.clone(),
            productions: key
              .1
              .iter()
              .map(|name| Production::Nonterminal(Symbol::new(name.clone())))
              .collect(),
          }));
      }
      lists.push(specs);
    }

    // every (category symbol, token) pair projects to one preterminal rule
    let mut lexical_seen: HashSet<(String, String)> = HashSet::new();
    for category in categories.iter() {
      for token in category.tokens() {
        let key = (category.symbol.name.clone(), token.to_string());
        if lexical_seen.insert(key) {
          cfg
            .entry(category.symbol.name.clone())
            .or_default()
            .push(Rc::new(CfgRule {
              symbol: category.symbol.clone(),
              productions: vec![Production::Terminal(token.to_string())],
            }));
        }
      }
    }

    let nullables = Self::find_nullables(&cfg);

    Ok(Self {
      start,
      rules,
      categories,
      cfg,
      annotations,
      nullables,
    })
  }

  pub fn read_from_file(path: impl AsRef<Path>) -> Result<Self, Err> {
    std::fs::read_to_string(path)?.parse()
  }

  fn cfg_rule_is_nullable(nullables: &HashSet<String>, rule: &CfgRule) -> bool {
    rule.is_empty()
      || rule.productions.iter().all(|p| match p {
        Production::Nonterminal(s) => nullables.contains(&s.name),
        Production::Terminal(_) => false,
      })
  }

  fn find_nullables(cfg: &HashMap<String, Vec<Rc<CfgRule>>>) -> HashSet<String> {
    let mut nullables: HashSet<String> = HashSet::new();

    let mut last_length = 1;
    while last_length != nullables.len() {
      last_length = nullables.len();
      for r in cfg.values().flatten() {
        if !nullables.contains(r.symbol_str()) && Self::cfg_rule_is_nullable(&nullables, r) {
          nullables.insert(r.symbol_str().to_string());
        }
      }
    }

    nullables
  }

  pub fn is_nullable(&self, s: &str) -> bool {
    self.nullables.contains(s)
  }

  /// Chart rules for a symbol, phrasal and preterminal alike
  pub fn rules_for(&self, symbol: &str) -> Option<&Vec<Rc<CfgRule>>> {
    self.cfg.get(symbol)
  }

  /// All schema lists contributed by LFG rules with this chart rule's
  /// projection. Each list pairs positionally with the rule's RHS.
  pub fn annotations_for(&self, rule: &CfgRule) -> &[Vec<Schema>] {
    let key: Projection = (
      rule.symbol.name.clone(),
      rule
        .productions
        .iter()
        .map(|p| p.symbol_str().to_string())
        .collect(),
    );
    self
      .annotations
      .get(&key)
      .map(Vec::as_slice)
      .unwrap_or(&[])
  }

  /// Every reading the lexicon offers for a token under a preterminal
  /// symbol, across all categories carrying that symbol.
  pub fn lex_schemas(&self, symbol: &str, token: &str) -> Vec<&Schema> {
    self
      .categories
      .iter()
      .filter(|c| c.symbol.name == symbol)
      .flat_map(|c| c.schemas(token).iter())
      .collect()
  }
}

impl fmt::Display for Grammar {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "//** start: {}", self.start)?;
    write!(f, "//** nullables:")?;
    for nt in self.nullables.iter() {
      write!(f, " {}", nt)?;
    }
    writeln!(f)?;

    for rule in self.rules.iter() {
      writeln!(f, "{}", rule)?;
    }
    for category in self.categories.iter() {
      write!(f, "{}", category)?;
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::equation::{Equation, Expr, RelId};

  fn up_eq_down() -> Schema {
    Equation::Assign(Expr::Id(RelId::Up), Expr::Id(RelId::Down))
  }

  #[test]
  fn test_empty_grammar_rejected() {
    assert!(Grammar::new(Vec::new(), Vec::new(), None).is_err());
  }

  #[test]
  fn test_undefined_symbol_rejected() {
    let rules = vec![Rule::new(
      Symbol::new("S"),
      vec![(Symbol::new("NP"), up_eq_down())],
    )];
    let err = Grammar::new(rules, Vec::new(), None).unwrap_err();
    assert!(err.to_string().contains("undefined symbol NP"));
  }

  #[test]
  fn test_projection_groups_schema_lists() {
    let mut np = LexCategory::new(Symbol::new("NP"));
    np.add("john", up_eq_down());

    let rules = vec![
      Rule::new(Symbol::new("S"), vec![(Symbol::new("NP"), up_eq_down())]),
      Rule::new(Symbol::new("S"), vec![(Symbol::new("NP"), up_eq_down())]),
    ];
    let g = Grammar::new(rules, vec![np], None).unwrap();

    // one chart rule, two annotation alternatives
    let chart_rules = g.rules_for("S").unwrap();
    assert_eq!(chart_rules.len(), 1);
    assert_eq!(g.annotations_for(&chart_rules[0]).len(), 2);
  }

  #[test]
  fn test_epsilon_rule_is_nullable() {
    let mut v = LexCategory::new(Symbol::new("V"));
    v.add("sleeps", up_eq_down());

    let rules = vec![
      Rule::new(
        Symbol::new("S"),
        vec![(Symbol::new("OPT"), up_eq_down()), (Symbol::new("V"), up_eq_down())],
      ),
      Rule::new(Symbol::new("OPT"), Vec::new()),
    ];
    let g = Grammar::new(rules, vec![v], None).unwrap();

    assert!(g.is_nullable("OPT"));
    assert!(!g.is_nullable("V"));
  }
}
