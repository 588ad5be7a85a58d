use regex::Regex;
/// Simple recursive-descent parsing of grammar files
use std::str::FromStr;

use crate::equation::{Atom, Equation, Expr, RelId, Schema, SemForm};
use crate::grammar::Grammar;
use crate::rules::{LexCategory, Rule, Symbol};
use crate::utils::Err;

type Infallible<'a, T> = (T, &'a str);
type ParseResult<'a, T> = Result<(T, &'a str), Err>;

/// helper macro for initializing a regex with lazy_static!
macro_rules! regex_static {
  ($name:ident, $pattern:expr) => {
    lazy_static! {
      static ref $name: Regex = Regex::new($pattern).unwrap();
    }
  };
}

/// Try to consume a regex, returning None if it doesn't match
fn optional_re<'a>(re: &'static Regex, s: &'a str) -> Infallible<'a, Option<&'a str>> {
  if let Some(caps) = re.captures(s) {
    let m = caps.get(0).unwrap();
    if m.start() > 0 {
      return (None, s);
    }
    let (_, rest) = s.split_at(m.end());
    (Some(m.as_str()), rest)
  } else {
    (None, s)
  }
}

/// Try to consume a regex, failing if it doesn't match
fn needed_re<'a>(re: &'static Regex, s: &'a str) -> ParseResult<'a, &'a str> {
  if let (Some(c), rest) = optional_re(re, s) {
    Ok((c, rest))
  } else {
    Err(format!("couldn't match {} at {}", re, s).into())
  }
}

/// Try to consume a char, returning None if it doesn't match
fn optional_char(c: char, s: &str) -> Infallible<Option<char>> {
  let mut iter = s.char_indices().peekable();
  if let Some((_, c1)) = iter.next() {
    if c == c1 {
      let rest = if let Some((idx, _)) = iter.peek() {
        s.split_at(*idx).1
      } else {
        ""
      };
      return (Some(c), rest);
    }
  }
  (None, s)
}

/// Try to consume a char, failing if it doesn't match
fn needed_char(c: char, s: &str) -> ParseResult<char> {
  if let (Some(c), rest) = optional_char(c, s) {
    Ok((c, rest))
  } else {
    Err(format!("couldn't match {} at {}", c, s).into())
  }
}

/// Tries to skip \s characters and // comments
fn skip_whitespace(s: &str) -> &str {
  regex_static!(WHITESPACE_OR_COMMENT, r"(?:\s+|//[^\n]*)+");
  optional_re(&WHITESPACE_OR_COMMENT, s).1
}

/// Tries to parse a name made of letters, numbers, - and _
fn parse_name(s: &str) -> ParseResult<&str> {
  regex_static!(NAME, r"[a-zA-Z0-9\-_]+");
  needed_re(&NAME, s).map_err(|err| format!("name: {}", err).into())
}

/// `^` or `!` followed by dotted attributes: ^.SUBJ.NUM
fn parse_path(s: &str) -> ParseResult<Expr<RelId>> {
  let (expr, s) = if let (Some(_), rest) = optional_char('^', s) {
    (Expr::Id(RelId::Up), rest)
  } else if let (Some(_), rest) = optional_char('!', s) {
    (Expr::Id(RelId::Down), rest)
  } else {
    return Err(format!("expected ^ or ! at {}", s).into());
  };

  let mut expr = expr;
  let mut rem = s;
  loop {
    let (dot, s) = optional_char('.', rem);
    if dot.is_none() {
      return Ok((expr, rem));
    }
    let (attr, s) = parse_name(s).map_err(|e| -> Err { format!("attribute: {}", e).into() })?;
    expr = expr.attr(attr);
    rem = s;
  }
}

/// 'pred<ROLE1,ROLE2>' with an arbitrary, possibly empty role list
fn parse_semform(s: &str) -> ParseResult<SemForm> {
  let (_, s) = needed_char('\'', s)?;
  let (pred, s) = parse_name(s).map_err(|e| -> Err { format!("predicate: {}", e).into() })?;
  let (_, s) = needed_char('<', s)?;

  let mut roles = Vec::new();
  let mut rem = skip_whitespace(s);
  loop {
    if let (Some(_), s) = optional_char('>', rem) {
      rem = s;
      break;
    }
    let (role, s) = parse_name(rem).map_err(|e| -> Err { format!("role: {}", e).into() })?;
    roles.push(role.to_string());
    let s = skip_whitespace(s);
    let (_, s) = optional_char(',', s);
    rem = skip_whitespace(s);
  }
  let (_, rem) = needed_char('\'', rem)?;

  Ok((
    SemForm {
      pred: pred.to_string(),
      roles,
    },
    rem,
  ))
}

/// A semantic form, the booleans + and -, or a bare symbol
fn parse_atom(s: &str) -> ParseResult<Atom> {
  if s.starts_with('\'') {
    let (sf, s) = parse_semform(s)?;
    return Ok((Atom::Sem(sf), s));
  }
  if let (Some(_), s) = optional_char('+', s) {
    return Ok((Atom::Bool(true), s));
  }
  let (name, s) = parse_name(s).map_err(|e| -> Err { format!("value: {}", e).into() })?;
  if name == "-" {
    Ok((Atom::Bool(false), s))
  } else {
    Ok((Atom::Sym(name.to_string()), s))
  }
}

fn parse_expr(s: &str) -> ParseResult<Expr<RelId>> {
  if s.starts_with('^') || s.starts_with('!') {
    parse_path(s)
  } else {
    let (atom, s) = parse_atom(s)?;
    Ok((Expr::Lit(atom), s))
  }
}

/// One equation: assignment `=`, constraint equality `=c`, containment
/// `in`, or a bare path as an existence constraint
fn parse_statement(s: &str) -> ParseResult<Schema> {
  regex_static!(EQ_CONSTRAINT, r"=c\b");
  regex_static!(ASSIGN, r"=");
  regex_static!(IN_KEYWORD, r"in\b");

  let (lhs, s) = parse_expr(s)?;
  let after_lhs = skip_whitespace(s);

  if let (Some(_), rest) = optional_re(&EQ_CONSTRAINT, after_lhs) {
    let (rhs, rest) = parse_expr(skip_whitespace(rest))?;
    Ok((Equation::Equals(true, lhs, rhs), rest))
  } else if let (Some(_), rest) = optional_re(&ASSIGN, after_lhs) {
    let (rhs, rest) = parse_expr(skip_whitespace(rest))?;
    Ok((Equation::Assign(lhs, rhs), rest))
  } else if let (Some(_), rest) = optional_re(&IN_KEYWORD, after_lhs) {
    let (container, rest) = parse_expr(skip_whitespace(rest))?;
    Ok((Equation::Contain(lhs, container), rest))
  } else if lhs.is_lit() {
    Err(format!("expected = after value at {}", after_lhs).into())
  } else {
    Ok((Equation::Exists(true, lhs), s))
  }
}

/// `~` negation and parenthesized grouping bind tightest
fn parse_unary(s: &str) -> ParseResult<Schema> {
  if let (Some(_), rest) = optional_char('~', s) {
    let (eq, rest) = parse_unary(skip_whitespace(rest))?;
    Ok((eq.negate(), rest))
  } else if let (Some(_), rest) = optional_char('(', s) {
    let (eq, rest) = parse_conjunction(skip_whitespace(rest))?;
    let (_, rest) = needed_char(')', skip_whitespace(rest))?;
    Ok((eq, rest))
  } else {
    parse_statement(s)
  }
}

fn parse_disjunction(s: &str) -> ParseResult<Schema> {
  let (mut eq, mut rem) = parse_unary(s)?;
  loop {
    let s = skip_whitespace(rem);
    if let (Some(_), s) = optional_char('|', s) {
      let (rhs, s) = parse_unary(skip_whitespace(s))?;
      eq = Equation::Or(Box::new(eq), Box::new(rhs));
      rem = s;
    } else {
      return Ok((eq, rem));
    }
  }
}

/// `,` binds loosest: `a, b | c` requires a and one of b, c
fn parse_conjunction(s: &str) -> ParseResult<Schema> {
  let (mut eq, mut rem) = parse_disjunction(s)?;
  loop {
    let s = skip_whitespace(rem);
    if let (Some(_), s) = optional_char(',', s) {
      let (rhs, s) = parse_disjunction(skip_whitespace(s))?;
      eq = Equation::And(Box::new(eq), Box::new(rhs));
      rem = s;
    } else {
      return Ok((eq, rem));
    }
  }
}

/// An optional brace-delimited annotation after an RHS item
fn parse_annotation(s: &str) -> ParseResult<Option<Schema>> {
  if let (Some(_), rest) = optional_char('{', s) {
    let (schema, rest) = parse_conjunction(skip_whitespace(rest))?;
    let (_, rest) = needed_char('}', skip_whitespace(rest))?;
    Ok((Some(schema), rest))
  } else {
    Ok((None, s))
  }
}

/// An unannotated item defaults to `^ = !`, the identity annotation
fn default_schema() -> Schema {
  Equation::Assign(Expr::Id(RelId::Up), Expr::Id(RelId::Down))
}

enum ParsedRule {
  Phrasal(Rule),
  Lexical(Symbol, String, Schema),
}

/// Symbol, arrow, annotated productions, terminated by a semicolon.
/// A single lower-case item is a surface token and makes the rule a
/// lexicon entry; upper-case items are child symbols.
fn parse_rule(s: &str) -> ParseResult<ParsedRule> {
  #![allow(clippy::trivial_regex)]
  regex_static!(ARROW, "->");

  let (name, s) = parse_name(s).map_err(|e| -> Err { format!("rule symbol: {}", e).into() })?;
  if name.chars().next().unwrap().is_lowercase() {
    return Err(format!("rule symbol must be upper-case: {}", name).into());
  }
  let symbol = Symbol::new(name);

  let s = skip_whitespace(s);
  let (_, s) = needed_re(&ARROW, s).map_err(|e| -> Err { format!("rule arrow: {}", e).into() })?;

  let mut items: Vec<(String, Option<Schema>)> = Vec::new();
  let mut rem = s;
  loop {
    rem = skip_whitespace(rem);
    if let (Some(_), s) = optional_char(';', rem) {
      rem = s;
      break;
    }
    let (item, s) =
      parse_name(rem).map_err(|e| -> Err { format!("rule production: {}", e).into() })?;
    let (annotation, s) = parse_annotation(skip_whitespace(s))?;
    items.push((item.to_string(), annotation));
    rem = s;
  }

  let terminals = items
    .iter()
    .filter(|(n, _)| n.chars().next().unwrap().is_lowercase())
    .count();

  if terminals == 0 {
    let rhs = items
      .into_iter()
      .map(|(n, a)| (Symbol::new(n), a.unwrap_or_else(default_schema)))
      .collect();
    Ok((ParsedRule::Phrasal(Rule::new(symbol, rhs)), rem))
  } else if terminals == 1 && items.len() == 1 {
    let (token, annotation) = items.into_iter().next().unwrap();
    Ok((
      ParsedRule::Lexical(symbol, token, annotation.unwrap_or_else(default_schema)),
      rem,
    ))
  } else {
    Err(
      format!(
        "lexicon entries take a single lower-case token: {} -> ...",
        symbol
      )
      .into(),
    )
  }
}

/// Parses a str into LFG rules and lexical categories.
/// Errors if the grammar doesn't parse or is malformed.
fn parse_rules(s: &str) -> ParseResult<(Vec<Rule>, Vec<LexCategory>)> {
  let mut rules = Vec::new();
  let mut categories: Vec<LexCategory> = Vec::new();
  let mut rem = s;
  loop {
    rem = skip_whitespace(rem);
    if rem.is_empty() {
      return Ok(((rules, categories), rem));
    }
    let (rule, s) = parse_rule(rem)?;
    match rule {
      ParsedRule::Phrasal(r) => rules.push(r),
      ParsedRule::Lexical(symbol, token, schema) => {
        match categories.iter_mut().find(|c| c.symbol == symbol) {
          Some(c) => c.add(token, schema),
          None => {
            let mut c = LexCategory::new(symbol);
            c.add(token, schema);
            categories.push(c);
          }
        }
      }
    }
    rem = s;
  }
}

impl FromStr for Grammar {
  type Err = Err;

  /// Parses a grammar from a string. The first phrasal rule's symbol is the
  /// start symbol (the first category's, in a lexicon-only grammar).
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let ((rules, categories), rem) = parse_rules(s)?;
    assert!(rem.is_empty());
    Grammar::new(rules, categories, None)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn schema_of(src: &str) -> Schema {
    let (schema, rem) = parse_conjunction(src).unwrap();
    assert!(skip_whitespace(rem).is_empty(), "leftover: {}", rem);
    schema
  }

  #[test]
  fn test_parse_paths_and_atoms() {
    assert_eq!(
      schema_of("^.SUBJ = !"),
      Equation::Assign(Expr::Id(RelId::Up).attr("SUBJ"), Expr::Id(RelId::Down))
    );
    assert_eq!(
      schema_of("^.PRED = 'kiss<SUBJ, OBJ>'"),
      Equation::Assign(
        Expr::Id(RelId::Up).attr("PRED"),
        Expr::Lit(Atom::Sem(SemForm {
          pred: "kiss".to_string(),
          roles: vec!["SUBJ".to_string(), "OBJ".to_string()],
        }))
      )
    );
    assert_eq!(
      schema_of("^.DEF = +"),
      Equation::Assign(Expr::Id(RelId::Up).attr("DEF"), Expr::Lit(Atom::Bool(true)))
    );
  }

  #[test]
  fn test_parse_constraint_forms() {
    assert_eq!(
      schema_of("^.SUBJ.NUM =c SG"),
      Equation::Equals(
        true,
        Expr::Id(RelId::Up).attr("SUBJ").attr("NUM"),
        Expr::Lit(Atom::Sym("SG".to_string()))
      )
    );
    assert_eq!(
      schema_of("~^.OBJ"),
      Equation::Exists(false, Expr::Id(RelId::Up).attr("OBJ"))
    );
    assert_eq!(
      schema_of("! in ^.ADJUNCTS"),
      Equation::Contain(Expr::Id(RelId::Down), Expr::Id(RelId::Up).attr("ADJUNCTS"))
    );
  }

  #[test]
  fn test_comma_binds_looser_than_pipe() {
    let schema = schema_of("^.A = x, ^.B = y | ^.B = z");
    match schema {
      Equation::And(a, or) => {
        assert!(matches!(*a, Equation::Assign(_, _)));
        assert!(matches!(*or, Equation::Or(_, _)));
      }
      other => panic!("expected And at top, got {:?}", other),
    }
  }

  #[test]
  fn test_negation_distributes_in_notation() {
    // ~(a | b) parses straight into the conjunction of the negations
    let schema = schema_of("~(^.A = x | ^.B = y)");
    match schema {
      Equation::And(a, b) => {
        assert!(matches!(*a, Equation::Equals(false, _, _)));
        assert!(matches!(*b, Equation::Equals(false, _, _)));
      }
      other => panic!("expected And of negations, got {:?}", other),
    }
  }

  #[test]
  fn test_parse_grammar() {
    let g: Grammar = r#"
      // a tiny agreement grammar
      S -> NP { ^.SUBJ = ! } VP { ^ = ! };
      VP -> V { ^ = ! };
      NP -> john { ^.PRED = 'john<>', ^.NUM = SG };
      V -> sleeps { ^.PRED = 'sleep<SUBJ>', ^.SUBJ.NUM =c SG };
    "#
    .parse()
    .unwrap();

    assert_eq!(g.start, "S");
    assert_eq!(g.rules_for("S").unwrap().len(), 1);
    assert_eq!(g.rules_for("NP").unwrap().len(), 1);
    assert_eq!(g.lex_schemas("NP", "john").len(), 1);
    assert_eq!(g.lex_schemas("NP", "mary").len(), 0);
  }

  #[test]
  fn test_unannotated_item_defaults_to_identity() {
    let g: Grammar = r#"
      S -> VP;
      VP -> sleeps;
    "#
    .parse()
    .unwrap();

    let rule = &g.rules_for("S").unwrap()[0];
    assert_eq!(g.annotations_for(rule), &[vec![default_schema()]]);
  }

  #[test]
  fn test_lowercase_rule_symbol_rejected() {
    assert!("s -> NP;".parse::<Grammar>().is_err());
  }

  #[test]
  fn test_mixed_rhs_rejected() {
    let r = "S -> NP { ^.SUBJ = ! } sleeps;".parse::<Grammar>();
    assert!(r.is_err());
  }

  #[test]
  fn smoke_test_grammar_files() {
    let examples = [
      ("agreement.lfg", include_str!("../grammars/agreement.lfg")),
      ("adjuncts.lfg", include_str!("../grammars/adjuncts.lfg")),
      ("tense.lfg", include_str!("../grammars/tense.lfg")),
    ];

    for (filename, src) in examples {
      assert!(src.parse::<Grammar>().is_ok(), "failed to parse {filename}");
    }
  }
}
