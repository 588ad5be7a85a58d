use std::fmt;

/// Relative identifier used in annotation schemas before grounding.
/// `Up` refers to the mother's f-structure, `Down` to the annotated node's own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelId {
  Up,
  Down,
}

/// Absolute identifier, minted once per node visit while building an
/// f-description. Opaque outside this crate; the solver is invariant to
/// renaming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FsId(pub u32);

/// A semantic form: a predicate plus the grammatical functions it governs,
/// written 'kiss<SUBJ,OBJ>'.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SemForm {
  pub pred: String,
  pub roles: Vec<String>,
}

/// An atomic value: a plain symbol like SG, a boolean, or a semantic form
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Atom {
  Sym(String),
  Bool(bool),
  Sem(SemForm),
}

/// Expression over identifier kind `I`: an identifier, an attribute access
/// off another expression, or an atomic value.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr<I> {
  Id(I),
  Attr(Box<Expr<I>>, String),
  Lit(Atom),
}

impl<I> Expr<I> {
  /// `e.attr`
  pub fn attr(self, attr: impl Into<String>) -> Self {
    Expr::Attr(Box::new(self), attr.into())
  }

  pub fn is_lit(&self) -> bool {
    matches!(self, Expr::Lit(_))
  }
}

/// The equation algebra. `Or`/`And` are compound, `Assign`/`Contain` are
/// defining, and the polarity-carrying variants are constraints.
#[derive(Debug, Clone, PartialEq)]
pub enum Equation<I> {
  Or(Box<Equation<I>>, Box<Equation<I>>),
  And(Box<Equation<I>>, Box<Equation<I>>),
  /// the value of the left expression is the right expression
  Assign(Expr<I>, Expr<I>),
  /// the left expression is a member of the set-valued right expression
  Contain(Expr<I>, Expr<I>),
  Equals(bool, Expr<I>, Expr<I>),
  Contains(bool, Expr<I>, Expr<I>),
  Exists(bool, Expr<I>),
}

/// An annotation schema: an equation over relative identifiers, attached to
/// one child slot of a production or to a lexicon entry.
pub type Schema = Equation<RelId>;

impl<I> Equation<I> {
  /// True for `Assign`/`Contain`, the equations the solver may write through.
  pub fn is_defining(&self) -> bool {
    matches!(self, Equation::Assign(_, _) | Equation::Contain(_, _))
  }

  /// Negation distributes through the algebra. Negating a defining equation
  /// collapses it into the constraint domain: you never un-assign, you
  /// require the value to differ. Negation of a constraint flips its
  /// polarity, so it is involutive on constraints.
  pub fn negate(self) -> Self {
    match self {
      Equation::Or(a, b) => Equation::And(Box::new(a.negate()), Box::new(b.negate())),
      Equation::And(a, b) => Equation::Or(Box::new(a.negate()), Box::new(b.negate())),
      Equation::Assign(l, r) => Equation::Equals(false, l, r),
      Equation::Contain(e, c) => Equation::Contains(false, e, c),
      Equation::Equals(pol, l, r) => Equation::Equals(!pol, l, r),
      Equation::Contains(pol, e, c) => Equation::Contains(!pol, e, c),
      Equation::Exists(pol, e) => Equation::Exists(!pol, e),
    }
  }
}

impl Expr<RelId> {
  /// Substitute `Up`/`Down` with the two supplied absolute ids.
  pub fn ground(&self, up: FsId, down: FsId) -> Expr<FsId> {
    match self {
      Expr::Id(RelId::Up) => Expr::Id(up),
      Expr::Id(RelId::Down) => Expr::Id(down),
      Expr::Attr(base, attr) => Expr::Attr(Box::new(base.ground(up, down)), attr.clone()),
      Expr::Lit(a) => Expr::Lit(a.clone()),
    }
  }
}

impl Equation<RelId> {
  /// Ground a schema against two absolute ids. Total: every relative
  /// identifier is replaced, recursively through sub-expressions.
  pub fn ground(&self, up: FsId, down: FsId) -> Equation<FsId> {
    match self {
      Equation::Or(a, b) => Equation::Or(Box::new(a.ground(up, down)), Box::new(b.ground(up, down))),
      Equation::And(a, b) => {
        Equation::And(Box::new(a.ground(up, down)), Box::new(b.ground(up, down)))
      }
      Equation::Assign(l, r) => Equation::Assign(l.ground(up, down), r.ground(up, down)),
      Equation::Contain(e, c) => Equation::Contain(e.ground(up, down), c.ground(up, down)),
      Equation::Equals(pol, l, r) => {
        Equation::Equals(*pol, l.ground(up, down), r.ground(up, down))
      }
      Equation::Contains(pol, e, c) => {
        Equation::Contains(*pol, e.ground(up, down), c.ground(up, down))
      }
      Equation::Exists(pol, e) => Equation::Exists(*pol, e.ground(up, down)),
    }
  }
}

impl fmt::Display for RelId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RelId::Up => write!(f, "^"),
      RelId::Down => write!(f, "!"),
    }
  }
}

impl fmt::Display for FsId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "%{}", self.0)
  }
}

impl fmt::Display for SemForm {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "'{}<{}>'", self.pred, self.roles.join(","))
  }
}

impl fmt::Display for Atom {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Atom::Sym(s) => write!(f, "{}", s),
      Atom::Bool(true) => write!(f, "+"),
      Atom::Bool(false) => write!(f, "-"),
      Atom::Sem(sf) => write!(f, "{}", sf),
    }
  }
}

impl<I> fmt::Display for Expr<I>
where
  I: fmt::Display,
{
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Expr::Id(i) => write!(f, "{}", i),
      Expr::Attr(base, attr) => write!(f, "{}.{}", base, attr),
      Expr::Lit(a) => write!(f, "{}", a),
    }
  }
}

impl<I> fmt::Display for Equation<I>
where
  I: fmt::Display,
{
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Equation::Or(a, b) => write!(f, "({} | {})", a, b),
      Equation::And(a, b) => write!(f, "{}, {}", a, b),
      Equation::Assign(l, r) => write!(f, "{} = {}", l, r),
      Equation::Contain(e, c) => write!(f, "{} in {}", e, c),
      Equation::Equals(true, l, r) => write!(f, "{} =c {}", l, r),
      Equation::Equals(false, l, r) => write!(f, "~({} =c {})", l, r),
      Equation::Contains(true, e, c) => write!(f, "{} in {}", e, c),
      Equation::Contains(false, e, c) => write!(f, "~({} in {})", e, c),
      Equation::Exists(true, e) => write!(f, "{}", e),
      Equation::Exists(false, e) => write!(f, "~{}", e),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn up() -> Expr<RelId> {
    Expr::Id(RelId::Up)
  }

  fn down() -> Expr<RelId> {
    Expr::Id(RelId::Down)
  }

  fn sym(s: &str) -> Expr<RelId> {
    Expr::Lit(Atom::Sym(s.to_string()))
  }

  #[test]
  fn test_negation_collapses_defining() {
    let assign = Equation::Assign(up().attr("NUM"), sym("SG"));
    assert_eq!(
      assign.clone().negate(),
      Equation::Equals(false, up().attr("NUM"), sym("SG"))
    );

    let contain = Equation::Contain(down(), up().attr("ADJUNCTS"));
    assert_eq!(
      contain.negate(),
      Equation::Contains(false, down(), up().attr("ADJUNCTS"))
    );
  }

  #[test]
  fn test_negation_involutive_on_constraints() {
    let constraints = vec![
      Equation::Equals(true, up().attr("NUM"), sym("SG")),
      Equation::Equals(false, up(), down()),
      Equation::Contains(true, down(), up().attr("ADJUNCTS")),
      Equation::Exists(false, up().attr("OBJ")),
    ];

    for c in constraints {
      assert_eq!(c.clone().negate().negate(), c);
    }
  }

  #[test]
  fn test_negation_de_morgan() {
    let a = Equation::Exists(true, up().attr("OBJ"));
    let b = Equation::Equals(true, up().attr("NUM"), sym("SG"));
    let or = Equation::Or(Box::new(a.clone()), Box::new(b.clone()));

    assert_eq!(
      or.negate(),
      Equation::And(Box::new(a.negate()), Box::new(b.negate()))
    );
  }

  // grounding leaves no relative identifier behind
  fn all_absolute(eq: &Equation<FsId>) -> bool {
    fn expr_ok(e: &Expr<FsId>) -> bool {
      match e {
        Expr::Id(_) | Expr::Lit(_) => true,
        Expr::Attr(base, _) => expr_ok(base),
      }
    }
    match eq {
      Equation::Or(a, b) | Equation::And(a, b) => all_absolute(a) && all_absolute(b),
      Equation::Assign(l, r) | Equation::Equals(_, l, r) => expr_ok(l) && expr_ok(r),
      Equation::Contain(e, c) | Equation::Contains(_, e, c) => expr_ok(e) && expr_ok(c),
      Equation::Exists(_, e) => expr_ok(e),
    }
  }

  #[test]
  fn test_grounding_total() {
    let schema = Equation::Or(
      Box::new(Equation::And(
        Box::new(Equation::Assign(up().attr("SUBJ"), down())),
        Box::new(Equation::Contain(down(), up().attr("ADJUNCTS").attr("X"))),
      )),
      Box::new(Equation::Exists(false, down().attr("OBJ"))),
    );

    for (u, d) in [(0, 1), (7, 7), (3, 0)] {
      let grounded = schema.ground(FsId(u), FsId(d));
      assert!(all_absolute(&grounded));
    }
  }

  #[test]
  fn test_ground_substitutes_both_ends() {
    let schema = Equation::Assign(up().attr("SUBJ"), down());
    let grounded = schema.ground(FsId(4), FsId(9));
    assert_eq!(
      grounded,
      Equation::Assign(Expr::Id(FsId(4)).attr("SUBJ"), Expr::Id(FsId(9)))
    );
  }
}
