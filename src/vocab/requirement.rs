use crate::prelude::*;

// A requirement string can carry a direct reference instead of version
// constraints:
//
//    name @ https://example.com/name-1.0.tar.gz
//
// PEP 508 includes an entire copy of (some version of) the standard URL syntax
// for this. We don't want that, both because it's wildly more complicated than
// required, and because there are >3 different standards purporting to define
// URL syntax and we don't want to take sides. The 'packaging' module just does
//
//    URI = Regex(r"[^ ]+")("url")
//
// ...so we do the same, and leave the real validation to whoever consumes the
// URL.
//
// On top of proper PEP 508, people also write a bare path or URL where the name
// should go ("./some/dir", "git+https://..."). Those come out as
// ParsedRequirement::Location and it's up to the caller to figure out what they
// point at.

pub mod marker {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Value {
        Variable(String),
        Literal(String),
    }

    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub enum Op {
        Compare(CompareOp),
        In,
        NotIn,
    }

    #[derive(Debug, Clone, PartialEq, Eq, SerializeDisplay)]
    pub enum Expr {
        And(Box<Expr>, Box<Expr>),
        Or(Box<Expr>, Box<Expr>),
        Operator { op: Op, lhs: Value, rhs: Value },
    }

    /// One `variable op "value"` comparison, with the variable always on the
    /// left.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Atom {
        pub variable: String,
        pub op: Op,
        pub value: String,
    }

    /// Disjunctive normal form: OR of ANDs of atoms.
    pub type Dnf = Vec<Vec<Atom>>;

    pub trait Env {
        fn get_marker_var(&self, var: &str) -> Option<&str>;
    }

    impl Env for HashMap<String, String> {
        fn get_marker_var(&self, var: &str) -> Option<&str> {
            self.get(var).map(|s| s.as_str())
        }
    }

    impl Value {
        pub fn eval<'a>(&'a self, env: &'a dyn Env) -> Result<&'a str> {
            match self {
                Value::Variable(varname) => env
                    .get_marker_var(varname)
                    .ok_or_else(|| eyre!("no environment marker named '{}'", varname)),
                Value::Literal(s) => Ok(s),
            }
        }
    }

    impl Display for Value {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Value::Variable(var) => write!(f, "{}", var),
                Value::Literal(literal) => {
                    if literal.contains('"') {
                        write!(f, "'{}'", literal)
                    } else {
                        write!(f, "\"{}\"", literal)
                    }
                }
            }
        }
    }

    impl Display for Op {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Op::Compare(compare_op) => write!(f, "{}", compare_op),
                Op::In => write!(f, "in"),
                Op::NotIn => write!(f, "not in"),
            }
        }
    }

    impl Expr {
        pub fn eval(&self, env: &dyn Env) -> Result<bool> {
            Ok(match self {
                Expr::And(lhs, rhs) => lhs.eval(env)? && rhs.eval(env)?,
                Expr::Or(lhs, rhs) => lhs.eval(env)? || rhs.eval(env)?,
                Expr::Operator { op, lhs, rhs } => {
                    let lhs_val = lhs.eval(env)?;
                    let rhs_val = rhs.eval(env)?;
                    match op {
                        Op::In => rhs_val.contains(lhs_val),
                        Op::NotIn => !rhs_val.contains(lhs_val),
                        Op::Compare(op) => {
                            // If both sides can be parsed as versions (or the RHS can
                            // be parsed as a wildcard with a wildcard-accepting op),
                            // then we do a version comparison
                            if let Ok(lhs_ver) = lhs_val.parse::<Version>() {
                                if let Ok(rhs_ranges) = op.to_ranges(rhs_val) {
                                    return Ok(rhs_ranges
                                        .into_iter()
                                        .any(|r| r.contains(&lhs_ver)));
                                }
                            }
                            // Otherwise, we do a simple string comparison
                            use CompareOp::*;
                            match op {
                                LessThanEqual => lhs_val <= rhs_val,
                                StrictlyLessThan => lhs_val < rhs_val,
                                NotEqual => lhs_val != rhs_val,
                                Equal => lhs_val == rhs_val,
                                GreaterThanEqual => lhs_val >= rhs_val,
                                StrictlyGreaterThan => lhs_val > rhs_val,
                                Compatible => {
                                    bail!("~= requires valid version strings")
                                }
                            }
                        }
                    }
                }
            })
        }

        /// Lower the tree into disjunctive normal form.
        ///
        /// Comparisons written backwards (`"3.8" <= python_version`) are flipped
        /// around so the variable comes first. Comparisons that can't be put in
        /// that shape (two literals, two variables, or `"x" in variable`) carry no
        /// information about a single variable's value and are left out.
        pub fn to_dnf(&self) -> Dnf {
            match self {
                Expr::Or(lhs, rhs) => {
                    let mut branches = lhs.to_dnf();
                    branches.extend(rhs.to_dnf());
                    branches
                }
                Expr::And(lhs, rhs) => {
                    let rhs_branches = rhs.to_dnf();
                    let mut branches = Vec::new();
                    for l in lhs.to_dnf() {
                        for r in &rhs_branches {
                            let mut both = l.clone();
                            both.extend(r.iter().cloned());
                            branches.push(both);
                        }
                    }
                    branches
                }
                Expr::Operator { op, lhs, rhs } => {
                    let atom = match (lhs, rhs) {
                        (Value::Variable(variable), Value::Literal(value)) => Some(Atom {
                            variable: variable.clone(),
                            op: *op,
                            value: value.clone(),
                        }),
                        (Value::Literal(value), Value::Variable(variable)) => match op {
                            Op::Compare(cmp) => Some(Atom {
                                variable: variable.clone(),
                                op: Op::Compare(cmp.flipped()),
                                value: value.clone(),
                            }),
                            Op::In | Op::NotIn => None,
                        },
                        _ => None,
                    };
                    vec![atom.into_iter().collect()]
                }
            }
        }
    }

    impl Display for Expr {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                // XX maybe it would be nice to reduce redundant parentheses here?
                Expr::And(lhs, rhs) => write!(f, "({} and {})", lhs, rhs)?,
                Expr::Or(lhs, rhs) => write!(f, "({} or {})", lhs, rhs)?,
                Expr::Operator { op, lhs, rhs } => write!(f, "{} {} {}", lhs, op, rhs)?,
            }
            Ok(())
        }
    }

    impl TryFrom<&str> for Expr {
        type Error = eyre::Report;

        fn try_from(input: &str) -> Result<Self, Self::Error> {
            super::super::reqparse::marker(input, ParseExtra::Allowed)
                .wrap_err_with(|| format!("failed parsing marker expression {:?}", input))
        }
    }

    try_from_str_boilerplate!(Expr);
}

/// Whether `extra == "..."` is legal in markers. It only means something in
/// a package's own metadata, not in requirements a user types in.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ParseExtra {
    Allowed,
    NotAllowed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub name: PackageName,
    pub extras: Vec<Extra>,
    pub specifiers: Specifiers,
    pub url: Option<String>,
    pub env_marker: Option<marker::Expr>,
}

impl Requirement {
    pub fn parse(input: &str, parse_extra: ParseExtra) -> Result<Requirement> {
        match ParsedRequirement::parse(input, parse_extra)? {
            ParsedRequirement::Named(req) => Ok(req),
            ParsedRequirement::Location { location, .. } => {
                bail!("expected a package name, not {:?}", location)
            }
        }
    }
}

impl Display for Requirement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name.as_given())?;
        if !self.extras.is_empty() {
            write!(f, "[")?;
            let mut first = true;
            for extra in &self.extras {
                if !first {
                    write!(f, ",")?;
                }
                first = false;
                write!(f, "{}", extra.as_given())?;
            }
            write!(f, "]")?;
        }
        if let Some(url) = &self.url {
            write!(f, " @ {}", url)?;
            if let Some(env_marker) = &self.env_marker {
                write!(f, " ; {}", env_marker)?;
            }
            return Ok(());
        }
        if !self.specifiers.is_empty() {
            write!(f, "{}", self.specifiers)?;
        }
        if let Some(env_marker) = &self.env_marker {
            write!(f, "; {}", env_marker)?;
        }
        Ok(())
    }
}

/// What the requirement grammar makes of a line: either a proper named
/// requirement, or a path/URL sitting where the name should be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedRequirement {
    Named(Requirement),
    Location {
        location: String,
        env_marker: Option<marker::Expr>,
    },
}

impl ParsedRequirement {
    pub fn parse(input: &str, parse_extra: ParseExtra) -> Result<ParsedRequirement> {
        super::reqparse::requirement(input, parse_extra)
            .wrap_err_with(|| format!("Failed parsing requirement string {:?}", input))
    }

    /// The text in the name position, as written.
    pub fn head(&self) -> &str {
        match self {
            ParsedRequirement::Named(req) => req.name.as_given(),
            ParsedRequirement::Location { location, .. } => location,
        }
    }

    pub fn env_marker(&self) -> Option<&marker::Expr> {
        match self {
            ParsedRequirement::Named(req) => req.env_marker.as_ref(),
            ParsedRequirement::Location { env_marker, .. } => env_marker.as_ref(),
        }
    }
}
