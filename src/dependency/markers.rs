use crate::error::DependencyParseError;
use crate::prelude::*;
use crate::vocab::marker::{Atom, Dnf, Expr, Op};
use indexmap::IndexMap;

/// A marker's DNF, split up by variable: for each variable, the OR branches
/// that mention it, each reduced to its `(op, value)` comparisons on that
/// variable.
pub type GroupedMarkers = IndexMap<String, Vec<Vec<(Op, String)>>>;

/// What a marker means for the dependency it's attached to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerEffects {
    /// Extras of the depending package that switch this dependency on.
    pub in_extras: Vec<String>,
    pub python_versions: String,
}

impl MarkerEffects {
    pub fn is_optional(&self) -> bool {
        !self.in_extras.is_empty()
    }
}

fn variable_key(atom: &Atom) -> &str {
    match atom.variable.as_str() {
        "python_full_version" => "python_version",
        other => other,
    }
}

pub fn group_markers(dnf: &Dnf) -> GroupedMarkers {
    let mut grouped = GroupedMarkers::new();
    for branch in dnf {
        let mut by_variable: IndexMap<&str, Vec<(Op, String)>> = IndexMap::new();
        for atom in branch {
            by_variable
                .entry(variable_key(atom))
                .or_default()
                .push((atom.op, atom.value.clone()));
        }
        for (variable, conjunction) in by_variable {
            grouped
                .entry(variable.to_owned())
                .or_default()
                .push(conjunction);
        }
    }
    grouped
}

fn component_count(version: &str) -> usize {
    version.split('.').count()
}

fn list_items(value: &str) -> impl Iterator<Item = &str> {
    value
        .split(&[' ', ','][..])
        .filter(|item| !item.is_empty())
}

/// `python_version <= "3"` means "any 3.x", so the bound moves up to the next
/// release at the precision that was written.
fn widen_upper(op: CompareOp, value: &str) -> Result<String> {
    let version = Version::try_from(value)?;
    let bumped = match version.precision() {
        1 => version.next_major()?,
        2 => version.next_minor()?,
        _ => return Ok(format!("{}{}", op, value)),
    };
    Ok(match op {
        CompareOp::LessThanEqual => format!("<{}", bumped),
        _ => format!(">={}", bumped),
    })
}

/// Rewrite one `python_version` comparison as a version constraint. Returns
/// None for an empty `in`/`not in` list.
pub fn translate_python_atom(op: Op, value: &str) -> Result<Option<String>> {
    use CompareOp::*;

    Ok(Some(match op {
        Op::Compare(Equal) => format!("~{}", value),
        Op::Compare(NotEqual) => {
            if value.ends_with(".*") {
                format!("!={}", value)
            } else {
                format!("!={}.*", value)
            }
        }
        Op::Compare(cmp @ (LessThanEqual | StrictlyGreaterThan)) => widen_upper(cmp, value)?,
        Op::Compare(cmp) => format!("{}{}", cmp, value),
        Op::In => {
            let items: Vec<String> = list_items(value)
                .map(|v| match component_count(v) {
                    1 | 2 => format!("{}.*", v),
                    _ => format!("=={}", v),
                })
                .collect();
            if items.is_empty() {
                return Ok(None);
            }
            items.join(" || ")
        }
        Op::NotIn => {
            let items: Vec<String> = list_items(value)
                .map(|v| match component_count(v) {
                    1 | 2 => format!("!={}.*", v),
                    _ => format!("!={}", v),
                })
                .collect();
            if items.is_empty() {
                return Ok(None);
            }
            items.join(", ")
        }
    }))
}

/// Build the interpreter constraint from the branches that mention
/// `python_version`: comparisons in a branch are joined by spaces, branches by
/// ` || `.
pub fn python_versions(branches: &[Vec<(Op, String)>]) -> Result<String> {
    let mut ors = Vec::with_capacity(branches.len());
    for branch in branches {
        let mut ands = Vec::with_capacity(branch.len());
        for (op, value) in branch {
            if let Some(translated) = translate_python_atom(*op, value)
                .wrap_err_with(|| format!("bad python_version marker {} {:?}", op, value))?
            {
                ands.push(translated);
            }
        }
        if !ands.is_empty() {
            ors.push(ands.join(" "));
        }
    }
    if ors.is_empty() {
        return Ok("*".into());
    }
    Ok(ors.join(" || "))
}

/// Work out the optional-extras and interpreter constraint implied by a
/// marker. Every other marker variable is left for whoever evaluates the
/// marker later.
pub fn translate(marker: &Expr) -> Result<MarkerEffects, DependencyParseError> {
    let grouped = group_markers(&marker.to_dnf());
    trace!("grouped markers: {:?}", grouped);

    let in_extras = grouped
        .get("extra")
        .map(|branches| {
            branches
                .iter()
                .flatten()
                .map(|(_, extra)| extra.clone())
                .collect()
        })
        .unwrap_or_default();

    let python_versions = match grouped.get("python_version") {
        Some(branches) => python_versions(branches)
            .map_err(|e| DependencyParseError::malformed(&marker.to_string(), e))?,
        None => "*".into(),
    };

    Ok(MarkerEffects {
        in_extras,
        python_versions,
    })
}
