use crate::prelude::*;

use super::requirement::marker::{Expr, Op, Value};
use super::requirement::{ParseExtra, ParsedRequirement};

// PEP 508 grammar, more or less. Deviations:
//
// - Names and extras are matched loosely here and validated by PackageName/Extra,
//   so the error messages come from one place.
// - Direct-reference URLs are "anything up to whitespace", same as 'packaging'.
// - A path or URL can stand in for the name, see ParsedRequirement::Location.
// - The legacy dotted marker variables ("os.name", "sys.platform", ...) are
//   accepted and rewritten to their modern spelling.
peg::parser! {
    grammar parser() for str {
        rule wsp()
            = quiet!{[' ' | '\t']}

        rule _()
            = wsp()*

        rule name_chars() -> &'input str
            = $(['A'..='Z' | 'a'..='z' | '0'..='9' | '-' | '_' | '.']+)

        rule name() -> PackageName
            = n:name_chars() {? PackageName::try_from(n).or(Err("package name")) }

        rule extra() -> Extra
            = e:name_chars() {? Extra::try_from(e).or(Err("extra name")) }

        rule extras() -> Vec<Extra>
            = "[" _ es:(extra() ** (_ "," _)) _ "]" { es }

        rule version_cmp() -> CompareOp
            = _ op:$("<=" / "<" / "!=" / "===" / "==" / ">=" / ">" / "~=")
              {? CompareOp::try_from(op).or(Err("comparison operator")) }

        rule version() -> &'input str
            = _ v:$(['A'..='Z' | 'a'..='z' | '0'..='9' | '-' | '_' | '.' | '*' | '+' | '!']+)
              { v }

        rule version_one() -> Specifier
            = op:version_cmp() v:version()
              { Specifier { op, value: v.to_owned() } }

        rule version_many() -> Vec<Specifier>
            = version_one() ++ (_ ",")

        rule versions() -> Specifiers
            = "(" vm:version_many() _ ")" { Specifiers(vm) }
            / vm:version_many() { Specifiers(vm) }

        pub rule versionspec() -> Specifiers
            = _ v:versions() _ { v }

        rule env_var(parse_extra: ParseExtra) -> String
            = v:$("python_version" / "python_full_version" / "os_name" / "sys_platform"
                  / "platform_release" / "platform_system" / "platform_version"
                  / "platform_machine" / "platform_python_implementation"
                  / "implementation_name" / "implementation_version" / "extra"
                  / "os.name" / "sys.platform" / "platform.version"
                  / "platform.machine" / "platform.python_implementation"
                  / "python_implementation")
              {?
                  match v {
                      "extra" if parse_extra == ParseExtra::NotAllowed =>
                          Err("marker variable (no 'extra' allowed here)"),
                      "os.name" => Ok("os_name".to_owned()),
                      "sys.platform" => Ok("sys_platform".to_owned()),
                      "platform.version" => Ok("platform_version".to_owned()),
                      "platform.machine" => Ok("platform_machine".to_owned()),
                      "platform.python_implementation" | "python_implementation" =>
                          Ok("platform_python_implementation".to_owned()),
                      _ => Ok(v.to_owned()),
                  }
              }

        rule python_str() -> String
            = "'" s:$([^ '\'']*) "'" { s.to_owned() }
            / "\"" s:$([^ '"']*) "\"" { s.to_owned() }

        rule marker_var(parse_extra: ParseExtra) -> Value
            = _ v:env_var(parse_extra) { Value::Variable(v) }
            / _ s:python_str() { Value::Literal(s) }

        rule marker_op() -> Op
            = op:version_cmp() { Op::Compare(op) }
            / _ "in" { Op::In }
            / _ "not" wsp()+ "in" { Op::NotIn }

        rule marker_expr(parse_extra: ParseExtra) -> Expr
            = lhs:marker_var(parse_extra) op:marker_op() rhs:marker_var(parse_extra)
              { Expr::Operator { op, lhs, rhs } }
            / _ "(" m:marker(parse_extra) _ ")" { m }

        rule marker_and(parse_extra: ParseExtra) -> Expr
            = lhs:marker_expr(parse_extra) _ "and" rhs:marker_and(parse_extra)
              { Expr::And(Box::new(lhs), Box::new(rhs)) }
            / marker_expr(parse_extra)

        rule marker_or(parse_extra: ParseExtra) -> Expr
            = lhs:marker_and(parse_extra) _ "or" rhs:marker_or(parse_extra)
              { Expr::Or(Box::new(lhs), Box::new(rhs)) }
            / marker_and(parse_extra)

        rule marker(parse_extra: ParseExtra) -> Expr
            = marker_or(parse_extra)

        pub rule marker_only(parse_extra: ParseExtra) -> Expr
            = m:marker(parse_extra) _ { m }

        rule quoted_marker(parse_extra: ParseExtra) -> Expr
            = _ ";" m:marker(parse_extra) { m }

        rule url() -> String
            = u:$([^ ' ' | '\t']+) { u.to_owned() }

        rule location() -> String
            = l:$([^ ' ' | '\t' | ';']+)
              {? if looks_like_location(l) { Ok(l.to_owned()) } else { Err("path or URL") } }

        rule name_req(parse_extra: ParseExtra) -> Requirement
            = name:name() _ extras:extras()? _ "@" _ url:url()
              env_marker:(wsp()+ m:quoted_marker(parse_extra) { m })?
              {
                  Requirement {
                      name,
                      extras: extras.unwrap_or_default(),
                      specifiers: Specifiers::any(),
                      url: Some(url),
                      env_marker,
                  }
              }
            / name:name() _ extras:extras()? _ specifiers:versions()?
              env_marker:quoted_marker(parse_extra)?
              {
                  Requirement {
                      name,
                      extras: extras.unwrap_or_default(),
                      specifiers: specifiers.unwrap_or_default(),
                      url: None,
                      env_marker,
                  }
              }

        pub rule requirement(parse_extra: ParseExtra) -> ParsedRequirement
            = _ location:location() env_marker:quoted_marker(parse_extra)? _
              { ParsedRequirement::Location { location, env_marker } }
            / _ r:name_req(parse_extra) _ { ParsedRequirement::Named(r) }
    }
}

/// Something in the name position that can't be a name: a URL, or a path
/// (relative paths have to start with '.' or contain a separator).
pub fn looks_like_location(s: &str) -> bool {
    // "name@https://..." is a direct reference with the spaces left out
    static NAME_AT: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^[A-Za-z0-9._-]+(\[[^\]]*\])?@").unwrap());

    if super::link::is_url(s) {
        return true;
    }
    !NAME_AT.is_match(s) && (s.starts_with('.') || s.contains('/') || s.contains('\\'))
}

pub fn versionspec(input: &str) -> Result<Specifiers> {
    Ok(parser::versionspec(input)?)
}

pub fn marker(input: &str, parse_extra: ParseExtra) -> Result<Expr> {
    Ok(parser::marker_only(input, parse_extra)?)
}

pub fn requirement(input: &str, parse_extra: ParseExtra) -> Result<ParsedRequirement> {
    Ok(parser::requirement(input, parse_extra)?)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_legacy_marker_names() {
        let m = marker("os.name == 'posix' and python_implementation == 'CPython'", ParseExtra::Allowed)
            .unwrap();
        assert_eq!(
            m.to_string(),
            r#"(os_name == "posix" and platform_python_implementation == "CPython")"#
        );
    }

    #[test]
    fn test_marker_precedence() {
        // 'and' binds tighter than 'or'
        let m = marker(
            "python_version < '3' or python_version >= '3.4' and sys_platform == 'win32'",
            ParseExtra::Allowed,
        )
        .unwrap();
        assert!(matches!(m, Expr::Or(_, _)));

        let m = marker(
            "(python_version < '3' or python_version >= '3.4') and sys_platform == 'win32'",
            ParseExtra::Allowed,
        )
        .unwrap();
        assert!(matches!(m, Expr::And(_, _)));
    }

    #[test]
    fn test_marker_not_in() {
        let m = marker("python_version not in '3.0, 3.1'", ParseExtra::Allowed).unwrap();
        assert_eq!(
            m,
            Expr::Operator {
                op: Op::NotIn,
                lhs: Value::Variable("python_version".into()),
                rhs: Value::Literal("3.0, 3.1".into()),
            }
        );
    }

    #[test]
    fn test_looks_like_location() {
        assert!(looks_like_location("./foo"));
        assert!(looks_like_location("sub/dir"));
        assert!(looks_like_location("https://example.com/x.whl"));
        assert!(looks_like_location("git+ssh://git@example.com/x.git"));
        assert!(!looks_like_location("requests"));
        assert!(!looks_like_location("requests@https://example.com/requests.zip"));
        assert!(!looks_like_location("foo-1.0-py3-none-any.whl"));
    }

    #[test]
    fn test_versionspec_parens_and_whitespace() {
        let specs = versionspec("  ( >=1.0 , <2 ) ").unwrap();
        assert_eq!(specs.to_string(), ">=1.0,<2");
        assert!(versionspec(">=1.0,").is_err());
    }
}
