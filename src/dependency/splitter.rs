use crate::prelude::*;

/// Strip an inline comment off a dependency specification.
///
/// Like pip's requirements files, a comment starts at a `#` that is at the
/// very beginning or follows whitespace. A `#` glued onto the text before it
/// starts a comment too, unless that text is a URL or path, so fragments such
/// as `...repo.git#egg=name` stay intact. If the comment itself carries a `;`,
/// whatever follows it is kept as the marker clause:
///
///   foo >= 1.0 # pinned for now; python_version < "3.8"
///     -> foo >= 1.0 ; python_version < "3.8"
pub fn split_spec(spec: &str) -> String {
    let Some(start) = comment_start(spec) else {
        return spec.trim().to_owned();
    };
    let base = spec[..start].trim();
    let comment = &spec[start + 1..];
    match comment.split_once(';') {
        Some((_, marker)) => {
            trace!("keeping marker {:?} from comment", marker);
            format!("{} ;{}", base, marker)
        }
        None => base.to_owned(),
    }
}

fn comment_start(spec: &str) -> Option<usize> {
    spec.match_indices('#').map(|(idx, _)| idx).find(|&idx| {
        let before = &spec[..idx];
        match before.chars().last() {
            None => true,
            Some(c) if c.is_whitespace() => true,
            Some(_) => {
                let token = before.rsplit(char::is_whitespace).next().unwrap_or(before);
                !(token.contains("://") || looks_like_location(token))
            }
        }
    })
}
