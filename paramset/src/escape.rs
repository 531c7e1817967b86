//! Placeholder escaping and bare-variable protection.
//!
//! Field text uses `${name}` placeholders. Before substitution each string
//! is normalized: `\${name}` (a literal placeholder the author wants kept)
//! becomes `${{name}}`, and every remaining `${` becomes `{`. The template
//! scanner then treats doubled braces as literal braces and single-braced
//! spans as substitution points.

/// Normalize placeholder syntax in `s`.
///
/// Returns the rewritten string and whether any escaped placeholder was
/// found; escaped fields skip final expression evaluation.
pub fn escape(s: &str) -> (String, bool) {
    let mut out = String::with_capacity(s.len());
    let mut start = 0;
    loop {
        let Some(rel) = s[start..].find(r"\${") else { break };
        let pos0 = start + rel;
        let Some(rel_close) = s[pos0..].find('}') else { break };
        let pos1 = pos0 + rel_close;
        out.push_str(&s[start..pos0].replace("${", "{"));
        out.push_str("${{");
        out.push_str(&s[pos0 + 3..pos1]);
        out.push_str("}}");
        start = pos1 + 1;
    }
    out.push_str(&s[start..].replace("${", "{"));
    (out, start > 0)
}

/// Wrap bare `$name` occurrences as `${name}` for every known field name.
///
/// Longer names are tried first so `$ab` is never misread as `$a` followed
/// by `b`. A `\$` sequence opts the dollar out of protection; the returned
/// flag reports whether any such sequence was present.
pub fn protect<'a, I>(s: &str, keys: I) -> (String, bool)
where
    I: IntoIterator<Item = &'a str>,
{
    // Park escaped dollars on a byte sequence that cannot appear in a
    // field name, then restore them at the end.
    const PARK: &str = "\u{1}\u{1}";
    let mut t = s.replace(r"\$", PARK);
    let escaped = t != s;
    let mut names: Vec<&str> = keys.into_iter().collect();
    names.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    for k in names {
        t = t.replace(&format!("${k}"), &format!("${{{k}}}"));
    }
    if escaped {
        t = t.replace(PARK, r"\$");
    }
    (t, escaped)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
