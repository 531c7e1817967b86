//! Field resolution and text rendering.
//!
//! [`resolve`] turns a registry of definitions into a registry of plain
//! values: fields are dependency-sorted, each text value is normalized
//! (protected, escaped, `^` rewritten, trailing comment dropped), its
//! placeholders substituted from the already-resolved fields, and the
//! result evaluated by the sandboxed grammar when it parses. A field that
//! fails never aborts the run: undefined references produce a sentinel (or
//! keep the raw text, per the registry flag) and everything else resolves
//! normally.
//!
//! [`render`] does the same substitution over free-form text, line by
//! line, keeping comments in place.

use crate::error::{Diagnostic, Error};
use crate::escape;
use crate::expr::{self, EvalContext};
use crate::funcs;
use crate::registry::Registry;
use crate::sort::{self, ResolveMode};
use crate::value::Value;

// ── Evaluation context ────────────────────────────────────────────────────────

/// Name resolution against the already-resolved fields, with the fixed
/// function allow-list for calls.
struct Ctx<'a> {
    resolved: &'a Registry,
}

impl EvalContext for Ctx<'_> {
    fn lookup(&self, name: &str) -> Option<Value> {
        self.resolved.get_opt(name).cloned()
    }

    fn call(&self, name: &str, args: Vec<Value>) -> Result<Value, Error> {
        funcs::call_allowed(name, args)
            .unwrap_or_else(|| Err(Error::CallNotAllowed(name.to_owned())))
    }
}

/// Context that resolves nothing, for literal-only evaluation.
pub(crate) struct NullCtx;

impl EvalContext for NullCtx {
    fn lookup(&self, _name: &str) -> Option<Value> {
        None
    }
    fn call(&self, name: &str, _args: Vec<Value>) -> Result<Value, Error> {
        Err(Error::CallNotAllowed(name.to_owned()))
    }
}

// ── Substitution ──────────────────────────────────────────────────────────────

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Replace brace spans in post-[`escape::escape`] text.
///
/// `{{` and `}}` are literal braces. `{name}` takes the field's value (or
/// an allow-listed constant). Any other `{span}` is evaluated as an
/// expression and the result spliced in as text.
pub(crate) fn substitute(s: &str, resolved: &Registry) -> Result<String, Error> {
    let ctx = Ctx { resolved };
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    loop {
        let Some(pos) = rest.find(['{', '}']) else {
            out.push_str(rest);
            return Ok(out);
        };
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if tail.starts_with("{{") {
            out.push('{');
            rest = &tail[2..];
        } else if tail.starts_with("}}") {
            out.push('}');
            rest = &tail[2..];
        } else if tail.starts_with('}') {
            return Err(Error::Evaluation("single '}' in template".into()));
        } else {
            let Some(close) = tail.find('}') else {
                return Err(Error::Evaluation("unbalanced '{' in template".into()));
            };
            let span = &tail[1..close];
            let value = if is_identifier(span) {
                resolved
                    .get_opt(span)
                    .cloned()
                    .or_else(|| funcs::constant(span))
                    .ok_or_else(|| Error::NameUndefined(span.to_owned()))?
            } else {
                expr::eval_str(span, &ctx)?
            };
            out.push_str(&value.to_string());
            rest = &tail[close + 1..];
        }
    }
}

// ── Field evaluation ──────────────────────────────────────────────────────────

fn undef_sentinel(name: &str) -> String {
    format!("< undef parameter \"${{{name}}}\" >")
}

/// The inner text when `s` is exactly one `{span}` and nothing else.
fn whole_span(s: &str) -> Option<&str> {
    let inner = s.strip_prefix('{')?.strip_suffix('}')?;
    if inner.is_empty() || inner.contains(['{', '}']) || s.starts_with("{{") {
        None
    } else {
        Some(inner)
    }
}

/// Normalize a text definition: protect, escape, `^` to `**`, strip the
/// trailing comment. Returns the text and whether an escaped placeholder
/// was seen.
fn normalize(text: &str, reg: &Registry, protection: bool) -> (String, bool) {
    let mut s = text.trim().to_owned();
    let mut escaped = false;
    if protection {
        let keys: Vec<&str> = reg.keys().collect();
        let (t, esc) = escape::protect(&s, keys);
        s = t;
        escaped = esc;
    }
    let (t, esc) = escape::escape(&s);
    s = t.replace('^', "**");
    escaped |= esc;
    // A leading '#' is content (markdown headings); anything after a later
    // '#' is a comment.
    if let Some(pos) = s.find('#') {
        if pos > 0 {
            s = s[..pos].trim().to_owned();
        }
    }
    (s, escaped)
}

/// Evaluate one text definition against the already-resolved fields.
fn eval_text(
    key: &str,
    raw: &str,
    reg: &Registry,
    resolved: &Registry,
    diags: &mut Vec<Diagnostic>,
) -> Value {
    let (s, escaped) = normalize(raw, reg, reg.protect);

    if !reg.evaluate {
        return match substitute(&s, resolved) {
            Ok(t) => Value::Text(t),
            Err(_) => Value::Text(s),
        };
    }

    if let Some(body) = s.strip_prefix('!') {
        return eval_literal(body, resolved);
    }
    if !escaped {
        if let Some(body) = s.strip_prefix('$') {
            return substitute_verbatim(body.trim_start(), resolved);
        }
    }
    if let Some(body) = s.strip_prefix('%') {
        return substitute_verbatim(body.trim_start(), resolved);
    }

    if s.is_empty() {
        return Value::Text(s);
    }

    // Escaped placeholders force partial evaluation: substitute what can
    // be substituted and keep the text.
    if escaped {
        return match substitute(&s, resolved) {
            Ok(t) => Value::Text(t),
            Err(e) => Value::Text(format!("ERROR < {e} >")),
        };
    }

    // A definition that is exactly one placeholder span keeps the value's
    // type instead of round-tripping through text, so arrays and
    // sequences survive `x = ${m[0:2,1]}` intact.
    if let Some(span) = whole_span(&s) {
        let ctx = Ctx { resolved };
        let result = if is_identifier(span) {
            resolved
                .get_opt(span)
                .cloned()
                .or_else(|| funcs::constant(span))
                .ok_or_else(|| Error::NameUndefined(span.to_owned()))
        } else {
            expr::eval_str(span, &ctx)
        };
        return match result {
            Ok(v) => v,
            Err(Error::NameUndefined(name)) => {
                diags.push(Diagnostic::new(
                    key,
                    format!("reference to \"{name}\" is unresolved"),
                ));
                if reg.return_error_sentinel {
                    Value::Text(undef_sentinel(&name))
                } else {
                    Value::Text(raw.to_owned())
                }
            }
            Err(e) => Value::Text(format!("ERROR < {e} >")),
        };
    }

    let substituted = match substitute(&s, resolved) {
        Ok(t) => t,
        Err(Error::NameUndefined(name)) => {
            diags.push(Diagnostic::new(
                key,
                format!("reference to \"{name}\" is unresolved"),
            ));
            return if reg.return_error_sentinel {
                Value::Text(undef_sentinel(&name))
            } else {
                Value::Text(raw.to_owned())
            };
        }
        Err(e) => return Value::Text(format!("ERROR < {e} >")),
    };

    // Text that does not parse under the restricted grammar is prose and
    // stays text; runtime evaluation failures keep the substituted form.
    let ctx = Ctx { resolved };
    match expr::eval_str(&substituted, &ctx) {
        Ok(v) => v,
        Err(_) => Value::Text(substituted.replace('\n', ",")),
    }
}

/// `!` sigil: the body must be a literal (number, string, or list).
/// Text items of a list get their own substitution pass unless they are
/// deferred with a leading `$`.
fn eval_literal(body: &str, resolved: &Registry) -> Value {
    match expr::eval_str(body, &NullCtx) {
        Ok(Value::Seq(items)) => {
            let items = items
                .into_iter()
                .map(|item| match item {
                    Value::Text(t) if !t.trim_start().starts_with('$') => {
                        match substitute(&t, resolved) {
                            Ok(sub) => Value::Text(sub),
                            Err(e) => Value::Text(format!("Error in <{t}>: {e}")),
                        }
                    }
                    other => other,
                })
                .collect();
            Value::Seq(items)
        }
        Ok(v) => v,
        Err(e) => Value::Text(format!("Error: {e}")),
    }
}

/// `$`/`%` sigils: substitute placeholders, never evaluate the result.
fn substitute_verbatim(body: &str, resolved: &Registry) -> Value {
    match substitute(body, resolved) {
        Ok(t) => Value::Text(t),
        Err(Error::NameUndefined(_)) => Value::Text(body.replace('{', "${")),
        Err(e) => Value::Text(format!("ERROR < {e} >")),
    }
}

// ── Entry points ──────────────────────────────────────────────────────────────

/// Resolve every definition to a plain value.
///
/// Fields are first dependency-sorted with the given mode, then evaluated
/// in order against the partial result. Returns the resolved registry and
/// the diagnostics gathered along the way; only strict-mode ordering
/// failures are hard errors.
pub fn resolve(reg: &Registry, mode: ResolveMode) -> Result<(Registry, Vec<Diagnostic>), Error> {
    let (sorted, mut diags) = sort::sort_definitions(reg, mode)?;
    let mut resolved = reg.empty_like();
    for (key, value) in sorted.iter() {
        let v = match value {
            Value::Text(raw) => eval_text(key, raw, reg, &resolved, &mut diags),
            Value::Seq(items) => Value::Seq(
                items
                    .iter()
                    .map(|item| match item {
                        Value::Text(raw) => eval_text(key, raw, reg, &resolved, &mut diags),
                        other => other.clone(),
                    })
                    .collect(),
            ),
            other => other.clone(),
        };
        resolved.set(key, v);
    }
    Ok((resolved, diags))
}

/// Substitute placeholders throughout free-form text.
///
/// Definitions resolve first (lenient ordering); then each line is
/// processed with its trailing comment split off and re-attached
/// untouched. A line whose references cannot all be resolved reverts to
/// placeholder form instead of failing the whole render. A leading `%`
/// becomes `#` so generated text can carry substituted comments.
pub fn render(reg: &Registry, text: &str) -> Result<String, Error> {
    if reg.is_empty() {
        return Ok(text.to_owned());
    }
    let (resolved, _) = resolve(reg, ResolveMode::Lenient)?;
    let mut out_lines = Vec::new();
    for line in text.split('\n') {
        // Comments are split off before any rewriting so they come
        // through verbatim.
        let (mut body, comment) = split_comment(line);
        if reg.protect {
            let keys: Vec<&str> = reg.keys().collect();
            body = escape::protect(&body, keys).0;
        }
        let (body, _) = escape::escape(&body);
        let mut rendered = match substitute(&body, &resolved) {
            Ok(t) => t,
            Err(Error::NameUndefined(_)) => body.replace('{', "${"),
            Err(e) => return Err(e),
        };
        rendered.push_str(&comment);
        if rendered.starts_with('%') {
            rendered.replace_range(..1, "#");
        }
        out_lines.push(rendered);
    }
    Ok(out_lines.join("\n"))
}

/// Split a line at its comment, pulling the split point back across the
/// spaces in front of the `#` so they stay with the comment.
fn split_comment(line: &str) -> (String, String) {
    match line.find('#') {
        None => (line.to_owned(), String::new()),
        Some(mut pos) => {
            let bytes = line.as_bytes();
            while pos > 0 && bytes[pos - 1] == b' ' {
                pos -= 1;
            }
            (line[..pos].to_owned(), line[pos..].to_owned())
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
