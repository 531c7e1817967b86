//! Reading and writing parameter files.
//!
//! The format is one `name=value` per line, `#` comments, values typed by
//! shape: `None`, integers, floats, double-quoted text, bracketed lists.
//! Reading never fails on a bad line; problems are collected as
//! [`Diagnostic`]s and the rest of the file still loads.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use crate::error::Diagnostic;
use crate::expr;
use crate::registry::Registry;
use crate::template::NullCtx;
use crate::value::Value;

/// Write `reg` to `path`.
///
/// With `overwrite` off an existing file is an error; with `mkdir` on the
/// parent directory is created as needed.
pub fn write(reg: &Registry, path: &Path, overwrite: bool, mkdir: bool) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if mkdir {
            fs::create_dir_all(parent)?;
        } else if !parent.as_os_str().is_empty() && !parent.exists() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("directory {} does not exist", parent.display()),
            ));
        }
    }
    if !overwrite && path.exists() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} already exists", path.display()),
        ));
    }
    let mut f = fs::File::create(path)?;
    writeln!(f, "# parameter set with {} fields", reg.len())?;
    writeln!(f)?;
    for (k, v) in reg.iter() {
        match v {
            Value::Undefined => writeln!(f, "{k}=None")?,
            Value::Text(s) => writeln!(f, "{k}=\"{s}\"")?,
            other => writeln!(f, "{k}={other}")?,
        }
    }
    Ok(())
}

/// Read a parameter file from disk.
pub fn read(path: &Path) -> io::Result<(Registry, Vec<Diagnostic>)> {
    let text = fs::read_to_string(path)?;
    Ok(read_str(&text))
}

/// Parse parameter-file text.
///
/// Unparseable lines become diagnostics, never hard errors, so a file
/// with one bad line still yields every other definition.
pub fn read_str(text: &str) -> (Registry, Vec<Diagnostic>) {
    let mut reg = Registry::new();
    let mut diags = Vec::new();
    for (lineno, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((lhs, rhs)) = line.split_once('=') else {
            diags.push(Diagnostic::new(
                "",
                format!("line {}: missing '=' in {line:?}", lineno + 1),
            ));
            continue;
        };
        let name = lhs.trim();
        if name.is_empty() {
            diags.push(Diagnostic::new(
                "",
                format!("line {}: empty name in {line:?}", lineno + 1),
            ));
            continue;
        }
        reg.set(name, parse_value(rhs.trim()));
    }
    (reg, diags)
}

/// Best-effort typed parse of a right-hand side.
///
/// Falls back to plain text, which keeps `${...}` expressions intact as
/// dynamic definitions for a later resolve.
fn parse_value(rhs: &str) -> Value {
    if rhs.is_empty() || rhs == "None" {
        return Value::Undefined;
    }
    if let Ok(n) = rhs.parse::<i64>() {
        return Value::Int(n);
    }
    if let Ok(x) = rhs.parse::<f64>() {
        return Value::Float(x);
    }
    if rhs.len() >= 2 && rhs.starts_with('"') && rhs.ends_with('"') {
        return Value::Text(rhs[1..rhs.len() - 1].to_owned());
    }
    if rhs.starts_with('[') {
        if let Ok(v) = expr::eval_str(rhs, &NullCtx) {
            return v;
        }
    }
    Value::Text(rhs.to_owned())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_typed_lines() {
        let (reg, diags) = read_str(
            "# header\n\
             \n\
             a=1\n\
             b=2.5\n\
             c=\"hello\"\n\
             d=None\n\
             e=[1, 2, 3]\n\
             f=${a} + 1\n",
        );
        assert!(diags.is_empty());
        assert_eq!(reg.get("a").unwrap(), &Value::Int(1));
        assert_eq!(reg.get("b").unwrap(), &Value::Float(2.5));
        assert_eq!(reg.get("c").unwrap(), &Value::Text("hello".into()));
        assert_eq!(reg.get("d").unwrap(), &Value::Undefined);
        assert_eq!(
            reg.get("e").unwrap(),
            &Value::Seq(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
        );
        // Expressions stay text for a later resolve.
        assert_eq!(reg.get("f").unwrap(), &Value::Text("${a} + 1".into()));
    }

    #[test]
    fn bad_lines_become_diagnostics() {
        let (reg, diags) = read_str("a=1\nnot a definition\nb=2\n");
        assert_eq!(reg.len(), 2);
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("line 2"));
    }

    #[test]
    fn roundtrip_through_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("params.txt");
        let reg = Registry::from_iter([
            ("a", Value::Int(1)),
            ("b", Value::Float(2.5)),
            ("c", Value::Text("${a} + ${b}".into())),
            ("d", Value::Undefined),
        ]);
        write(&reg, &path, true, false).expect("write");
        let (back, diags) = read(&path).expect("read");
        assert!(diags.is_empty());
        assert_eq!(back, reg);
    }

    #[test]
    fn overwrite_guard() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("params.txt");
        let reg = Registry::from_iter([("a", Value::Int(1))]);
        write(&reg, &path, true, false).expect("first write");
        let err = write(&reg, &path, false, false).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
    }

    #[test]
    fn mkdir_creates_parents() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("deep/nested/params.txt");
        let reg = Registry::from_iter([("a", Value::Int(1))]);
        assert!(write(&reg, &path, true, false).is_err());
        write(&reg, &path, true, true).expect("write with mkdir");
        assert!(path.exists());
    }
}
