//! The fixed function and constant allow-list for sandboxed expressions.
//!
//! Dispatch follows the same pattern throughout: `call_allowed` returns
//! `None` for names outside the list so the caller can report them, and
//! `Some(result)` for known names.

use rand::Rng;

use crate::array::NdArray;
use crate::error::Error;
use crate::value::Value;

/// Allow-listed named constant, if `name` is one.
pub fn constant(name: &str) -> Option<Value> {
    match name {
        "pi" => Some(Value::Float(std::f64::consts::PI)),
        "e" => Some(Value::Float(std::f64::consts::E)),
        _ => None,
    }
}

/// Dispatch a call to an allow-listed function.
///
/// Returns `None` when the name is not on the list; the caller turns that
/// into [`Error::CallNotAllowed`].
pub fn call_allowed(name: &str, args: Vec<Value>) -> Option<Result<Value, Error>> {
    fn dispatch(name: &str, args: Vec<Value>) -> Option<Result<Value, Error>> {
        let r = match name {
            "sin" => unary(name, &args, f64::sin),
            "cos" => unary(name, &args, f64::cos),
            "tan" => unary(name, &args, f64::tan),
            "asin" => unary(name, &args, f64::asin),
            "acos" => unary(name, &args, f64::acos),
            "atan" => unary(name, &args, f64::atan),
            "atan2" => binary(name, &args, f64::atan2),
            "radians" => unary(name, &args, f64::to_radians),
            "degrees" => unary(name, &args, f64::to_degrees),
            "exp" => unary(name, &args, f64::exp),
            "log" => log(&args),
            "log10" => unary(name, &args, f64::log10),
            "sqrt" => unary(name, &args, f64::sqrt),
            "pow" => binary(name, &args, f64::powf),
            "ceil" => int_unary(name, &args, f64::ceil),
            "floor" => int_unary(name, &args, f64::floor),
            "fabs" => unary(name, &args, f64::abs),
            "fmod" => binary(name, &args, |x, y| x % y),
            "hypot" => binary(name, &args, f64::hypot),
            "modf" => modf(name, &args),
            "gauss" => gauss(name, &args),
            "uniform" => uniform(name, &args),
            "randint" => randint(name, &args),
            "choice" => choice(args),
            _ => return None,
        };
        Some(r)
    }
    dispatch(name, args)
}

// ── Argument helpers ──────────────────────────────────────────────────────────

fn num_arg(name: &str, args: &[Value], i: usize) -> Result<f64, Error> {
    match args.get(i) {
        Some(Value::Int(n)) => Ok(*n as f64),
        Some(Value::Float(x)) => Ok(*x),
        Some(other) => Err(Error::Evaluation(format!(
            "{name}: argument {} must be a number, got {}",
            i + 1,
            other.type_name()
        ))),
        None => Err(Error::Evaluation(format!(
            "{name}: missing argument {}",
            i + 1
        ))),
    }
}

fn arity(name: &str, args: &[Value], n: usize) -> Result<(), Error> {
    if args.len() == n {
        Ok(())
    } else {
        Err(Error::Evaluation(format!(
            "{name}: expected {n} argument(s), got {}",
            args.len()
        )))
    }
}

fn unary(name: &str, args: &[Value], f: fn(f64) -> f64) -> Result<Value, Error> {
    arity(name, args, 1)?;
    Ok(Value::Float(f(num_arg(name, args, 0)?)))
}

fn int_unary(name: &str, args: &[Value], f: fn(f64) -> f64) -> Result<Value, Error> {
    arity(name, args, 1)?;
    Ok(Value::Int(f(num_arg(name, args, 0)?) as i64))
}

fn binary(name: &str, args: &[Value], f: fn(f64, f64) -> f64) -> Result<Value, Error> {
    arity(name, args, 2)?;
    Ok(Value::Float(f(num_arg(name, args, 0)?, num_arg(name, args, 1)?)))
}

// ── Specific functions ────────────────────────────────────────────────────────

/// `log(x)` is the natural log, `log(x, base)` logarithm in `base`.
fn log(args: &[Value]) -> Result<Value, Error> {
    match args.len() {
        1 => Ok(Value::Float(num_arg("log", args, 0)?.ln())),
        2 => {
            let x = num_arg("log", args, 0)?;
            let base = num_arg("log", args, 1)?;
            Ok(Value::Float(x.log(base)))
        }
        n => Err(Error::Evaluation(format!(
            "log: expected 1 or 2 argument(s), got {n}"
        ))),
    }
}

/// Fractional and integral parts, as a two-element sequence.
fn modf(name: &str, args: &[Value]) -> Result<Value, Error> {
    arity(name, args, 1)?;
    let x = num_arg(name, args, 0)?;
    Ok(Value::Seq(vec![
        Value::Float(x.fract()),
        Value::Float(x.trunc()),
    ]))
}

/// Gaussian sample by the Box-Muller transform.
fn gauss(name: &str, args: &[Value]) -> Result<Value, Error> {
    arity(name, args, 2)?;
    let mu = num_arg(name, args, 0)?;
    let sigma = num_arg(name, args, 1)?;
    let mut rng = rand::thread_rng();
    let u1: f64 = rng.gen_range(f64::MIN_POSITIVE..1.0);
    let u2: f64 = rng.gen();
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    Ok(Value::Float(mu + sigma * z))
}

fn uniform(name: &str, args: &[Value]) -> Result<Value, Error> {
    arity(name, args, 2)?;
    let a = num_arg(name, args, 0)?;
    let b = num_arg(name, args, 1)?;
    if a == b {
        return Ok(Value::Float(a));
    }
    let (lo, hi) = if a < b { (a, b) } else { (b, a) };
    Ok(Value::Float(rand::thread_rng().gen_range(lo..hi)))
}

/// Random integer in the inclusive range `[a, b]`.
fn randint(name: &str, args: &[Value]) -> Result<Value, Error> {
    arity(name, args, 2)?;
    let a = int_arg(name, args, 0)?;
    let b = int_arg(name, args, 1)?;
    if a > b {
        return Err(Error::Evaluation(format!(
            "{name}: empty range {a}..={b}"
        )));
    }
    Ok(Value::Int(rand::thread_rng().gen_range(a..=b)))
}

fn int_arg(name: &str, args: &[Value], i: usize) -> Result<i64, Error> {
    match args.get(i) {
        Some(Value::Int(n)) => Ok(*n),
        Some(other) => Err(Error::Evaluation(format!(
            "{name}: argument {} must be an integer, got {}",
            i + 1,
            other.type_name()
        ))),
        None => Err(Error::Evaluation(format!(
            "{name}: missing argument {}",
            i + 1
        ))),
    }
}

/// Uniformly pick one element of a sequence or array.
fn choice(mut args: Vec<Value>) -> Result<Value, Error> {
    if args.len() != 1 {
        return Err(Error::Evaluation(format!(
            "choice: expected 1 argument(s), got {}",
            args.len()
        )));
    }
    match args.remove(0) {
        Value::Seq(items) if !items.is_empty() => {
            let i = rand::thread_rng().gen_range(0..items.len());
            Ok(items[i].clone())
        }
        Value::Array(a) => pick_from_array(&a),
        Value::Seq(_) => Err(Error::Evaluation("choice: empty sequence".into())),
        other => Err(Error::Evaluation(format!(
            "choice: cannot pick from {}",
            other.type_name()
        ))),
    }
}

fn pick_from_array(a: &NdArray) -> Result<Value, Error> {
    let data = a.data();
    if data.is_empty() {
        return Err(Error::Evaluation("choice: empty array".into()));
    }
    let i = rand::thread_rng().gen_range(0..data.len());
    Ok(Value::Float(data[i]))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
