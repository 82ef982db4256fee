//! Native package registry
//!
//! Packages implemented in Rust: `io`, `math`, `text`, plus the console
//! builtins reachable as `System.out`, `System.err` and `System.in`.

use std::fmt;
use std::io::Write;

use indexmap::IndexMap;
use once_cell::sync::Lazy;

use super::io::InputSource;
use super::result::{class, ThrownError};
use super::value::{Value, MAX_STRING_LEN};
use crate::frontend::check::{check_arguments, type_list, Ty};

/// Streams available to a native function
pub struct NativeContext<'a> {
    pub out: &'a mut dyn Write,
    pub err: &'a mut dyn Write,
    pub input: &'a mut dyn InputSource,
}

/// Result of a native call
pub type NativeResult = Result<Value, ThrownError>;

/// Native function definition
pub struct NativeFunction {
    /// Function name
    pub name: &'static str,
    /// Types a call; receives the qualified name for messages
    pub signature: fn(&str, &[Ty]) -> Result<Ty, String>,
    /// Rust function pointer
    pub func: fn(&mut NativeContext<'_>, &[Value]) -> NativeResult,
}

impl fmt::Debug for NativeFunction {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// A named group of native functions
pub struct NativePackage {
    pub name: &'static str,
    /// Whether `import` may name this package
    pub importable: bool,
    functions: IndexMap<&'static str, NativeFunction>,
}

impl NativePackage {
    fn new(
        name: &'static str,
        importable: bool,
    ) -> Self {
        Self {
            name,
            importable,
            functions: IndexMap::new(),
        }
    }

    /// Register a native function
    fn register(
        &mut self,
        func: NativeFunction,
    ) -> &mut Self {
        self.functions.insert(func.name, func);
        self
    }

    /// Get a native function
    pub fn get(
        &self,
        name: &str,
    ) -> Option<&NativeFunction> {
        self.functions.get(name)
    }

    /// Function names in registration order
    pub fn function_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.functions.keys().copied()
    }
}

/// Native package registry
pub static NATIVE_PACKAGES: Lazy<IndexMap<&'static str, NativePackage>> = Lazy::new(|| {
    let mut packages = IndexMap::new();
    for package in [
        io_package(),
        math_package(),
        text_package(),
        console_package("System.out"),
        console_package("System.err"),
        stdin_package(),
    ] {
        packages.insert(package.name, package);
    }
    packages
});

/// Look up a native package by name
pub fn package(name: &str) -> Option<&'static NativePackage> {
    NATIVE_PACKAGES.get(name)
}

fn native(
    name: &'static str,
    signature: fn(&str, &[Ty]) -> Result<Ty, String>,
    func: fn(&mut NativeContext<'_>, &[Value]) -> NativeResult,
) -> NativeFunction {
    NativeFunction {
        name,
        signature,
        func,
    }
}

fn io_package() -> NativePackage {
    let mut package = NativePackage::new("io", true);
    package
        .register(native("print", sig_print, out_print))
        .register(native("println", sig_println, out_println))
        .register(native("readLine", sig_read_line, in_read_line));
    package
}

fn console_package(name: &'static str) -> NativePackage {
    let mut package = NativePackage::new(name, false);
    if name == "System.err" {
        package
            .register(native("print", sig_print, err_print))
            .register(native("println", sig_println, err_println));
    } else {
        package
            .register(native("print", sig_print, out_print))
            .register(native("println", sig_println, out_println));
    }
    package
}

fn stdin_package() -> NativePackage {
    let mut package = NativePackage::new("System.in", false);
    package.register(native("readLine", sig_read_line, in_read_line));
    package
}

fn math_package() -> NativePackage {
    let mut package = NativePackage::new("math", true);
    package
        .register(native("abs", sig_numeric_same, math_abs))
        .register(native("max", sig_numeric_pair, math_max))
        .register(native("min", sig_numeric_pair, math_min))
        .register(native("sqrt", sig_to_double, math_sqrt))
        .register(native("pow", sig_pair_to_double, math_pow))
        .register(native("floor", sig_to_double, math_floor))
        .register(native("ceil", sig_to_double, math_ceil));
    package
}

fn text_package() -> NativePackage {
    let mut package = NativePackage::new("text", true);
    package
        .register(native("length", sig_str_to_int, text_length))
        .register(native("upper", sig_str_to_str, text_upper))
        .register(native("lower", sig_str_to_str, text_lower))
        .register(native("trim", sig_str_to_str, text_trim))
        .register(native("repeat", sig_repeat, text_repeat))
        .register(native("parseInt", sig_str_to_int, text_parse_int))
        .register(native("contains", sig_contains, text_contains));
    package
}

// === signatures ===

fn mismatch(
    name: &str,
    required: &str,
    args: &[Ty],
) -> String {
    format!(
        "method {} cannot be applied to given types; required: {}; found: {}",
        name,
        required,
        type_list(args)
    )
}

fn sig_print(
    name: &str,
    args: &[Ty],
) -> Result<Ty, String> {
    match args {
        [arg] if *arg != Ty::Void => Ok(Ty::Void),
        _ => Err(mismatch(name, "any value", args)),
    }
}

fn sig_println(
    name: &str,
    args: &[Ty],
) -> Result<Ty, String> {
    if args.is_empty() {
        Ok(Ty::Void)
    } else {
        sig_print(name, args)
    }
}

fn sig_read_line(
    name: &str,
    args: &[Ty],
) -> Result<Ty, String> {
    check_arguments(name, &[], args).map(|_| Ty::Str)
}

fn sig_numeric_same(
    name: &str,
    args: &[Ty],
) -> Result<Ty, String> {
    match args {
        [arg] if arg.is_numeric() => Ok(*arg),
        _ => Err(mismatch(name, "int or double", args)),
    }
}

fn sig_numeric_pair(
    name: &str,
    args: &[Ty],
) -> Result<Ty, String> {
    match args {
        [Ty::Int, Ty::Int] => Ok(Ty::Int),
        [a, b] if a.is_numeric() && b.is_numeric() => Ok(Ty::Double),
        _ => Err(mismatch(name, "two numbers", args)),
    }
}

fn sig_to_double(
    name: &str,
    args: &[Ty],
) -> Result<Ty, String> {
    check_arguments(name, &[Ty::Double], args).map(|_| Ty::Double)
}

fn sig_pair_to_double(
    name: &str,
    args: &[Ty],
) -> Result<Ty, String> {
    check_arguments(name, &[Ty::Double, Ty::Double], args).map(|_| Ty::Double)
}

fn sig_str_to_int(
    name: &str,
    args: &[Ty],
) -> Result<Ty, String> {
    check_arguments(name, &[Ty::Str], args).map(|_| Ty::Int)
}

fn sig_str_to_str(
    name: &str,
    args: &[Ty],
) -> Result<Ty, String> {
    check_arguments(name, &[Ty::Str], args).map(|_| Ty::Str)
}

fn sig_repeat(
    name: &str,
    args: &[Ty],
) -> Result<Ty, String> {
    check_arguments(name, &[Ty::Str, Ty::Int], args).map(|_| Ty::Str)
}

fn sig_contains(
    name: &str,
    args: &[Ty],
) -> Result<Ty, String> {
    check_arguments(name, &[Ty::Str, Ty::Str], args).map(|_| Ty::Boolean)
}

// === console and io ===

fn emit(
    sink: &mut dyn Write,
    text: &str,
) {
    // Print never throws; a broken sink only loses output
    if let Err(e) = sink.write_all(text.as_bytes()) {
        tracing::warn!("console write failed: {}", e);
    }
}

fn out_print(
    ctx: &mut NativeContext<'_>,
    args: &[Value],
) -> NativeResult {
    if let Some(value) = args.first() {
        emit(ctx.out, &value.to_string());
    }
    Ok(Value::Void)
}

fn out_println(
    ctx: &mut NativeContext<'_>,
    args: &[Value],
) -> NativeResult {
    let text = args.first().map(Value::to_string).unwrap_or_default();
    emit(ctx.out, &format!("{}\n", text));
    Ok(Value::Void)
}

fn err_print(
    ctx: &mut NativeContext<'_>,
    args: &[Value],
) -> NativeResult {
    if let Some(value) = args.first() {
        emit(ctx.err, &value.to_string());
    }
    Ok(Value::Void)
}

fn err_println(
    ctx: &mut NativeContext<'_>,
    args: &[Value],
) -> NativeResult {
    let text = args.first().map(Value::to_string).unwrap_or_default();
    emit(ctx.err, &format!("{}\n", text));
    Ok(Value::Void)
}

fn in_read_line(
    ctx: &mut NativeContext<'_>,
    _args: &[Value],
) -> NativeResult {
    // Output written so far should be visible before blocking on input
    let _ = ctx.out.flush();
    match ctx.input.read_line() {
        Ok(Some(line)) => Ok(Value::string(line)),
        Ok(None) => Ok(Value::Null),
        Err(e) => {
            tracing::warn!("input read failed: {}", e);
            Ok(Value::Null)
        }
    }
}

// === math ===

fn number(
    args: &[Value],
    index: usize,
) -> f64 {
    args.get(index).and_then(Value::as_f64).unwrap_or(f64::NAN)
}

fn math_abs(
    _ctx: &mut NativeContext<'_>,
    args: &[Value],
) -> NativeResult {
    Ok(match args.first() {
        Some(Value::Int(n)) => Value::Int(n.wrapping_abs()),
        _ => Value::Double(number(args, 0).abs()),
    })
}

fn math_max(
    _ctx: &mut NativeContext<'_>,
    args: &[Value],
) -> NativeResult {
    Ok(match args {
        [Value::Int(a), Value::Int(b)] => Value::Int(*a.max(b)),
        _ => Value::Double(number(args, 0).max(number(args, 1))),
    })
}

fn math_min(
    _ctx: &mut NativeContext<'_>,
    args: &[Value],
) -> NativeResult {
    Ok(match args {
        [Value::Int(a), Value::Int(b)] => Value::Int(*a.min(b)),
        _ => Value::Double(number(args, 0).min(number(args, 1))),
    })
}

fn math_sqrt(
    _ctx: &mut NativeContext<'_>,
    args: &[Value],
) -> NativeResult {
    Ok(Value::Double(number(args, 0).sqrt()))
}

fn math_pow(
    _ctx: &mut NativeContext<'_>,
    args: &[Value],
) -> NativeResult {
    Ok(Value::Double(number(args, 0).powf(number(args, 1))))
}

fn math_floor(
    _ctx: &mut NativeContext<'_>,
    args: &[Value],
) -> NativeResult {
    Ok(Value::Double(number(args, 0).floor()))
}

fn math_ceil(
    _ctx: &mut NativeContext<'_>,
    args: &[Value],
) -> NativeResult {
    Ok(Value::Double(number(args, 0).ceil()))
}

// === text ===

fn text_arg<'v>(
    args: &'v [Value],
    index: usize,
) -> Result<&'v str, ThrownError> {
    match args.get(index) {
        Some(Value::Str(text)) => Ok(text),
        _ => Err(ThrownError::new(
            class::NULL_POINTER,
            "cannot invoke a text method on null",
        )),
    }
}

fn text_length(
    _ctx: &mut NativeContext<'_>,
    args: &[Value],
) -> NativeResult {
    let count = text_arg(args, 0)?.chars().count();
    Ok(Value::Int(i64::try_from(count).unwrap_or(i64::MAX)))
}

fn text_upper(
    _ctx: &mut NativeContext<'_>,
    args: &[Value],
) -> NativeResult {
    Ok(Value::string(text_arg(args, 0)?.to_uppercase()))
}

fn text_lower(
    _ctx: &mut NativeContext<'_>,
    args: &[Value],
) -> NativeResult {
    Ok(Value::string(text_arg(args, 0)?.to_lowercase()))
}

fn text_trim(
    _ctx: &mut NativeContext<'_>,
    args: &[Value],
) -> NativeResult {
    Ok(Value::string(text_arg(args, 0)?.trim()))
}

fn text_repeat(
    _ctx: &mut NativeContext<'_>,
    args: &[Value],
) -> NativeResult {
    let text = text_arg(args, 0)?;
    let count = match args.get(1) {
        Some(Value::Int(n)) => *n,
        _ => 0,
    };
    let count = usize::try_from(count).map_err(|_| {
        ThrownError::new(class::RUNTIME, format!("count is negative: {}", count))
    })?;
    match text.len().checked_mul(count) {
        Some(len) if len <= MAX_STRING_LEN => Ok(Value::string(text.repeat(count))),
        _ => Err(ThrownError::new(
            class::RUNTIME,
            format!("requested length too large: {} x {}", text.len(), count),
        )),
    }
}

fn text_parse_int(
    _ctx: &mut NativeContext<'_>,
    args: &[Value],
) -> NativeResult {
    let text = match args.first() {
        Some(Value::Str(text)) => text,
        _ => {
            return Err(ThrownError::new(
                class::NUMBER_FORMAT,
                "Cannot parse null string: null",
            ))
        }
    };
    text.parse::<i64>().map(Value::Int).map_err(|_| {
        ThrownError::new(
            class::NUMBER_FORMAT,
            format!("For input string: \"{}\"", text),
        )
    })
}

fn text_contains(
    _ctx: &mut NativeContext<'_>,
    args: &[Value],
) -> NativeResult {
    let haystack = text_arg(args, 0)?;
    let needle = text_arg(args, 1)?;
    Ok(Value::Bool(haystack.contains(needle)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::io::ReaderInput;

    fn call(
        package_name: &str,
        function: &str,
        args: &[Value],
    ) -> (NativeResult, String) {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let mut input = ReaderInput::new("typed line\n".as_bytes());
        let result = {
            let mut ctx = NativeContext {
                out: &mut out,
                err: &mut err,
                input: &mut input,
            };
            let func = package(package_name).unwrap().get(function).unwrap();
            (func.func)(&mut ctx, args)
        };
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_registry_contents() {
        let names: Vec<_> = package("math").unwrap().function_names().collect();
        assert_eq!(names, vec!["abs", "max", "min", "sqrt", "pow", "floor", "ceil"]);
        assert!(package("io").unwrap().importable);
        assert!(!package("System.out").unwrap().importable);
        assert!(package("nope").is_none());
    }

    #[test]
    fn test_signatures() {
        let max = package("math").unwrap().get("max").unwrap();
        assert_eq!((max.signature)("math.max", &[Ty::Int, Ty::Int]), Ok(Ty::Int));
        assert_eq!((max.signature)("math.max", &[Ty::Int, Ty::Double]), Ok(Ty::Double));
        assert!((max.signature)("math.max", &[Ty::Str, Ty::Int]).is_err());

        let println = package("System.out").unwrap().get("println").unwrap();
        assert_eq!((println.signature)("println", &[]), Ok(Ty::Void));
        assert!((println.signature)("println", &[Ty::Int, Ty::Int]).is_err());
    }

    #[test]
    fn test_console_and_input() {
        let (result, out) = call("System.out", "println", &[Value::Double(2.0)]);
        assert_eq!(result, Ok(Value::Void));
        assert_eq!(out, "2.0\n");

        let (result, _) = call("System.in", "readLine", &[]);
        assert_eq!(result, Ok(Value::string("typed line")));
    }

    #[test]
    fn test_text_errors() {
        let (result, _) = call("text", "parseInt", &[Value::string("12x")]);
        let error = result.unwrap_err();
        assert_eq!(error.class, class::NUMBER_FORMAT);
        assert_eq!(error.message, "For input string: \"12x\"");

        let (result, _) = call("text", "length", &[Value::Null]);
        assert_eq!(result.unwrap_err().class, class::NULL_POINTER);

        let (result, _) = call("text", "repeat", &[Value::string("ab"), Value::Int(3)]);
        assert_eq!(result, Ok(Value::string("ababab")));

        let (result, _) = call("text", "repeat", &[Value::string("ab"), Value::Int(i64::MAX)]);
        let error = result.unwrap_err();
        assert_eq!(error.class, class::RUNTIME);
        assert!(error.message.starts_with("requested length too large"));

        let (result, _) = call("text", "repeat", &[Value::string("ab"), Value::Int(1 << 40)]);
        assert_eq!(result.unwrap_err().class, class::RUNTIME);

        let (result, _) = call("text", "repeat", &[Value::string(""), Value::Int(i64::MAX)]);
        assert_eq!(result, Ok(Value::string("")));
    }
}
