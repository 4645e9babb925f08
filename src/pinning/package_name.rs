//! Registry package names: parsing, validation and builtin detection.

use crate::constants::MAX_PACKAGE_NAME_LENGTH;

/// Node core modules. Importing them never produces a dependency.
const NODE_BUILTINS: &[&str] = &[
    "assert",
    "async_hooks",
    "buffer",
    "child_process",
    "cluster",
    "console",
    "constants",
    "crypto",
    "dgram",
    "diagnostics_channel",
    "dns",
    "domain",
    "events",
    "fs",
    "http",
    "http2",
    "https",
    "inspector",
    "module",
    "net",
    "os",
    "path",
    "perf_hooks",
    "process",
    "punycode",
    "querystring",
    "readline",
    "repl",
    "stream",
    "string_decoder",
    "sys",
    "timers",
    "tls",
    "trace_events",
    "tty",
    "url",
    "util",
    "v8",
    "vm",
    "wasi",
    "worker_threads",
    "zlib",
];

/// Runtime-provided module prefixes.
const BUILTIN_PREFIXES: &[&str] = &["node:", "bun:"];

/// A package reference split into the package name and the path inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRef {
    /// `lodash` or `@scope/name`
    pub name: String,
    /// `fp/map` for `lodash/fp/map`, if any
    pub subpath: Option<String>,
}

/// Returns `true` for runtime builtins such as `fs`, `fs/promises` or `node:path`.
#[must_use]
pub fn is_builtin(specifier: &str) -> bool {
    if BUILTIN_PREFIXES.iter().any(|prefix| specifier.starts_with(prefix)) {
        return true;
    }
    let head = specifier.split('/').next().unwrap_or(specifier);
    NODE_BUILTINS.contains(&head)
}

/// Splits a specifier into a validated package name and subpath.
///
/// # Errors
///
/// Returns a description of the problem when the name breaks the registry's
/// naming rules.
pub fn parse_package(specifier: &str) -> Result<PackageRef, String> {
    let mut parts = specifier.split('/');
    let first = parts.next().unwrap_or_default();

    let name = if first.starts_with('@') {
        match parts.next() {
            Some(package) if !package.is_empty() => format!("{first}/{package}"),
            _ => return Err("scoped package name must have the form @scope/name".to_string()),
        }
    } else {
        first.to_string()
    };

    let rest: Vec<&str> = parts.collect();
    let subpath = (!rest.is_empty()).then(|| rest.join("/"));

    validate_name(&name)?;
    Ok(PackageRef {
        name,
        subpath,
    })
}

fn validate_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("package name is empty".to_string());
    }
    if name.len() > MAX_PACKAGE_NAME_LENGTH {
        return Err(format!("package name is longer than {MAX_PACKAGE_NAME_LENGTH} characters"));
    }
    if name.trim() != name {
        return Err("package name has leading or trailing whitespace".to_string());
    }
    if name.starts_with('.') || name.starts_with('_') {
        return Err("package name cannot start with '.' or '_'".to_string());
    }
    if matches!(name, "node_modules" | "favicon.ico") {
        return Err(format!("'{name}' is a reserved name"));
    }

    let unscoped = name.strip_prefix('@').unwrap_or(name);
    for part in unscoped.split('/') {
        if part.is_empty() {
            return Err("package name has an empty segment".to_string());
        }
        if part.starts_with('.') {
            return Err("package name segment cannot start with '.'".to_string());
        }
        if let Some(bad) = part
            .chars()
            .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_' | '.')))
        {
            return Err(format!("invalid character '{bad}' in package name"));
        }
    }

    Ok(())
}
