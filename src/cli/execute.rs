//! Run paths against JSON input

use crate::{CompiledQuery, Options, RegexDialect, Value, parse, query};

use super::{CliError, parse_json, tri_to_json};

/// Operation selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Every result, as a JSON array
    Query,
    /// The first result or `null`
    First,
    /// `true`, `false` or `null`
    Exists,
    /// The single boolean result of a predicate path
    Match,
    /// Canonical text of the parsed path; no input needed
    Parse,
}

/// Options for [`execute`]
#[derive(Debug, Clone, Default)]
pub struct ExecuteOptions {
    /// The path text
    pub path: String,
    /// JSON document
    pub input: Option<String>,
    /// JSON object of variables
    pub vars: Option<String>,
    /// Overrides the mode written in the path
    pub strict: Option<bool>,
    pub silent: bool,
    /// Treat `like_regex` patterns as POSIX regular expressions
    pub posix: bool,
}

impl ExecuteOptions {
    fn query_options(&self) -> Options {
        let mut options = Options::new().silent(self.silent).regex(if self.posix {
            RegexDialect::Posix
        } else {
            RegexDialect::Native
        });
        options.strict = self.strict;
        options
    }
}

/// Compiled path with its parsed input and variables
struct Loaded {
    compiled: CompiledQuery,
    root: Value,
    vars: Option<Value>,
}

fn load(options: &ExecuteOptions) -> Result<Loaded, CliError> {
    let compiled = CompiledQuery::compile(&options.path, &options.query_options())?;
    let input = options.input.as_deref().ok_or(CliError::NoInput)?;
    Ok(Loaded {
        compiled,
        root: parse_json(input)?,
        vars: options.vars.as_deref().map(parse_json).transpose()?,
    })
}

/// Execute one command, returning its JSON output
pub fn execute(command: Command, options: &ExecuteOptions) -> Result<serde_json::Value, CliError> {
    // Options are carried by the compiled query
    let defaults = Options::default();
    let output = match command {
        Command::Parse => serde_json::Value::String(parse(&options.path)?.to_string()),
        Command::Query => {
            let Loaded { compiled, root, vars } = load(options)?;
            let values = compiled
                .run(&root, vars.as_ref())
                .map(|result| result.map(serde_json::Value::from))
                .collect::<Result<Vec<_>, _>>()?;
            serde_json::Value::Array(values)
        }
        Command::First => {
            let Loaded { compiled, root, vars } = load(options)?;
            query::query_first(&root, &compiled, vars.as_ref(), &defaults)?
                .map_or(serde_json::Value::Null, serde_json::Value::from)
        }
        Command::Exists => {
            let Loaded { compiled, root, vars } = load(options)?;
            tri_to_json(query::exists(&root, &compiled, vars.as_ref(), &defaults)?)
        }
        Command::Match => {
            let Loaded { compiled, root, vars } = load(options)?;
            tri_to_json(query::path_match(&root, &compiled, vars.as_ref(), &defaults)?)
        }
    };
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options(path: &str, input: &str) -> ExecuteOptions {
        ExecuteOptions {
            path: path.to_string(),
            input: Some(input.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_execute_query() {
        let result = execute(Command::Query, &options("$.a[*] ? (@ > 1)", r#"{"a": [1, 2, 3]}"#));
        assert_eq!(result.unwrap(), json!([2, 3]));
    }

    #[test]
    fn test_execute_requires_input() {
        let mut opts = options("$", "");
        opts.input = None;
        assert!(matches!(execute(Command::Query, &opts), Err(CliError::NoInput)));
        assert_eq!(execute(Command::Parse, &opts).unwrap(), json!("$"));
    }

    #[test]
    fn test_execute_with_vars() {
        let mut opts = options("$.a ? (@ == $x)", r#"{"a": 5}"#);
        opts.vars = Some(r#"{"x": 5}"#.to_string());
        assert_eq!(execute(Command::Exists, &opts).unwrap(), json!(true));
    }
}
