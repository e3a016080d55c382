use std::path::PathBuf;

use clap::Args;
use serde_json::{Map, Value};
use tracing::debug;
use typed_hooks::{ArgValues, CacheKey, Verb, build_key};

use crate::commands::{parse_json, parse_object, read_contract, run_command};

/// Print the cache key of a read
#[derive(Args, Debug, Clone)]
pub struct KeyArgs {
    /// Endpoint template, e.g. `/items/{id}`
    #[arg(value_name = "ENDPOINT")]
    pub endpoint: String,

    /// Query parameters as JSON
    #[arg(long, value_name = "JSON", value_parser = parse_json)]
    pub query: Option<Value>,

    /// Path parameters as a JSON object
    #[arg(long, value_name = "JSON", value_parser = parse_object)]
    pub path: Option<Map<String, Value>>,

    /// Request body as JSON
    #[arg(long, value_name = "JSON", value_parser = parse_json)]
    pub body: Option<Value>,

    /// Check the arguments against this OpenAPI contract first
    #[arg(long, value_name = "CONTRACT", requires = "verb")]
    pub contract: Option<PathBuf>,

    /// Verb to check against, used with --contract
    #[arg(long, value_name = "VERB")]
    pub verb: Option<Verb>,
}

/// Print the key built from `args`, checked against the contract when one is given.
pub fn run(args: KeyArgs) -> i32 {
    run_command(|| {
        let key = key_for(&args)?;
        println!("{key}");
        Ok(())
    })
}

fn key_for(args: &KeyArgs) -> Result<CacheKey, String> {
    let values = ArgValues {
        query: args.query.clone(),
        path: args.path.clone(),
        body: args.body.clone(),
    };

    if let (Some(contract), Some(verb)) = (&args.contract, args.verb) {
        let index = read_contract(contract)?;
        index
            .lookup(&args.endpoint, verb)
            .and_then(|c| c.check_args(values.path.as_ref(), values.body.is_some()))
            .map_err(|e| e.to_string())?;
        debug!(endpoint = %args.endpoint, %verb, "Arguments match the contract.");
    }

    Ok(build_key(&args.endpoint, &values))
}
