use clap::Args;
use serde_json::{Map, Value};
use typed_hooks::build_url;

use crate::commands::run_command;

/// Substitute path parameters into an endpoint template
#[derive(Args, Debug, Clone)]
pub struct UrlArgs {
    /// Endpoint template, e.g. `/items/{id}`
    #[arg(value_name = "TEMPLATE")]
    pub template: String,

    /// Path parameter; the value is read as JSON when it parses, as a string otherwise
    #[arg(long = "path", value_name = "NAME=VALUE", value_parser = parse_path_param)]
    pub path: Vec<(String, Value)>,
}

/// Print the URL built from `args`.
pub fn run(args: UrlArgs) -> i32 {
    run_command(|| {
        println!("{}", render(&args));
        Ok(())
    })
}

fn render(args: &UrlArgs) -> String {
    if args.path.is_empty() {
        return build_url(&args.template, None);
    }
    let path: Map<String, Value> = args.path.iter().cloned().collect();
    build_url(&args.template, Some(&path))
}

fn parse_path_param(s: &str) -> Result<(String, Value), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got `{s}`"))?;
    if name.is_empty() {
        return Err(format!("missing parameter name in `{s}`"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((name.to_string(), value))
}
