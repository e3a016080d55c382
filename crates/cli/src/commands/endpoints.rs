use std::path::PathBuf;

use clap::Args;
use typed_hooks_contract::{BodyShape, ContractIndex, EndpointContract, Schema};

use crate::commands::{read_contract, run_command};

/// List every endpoint and verb declared by a contract
#[derive(Args, Debug, Clone)]
pub struct EndpointsArgs {
    /// Path to an OpenAPI JSON document
    #[arg(value_name = "CONTRACT")]
    pub contract: PathBuf,
}

/// Print one line per declared pair.
pub fn run(args: EndpointsArgs) -> i32 {
    run_command(|| {
        let index = read_contract(&args.contract)?;
        print!("{}", render(&index));
        Ok(())
    })
}

/// One line per declared pair: verb, endpoint, hook kind and derived shapes.
fn render(index: &ContractIndex) -> String {
    index.iter().map(|c| describe(c) + "\n").collect()
}

fn describe(contract: &EndpointContract) -> String {
    let hook = if contract.verb.is_query() { "query" } else { "mutation" };
    let path = match contract.args.path_names() {
        [] => "-".to_string(),
        names => names.join(","),
    };
    let body = match &contract.args.body {
        BodyShape::NoBody => "-".to_string(),
        BodyShape::WithBody { schema } => schema
            .as_ref()
            .map_or_else(|| "unknown".to_string(), Schema::label),
    };
    let verb = contract.verb.to_string();
    format!(
        "{verb:<6} {} [{hook}] path={path} body={body} success={} error={}",
        contract.endpoint,
        contract.responses.success_label(),
        contract.responses.error_label(),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use typed_hooks_contract::Verb;

    #[test]
    fn test_describe() {
        let contract = EndpointContract::new("/items/{id}", Verb::Put)
            .with_path_params(["id"])
            .with_body(Some(Schema::named("NewItem")))
            .with_response(200_u16, Schema::named("Item"))
            .with_response(404_u16, Schema::named("NotFound"));
        assert_eq!(
            describe(&contract),
            "PUT    /items/{id} [mutation] path=id body=NewItem success=Item error=NotFound"
        );
    }

    #[test]
    fn test_render_defaults() {
        let mut index = ContractIndex::new();
        index.insert(EndpointContract::new("/health", Verb::Get));
        assert_eq!(
            render(&index),
            "GET    /health [query] path=- body=- success=never error=unknown\n"
        );
    }
}
