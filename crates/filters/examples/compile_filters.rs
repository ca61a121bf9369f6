/// Compiles one JSON filter envelope with every backend.
use filters::{object, rest, sql};
use model::filters::parse_filters;
use planner::query::{
    dialect::Postgres,
    renderer::{Render, Renderer},
};

fn main() {
    let source = r#"{
        "where": {
            "age": {"GTE": 18, "LTE": 65},
            "status": {"In": ["active", "pending"]},
            "OneOf": [
                {"name": {"Contains": "admin"}, "verified": {"Is": true}},
                {"role": {"Is": "superadmin"}}
            ]
        },
        "order": {"name": "asc"}
    }"#;

    let filters = match parse_filters(source) {
        Ok(filters) => filters,
        Err(err) => {
            eprintln!("{err}");
            return;
        }
    };

    println!("--- SQL ---");
    match sql::compile_filters(&filters, &sql::column) {
        Ok(compiled) => {
            let dialect = Postgres;
            let mut renderer = Renderer::new(&dialect);
            compiled.where_clause.render(&mut renderer);
            let (sql, params) = renderer.finish();
            println!("{sql}");
            println!("{params:?}");
        }
        Err(err) => eprintln!("{err}"),
    }

    println!("\n--- Object ---");
    match object::compile_filters(&filters).map(|compiled| serde_json::to_string_pretty(&compiled)) {
        Ok(Ok(json)) => println!("{json}"),
        Ok(Err(err)) => eprintln!("{err}"),
        Err(err) => eprintln!("{err}"),
    }

    println!("\n--- REST ---");
    match rest::apply_filters(rest::RestQuery::new(), &filters) {
        Ok(query) => println!("?{}", query.to_query_string()),
        Err(err) => eprintln!("{err}"),
    }
}
