use std::collections::BTreeMap;
use std::path::PathBuf;

use axum::http::Method;
use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use multiroute::config::load_config;
use multiroute::http::{error_reply, HttpContext};
use multiroute::responders::build_router;

#[derive(Parser)]
#[command(name = "multiroute-cli")]
#[command(about = "Inspect a multiroute configuration offline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a configuration file
    Check { config: PathBuf },
    /// Show every candidate for a path and the dispatch result
    Resolve {
        config: PathBuf,
        path: String,
        /// HTTP method passed to responders
        #[arg(short, long, default_value = "GET")]
        method: String,
    },
    /// Build the path for a route name
    Reverse {
        config: PathBuf,
        name: String,
        args: Vec<String>,
        /// Keyword argument as key=value (repeatable)
        #[arg(short, long = "kwarg")]
        kwargs: Vec<String>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { config } => {
            let config = load_config(&config)?;
            build_router(&config)?;
            print_json(&json!({ "valid": true, "routes": config.routes.len() }))?;
        }
        Commands::Resolve { config, path, method } => {
            let config = load_config(&config)?;
            let router = build_router(&config)?;
            let method: Method = method.parse()?;

            let output = match router.resolve(&path) {
                Ok(matched) => {
                    let candidates: Vec<Value> = matched
                        .candidates()
                        .iter()
                        .map(|c| {
                            json!({
                                "handler": c.handler().name(),
                                "view_name": c.info().view_name(),
                                "match": c.info(),
                            })
                        })
                        .collect();

                    let mut ctx = HttpContext::new(method, path.clone()).with_request_id("cli");
                    let reply = match matched.dispatch(&mut ctx) {
                        Ok(reply) => reply,
                        Err(err) => error_reply(&err, true),
                    };

                    json!({
                        "path": path,
                        "candidates": candidates,
                        "tried": matched.tried(),
                        "status": reply.status.as_u16(),
                        "body": reply.body,
                    })
                }
                Err(not_found) => json!({
                    "path": path,
                    "candidates": [],
                    "tried": not_found.tried,
                    "status": 404,
                }),
            };
            print_json(&output)?;
        }
        Commands::Reverse { config, name, args, kwargs } => {
            let config = load_config(&config)?;
            let router = build_router(&config)?;
            let kwargs = parse_kwargs(&kwargs)?;

            let path = router.reverse(&name, &args, &kwargs)?;
            println!("{}", path);
        }
    }

    Ok(())
}

fn parse_kwargs(pairs: &[String]) -> Result<BTreeMap<String, String>, String> {
    pairs
        .iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .ok_or_else(|| format!("keyword argument {:?} is not key=value", pair))
        })
        .collect()
}

fn print_json(value: &Value) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
