//! `sluice route` command implementation.
//!
//! Builds a single request from the command line, runs it through the
//! selector the configuration describes and prints what was decided.

use anyhow::{Context, Result, bail};
use axum::body::Body;
use axum::http::{Method, Request};
use clap::Args;
use serde_json::json;
use sluice_core::GatewayConfig;
use sluice_router::{HeaderRoutingGroupSelector, RoutingGroupSelector, RulesEngineRoutingGroupSelector};
use std::fs;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct RouteArgs {
    /// Gateway configuration file
    #[arg(long)]
    config: PathBuf,

    /// Request header as `Name: value`; repeatable
    #[arg(long = "header", short = 'H')]
    headers: Vec<String>,

    /// Statement text sent as the request body
    #[arg(long, conflicts_with = "body_file")]
    body: Option<String>,

    /// Read the request body from a file
    #[arg(long)]
    body_file: Option<PathBuf>,

    #[arg(long, default_value = "POST")]
    method: String,

    #[arg(long, default_value = "/v1/statement")]
    path: String,
}

pub async fn run(args: RouteArgs) -> Result<()> {
    let config = GatewayConfig::from_file(&args.config)
        .with_context(|| format!("cannot load {}", args.config.display()))?;
    let body = match (&args.body, &args.body_file) {
        (Some(body), _) => body.clone(),
        (None, Some(path)) => {
            fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?
        }
        (None, None) => String::new(),
    };

    if !config.routing_rules.enabled {
        let mut request = build_request(&args, &body)?;
        let group = HeaderRoutingGroupSelector.find_routing_group(&mut request).await;
        print_json(&json!({ "selector": "header", "routing_group": group }))?;
        return Ok(());
    }

    let selector = RulesEngineRoutingGroupSelector::from_config(&config).await?;

    let explanation = match selector.explain(&mut build_request(&args, &body)?).await {
        Ok(explanation) => Some(explanation),
        Err(e) => {
            tracing::warn!(error = %e, "Rules unavailable; facts not reported");
            None
        }
    };
    let group = selector
        .find_routing_group(&mut build_request(&args, &body)?)
        .await;

    print_json(&json!({
        "selector": "rules",
        "header_fallback": config.routing_rules.header_fallback,
        "facts": explanation.as_ref().map(|e| &e.processed),
        "fired": explanation.as_ref().map(|e| &e.evaluation.fired),
        "result": explanation.as_ref().map(|e| &e.evaluation.result),
        "routing_group": group,
    }))
}

fn build_request(args: &RouteArgs, body: &str) -> Result<Request<Body>> {
    let method = Method::from_bytes(args.method.to_ascii_uppercase().as_bytes())
        .with_context(|| format!("invalid method {}", args.method))?;
    let mut builder = Request::builder().method(method).uri(args.path.as_str());

    for header in &args.headers {
        let (name, value) = parse_header(header)?;
        builder = builder.header(name, value);
    }

    builder
        .body(Body::from(body.to_string()))
        .context("invalid request")
}

fn parse_header(header: &str) -> Result<(&str, &str)> {
    let Some((name, value)) = header.split_once(':') else {
        bail!("header must look like `Name: value`, got `{header}`");
    };
    let name = name.trim();
    if name.is_empty() {
        bail!("header name is empty in `{header}`");
    }
    Ok((name, value.trim()))
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
