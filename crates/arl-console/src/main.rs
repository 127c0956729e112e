//! ARL operator console

mod render;

use anyhow::{anyhow, bail, Context, Result};
use arl_explorer::{
    load_dashboard, require_resource, resource, resources, send_raw, submit,
    AssetScopeSubmission, DisplayMode, FilterBuilder, GithubTaskSubmission, LoadOutcome,
    LoadRequest, PaginationControls, PolicyTaskSubmission, RawMethod, RawRequest, ResourceView,
    ScanPreset, ScheduleSubmission, ScopeSync, ScopeType, TaskMetaResolver, TaskSubmission,
    TaskTag,
};
use arl_transport::config::{ENV_API_BASE, ENV_TOKEN};
use arl_transport::{ApiConfig, ApiContext, HttpTransport, Transport};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use render::Format;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("arl-console")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Operator console for the ARL recon backend")
        .subcommand_required(true)
        .arg(
            Arg::new("api-base")
                .long("api-base")
                .global(true)
                .env(ENV_API_BASE)
                .help("Backend base URL"),
        )
        .arg(
            Arg::new("token")
                .long("token")
                .global(true)
                .env(ENV_TOKEN)
                .hide_env_values(true)
                .help("API token"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML file with api_base, token and token_header"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::Count)
                .help("Raise log level (-v debug, -vv trace)"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .subcommand(
            Command::new("list")
                .about("Load one page of a resource")
                .arg(Arg::new("resource").required(true).help("Resource name, e.g. domain"))
                .arg(
                    Arg::new("filter")
                        .short('f')
                        .long("filter")
                        .action(ArgAction::Append)
                        .value_parser(parse_filter)
                        .help("Filter as key=value; repeatable"),
                )
                .arg(Arg::new("page").long("page").default_value("1"))
                .arg(Arg::new("size").long("size").default_value("10"))
                .arg(Arg::new("order").long("order").default_value("-_id"))
                .arg(
                    Arg::new("flat")
                        .long("flat")
                        .action(ArgAction::SetTrue)
                        .conflicts_with("grouped")
                        .help("One table for the whole page"),
                )
                .arg(
                    Arg::new("grouped")
                        .long("grouped")
                        .action(ArgAction::SetTrue)
                        .help("One table per parent task"),
                )
                .arg(
                    Arg::new("html")
                        .long("html")
                        .action(ArgAction::SetTrue)
                        .help("Emit escaped HTML instead of text"),
                ),
        )
        .subcommand(Command::new("dashboard").about("Show headline counts and device report"))
        .subcommand(
            Command::new("submit")
                .about("Create a scan task")
                .arg(Arg::new("name").long("name").required(true))
                .arg(Arg::new("target").long("target").required(true))
                .arg(
                    Arg::new("deep")
                        .long("deep")
                        .action(ArgAction::SetTrue)
                        .help("Enable every plugin with large dictionaries"),
                ),
        )
        .subcommand(
            Command::new("policy-run")
                .about("Run a task from a stored policy")
                .arg(Arg::new("name").long("name").required(true))
                .arg(Arg::new("policy-id").long("policy-id").required(true))
                .arg(Arg::new("target").long("target").default_value(""))
                .arg(
                    Arg::new("risk-cruising")
                        .long("risk-cruising")
                        .action(ArgAction::SetTrue)
                        .help("Tag the run as risk cruising"),
                )
                .arg(Arg::new("result-set").long("result-set").default_value("")),
        )
        .subcommand(
            Command::new("sync")
                .about("Link a task's results to an asset scope")
                .arg(Arg::new("task-id").long("task-id").required(true))
                .arg(Arg::new("scope-id").long("scope-id").required(true)),
        )
        .subcommand(
            Command::new("add-scope")
                .about("Create an asset scope")
                .arg(Arg::new("name").long("name").required(true))
                .arg(Arg::new("scope").long("scope").required(true))
                .arg(Arg::new("black-scope").long("black-scope").default_value(""))
                .arg(
                    Arg::new("scope-type")
                        .long("scope-type")
                        .value_parser(["domain", "ip"])
                        .default_value("domain"),
                ),
        )
        .subcommand(
            Command::new("add-schedule")
                .about("Monitor a domain inside a scope on an interval")
                .arg(Arg::new("scope-id").long("scope-id").required(true))
                .arg(Arg::new("domain").long("domain").required(true))
                .arg(
                    Arg::new("interval")
                        .long("interval")
                        .required(true)
                        .value_parser(value_parser!(u64))
                        .help("Seconds between runs"),
                )
                .arg(Arg::new("name").long("name").default_value(""))
                .arg(Arg::new("policy-id").long("policy-id").default_value("")),
        )
        .subcommand(
            Command::new("add-github-task")
                .about("Create a GitHub leak monitoring task")
                .arg(Arg::new("name").long("name").required(true))
                .arg(Arg::new("keyword").long("keyword").required(true)),
        )
        .subcommand(
            Command::new("api")
                .about("Send a direct request and print the raw response")
                .arg(
                    Arg::new("method")
                        .required(true)
                        .value_parser(|raw: &str| raw.parse::<RawMethod>().map_err(|e| e.to_string()))
                        .help("GET or POST"),
                )
                .arg(Arg::new("path").required(true).help("Path under the API base, e.g. task/"))
                .arg(
                    Arg::new("json")
                        .long("json")
                        .default_value("")
                        .help("JSON body for POST; defaults to {}"),
                ),
        )
        .subcommand(
            Command::new("action")
                .about("Run a row action on one record")
                .arg(Arg::new("resource").required(true))
                .arg(Arg::new("label").required(true))
                .arg(Arg::new("id").required(true)),
        )
        .subcommand(Command::new("resources").about("List browsable resources"))
}

fn parse_filter(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))
}

fn init_tracing(verbosity: u8, json: bool) {
    let default = match verbosity {
        0 => "warn,arl::notice=info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbosity > 0);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Flag or environment over file over defaults
fn resolve_config(matches: &ArgMatches) -> Result<ApiConfig> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => ApiConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ApiConfig::default(),
    };
    if let Some(base) = matches.get_one::<String>("api-base") {
        config = config.with_base_url(base.as_str());
    }
    if let Some(token) = matches.get_one::<String>("token") {
        config = config.with_token(token.as_str());
    }
    Ok(config)
}

fn arg<'a>(args: &'a ArgMatches, id: &str) -> &'a str {
    args.get_one::<String>(id).map_or("", String::as_str)
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_count("verbose"), matches.get_flag("log-json"));

    let config = resolve_config(&matches)?;
    tracing::debug!(base_url = %config.base_url, token = config.token.is_some(), "configuration resolved");
    let ctx = ApiContext::new(config);
    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(ctx.clone()));

    match matches.subcommand() {
        Some(("list", args)) => list(ctx, transport, args).await,
        Some(("dashboard", _)) => {
            let dashboard = load_dashboard(transport.as_ref()).await;
            print!("{}", render::dashboard(&dashboard));
            Ok(())
        }
        Some(("submit", args)) => {
            let preset = if args.get_flag("deep") {
                ScanPreset::Deep
            } else {
                ScanPreset::Standard
            };
            let form = TaskSubmission::new(arg(args, "name"), arg(args, "target"), preset);
            print_body(&submit(&ctx, transport.as_ref(), &form).await?)
        }
        Some(("policy-run", args)) => {
            let tag = if args.get_flag("risk-cruising") {
                TaskTag::RiskCruising
            } else {
                TaskTag::Task
            };
            let form = PolicyTaskSubmission::new(
                arg(args, "name"),
                arg(args, "target"),
                arg(args, "policy-id"),
            )
            .with_tag(tag)
            .with_result_set(arg(args, "result-set"));
            print_body(&submit(&ctx, transport.as_ref(), &form).await?)
        }
        Some(("sync", args)) => {
            let form = ScopeSync::new(arg(args, "task-id"), arg(args, "scope-id"));
            print_body(&submit(&ctx, transport.as_ref(), &form).await?)
        }
        Some(("add-scope", args)) => {
            let scope_type = match arg(args, "scope-type") {
                "ip" => ScopeType::Ip,
                _ => ScopeType::Domain,
            };
            let form = AssetScopeSubmission::new(arg(args, "name"), arg(args, "scope"), scope_type)
                .with_black_scope(arg(args, "black-scope"));
            print_body(&submit(&ctx, transport.as_ref(), &form).await?)
        }
        Some(("add-schedule", args)) => {
            let interval = args.get_one::<u64>("interval").copied().unwrap_or_default();
            let form = ScheduleSubmission::new(arg(args, "scope-id"), arg(args, "domain"), interval)
                .with_name(arg(args, "name"))
                .with_policy(arg(args, "policy-id"));
            print_body(&submit(&ctx, transport.as_ref(), &form).await?)
        }
        Some(("add-github-task", args)) => {
            let form = GithubTaskSubmission::new(arg(args, "name"), arg(args, "keyword"));
            print_body(&submit(&ctx, transport.as_ref(), &form).await?)
        }
        Some(("api", args)) => {
            let request = raw_request(args);
            print_body(&send_raw(&ctx, transport.as_ref(), &request).await?)
        }
        Some(("action", args)) => {
            let spec = require_resource(arg(args, "resource"))?;
            let label = arg(args, "label");
            let action = spec
                .action(label)
                .ok_or_else(|| anyhow!("resource '{}' has no action '{label}'", spec.name))?;
            let id = arg(args, "id");
            if let Some(href) = action.href(&ctx.config().base_url, id) {
                println!("{href}");
                return Ok(());
            }
            print_body(&action.execute(transport.as_ref(), id).await?)
        }
        Some(("resources", _)) => {
            print!("{}", render::catalog(resources()));
            Ok(())
        }
        _ => bail!("no subcommand given"),
    }
}

async fn list(ctx: ApiContext, transport: Arc<dyn Transport>, args: &ArgMatches) -> Result<()> {
    let resource_name = arg(args, "resource").to_string();
    if resource(&resource_name).is_none() {
        tracing::warn!(resource = %resource_name, "resource not in catalog; columns will be inferred");
    }

    let filters = FilterBuilder::new();
    for (key, value) in args.get_many::<(String, String)>("filter").into_iter().flatten() {
        filters.add_row(key.as_str(), value.as_str());
    }
    let pagination = PaginationControls::default();
    pagination.set_page(arg(args, "page"));
    pagination.set_size(arg(args, "size"));
    pagination.set_order(arg(args, "order"));

    let mut request = LoadRequest::new(resource_name)
        .with_filters(filters.getter()())
        .with_pagination(pagination.getter()());
    if args.get_flag("flat") {
        request = request.with_mode(DisplayMode::Flat);
    } else if args.get_flag("grouped") {
        request = request.with_mode(DisplayMode::Grouped);
    }

    let resolver = TaskMetaResolver::new(Arc::clone(&transport));
    let view = ResourceView::new(ctx, transport, resolver);
    let format = if args.get_flag("html") {
        Format::Html
    } else {
        Format::Text
    };

    match view.load(request).await? {
        LoadOutcome::Fresh(page) => print!("{}", render::page(&page, format)),
        LoadOutcome::Stale { generation } => {
            tracing::debug!(generation, "load superseded");
        }
    }
    Ok(())
}

fn raw_request(args: &ArgMatches) -> RawRequest {
    match args.get_one::<RawMethod>("method") {
        Some(RawMethod::Post) => RawRequest::post(arg(args, "path"), arg(args, "json")),
        _ => RawRequest::get(arg(args, "path")),
    }
}

fn print_body(body: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(body)?);
    Ok(())
}
