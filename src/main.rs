use anyhow::{Context, Result};
use axum::Router;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use saber_plugins::config;
use saber_plugins::eject::{eject, EjectOptions};
use saber_plugins::markdown::{HeadingsOptions, Markdown, MarkdownEnv, MarkdownHeadings};
use saber_plugins::search::SearchClient;
use saber_plugins::plugin::PluginManager;
use saber_plugins::site::{ManifestSite, ManifestWatcher, Site};

/// How often the dev server checks the pages manifest / 开发模式检查页面清单的间隔
const MANIFEST_POLL: Duration = Duration::from_secs(1);

const LONG_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (built ", env!("BUILD_TIME"), ")");

#[derive(Parser)]
#[command(name = "saber", version, long_version = LONG_VERSION, about = "Saber site plugins")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Copy the currently used theme's source code to a local folder
    Eject(EjectArgs),
    /// Build the search index and publish it
    Index(IndexArgs),
    /// Serve the search index for development
    Dev(DevArgs),
    /// Print the headings of a markdown file as JSON
    Headings(HeadingsArgs),
    /// Query a published search index
    Search(SearchArgs),
}

#[derive(Args)]
struct EjectArgs {
    #[arg(default_value = ".")]
    app: PathBuf,
    /// Pull code from Git instead of node_modules
    #[arg(long)]
    git: bool,
    /// Copy over the theme's dependencies to the project's package.json
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    merge_dependencies: bool,
    /// Ejected theme destination
    #[arg(long, default_value = "./theme")]
    path: String,
}

#[derive(Args, Clone)]
struct SiteArgs {
    #[arg(default_value = ".")]
    app: PathBuf,
    /// Pages manifest produced by the site build, relative to the app
    #[arg(long, env = "SABER_PAGES", default_value = ".saber/pages.json")]
    pages: PathBuf,
}

#[derive(Args)]
struct IndexArgs {
    #[command(flatten)]
    site: SiteArgs,
}

#[derive(Args)]
struct DevArgs {
    #[command(flatten)]
    site: SiteArgs,
    #[arg(long, env = "SABER_HOST", default_value = "127.0.0.1")]
    host: String,
    #[arg(long, env = "SABER_PORT", default_value_t = 3000)]
    port: u16,
}

#[derive(Args)]
struct HeadingsArgs {
    file: PathBuf,
    #[arg(long, default_value = ".")]
    app: PathBuf,
}

#[derive(Args)]
struct SearchArgs {
    query: String,
    #[arg(long, default_value = ".")]
    app: PathBuf,
    /// Absolute URL the site is served under
    #[arg(long, env = "SABER_PUBLIC_URL", default_value = "http://127.0.0.1:3000/")]
    url: String,
    /// Locale path to search in
    #[arg(long, default_value = "/")]
    locale: String,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "saber=info,saber_plugins=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Eject(args) => run_eject(args).await,
        Command::Index(args) => run_index(args).await,
        Command::Dev(args) => run_dev(args).await,
        Command::Headings(args) => run_headings(args),
        Command::Search(args) => run_search(args).await,
    };

    if let Err(e) = result {
        tracing::error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run_eject(args: EjectArgs) -> Result<()> {
    let options = EjectOptions {
        cwd: std::env::current_dir()?.join(&args.app),
        git: args.git,
        merge_dependencies: args.merge_dependencies,
        install: true,
        path: args.path,
    };
    // 复制与安装都是阻塞操作
    tokio::task::spawn_blocking(move || eject(&options)).await??;
    Ok(())
}

/// Load config and pages into a site snapshot / 加载站点
fn load_site(args: &SiteArgs, dev: bool) -> Result<Site> {
    let root = args.app.clone();
    let config = config::load_config(&root)?;
    let manifest = ManifestSite::load(&root.join(&args.pages))?;
    Ok(Site {
        config,
        pages: manifest.pages().to_vec(),
        renderer: Arc::new(manifest),
        dev,
        root,
    })
}

async fn run_index(args: IndexArgs) -> Result<()> {
    let site = load_site(&args.site, false)?;
    let plugins = saber_plugins::register_plugins(&site.config);
    if plugins.plugin_names().is_empty() {
        tracing::warn!("No plugins enabled, nothing to do");
        return Ok(());
    }

    plugins.on_create_pages(&site).await?;
    plugins.after_generate(&site).await?;

    for (name, value) in plugins.chain_bundle().iter() {
        tracing::debug!("Bundle constant {} = {}", name, value);
    }
    tracing::info!("Generated search index for {} pages", site.pages.len());
    Ok(())
}

async fn run_dev(args: DevArgs) -> Result<()> {
    let site = load_site(&args.site, true)?;
    let plugins = saber_plugins::register_plugins(&site.config);
    plugins.on_create_pages(&site).await?;
    tokio::spawn(watch_pages(args.site.clone(), plugins.clone()));

    let app = plugins
        .create_server(&site, Router::new())
        .layer(TraceLayer::new_for_http());

    let bind_addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;

    tracing::info!("Dev server running at http://{}", bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}

/// Re-run page hooks whenever the pages manifest is rewritten / 页面清单变化时重新执行插件钩子
async fn watch_pages(args: SiteArgs, plugins: PluginManager) {
    let mut watcher = ManifestWatcher::new(args.app.join(&args.pages));
    let mut ticker = tokio::time::interval(MANIFEST_POLL);

    loop {
        ticker.tick().await;
        if !watcher.poll() {
            continue;
        }

        let result = match load_site(&args, true) {
            Ok(site) => plugins.on_create_pages(&site).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => tracing::info!("Pages changed, rebuilt from {:?}", watcher.path()),
            Err(e) => tracing::warn!("Failed to rebuild after pages change: {:#}", e),
        }
    }
}

fn run_headings(args: HeadingsArgs) -> Result<()> {
    let config = config::load_config(&args.app)?;
    let src = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {:?}", args.file))?;

    let mut md = Markdown::new();
    md.push_rule(Box::new(MarkdownHeadings::new(HeadingsOptions {
        inject_markdown_headings: config.markdown.inject_markdown_headings,
        ..Default::default()
    })));

    // 命令行调用时总是提取
    let mut env = MarkdownEnv {
        inject_markdown_headings: Some(true),
        ..Default::default()
    };
    md.parse(&src, &mut env);
    println!("{}", serde_json::to_string_pretty(&env.markdown_headings.unwrap_or_default())?);
    Ok(())
}

async fn run_search(args: SearchArgs) -> Result<()> {
    let config = config::load_config(&args.app)?;
    let options = config.plugins.search.unwrap_or_default().client_options();
    let public_url = join_public_url(&args.url, &config.build.public_url);

    let client = SearchClient::new(&options, &public_url, &args.locale, None)?;
    let results = client.search(&args.query).await?;
    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}

/// "http://host/" + "/docs/" -> "http://host/docs/"
fn join_public_url(base: &str, public_url: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), public_url.trim_start_matches('/'))
}
