use anyhow::{Context, Result, bail};
use axum::Router;
use axum::extract::{Path as AxumPath, Query, State as AxumState};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use clap::{Parser, Subcommand};
use pjax_web::html;
use pjax_web::{
    AssetManager, AxumPjaxAdapter, Pjax, PjaxConfig, PjaxError, RenderContext, RequestHeaders,
    ScrollTo, SiteConfig, requires_pjax,
};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

pub mod logging;

const DEFAULT_CONFIG: &str = "pjax.config.json";
const JQUERY_CDN: &str = "https://code.jquery.com/jquery-3.7.1.min.js";
const DEMO_ITEMS: usize = 47;
const PAGE_SIZE: usize = 10;

#[derive(Debug, Parser)]
#[command(name = "pjax", version, about = "PJAX container widget tooling")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve a demo page with a paginated list inside a PJAX container.
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
        #[arg(long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,
    },
    /// Report whether a request with the given headers targets a container.
    Classify {
        /// Container id, without the leading `#`.
        #[arg(long)]
        id: String,
        /// Request header as `Name: value`; may be repeated.
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,
    },
    /// Publish the client library directory and print its public URL.
    Publish {
        #[arg(long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,
    },
}

pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Serve { port, config } => run_server(&config, port).await,
        Command::Classify { id, headers } => {
            let request = parse_headers(&headers)?;
            if requires_pjax(&request, &id) {
                println!("fragment: request targets #{id}");
            } else {
                println!("full: render the whole page");
            }
            Ok(())
        }
        Command::Publish { config } => {
            let site = SiteConfig::load(&config)?;
            let mut manager =
                AssetManager::new(site.asset_base_path.clone(), site.asset_base_url.clone())
                    .with_force_copy(site.force_copy);
            let url = manager.publish(&site.pjax_source_dir)?;
            println!("{url}");
            Ok(())
        }
    }
}

fn parse_headers(raw: &[String]) -> Result<RequestHeaders> {
    let mut headers = RequestHeaders::new();
    for line in raw {
        let Some((name, value)) = line.split_once(':') else {
            bail!("header must look like `Name: value`, got `{line}`");
        };
        let name = name.trim();
        if name.is_empty() {
            bail!("header name is empty in `{line}`");
        }
        headers.insert(name, value.trim());
    }
    Ok(headers)
}

struct AppState {
    adapter: AxumPjaxAdapter,
}

async fn run_server(config: &Path, port: u16) -> Result<()> {
    let mut site = SiteConfig::load(config)?;
    if !site.core_scripts.contains_key("jquery") {
        tracing::info!(url = JQUERY_CDN, "no jquery core script configured; using CDN");
        site.core_scripts
            .insert("jquery".to_string(), JQUERY_CDN.to_string());
    }

    let asset_root = site.asset_base_path.clone();
    let asset_url = site.asset_base_url.trim_end_matches('/').to_string();
    let state = Arc::new(AppState {
        adapter: AxumPjaxAdapter::new(Arc::new(site)),
    });

    let mut app = Router::new().route("/", get(list_page));
    if asset_url.starts_with('/') && asset_url.len() > 1 {
        let root = Arc::new(asset_root.clone());
        app = app.route(
            &format!("{asset_url}/{{*path}}"),
            get(move |AxumPath(path): AxumPath<String>| {
                let root = Arc::clone(&root);
                async move { serve_asset(&root, &path).await }
            }),
        );
    } else {
        tracing::warn!(url = %asset_url, "asset base URL is not a local path; assets are not served");
    }
    let app = app.with_state(state);

    let host = format!("0.0.0.0:{port}");
    println!("PJAX demo");
    println!("Assets: {}", asset_root.display());
    println!("URL:    http://localhost:{port}");

    let listener = tokio::net::TcpListener::bind(&host)
        .await
        .with_context(|| format!("failed to bind {host}"))?;
    axum::serve(listener, app).await.context("server failed")?;
    Ok(())
}

async fn list_page(
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    AxumState(state): AxumState<Arc<AppState>>,
) -> Response {
    let pages = DEMO_ITEMS.div_ceil(PAGE_SIZE);
    let page = query
        .get("page")
        .and_then(|p| p.parse::<usize>().ok())
        .unwrap_or(1)
        .clamp(1, pages);
    let filter = query.get("q").cloned().unwrap_or_default();
    let title = format!("Items, page {page}");

    state.adapter.render(&headers, Some(&title), |ctx, request| {
        render_list(ctx, request, &title, page, &filter)
    })
}

fn render_list(
    ctx: &mut RenderContext,
    request: &RequestHeaders,
    title: &str,
    page: usize,
    filter: &str,
) -> Result<(), PjaxError> {
    ctx.write("<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>");
    ctx.write(&html::encode(title));
    ctx.write("</title></head><body><h1>Items</h1>");
    ctx.assets.register_css(
        "demo",
        "#items li{padding:2px 0}#items nav a{margin-right:6px}",
        "",
    );

    let config = PjaxConfig {
        scroll_to: ScrollTo::Offset(0),
        ..PjaxConfig::default().with_id("items")
    };
    Pjax::widget(config, request, ctx, |ctx| {
        ctx.write("<form data-pjax method=\"get\" action=\"/\"><input name=\"q\" value=\"");
        ctx.write(&html::encode(filter));
        ctx.write("\"><button>Filter</button></form>");

        let needle = filter.to_lowercase();
        let items: Vec<String> = (1..=DEMO_ITEMS)
            .map(|n| format!("Item {n}"))
            .filter(|item| item.to_lowercase().contains(&needle))
            .collect();
        let pages = items.len().div_ceil(PAGE_SIZE).max(1);
        let page = page.min(pages);

        ctx.write("<ul>");
        for item in items.iter().skip((page - 1) * PAGE_SIZE).take(PAGE_SIZE) {
            ctx.write(&format!("<li>{}</li>", html::encode(item)));
        }
        ctx.write("</ul><nav>");
        for n in 1..=pages {
            if n == page {
                ctx.write(&format!("<strong>{n}</strong>"));
            } else {
                let href = format!("/?page={n}&q={}", urlencoding::encode(filter));
                ctx.write(&format!("<a href=\"{}\">{n}</a>", html::encode(&href)));
            }
        }
        ctx.write("</nav>");
        Ok(())
    })?;

    ctx.write("<footer>Served by pjax-web</footer></body></html>");
    Ok(())
}

fn sanitize_rel_path(path: &str) -> Option<PathBuf> {
    let rel = PathBuf::from(path.trim_start_matches('/'));
    if rel.as_os_str().is_empty() {
        return None;
    }
    for comp in rel.components() {
        if matches!(
            comp,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        ) {
            return None;
        }
    }
    Some(rel)
}

async fn serve_asset(root: &Path, raw_path: &str) -> Response {
    let Some(rel) = sanitize_rel_path(raw_path) else {
        return (StatusCode::BAD_REQUEST, "invalid path").into_response();
    };
    let path = root.join(rel);
    let bytes = match tokio::fs::read(&path).await {
        Ok(v) => v,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return (StatusCode::NOT_FOUND, "not found").into_response();
        }
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "failed to read asset");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("failed to read {}: {e}", path.display()),
            )
                .into_response();
        }
    };

    let mut response = bytes.into_response();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(content_type(&path)),
    );
    response
}

fn content_type(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
    {
        "html" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" => "application/javascript; charset=utf-8",
        "json" => "application/json; charset=utf-8",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_temp_dir(prefix: &str) -> PathBuf {
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("{prefix}-{ts}"));
        fs::create_dir_all(&dir).expect("temp dir should be creatable");
        dir
    }

    fn demo_site(root: &Path) -> SiteConfig {
        let src = root.join("vendor").join("yii2-pjax");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("jquery.pjax.js"), "/* pjax */").unwrap();
        let mut site = SiteConfig::minimal(root);
        site.core_scripts
            .insert("jquery".to_string(), "/js/jquery.js".to_string());
        site
    }

    #[test]
    fn parses_header_arguments() {
        let headers = parse_headers(&[
            "X-PJAX: true".to_string(),
            "X-PJAX-Container:  #items #other".to_string(),
        ])
        .unwrap();
        assert_eq!(headers.get("x-pjax"), Some("true"));
        assert!(requires_pjax(&headers, "items"));
        assert!(!requires_pjax(&headers, "other"));

        assert!(parse_headers(&["no-colon".to_string()]).is_err());
        assert!(parse_headers(&[": value".to_string()]).is_err());
    }

    #[test]
    fn sanitize_rejects_escaping_paths() {
        assert_eq!(
            sanitize_rel_path("/1a2b3c4d/jquery.pjax.js"),
            Some(PathBuf::from("1a2b3c4d/jquery.pjax.js"))
        );
        assert_eq!(sanitize_rel_path("../secret"), None);
        assert_eq!(sanitize_rel_path("a/../../b"), None);
        assert_eq!(sanitize_rel_path(""), None);
    }

    #[test]
    fn pager_links_carry_the_encoded_filter() {
        let root = unique_temp_dir("pjax-cli-filter");
        let mut ctx = RenderContext::new(&demo_site(&root));
        render_list(&mut ctx, &RequestHeaders::new(), "Items, page 1", 1, "item 1&").unwrap();
        let html = ctx.finish();
        assert!(html.contains("value=\"item 1&amp;\""));

        let mut ctx = RenderContext::new(&demo_site(&root));
        render_list(&mut ctx, &RequestHeaders::new(), "Items, page 1", 1, "item 1").unwrap();
        let html = ctx.finish();
        assert!(html.contains("href=\"/?page=2&amp;q=item%201\""));

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn demo_full_page_wraps_list_in_container() {
        let root = unique_temp_dir("pjax-cli-full");
        let mut ctx = RenderContext::new(&demo_site(&root));
        render_list(&mut ctx, &RequestHeaders::new(), "Items, page 2", 2, "").unwrap();
        let html = ctx.finish();

        assert!(html.contains("<div data-pjax-container=\"\""));
        assert!(html.contains("id=\"items\">"));
        assert!(html.contains("<li>Item 11</li>"));
        assert!(!html.contains("<li>Item 10</li>"));
        assert!(html.contains("<strong>2</strong>"));
        assert!(html.contains("href=\"/?page=1&amp;q=\""));
        assert!(html.contains("jQuery(document).pjax('#items a'"));
        assert!(html.contains("<footer>"));

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn demo_fragment_contains_only_the_list() {
        let root = unique_temp_dir("pjax-cli-fragment");
        let mut ctx = RenderContext::new(&demo_site(&root)).with_title("Items, page 1");
        let request = RequestHeaders::from_pairs([
            ("X-PJAX", "true"),
            ("X-PJAX-Container", "#items"),
        ]);

        let err = render_list(&mut ctx, &request, "Items, page 1", 1, "Item 4").unwrap_err();
        let fragment = err.into_fragment().expect("fragment request should halt");
        assert!(fragment.body.starts_with("<title>Items, page 1</title><form"));
        assert!(fragment.body.contains("<li>Item 4</li>"));
        assert!(fragment.body.contains("<li>Item 40</li>"));
        assert!(!fragment.body.contains("<li>Item 5</li>"));
        assert!(!fragment.body.contains("<footer>"));
        assert!(!fragment.body.contains("<h1>"));

        let _ = fs::remove_dir_all(&root);
    }
}
