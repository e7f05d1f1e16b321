use tracing::{error, info};

use findable_score::config::load_findable_config;
use findable_score::pipeline::{run_pipeline, PipelineDeps};
use findable_score::types::{Site, SiteId};

fn parse_url_from_args() -> Option<String> {
    let mut args = std::env::args().peekable();
    while let Some(a) = args.next() {
        if a == "--url" {
            return args.next();
        } else if let Some(rest) = a.strip_prefix("--url=") {
            return Some(rest.to_string());
        }
    }
    None
}

fn url_from_env() -> Option<String> {
    std::env::var("FINDABLE_AUDIT_URL").ok()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let start_url = parse_url_from_args()
        .or_else(url_from_env)
        .ok_or_else(|| anyhow::anyhow!("usage: findable-audit --url https://example.com"))?;

    let domain = url::Url::parse(&start_url)?
        .host_str()
        .ok_or_else(|| anyhow::anyhow!("could not determine domain from {start_url}"))?
        .to_string();

    let config = load_findable_config();
    info!(start_url, domain, "starting audit run");

    let site = Site {
        site_id: SiteId::new(),
        domain,
        business_model: None,
        competitors: vec![],
        plan_caps: None,
    };

    let deps = PipelineDeps::standalone();
    match run_pipeline(&deps, &site, &start_url, &config).await {
        Ok(report) => {
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "audit run failed");
            Err(anyhow::anyhow!(e))
        }
    }
}
