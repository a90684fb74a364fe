use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use rss_digest::config::Config;
use rss_digest::delivery::ResendSender;
use rss_digest::pipeline::Pipeline;

/// Get the default config file path (~/.config/rss-digest/config.toml)
fn default_config_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("rss-digest")
        .join("config.toml"))
}

#[derive(Parser, Debug)]
#[command(
    name = "rss-digest",
    about = "Fetch RSS feeds and build a daily HTML news digest"
)]
struct Args {
    /// Config file (defaults to ~/.config/rss-digest/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Topic to build the digest for (overrides `topic` in the config)
    #[arg(long)]
    topic: Option<String>,

    /// Only keep items mentioning this keyword
    #[arg(long)]
    keyword: Option<String>,

    /// Write the HTML digest to this file instead of stdout
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Print the selected items as JSON instead of HTML
    #[arg(long, conflicts_with = "send")]
    json: bool,

    /// Deliver the digest through the configured email provider
    #[arg(long, conflicts_with = "output")]
    send: bool,

    /// List configured topics and exit
    #[arg(long)]
    list_topics: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so the digest can be piped from stdout
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => default_config_path()?,
    };
    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    if args.list_topics {
        for (topic, urls) in &config.topics {
            println!("{} ({} feeds)", topic, urls.len());
            for url in urls {
                println!("  {}", url);
            }
        }
        return Ok(());
    }

    if let Some(keyword) = args.keyword {
        config.selection.keyword = Some(keyword);
    }
    let topic = args.topic.unwrap_or_else(|| config.topic.clone());

    let pipeline = Pipeline::new(config).context("Failed to set up pipeline")?;

    if args.send {
        let sender = ResendSender::from_config(pipeline.config())
            .context("Email delivery is not configured")?;
        let report = pipeline
            .run(&topic, &sender)
            .await
            .with_context(|| format!("Digest run for topic '{}' failed", topic))?;
        tracing::info!(
            broadcast_id = %report.delivery_id,
            items = report.items,
            subject = %report.subject,
            "Digest delivered"
        );
        return Ok(());
    }

    let digest = pipeline
        .build_digest(&topic)
        .await
        .with_context(|| format!("Digest run for topic '{}' failed", topic))?;

    let rendered = if args.json {
        serde_json::to_string_pretty(&digest.items).context("Failed to serialize items")?
    } else {
        digest.html
    };

    match &args.output {
        Some(path) => {
            tokio::fs::write(path, rendered)
                .await
                .with_context(|| format!("Failed to write digest to {}", path.display()))?;
            tracing::info!(path = %path.display(), subject = %digest.subject, "Digest written");
        }
        None => println!("{}", rendered),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_conflicts_with_output() {
        let result = Args::try_parse_from(["rss-digest", "--send", "--output", "digest.html"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_send_conflicts_with_json() {
        let result = Args::try_parse_from(["rss-digest", "--send", "--json"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_output_with_json() {
        let args = Args::try_parse_from(["rss-digest", "--json", "--output", "items.json"])
            .unwrap();
        assert!(args.json && !args.send);
        assert_eq!(args.output, Some(PathBuf::from("items.json")));
    }
}
