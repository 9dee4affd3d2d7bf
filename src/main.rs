//! post-formatter: render a channel post read from stdin.

use std::io::Read;
use std::path::PathBuf;

use clap::Parser;

use post_formatter::config::{ConfigHandle, FormatterConfig};
use post_formatter::format::{Dialect, Span};
use post_formatter::post::PostRenderer;

#[derive(Debug, Parser)]
#[command(name = "post-formatter")]
#[command(version, about = "Render a channel post read from stdin", long_about = None)]
#[command(after_help = "EXAMPLES:
    echo '**hi** :wave:' | post-formatter
    post-formatter -d modern --no-footer < post.md
    post-formatter --spans entities.json < edited.txt")]
struct Cli {
    /// Input dialect: markdown, modern, html or plain (default: DEFAULT_FORMAT)
    #[arg(short, long, value_name = "DIALECT")]
    dialect: Option<Dialect>,

    /// JSON list of transport spans describing the input's formatting
    #[arg(long, value_name = "FILE")]
    spans: Option<PathBuf>,

    /// Leave the footer links off
    #[arg(long)]
    no_footer: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so stdout carries only the rendered post
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = FormatterConfig::from_env()?;
    if cli.no_footer {
        config.footer_links.clear();
    }
    tracing::debug!(
        dialect = %config.default_dialect,
        footer_links = config.footer_links.len(),
        max_len = config.max_message_len,
        "Loaded formatter config"
    );
    let renderer = PostRenderer::new(ConfigHandle::new(config));

    let mut text = String::new();
    std::io::stdin().read_to_string(&mut text)?;

    let post = match &cli.spans {
        Some(path) => {
            let raw = std::fs::read_to_string(path)?;
            let spans: Vec<Span> = serde_json::from_str(&raw)?;
            renderer.render_edit(&text, &spans, cli.dialect)?
        }
        None => renderer.render_offloaded(text, cli.dialect).await?,
    };

    tracing::info!(
        dialect = %post.dialect,
        parse_mode = post.parse_mode.unwrap_or("none"),
        chars = post.text.chars().count(),
        "Rendered post"
    );
    println!("{}", post.text);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_flags() {
        let cli = Cli::try_parse_from([
            "post-formatter",
            "--dialect",
            "Modern",
            "--spans",
            "entities.json",
            "--no-footer",
        ])
        .unwrap();
        assert_eq!(cli.dialect, Some(Dialect::Modern));
        assert_eq!(cli.spans, Some(PathBuf::from("entities.json")));
        assert!(cli.no_footer);
    }

    #[test]
    fn defaults_leave_dialect_to_config() {
        let cli = Cli::try_parse_from(["post-formatter"]).unwrap();
        assert_eq!(cli.dialect, None);
        assert_eq!(cli.spans, None);
        assert!(!cli.no_footer);
    }

    #[test]
    fn short_dialect_flag() {
        let cli = Cli::try_parse_from(["post-formatter", "-d", "plain"]).unwrap();
        assert_eq!(cli.dialect, Some(Dialect::Plain));
    }

    #[test]
    fn rejects_unknown_dialect_and_stray_arguments() {
        assert!(Cli::try_parse_from(["post-formatter", "--dialect", "rtf"]).is_err());
        assert!(Cli::try_parse_from(["post-formatter", "extra"]).is_err());
    }

    #[test]
    fn command_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
