//! Promotional footer appended to every post.

use super::escape::{escape_attr, escape_html};
use super::pipeline::convert;
use super::types::{Dialect, FooterLink};

/// Separator between footer entries.
pub const SEPARATOR: &str = " | ";

/// Render the footer links for `dialect`, in slot order.
///
/// Links without a url are left out; no links gives an empty string.
pub fn compose_footer(links: &[FooterLink], dialect: Dialect) -> String {
    let mut ordered: Vec<&FooterLink> = links.iter().filter(|l| !l.url.trim().is_empty()).collect();
    ordered.sort_by_key(|l| l.slot);

    ordered
        .into_iter()
        .map(|link| render_link(link, dialect))
        .collect::<Vec<_>>()
        .join(SEPARATOR)
}

fn render_link(link: &FooterLink, dialect: Dialect) -> String {
    let label = link.display_label();
    let url = link.url.trim();
    match dialect {
        Dialect::Html => format!(
            "<a href=\"{}\">{}</a>",
            escape_attr(&escape_html(url)),
            escape_html(label)
        ),
        Dialect::Markdown | Dialect::Modern => format!("[{label}]({url})"),
        Dialect::Plain => format!("{label}: {url}"),
    }
}

/// Convert `body` and attach the footer after one blank line.
pub fn compose_post(body: &str, links: &[FooterLink], dialect: Dialect) -> String {
    let body = convert(body, dialect);
    let footer = compose_footer(links, dialect);
    if footer.is_empty() {
        return body;
    }

    let footer = match dialect {
        Dialect::Markdown | Dialect::Modern => convert(&footer, dialect).trim_end().to_string(),
        Dialect::Html | Dialect::Plain => footer,
    };

    if body.is_empty() {
        footer
    } else if body.ends_with("\n\n") {
        // Modern already closes the body with the blank line.
        format!("{body}{footer}")
    } else {
        format!("{body}\n\n{footer}")
    }
}
