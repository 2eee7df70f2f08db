/*!
 * Styled HTML rendering for learning guides.
 *
 * Converts guide Markdown into a self-contained HTML page: the chapter
 * heading becomes the page header, the series info list becomes the header
 * card, and each timestamp section becomes a styled content card with the
 * quoted caption and its node annotations. Also repairs the malformed
 * single-asterisk bold runs (`*text**`) that show up in hand-edited guides.
 */

use once_cell::sync::Lazy;
use regex::Regex;

// Markdown links, converted to anchors that open in a new tab
static MD_LINK_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").unwrap());

// Malformed bold with a trailing colon: *text**:
// The preceding character is captured instead of a lookbehind.
static STRAY_BOLD_COLON_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(^|[^*])\*([^*]+?)\*\*:").unwrap());

// Malformed bold without the colon: *text**
static STRAY_BOLD_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(^|[^*])\*([^*]+?)\*\*([^:]|$)").unwrap());

// Well-formed bold, colon variant first so the colon lands inside the tag
static BOLD_COLON_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*([^*]+?)\*\*:").unwrap());

static BOLD_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*([^*]+?)\*\*").unwrap());

// The basic formatter only handles plain bold pairs
static SIMPLE_BOLD_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.+?)\*\*").unwrap());

// Section headings that are timestamps, MM:SS or HH:MM:SS
static TIMESTAMP_HEADING_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^## (\d{2}:\d{2}(?::\d{2})?)$").unwrap());

static HEADING_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#\s+(.+)$").unwrap());

// Series info list items: "- key: value"
static SERIES_ITEM_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-\s+(.+?):\s+(.+)$").unwrap());

static NUMBERED_ITEM_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.\s+").unwrap());

/// Renders guide Markdown into a styled HTML page
#[derive(Debug, Clone)]
pub struct HtmlRenderer {
    /// The page shell with placeholders
    template: String,
}

impl Default for HtmlRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl HtmlRenderer {
    /// The default page shell. Placeholders: {title}, {series_info},
    /// {content}.
    pub const PAGE: &'static str = r#"<!DOCTYPE html>
<html lang="ja">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>
        :root {
            --bg-primary: #ffffff;
            --bg-secondary: #f8fafc;
            --bg-accent: #f1f5f9;
            --text-primary: #1a202c;
            --text-secondary: #4a5568;
            --border-light: #e2e8f0;
            --border-medium: #cbd5e0;
            --highlight-bg: #ebf8ff;
            --highlight-border: #3182ce;
            --info-bg: #f0fff4;
            --success-bg: #f0fff4;
            --success-border: #38a169;
            --warning-bg: #fffaf0;
        }

        body {
            font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif;
            line-height: 1.6;
            color: var(--text-primary);
            background-color: var(--bg-primary);
            margin: 0;
            padding: 0;
        }

        .container {
            max-width: 1200px;
            margin: 0 auto;
            padding: 2rem;
        }

        .header {
            background: linear-gradient(135deg, var(--highlight-bg), var(--info-bg));
            border-radius: 16px;
            padding: 2rem;
            margin-bottom: 2rem;
            border: 2px solid var(--highlight-border);
        }

        .header h1 {
            color: var(--highlight-border);
            margin: 0 0 1rem 0;
            font-size: 2rem;
        }

        .series-info {
            background: var(--bg-secondary);
            border-radius: 8px;
            padding: 1rem;
            margin-top: 1rem;
        }

        .series-info strong {
            color: var(--text-primary);
        }

        .content-section {
            background: var(--bg-secondary);
            border: 1px solid var(--border-light);
            border-radius: 12px;
            padding: 1.5rem;
            margin: 1.5rem 0;
            box-shadow: 0 2px 8px rgba(0,0,0,0.05);
        }

        .section-header {
            margin-bottom: 1rem;
            display: flex;
            align-items: flex-start;
            gap: 1rem;
        }

        .timestamp {
            display: inline-block;
            background: linear-gradient(135deg, var(--highlight-bg), var(--info-bg));
            color: var(--highlight-border);
            font-weight: 700;
            font-size: 1.1rem;
            padding: 0.4rem 0.8rem;
            border-radius: 8px;
            border: 2px solid var(--highlight-border);
            margin-right: 0.8rem;
            font-family: 'Monaco', 'Consolas', monospace;
            min-width: 60px;
            text-align: center;
        }

        .quote-text {
            font-style: normal;
            color: var(--text-primary);
            font-size: 1.1rem;
            font-weight: 500;
            line-height: 1.7;
            flex: 1;
            background: linear-gradient(90deg, #f8fafc 0%, transparent 100%);
            padding: 0.8rem 1rem;
            border-radius: 8px;
            border-left: 4px solid var(--highlight-border);
        }

        .keyword-explanation {
            background: var(--bg-accent);
            border-left: 3px solid var(--border-medium);
            padding: 0.8rem;
            margin-top: 1rem;
            border-radius: 0 6px 6px 0;
        }

        .keyword-explanation ul {
            margin: 0.5rem 0;
            padding-left: 1.5rem;
        }

        .keyword-explanation li {
            margin: 0.3rem 0;
        }

        .node-debut {
            display: inline-block;
            background: linear-gradient(135deg, var(--success-bg), var(--warning-bg));
            color: var(--success-border);
            font-weight: 700;
            font-size: 0.9rem;
            padding: 0.3rem 0.6rem;
            border-radius: 6px;
            border: 1px solid var(--success-border);
            margin-left: 0.5rem;
        }

        .node-debut.series-debut {
            background: linear-gradient(135deg, var(--success-bg), var(--warning-bg));
        }

        .node-debut.chapter-debut {
            background: linear-gradient(135deg, var(--info-bg), var(--highlight-bg));
            color: var(--highlight-border);
            border-color: var(--highlight-border);
        }

        .icon {
            font-size: 1.2rem;
            margin-right: 0.5rem;
        }
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>{title}</h1>
            <div class="series-info">
                {series_info}
            </div>
        </div>

        {content}
    </div>
</body>
</html>"#;

    /// Renderer using the default page shell
    pub fn new() -> Self {
        HtmlRenderer {
            template: Self::PAGE.to_string(),
        }
    }

    /// Render guide Markdown into a complete HTML page
    pub fn render(&self, markdown: &str) -> String {
        let lines: Vec<&str> = markdown.split('\n').collect();
        let mut idx = 0;
        let mut title = String::new();
        let mut series_info: Vec<(String, String)> = Vec::new();
        let mut content_html: Vec<String> = Vec::new();

        if let Some(first) = lines.first() {
            if let Some(caps) = HEADING_REGEX.captures(first) {
                title = caps[1].to_string();
                idx = 1;
            }
        }

        while idx < lines.len() && lines[idx].trim().is_empty() {
            idx += 1;
        }

        if idx < lines.len() && lines[idx].starts_with("**シリーズ情報**") {
            idx += 1;
            let (info, next) = extract_series_info(&lines, idx);
            series_info = info;
            idx = next;
        }

        while idx < lines.len() {
            let line = lines[idx].trim();

            if line.is_empty() || line == "---" {
                idx += 1;
                continue;
            }

            if TIMESTAMP_HEADING_REGEX.is_match(line) {
                let (section, next) = process_timestamp_section(&lines, idx);
                if !section.is_empty() {
                    content_html.push(section);
                }
                idx = next;
            } else if line.starts_with("## ") {
                let (section, next) = process_general_section(&lines, idx);
                if !section.is_empty() {
                    content_html.push(section);
                }
                idx = next;
            } else if line.starts_with("**") && line.ends_with("**:") {
                let (section, next) = process_bold_section(&lines, idx);
                if !section.is_empty() {
                    content_html.push(section);
                }
                idx = next;
            } else {
                idx += 1;
            }
        }

        self.template
            .replace("{title}", &title)
            .replace("{series_info}", &format_series_info(&series_info))
            .replace("{content}", &content_html.join("\n"))
    }
}

/// Convert Markdown links and repair then convert bold runs
fn process_bold_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let text = MD_LINK_REGEX.replace_all(text, r#"<a href="${2}" target="_blank">${1}</a>"#);
    // Malformed variants first so the well-formed rules cannot half-eat them
    let text = STRAY_BOLD_COLON_REGEX.replace_all(&text, "${1}<strong>${2}:</strong>");
    let text = STRAY_BOLD_REGEX.replace_all(&text, "${1}<strong>${2}</strong>${3}");
    let text = BOLD_COLON_REGEX.replace_all(&text, "<strong>${1}:</strong>");
    let text = BOLD_REGEX.replace_all(&text, "<strong>${1}</strong>");

    text.into_owned()
}

/// Series info list as "- key: value" pairs, in order
fn extract_series_info<'a>(lines: &[&'a str], start: usize) -> (Vec<(String, String)>, usize) {
    let mut info = Vec::new();
    let mut idx = start;

    while idx < lines.len() && lines[idx].trim().is_empty() {
        idx += 1;
    }

    while idx < lines.len() {
        let line = lines[idx].trim();
        if line.starts_with("---") || line.starts_with('#') || line.is_empty() {
            break;
        }
        if let Some(caps) = SERIES_ITEM_REGEX.captures(line) {
            info.push((caps[1].to_string(), caps[2].to_string()));
        }
        idx += 1;
    }

    (info, idx)
}

fn format_series_info(info: &[(String, String)]) -> String {
    let parts: Vec<String> = info
        .iter()
        .map(|(key, value)| {
            let value =
                MD_LINK_REGEX.replace_all(value, r#"<a href="${2}" target="_blank">${1}</a>"#);
            format!("<strong>{}</strong>: {}<br>", key, value)
        })
        .collect();

    parts.join("\n                ")
}

/// A `## HH:MM:SS` section: the quoted caption plus annotation lines
fn process_timestamp_section(lines: &[&str], start: usize) -> (String, usize) {
    let caps = match TIMESTAMP_HEADING_REGEX.captures(lines[start].trim()) {
        Some(caps) => caps,
        None => return (String::new(), start + 1),
    };
    let timestamp = caps[1].to_string();
    let mut idx = start + 1;

    while idx < lines.len() && lines[idx].trim().is_empty() {
        idx += 1;
    }

    let mut quote_text = String::new();
    if idx < lines.len() {
        let line = lines[idx].trim();
        if line.starts_with('「') && line.ends_with('」') {
            quote_text = line.to_string();
            idx += 1;
        }
    }

    while idx < lines.len() && lines[idx].trim().is_empty() {
        idx += 1;
    }

    let mut explanation_lines: Vec<&str> = Vec::new();
    while idx < lines.len() {
        let line = lines[idx].trim();
        if line.starts_with("## ") || line == "---" {
            break;
        }
        explanation_lines.push(lines[idx]);
        idx += 1;
    }

    let explanation_html = if explanation_lines.is_empty() {
        String::new()
    } else {
        format_markdown_content_advanced(&explanation_lines.join("\n"))
    };

    let section = format!(
        "\n        <div class=\"content-section\">\n            \
         <div class=\"section-header\">\n                \
         <span class=\"timestamp\">{}</span>\n                \
         <span class=\"quote-text\">{}</span>\n            \
         </div>\n{}\n        </div>",
        timestamp, quote_text, explanation_html
    );

    (section, idx)
}

/// A `## Title` section that is not a timestamp
fn process_general_section(lines: &[&str], start: usize) -> (String, usize) {
    let title = match lines[start].trim().strip_prefix("## ") {
        Some(title) => title.to_string(),
        None => return (String::new(), start + 1),
    };
    let mut idx = start + 1;

    let mut content_lines: Vec<&str> = Vec::new();
    while idx < lines.len() {
        let line = lines[idx].trim();
        if line.starts_with("## ") || line == "---" {
            break;
        }
        content_lines.push(lines[idx]);
        idx += 1;
    }

    let content_html = format_markdown_content_advanced(&content_lines.join("\n"));
    let section = format!(
        "\n        <div class=\"content-section\">\n            \
         <h2>{}</h2>\n            {}\n        </div>",
        title, content_html
    );

    (section, idx)
}

/// A `**Title**:` section
fn process_bold_section(lines: &[&str], start: usize) -> (String, usize) {
    let trimmed = lines[start].trim();
    let title = match trimmed
        .strip_prefix("**")
        .and_then(|rest| rest.strip_suffix("**:").or_else(|| rest.strip_suffix("**")))
    {
        Some(title) => title.to_string(),
        None => return (String::new(), start + 1),
    };
    let mut idx = start + 1;

    let mut content_lines: Vec<&str> = Vec::new();
    while idx < lines.len() {
        let line = lines[idx].trim();
        if line.starts_with("##") || line.starts_with("**") || line == "---" {
            break;
        }
        if !line.is_empty() || !content_lines.is_empty() {
            content_lines.push(lines[idx]);
        }
        idx += 1;
    }

    let content_html = format_markdown_content(&content_lines.join("\n"));
    let section = format!(
        "\n        <div class=\"content-section\">\n            \
         <h3><strong>{}</strong></h3>\n            {}\n        </div>",
        title, content_html
    );

    (section, idx)
}

/// Basic block formatting: bullet lists and paragraphs with plain bold
fn format_markdown_content(content: &str) -> String {
    if content.trim().is_empty() {
        return String::new();
    }

    let mut html_lines: Vec<String> = Vec::new();
    let mut in_list = false;

    for line in content.split('\n') {
        let line = line.trim();

        if line.is_empty() {
            if in_list {
                html_lines.push("</ul>".to_string());
                in_list = false;
            }
            continue;
        }

        if let Some(item) = line.strip_prefix("- ") {
            if !in_list {
                html_lines.push("<ul>".to_string());
                in_list = true;
            }
            let item = SIMPLE_BOLD_REGEX.replace_all(item.trim(), "<strong>${1}</strong>");
            html_lines.push(format!("<li>{}</li>", item));
        } else {
            if in_list {
                html_lines.push("</ul>".to_string());
                in_list = false;
            }
            let line = SIMPLE_BOLD_REGEX.replace_all(line, "<strong>${1}</strong>");
            html_lines.push(format!("<p>{}</p>", line));
        }
    }

    if in_list {
        html_lines.push("</ul>".to_string());
    }

    html_lines.join("\n")
}

/// Full block formatting: subsection headings, annotation icons, and both
/// list kinds, with link and bold repair applied to every block
fn format_markdown_content_advanced(content: &str) -> String {
    if content.trim().is_empty() {
        return String::new();
    }

    let mut html_lines: Vec<String> = Vec::new();
    let mut in_list = false;
    let mut in_numbered_list = false;

    let close_lists = |html_lines: &mut Vec<String>, in_list: &mut bool, in_numbered: &mut bool| {
        if *in_list {
            html_lines.push("</ul>".to_string());
            *in_list = false;
        }
        if *in_numbered {
            html_lines.push("</ol>".to_string());
            *in_numbered = false;
        }
    };

    for line in content.split('\n') {
        let line = line.trim();

        if line.is_empty() {
            close_lists(&mut html_lines, &mut in_list, &mut in_numbered_list);
            continue;
        }

        if let Some(title) = line.strip_prefix("### ") {
            close_lists(&mut html_lines, &mut in_list, &mut in_numbered_list);
            html_lines.push(format!("<h3>{}</h3>", title.trim()));
            continue;
        }

        if let Some(content_part) = line.strip_prefix("📝 ") {
            close_lists(&mut html_lines, &mut in_list, &mut in_numbered_list);
            let content_part = process_bold_text(content_part.trim());
            html_lines.push(format!(
                "<div class=\"keyword-explanation\"><span class=\"icon\">📝</span> {}</div>",
                content_part
            ));
            continue;
        }

        if NUMBERED_ITEM_REGEX.is_match(line) {
            if in_list {
                html_lines.push("</ul>".to_string());
                in_list = false;
            }
            if !in_numbered_list {
                html_lines.push("<ol>".to_string());
                in_numbered_list = true;
            }
            let item = NUMBERED_ITEM_REGEX.replace(line, "");
            html_lines.push(format!("<li>{}</li>", process_bold_text(&item)));
            continue;
        }

        if let Some(item) = line.strip_prefix("- ") {
            if in_numbered_list {
                html_lines.push("</ol>".to_string());
                in_numbered_list = false;
            }
            if !in_list {
                html_lines.push("<ul>".to_string());
                in_list = true;
            }
            html_lines.push(format!("<li>{}</li>", process_bold_text(item.trim())));
            continue;
        }

        close_lists(&mut html_lines, &mut in_list, &mut in_numbered_list);
        html_lines.push(format!("<p>{}</p>", process_bold_text(line)));
    }

    close_lists(&mut html_lines, &mut in_list, &mut in_numbered_list);

    html_lines.join("\n")
}
