use once_cell::sync::Lazy;
use regex::Regex;

use crate::message::{extract_agent_text, AgentMessage};
use crate::session::DebateSession;

/// Raw text shorter than this is rejected outright by the formatter.
pub const MIN_FORMAT_LEN: usize = 5;

/// The closed set of professional roles the backend's personas open with.
const ROLES: [&str; 9] = [
    "UX Designer",
    "Data Scientist",
    "Product Manager",
    "Security Expert",
    "Software Engineer",
    "Business Analyst",
    "Database Expert",
    "Backend Developer",
    "Frontend Developer",
];

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Extract the narrative text from a message and format it as a sanitized
/// HTML fragment. Empty string means "nothing extractable" — never an error.
pub fn render(message: &AgentMessage) -> String {
    format_agent_text(&extract_agent_text(message))
}

/// Convert extracted agent prose into an HTML fragment. Escaping happens
/// before any markup substitution; doing it afterwards would corrupt the
/// generated tags.
pub fn format_agent_text(raw: &str) -> String {
    if raw.chars().count() < MIN_FORMAT_LEN {
        return String::new();
    }
    let text = unescape_sequences(raw);
    let text = strip_trailing_metadata(&text);
    let text = escape_html(&text);
    let text = label_role_openers(&text);
    let text = label_section_phrases(&text);
    let text = convert_lists(&text);
    let text = convert_emphasis(&text);
    let text = collapse_breaks(&text);
    trim_breaks(&text)
}

/// Terminal-oriented sibling of `format_agent_text`: same cleanup, no HTML.
pub fn clean_agent_text(raw: &str) -> String {
    if raw.chars().count() < MIN_FORMAT_LEN {
        return String::new();
    }
    let text = unescape_sequences(raw);
    let text = strip_trailing_metadata(&text);
    text.trim().to_string()
}

// ---------------------------------------------------------------------------
// Pipeline stages
// ---------------------------------------------------------------------------

/// Unescape `\n`, `\t`, `\"`, `\'`, `\\` in a single pass. Payloads that went
/// through an extra stringification layer arrive with these doubled up.
fn unescape_sequences(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('n') => {
                chars.next();
                out.push('\n');
            }
            Some('t') => {
                chars.next();
                out.push('\t');
            }
            Some('"') => {
                chars.next();
                out.push('"');
            }
            Some('\'') => {
                chars.next();
                out.push('\'');
            }
            Some('\\') => {
                chars.next();
                out.push('\\');
            }
            _ => out.push('\\'),
        }
    }
    out
}

/// Truncate at the first leaked serialization artifact: the role marker or
/// usage-metadata marker that trails real content when the backend
/// stringifies a whole response object.
fn strip_trailing_metadata(input: &str) -> String {
    static METADATA_MARKER_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r#"['"]\}\],\s*['"](?:role|usage_metadata)['"]\s*:"#)
            .expect("metadata marker pattern is valid")
    });
    match METADATA_MARKER_RE.find(input) {
        Some(m) => input[..m.start()].to_string(),
        None => input.to_string(),
    }
}

/// Entity-escape the five HTML special characters. `&` goes first.
pub fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Rewrite "As a <Role>" / "I'm a <Role>" / "Being a <Role>" openers into a
/// bolded "<Role> Perspective:" label plus a paragraph break. Only at a line
/// start or right after a sentence boundary — a mid-sentence "as a Product
/// Manager would say" is prose, not an opener. Runs on escaped text, so the
/// apostrophe in "I'm" may already be an entity.
fn label_role_openers(input: &str) -> String {
    static ROLE_OPENER_RE: Lazy<Regex> = Lazy::new(|| {
        let roles = ROLES.join("|");
        Regex::new(&format!(
            r"(?mi)(^[ \t]*|[.!?]\s+)(?:As a|I(?:'|&#39;)m a|Being a)\s+({roles})\b[,:]?\s*"
        ))
        .expect("role opener pattern is valid")
    });
    ROLE_OPENER_RE
        .replace_all(input, |caps: &regex::Captures<'_>| {
            let lead = caps[1].trim_end().to_string();
            let role = canonical_role(&caps[2]);
            format!("{lead}\n\n<strong>{role} Perspective:</strong>\n\n")
        })
        .into_owned()
}

fn canonical_role(matched: &str) -> &'static str {
    ROLES
        .iter()
        .find(|role| role.eq_ignore_ascii_case(matched))
        .copied()
        .unwrap_or("Team")
}

/// Bold the known section-introducing phrases and give each one its own line,
/// preceded by a paragraph break. Recognized at a line start or right after a
/// sentence boundary.
fn label_section_phrases(input: &str) -> String {
    static SECTION_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(
            r"(?mi)(^[ \t]*|\.\s+)(opening arguments?|my argument|my concerns|my perspective|here(?:'|&#39;)s my(?: [a-z]+)?|from an? [a-z][a-z ]{1,28} perspective|recommendations|conclusions|key points|in summary|in short)\s*[:,]?\s*",
        )
        .expect("section phrase pattern is valid")
    });
    SECTION_RE
        .replace_all(input, |caps: &regex::Captures<'_>| {
            let dot = if caps[1].trim_start().starts_with('.') { "." } else { "" };
            let phrase = capitalize_first(&caps[2]);
            format!("{dot}\n\n<strong>{phrase}:</strong>\n")
        })
        .into_owned()
}

fn capitalize_first(phrase: &str) -> String {
    let mut chars = phrase.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Numbered items introduced as `N. **label**` become bold bullet labels;
/// `*` / `-` / `•` at line start become inline bullet lines.
fn convert_lists(input: &str) -> String {
    static NUMBERED_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?m)^[ \t]*(\d+)\.\s+\*\*([^*\n]+)\*\*:?\s*")
            .expect("numbered item pattern is valid")
    });
    static BULLET_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?m)^[ \t]*[*\-•][ \t]+").expect("bullet pattern is valid")
    });

    let text = NUMBERED_RE.replace_all(input, |caps: &regex::Captures<'_>| {
        let label = caps[2].trim_end_matches(':').trim_end();
        format!("<strong>{}. {}:</strong> ", &caps[1], label)
    });
    BULLET_RE.replace_all(&text, "• ").into_owned()
}

/// `**bold**` then `*italic*`. Running bold first is what makes a lone `*`
/// pair italic only when it is not half of a `**` marker.
fn convert_emphasis(input: &str) -> String {
    static BOLD_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\*\*([^*]+)\*\*").expect("bold pattern is valid"));
    static ITALIC_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\*([^*\n]+)\*").expect("italic pattern is valid"));

    let text = BOLD_RE.replace_all(input, "<strong>$1</strong>");
    ITALIC_RE.replace_all(&text, "<em>$1</em>").into_owned()
}

/// 2+ newlines become a paragraph break, a remaining lone newline becomes a
/// line break, and runs of 3+ break tags are clamped back to a paragraph.
fn collapse_breaks(input: &str) -> String {
    static MULTI_NEWLINE_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\n{2,}").expect("newline run pattern is valid"));
    static BR_RUN_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?:<br>\s*){3,}").expect("break run pattern is valid"));

    let text = MULTI_NEWLINE_RE.replace_all(input, "<br><br>");
    let text = text.replace('\n', "<br>");
    BR_RUN_RE.replace_all(&text, "<br><br>").into_owned()
}

fn trim_breaks(input: &str) -> String {
    let mut text = input.trim();
    loop {
        let trimmed = text
            .trim()
            .trim_start_matches("<br>")
            .trim_end_matches("<br>");
        if trimmed == text {
            return text.to_string();
        }
        text = trimmed;
    }
}

// ---------------------------------------------------------------------------
// Page rendering (transcript viewer / export)
// ---------------------------------------------------------------------------

/// Shared stylesheet for the transcript viewer and exported pages.
pub const PAGE_STYLE: &str = r##"
*{margin:0;padding:0;box-sizing:border-box}
body{background:#0d1117;color:#c9d1d9;font-family:'Segoe UI',system-ui,sans-serif;line-height:1.6;padding:24px;max-width:880px;margin:0 auto}
header{border-bottom:1px solid #21262d;padding-bottom:12px;margin-bottom:20px}
header h1{font-size:1.4rem;color:#58a6ff}
header .meta{font-size:.8rem;color:#8b949e}
section.round{margin-bottom:28px}
section.round h2{font-size:1.05rem;color:#f0883e;border-bottom:1px solid #21262d;padding-bottom:4px;margin-bottom:12px}
.agent{margin-bottom:16px;padding:12px 16px;background:#161b22;border:1px solid #21262d;border-radius:8px}
.agent h3{font-size:.9rem;color:#3fb950;margin-bottom:6px}
.agent .empty{color:#484f58;font-style:italic}
strong{color:#e6edf3}
em{color:#a5d6ff}
h2.prd,h3.prd{color:#58a6ff;margin:14px 0 6px}
"##;

/// Wrap a rendered body in a complete HTML document.
pub fn render_page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{}</title>\n<style>{}</style>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        escape_html(title),
        PAGE_STYLE,
        body
    )
}

/// Render a full session transcript as one HTML document: a header, then one
/// section per round with every agent's formatted contribution.
pub fn render_transcript(session: &DebateSession) -> String {
    let mut body = String::new();
    body.push_str(&format!(
        "<header><h1>{}</h1><span class=\"meta\">{} round{} · round counter {}</span></header>\n",
        escape_html(&session.topic),
        session.history.len(),
        if session.history.len() == 1 { "" } else { "s" },
        session.round,
    ));

    for (index, round) in session.history.iter().enumerate() {
        body.push_str(&format!(
            "<section class=\"round\">\n<h2>Round {}</h2>\n",
            index + 1
        ));
        for (agent, message) in round.agents() {
            let fragment = render(&message);
            body.push_str(&format!("<div class=\"agent\">\n<h3>{}</h3>\n", escape_html(agent)));
            if fragment.is_empty() {
                body.push_str("<p class=\"empty\">(no content)</p>\n");
            } else {
                body.push_str(&format!("<p>{fragment}</p>\n"));
            }
            body.push_str("</div>\n");
        }
        body.push_str("</section>\n");
    }

    render_page(&format!("Debate — {}", session.topic), &body)
}

/// Render PRD markdown (as served by the backend's `prd_text` endpoint) to an
/// HTML fragment. Same dialect as agent text, plus `#`/`##`/`###` headers.
pub fn render_markdown(text: &str) -> String {
    static HEADER_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?m)^(#{1,3})[ \t]+(.+?)[ \t]*$").expect("header pattern is valid"));

    let text = escape_html(text);
    let text = HEADER_RE.replace_all(&text, |caps: &regex::Captures<'_>| {
        let tag = match caps[1].len() {
            1 => "h2",
            2 => "h3",
            _ => "h4",
        };
        format!("<{tag} class=\"prd\">{}</{tag}>", &caps[2])
    });
    let text = convert_lists(&text);
    let text = convert_emphasis(&text);
    let text = collapse_breaks(&text);
    trim_breaks(&text)
}
