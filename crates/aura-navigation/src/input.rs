//! Input resolution for the address bar
//!
//! Free text that matches a URL shape navigates directly; anything else is
//! expanded through the configured search engine's query template.

use std::net::IpAddr;
use url::Url;

/// Result of resolving address bar input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputResolution {
    /// Navigate to a direct address
    Navigate(String),
    /// Perform a search via the engine template
    Search(String),
}

impl InputResolution {
    pub fn into_url(self) -> String {
        match self {
            InputResolution::Navigate(url) | InputResolution::Search(url) => url,
        }
    }
}

/// A known search engine with its query template (`%s` is the encoded query).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchEngine {
    pub id: &'static str,
    pub name: &'static str,
    pub template: &'static str,
}

const ENGINES: &[SearchEngine] = &[
    SearchEngine {
        id: "google",
        name: "Google",
        template: "https://www.google.com/search?q=%s",
    },
    SearchEngine {
        id: "bing",
        name: "Bing",
        template: "https://www.bing.com/search?q=%s",
    },
    SearchEngine {
        id: "duckduckgo",
        name: "DuckDuckGo",
        template: "https://duckduckgo.com/?q=%s",
    },
    SearchEngine {
        id: "yahoo",
        name: "Yahoo",
        template: "https://search.yahoo.com/search?p=%s",
    },
];

impl SearchEngine {
    /// Look up an engine by its settings id; unknown ids fall back to Google.
    pub fn from_id(id: &str) -> SearchEngine {
        ENGINES
            .iter()
            .find(|e| e.id == id)
            .copied()
            .unwrap_or(ENGINES[0])
    }

    pub fn all() -> &'static [SearchEngine] {
        ENGINES
    }
}

pub struct InputResolver {
    engine: SearchEngine,
}

impl InputResolver {
    pub fn new(engine_id: &str) -> Self {
        Self {
            engine: SearchEngine::from_id(engine_id),
        }
    }

    pub fn set_engine(&mut self, engine_id: &str) {
        self.engine = SearchEngine::from_id(engine_id);
    }

    pub fn engine(&self) -> SearchEngine {
        self.engine
    }

    /// Resolve user input into a navigable URL.
    pub fn resolve(&self, input: &str) -> InputResolution {
        let input = input.trim();

        if input.is_empty() {
            return InputResolution::Navigate("about:blank".to_string());
        }

        if let Some(url) = try_parse_url(input) {
            return InputResolution::Navigate(url);
        }

        InputResolution::Search(self.build_search_url(input))
    }

    fn build_search_url(&self, query: &str) -> String {
        self.engine.template.replace("%s", &percent_encode(query))
    }
}

impl Default for InputResolver {
    fn default() -> Self {
        Self::new("google")
    }
}

/// Try to interpret input as a direct address.
fn try_parse_url(input: &str) -> Option<String> {
    // Direct URL with scheme
    if (input.starts_with("http://") || input.starts_with("https://")) && Url::parse(input).is_ok()
    {
        return Some(input.to_string());
    }

    // Special protocols
    if input.starts_with("about:") || input.starts_with("file://") || input.starts_with("data:") {
        return Some(input.to_string());
    }

    // Scheme-less host: upgrade to https if it looks like a domain
    if looks_like_url(input) {
        let with_https = format!("https://{input}");
        if Url::parse(&with_https).is_ok() {
            return Some(with_https);
        }
    }

    None
}

/// Heuristic URL-shape check: no spaces, and either localhost, an IP, or a
/// domain with a plausible TLD.
fn looks_like_url(input: &str) -> bool {
    if input.contains(' ') {
        return false;
    }

    if input.starts_with("localhost") || is_ip_address(input) {
        return true;
    }

    if let Some((_, tld)) = input.rsplit_once('.') {
        let tld = tld.split([':', '/', '?', '#']).next().unwrap_or("");
        return (2..=6).contains(&tld.len()) && tld.chars().all(|c| c.is_ascii_alphabetic());
    }

    false
}

fn is_ip_address(input: &str) -> bool {
    let host = input
        .split(['/', '?', '#'])
        .next()
        .unwrap_or(input)
        .split(':')
        .next()
        .unwrap_or(input);
    host.parse::<IpAddr>().is_ok()
}

fn percent_encode(input: &str) -> String {
    let mut result = String::with_capacity(input.len() * 3);
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                result.push(byte as char);
            }
            _ => {
                result.push_str(&format!("%{byte:02X}"));
            }
        }
    }
    result
}

/// Derive a display title from a URL: capitalized first label of the
/// `www.`-stripped hostname. Search result pages and blank tabs get fixed
/// names.
pub fn title_for_url(url: &str) -> String {
    if url.is_empty() || url == "about:blank" {
        return "New Tab".to_string();
    }
    if url.contains("google.com/search") {
        return "Google Search".to_string();
    }

    let with_scheme = if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{url}")
    };

    let host = match Url::parse(&with_scheme).ok().and_then(|u| {
        u.host_str()
            .map(|h| h.trim_start_matches("www.").to_string())
    }) {
        Some(host) => host,
        None => return "New Tab".to_string(),
    };

    let label = host.split('.').next().unwrap_or(&host);
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => "New Tab".to_string(),
    }
}
