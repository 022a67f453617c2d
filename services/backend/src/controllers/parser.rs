use scraper::{Html, Selector};
use serde_json::from_str;
use tracing::debug;

/// Allowed domains for lyrics fetching (SSRF protection). Slugs and selectors are Genius only.
const ALLOWED_DOMAINS: &[&str] = &["genius.com", "www.genius.com"];

/// Validate URL is from an allowed domain
fn is_allowed_url(url: &str) -> bool {
    if let Ok(parsed) = url::Url::parse(url) {
        if let Some(host) = parsed.host_str() {
            return ALLOWED_DOMAINS
                .iter()
                .any(|&allowed| host == allowed || host.ends_with(&format!(".{}", allowed)));
        }
    }
    false
}

fn get_lyrics(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut chunks: Vec<String> = Vec::new();

    // Try modern and legacy Genius lyrics containers
    let selectors = [
        r#"div[data-lyrics-container="true"]"#,
        r#".Lyrics__Container-sc-1ynbvzw-6"#,
    ];

    for sel in selectors {
        if let Ok(selector) = Selector::parse(sel) {
            for element in fragment.select(&selector) {
                let text = element.text().collect::<String>().trim().to_string();
                if !text.is_empty() {
                    chunks.push(text);
                }
            }
        }
        if !chunks.is_empty() {
            break;
        }
    }

    chunks.join("\n\n")
}

/// Builds a Genius style page slug: `Artist-song-title-lyrics`.
fn lyrics_slug(artist: &str, title: &str) -> String {
    let mut slug = String::new();
    for c in format!("{} {}", artist, title).chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') && c != '\'' {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');

    let mut chars = slug.chars();
    match chars.next() {
        Some(first) => format!("{}{}-lyrics", first.to_uppercase(), chars.as_str()),
        None => "lyrics".to_string(),
    }
}

/// Scrapes lyrics pages from an allow-listed site.
#[derive(Clone)]
pub struct LyricsClient {
    base_url: String,
    client: reqwest::Client,
}

impl LyricsClient {
    pub fn new(base_url: &str) -> Result<Self, anyhow::Error> {
        let base_url = base_url.trim_end_matches('/').to_string();
        if !is_allowed_url(&base_url) {
            return Err(anyhow::anyhow!(
                "Lyrics base URL {} is not an allowed lyrics site",
                base_url
            ));
        }

        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (compatible; song-api/1.0)")
            .redirect(reqwest::redirect::Policy::limited(3)) // Limit redirects
            .timeout(std::time::Duration::from_secs(10))
            .build()?;

        Ok(LyricsClient { base_url, client })
    }

    pub fn page_url(&self, artist: &str, title: &str) -> String {
        format!("{}/{}", self.base_url, lyrics_slug(artist, title))
    }

    /// Returns the lyrics text, or an empty string when the page holds none.
    pub async fn fetch(&self, artist: &str, title: &str) -> Result<String, anyhow::Error> {
        let link = self.page_url(artist, title);
        self.get_html(&link).await
    }

    async fn get_html(&self, link: &str) -> Result<String, anyhow::Error> {
        if !is_allowed_url(link) {
            return Err(anyhow::anyhow!(
                "URL not allowed. Only genius.com lyrics pages are permitted."
            ));
        }

        let resp = self.client.get(link).send().await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(String::new());
        }
        let data = resp.error_for_status()?.text().await?;

        // Page may be delivered as a JSON-encoded HTML string; fall back to raw text if parsing fails
        let html = from_str::<String>(data.trim()).unwrap_or(data);

        let lyrics = get_lyrics(&html);
        debug!("extracted_lyrics_len={}", lyrics.len());
        Ok(lyrics)
    }
}
