use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::{json, Value};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::debug;

use crate::error::ClipError;
use crate::flows::FlowKind;
use crate::record::Record;

static GOODREADS_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/show/(\d+)").unwrap());
static VIDEO_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[?&]v=([^&#]+)").unwrap());
static SHORTS_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"shorts/([^?&#/]+)").unwrap());
static SHORT_LINK_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"youtu\.be/([^?&#/]+)").unwrap());
static PLAYLIST_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[?&]list=([^&#]+)").unwrap());
static THUMB_VIDEO_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/vi/([^/]+)/").unwrap());

const GENRE_LIMIT: usize = 5;

/// Download a page for extraction.
pub async fn fetch_page(url: &str, timeout: Duration) -> Result<String, ClipError> {
    let parsed = url::Url::parse(url)
        .map_err(|e| ClipError::Extraction(format!("invalid page URL '{}': {}", url, e)))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ClipError::Extraction(format!(
            "cannot clip {} pages",
            parsed.scheme()
        )));
    }

    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ClipError::Extraction(e.to_string()))?;

    debug!(url, "fetching page");
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| ClipError::Extraction(format!("could not load {}: {}", url, e)))?;

    if !response.status().is_success() {
        return Err(ClipError::Extraction(format!(
            "{} returned {}",
            url,
            response.status()
        )));
    }

    response
        .text()
        .await
        .map_err(|e| ClipError::Extraction(e.to_string()))
}

/// Extract page metadata for the given flow kind.
pub fn extract(kind: FlowKind, html: &str, page_url: &str) -> Result<Record, ClipError> {
    let doc = Html::parse_document(html);
    let data = match kind {
        FlowKind::Book => extract_book(&doc, page_url),
        FlowKind::Video => extract_video(&doc, page_url),
        FlowKind::Generic => extract_generic(&doc, page_url),
    };

    let has_title = data
        .get("title")
        .and_then(Value::as_str)
        .is_some_and(|t| !t.is_empty());
    if has_title {
        Ok(data)
    } else {
        Err(ClipError::Extraction(format!("no title found on {}", page_url)))
    }
}

// --- Selector helpers ---

fn select_first<'a>(doc: &'a Html, selectors: &[&str]) -> Option<ElementRef<'a>> {
    selectors
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .find_map(|sel| doc.select(&sel).next())
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn first_text(doc: &Html, selectors: &[&str]) -> Option<String> {
    selectors
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .filter_map(|sel| doc.select(&sel).next().map(element_text))
        .find(|t| !t.is_empty())
}

fn first_attr(doc: &Html, selectors: &[&str], attr: &str) -> Option<String> {
    selectors
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .filter_map(|sel| {
            doc.select(&sel)
                .next()
                .and_then(|el| el.value().attr(attr))
                .map(|v| v.trim().to_string())
        })
        .find(|v| !v.is_empty())
}

fn meta(doc: &Html, property: &str) -> Option<String> {
    first_attr(
        doc,
        &[
            &format!(r#"meta[property="{}"]"#, property),
            &format!(r#"meta[name="{}"]"#, property),
        ],
        "content",
    )
}

fn capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text).map(|c| c[1].to_string())
}

// --- Generic page ---

fn extract_generic(doc: &Html, page_url: &str) -> Record {
    let title = meta(doc, "og:title")
        .or_else(|| first_text(doc, &["title"]))
        .unwrap_or_default();
    let description = meta(doc, "og:description")
        .or_else(|| meta(doc, "description"))
        .unwrap_or_default();
    let image_url = meta(doc, "og:image").unwrap_or_default();

    let mut data = Record::new();
    data.insert("title".into(), json!(title));
    data.insert("description".into(), json!(description));
    data.insert("imageUrl".into(), json!(image_url));
    data.insert("pageUrl".into(), json!(page_url));
    data.insert("flowType".into(), json!("generic"));
    data
}

// --- Book page ---

fn extract_book(doc: &Html, page_url: &str) -> Record {
    let title = first_text(
        doc,
        &[r#"h1[data-testid="bookTitle"]"#, ".BookPageTitleSection__title h1"],
    )
    .or_else(|| meta(doc, "og:title"))
    .unwrap_or_default();

    let author = first_text(doc, &[".ContributorLink__name", r#"span[data-testid="name"]"#])
        .unwrap_or_default();

    let image_url = first_attr(doc, &[".BookPage__bookCover img", "img.ResponsiveImage"], "src")
        .or_else(|| meta(doc, "og:image"))
        .unwrap_or_default();

    let description = first_text(
        doc,
        &[
            ".DetailsLayoutRightParagraph__widthConstrained",
            r#"[data-testid="description"]"#,
        ],
    )
    .map(|d| d.trim_end_matches("...more").trim().to_string())
    .unwrap_or_default();

    let genres = book_genres(doc);
    let rating = first_text(doc, &[".RatingStatistics__rating"]).unwrap_or_default();
    let goodreads_id = capture(&GOODREADS_ID, page_url).unwrap_or_default();

    let mut data = Record::new();
    data.insert("title".into(), json!(title));
    data.insert("author".into(), json!(author));
    data.insert("imageUrl".into(), json!(image_url));
    data.insert("description".into(), json!(description));
    data.insert("genres".into(), json!(genres));
    data.insert("rating".into(), json!(rating));
    data.insert("pageUrl".into(), json!(page_url));
    data.insert("goodreadsId".into(), json!(goodreads_id));
    data.insert("flowType".into(), json!("goodreads"));
    data
}

fn book_genres(doc: &Html) -> Vec<String> {
    for selector in [
        r#"[data-testid="genresList"] .Button__labelItem"#,
        ".BookPageMetadataSection__genres span",
    ] {
        let Ok(sel) = Selector::parse(selector) else {
            continue;
        };
        let genres: Vec<String> = doc
            .select(&sel)
            .map(element_text)
            .filter(|g| !g.is_empty())
            .take(GENRE_LIMIT)
            .collect();
        if !genres.is_empty() {
            return genres;
        }
    }
    Vec::new()
}

// --- Video / playlist page ---

fn hq_thumbnail(src: &str) -> String {
    match capture(&THUMB_VIDEO_ID, src) {
        Some(id) => format!("https://i.ytimg.com/vi/{}/hqdefault.jpg", id),
        None => src.to_string(),
    }
}

fn extract_video(doc: &Html, page_url: &str) -> Record {
    let is_playlist = page_url.contains("list=");
    let video_id = capture(&VIDEO_ID, page_url)
        .or_else(|| capture(&SHORTS_ID, page_url))
        .or_else(|| capture(&SHORT_LINK_ID, page_url))
        .unwrap_or_default();
    let playlist_id = capture(&PLAYLIST_ID, page_url).unwrap_or_default();

    let (title, channel_el, description, thumbnail_url) = if is_playlist {
        let title = first_text(
            doc,
            &[
                "yt-dynamic-sizing-formatted-string yt-formatted-string#text",
                "yt-formatted-string.ytd-playlist-header-renderer",
                "#title h1",
                "h1.ytd-playlist-header-renderer",
                ".ytd-playlist-header-renderer #title",
            ],
        )
        .or_else(|| meta(doc, "og:title"))
        .unwrap_or_else(|| "YouTube Playlist".to_string());

        let channel = select_first(
            doc,
            &[
                "ytd-channel-name yt-formatted-string a",
                "ytd-channel-name a",
                "#owner a",
                "#owner-text a",
            ],
        );

        let description = first_text(
            doc,
            &[
                "#plain-snippet-text",
                "#description",
                "yt-formatted-string#description-text",
            ],
        )
        .or_else(|| meta(doc, "og:description"))
        .unwrap_or_default();

        let thumbnail = first_attr(
            doc,
            &[
                "ytd-hero-playlist-thumbnail-renderer img",
                "ytd-playlist-thumbnail img",
                ".ytd-playlist-header-renderer img",
                "ytd-playlist-video-renderer img#img",
                "ytd-playlist-panel-video-renderer img",
            ],
            "src",
        )
        .map(|src| hq_thumbnail(&src))
        .or_else(|| {
            first_attr(doc, &["ytd-playlist-video-renderer a#video-title"], "href")
                .and_then(|href| capture(&VIDEO_ID, &href))
                .map(|id| format!("https://i.ytimg.com/vi/{}/hqdefault.jpg", id))
        })
        .or_else(|| meta(doc, "og:image"))
        .unwrap_or_default();

        (title, channel, description, thumbnail)
    } else {
        let title = first_text(
            doc,
            &[
                "h1.ytd-watch-metadata yt-formatted-string",
                "h1.title yt-formatted-string",
                "#title h1",
            ],
        )
        .or_else(|| meta(doc, "og:title"))
        .unwrap_or_else(|| "YouTube Video".to_string());

        let channel = select_first(
            doc,
            &[
                "ytd-channel-name a",
                "#channel-name a",
                "ytd-video-owner-renderer a",
            ],
        );

        let description = first_text(
            doc,
            &[
                "ytd-text-inline-expander span.yt-core-attributed-string",
                "#description yt-formatted-string",
            ],
        )
        .or_else(|| meta(doc, "og:description"))
        .unwrap_or_default();

        let thumbnail = if video_id.is_empty() {
            meta(doc, "og:image").unwrap_or_default()
        } else {
            format!("https://i.ytimg.com/vi/{}/maxresdefault.jpg", video_id)
        };

        (title, channel, description, thumbnail)
    };

    let channel = channel_el
        .map(element_text)
        .filter(|c| !c.is_empty())
        .or_else(|| first_attr(doc, &[r#"span[itemprop="author"] link[itemprop="name"]"#], "content"))
        .unwrap_or_default();
    let channel_url = channel_el
        .and_then(|el| el.value().attr("href"))
        .unwrap_or_default();

    let mut data = Record::new();
    data.insert("title".into(), json!(title));
    data.insert("channel".into(), json!(channel));
    data.insert("channelUrl".into(), json!(channel_url));
    data.insert("description".into(), json!(description));
    data.insert("thumbnailUrl".into(), json!(thumbnail_url));
    data.insert("pageUrl".into(), json!(page_url));
    data.insert("videoId".into(), json!(video_id));
    data.insert("playlistId".into(), json!(playlist_id));
    data.insert(
        "contentType".into(),
        json!(if is_playlist { "playlist" } else { "video" }),
    );
    data.insert("isPlaylist".into(), json!(is_playlist));
    data.insert("flowType".into(), json!("youtube"));
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/post"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<title>Post</title>"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let timeout = Duration::from_secs(5);
        let html = fetch_page(&format!("{}/post", server.uri()), timeout).await.unwrap();
        assert_eq!(html, "<title>Post</title>");

        let err = fetch_page(&format!("{}/gone", server.uri()), timeout).await.unwrap_err();
        assert!(matches!(err, ClipError::Extraction(_)));
    }

    #[tokio::test]
    async fn test_fetch_page_rejects_non_http() {
        let timeout = Duration::from_secs(1);
        assert!(fetch_page("file:///etc/hosts", timeout).await.is_err());
        assert!(fetch_page("not a url", timeout).await.is_err());
    }

    #[test]
    fn test_generic_page_prefers_open_graph() {
        let html = r#"<html><head>
            <title>Plain Title</title>
            <meta name="description" content="Plain description">
            <meta property="og:title" content="OG Title">
            <meta property="og:image" content="https://example.com/cover.png">
        </head><body></body></html>"#;

        let data = extract(FlowKind::Generic, html, "https://example.com/post").unwrap();
        assert_eq!(data["title"], json!("OG Title"));
        assert_eq!(data["description"], json!("Plain description"));
        assert_eq!(data["imageUrl"], json!("https://example.com/cover.png"));
        assert_eq!(data["pageUrl"], json!("https://example.com/post"));
    }

    #[test]
    fn test_generic_page_without_title_fails() {
        let err = extract(FlowKind::Generic, "<html><body><p>x</p></body></html>", "https://e.x")
            .unwrap_err();
        assert!(matches!(err, ClipError::Extraction(_)));
        assert!(err.to_string().contains("refreshing"));
    }

    #[test]
    fn test_book_page() {
        let html = r#"<html><body>
            <div class="BookPageTitleSection__title"><h1 data-testid="bookTitle">Dune</h1></div>
            <span class="ContributorLink__name">Frank Herbert</span>
            <div class="BookPage__bookCover"><img src="https://images.gr/dune.jpg"></div>
            <div data-testid="description">Set on the desert planet Arrakis...more</div>
            <div data-testid="genresList">
              <span class="Button__labelItem">Science Fiction</span>
              <span class="Button__labelItem">Fiction</span>
              <span class="Button__labelItem">Fantasy</span>
              <span class="Button__labelItem">Classics</span>
              <span class="Button__labelItem">Novels</span>
              <span class="Button__labelItem">Space</span>
            </div>
            <div class="RatingStatistics__rating">4.27</div>
        </body></html>"#;

        let data = extract(
            FlowKind::Book,
            html,
            "https://www.goodreads.com/book/show/44767458-dune",
        )
        .unwrap();
        assert_eq!(data["title"], json!("Dune"));
        assert_eq!(data["author"], json!("Frank Herbert"));
        assert_eq!(data["imageUrl"], json!("https://images.gr/dune.jpg"));
        assert_eq!(data["description"], json!("Set on the desert planet Arrakis"));
        assert_eq!(
            data["genres"],
            json!(["Science Fiction", "Fiction", "Fantasy", "Classics", "Novels"])
        );
        assert_eq!(data["rating"], json!("4.27"));
        assert_eq!(data["goodreadsId"], json!("44767458"));
        assert_eq!(data["flowType"], json!("goodreads"));
    }

    #[test]
    fn test_video_page() {
        let html = r#"<html><head>
            <meta property="og:title" content="Why is the sky blue?">
            <meta property="og:description" content="Rayleigh scattering explained.">
        </head><body>
            <ytd-channel-name><a href="https://www.youtube.com/@minutephysics">MinutePhysics</a></ytd-channel-name>
        </body></html>"#;

        let data = extract(FlowKind::Video, html, "https://www.youtube.com/watch?v=abc123&t=4").unwrap();
        assert_eq!(data["title"], json!("Why is the sky blue?"));
        assert_eq!(data["channel"], json!("MinutePhysics"));
        assert_eq!(data["channelUrl"], json!("https://www.youtube.com/@minutephysics"));
        assert_eq!(data["description"], json!("Rayleigh scattering explained."));
        assert_eq!(
            data["thumbnailUrl"],
            json!("https://i.ytimg.com/vi/abc123/maxresdefault.jpg")
        );
        assert_eq!(data["videoId"], json!("abc123"));
        assert_eq!(data["isPlaylist"], json!(false));
        assert_eq!(data["contentType"], json!("video"));
    }

    #[test]
    fn test_playlist_page_uses_hq_thumbnail() {
        let html = r#"<html><body>
            <h1 class="ytd-playlist-header-renderer">Linear Algebra</h1>
            <ytd-playlist-thumbnail><img src="https://i.ytimg.com/vi/fNk_zzaMoSs/hqdefault.jpg?sqp=x"></ytd-playlist-thumbnail>
        </body></html>"#;

        let data = extract(
            FlowKind::Video,
            html,
            "https://www.youtube.com/playlist?list=PLZHQObOWTQDPD3MizzM2xVFitgF8hE_ab",
        )
        .unwrap();
        assert_eq!(data["title"], json!("Linear Algebra"));
        assert_eq!(data["isPlaylist"], json!(true));
        assert_eq!(data["playlistId"], json!("PLZHQObOWTQDPD3MizzM2xVFitgF8hE_ab"));
        assert_eq!(
            data["thumbnailUrl"],
            json!("https://i.ytimg.com/vi/fNk_zzaMoSs/hqdefault.jpg")
        );
        assert_eq!(data["channel"], json!(""));
    }

    #[test]
    fn test_video_defaults_when_page_is_bare() {
        let data = extract(FlowKind::Video, "<html></html>", "https://youtu.be/xyz").unwrap();
        assert_eq!(data["title"], json!("YouTube Video"));
        assert_eq!(data["videoId"], json!("xyz"));
    }
}
