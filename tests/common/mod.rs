#![allow(dead_code)]

use std::collections::HashMap;

use drivetest_scraper::{PageSource, ScrapeError, SiteConfig};

pub const SITE_CONFIG: &str = r#"{
    "menu_url": "https://tiba.jsyks.com/kmytk",
    "chapter_list_selector": "div.menu",
    "pagination_selector": "div.fenye",
    "question_list_selector": "div.ListCnt",
    "question_url_template": "https://tiba.jsyks.com/Post/{id}.htm",
    "question_container_selector": "div#question",
    "question_title_selector": "h1"
}"#;

pub fn site_config() -> SiteConfig {
    SiteConfig::from_json_str(SITE_CONFIG).unwrap()
}

/// Serves canned pages and images; anything else is a connection error.
#[derive(Default)]
pub struct FakeSite {
    pages: HashMap<String, String>,
    images: HashMap<String, Vec<u8>>,
}

impl FakeSite {
    pub fn page(mut self, url: &str, html: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), html.into());
        self
    }

    pub fn image(mut self, url: &str, bytes: &[u8]) -> Self {
        self.images.insert(url.to_string(), bytes.to_vec());
        self
    }

    pub fn question(self, id: &str, title_markup: &str) -> Self {
        let url = format!("https://tiba.jsyks.com/Post/{id}.htm");
        let html = format!(r#"<html><body><div id="question">{title_markup}</div></body></html>"#);
        self.page(&url, html)
    }
}

impl PageSource for FakeSite {
    async fn fetch_text(&self, url: &str) -> Result<String, ScrapeError> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| ScrapeError::connection(url, "status 404 Not Found"))
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, ScrapeError> {
        self.images
            .get(url)
            .cloned()
            .ok_or_else(|| ScrapeError::connection(url, "status 404 Not Found"))
    }
}

pub fn menu_page(entries: &[(&str, &str)]) -> String {
    let links: String = entries
        .iter()
        .map(|(href, text)| format!(r#"<li><a href="{href}">{text}</a></li>"#))
        .collect();
    format!(r#"<html><body><div class="menu"><ul>{links}</ul></div></body></html>"#)
}

/// A listing page with the given question ids and a pagination bar whose
/// last-page link points at `last_page`.
pub fn listing_page(ids: &[&str], last_page: &str) -> String {
    let items: String = ids
        .iter()
        .map(|id| format!(r#"<li><a href="/Post/{id}.htm">question {id}</a></li>"#))
        .collect();
    format!(
        r#"<html><body><div class="ListCnt"><ul>{items}</ul></div>
        <div class="fenye"><a href="{last_page}">尾页</a></div></body></html>"#
    )
}

pub fn true_false_title(id: &str, text: &str, answer: &str) -> String {
    format!(r#"<h1><strong><a href="/Post/{id}.htm">{text}</a></strong><br>答案：<u>{answer}</u></h1>"#)
}

pub fn four_choice_title(id: &str, text: &str, options: [&str; 4], answer: char, image: Option<&str>) -> String {
    let image = image
        .map(|src| format!(r#"<img src="{src}"><br>"#))
        .unwrap_or_default();
    format!(
        r#"<h1><strong><a href="/Post/{id}.htm">{text}</a></strong><br>{image}A、{}<br>B、{}<br>C、{}<br>D、{}<br>答案：<u>{answer}</u></h1>"#,
        options[0], options[1], options[2], options[3]
    )
}
