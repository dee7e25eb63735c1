use std::collections::{BTreeMap, BTreeSet};

use log::{debug, info};
use regex::Regex;
use reqwest::Url;
use scraper::Html;

use crate::{
    config::SiteConfig,
    error::ScrapeError,
    requests::PageSource,
    text_manipulators::{links_in, resolve_link, select_first},
};

const CHAPTER_PATTERN: &str = r"^第\s*(\d+)\s*章：\s*(.+?)\s*$";
const PAGE_URL_PATTERN: &str = r"^(?P<base>.+)_(?P<code>[0-9A-Za-z]+)_(?P<page>\d+)/?$";
const POST_PATTERN: &str = r"/Post/([A-Za-z0-9]+)\.[A-Za-z0-9]+";

/// One line of the chapter menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterEntry {
    pub number: u32,
    pub description: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredChapter {
    pub number: u32,
    pub description: String,
    pub url: String,
    /// Listing pages 1..=n, in order.
    pub page_urls: Vec<String>,
}

/// A listing URL split as `<base>_<code>_<page>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageUrl {
    pub base: String,
    pub code: String,
    pub page: u32,
}

impl PageUrl {
    /// Every page up to and including this one.
    pub fn pages_up_to_here(&self) -> Vec<String> {
        (1..=self.page)
            .map(|i| format!("{}_{}_{}", self.base, self.code, i))
            .collect()
    }
}

pub struct PageUrlPattern {
    // Regex splitting a listing URL into base, chapter code and page number.
    page_url_regex: Regex,
}

impl PageUrlPattern {
    pub fn new() -> Result<Self, ScrapeError> {
        let page_url_regex = Regex::new(PAGE_URL_PATTERN)?;
        Ok(Self { page_url_regex })
    }

    pub fn parse(&self, url: &str) -> Result<PageUrl, ScrapeError> {
        let Some(caps) = self.page_url_regex.captures(url) else {
            return Err(ScrapeError::content(format!(
                "couldn't find `_<code>_<page>` in pagination url: {url}"
            )));
        };
        let page = caps["page"]
            .parse::<u32>()
            .map_err(|e| ScrapeError::content(format!("bad page number in {url}: {e}")))?;
        if page == 0 {
            return Err(ScrapeError::content(format!("page number 0 in {url}")));
        }
        Ok(PageUrl {
            base: caps["base"].to_string(),
            code: caps["code"].to_string(),
            page,
        })
    }
}

/// Finds chapters and the question ids listed under each of them.
///
/// [`IdDiscoverer::discover`] has to succeed before anything else can be asked.
/// Every failure is fatal: a half-discovered chapter list is never returned.
pub struct IdDiscoverer<'a, S> {
    source: &'a S,
    config: &'a SiteConfig,
    chapter_regex: Regex,
    post_regex: Regex,
    page_url_pattern: PageUrlPattern,
    chapters: Option<Vec<DiscoveredChapter>>,
}

impl<'a, S: PageSource> IdDiscoverer<'a, S> {
    pub fn new(source: &'a S, config: &'a SiteConfig) -> Result<Self, ScrapeError> {
        Ok(Self {
            source,
            config,
            chapter_regex: Regex::new(CHAPTER_PATTERN)?,
            post_regex: Regex::new(POST_PATTERN)?,
            page_url_pattern: PageUrlPattern::new()?,
            chapters: None,
        })
    }

    pub fn is_connected(&self) -> bool {
        self.chapters.is_some()
    }

    pub async fn discover(&mut self) -> Result<&[DiscoveredChapter], ScrapeError> {
        let menu_url = self.config.menu_url.as_str();
        info!("Discovering chapters from {}", menu_url);
        let menu_html = self.source.fetch_text(menu_url).await?;
        let entries = self.parse_chapter_list(&menu_html)?;

        let mut chapters = Vec::with_capacity(entries.len());
        for entry in entries {
            let first_page = self.source.fetch_text(&entry.url).await?;
            let page_urls = self.derive_page_urls(&first_page, &entry.url)?;
            info!(
                "Chapter {}: {} ({} pages)",
                entry.number,
                entry.description,
                page_urls.len()
            );
            chapters.push(DiscoveredChapter {
                number: entry.number,
                description: entry.description,
                url: entry.url,
                page_urls,
            });
        }

        Ok(self.chapters.insert(chapters).as_slice())
    }

    pub fn chapters(&self) -> Result<&[DiscoveredChapter], ScrapeError> {
        self.chapters.as_deref().ok_or(ScrapeError::NotConnected)
    }

    /// Fetches every listing page and collects the ids found on each.
    ///
    /// Page 1 is requested again through its `_1` URL, which is a different
    /// address from the chapter link `discover` read the pagination bar from.
    pub async fn get_chapter_to_ids(
        &self,
    ) -> Result<BTreeMap<u32, BTreeSet<String>>, ScrapeError> {
        let mut chapter_to_ids = BTreeMap::new();
        for chapter in self.chapters()? {
            let mut ids = BTreeSet::new();
            for url in &chapter.page_urls {
                let html = self.source.fetch_text(url).await?;
                let page_ids = self.extract_question_ids(&html, url)?;
                debug!("{} ids on {}", page_ids.len(), url);
                ids.extend(page_ids);
            }
            info!("Chapter {} lists {} questions", chapter.number, ids.len());
            chapter_to_ids.insert(chapter.number, ids);
        }
        Ok(chapter_to_ids)
    }

    pub fn parse_chapter_list(&self, html: &str) -> Result<Vec<ChapterEntry>, ScrapeError> {
        let document = Html::parse_document(html);
        let container = select_first(&document, &self.config.chapter_list).ok_or_else(|| {
            ScrapeError::content(format!("no chapter list on {}", self.config.menu_url))
        })?;

        let links = links_in(container);
        if links.is_empty() {
            return Err(ScrapeError::content(format!(
                "chapter list on {} has no links",
                self.config.menu_url
            )));
        }

        links
            .iter()
            .map(|(href, text)| self.parse_chapter_entry(href, text))
            .collect()
    }

    fn parse_chapter_entry(&self, href: &str, text: &str) -> Result<ChapterEntry, ScrapeError> {
        let Some(caps) = self.chapter_regex.captures(text) else {
            return Err(ScrapeError::content(format!(
                "chapter entry `{text}` does not read `第N章：...`"
            )));
        };
        let number = caps[1]
            .parse::<u32>()
            .map_err(|e| ScrapeError::content(format!("chapter entry `{text}`: {e}")))?;
        if number == 0 {
            return Err(ScrapeError::content(format!("chapter entry `{text}` is numbered 0")));
        }
        let url = resolve_link(&self.config.menu_url, href).ok_or_else(|| {
            ScrapeError::content(format!("chapter entry `{text}` links to `{href}`"))
        })?;

        Ok(ChapterEntry {
            number,
            description: caps[2].to_string(),
            url,
        })
    }

    /// Reads the pagination bar of a chapter's first page and lists all of its pages.
    pub fn derive_page_urls(
        &self,
        html: &str,
        chapter_url: &str,
    ) -> Result<Vec<String>, ScrapeError> {
        let document = Html::parse_document(html);
        let bar = select_first(&document, &self.config.pagination)
            .ok_or_else(|| ScrapeError::content(format!("no pagination bar on {chapter_url}")))?;
        let links = links_in(bar);

        // The explicit last-page link wins, otherwise the link before "next page".
        let last_href = match links
            .iter()
            .find(|(_, text)| *text == self.config.last_page_label)
        {
            Some((href, _)) => href,
            None if links.len() >= 2 => &links[links.len() - 2].0,
            None => {
                return Err(ScrapeError::content(format!(
                    "pagination bar on {chapter_url} has no usable last-page link"
                )));
            }
        };

        let base = Url::parse(chapter_url)
            .map_err(|e| ScrapeError::content(format!("chapter url {chapter_url}: {e}")))?;
        let last_url = resolve_link(&base, last_href).ok_or_else(|| {
            ScrapeError::content(format!("cannot resolve `{last_href}` against {chapter_url}"))
        })?;

        Ok(self.page_url_pattern.parse(&last_url)?.pages_up_to_here())
    }

    pub fn extract_question_ids(
        &self,
        html: &str,
        page_url: &str,
    ) -> Result<BTreeSet<String>, ScrapeError> {
        let document = Html::parse_document(html);
        let container = select_first(&document, &self.config.question_list)
            .ok_or_else(|| ScrapeError::content(format!("no question list on {page_url}")))?;

        let mut ids = BTreeSet::new();
        for (href, _) in links_in(container) {
            if !href.contains("/Post/") {
                continue;
            }
            let Some(caps) = self.post_regex.captures(&href) else {
                return Err(ScrapeError::content(format!(
                    "question link `{href}` on {page_url} is not `/Post/<id>.<ext>`"
                )));
            };
            ids.insert(caps[1].to_string());
        }
        Ok(ids)
    }
}
