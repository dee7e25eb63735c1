use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::debug;
use regex::Regex;
use reqwest::Url;
use scraper::Html;

use crate::{
    config::SiteConfig,
    error::ScrapeError,
    question_record::{FALSE_OPTION, QuestionKind, QuestionRecord, TRUE_OPTION},
    requests::PageSource,
    text_manipulators::{
        extract_raw, extract_text, find_element, resolve_link, select_first, select_first_in,
        unescape_markup,
    },
};

/// Images are always stored under this extension, whatever the site served.
pub const IMAGE_EXTENSION: &str = "webp";

/// `X、text<br>`, where the whole option may be wrapped in bold.
///
/// Gaps are written `(?:\s|&nbsp;)*` since the markup is scanned after
/// serialization, which turns U+00A0 back into `&nbsp;`.
const OPTION_PATTERN: &str = concat!(
    r"(?:<(?:b|strong)>(?:\s|&nbsp;)*)?",
    r"([A-D])、(?:\s|&nbsp;)*([^<]*?)(?:\s|&nbsp;)*",
    r"(?:</(?:b|strong)>(?:\s|&nbsp;)*)?<br\s*/?>",
);
/// The underlined value right after `答案：`. Inline wrappers in between are tolerated.
const ANSWER_PATTERN: &str = concat!(
    r"答案：(?:\s|&nbsp;)*",
    r"(?:<(?:b|strong|span|font)[^>]*>(?:\s|&nbsp;)*)*",
    r"<u>(?:\s|&nbsp;)*([^<\s&]+)(?:\s|&nbsp;)*</u>",
);

/// The narrowed markup of one question, plus the page it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    url: String,
    raw: String,
}

impl Fragment {
    pub fn new(url: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            raw: raw.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    fn document(&self) -> Html {
        Html::parse_fragment(&self.raw)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractedOptions {
    TrueFalse,
    /// Option text keyed by its letter, always exactly A..=D.
    FourChoice(BTreeMap<char, String>),
}

impl ExtractedOptions {
    pub fn kind(&self) -> QuestionKind {
        match self {
            ExtractedOptions::TrueFalse => QuestionKind::TrueFalse,
            ExtractedOptions::FourChoice(_) => QuestionKind::FourChoice,
        }
    }

    pub fn texts(&self) -> Vec<String> {
        match self {
            ExtractedOptions::TrueFalse => vec![TRUE_OPTION.to_string(), FALSE_OPTION.to_string()],
            ExtractedOptions::FourChoice(by_letter) => by_letter.values().cloned().collect(),
        }
    }
}

pub struct ContentExtractor<'a, S> {
    source: &'a S,
    config: &'a SiteConfig,
    image_dir: PathBuf,
    option_pattern: Regex,
    answer_pattern: Regex,
}

impl<'a, S: PageSource> ContentExtractor<'a, S> {
    pub fn new(
        source: &'a S,
        config: &'a SiteConfig,
        image_dir: impl Into<PathBuf>,
    ) -> Result<Self, ScrapeError> {
        Ok(Self {
            source,
            config,
            image_dir: image_dir.into(),
            option_pattern: Regex::new(OPTION_PATTERN)?,
            answer_pattern: Regex::new(ANSWER_PATTERN)?,
        })
    }

    /// Scrapes one question. Only `Connection` and `ContentFormat` errors
    /// ever come out of here.
    pub async fn extract(&self, id: &str) -> Result<QuestionRecord, ScrapeError> {
        match self.try_extract(id).await {
            Ok(record) => Ok(record),
            Err(e @ (ScrapeError::Connection { .. } | ScrapeError::ContentFormat(_))) => Err(e),
            Err(other) => Err(ScrapeError::content(format!("question `{id}`: {other}"))),
        }
    }

    async fn try_extract(&self, id: &str) -> Result<QuestionRecord, ScrapeError> {
        let fragment = self.fetch_fragment(id).await?;

        let text = self.extract_text(&fragment)?;
        let image_url = self.extract_image_reference(&fragment);
        let options = self.extract_options(&fragment)?;
        let correct_option = self.extract_correct_answer(&fragment, &options)?;

        // Validate before downloading anything.
        let record = QuestionRecord::create(
            id,
            text,
            options.texts(),
            correct_option,
            image_url.clone(),
        )
        .map_err(|e| ScrapeError::content(e.to_string()))?;

        let record = match image_url {
            Some(image_url) => {
                let path = self.materialize_image(id, &image_url, &self.image_dir).await?;
                record
                    .with_image_reference(Some(path.to_string_lossy().into_owned()))
                    .map_err(|e| ScrapeError::content(e.to_string()))?
            }
            None => record,
        };

        debug!(
            "Extracted question {} ({:?}, image: {})",
            id,
            record.kind(),
            record.image_reference().unwrap_or("none")
        );
        Ok(record)
    }

    pub async fn fetch_fragment(&self, id: &str) -> Result<Fragment, ScrapeError> {
        let url = self.config.question_url(id);
        let html = self.source.fetch_text(&url).await?;
        let document = Html::parse_document(&html);

        let container = select_first(&document, &self.config.question_container)
            .ok_or_else(|| ScrapeError::content(format!("no question container on {url}")))?;
        let title = select_first_in(container, &self.config.question_title)
            .ok_or_else(|| ScrapeError::content(format!("no question title on {url}")))?;

        let raw = extract_raw(title);
        Ok(Fragment::new(url, raw))
    }

    pub fn extract_text(&self, fragment: &Fragment) -> Result<String, ScrapeError> {
        let document = fragment.document();
        let text = select_first(&document, &self.config.question_text)
            .map(|node| extract_text(node).trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| {
                ScrapeError::content(format!(
                    "no question text in fragment from {}",
                    fragment.url()
                ))
            })?;
        Ok(text)
    }

    /// The underlined answer marker, if any.
    fn scan_answer_marker<'f>(&self, fragment: &'f Fragment) -> Option<&'f str> {
        self.answer_pattern
            .captures(fragment.raw())
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    pub fn classify(&self, fragment: &Fragment) -> QuestionKind {
        match self.scan_answer_marker(fragment) {
            Some(TRUE_OPTION) | Some(FALSE_OPTION) => QuestionKind::TrueFalse,
            _ => QuestionKind::FourChoice,
        }
    }

    pub fn extract_options(&self, fragment: &Fragment) -> Result<ExtractedOptions, ScrapeError> {
        if self.classify(fragment) == QuestionKind::TrueFalse {
            return Ok(ExtractedOptions::TrueFalse);
        }

        let matches: Vec<(char, String)> = self
            .option_pattern
            .captures_iter(fragment.raw())
            .filter_map(|caps| {
                let letter = caps.get(1)?.as_str().chars().next()?;
                let text = unescape_markup(caps.get(2)?.as_str()).trim().to_string();
                Some((letter, text))
            })
            .collect();

        if matches.len() != 4 {
            return Err(ScrapeError::content(format!(
                "expected 4 options in fragment from {}, found {}",
                fragment.url(),
                matches.len()
            )));
        }

        let by_letter: BTreeMap<char, String> = matches.into_iter().collect();
        if by_letter.keys().copied().ne(['A', 'B', 'C', 'D']) {
            return Err(ScrapeError::content(format!(
                "option letters in fragment from {} are {:?}, expected A-D",
                fragment.url(),
                by_letter.keys().collect::<Vec<_>>()
            )));
        }
        Ok(ExtractedOptions::FourChoice(by_letter))
    }

    pub fn extract_correct_answer(
        &self,
        fragment: &Fragment,
        options: &ExtractedOptions,
    ) -> Result<String, ScrapeError> {
        let marker = self.scan_answer_marker(fragment).ok_or_else(|| {
            ScrapeError::content(format!("no answer marker in fragment from {}", fragment.url()))
        })?;

        match options {
            ExtractedOptions::TrueFalse => match marker {
                TRUE_OPTION | FALSE_OPTION => Ok(marker.to_string()),
                other => Err(ScrapeError::content(format!(
                    "true/false answer `{other}` in fragment from {}",
                    fragment.url()
                ))),
            },
            ExtractedOptions::FourChoice(by_letter) => {
                let mut chars = marker.chars();
                let letter = match (chars.next(), chars.next()) {
                    (Some(letter), None) => letter,
                    _ => {
                        return Err(ScrapeError::content(format!(
                            "answer `{marker}` is not a letter in fragment from {}",
                            fragment.url()
                        )));
                    }
                };
                by_letter.get(&letter).cloned().ok_or_else(|| {
                    ScrapeError::content(format!(
                        "answer letter {letter} is not among the options in fragment from {}",
                        fragment.url()
                    ))
                })
            }
        }
    }

    /// Absolute URL of the illustrating image, if the fragment has one.
    pub fn extract_image_reference(&self, fragment: &Fragment) -> Option<String> {
        let document = fragment.document();
        let src = find_element(document.root_element(), "img")?
            .value()
            .attr("src")?
            .trim();
        if src.is_empty() {
            return None;
        }
        let resolved = Url::parse(fragment.url())
            .ok()
            .and_then(|base| resolve_link(&base, src))
            .unwrap_or_else(|| src.to_string());
        Some(resolved)
    }

    pub async fn materialize_image(
        &self,
        id: &str,
        image_url: &str,
        target_dir: &Path,
    ) -> Result<PathBuf, ScrapeError> {
        let bytes = self.source.fetch_bytes(image_url).await?;

        let path = target_dir.join(format!("{id}.{IMAGE_EXTENSION}"));
        tokio::fs::create_dir_all(target_dir).await.map_err(|e| {
            ScrapeError::content(format!("cannot create {}: {e}", target_dir.display()))
        })?;
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| ScrapeError::content(format!("cannot write {}: {e}", path.display())))?;

        debug!("Saved image for {} to {}", id, path.display());
        Ok(path)
    }
}
