use std::path::{Path, PathBuf};

use reqwest::Url;
use scraper::Selector;
use serde::{Deserialize, de::DeserializeOwned};

use crate::error::ConfigError;

/// The env vars controlling where things are read from and written to.
#[derive(Debug, Clone, Deserialize)]
pub struct ScrapingEnv {
    #[serde(default = "default_site_config_path")]
    pub site_config_path: PathBuf,
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    #[serde(default = "default_db_image_dir")]
    pub db_image_dir: PathBuf,
    #[serde(default = "default_scrape_image_dir")]
    pub scrape_image_dir: PathBuf,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

fn default_site_config_path() -> PathBuf {
    PathBuf::from("site_config.json")
}

fn default_db_path() -> PathBuf {
    PathBuf::from("data/question_bank.json")
}

fn default_db_image_dir() -> PathBuf {
    PathBuf::from("data/images")
}

fn default_scrape_image_dir() -> PathBuf {
    PathBuf::from("data/scraped_images")
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

// Extension trait.
pub trait LoadFromEnv: DeserializeOwned {
    fn load_from_env() -> Result<Self, ConfigError> {
        // Don't throw an error if .env file doesn't exist.
        let _ = dotenv::dotenv();
        let config = envy::from_env::<Self>()?;
        Ok(config)
    }
}

impl<T: DeserializeOwned> LoadFromEnv for T {}

/// Site configuration file as written on disk.
#[derive(Debug, Deserialize)]
struct SiteConfigFile {
    menu_url: String,
    chapter_list_selector: String,
    pagination_selector: String,
    #[serde(default = "default_last_page_label")]
    last_page_label: String,
    question_list_selector: String,
    question_url_template: String,
    #[serde(default = "default_id_placeholder")]
    id_placeholder: String,
    question_container_selector: String,
    question_title_selector: String,
    #[serde(default = "default_question_text_selector")]
    question_text_selector: String,
}

fn default_last_page_label() -> String {
    "尾页".to_string()
}

fn default_id_placeholder() -> String {
    "{id}".to_string()
}

fn default_question_text_selector() -> String {
    "strong a".to_string()
}

/// Where things live on the scraped site. Validated once at startup and then
/// shared read-only by every component.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub menu_url: Url,
    pub chapter_list: Selector,
    pub pagination: Selector,
    pub last_page_label: String,
    pub question_list: Selector,
    pub question_url_template: String,
    pub id_placeholder: String,
    pub question_container: Selector,
    pub question_title: Selector,
    pub question_text: Selector,
}

impl SiteConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let file: SiteConfigFile = serde_json::from_str(json)?;
        Self::try_from(file)
    }

    pub fn question_url(&self, id: &str) -> String {
        self.question_url_template.replace(&self.id_placeholder, id)
    }
}

impl TryFrom<SiteConfigFile> for SiteConfig {
    type Error = ConfigError;

    fn try_from(file: SiteConfigFile) -> Result<Self, Self::Error> {
        let menu_url = Url::parse(&file.menu_url)
            .map_err(|e| ConfigError::Invalid(format!("menu_url `{}`: {e}", file.menu_url)))?;
        if file.id_placeholder.is_empty() {
            return Err(ConfigError::Invalid("id_placeholder is empty".to_string()));
        }
        if !file.question_url_template.contains(&file.id_placeholder) {
            return Err(ConfigError::Invalid(format!(
                "question_url_template `{}` does not contain `{}`",
                file.question_url_template, file.id_placeholder
            )));
        }

        Ok(Self {
            menu_url,
            chapter_list: parse_selector("chapter_list_selector", &file.chapter_list_selector)?,
            pagination: parse_selector("pagination_selector", &file.pagination_selector)?,
            last_page_label: file.last_page_label,
            question_list: parse_selector("question_list_selector", &file.question_list_selector)?,
            question_url_template: file.question_url_template,
            id_placeholder: file.id_placeholder,
            question_container: parse_selector(
                "question_container_selector",
                &file.question_container_selector,
            )?,
            question_title: parse_selector(
                "question_title_selector",
                &file.question_title_selector,
            )?,
            question_text: parse_selector("question_text_selector", &file.question_text_selector)?,
        })
    }
}

fn parse_selector(key: &str, raw: &str) -> Result<Selector, ConfigError> {
    Selector::parse(raw).map_err(|e| ConfigError::Invalid(format!("{key} `{raw}`: {e:?}")))
}
