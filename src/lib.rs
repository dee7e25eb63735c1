mod config;
mod console_view;
mod content_extractor;
mod error;
mod id_discoverer;
mod local_json_store;
mod orchestrator;
mod question_bank;
mod question_record;
mod requests;
mod scraping_context;
mod text_manipulators;

pub mod logger;

pub use config::{LoadFromEnv, ScrapingEnv, SiteConfig};
pub use console_view::{render_answer, render_chapter_list, render_question, run_quiz};
pub use content_extractor::{ContentExtractor, ExtractedOptions, Fragment, IMAGE_EXTENSION};
pub use error::{BankError, ConfigError, FormatError, ScrapeError, StoreError};
pub use id_discoverer::{ChapterEntry, DiscoveredChapter, IdDiscoverer, PageUrl, PageUrlPattern};
pub use local_json_store::LocalJsonStore;
pub use orchestrator::{ScrapeOrchestrator, ScrapeSummary};
pub use question_bank::QuestionBank;
pub use question_record::{FALSE_OPTION, QuestionKind, QuestionRecord, TRUE_OPTION};
pub use requests::{PageSource, RequestClient};
pub use scraping_context::ScrapingContext;
