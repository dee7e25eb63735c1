use log::{error, info, warn};

use crate::{
    config::SiteConfig,
    content_extractor::ContentExtractor,
    error::ScrapeError,
    id_discoverer::IdDiscoverer,
    question_bank::QuestionBank,
    requests::PageSource,
};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScrapeSummary {
    pub chapters: usize,
    pub scraped: usize,
    pub skipped: usize,
}

/// Runs discovery, then extracts every listed question into a bank.
///
/// Discovery errors abort the run. A question that fails to extract is
/// logged and skipped so the rest of its chapter still gets scraped.
pub struct ScrapeOrchestrator<'a, S> {
    source: &'a S,
    config: &'a SiteConfig,
}

impl<'a, S: PageSource> ScrapeOrchestrator<'a, S> {
    pub fn new(source: &'a S, config: &'a SiteConfig) -> Self {
        Self { source, config }
    }

    pub async fn fill_question_bank(
        &self,
        bank: &mut QuestionBank,
    ) -> Result<ScrapeSummary, ScrapeError> {
        info!("Starting to scrape question ids");
        let mut discoverer = IdDiscoverer::new(self.source, self.config)?;
        discoverer.discover().await?;
        let chapter_to_ids = discoverer.get_chapter_to_ids().await?;

        let extractor = ContentExtractor::new(self.source, self.config, bank.image_dir())?;
        let mut summary = ScrapeSummary::default();

        for chapter in discoverer.chapters()? {
            let Some(ids) = chapter_to_ids.get(&chapter.number) else {
                continue;
            };
            info!(
                "Adding chapter {}: {} with {} questions",
                chapter.number,
                chapter.description,
                ids.len()
            );
            bank.add_chapter(chapter.number, chapter.description.clone())?;
            summary.chapters += 1;

            for id in ids {
                if let Some(owner) = bank.chapter_of(id) {
                    warn!(
                        "Question {} is listed under chapter {} but already belongs to chapter {}, \
                         skipping",
                        id, chapter.number, owner
                    );
                    summary.skipped += 1;
                    continue;
                }

                let record = match extractor.extract(id).await {
                    Ok(record) => record,
                    Err(e) => {
                        error!("Error scraping question {}: {}", id, e);
                        summary.skipped += 1;
                        continue;
                    }
                };
                match bank.add_question(record, chapter.number) {
                    Ok(()) => summary.scraped += 1,
                    Err(e) => {
                        error!("Error adding question {}: {}", id, e);
                        summary.skipped += 1;
                    }
                }
            }

            info!(
                "Completed chapter {} with {} questions",
                chapter.number,
                bank.count(Some(chapter.number))?
            );
        }

        info!(
            "Scraped {} questions in {} chapters, skipped {}",
            summary.scraped, summary.chapters, summary.skipped
        );
        Ok(summary)
    }
}
