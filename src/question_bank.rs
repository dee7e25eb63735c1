use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use crate::{error::BankError, question_record::QuestionRecord};

/// Chapters and their questions, as scraped or loaded from disk.
///
/// Every question belongs to exactly one chapter. Not thread-safe; the
/// orchestrator is the only writer while a scrape is running.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionBank {
    image_dir: PathBuf,
    chapters: BTreeMap<u32, String>,
    chapter_to_ids: BTreeMap<u32, BTreeSet<String>>,
    questions: HashMap<String, QuestionRecord>,
    // reverse index, keeps duplicate checks O(1)
    id_to_chapter: HashMap<String, u32>,
}

impl QuestionBank {
    pub fn new(image_dir: impl Into<PathBuf>) -> Self {
        Self {
            image_dir: image_dir.into(),
            chapters: BTreeMap::new(),
            chapter_to_ids: BTreeMap::new(),
            questions: HashMap::new(),
            id_to_chapter: HashMap::new(),
        }
    }

    pub fn image_dir(&self) -> &Path {
        &self.image_dir
    }

    pub fn add_chapter(
        &mut self,
        number: u32,
        description: impl Into<String>,
    ) -> Result<(), BankError> {
        if self.chapters.contains_key(&number) {
            return Err(BankError::DuplicateChapter(number));
        }
        self.chapters.insert(number, description.into());
        self.chapter_to_ids.insert(number, BTreeSet::new());
        Ok(())
    }

    pub fn add_question(
        &mut self,
        record: QuestionRecord,
        chapter_number: u32,
    ) -> Result<(), BankError> {
        let Some(ids) = self.chapter_to_ids.get_mut(&chapter_number) else {
            return Err(BankError::UnknownChapter(chapter_number));
        };
        if let Some(&chapter) = self.id_to_chapter.get(record.id()) {
            return Err(BankError::DuplicateQuestion {
                id: record.id().to_string(),
                chapter,
            });
        }

        let id = record.id().to_string();
        ids.insert(id.clone());
        self.id_to_chapter.insert(id.clone(), chapter_number);
        self.questions.insert(id, record);
        Ok(())
    }

    pub fn get_question(&self, id: &str) -> Result<&QuestionRecord, BankError> {
        self.questions
            .get(id)
            .ok_or_else(|| BankError::QuestionNotFound(id.to_string()))
    }

    pub fn get_ids_for_chapter(&self, number: u32) -> Result<&BTreeSet<String>, BankError> {
        self.chapter_to_ids
            .get(&number)
            .ok_or(BankError::ChapterNotFound(number))
    }

    pub fn describe_chapter(&self, number: u32) -> Result<&str, BankError> {
        self.chapters
            .get(&number)
            .map(String::as_str)
            .ok_or(BankError::ChapterNotFound(number))
    }

    pub fn all_chapter_numbers(&self) -> Vec<u32> {
        self.chapters.keys().copied().collect()
    }

    pub fn count(&self, chapter_number: Option<u32>) -> Result<usize, BankError> {
        match chapter_number {
            None => Ok(self.questions.len()),
            Some(number) => self
                .chapter_to_ids
                .get(&number)
                .map(BTreeSet::len)
                .ok_or(BankError::UnknownChapter(number)),
        }
    }

    pub fn contains_question(&self, id: &str) -> bool {
        self.questions.contains_key(id)
    }

    pub fn chapter_of(&self, id: &str) -> Option<u32> {
        self.id_to_chapter.get(id).copied()
    }

    /// True when no chapter has been added. A bank with empty chapters is not empty.
    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: &str, answer: &str) -> QuestionRecord {
        QuestionRecord::create(id, format!("{id}?"), [answer, "错"], answer, None).unwrap()
    }

    #[test]
    fn add_chapter_then_describe() {
        let mut qb = QuestionBank::new("img/");
        qb.add_chapter(1, "道路交通安全法律、法规和规章").unwrap();
        assert_eq!(qb.describe_chapter(1).unwrap(), "道路交通安全法律、法规和规章");
        assert!(qb.get_ids_for_chapter(1).unwrap().is_empty());
    }

    #[test]
    fn add_chapter_duplicate_fails() {
        let mut qb = QuestionBank::new("img/");
        qb.add_chapter(1, "Chapter 1").unwrap();
        assert_eq!(qb.add_chapter(1, "Again"), Err(BankError::DuplicateChapter(1)));
        assert_eq!(qb.describe_chapter(1).unwrap(), "Chapter 1");
    }

    #[test]
    fn add_question_requires_chapter() {
        let mut qb = QuestionBank::new("img/");
        assert_eq!(
            qb.add_question(question("Q1", "对"), 99),
            Err(BankError::UnknownChapter(99))
        );
        assert!(!qb.contains_question("Q1"));
    }

    #[test]
    fn add_and_get_question() {
        let mut qb = QuestionBank::new("img/");
        qb.add_chapter(1, "Chapter 1").unwrap();
        let q = question("Q1", "对");
        qb.add_question(q.clone(), 1).unwrap();

        assert_eq!(qb.get_question("Q1").unwrap(), &q);
        assert_eq!(qb.chapter_of("Q1"), Some(1));
        assert_eq!(
            qb.get_question("QX"),
            Err(BankError::QuestionNotFound("QX".to_string()))
        );
    }

    #[test]
    fn same_id_in_second_chapter_is_rejected() {
        let mut qb = QuestionBank::new("img/");
        qb.add_chapter(1, "Chapter 1").unwrap();
        qb.add_chapter(2, "Chapter 2").unwrap();
        qb.add_question(question("Q1", "对"), 1).unwrap();

        assert_eq!(
            qb.add_question(question("Q1", "对"), 2),
            Err(BankError::DuplicateQuestion {
                id: "Q1".to_string(),
                chapter: 1
            })
        );
        assert_eq!(qb.count(Some(2)).unwrap(), 0);
    }

    #[test]
    fn ids_for_chapter() {
        let mut qb = QuestionBank::new("img/");
        qb.add_chapter(1, "Chapter 1").unwrap();
        qb.add_question(question("Q1", "对"), 1).unwrap();
        qb.add_question(question("Q2", "对"), 1).unwrap();

        let ids: Vec<_> = qb.get_ids_for_chapter(1).unwrap().iter().cloned().collect();
        assert_eq!(ids, vec!["Q1", "Q2"]);
        assert_eq!(qb.get_ids_for_chapter(99), Err(BankError::ChapterNotFound(99)));
        assert_eq!(qb.describe_chapter(99), Err(BankError::ChapterNotFound(99)));
    }

    #[test]
    fn chapter_numbers_are_ascending() {
        let mut qb = QuestionBank::new("img/");
        qb.add_chapter(7, "Chapter 7").unwrap();
        qb.add_chapter(1, "Chapter 1").unwrap();
        qb.add_chapter(3, "Chapter 3").unwrap();
        assert_eq!(qb.all_chapter_numbers(), vec![1, 3, 7]);
    }

    #[test]
    fn counts_total_and_per_chapter() {
        let mut qb = QuestionBank::new("img/");
        qb.add_chapter(1, "Chapter 1").unwrap();
        qb.add_chapter(2, "Chapter 2").unwrap();
        qb.add_question(question("Q1", "对"), 1).unwrap();
        qb.add_question(question("Q2", "对"), 2).unwrap();
        qb.add_question(question("Q3", "对"), 2).unwrap();

        assert_eq!(qb.count(None).unwrap(), 3);
        assert_eq!(qb.count(Some(2)).unwrap(), 2);
        assert_eq!(qb.count(Some(99)), Err(BankError::UnknownChapter(99)));
    }

    #[test]
    fn keeps_image_dir() {
        let qb = QuestionBank::new("/tmp/images");
        assert_eq!(qb.image_dir(), Path::new("/tmp/images"));
        assert!(qb.is_empty());
    }

    #[test]
    fn bank_with_only_empty_chapters_is_not_empty() {
        let mut qb = QuestionBank::new("img/");
        assert!(qb.is_empty());
        qb.add_chapter(1, "Chapter 1").unwrap();
        assert!(!qb.is_empty());
        assert_eq!(qb.count(None).unwrap(), 0);
    }
}
