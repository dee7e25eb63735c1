use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::{
    content_extractor::IMAGE_EXTENSION,
    error::{BankError, StoreError},
    question_bank::QuestionBank,
    question_record::QuestionRecord,
};

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredBank {
    #[serde(default)]
    chapters: BTreeMap<u32, String>,
    #[serde(default)]
    chapter_to_ids: BTreeMap<u32, Vec<String>>,
    #[serde(default)]
    questions: BTreeMap<String, StoredQuestion>,
    #[serde(default)]
    image_dir: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredQuestion {
    id: String,
    text: String,
    options: Vec<String>,
    correct_option: String,
    image_path: Option<String>,
}

/// Keeps a question bank in one JSON file, with images copied next to it.
pub struct LocalJsonStore {
    db_file_path: PathBuf,
    image_dir: PathBuf,
}

impl LocalJsonStore {
    pub fn new(db_file_path: impl Into<PathBuf>, image_dir: impl Into<PathBuf>) -> Self {
        Self {
            db_file_path: db_file_path.into(),
            image_dir: image_dir.into(),
        }
    }

    pub fn db_file_path(&self) -> &Path {
        &self.db_file_path
    }

    pub fn image_dir(&self) -> &Path {
        &self.image_dir
    }

    /// Where a question's image lives once stored.
    pub fn image_path_for(&self, id: &str) -> PathBuf {
        self.image_dir.join(format!("{id}.{IMAGE_EXTENSION}"))
    }

    pub fn save(&self, bank: &QuestionBank) -> Result<(), StoreError> {
        self.copy_images(bank)?;
        let stored = self.serialize_question_bank(bank)?;

        let parent = self.db_file_path.parent();
        if let Some(parent) = parent.filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(&stored)?;
        fs::write(&self.db_file_path, json).map_err(|source| StoreError::Io {
            path: self.db_file_path.clone(),
            source,
        })?;

        info!(
            "Saved {} chapters and {} questions to {}",
            stored.chapters.len(),
            stored.questions.len(),
            self.db_file_path.display()
        );
        Ok(())
    }

    pub fn load(&self) -> Result<QuestionBank, StoreError> {
        if !self.db_file_path.exists() {
            return Err(StoreError::NotFound(self.db_file_path.clone()));
        }
        let json = fs::read_to_string(&self.db_file_path).map_err(|source| StoreError::Io {
            path: self.db_file_path.clone(),
            source,
        })?;
        let stored: StoredBank = serde_json::from_str(&json)?;
        self.deserialize_question_bank(stored)
    }

    fn serialize_question_bank(&self, bank: &QuestionBank) -> Result<StoredBank, StoreError> {
        let mut stored = StoredBank {
            image_dir: self.image_dir.to_string_lossy().into_owned(),
            ..StoredBank::default()
        };

        for number in bank.all_chapter_numbers() {
            stored
                .chapters
                .insert(number, bank.describe_chapter(number)?.to_string());
            let ids = bank.get_ids_for_chapter(number)?;
            stored
                .chapter_to_ids
                .insert(number, ids.iter().cloned().collect());

            for id in ids {
                let question = bank.get_question(id)?;
                let image_path = question
                    .image_reference()
                    .map(|_| self.image_path_for(id).to_string_lossy().into_owned());
                stored.questions.insert(
                    id.clone(),
                    StoredQuestion {
                        id: question.id().to_string(),
                        text: question.text().to_string(),
                        options: question.options().iter().cloned().collect(),
                        correct_option: question.correct_option().to_string(),
                        image_path,
                    },
                );
            }
        }
        Ok(stored)
    }

    fn deserialize_question_bank(
        &self,
        mut stored: StoredBank,
    ) -> Result<QuestionBank, StoreError> {
        let mut bank = QuestionBank::new(self.image_dir.clone());

        for (number, description) in &stored.chapters {
            bank.add_chapter(*number, description.clone())?;
        }

        for (number, ids) in &stored.chapter_to_ids {
            for id in ids {
                if let Some(chapter) = bank.chapter_of(id) {
                    return Err(BankError::DuplicateQuestion {
                        id: id.clone(),
                        chapter,
                    }
                    .into());
                }
                let Some(question) = stored.questions.remove(id) else {
                    return Err(StoreError::MissingQuestion(id.clone()));
                };
                let record = QuestionRecord::create(
                    question.id,
                    question.text,
                    question.options,
                    question.correct_option,
                    question.image_path,
                )?;
                bank.add_question(record, *number)?;
            }
        }

        for orphan in stored.questions.keys() {
            warn!("Question {} is not listed under any chapter, ignoring it", orphan);
        }
        Ok(bank)
    }

    /// Copies every image that exists on disk into the store's image directory.
    fn copy_images(&self, bank: &QuestionBank) -> Result<(), StoreError> {
        for number in bank.all_chapter_numbers() {
            for id in bank.get_ids_for_chapter(number)? {
                let question = bank.get_question(id)?;
                let Some(current) = question.image_reference().map(Path::new) else {
                    continue;
                };
                let target = self.image_path_for(id);
                if !current.exists() {
                    warn!("Image {} for question {} is missing", current.display(), id);
                    continue;
                }
                if current == target {
                    continue;
                }

                fs::create_dir_all(&self.image_dir).map_err(|source| StoreError::Io {
                    path: self.image_dir.clone(),
                    source,
                })?;
                fs::copy(current, &target).map_err(|source| StoreError::Io {
                    path: target.clone(),
                    source,
                })?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_path_uses_fixed_extension() {
        let store = LocalJsonStore::new("db/data.json", "/custom/path");
        assert_eq!(
            store.image_path_for("test123"),
            PathBuf::from("/custom/path/test123.webp")
        );
    }

    #[test]
    fn serializes_expected_shape() {
        let store = LocalJsonStore::new("db/data.json", "db/images");
        let mut bank = QuestionBank::new("scraped");
        bank.add_chapter(2, "Chapter 2").unwrap();
        bank.add_question(
            QuestionRecord::create("test1", "Question?", ["A", "B"], "A", None).unwrap(),
            2,
        )
        .unwrap();

        let stored = store.serialize_question_bank(&bank).unwrap();
        let value = serde_json::to_value(&stored).unwrap();
        assert_eq!(value["chapters"]["2"], "Chapter 2");
        assert_eq!(value["chapter_to_ids"]["2"][0], "test1");
        assert_eq!(value["questions"]["test1"]["correct_option"], "A");
        assert!(value["questions"]["test1"]["image_path"].is_null());
        assert_eq!(value["image_dir"], "db/images");
    }

    #[test]
    fn missing_record_is_reported() {
        let store = LocalJsonStore::new("db/data.json", "db/images");
        let stored: StoredBank = serde_json::from_str(
            r#"{"chapters": {"1": "Chapter 1"}, "chapter_to_ids": {"1": ["ghost"]}, "questions": {}}"#,
        )
        .unwrap();
        assert!(matches!(
            store.deserialize_question_bank(stored),
            Err(StoreError::MissingQuestion(id)) if id == "ghost"
        ));
    }

    #[test]
    fn id_listed_twice_is_a_duplicate() {
        let store = LocalJsonStore::new("db/data.json", "db/images");
        let stored: StoredBank = serde_json::from_str(
            r#"{
                "chapters": {"1": "Chapter 1", "2": "Chapter 2"},
                "chapter_to_ids": {"1": ["q1"], "2": ["q1"]},
                "questions": {"q1": {"id": "q1", "text": "Q?", "options": ["A", "B"],
                    "correct_option": "A", "image_path": null}}
            }"#,
        )
        .unwrap();
        assert!(matches!(
            store.deserialize_question_bank(stored),
            Err(StoreError::Bank(BankError::DuplicateQuestion { id, chapter: 1 })) if id == "q1"
        ));
    }
}
