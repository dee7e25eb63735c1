use std::collections::BTreeSet;

use crate::error::FormatError;

pub const TRUE_OPTION: &str = "对";
pub const FALSE_OPTION: &str = "错";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    TrueFalse,
    FourChoice,
}

impl QuestionKind {
    pub fn option_count(self) -> usize {
        match self {
            QuestionKind::TrueFalse => 2,
            QuestionKind::FourChoice => 4,
        }
    }
}

/// One validated exam question. Only obtainable through [`QuestionRecord::create`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionRecord {
    id: String,
    text: String,
    options: BTreeSet<String>,
    correct_option: String,
    image_reference: Option<String>,
}

impl QuestionRecord {
    pub fn create<I, S>(
        id: impl Into<String>,
        text: impl Into<String>,
        options: I,
        correct_option: impl Into<String>,
        image_reference: Option<String>,
    ) -> Result<Self, FormatError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let id = id.into();
        let text = text.into();
        let correct_option = correct_option.into();

        if id.trim().is_empty() {
            return Err(FormatError("id must not be empty".to_string()));
        }
        if text.trim().is_empty() {
            return Err(FormatError(format!("question `{id}` has empty text")));
        }

        let listed: Vec<String> = options.into_iter().map(Into::into).collect();
        if listed.iter().any(|option| option.is_empty()) {
            return Err(FormatError(format!("question `{id}` has an empty option")));
        }
        let options: BTreeSet<String> = listed.iter().cloned().collect();
        if options.len() != listed.len() {
            return Err(FormatError(format!(
                "question `{id}` has duplicate options: {listed:?}"
            )));
        }
        if options.len() != 2 && options.len() != 4 {
            return Err(FormatError(format!(
                "question `{id}` must have 2 or 4 options, got {}",
                options.len()
            )));
        }
        if !options.contains(&correct_option) {
            return Err(FormatError(format!(
                "question `{id}`: correct option `{correct_option}` is not one of {options:?}"
            )));
        }
        if image_reference.as_deref().is_some_and(|r| r.trim().is_empty()) {
            return Err(FormatError(format!(
                "question `{id}` has an empty image reference"
            )));
        }

        Ok(Self {
            id,
            text,
            options,
            correct_option,
            image_reference,
        })
    }

    /// Same question, pointing at another copy of its image.
    pub fn with_image_reference(
        &self,
        image_reference: Option<String>,
    ) -> Result<Self, FormatError> {
        Self::create(
            self.id.clone(),
            self.text.clone(),
            self.options.iter().cloned(),
            self.correct_option.clone(),
            image_reference,
        )
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn options(&self) -> &BTreeSet<String> {
        &self.options
    }

    pub fn correct_option(&self) -> &str {
        &self.correct_option
    }

    pub fn image_reference(&self) -> Option<&str> {
        self.image_reference.as_deref()
    }

    pub fn kind(&self) -> QuestionKind {
        if self.options.len() == 2 {
            QuestionKind::TrueFalse
        } else {
            QuestionKind::FourChoice
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn four_options() -> Vec<&'static str> {
        vec!["注意行人", "人行横道", "注意儿童", "学校区域"]
    }

    #[test]
    fn creates_four_choice_record() {
        let record = QuestionRecord::create(
            "c6219",
            "这个标志是何含义？",
            four_options(),
            "注意儿童",
            Some("https://x/img.jpg".to_string()),
        )
        .unwrap();

        assert_eq!(record.id(), "c6219");
        assert_eq!(record.options().len(), 4);
        assert_eq!(record.correct_option(), "注意儿童");
        assert_eq!(record.image_reference(), Some("https://x/img.jpg"));
        assert_eq!(record.kind(), QuestionKind::FourChoice);
    }

    #[test]
    fn creates_true_false_record_without_image() {
        let record = QuestionRecord::create(
            "q2",
            "驾驶机动车应当随身携带驾驶证。",
            [TRUE_OPTION, FALSE_OPTION],
            "对",
            None,
        )
        .unwrap();
        assert_eq!(record.kind(), QuestionKind::TrueFalse);
        assert!(record.image_reference().is_none());
    }

    #[test]
    fn rejects_empty_id_and_text() {
        assert!(QuestionRecord::create("", "Test?", ["A", "B"], "A", None).is_err());
        assert!(QuestionRecord::create("q3", "  ", ["A", "B"], "A", None).is_err());
    }

    #[test]
    fn rejects_bad_option_sets() {
        assert!(QuestionRecord::create("q4", "Test?", ["A"], "A", None).is_err());
        assert!(QuestionRecord::create("q4", "Test?", Vec::<String>::new(), "A", None).is_err());
        assert!(QuestionRecord::create("q4", "Test?", ["A", ""], "A", None).is_err());
        assert!(QuestionRecord::create("q4", "Test?", ["A", "B", "C"], "A", None).is_err());
        assert!(QuestionRecord::create("q4", "Test?", ["A", "A"], "A", None).is_err());
    }

    #[test]
    fn rejects_correct_option_outside_options() {
        let err = QuestionRecord::create("q5", "Test?", ["A", "B"], "C", None).unwrap_err();
        assert!(err.0.contains("not one of"));
    }

    #[test]
    fn rejects_blank_image_reference() {
        let blank = Some(String::new());
        assert!(QuestionRecord::create("q6", "Test?", ["A", "B"], "A", blank).is_err());
    }

    #[test]
    fn equality_ignores_option_order() {
        let a = QuestionRecord::create("q7", "Test?", ["A", "B", "C", "D"], "B", None).unwrap();
        let b = QuestionRecord::create("q7", "Test?", ["D", "C", "B", "A"], "B", None).unwrap();
        assert_eq!(a, b);

        let c = a.with_image_reference(Some("img/q7.webp".to_string())).unwrap();
        assert_ne!(a, c);
        assert_eq!(c.image_reference(), Some("img/q7.webp"));
    }
}
