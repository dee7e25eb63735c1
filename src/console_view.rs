use std::fmt::Write;
use std::io::{self, BufRead};

use crate::{error::BankError, question_bank::QuestionBank, question_record::QuestionRecord};

pub fn render_chapter_list(bank: &QuestionBank) -> String {
    let mut out = String::new();
    for number in bank.all_chapter_numbers() {
        let description = bank.describe_chapter(number).unwrap_or_default();
        let count = bank.count(Some(number)).unwrap_or_default();
        let _ = writeln!(out, "Chapter {number}: {description} ({count} questions)");
    }
    if out.is_empty() {
        out.push_str("The question bank is empty.\n");
    }
    out
}

/// Question text, image path if any, then one `- option` line per option.
pub fn render_question(record: &QuestionRecord, reveal_answer: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "[{}] {}", record.id(), record.text());
    if let Some(image) = record.image_reference() {
        let _ = writeln!(out, "Image path: {image}");
    }
    for option in record.options() {
        let _ = writeln!(out, "- {option}");
    }
    if reveal_answer {
        out.push_str(&render_answer(record));
    }
    out
}

pub fn render_answer(record: &QuestionRecord) -> String {
    format!("Answer: {}\n", record.correct_option())
}

/// Shows one question at a time and reveals its answer only on request.
///
/// `a` reveals the answer, `q` stops, anything else moves on. Returns how
/// many answers were revealed.
pub fn run_quiz<'b, I, R, W>(
    bank: &QuestionBank,
    ids: I,
    mut input: R,
    mut output: W,
) -> Result<usize, BankError>
where
    I: IntoIterator<Item = &'b String>,
    R: BufRead,
    W: io::Write,
{
    let mut revealed = 0;
    for id in ids {
        let record = bank.get_question(id)?;
        let _ = write!(
            output,
            "\n{}Type (a) to view the answer, (q) to stop, anything else to skip: ",
            render_question(record, false)
        );
        let _ = output.flush();

        let mut choice = String::new();
        if input.read_line(&mut choice).unwrap_or(0) == 0 {
            break;
        }
        match choice.trim().to_lowercase().as_str() {
            "a" => {
                let _ = write!(output, "{}", render_answer(record));
                revealed += 1;
            }
            "q" => break,
            _ => {}
        }
    }
    Ok(revealed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::question_record::{FALSE_OPTION, TRUE_OPTION};

    #[test]
    fn lists_chapters_in_order_with_counts() {
        let mut bank = QuestionBank::new("img");
        bank.add_chapter(2, "道路交通信号").unwrap();
        bank.add_chapter(1, "道路通行条件").unwrap();
        bank.add_question(
            QuestionRecord::create(
                "q1",
                "Is it safe?",
                [TRUE_OPTION, FALSE_OPTION],
                FALSE_OPTION,
                None,
            )
            .unwrap(),
            2,
        )
        .unwrap();

        assert_eq!(
            render_chapter_list(&bank),
            "Chapter 1: 道路通行条件 (0 questions)\nChapter 2: 道路交通信号 (1 questions)\n"
        );
    }

    #[test]
    fn empty_bank_says_so() {
        assert_eq!(
            render_chapter_list(&QuestionBank::new("img")),
            "The question bank is empty.\n"
        );
    }

    #[test]
    fn answer_only_shown_when_revealed() {
        let record = QuestionRecord::create(
            "abc",
            "Which sign?",
            ["stop", "go", "yield", "turn"],
            "yield",
            Some("img/abc.webp".to_string()),
        )
        .unwrap();

        let hidden = render_question(&record, false);
        assert!(hidden.starts_with("[abc] Which sign?\nImage path: img/abc.webp\n"));
        assert!(hidden.contains("- yield\n"));
        assert!(!hidden.contains("Answer:"));

        let shown = render_question(&record, true);
        assert!(shown.ends_with("Answer: yield\n"));
        assert_eq!(shown, hidden + &render_answer(&record));
    }

    #[test]
    fn quiz_reveals_only_requested_answers() {
        let mut bank = QuestionBank::new("img");
        bank.add_chapter(1, "道路通行条件").unwrap();
        for (id, answer) in [("q1", TRUE_OPTION), ("q2", FALSE_OPTION), ("q3", TRUE_OPTION)] {
            let record =
                QuestionRecord::create(id, "Safe?", [TRUE_OPTION, FALSE_OPTION], answer, None)
                    .unwrap();
            bank.add_question(record, 1).unwrap();
        }
        let ids = bank.get_ids_for_chapter(1).unwrap();

        let mut output = Vec::new();
        let revealed = run_quiz(&bank, ids, "\na\nq\n".as_bytes(), &mut output).unwrap();
        let output = String::from_utf8(output).unwrap();

        assert_eq!(revealed, 1);
        assert!(output.contains("[q1] Safe?"));
        assert!(output.contains("[q2] Safe?"));
        assert_eq!(output.matches("Answer: ").count(), 1);
        assert!(output.contains("Answer: 错\n"));
        assert!(output.ends_with(
            "[q3] Safe?\n- 对\n- 错\nType (a) to view the answer, (q) to stop, anything else to skip: "
        ));
    }
}
