//! Question statistics for a survey document.
//!
//! Counts every `SQ` element into a fixed set of buckets crossing
//! `QuestionType` and `Selector`. Only those two payload fields are read, so
//! statistics are available even for surveys the mapper rejects.

use serde::{Deserialize, Serialize};

use crate::models::{QuestionKind, SurveyDocument};

/// Per-bucket question counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyStatistics {
    pub total_questions: usize,
    /// Text entry with a selector outside SL/ML/ESTB/FORM.
    pub text_entry_questions: usize,
    pub text_entry_questions_single_line: usize,
    pub text_entry_questions_multi_line: usize,
    pub text_entry_questions_essay_textbox: usize,
    pub form_questions: usize,
    pub multiple_choice_questions: usize,
    pub single_choice_questions: usize,
    #[serde(rename = "NPSQuestions")]
    pub nps_questions: usize,
    pub multiple_select_box_questions: usize,
    pub matrix_likert_questions: usize,
    pub text_block_questions: usize,
    pub graphical_block_questions: usize,
}

impl SurveyStatistics {
    /// Count a question of the given kind.
    pub fn record(&mut self, kind: QuestionKind) {
        self.total_questions += 1;

        let bucket = match kind {
            QuestionKind::TextSingleLine => &mut self.text_entry_questions_single_line,
            QuestionKind::TextMultiLine => &mut self.text_entry_questions_multi_line,
            QuestionKind::TextEssay => &mut self.text_entry_questions_essay_textbox,
            QuestionKind::TextForm => &mut self.form_questions,
            QuestionKind::TextOther => &mut self.text_entry_questions,
            QuestionKind::MultipleChoice => &mut self.multiple_choice_questions,
            QuestionKind::SingleChoice => &mut self.single_choice_questions,
            QuestionKind::Nps => &mut self.nps_questions,
            QuestionKind::MultiSelectBox => &mut self.multiple_select_box_questions,
            QuestionKind::MatrixLikert => &mut self.matrix_likert_questions,
            QuestionKind::TextBlock => &mut self.text_block_questions,
            QuestionKind::GraphicBlock => &mut self.graphical_block_questions,
            QuestionKind::Other => return,
        };
        *bucket += 1;
    }

    /// Display label and count for each bucket, total first.
    pub fn buckets(&self) -> Vec<(&'static str, usize)> {
        vec![
            ("Total questions", self.total_questions),
            ("Text entry (other)", self.text_entry_questions),
            ("Text entry, single line", self.text_entry_questions_single_line),
            ("Text entry, multi line", self.text_entry_questions_multi_line),
            ("Text entry, essay box", self.text_entry_questions_essay_textbox),
            ("Form", self.form_questions),
            ("Multiple choice", self.multiple_choice_questions),
            ("Single choice", self.single_choice_questions),
            ("NPS", self.nps_questions),
            ("Multi select box", self.multiple_select_box_questions),
            ("Matrix (Likert)", self.matrix_likert_questions),
            ("Text block", self.text_block_questions),
            ("Graphic block", self.graphical_block_questions),
        ]
    }
}

/// Count the questions of a survey by type.
pub fn aggregate(survey: &SurveyDocument) -> SurveyStatistics {
    let mut stats = SurveyStatistics::default();
    for (_, element) in survey.question_elements() {
        stats.record(QuestionKind::classify(element.question_type(), element.selector()));
    }
    stats
}
