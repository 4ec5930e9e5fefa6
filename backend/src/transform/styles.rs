//! Style builders: one function per supported question style.
//!
//! Each builder reads a parsed QSF question payload and returns the flow
//! `detail` for it. Labels are written under the survey's source language.
//!
//! Option and statement keys reuse the display text of the choice, not the
//! source choice id. Two choices with the same display text share a key.

use crate::models::{
    ChoiceOption, DetailExtra, LocalizedText, QuestionDetail, QuestionPayload, QuestionStyle,
    Statement,
};

/// Highest point of the Net Promoter Score scale.
pub const NPS_MAX: u8 = 10;

/// Label of the "0" end of the NPS scale.
const NPS_LOW_DESCRIPTION: [(&str, &str); 16] = [
    ("IR", "من توصیه نمی کنم"),
    ("IT", "Non lo consiglio"),
    ("AR", "أنا لا أوصي"),
    ("ZH-HANS", "我不推荐"),
    ("JA", "私はお勧めしません"),
    ("ES-ES", "No lo recomendaría"),
    ("KO", "나는 추천하지 않는다"),
    ("EN", "I would not recommend"),
    ("SQ", "Une nuk do te rekomandoja"),
    ("SR", "Ne bih preporučio"),
    ("RU", "Я не рекомендую"),
    ("FR-CA", "Je ne recommanderais pas"),
    ("TR", "Tavsiye etmem"),
    ("ES", "No lo recomiendo"),
    ("FR", "Je ne recommanderais pas"),
    ("DE", "Ich empfehle nicht"),
];

/// Label of the "10" end of the NPS scale.
const NPS_HIGH_DESCRIPTION: [(&str, &str); 16] = [
    ("IR", "ن توصیه میکنم"),
    ("IT", "Io consiglio"),
    ("AR", "أنا أوصي"),
    ("ZH-HANS", "我建议"),
    ("JA", "私はアドバイスします"),
    ("ES-ES", "Yo aconsejo"),
    ("KO", "나는 충고한"),
    ("EN", "I would recommend"),
    ("SQ", "Une do te rekomandoja"),
    ("SR", "Preporučio bih"),
    ("RU", "Я советую"),
    ("FR-CA", "Je recommande"),
    ("TR", "Tavsiye ederim"),
    ("ES", "Yo aconsejo"),
    ("FR", "Je recommande"),
    ("DE", "Ich rate"),
];

/// Detractor / passive / promoter banding.
pub fn nps_weight(score: u8) -> i32 {
    match score {
        0..=6 => -1,
        7..=8 => 0,
        _ => 1,
    }
}

/// Text entry (`TE` + `SL`/`ML`/`ESTB`).
pub fn text_question(question: &QuestionPayload, language: &str) -> QuestionDetail {
    let style = match question.selector.as_str() {
        "ML" | "ESTB" => QuestionStyle::Textarea,
        _ => QuestionStyle::Text,
    };

    let mut detail = QuestionDetail::new(style, &question.question_id, body(question, language));
    detail.required = question.is_required();
    detail.extra = DetailExtra {
        spam_filter_on: Some(true),
        ..DetailExtra::default()
    };
    detail
}

/// Single answer choice (`MC` + `SAHR`/`SACOL`).
pub fn radio_question(question: &QuestionPayload, language: &str) -> QuestionDetail {
    let options = question
        .choices
        .values()
        .enumerate()
        .map(|(order, choice)| {
            let mut option = ChoiceOption::new(
                &choice.display,
                LocalizedText::single(language, &choice.display),
                order,
                0,
            );
            option.text_entry = Some(choice.text_entry);
            option
        })
        .collect();

    let mut detail = QuestionDetail::new(QuestionStyle::Radio, &question.question_id, body(question, language));
    detail.extra = DetailExtra {
        layout: Some("horizontal".to_string()),
        ..DetailExtra::default()
    };
    detail.options = Some(options);
    detail
}

/// Net Promoter Score (`MC` + `NPS`).
///
/// The scale is always 0..=10 with fixed weights and endpoint labels; the
/// source question's own answers are not read.
pub fn nps_question(question: &QuestionPayload, language: &str) -> QuestionDetail {
    let options = (0..=NPS_MAX)
        .map(|score| {
            let label = score.to_string();
            let mut option = ChoiceOption::new(
                &label,
                LocalizedText::single("EN", &label),
                usize::from(score),
                nps_weight(score),
            );
            option.default_body = Some(label);
            option.description = match score {
                0 => Some(NPS_LOW_DESCRIPTION.into_iter().collect()),
                NPS_MAX => Some(NPS_HIGH_DESCRIPTION.into_iter().collect()),
                _ => None,
            };
            option
        })
        .collect();

    let mut detail = QuestionDetail::new(QuestionStyle::Score, &question.question_id, body(question, language));
    detail.weight = Some(1);
    detail.extra = DetailExtra {
        has_static_options: Some(true),
        ..DetailExtra::default()
    };
    detail.options = Some(options);
    detail
}

/// Likert matrix (`Matrix` + `Likert`).
///
/// `Answers` are the scale columns, `Choices` the statements. Every statement
/// repeats the answer scale in its own `options`, keyed by the statement.
pub fn matrix_question(question: &QuestionPayload, language: &str) -> QuestionDetail {
    let scale = question.choices.len();

    let answer_options = |key: &str| -> Vec<ChoiceOption> {
        question
            .answers
            .values()
            .enumerate()
            .map(|(order, answer)| {
                ChoiceOption::new(key, LocalizedText::single(language, &answer.display), order, 0)
            })
            .collect()
    };

    let options = question
        .answers
        .values()
        .enumerate()
        .map(|(order, answer)| {
            ChoiceOption::new(
                &answer.display,
                LocalizedText::single(language, &answer.display),
                order,
                0,
            )
        })
        .collect();

    let statements = question
        .choices
        .values()
        .enumerate()
        .map(|(order, choice)| Statement {
            body: LocalizedText::single(language, &choice.display),
            key: choice.display.clone(),
            tag: format!("tag-{}", order),
            order,
            style: "plain".to_string(),
            scale,
            options: answer_options(&choice.display),
        })
        .collect();

    let mut detail = QuestionDetail::new(QuestionStyle::Matrix, &question.question_id, body(question, language));
    detail.extra = DetailExtra {
        layout: Some("horizontal".to_string()),
        spam_filter_on: Some(true),
        matrix_answer_type: Some("single".to_string()),
        matrix_question_type: Some("positivity".to_string()),
        ..DetailExtra::default()
    };
    detail.options = Some(options);
    detail.statements = Some(statements);
    detail.scale = Some(scale);
    detail
}

/// Label of the terminal submit element.
///
/// The fixed translations take precedence over the source language entry.
pub fn submit_label(language: &str) -> LocalizedText {
    LocalizedText::single(language, "Submit")
        .with("FR-CA", "Envoyer")
        .with("ES-ES", "Enviar")
        .with("ES", "Enviar")
}

fn body(question: &QuestionPayload, language: &str) -> LocalizedText {
    LocalizedText::single(language, &question.question_text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    fn payload(value: serde_json::Value) -> QuestionPayload {
        QuestionPayload::deserialize(&value).unwrap()
    }

    #[test]
    fn test_text_styles() {
        let single = payload(json!({ "QuestionID": "QID1", "QuestionType": "TE", "Selector": "SL", "QuestionText": "Name?" }));
        let essay = payload(json!({ "QuestionID": "QID2", "QuestionType": "TE", "Selector": "ESTB" }));
        let multi = payload(json!({ "QuestionID": "QID3", "QuestionType": "TE", "Selector": "ML" }));

        let detail = text_question(&single, "EN");
        assert_eq!(detail.style, QuestionStyle::Text);
        assert_eq!(detail.body.get("EN"), Some("Name?"));
        assert_eq!(detail.key, "QID1");
        assert_eq!(detail.extra.spam_filter_on, Some(true));
        assert!(!detail.required);

        assert_eq!(text_question(&essay, "EN").style, QuestionStyle::Textarea);
        assert_eq!(text_question(&multi, "EN").style, QuestionStyle::Textarea);
    }

    #[test]
    fn test_radio_options_follow_choice_id_order() {
        let q = payload(json!({
            "QuestionID": "QID5",
            "QuestionType": "MC",
            "Selector": "SAHR",
            "QuestionText": "Pick one",
            "Choices": {
                "3": { "Display": "Blue" },
                "1": { "Display": "Red" },
                "2": { "Display": "Other", "TextEntry": "on" }
            }
        }));

        let detail = radio_question(&q, "FR");
        let options = detail.options.unwrap();
        let keys: Vec<&str> = options.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["Red", "Other", "Blue"]);
        assert_eq!(options[2].order, 2);
        assert_eq!(options[0].body.get("FR"), Some("Red"));
        assert_eq!(options[1].text_entry, Some(true));
        assert_eq!(options[2].text_entry, Some(false));
        assert_eq!(detail.extra.layout.as_deref(), Some("horizontal"));
    }

    #[test]
    fn test_nps_weights() {
        let q = payload(json!({
            "QuestionID": "QID9",
            "QuestionType": "MC",
            "Selector": "NPS",
            "Choices": { "1": { "Display": "ignored" } }
        }));

        let detail = nps_question(&q, "EN");
        let options = detail.options.unwrap();
        let weights: Vec<i32> = options.iter().map(|o| o.weight).collect();
        assert_eq!(weights, vec![-1, -1, -1, -1, -1, -1, -1, 0, 0, 1, 1]);

        let keys: Vec<&str> = options.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["0", "1", "2", "3", "4", "5", "6", "7", "8", "9", "10"]);
        assert_eq!(detail.weight, Some(1));
        assert_eq!(detail.extra.has_static_options, Some(true));
    }

    #[test]
    fn test_nps_descriptions_only_on_endpoints() {
        let q = payload(json!({ "QuestionID": "QID9", "QuestionType": "MC", "Selector": "NPS" }));
        let options = nps_question(&q, "EN").options.unwrap();

        let low = options[0].description.as_ref().unwrap();
        assert_eq!(low.len(), 16);
        assert_eq!(low.get("EN"), Some("I would not recommend"));
        assert_eq!(options[10].description.as_ref().unwrap().get("TR"), Some("Tavsiye ederim"));
        assert!(options[1..10].iter().all(|o| o.description.is_none()));
        assert_eq!(options[4].default_body.as_deref(), Some("4"));
        assert_eq!(options[4].body.get("EN"), Some("4"));
    }

    #[test]
    fn test_matrix_shape() {
        let q = payload(json!({
            "QuestionID": "QID12",
            "QuestionType": "Matrix",
            "Selector": "Likert",
            "QuestionText": "Rate",
            "Choices": {
                "1": { "Display": "Speed" },
                "2": { "Display": "Price" },
                "3": { "Display": "Support" }
            },
            "Answers": {
                "1": { "Display": "Bad" },
                "2": { "Display": "Good" }
            }
        }));

        let detail = matrix_question(&q, "EN");
        assert_eq!(detail.scale, Some(3));

        let options = detail.options.unwrap();
        assert_eq!(options.len(), 2);
        assert_eq!(options[1].key, "Good");

        let statements = detail.statements.unwrap();
        assert_eq!(statements.len(), 3);
        assert_eq!(statements[2].key, "Support");
        assert_eq!(statements[2].tag, "tag-2");
        assert_eq!(statements[2].scale, 3);
        for statement in &statements {
            assert_eq!(statement.options.len(), 2);
            assert_eq!(statement.options[1].body.get("EN"), Some("Good"));
            assert_eq!(statement.options[1].key, statement.key);
        }
        assert_eq!(detail.extra.matrix_question_type.as_deref(), Some("positivity"));
    }

    #[test]
    fn test_submit_label() {
        let label = submit_label("ES");
        assert_eq!(label.len(), 3);
        assert_eq!(label.get("ES"), Some("Enviar"));
        assert_eq!(label.get("FR-CA"), Some("Envoyer"));

        let english = submit_label("EN");
        assert_eq!(english.len(), 4);
        assert_eq!(english.get("EN"), Some("Submit"));
    }
}
