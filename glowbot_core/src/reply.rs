//! Parsing of raw model output into structured results.
//!
//! The composer's final-answer prompt asks the model to append one machine
//! line of classification variables. Channel adapters must never scan
//! display text for control signals, so this module is the single place
//! that splits a raw completion into user-visible text plus
//! [`ClassificationFlags`].

use once_cell::sync::Lazy;
use regex::Regex;

use crate::state::ClassificationFlags;

/// Marker naming the machine line inside a completion.
pub const CLASSIFICATION_MARKER: &str = "query_classification_variables";

#[allow(clippy::unwrap_used)]
static IRRELEVANT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"is_client_question_irrelevant_to_context=(\d)").unwrap());

#[allow(clippy::unwrap_used)]
static HUMAN_SUPPORT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"does_client_asks_human_support=(\d)").unwrap());

/// A composer result: display text with the machine line stripped, plus
/// the decoded signals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedReply {
    pub text: String,
    pub flags: ClassificationFlags,
}

/// Split a raw completion into display text and classification flags.
///
/// A completion without the marker line parses as the full text with both
/// flags unset; a malformed marker line is dropped from the text but
/// contributes only the variables it actually carries.
#[must_use]
pub fn parse_composed_reply(raw: &str) -> ComposedReply {
    let mut flags = ClassificationFlags::default();
    let mut kept_lines: Vec<&str> = Vec::new();

    for line in raw.lines() {
        if line.contains(CLASSIFICATION_MARKER) {
            if let Some(cap) = IRRELEVANT_RE.captures(line) {
                flags.irrelevant = &cap[1] == "1";
            }
            if let Some(cap) = HUMAN_SUPPORT_RE.captures(line) {
                flags.wants_operator = &cap[1] == "1";
            }
        } else {
            kept_lines.push(line);
        }
    }

    ComposedReply {
        text: kept_lines.join("\n").trim().to_string(),
        flags,
    }
}

/// Extract the first balanced `{...}` substring, the shape the profile
/// extractor asks the model to answer in. Brace depth is tracked so text
/// around and after the object is tolerated; braces inside JSON strings
/// are ignored.
#[must_use]
pub fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let mut depth = 0_usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in raw[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&raw[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn reply_without_marker_keeps_text_and_default_flags() {
        let parsed = parse_composed_reply("Рада помочь! Чистка лица длится час.");
        assert_eq!(parsed.text, "Рада помочь! Чистка лица длится час.");
        assert!(!parsed.flags.irrelevant);
        assert!(!parsed.flags.wants_operator);
    }

    #[test]
    fn marker_line_is_stripped_and_decoded() {
        let raw = "Соединяю вас с администратором.\n\
                   query_classification_variables is_client_question_irrelevant_to_context=0 does_client_asks_human_support=1";
        let parsed = parse_composed_reply(raw);
        assert_eq!(parsed.text, "Соединяю вас с администратором.");
        assert!(!parsed.flags.irrelevant);
        assert!(parsed.flags.wants_operator);
    }

    #[test]
    fn irrelevant_flag_is_decoded() {
        let raw = "Я отвечаю только на вопросы о салоне.\n\
                   query_classification_variables is_client_question_irrelevant_to_context=1 does_client_asks_human_support=0";
        let parsed = parse_composed_reply(raw);
        assert!(parsed.flags.irrelevant);
        assert!(!parsed.flags.wants_operator);
    }

    #[test]
    fn malformed_marker_line_is_still_stripped() {
        let raw = "Ответ.\nquery_classification_variables мусор";
        let parsed = parse_composed_reply(raw);
        assert_eq!(parsed.text, "Ответ.");
        assert_eq!(parsed.flags, ClassificationFlags::default());
    }

    #[test]
    fn json_object_is_extracted_from_prose() {
        let raw = "Вот ответ:\n{\"response\": \"Приятно познакомиться, Анна!\", \"client_name\": \"Анна\"}\nКонец.";
        let json = extract_json_object(raw).unwrap();
        let value: serde_json::Value = serde_json::from_str(json).unwrap();
        assert_eq!(value["client_name"], "Анна");
    }

    #[test]
    fn nested_and_string_braces_do_not_confuse_extraction() {
        let raw = r#"{"response": "скобки {вот такие}", "extra": {"a": 1}} хвост"#;
        let json = extract_json_object(raw).unwrap();
        assert!(json.ends_with('}'));
        let value: serde_json::Value = serde_json::from_str(json).unwrap();
        assert_eq!(value["extra"]["a"], 1);
    }

    #[test]
    fn missing_object_yields_none() {
        assert!(extract_json_object("просто текст").is_none());
        assert!(extract_json_object("незакрытая {скобка").is_none());
    }
}
