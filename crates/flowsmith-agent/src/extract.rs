//! JSON object extraction from free-form model output.
//!
//! Models frequently wrap the document in prose or markdown fences.
//! [`extract_json_object`] finds the first `{` and scans forward to its
//! matching `}`, tracking string literals and escapes so braces inside
//! values such as `"{{$json.subject}}"` do not end the scan early.

/// Return the first balanced `{...}` substring of `text`.
///
/// `None` if there is no `{` at all or the object never closes.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + ch.len_utf8();
                    return Some(&text[start..end]);
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_wrapped_in_prose() {
        let text = r#"Here is your workflow: {"name":"X","nodes":[]} Thanks!"#;
        assert_eq!(extract_json_object(text), Some(r#"{"name":"X","nodes":[]}"#));
    }

    #[test]
    fn nested_objects_and_fences() {
        let text = "```json\n{\"a\":{\"b\":{}},\"c\":1}\n```\nand {\"later\":true}";
        assert_eq!(extract_json_object(text), Some("{\"a\":{\"b\":{}},\"c\":1}"));
    }

    #[test]
    fn braces_inside_strings_are_ignored() {
        let text = r#"{"text":"New email: {{$json.subject}}","close":"}"} trailing }"#;
        assert_eq!(
            extract_json_object(text),
            Some(r#"{"text":"New email: {{$json.subject}}","close":"}"}"#)
        );
    }

    #[test]
    fn escaped_quotes_keep_string_open() {
        let text = r#"{"q":"say \"}\" now"}"#;
        assert_eq!(extract_json_object(text), Some(text));
    }

    #[test]
    fn no_brace_or_unbalanced() {
        assert_eq!(extract_json_object("I cannot help with that."), None);
        assert_eq!(extract_json_object(r#"{"name":"cut off"#), None);
        assert_eq!(extract_json_object(""), None);
    }

    #[test]
    fn multibyte_text_before_object() {
        let text = "Voilà → {\"name\":\"é\"}";
        assert_eq!(extract_json_object(text), Some("{\"name\":\"é\"}"));
    }
}
