use super::*;

/// Border color applied to required fields left empty.
pub const INVALID_BORDER_COLOR: &str = "#f44336";
pub const REQUIRED_FIELD_SELECTOR: &str = "[required]";

const BORDER_COLOR: &str = "border-color";

/// Checks that every `[required]` field of the form with id `form_id` holds a
/// non-blank value.
///
/// Each required field is visited exactly once: blank ones get a red
/// border, the others get their border-color override cleared, so marks
/// from an earlier failed attempt go away. A missing form counts as invalid
/// and the page is left untouched. A required element that carries no form
/// value at all is treated as blank.
pub fn validate_form(doc: &mut dyn Document, form_id: &str) -> bool {
    let Some(form) = doc.element_by_id(form_id) else {
        return false;
    };

    let required = Selector::attribute("required");
    let mut is_valid = true;
    for field in doc.query_selector_all(Some(form), &required) {
        let filled = doc
            .value(field)
            .is_some_and(|value| !trim_js_whitespace(&value).is_empty());
        if filled {
            doc.set_style_property(field, BORDER_COLOR, "");
        } else {
            is_valid = false;
            doc.set_style_property(field, BORDER_COLOR, INVALID_BORDER_COLOR);
        }
    }
    is_valid
}

fn trim_js_whitespace(value: &str) -> &str {
    value.trim_matches(is_js_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trim_strips_unicode_spaces_and_bom() {
        assert_eq!(trim_js_whitespace("\u{FEFF}\u{00A0} x \u{3000}\n"), "x");
        assert_eq!(trim_js_whitespace("\u{FEFF}\t"), "");
    }

    #[test]
    fn next_line_is_not_trimmed() {
        assert!(!is_js_whitespace('\u{85}'));
        assert!(is_js_whitespace('\u{2028}'));
        assert!(is_js_whitespace('\u{FEFF}'));
        assert_eq!(trim_js_whitespace(" \u{85} "), "\u{85}");
    }

    #[test]
    fn required_selector_constant_matches_built_selector() -> Result<()> {
        assert_eq!(
            Selector::parse(REQUIRED_FIELD_SELECTOR)?,
            Selector::attribute("required")
        );
        Ok(())
    }
}
