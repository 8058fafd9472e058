use super::error::AppError;

/// Trimmed value of a mandatory field; blank answers 400 "<field> is required".
pub fn required_text(value: &str, field: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(AppError::InvalidRequest(format!("{} is required", field)))
    } else {
        Ok(trimmed.to_string())
    }
}

/// Trimmed optional field, blank collapses to `None`.
pub fn optional_text(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

/// Escapes regex metacharacters so user input matches literally in a `$regex`.
pub fn escape_regex(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if "\\^$.|?*+()[]{}".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_text_trims_and_rejects_blank() {
        assert_eq!(required_text("  Placement drive ", "Title").unwrap(), "Placement drive");
        match required_text(" \t", "Title") {
            Err(AppError::InvalidRequest(msg)) => assert_eq!(msg, "Title is required"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn blank_optionals_become_none() {
        assert_eq!(optional_text(Some("   ")), None);
        assert_eq!(optional_text(None), None);
        assert_eq!(optional_text(Some(" 3 months ")), Some("3 months".to_string()));
    }

    #[test]
    fn punctuation_is_matched_literally() {
        assert_eq!(escape_regex("AT&T"), "AT&T");
        assert_eq!(escape_regex("C++ Labs"), "C\\+\\+ Labs");
        assert_eq!(escape_regex("Yahoo!"), "Yahoo!");
        assert_eq!(escape_regex("a.b (c)"), "a\\.b \\(c\\)");
    }
}
