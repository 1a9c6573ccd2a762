//! Key bindings.

/// Where keyboard focus currently is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Focus {
    /// The canvas or a non-editable element.
    #[default]
    Canvas,
    /// A text input, text area or other editable field.
    TextInput,
}

/// Returns whether `key` is one of the keys that delete the selection.
pub fn is_delete_key(key: &str) -> bool {
    matches!(key, "Delete" | "Backspace")
}

/// Returns whether a key press should delete the selected nodes.
///
/// Presses inside text inputs edit the text instead.
pub fn should_delete_selection(key: &str, focus: Focus) -> bool {
    focus == Focus::Canvas && is_delete_key(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delete_keys() {
        assert!(should_delete_selection("Delete", Focus::Canvas));
        assert!(should_delete_selection("Backspace", Focus::Canvas));
        assert!(!should_delete_selection("Enter", Focus::Canvas));
    }

    #[test]
    fn test_text_input_suppresses_deletion() {
        assert!(!should_delete_selection("Backspace", Focus::TextInput));
        assert!(!should_delete_selection("Delete", Focus::TextInput));
    }
}
