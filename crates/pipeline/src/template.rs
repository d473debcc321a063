//! Prompt template resolution.
//!
//! Templates recognise exactly two placeholders, [`INPUT_PLACEHOLDER`] and
//! [`PREVIOUS_PLACEHOLDER`]. Anything else that looks like a placeholder is
//! literal text. Substitution is a single left-to-right pass, so text
//! inserted for one placeholder is never itself scanned for placeholders.

/// Replaced by the chain's original input text.
pub const INPUT_PLACEHOLDER: &str = "{input}";

/// Replaced by the previous step's output (the original input for step 1).
pub const PREVIOUS_PLACEHOLDER: &str = "{previous}";

/// Substitutes placeholders in `template`.
///
/// `previous` is `None` when no step has completed yet; `{previous}` then
/// resolves to `input`.
pub fn resolve(template: &str, input: &str, previous: Option<&str>) -> String {
    if !has_placeholders(template) {
        return template.to_string();
    }

    let previous = previous.unwrap_or(input);
    let mut resolved = String::with_capacity(template.len() + input.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        resolved.push_str(&rest[..open]);
        let tail = &rest[open..];

        if let Some(after) = tail.strip_prefix(INPUT_PLACEHOLDER) {
            resolved.push_str(input);
            rest = after;
        } else if let Some(after) = tail.strip_prefix(PREVIOUS_PLACEHOLDER) {
            resolved.push_str(previous);
            rest = after;
        } else {
            resolved.push('{');
            rest = &tail[1..];
        }
    }

    resolved.push_str(rest);
    resolved
}

/// Returns `true` if `template` contains a recognised placeholder.
pub fn has_placeholders(template: &str) -> bool {
    template.contains(INPUT_PLACEHOLDER) || template.contains(PREVIOUS_PLACEHOLDER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_input_and_previous() {
        assert_eq!(
            resolve("Analyze: {input}", "I love this product!", None),
            "Analyze: I love this product!"
        );
        assert_eq!(
            resolve("Recommend based on: {previous}", "ignored", Some("positive")),
            "Recommend based on: positive"
        );
    }

    #[test]
    fn first_step_previous_resolves_to_input() {
        for input in ["", "hello", "multi\nline {braces}"] {
            assert_eq!(
                resolve("{previous}", input, None),
                resolve("{input}", input, None)
            );
        }
    }

    #[test]
    fn templates_without_placeholders_are_unchanged() {
        for template in ["", "plain text", "{ not a token }", "{inputs} {prev}", "{{input}"] {
            if !has_placeholders(template) {
                assert_eq!(resolve(template, "x", Some("y")), template);
            }
        }
    }

    #[test]
    fn unknown_tokens_are_left_verbatim() {
        assert_eq!(
            resolve("{context} then {input} and {", "in", None),
            "{context} then in and {"
        );
    }

    #[test]
    fn every_occurrence_is_replaced() {
        assert_eq!(
            resolve("{input}/{input}/{previous}/{previous}", "a", Some("b")),
            "a/a/b/b"
        );
    }

    #[test]
    fn substituted_text_is_not_rescanned() {
        assert_eq!(
            resolve("{input} -> {previous}", "literal {previous}", Some("out")),
            "literal {previous} -> out"
        );
    }

    #[test]
    fn doubled_brace_before_token_keeps_the_extra_brace() {
        assert_eq!(resolve("{{input}}", "x", None), "{x}");
    }

    #[test]
    fn empty_input_substitutes_empty_text() {
        assert_eq!(resolve("Analyze: {input}", "", None), "Analyze: ");
    }
}
