//! Output format tests.
//!
//! Every tool result is a single non-empty text item. Successful results carry
//! the image URL; failures are flagged with `is_error`.

use rmcp::model::{CallToolResult, Content, RawContent};

/// Validates that a CallToolResult has valid content format.
fn validate_tool_result(result: &CallToolResult) -> Result<(), String> {
    if result.content.len() != 1 {
        return Err(format!(
            "Expected exactly one content item, got {}",
            result.content.len()
        ));
    }

    for content in &result.content {
        validate_content(content)?;
    }

    Ok(())
}

/// Validates that a Content item is non-empty text.
fn validate_content(content: &Content) -> Result<(), String> {
    match &content.raw {
        RawContent::Text(text_content) => {
            if text_content.text.is_empty() {
                return Err("Text content should not be empty".to_string());
            }
            Ok(())
        }
        other => Err(format!("Expected text content, got {:?}", other)),
    }
}

fn text_of(result: &CallToolResult) -> &str {
    match &result.content[0].raw {
        RawContent::Text(text) => &text.text,
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image_task_mcp::server::{format_failure, format_success};
    use proptest::prelude::*;

    /// Test that Content::text helper creates valid content.
    #[test]
    fn test_content_text_helper() {
        let content = Content::text("Hello, world!");
        assert!(validate_content(&content).is_ok());
    }

    /// Test that Content::text with empty string fails validation.
    #[test]
    fn test_content_text_empty_fails() {
        let content = Content::text("");
        assert!(validate_content(&content).is_err());
    }

    /// Test that image content is not an accepted tool output.
    #[test]
    fn test_content_image_rejected() {
        let content = Content::image("base64data", "image/png");
        assert!(validate_content(&content).is_err());
    }

    /// Test the success message layout.
    #[test]
    fn test_success_message() {
        let text = format_success("A red fox", "https://cdn.test/fox.png");
        assert_eq!(
            text,
            "Image generated successfully!\n\nPrompt: A red fox\n\nImage URL: https://cdn.test/fox.png\n\nVisit our website: https://4o-image.app/"
        );
    }

    /// Test the failure message layout.
    #[test]
    fn test_failure_message() {
        assert_eq!(
            format_failure("Invalid image URL"),
            "Image generation failed: Invalid image URL"
        );
    }

    proptest! {
        /// Successful results contain the prompt and URL and are not errors.
        #[test]
        fn prop_success_output_format(
            prompt in "[a-zA-Z0-9 ]{1,40}",
            host in "[a-z]{1,12}",
        ) {
            let url = format!("https://{}.test/out.png", host);
            let result = CallToolResult::success(vec![Content::text(format_success(&prompt, &url))]);

            prop_assert!(validate_tool_result(&result).is_ok());
            prop_assert!(!result.is_error.unwrap_or(true), "Should not be marked as error");
            prop_assert!(text_of(&result).contains(&prompt));
            prop_assert!(text_of(&result).contains(&url));
        }

        /// Failed results carry the reason verbatim and are errors.
        #[test]
        fn prop_failure_output_format(reason in "[a-zA-Z0-9 ,.]{1,60}") {
            let result = CallToolResult::error(vec![Content::text(format_failure(&reason))]);

            prop_assert!(validate_tool_result(&result).is_ok());
            prop_assert_eq!(result.is_error, Some(true));
            prop_assert!(text_of(&result).ends_with(&reason));
        }
    }
}
