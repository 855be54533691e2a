//! Input parameter validation tests.
//!
//! Malformed tool arguments must be rejected before anything is submitted to
//! the remote API, and well-formed ones must decode to the same request the
//! client sent.

#[cfg(test)]
mod tests {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use image_task_mcp::server::{GenerateImageToolParams, decode_image_base64};
    use proptest::prelude::*;
    use serde_json::json;

    /// Test that a prompt-only call deserializes.
    #[test]
    fn test_prompt_only_params() {
        let params: GenerateImageToolParams =
            serde_json::from_value(json!({ "prompt": "A cat" })).unwrap();
        assert_eq!(params.prompt, "A cat");
        assert!(params.image_base64.is_none());
    }

    /// Test that the image field uses its camelCase name.
    #[test]
    fn test_image_field_name() {
        let params: GenerateImageToolParams = serde_json::from_value(json!({
            "prompt": "make it blue",
            "imageBase64": "SlBFRw=="
        }))
        .unwrap();
        assert_eq!(params.image_base64.as_deref(), Some("SlBFRw=="));
    }

    /// Test that a missing prompt is rejected.
    #[test]
    fn test_missing_prompt_rejected() {
        let result = serde_json::from_value::<GenerateImageToolParams>(json!({
            "imageBase64": "SlBFRw=="
        }));
        assert!(result.is_err(), "Should reject params without a prompt");
    }

    /// Test that a non-string prompt is rejected.
    #[test]
    fn test_wrong_prompt_type_rejected() {
        let result = serde_json::from_value::<GenerateImageToolParams>(json!({ "prompt": 42 }));
        assert!(result.is_err(), "Should reject a numeric prompt");
    }

    /// Test that invalid base64 is reported as a validation error.
    #[test]
    fn test_invalid_base64_rejected() {
        let err = decode_image_base64("***").unwrap_err();
        assert!(err.to_string().starts_with("Validation error"));
    }

    /// Test that data URLs of any image type are accepted.
    #[test]
    fn test_data_url_prefixes() {
        for mime in ["png", "jpeg", "webp", "gif"] {
            let encoded = format!("data:image/{};base64,SlBFRw==", mime);
            assert_eq!(decode_image_base64(&encoded).unwrap(), b"JPEG");
        }
    }

    proptest! {
        /// Any byte string survives encoding with or without a data URL prefix.
        #[test]
        fn prop_decode_recovers_bytes(
            bytes in prop::collection::vec(any::<u8>(), 1..256),
            with_prefix in any::<bool>(),
        ) {
            let encoded = STANDARD.encode(&bytes);
            let input = if with_prefix {
                format!("data:image/jpeg;base64,{}", encoded)
            } else {
                encoded
            };
            prop_assert_eq!(decode_image_base64(&input).unwrap(), bytes);
        }

        /// Any prompt string deserializes verbatim.
        #[test]
        fn prop_prompt_is_preserved(prompt in ".{0,64}") {
            let params: GenerateImageToolParams =
                serde_json::from_value(json!({ "prompt": prompt.clone() })).unwrap();
            prop_assert_eq!(params.prompt, prompt);
        }
    }
}
