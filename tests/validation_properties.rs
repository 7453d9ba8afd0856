use linkvault::utils::validation::{is_valid_url, validate_title, validate_url_format};
use proptest::prelude::*;

proptest! {
    // 去除空白后非空的标题都应通过
    #[test]
    fn nonempty_trimmed_titles_pass(title in "[a-zA-Z0-9][a-zA-Z0-9 .,!-]{0,80}") {
        prop_assume!(!title.trim().is_empty());
        prop_assert!(validate_title(&title).is_ok());
    }

    // 纯空白标题都应被拒绝
    #[test]
    fn whitespace_only_titles_fail(title in "[ \t\n]{0,20}") {
        prop_assert!(validate_title(&title).is_err());
    }

    // 带scheme和host的绝对URL都应通过
    #[test]
    fn absolute_urls_with_host_pass(
        host in "[a-z]{1,12}(\\.[a-z]{2,8}){1,2}",
        path in "(/[a-z0-9]{0,8}){0,3}",
    ) {
        let url = format!("https://{}{}", host, path);
        prop_assert!(is_valid_url(&url));
        prop_assert!(validate_url_format(&url).is_ok());
    }

    // 缺少scheme的输入都应被拒绝
    #[test]
    fn schemeless_inputs_fail(input in "[a-z0-9.-]{1,40}") {
        prop_assert!(!is_valid_url(&input));
    }
}
