#![cfg(test)]

/// Format the first macro argument and assert it produces the second,
/// then re-format the output to assert the formatting is idempotent. An
/// optional third argument overrides the default width of 100.
#[macro_export]
macro_rules! assert_rewrite {
    ($input:expr, $want:expr) => {
        assert_rewrite!($input, $want, 100)
    };
    ($input:expr, $want:expr, $width:expr) => {{
        let tokens = $crate::tokenize($input).expect("tokenize input");
        let output = $crate::format_tokens(&tokens, $width).expect("format input");
        ::pretty_assertions::assert_eq!(output, $want);

        let tokens = $crate::tokenize(&output).expect("tokenize output");
        let again = $crate::format_tokens(&tokens, $width).expect("format output");
        ::pretty_assertions::assert_eq!(again, output, "non-idempotent formatting");
    }};
}
