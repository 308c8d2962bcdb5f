//! Call-site synthesis: building the replacement source text for a
//! translatable span.

/// JSON-encodes a string for embedding in generated source.
///
/// A dedicated escaper rather than runtime evaluation: the output is always
/// a double-quoted JSON string literal.
pub fn json_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Builds the translation call expression for a resolved key.
///
/// Argument layout is positional: `fn(key[, [args…]|null][, raw])`. The
/// interpolation args are emitted verbatim in their original order, since
/// the runtime consumes them by `{0}`, `{1}`, … placeholder index. When a
/// prefix or suffix survived edge splitting, the call is wrapped in a
/// template literal so the non-translatable edge text stays outside the
/// translation function.
pub fn synthesize_call(
    func: &str,
    key: &str,
    args: &[String],
    prefix: &str,
    suffix: &str,
    raw: Option<&str>,
) -> String {
    let raw_part = match raw {
        Some(raw) => format!(",{}", json_string(raw)),
        None => String::new(),
    };
    let args_part = if !args.is_empty() {
        format!(",[{}]", args.join(","))
    } else if !raw_part.is_empty() {
        ",null".to_string()
    } else {
        String::new()
    };
    let call = format!("{}({}{}{})", func, json_string(key), args_part, raw_part);
    if prefix.is_empty() && suffix.is_empty() {
        call
    } else {
        format!("`{}${{{}}}{}`", prefix, call, suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_json_string() {
        assert_eq!(json_string("你好"), "\"你好\"");
        assert_eq!(json_string("a\"b"), "\"a\\\"b\"");
        assert_eq!(json_string("a\\b"), "\"a\\\\b\"");
        assert_eq!(json_string("a\nb"), "\"a\\nb\"");
        assert_eq!(json_string("\u{1}"), "\"\\u0001\"");
    }

    #[test]
    fn test_plain_call() {
        assert_eq!(
            synthesize_call("t", "你好", &[], "", "", None),
            "t(\"你好\")"
        );
    }

    #[test]
    fn test_args_preserve_order() {
        let args = vec!["x".to_string(), "y".to_string()];
        assert_eq!(
            synthesize_call("t", "A{0}B{1}C", &args, "", "", None),
            "t(\"A{0}B{1}C\",[x,y])"
        );
    }

    #[test]
    fn test_raw_without_args_uses_null_slot() {
        assert_eq!(
            synthesize_call("t", "hello-key", &[], "", "", Some("你好")),
            "t(\"hello-key\",null,\"你好\")"
        );
    }

    #[test]
    fn test_raw_with_args() {
        let args = vec!["count".to_string()];
        assert_eq!(
            synthesize_call("t", "k", &args, "", "", Some("共{0}条")),
            "t(\"k\",[count],\"共{0}条\")"
        );
    }

    #[test]
    fn test_prefix_suffix_wrap() {
        assert_eq!(
            synthesize_call("t", "你好", &[], " ", "\n", None),
            "` ${t(\"你好\")}\n`"
        );
    }
}
