//! Field-level sanitizers.
//!
//! Every function here is total: given any JSON value (or none at all) it
//! returns an in-range value, preferring a default over rejection. Nothing in
//! this module allocates state or logs.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

lazy_static! {
    static ref HEX_COLOR: Regex =
        Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("hex color pattern");
    static ref FUNCTIONAL_COLOR: Regex = Regex::new(
        r"(?i)^(?:rgba?|hsla?)\(\s*[-+]?(?:\d+(?:\.\d*)?|\.\d+)%?\s*,\s*[-+]?(?:\d+(?:\.\d*)?|\.\d+)%?\s*,\s*[-+]?(?:\d+(?:\.\d*)?|\.\d+)%?\s*(?:,\s*[-+]?(?:\d+(?:\.\d*)?|\.\d+)%?\s*)?\)$"
    )
    .expect("functional color pattern");
    static ref UNSUPPORTED_COLOR: Regex =
        Regex::new(r"(?i)\b(?:ok)?(?:lab|lch)\s*\(|\bcolor\s*\(").expect("unsupported color pattern");
    static ref EMBEDDED_HEX: Regex =
        Regex::new(r"#(?:[0-9a-fA-F]{6}|[0-9a-fA-F]{3})\b").expect("embedded hex pattern");
}

/// The keyword accepted wherever a color may also be transparent.
pub const TRANSPARENT: &str = "transparent";

/// Parse a JSON value as a finite number.
///
/// Numbers and numeric strings are accepted; everything else, including
/// `NaN` and infinities spelled as strings, is not.
#[must_use]
pub fn parse_number(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    parsed.is_finite().then_some(parsed)
}

/// Parse `value` as a number, fall back to `default`, then clamp to `[lo, hi]`.
#[must_use]
pub fn number_in_range(value: Option<&Value>, lo: f64, hi: f64, default: f64) -> f64 {
    parse_number(value).unwrap_or(default).clamp(lo, hi)
}

/// Parse `value` as a number, fall back to `default`, then raise to at least `min`.
#[must_use]
pub fn number_at_least(value: Option<&Value>, min: f64, default: f64) -> f64 {
    parse_number(value).unwrap_or(default).max(min)
}

/// Parse `value` as a strictly positive number, or use `default`.
#[must_use]
pub fn positive_number(value: Option<&Value>, default: f64) -> f64 {
    parse_number(value)
        .filter(|n| *n > 0.0)
        .unwrap_or(default)
}

/// Parse `value` as an integer (fraction truncated), saturating to `i32`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn integer(value: Option<&Value>, default: i32) -> i32 {
    parse_number(value).map_or(default, |n| {
        n.trunc().clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32
    })
}

/// Return the keyword `value` names if it is one of the allowed values.
#[must_use]
pub fn keyword<T>(value: Option<&Value>, lookup: impl Fn(&str) -> Option<T>, default: T) -> T {
    value
        .and_then(Value::as_str)
        .and_then(lookup)
        .unwrap_or(default)
}

/// Like [`keyword`] but `null` (or absence) is itself a valid answer.
#[must_use]
pub fn optional_keyword<T>(value: Option<&Value>, lookup: impl Fn(&str) -> Option<T>) -> Option<T> {
    value.and_then(Value::as_str).and_then(lookup)
}

/// Coerce a value to a boolean.
///
/// Booleans pass through; `"true"`/`"false"` strings and `1`/`0` numbers are
/// understood; everything else is `default`.
#[must_use]
pub fn boolean(value: Option<&Value>, default: bool) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => match s.trim() {
            "true" => true,
            "false" => false,
            _ => default,
        },
        Some(Value::Number(n)) => n.as_f64().map_or(default, |n| n != 0.0),
        _ => default,
    }
}

/// Coerce a value to a string. Numbers are rendered; other types use `default`.
#[must_use]
pub fn string(value: Option<&Value>, default: &str) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => default.to_string(),
    }
}

/// Whether `text` uses a color function renderers and exporters may not
/// support (`lab()`, `lch()`, `oklab()`, `oklch()`, `color()`), anywhere in it.
#[must_use]
pub fn is_unsupported_color_function(text: &str) -> bool {
    UNSUPPORTED_COLOR.is_match(text)
}

/// Whether `text` is exactly a supported color literal.
#[must_use]
pub fn is_color_literal(text: &str) -> bool {
    HEX_COLOR.is_match(text) || FUNCTIONAL_COLOR.is_match(text)
}

/// Sanitize a color.
///
/// Accepts 3/6-digit hex and `rgb()/rgba()/hsl()/hsla()` with three or four
/// numeric/percentage arguments. Otherwise the first embedded hex color is
/// extracted. Input mentioning an unsupported color function yields `None`
/// even if it also embeds a hex color.
#[must_use]
pub fn color(value: Option<&Value>) -> Option<String> {
    let text = value?.as_str()?.trim();
    if text.is_empty() || is_unsupported_color_function(text) {
        return None;
    }
    if is_color_literal(text) {
        return Some(text.to_string());
    }
    EMBEDDED_HEX.find(text).map(|m| m.as_str().to_string())
}

/// Sanitize a color, substituting `default` when it cannot be salvaged.
#[must_use]
pub fn color_or(value: Option<&Value>, default: &str) -> String {
    color(value).unwrap_or_else(|| default.to_string())
}

/// Sanitize a color that may also be the `transparent` keyword.
#[must_use]
pub fn color_or_transparent(value: Option<&Value>, default: &str) -> String {
    if let Some(text) = value.and_then(Value::as_str) {
        if text.trim().eq_ignore_ascii_case(TRANSPARENT) {
            return TRANSPARENT.to_string();
        }
    }
    color_or(value, default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn v(value: Value) -> Option<Value> {
        Some(value)
    }

    #[test]
    fn test_number_in_range_clamps_and_defaults() {
        assert!((number_in_range(v(json!(5)).as_ref(), 0.0, 1.0, 0.5) - 1.0).abs() < f64::EPSILON);
        assert!((number_in_range(v(json!(-5)).as_ref(), 0.0, 1.0, 0.5)).abs() < f64::EPSILON);
        assert!((number_in_range(v(json!("0.25")).as_ref(), 0.0, 1.0, 0.5) - 0.25).abs() < f64::EPSILON);
        assert!((number_in_range(v(json!("abc")).as_ref(), 0.0, 1.0, 0.5) - 0.5).abs() < f64::EPSILON);
        assert!((number_in_range(v(json!("NaN")).as_ref(), 0.0, 1.0, 0.5) - 0.5).abs() < f64::EPSILON);
        assert!((number_in_range(v(json!("inf")).as_ref(), 0.0, 1.0, 0.5) - 0.5).abs() < f64::EPSILON);
        assert!((number_in_range(None, 0.0, 1.0, 0.5) - 0.5).abs() < f64::EPSILON);
        assert!((number_in_range(v(json!(true)).as_ref(), 0.0, 1.0, 0.5) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_positive_number_rejects_zero_and_negative() {
        assert!((positive_number(v(json!(0)).as_ref(), 600.0) - 600.0).abs() < f64::EPSILON);
        assert!((positive_number(v(json!(-3)).as_ref(), 600.0) - 600.0).abs() < f64::EPSILON);
        assert!((positive_number(v(json!(800)).as_ref(), 600.0) - 800.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_integer_truncates_and_saturates() {
        assert_eq!(integer(v(json!(3.9)).as_ref(), 0), 3);
        assert_eq!(integer(v(json!(-3.9)).as_ref(), 0), -3);
        assert_eq!(integer(v(json!(1e20)).as_ref(), 0), i32::MAX);
        assert_eq!(integer(v(json!("x")).as_ref(), 7), 7);
    }

    #[test]
    fn test_keyword_and_boolean() {
        use crate::element::FontWeight;
        assert_eq!(
            keyword(v(json!("bold")).as_ref(), FontWeight::from_keyword, FontWeight::Normal),
            FontWeight::Bold
        );
        assert_eq!(
            keyword(v(json!("heavy")).as_ref(), FontWeight::from_keyword, FontWeight::Normal),
            FontWeight::Normal
        );
        assert!(boolean(v(json!("true")).as_ref(), false));
        assert!(boolean(v(json!(1)).as_ref(), false));
        assert!(!boolean(v(json!({})).as_ref(), false));
    }

    #[test]
    fn test_color_accepts_supported_syntax() {
        for ok in [
            "#fff",
            "#A1B2C3",
            "rgb(255, 0, 0)",
            "rgba(0,0,0,0.5)",
            "hsl(120, 50%, 50%)",
            "HSLA(120, 50%, 50%, .3)",
        ] {
            assert_eq!(color(v(json!(ok)).as_ref()).as_deref(), Some(ok), "{ok}");
        }
    }

    #[test]
    fn test_color_extracts_embedded_hex() {
        assert_eq!(
            color(v(json!("color: #abcdef;")).as_ref()).as_deref(),
            Some("#abcdef")
        );
        assert_eq!(color(v(json!("red #f00 please")).as_ref()).as_deref(), Some("#f00"));
        assert_eq!(color(v(json!("#abcd")).as_ref()), None);
        assert_eq!(color(v(json!("rgb(1,2)")).as_ref()), None);
        assert_eq!(color(v(json!(12)).as_ref()), None);
    }

    #[test]
    fn test_color_rejects_modern_functions_even_when_embedded() {
        assert_eq!(color(v(json!("oklab(0.5 0.1 0.1)")).as_ref()), None);
        assert_eq!(color(v(json!("lch(50% 30 120)")).as_ref()), None);
        assert_eq!(color(v(json!("color(display-p3 1 0 0)")).as_ref()), None);
        assert_eq!(color(v(json!("#fff lab(1 2 3)")).as_ref()), None);
        assert!(is_unsupported_color_function("OKLCH(0.7 0.1 200)"));
        assert!(!is_unsupported_color_function("#ffffff"));
    }

    #[test]
    fn test_color_or_transparent() {
        assert_eq!(color_or_transparent(v(json!("Transparent")).as_ref(), "#000000"), "transparent");
        assert_eq!(color_or_transparent(v(json!("bogus")).as_ref(), "transparent"), "transparent");
        assert_eq!(color_or_transparent(v(json!("#123")).as_ref(), "transparent"), "#123");
    }

    fn arb_value() -> impl Strategy<Value = Option<Value>> {
        prop_oneof![
            Just(None),
            Just(Some(Value::Null)),
            any::<f64>().prop_map(|n| Some(json!(n))),
            any::<i64>().prop_map(|n| Some(json!(n))),
            ".*".prop_map(|s| Some(json!(s))),
            any::<f64>().prop_map(|n| Some(json!(n.to_string()))),
            Just(Some(json!("not a number"))),
            Just(Some(json!("NaN"))),
            Just(Some(json!([1, 2]))),
        ]
    }

    proptest! {
        #[test]
        fn prop_number_in_range_is_total(
            value in arb_value(),
            lo in -1000.0f64..1000.0,
            span in 0.0f64..1000.0,
            default in -5000.0f64..5000.0,
        ) {
            let hi = lo + span;
            let out = number_in_range(value.as_ref(), lo, hi, default);
            prop_assert!(out.is_finite());
            prop_assert!(out >= lo && out <= hi, "{} not in [{}, {}]", out, lo, hi);
        }

        #[test]
        fn prop_color_output_is_a_literal(text in ".*") {
            let value = json!(text);
            if let Some(out) = color(Some(&value)) {
                prop_assert!(is_color_literal(&out));
                prop_assert_eq!(color(Some(&json!(out.clone()))), Some(out));
            }
        }
    }
}
