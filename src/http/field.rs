//! Header field name casing.

/// Converts a hyphenated field name to its wire capitalization.
///
/// Every `-`-separated word gets an upper-case first letter and lower-case
/// remainder. Only ASCII letters are touched, so the result never depends on
/// the process locale.
///
/// ```
/// # use homespun::http::field::pascal_kebab_case;
/// assert_eq!(pascal_kebab_case("content-type"), "Content-Type");
/// assert_eq!(pascal_kebab_case("X-FORWARDED-FOR"), "X-Forwarded-For");
/// ```
pub fn pascal_kebab_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut word_start = true;

    for c in name.chars() {
        if c == '-' {
            out.push(c);
            word_start = true;
        } else if word_start {
            out.push(c.to_ascii_uppercase());
            word_start = false;
        } else {
            out.push(c.to_ascii_lowercase());
        }
    }

    out
}
