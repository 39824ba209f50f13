//! Path component sanitization

/// Characters that are replaced before a string is used as a path component
const UNSAFE_CHARS: [char; 2] = ['/', '='];

/// Sanitize a title, album or artist for use in a file or directory name
///
/// Replaces `/` and `=` with `_`. Every other character is kept as is,
/// including leading and trailing whitespace.
///
/// # Examples
///
/// ```
/// use tunedl::utils::sanitize_component;
///
/// assert_eq!(sanitize_component("AC/DC"), "AC_DC");
/// assert_eq!(sanitize_component("E=MC2"), "E_MC2");
/// ```
pub fn sanitize_component(name: &str) -> String {
    name.chars()
        .map(|c| if UNSAFE_CHARS.contains(&c) { '_' } else { c })
        .collect()
}
