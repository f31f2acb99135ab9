//! Managed-by footer kept at the end of every secret description.
//!
//! The footer marks a secret as owned by this provider. It is appended on
//! every write and stripped on read, so the description users declare is the
//! description they see in state.

/// Footer text up to (and including) the `v` of the version.
const FOOTER_PREFIX: &str = "---\nManaged by terraform-provider-supabase-vault v";

/// Separator between a user description and the footer.
const FOOTER_SEPARATOR: &str = "\n\n";

/// Footer for the given provider version, including the leading separator.
pub fn managed_by_footer(version: &str) -> String {
    format!("{FOOTER_SEPARATOR}{FOOTER_PREFIX}{version}")
}

/// Append the footer to a user description.
///
/// An empty description yields the footer alone without the blank line.
pub fn append_managed_by_footer(description: &str, version: &str) -> String {
    let footer = managed_by_footer(version);
    if description.is_empty() {
        return footer.trim_start_matches('\n').to_string();
    }
    description.to_owned() + &footer
}

/// Remove a trailing footer written by any provider version.
///
/// Returns the user part of the description. Descriptions that do not end in
/// a footer are returned unchanged.
pub fn strip_managed_by_footer(description: &str) -> &str {
    if let Some(rest) = description.strip_prefix(FOOTER_PREFIX) {
        if is_version(rest) {
            return "";
        }
    }

    let marker = format!("{FOOTER_SEPARATOR}{FOOTER_PREFIX}");
    match description.rfind(&marker) {
        Some(index) if is_version(&description[index + marker.len()..]) => &description[..index],
        _ => description,
    }
}

fn is_version(text: &str) -> bool {
    !text.is_empty() && !text.contains('\n')
}
