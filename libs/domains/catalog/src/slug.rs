/// Lowercase URL slug: runs of anything but letters and digits collapse
/// into a single `-`.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for c in input.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Baby Stroller"), "baby-stroller");
        assert_eq!(slugify("  Milk & Formula -- 2x "), "milk-formula-2x");
        assert_eq!(slugify("Pampers"), "pampers");
        assert_eq!(slugify("!!!"), "");
    }
}
