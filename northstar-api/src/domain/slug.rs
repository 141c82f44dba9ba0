//! URL slug generation for public lookup paths.

/// Lowercase the input and collapse every non-alphanumeric run into a
/// single dash, trimming dashes at both ends.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
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
    fn lowercases_and_dashes() {
        assert_eq!(slugify("Blue Lake Bakery"), "blue-lake-bakery");
    }

    #[test]
    fn collapses_symbol_runs() {
        assert_eq!(slugify("Twin Cities A.I. & Data, LLC"), "twin-cities-a-i-data-llc");
    }

    #[test]
    fn trims_leading_and_trailing_separators() {
        assert_eq!(slugify("  --Fancy!--  "), "fancy");
    }

    #[test]
    fn empty_and_symbol_only_inputs_yield_empty() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("!!!"), "");
    }
}
