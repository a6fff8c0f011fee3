//! Remote path joining.
//!
//! Remote paths are `/`-separated strings independent of the host OS, so
//! `std::path` is the wrong tool here. Join semantics match the front end's
//! path helper: segments are glued with `/` and runs of slashes collapse to
//! one, so empty segments vanish.

/// Join path segments into one normalized remote path.
///
/// A leading `/` on the first non-empty segment is preserved; a trailing
/// slash is dropped unless the result is the root itself.
#[must_use]
pub fn join_path(segments: &[&str]) -> String {
    let mut out = String::new();

    for segment in segments {
        if segment.is_empty() {
            continue;
        }

        if !out.is_empty() && !out.ends_with('/') {
            out.push('/');
        }

        // Collapse repeated separators while copying
        let mut prev_slash = out.ends_with('/');
        for ch in segment.chars() {
            if ch == '/' {
                if !prev_slash {
                    out.push('/');
                }
                prev_slash = true;
            } else {
                out.push(ch);
                prev_slash = false;
            }
        }
    }

    if out.len() > 1 && out.ends_with('/') {
        out.pop();
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_base_prefix_and_name() {
        assert_eq!(join_path(&["/", "", "dirA"]), "/dirA");
        assert_eq!(join_path(&["/dirA", "sub"]), "/dirA/sub");
        assert_eq!(join_path(&["", "dirA"]), "dirA");
    }

    #[test]
    fn collapses_duplicate_separators() {
        assert_eq!(join_path(&["/a/", "/b//c"]), "/a/b/c");
        assert_eq!(join_path(&["//", "x"]), "/x");
    }

    #[test]
    fn root_and_empty_edge_cases() {
        assert_eq!(join_path(&[]), "");
        assert_eq!(join_path(&["", ""]), "");
        assert_eq!(join_path(&["/"]), "/");
        assert_eq!(join_path(&["/a/"]), "/a");
    }
}
