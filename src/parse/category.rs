use crate::Category;
use crate::classify::{get_level, is_course_prefix, is_level};

/// Parse the category that follows an `in` keyword.
///
/// Returns the category and the number of tokens it consumed, or `None` if
/// the tokens do not start with a recognised category.
///
/// School and faculty names are taken as the marker plus exactly one more
/// token (`S CSE`), so longer names are truncated to that fragment.
pub fn create_category<S: AsRef<str>>(tokens: &[S]) -> Option<(Category, usize)> {
    let first = tokens.first()?.as_ref();

    if is_course_prefix(first) {
        return Some((Category::CoursePrefix(first.to_ascii_uppercase()), 1));
    }

    if is_level(first) {
        let level = get_level(first).ok()?;
        if let Some(next) = tokens.get(1).map(AsRef::as_ref)
            && is_course_prefix(next)
        {
            let category = Category::LevelCoursePrefix {
                level,
                prefix: next.to_ascii_uppercase(),
            };
            return Some((category, 2));
        }
        return Some((Category::Level(level), 1));
    }

    let school = first.eq_ignore_ascii_case("S");
    if school || first.eq_ignore_ascii_case("F") {
        let name = format!("{first} {}", tokens.get(1)?.as_ref());
        let category = if school {
            Category::School(name)
        } else {
            Category::Faculty(name)
        };
        return Some((category, 2));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn course_prefix() {
        assert_eq!(
            create_category(&["COMP", ")"]),
            Some((Category::CoursePrefix("COMP".into()), 1))
        );
        assert_eq!(
            create_category(&["math", ")"]),
            Some((Category::CoursePrefix("MATH".into()), 1))
        );
    }

    #[test]
    fn level_alone_and_with_prefix() {
        assert_eq!(create_category(&["L2", ")"]), Some((Category::Level(2), 1)));
        assert_eq!(
            create_category(&["L3", "COMP", ")"]),
            Some((
                Category::LevelCoursePrefix {
                    level: 3,
                    prefix: "COMP".into()
                },
                2
            ))
        );
    }

    #[test]
    fn school_and_faculty_join_two_tokens() {
        assert_eq!(
            create_category(&["S", "CSE", ")"]),
            Some((Category::School("S CSE".into()), 2))
        );
        assert_eq!(
            create_category(&["F", "Engineering", "Faculty", ")"]),
            Some((Category::Faculty("F Engineering".into()), 2))
        );
        assert_eq!(create_category(&["S"]), None);
    }

    #[test]
    fn unrecognised() {
        assert_eq!(create_category(&["COMP1511", ")"]), None);
        assert_eq!(create_category(&[")"]), None);
        assert_eq!(create_category::<&str>(&[]), None);
    }
}
