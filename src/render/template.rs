use std::borrow::Cow;

/// Piece of a parsed template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Literal(&'a str),
    /// Key between `${` and `}`.
    Placeholder(&'a str),
}

/// A template split into literal text and `${key}` placeholders.
///
/// Parsing happens once; rendering resolves each placeholder exactly once and
/// never looks at the substituted text again, so values containing `${...}`
/// come out verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template<'a> {
    segments: Vec<Segment<'a>>,
}

impl<'a> Template<'a> {
    pub fn parse(text: &'a str) -> Self {
        let mut segments = Vec::new();
        let mut rest = text;

        while let Some(start) = rest.find("${") {
            let after_open = &rest[start + 2..];
            let Some(end) = after_open.find('}') else {
                break;
            };
            // An unclosed `${` ends at the next opening, which may still close.
            if let Some(reopen) = after_open[..end].find("${") {
                segments.push(Segment::Literal(&rest[..start + 2 + reopen]));
                rest = &after_open[reopen..];
                continue;
            }
            if start > 0 {
                segments.push(Segment::Literal(&rest[..start]));
            }
            segments.push(Segment::Placeholder(&after_open[..end]));
            rest = &after_open[end + 1..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest));
        }

        Self { segments }
    }

    pub fn segments(&self) -> &[Segment<'a>] {
        &self.segments
    }

    pub fn placeholders(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Placeholder(key) => Some(*key),
            Segment::Literal(_) => None,
        })
    }

    /// Substitute every placeholder `resolve` knows; unknown ones stay as written.
    pub fn render<'v, F>(&self, resolve: F) -> String
    where
        F: Fn(&str) -> Option<Cow<'v, str>>,
    {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(key) => match resolve(key) {
                    Some(value) => out.push_str(&value),
                    None => {
                        out.push_str("${");
                        out.push_str(key);
                        out.push('}');
                    }
                },
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(key: &str) -> Option<Cow<'static, str>> {
        match key {
            "name" => Some(Cow::Borrowed("main")),
            "loc" => Some(Cow::Borrowed("12")),
            "evil" => Some(Cow::Borrowed("${name}")),
            _ => None,
        }
    }

    #[test]
    fn splits_literals_and_placeholders() {
        let template = Template::parse("fn ${name} has ${loc} lines");
        assert_eq!(
            template.segments(),
            &[
                Segment::Literal("fn "),
                Segment::Placeholder("name"),
                Segment::Literal(" has "),
                Segment::Placeholder("loc"),
                Segment::Literal(" lines"),
            ]
        );
        assert_eq!(template.render(resolve), "fn main has 12 lines");
    }

    #[test]
    fn unknown_keys_are_kept() {
        let template = Template::parse("${missing}/${name}");
        assert_eq!(template.render(resolve), "${missing}/main");
    }

    #[test]
    fn substituted_values_are_not_rescanned() {
        assert_eq!(Template::parse("[${evil}]").render(resolve), "[${name}]");
    }

    #[test]
    fn unclosed_placeholder_is_literal() {
        let template = Template::parse("a ${name} b ${loc");
        assert_eq!(template.render(resolve), "a main b ${loc");
        assert_eq!(template.placeholders().collect::<Vec<_>>(), vec!["name"]);
    }

    #[test]
    fn unclosed_placeholder_before_another_keeps_the_inner_one() {
        let template = Template::parse("${a ${name}!");
        assert_eq!(template.placeholders().collect::<Vec<_>>(), vec!["name"]);
        assert_eq!(template.render(resolve), "${a main!");

        let nested = Template::parse("x ${a ${b ${loc}");
        assert_eq!(nested.render(resolve), "x ${a ${b 12");
    }

    #[test]
    fn adjacent_placeholders_and_empty_template() {
        assert_eq!(Template::parse("${name}${loc}").render(resolve), "main12");
        assert!(Template::parse("").segments().is_empty());
    }
}
