//! Static rewrite table mapping frontend API paths onto the scanning backend

use url::Url;

/// A single `source -> destination` path mapping.
///
/// Segments starting with `:` capture one non-empty path segment in the
/// source and are substituted verbatim into the destination. Dot segments
/// (`.`, `..`, or their percent-encoded forms) never match a capture, since
/// URL path normalization would otherwise move them outside the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub source: &'static str,
    pub destination: &'static str,
}

pub const RULES: &[Rule] = &[
    Rule {
        source: "/api/scan",
        destination: "/scan",
    },
    Rule {
        source: "/api/scan/:id",
        destination: "/scan/:id",
    },
];

impl Rule {
    fn captures<'p>(&self, path: &'p str) -> Option<Vec<(&'static str, &'p str)>> {
        let mut pattern = self.source.split('/');
        let mut segments = path.split('/');
        let mut captures = Vec::new();

        loop {
            match (pattern.next(), segments.next()) {
                (None, None) => return Some(captures),
                (Some(expected), Some(segment)) => match expected.strip_prefix(':') {
                    Some(_) if !is_capturable(segment) => return None,
                    Some(name) => captures.push((name, segment)),
                    None if expected != segment => return None,
                    None => {}
                },
                _ => return None,
            }
        }
    }

    fn substitute(&self, captures: &[(&str, &str)]) -> String {
        self.destination
            .split('/')
            .map(|segment| {
                segment
                    .strip_prefix(':')
                    .and_then(|name| captures.iter().find(|(key, _)| *key == name))
                    .map_or(segment, |(_, value)| *value)
            })
            .collect::<Vec<_>>()
            .join("/")
    }
}

fn is_capturable(segment: &str) -> bool {
    let decoded = percent_encoding::percent_decode_str(segment).decode_utf8_lossy();

    !decoded.is_empty() && decoded != "." && decoded != ".." && !decoded.contains(['/', '\\'])
}

#[derive(Debug, Clone)]
pub struct RewriteTable {
    backend: Url,
    rules: &'static [Rule],
}

impl RewriteTable {
    pub fn new(backend: Url) -> Self {
        Self {
            backend,
            rules: RULES,
        }
    }

    pub fn backend(&self) -> &Url {
        &self.backend
    }

    /// Resolve a frontend request path to its backend URL.
    ///
    /// The first matching rule wins. The query string is carried over
    /// unchanged. Returns `None` when no rule matches.
    pub fn resolve(&self, path: &str, query: Option<&str>) -> Option<Url> {
        self.rules.iter().find_map(|rule| {
            let captures = rule.captures(path)?;
            let destination = rule.substitute(&captures);

            Some(self.join(&destination, query))
        })
    }

    fn join(&self, destination: &str, query: Option<&str>) -> Url {
        let path = format!(
            "{}{}",
            self.backend.path().trim_end_matches('/'),
            destination
        );

        let mut url = self.backend.clone();
        url.set_path(&path);
        url.set_query(query);
        url
    }
}
