use std::fmt;

/// A routed domain as configured on an application.
///
/// Accepts a bare host (`app.example.com`) or a URL with an `http://` or
/// `https://` scheme. Bare hosts and `https://` are served over TLS; only an
/// explicit `http://` opts out of certificate provisioning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domain {
    host: String,
    secure: bool,
}

impl Domain {
    pub fn parse(input: &str) -> crate::Result<Self> {
        let trimmed = input.trim();
        let (rest, secure) = if let Some(rest) = strip_prefix_ignore_case(trimmed, "https://") {
            (rest, true)
        } else if let Some(rest) = strip_prefix_ignore_case(trimmed, "http://") {
            (rest, false)
        } else {
            (trimmed, true)
        };

        let host = rest
            .split(['/', '?', '#'])
            .next()
            .unwrap_or_default()
            .trim_end_matches('.')
            .to_ascii_lowercase();

        if host.is_empty() {
            return Err(invalid(input, "empty host"));
        }
        if host.contains(':') {
            return Err(invalid(input, "ports are not supported in routed domains"));
        }
        if !host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
        {
            return Err(invalid(input, "host contains invalid characters"));
        }

        Ok(Self { host, secure })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.host)
    }
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    match s.get(..prefix.len()) {
        Some(head) if head.eq_ignore_ascii_case(prefix) => Some(&s[prefix.len()..]),
        _ => None,
    }
}

fn invalid(input: &str, reason: &'static str) -> crate::Error {
    crate::Error::InvalidDomain {
        input: input.to_owned(),
        reason,
    }
}
