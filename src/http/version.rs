use crate::http::parser::DecodeError;

/// The only major protocol version the server speaks.
pub const SUPPORTED_MAJOR: u32 = 1;

/// A parsed `HTTP/<major>.<minor>` token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpVersion {
    pub major: u32,
    pub minor: u32,
}

impl HttpVersion {
    pub const HTTP_11: HttpVersion = HttpVersion { major: 1, minor: 1 };

    /// Parses a version token such as `HTTP/1.1`, `http/2` or `HTTP/1.0`.
    ///
    /// The scheme is matched case-insensitively. A missing minor component
    /// defaults to 0.
    ///
    /// # Example
    ///
    /// ```
    /// # use homespun::http::version::HttpVersion;
    /// let v = HttpVersion::parse("http/2").unwrap();
    /// assert_eq!((v.major, v.minor), (2, 0));
    /// assert!(HttpVersion::parse("FTP/1.1").is_err());
    /// ```
    pub fn parse(token: &str) -> Result<Self, DecodeError> {
        let malformed = || DecodeError::MalformedVersion(token.to_string());

        let parts: Vec<&str> = token.split('/').collect();
        if parts.len() != 2 || !parts[0].eq_ignore_ascii_case("http") {
            return Err(malformed());
        }

        let mut numbers = parts[1].splitn(2, '.');
        let major = numbers
            .next()
            .and_then(|m| m.parse::<u32>().ok())
            .ok_or_else(malformed)?;

        let minor = match numbers.next() {
            Some(m) => m.parse::<u32>().map_err(|_| malformed())?,
            None => 0,
        };

        Ok(Self { major, minor })
    }

    /// Whether requests carrying this version are served.
    ///
    /// Any HTTP/1.x is accepted regardless of the minor number.
    pub fn is_supported(&self) -> bool {
        self.major == SUPPORTED_MAJOR
    }
}

impl std::fmt::Display for HttpVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HTTP/{}.{}", self.major, self.minor)
    }
}
