use std::fmt;
use std::str::FromStr;

/// Prefix shared by every pointer and by bucket keys in the replicated map
pub const BUCKET_PREFIX: &str = "/bucket/";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PointerError {
    #[error("pointer not valid: {0}")]
    NotValid(String),
}

/// Address of a bucket (`name` empty) or of a file inside a bucket.
///
/// Textual form: `/bucket/<hash>/<name>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pointer {
    pub bucket: String,
    pub name: String,
}

impl Pointer {
    pub fn new(bucket: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            name: name.into(),
        }
    }

    /// Pointer to the bucket itself.
    pub fn bucket_only(bucket: impl Into<String>) -> Self {
        Self::new(bucket, "")
    }
}

impl FromStr for Pointer {
    type Err = PointerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = if s.starts_with('/') {
            s.to_string()
        } else {
            format!("/{}", s)
        };

        let rest = normalized
            .strip_prefix(BUCKET_PREFIX)
            .ok_or_else(|| PointerError::NotValid(s.to_string()))?;

        match rest.find('/') {
            Some(idx) if idx > 0 => Ok(Self {
                bucket: rest[..idx].to_string(),
                name: rest[idx + 1..].to_string(),
            }),
            _ => Err(PointerError::NotValid(s.to_string())),
        }
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}/{}", BUCKET_PREFIX, self.bucket, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_file_pointer() {
        let p: Pointer = "/bucket/abc123/photo.png".parse().unwrap();
        assert_eq!(p, Pointer::new("abc123", "photo.png"));
    }

    #[test]
    fn test_parse_without_leading_slash() {
        let p: Pointer = "bucket/abc123/x".parse().unwrap();
        assert_eq!(p, Pointer::new("abc123", "x"));
    }

    #[test]
    fn test_parse_bucket_only() {
        let p: Pointer = "/bucket/abc123/".parse().unwrap();
        assert_eq!(p, Pointer::bucket_only("abc123"));
        assert_eq!(p.to_string(), "/bucket/abc123/");
    }

    #[test]
    fn test_name_keeps_nested_slashes() {
        let p: Pointer = "/bucket/h/dir/file.txt".parse().unwrap();
        assert_eq!(p.bucket, "h");
        assert_eq!(p.name, "dir/file.txt");
    }

    #[test]
    fn test_roundtrip() {
        let p = Pointer::new("deadbeef", "notes.md");
        assert_eq!(p.to_string().parse::<Pointer>().unwrap(), p);
    }

    #[test]
    fn test_invalid_pointers() {
        assert!("/bucket/abc".parse::<Pointer>().is_err());
        assert!("/bucket//x".parse::<Pointer>().is_err());
        assert!("/other/abc/x".parse::<Pointer>().is_err());
        assert!("".parse::<Pointer>().is_err());
    }
}
