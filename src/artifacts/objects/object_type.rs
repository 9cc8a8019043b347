use anyhow::Context;
use std::io::BufRead;
use std::str::FromStr;

/// Kind of a stored object, as named in object headers and tree listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Blob,
    Tree,
    Commit,
}

impl ObjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::Blob => "blob",
            ObjectType::Tree => "tree",
            ObjectType::Commit => "commit",
        }
    }

    /// Consume a `<type> <size>\0` header, leaving the reader at the payload
    pub fn parse_object_type(reader: &mut impl BufRead) -> anyhow::Result<ObjectType> {
        let mut header = Vec::new();
        reader.read_until(b'\0', &mut header)?;

        let header = header
            .strip_suffix(b"\0")
            .context("Object header is not NUL-terminated")?;
        let header = std::str::from_utf8(header).context("Object header is not UTF-8")?;
        let (kind, size) = header
            .split_once(' ')
            .with_context(|| format!("Object header '{}' has no size", header))?;
        size.parse::<usize>()
            .with_context(|| format!("Invalid object size '{}'", size))?;

        kind.parse()
    }
}

impl FromStr for ObjectType {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> anyhow::Result<Self> {
        match value {
            "blob" => Ok(ObjectType::Blob),
            "tree" => Ok(ObjectType::Tree),
            "commit" => Ok(ObjectType::Commit),
            _ => Err(anyhow::anyhow!("Invalid object type: {}", value)),
        }
    }
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::io::Read;

    #[rstest]
    fn leaves_the_reader_at_the_payload() {
        let mut reader = &b"tree 3\0abc"[..];

        assert_eq!(ObjectType::parse_object_type(&mut reader).unwrap(), ObjectType::Tree);

        let mut payload = String::new();
        reader.read_to_string(&mut payload).unwrap();
        assert_eq!(payload, "abc");
    }

    #[rstest]
    #[case(&b"tag 3\0abc"[..])]
    #[case(&b"blob\0"[..])]
    #[case(&b"blob x\0"[..])]
    #[case(&b"blob 3"[..])]
    fn rejects_malformed_headers(#[case] raw: &[u8]) {
        let mut reader = raw;

        assert!(ObjectType::parse_object_type(&mut reader).is_err());
    }
}
