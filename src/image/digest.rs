use crate::errors::ImageError;
use regex::Regex;
use std::ops::Range;

/// A digest securely identifies the specific contents of a binary object
///
/// Digests are written as `algorithm:hex`. For the registered algorithms the
/// number of hex digits is fixed; anything else needs at least 32 of them.
#[derive(Clone)]
pub struct ContentDigest {
    serialized: String,
    format_pos: Range<usize>,
    hex_pos: Range<usize>,
}

serialized_str_impls!(ContentDigest);

/// Hex digest lengths for the algorithms registered by the OCI image spec
const KNOWN_ALGORITHMS: &[(&str, usize)] = &[("sha256", 64), ("sha384", 96), ("sha512", 128)];

impl ContentDigest {
    /// Returns a reference to the existing string representation of a
    /// [ContentDigest]
    ///
    /// This string always has a single colon. After the colon is 32 or more
    /// characters which will always be lowercase hexadecimal digits. The format
    /// specifier before this colon is alphanumeric, with plus, dash,
    /// underscore, or dot characters allowed as separators between valid
    /// groups of alphanumeric characters.
    pub fn as_str(&self) -> &str {
        &self.serialized
    }

    /// Parse a [prim@str] as a [ContentDigest]
    ///
    /// ```
    /// # use kbundle::image::ContentDigest;
    /// let digest = ContentDigest::parse("format:00112233445566778899aabbccddeeff").unwrap();
    /// assert_eq!(digest.format_str(), "format");
    /// assert_eq!(digest.hex_str(), "00112233445566778899aabbccddeeff");
    /// assert!(ContentDigest::parse("sha256:00112233445566778899aabbccddeeff").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, ImageError> {
        lazy_static! {
            static ref RE: Regex =
                Regex::new(&format!("^{}$", ContentDigest::regex_str())).unwrap();
        }
        let invalid = || ImageError::InvalidReferenceFormat(s.to_owned());
        let captures = RE.captures(s).ok_or_else(invalid)?;
        let digest = ContentDigest {
            serialized: s.to_owned(),
            format_pos: captures.name("dig_f").ok_or_else(invalid)?.range(),
            hex_pos: captures.name("dig_h").ok_or_else(invalid)?.range(),
        };
        if let Some(expected) = ContentDigest::expected_hex_len(digest.format_str()) {
            if digest.hex_str().len() != expected {
                return Err(ImageError::DigestLength {
                    digest: s.to_owned(),
                    expected,
                });
            }
        }
        Ok(digest)
    }

    /// Return a reference to the format string portion of this digest.
    pub fn format_str(&self) -> &str {
        &self.serialized[self.format_pos.clone()]
    }

    /// Return a reference to the hexadecimal string portion of this digest.
    ///
    /// This is guaranteed to be a string of at least 32 hex digits.
    pub fn hex_str(&self) -> &str {
        &self.serialized[self.hex_pos.clone()]
    }

    fn expected_hex_len(format: &str) -> Option<usize> {
        KNOWN_ALGORITHMS
            .iter()
            .find(|(name, _)| *name == format)
            .map(|(_, len)| *len)
    }

    pub(crate) fn regex_str() -> &'static str {
        concat!(
            "(?P<dig>", // digest group
            /*  */ "(?P<dig_f>", // digest format group
            /* -- */ "(?:", // first format component
            /* -- -- */ "[a-zA-Z]",
            /* -- -- */ "[a-zA-Z0-9]*",
            /* -- */ ")",
            /* -- */ "(?:", // Additional format component
            /* -- -- */ "[-_+.]", // separators allowed in the digest format
            /* -- -- */ "[a-zA-Z]",
            /* -- -- */ "[a-zA-Z0-9]*",
            /* -- */ ")*",
            /*  */ ")", // end digest format group
            /*  */ "[:]", // Main separator
            /*  */ "(?P<dig_h>", // digest hex group
            /* -- */ "[a-f0-9]{32,}",
            /*  */ ")",
            ")",
        )
    }
}
