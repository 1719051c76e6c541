use crate::error::DecodeError;

/// Text encodings understood when a body declares a `charset` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    Utf8,
    Ascii,
    Latin1,
}

impl Charset {
    /// Looks up a charset label, case-insensitively.
    pub fn from_label(label: &str) -> Result<Self, DecodeError> {
        let label = label.trim().trim_matches('"');
        match label.to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(Charset::Utf8),
            "us-ascii" | "ascii" => Ok(Charset::Ascii),
            "iso-8859-1" | "iso8859-1" | "latin1" | "latin-1" | "l1" => Ok(Charset::Latin1),
            _ => Err(DecodeError::unsupported_charset(label)),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Charset::Utf8 => "utf-8",
            Charset::Ascii => "us-ascii",
            Charset::Latin1 => "iso-8859-1",
        }
    }

    /// Decodes `bytes` strictly: invalid UTF-8, or any byte above 0x7f for
    /// ASCII, is an error.
    pub fn decode(self, bytes: Vec<u8>) -> Result<String, DecodeError> {
        match self {
            Charset::Utf8 => String::from_utf8(bytes)
                .map_err(|e| DecodeError::invalid_encoding(self.label(), e.utf8_error().valid_up_to())),
            Charset::Ascii => match bytes.iter().position(|b| !b.is_ascii()) {
                Some(valid_up_to) => Err(DecodeError::invalid_encoding(self.label(), valid_up_to)),
                None => Charset::Utf8.decode(bytes),
            },
            Charset::Latin1 => Ok(bytes.into_iter().map(char::from).collect()),
        }
    }
}
