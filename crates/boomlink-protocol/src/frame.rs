use boomlink_core::constants::HEALTH_CHECK_TOKEN;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Replacement for bytes outside the 7-bit ASCII range.
const NON_ASCII_REPLACEMENT: char = '?';

/// One inbound chunk from the device, decoded and classified.
///
/// # Example
///
/// ```
/// use boomlink_protocol::DeviceFrame;
///
/// assert_eq!(DeviceFrame::parse(b"|HLT%\r\n"), DeviceFrame::HealthCheck);
/// assert_eq!(
///     DeviceFrame::parse(b" CODE123 "),
///     DeviceFrame::Code("CODE123".to_string())
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceFrame {
    /// Liveness sentinel `|HLT%`; never answered.
    HealthCheck,

    /// Any other non-empty payload: a scanned code to validate.
    Code(String),

    /// Whitespace only.
    Empty,
}

impl DeviceFrame {
    /// Decode raw bytes as ASCII, trim surrounding whitespace and classify.
    ///
    /// Bytes above `0x7F` are replaced with `?` so a noisy line can never
    /// produce a decoding error.
    pub fn parse(bytes: &[u8]) -> Self {
        let text = decode_ascii(bytes);
        Self::classify(text.trim())
    }

    /// Classify an already decoded and trimmed payload.
    pub fn classify(text: &str) -> Self {
        if text.is_empty() {
            DeviceFrame::Empty
        } else if text == HEALTH_CHECK_TOKEN {
            DeviceFrame::HealthCheck
        } else {
            DeviceFrame::Code(text.to_string())
        }
    }

    /// Text of the frame as it was received (after trimming).
    pub fn as_str(&self) -> &str {
        match self {
            DeviceFrame::HealthCheck => HEALTH_CHECK_TOKEN,
            DeviceFrame::Code(code) => code,
            DeviceFrame::Empty => "",
        }
    }

    pub fn is_health_check(&self) -> bool {
        matches!(self, DeviceFrame::HealthCheck)
    }
}

impl fmt::Display for DeviceFrame {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn decode_ascii(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| {
            if b.is_ascii() {
                b as char
            } else {
                NON_ASCII_REPLACEMENT
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(b"|HLT%")]
    #[case(b"|HLT%\n")]
    #[case(b"\r\n  |HLT%\t ")]
    fn test_health_check_after_trim(#[case] input: &[u8]) {
        assert_eq!(DeviceFrame::parse(input), DeviceFrame::HealthCheck);
    }

    #[rstest]
    #[case(b"CODE123", "CODE123")]
    #[case(b"  CODE123\r\n", "CODE123")]
    #[case(b"|HLT%|HLT%", "|HLT%|HLT%")]
    #[case(b"|hlt%", "|hlt%")]
    #[case(b"AB CD", "AB CD")]
    fn test_code_frames(#[case] input: &[u8], #[case] expected: &str) {
        assert_eq!(DeviceFrame::parse(input), DeviceFrame::Code(expected.to_string()));
    }

    #[rstest]
    #[case(b"")]
    #[case(b"   ")]
    #[case(b"\r\n")]
    fn test_empty_frames(#[case] input: &[u8]) {
        assert_eq!(DeviceFrame::parse(input), DeviceFrame::Empty);
    }

    #[test]
    fn test_non_ascii_bytes_are_replaced() {
        let frame = DeviceFrame::parse(&[b'A', 0xC3, 0xA9, b'B']);
        assert_eq!(frame, DeviceFrame::Code("A??B".to_string()));
    }

    #[test]
    fn test_as_str_and_display() {
        assert_eq!(DeviceFrame::HealthCheck.as_str(), "|HLT%");
        assert_eq!(DeviceFrame::Code("X1".into()).to_string(), "X1");
        assert_eq!(DeviceFrame::Empty.as_str(), "");
        assert!(DeviceFrame::HealthCheck.is_health_check());
        assert!(!DeviceFrame::Empty.is_health_check());
    }
}
