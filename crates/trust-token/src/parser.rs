//! Parser contract and the default certificate file parser
//!
//! A parser turns one file into zero or more attribute sets. The loader never
//! looks at file contents itself; it only reacts to the [`ParseOutcome`].

use std::sync::LazyLock;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use regex::Regex;
use trust_fs::NormalizedPath;

use crate::attrs::{AttributeType, Attributes, ObjectClass};
use crate::object::Classification;

/// Result of parsing one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// The file was understood; it may legitimately contain no objects
    Parsed(Vec<Attributes>),
    /// The file is not in a format this parser handles
    Unrecognized,
    /// The file looked like a supported format but is malformed
    Failed(String),
}

/// Turns files into attribute sets.
pub trait Parser: Send {
    fn parse_file(&mut self, path: &NormalizedPath, classification: Classification)
    -> ParseOutcome;
}

static PEM_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)-----BEGIN ([A-Z0-9 ]+)-----(.*?)-----END ([A-Z0-9 ]+)-----")
        .expect("Invalid PEM block regex")
});

const CERTIFICATE_LABELS: &[&str] = &["CERTIFICATE", "TRUSTED CERTIFICATE", "X509 CERTIFICATE"];

/// Recognizes certificate files by their framing.
///
/// Accepts PEM files with one or more certificate blocks and raw DER files
/// holding a single SEQUENCE. Certificate contents are not decoded further.
#[derive(Debug, Default)]
pub struct PemParser;

impl PemParser {
    pub fn new() -> Self {
        Self
    }

    fn parse_bytes(&self, data: &[u8], classification: Classification) -> ParseOutcome {
        if is_der_sequence(data) {
            return ParseOutcome::Parsed(vec![certificate(data.to_vec(), classification)]);
        }

        let Ok(text) = std::str::from_utf8(data) else {
            return ParseOutcome::Unrecognized;
        };

        let mut objects = Vec::new();
        let mut saw_block = false;
        for block in PEM_BLOCK.captures_iter(text) {
            saw_block = true;
            let label = &block[1];
            if label != &block[3] {
                return ParseOutcome::Failed(format!(
                    "PEM block BEGIN {} closed by END {}",
                    label, &block[3]
                ));
            }
            if !CERTIFICATE_LABELS.contains(&label) {
                continue;
            }
            match decode_body(&block[2]) {
                Ok(der) => objects.push(certificate(der, classification)),
                Err(message) => return ParseOutcome::Failed(message),
            }
        }

        if !saw_block || objects.is_empty() {
            return ParseOutcome::Unrecognized;
        }
        ParseOutcome::Parsed(objects)
    }
}

impl Parser for PemParser {
    fn parse_file(
        &mut self,
        path: &NormalizedPath,
        classification: Classification,
    ) -> ParseOutcome {
        match std::fs::read(path.to_native()) {
            Ok(data) => self.parse_bytes(&data, classification),
            Err(e) => ParseOutcome::Failed(format!("couldn't read {}: {}", path, e)),
        }
    }
}

fn certificate(der: Vec<u8>, classification: Classification) -> Attributes {
    Attributes::new()
        .with(AttributeType::Class, ObjectClass::Certificate)
        .with(AttributeType::Value, der)
        .with(
            AttributeType::Trusted,
            classification == Classification::Anchor,
        )
        .with(
            AttributeType::Distrusted,
            classification == Classification::Blacklist,
        )
}

fn decode_body(body: &str) -> Result<Vec<u8>, String> {
    // Skip RFC 1421 style headers ("Proc-Type: ...") before the base64 payload
    let payload: String = body
        .lines()
        .filter(|line| !line.contains(':'))
        .flat_map(|line| line.chars())
        .filter(|c| !c.is_whitespace())
        .collect();
    STANDARD
        .decode(payload.as_bytes())
        .map_err(|e| format!("invalid base64 in PEM block: {}", e))
}

/// Whether `data` is exactly one DER SEQUENCE.
fn is_der_sequence(data: &[u8]) -> bool {
    let [0x30, first, rest @ ..] = data else {
        return false;
    };
    let (length, header) = if *first < 0x80 {
        (*first as usize, 2)
    } else {
        let count = (*first & 0x7f) as usize;
        if count == 0 || count > 4 || rest.len() < count {
            return false;
        }
        let length = rest[..count]
            .iter()
            .fold(0usize, |acc, byte| (acc << 8) | *byte as usize);
        (length, 2 + count)
    };
    header + length == data.len()
}
