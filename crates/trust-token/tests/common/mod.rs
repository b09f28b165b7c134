//! Collaborators for token and loader tests.
//!
//! [`ScriptedParser`] reads a tiny line format instead of certificates:
//!
//! - `object:<label>` adds one certificate object labelled `<label>`
//! - `empty` makes the file parse successfully with no objects
//! - `garbage` makes parsing fail
//!
//! A file with none of these lines is unrecognized.

#![allow(dead_code)]

use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use trust_fs::NormalizedPath;
use trust_token::{
    AttributeType, Attributes, BuilderFlags, Classification, IndexError, MemoryIndex,
    ObjectClass, ObjectHandle, ObjectIndex, ParseOutcome, Parser, Token, TrustBuilder,
};

pub type ParseLog = Arc<Mutex<Vec<(NormalizedPath, Classification)>>>;

#[derive(Debug, Default)]
pub struct ScriptedParser {
    calls: ParseLog,
}

impl ScriptedParser {
    pub fn new() -> (Self, ParseLog) {
        let calls = ParseLog::default();
        (
            Self {
                calls: Arc::clone(&calls),
            },
            calls,
        )
    }
}

impl Parser for ScriptedParser {
    fn parse_file(&mut self, path: &NormalizedPath, classification: Classification) -> ParseOutcome {
        self.calls
            .lock()
            .unwrap()
            .push((path.clone(), classification));

        let Ok(content) = fs::read_to_string(path.to_native()) else {
            return ParseOutcome::Failed(format!("unreadable: {}", path));
        };

        let mut objects = Vec::new();
        let mut recognized = false;
        for line in content.lines().map(str::trim) {
            if line == "garbage" {
                return ParseOutcome::Failed("garbage line".to_string());
            }
            if line == "empty" {
                recognized = true;
            }
            if let Some(label) = line.strip_prefix("object:") {
                recognized = true;
                objects.push(
                    Attributes::new()
                        .with(AttributeType::Class, ObjectClass::Certificate)
                        .with(AttributeType::Label, label)
                        .with(
                            AttributeType::Trusted,
                            classification == Classification::Anchor,
                        ),
                );
            }
        }

        if recognized {
            ParseOutcome::Parsed(objects)
        } else {
            ParseOutcome::Unrecognized
        }
    }
}

/// Switches that make [`FlakyIndex`] refuse mutations.
#[derive(Debug, Clone, Default)]
pub struct Faults {
    /// Refuse `replace_all` calls that store objects
    pub loads: Arc<AtomicBool>,
    /// Refuse `replace_all` calls that only remove objects
    pub retracts: Arc<AtomicBool>,
}

impl Faults {
    pub fn fail_loads(&self, on: bool) {
        self.loads.store(on, Ordering::SeqCst);
    }

    pub fn fail_retracts(&self, on: bool) {
        self.retracts.store(on, Ordering::SeqCst);
    }
}

/// A [`MemoryIndex`] whose mutations can be made to fail on demand.
#[derive(Debug)]
pub struct FlakyIndex {
    inner: MemoryIndex,
    faults: Faults,
}

impl FlakyIndex {
    pub fn new() -> (Self, Faults) {
        let faults = Faults::default();
        (
            Self {
                inner: MemoryIndex::new(Box::new(TrustBuilder::new(BuilderFlags::Token))),
                faults: faults.clone(),
            },
            faults,
        )
    }
}

impl ObjectIndex for FlakyIndex {
    fn batch(&mut self) {
        self.inner.batch();
    }

    fn finish(&mut self) {
        self.inner.finish();
    }

    fn in_batch(&self) -> bool {
        self.inner.in_batch()
    }

    fn take(&mut self, attrs: Attributes) -> Result<ObjectHandle, IndexError> {
        self.inner.take(attrs)
    }

    fn replace_all(
        &mut self,
        matching: &Attributes,
        key: Option<AttributeType>,
        replacements: Vec<Attributes>,
    ) -> Result<(), IndexError> {
        let fault = if replacements.is_empty() {
            &self.faults.retracts
        } else {
            &self.faults.loads
        };
        if fault.load(Ordering::SeqCst) {
            return Err(IndexError::TemplateInconsistent {
                reason: "injected fault".to_string(),
            });
        }
        self.inner.replace_all(matching, key, replacements)
    }

    fn remove(&mut self, handle: ObjectHandle) -> Result<Attributes, IndexError> {
        self.inner.remove(handle)
    }

    fn get(&self, handle: ObjectHandle) -> Option<&Attributes> {
        self.inner.get(handle)
    }

    fn find_all(&self, matching: &Attributes) -> Vec<ObjectHandle> {
        self.inner.find_all(matching)
    }

    fn handles(&self) -> Vec<ObjectHandle> {
        self.inner.handles()
    }

    fn len(&self) -> usize {
        self.inner.len()
    }
}

/// A token over `root` driven by a [`ScriptedParser`].
pub fn scripted_token(root: &NormalizedPath) -> (Token, ParseLog) {
    let (parser, log) = ScriptedParser::new();
    let token = Token::with_parser(18, root.clone(), "Test Trust", Box::new(parser)).unwrap();
    (token, log)
}

/// A token over `root` whose index fails on demand.
pub fn flaky_token(root: &NormalizedPath) -> (Token, ParseLog, Faults) {
    let (parser, log) = ScriptedParser::new();
    let (index, faults) = FlakyIndex::new();
    let token = Token::with_collaborators(
        18,
        root.clone(),
        "Test Trust",
        Box::new(parser),
        Box::new(index),
    )
    .unwrap();
    (token, log, faults)
}

/// Labels of every object loaded from `origin`, sorted.
pub fn labels_from(token: &Token, origin: &NormalizedPath) -> Vec<String> {
    let index = token.index();
    let mut labels: Vec<String> = index
        .find_all(&trust_token::origin_template(origin))
        .into_iter()
        .filter_map(|handle| index.get(handle)?.text(AttributeType::Label).map(str::to_string))
        .collect();
    labels.sort();
    labels
}

/// Take the calls recorded so far, leaving `log` empty.
pub fn drain(log: &ParseLog) -> Vec<(NormalizedPath, Classification)> {
    std::mem::take(&mut *log.lock().unwrap())
}

/// Whether the tests run as root, which bypasses permission checks.
#[cfg(unix)]
pub fn is_root() -> bool {
    match std::process::Command::new("id").arg("-u").output() {
        Ok(output) => String::from_utf8_lossy(&output.stdout).trim() == "0",
        Err(_) => false,
    }
}
