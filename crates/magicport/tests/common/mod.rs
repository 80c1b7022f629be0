#![allow(dead_code)]

use std::cell::RefCell;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use magicport::frame::{encode_frame, FrameConfig, FrameReader, Inbound, MAX_FRAME_PAYLOAD};
use magicport::magic::{Engine, EngineError, Input, View, ViewKind};
use magicport::term::{decode, encode, Term};
use magicport::{Port, PortConfig, Shutdown};

/// What the fake engine has been asked to do.
#[derive(Default)]
pub struct Journal {
    pub opened: Vec<ViewKind>,
    pub closed: Vec<ViewKind>,
    pub loads: Vec<Option<PathBuf>>,
    pub fail_open: Option<ViewKind>,
}

/// An in-memory engine that labels ASCII as text and everything else as data.
///
/// Databases whose path contains `broken` fail to load.
#[derive(Clone, Default)]
pub struct FakeEngine(pub Rc<RefCell<Journal>>);

impl FakeEngine {
    pub fn failing_open(kind: ViewKind) -> Self {
        let engine = Self::default();
        engine.0.borrow_mut().fail_open = Some(kind);
        engine
    }

    pub fn opened(&self) -> usize {
        self.0.borrow().opened.len()
    }

    pub fn closed(&self) -> usize {
        self.0.borrow().closed.len()
    }
}

pub struct FakeView {
    kind: ViewKind,
    journal: Rc<RefCell<Journal>>,
}

impl Engine for FakeEngine {
    type View = FakeView;

    fn open(&self, kind: ViewKind) -> Result<FakeView, EngineError> {
        let mut journal = self.0.borrow_mut();
        if journal.fail_open == Some(kind) {
            return Err(EngineError::new(12, "cannot allocate memory"));
        }
        journal.opened.push(kind);
        Ok(FakeView {
            kind,
            journal: Rc::clone(&self.0),
        })
    }
}

impl View for FakeView {
    fn load(&mut self, database: Option<&Path>) -> Result<(), EngineError> {
        self.journal
            .borrow_mut()
            .loads
            .push(database.map(Path::to_path_buf));
        match database {
            Some(path) if path.to_string_lossy().contains("broken") => Err(EngineError::new(
                2,
                format!("could not find any valid magic files in `{}'", path.display()),
            )),
            _ => Ok(()),
        }
    }

    fn classify(&mut self, input: Input<'_>) -> Result<String, EngineError> {
        let contents = match input {
            Input::Bytes(bytes) => bytes.to_vec(),
            Input::Path(path) => std::fs::read(path).map_err(|err| {
                EngineError::new(
                    i64::from(err.raw_os_error().unwrap_or(0)),
                    format!("cannot open `{}' ({err})", path.display()),
                )
            })?,
        };
        Ok(label(self.kind, contents.is_ascii()).to_string())
    }
}

impl Drop for FakeView {
    fn drop(&mut self) {
        self.journal.borrow_mut().closed.push(self.kind);
    }
}

fn label(kind: ViewKind, ascii: bool) -> &'static str {
    match (kind, ascii) {
        (ViewKind::MimeType, true) => "text/plain",
        (ViewKind::MimeEncoding, true) => "us-ascii",
        (ViewKind::TypeName, true) => "ASCII text",
        (ViewKind::MimeType, false) => "application/octet-stream",
        (ViewKind::MimeEncoding, false) => "binary",
        (ViewKind::TypeName, false) => "data",
    }
}

/// Frame a raw payload.
pub fn frame_raw(payload: &[u8]) -> Vec<u8> {
    let mut buf = bytes::BytesMut::new();
    encode_frame(payload, &mut buf).expect("payload should fit in a frame");
    buf.to_vec()
}

/// Frame an encoded term.
pub fn frame(term: &Term) -> Vec<u8> {
    frame_raw(&encode(term).expect("term should encode"))
}

/// Frame an `{Operation, Argument}` command.
pub fn command(operation: &str, argument: Term) -> Vec<u8> {
    frame(&Term::tuple([Term::atom(operation), argument]))
}

pub fn stop() -> Vec<u8> {
    command("stop", Term::atom("normal"))
}

/// Run a port over `input` to completion, returning how it ended and
/// every term it wrote.
pub fn run(engine: FakeEngine, input: Vec<u8>) -> (Shutdown, Vec<Term>) {
    run_with_config(engine, input, PortConfig::default())
}

pub fn run_with_config(
    engine: FakeEngine,
    input: Vec<u8>,
    config: PortConfig,
) -> (Shutdown, Vec<Term>) {
    let mut port = Port::with_config(engine, Cursor::new(input), Vec::new(), config);
    let shutdown = port.run();
    let (_, output) = port.into_parts();
    (shutdown, responses(output))
}

/// Split a port's output into decoded terms.
pub fn responses(output: Vec<u8>) -> Vec<Term> {
    let config = FrameConfig {
        max_payload_size: MAX_FRAME_PAYLOAD,
    };
    let mut reader = FrameReader::with_config(Cursor::new(output), config);
    let mut terms = Vec::new();
    while let Ok(Inbound::Frame(payload)) = reader.read_frame() {
        terms.push(decode(&payload).expect("response should decode"));
    }
    terms
}

pub fn ready() -> Term {
    Term::atom("ready")
}

pub fn error(reason: &str) -> Term {
    Term::tuple([Term::atom("error"), Term::atom(reason)])
}

pub fn loaded() -> Term {
    Term::tuple([Term::atom("ok"), Term::atom("loaded")])
}

pub fn classified(mime_type: &str, mime_encoding: &str, type_name: &str) -> Term {
    Term::tuple([
        Term::atom("ok"),
        Term::tuple([
            Term::binary(mime_type),
            Term::binary(mime_encoding),
            Term::binary(type_name),
        ]),
    ])
}
