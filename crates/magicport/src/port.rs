//! The command loop.

use std::io::{Read, Write};

use magicport_frame::{FrameReader, FrameWriter, Inbound};
use magicport_magic::{ClassifierRegistry, Engine, Input, RegistryError};
use magicport_term::Decoder;

use crate::command::{self, Database, Envelope, Operation};
use crate::config::PortConfig;
use crate::exit::{self, Fatal, Shutdown};
use crate::response::{Rejection, Response};

/// Whether the loop should read another command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// A classifier port serving one parent over a pair of byte streams.
///
/// Commands are handled strictly one at a time: each frame is read,
/// answered, and flushed before the next is read.
pub struct Port<E: Engine, R, W> {
    registry: ClassifierRegistry<E>,
    reader: FrameReader<R>,
    writer: FrameWriter<W>,
    config: PortConfig,
}

impl<E: Engine, R: Read, W: Write> Port<E, R, W> {
    pub fn new(engine: E, input: R, output: W) -> Self {
        Self::with_config(engine, input, output, PortConfig::default())
    }

    pub fn with_config(engine: E, input: R, output: W, config: PortConfig) -> Self {
        Self {
            registry: ClassifierRegistry::new(engine),
            reader: FrameReader::with_config(input, config.frame),
            writer: FrameWriter::new(output),
            config,
        }
    }

    /// Open the views, announce readiness, and serve until `stop` or a
    /// fatal error.
    pub fn run(&mut self) -> Shutdown {
        match self.serve() {
            Ok(()) => {
                tracing::info!("stop requested");
                Shutdown::Stopped
            }
            Err(fatal) => {
                tracing::error!(code = fatal.code(), error = %fatal, "port shutting down");
                Shutdown::Fatal(fatal)
            }
        }
    }

    fn serve(&mut self) -> Result<(), Fatal> {
        self.start()?;
        while self.step()? == Flow::Continue {}
        Ok(())
    }

    /// Open all views and send `ready`.
    pub fn start(&mut self) -> Result<(), Fatal> {
        self.registry.open_all().map_err(Fatal::ViewOpen)?;
        tracing::debug!("classifier views open");
        self.respond(Response::Ready)?;
        Ok(())
    }

    /// Read and handle one frame.
    pub fn step(&mut self) -> Result<Flow, Fatal> {
        match self.reader.read_frame().map_err(exit::read_failure)? {
            // A zero-length frame ends the session like a closed stream.
            Inbound::Frame(payload) if payload.is_empty() => {
                tracing::debug!("empty frame received");
                Err(Fatal::InputClosed)
            }
            Inbound::Frame(payload) => self.dispatch(&payload),
            Inbound::Oversized { declared } => {
                tracing::warn!(
                    declared,
                    max = self.config.frame.max_payload_size,
                    "oversized command discarded"
                );
                self.reject(Rejection::BadArg)
            }
        }
    }

    /// Handle one command payload.
    pub fn dispatch(&mut self, payload: &[u8]) -> Result<Flow, Fatal> {
        let decoder = Decoder::versioned(payload).map_err(Fatal::BadTerm)?;
        let mut envelope = match Envelope::parse(decoder) {
            Ok(envelope) => envelope,
            Err(rejection) => return self.reject(rejection),
        };
        tracing::debug!(operation = envelope.operation.name(), "command received");

        match envelope.operation {
            Operation::File => self.file(&mut envelope.argument),
            Operation::Bytes => self.bytes(&mut envelope.argument),
            Operation::AddDatabase => self.add_database(&mut envelope.argument),
            Operation::Reload => self.reload(),
            Operation::Stop => Ok(Flow::Stop),
        }
    }

    fn file(&mut self, argument: &mut Decoder<'_>) -> Result<Flow, Fatal> {
        if !self.registry.is_ready() {
            return self.reject(Rejection::DatabaseNotLoaded);
        }
        match command::path_argument(argument, self.config.max_path_len) {
            Ok(path) => self.classify(Input::Path(&path)),
            Err(rejection) => self.reject(rejection),
        }
    }

    fn bytes(&mut self, argument: &mut Decoder<'_>) -> Result<Flow, Fatal> {
        if !self.registry.is_ready() {
            return self.reject(Rejection::DatabaseNotLoaded);
        }
        match command::binary_argument(argument, self.config.max_bytes_len, Rejection::TooLong) {
            Ok(bytes) => self.classify(Input::Bytes(bytes)),
            Err(rejection) => self.reject(rejection),
        }
    }

    fn classify(&mut self, input: Input<'_>) -> Result<Flow, Fatal> {
        let response = match self.registry.classify(input) {
            Ok(labels) => Response::Classified(labels),
            Err(RegistryError::Classify { view, source }) => {
                tracing::debug!(%view, error = %source, "classification failed");
                Response::ClassifyFailed(source)
            }
            Err(err) => {
                tracing::warn!(error = %err, "classifier not ready");
                Response::Rejected(Rejection::DatabaseNotLoaded)
            }
        };
        self.respond(response)
    }

    fn add_database(&mut self, argument: &mut Decoder<'_>) -> Result<Flow, Fatal> {
        let database = match command::database_argument(argument, self.config.max_path_len) {
            Ok(database) => database,
            Err(rejection) => return self.reject(rejection),
        };
        let path = match &database {
            Database::Default => None,
            Database::Path(path) => Some(path.as_path()),
        };

        let response = match self.registry.load_all(path) {
            Ok(()) => {
                tracing::info!(database = ?database, "magic database loaded");
                Response::Loaded
            }
            Err(err) => {
                tracing::warn!(database = ?database, error = %err, "magic database not loaded");
                Response::NotLoaded
            }
        };
        self.respond(response)
    }

    fn reload(&mut self) -> Result<Flow, Fatal> {
        tracing::info!("reopening classifier views");
        self.start()?;
        Ok(Flow::Continue)
    }

    fn reject(&mut self, rejection: Rejection) -> Result<Flow, Fatal> {
        tracing::warn!(reason = rejection.atom(), "command rejected");
        self.respond(Response::Rejected(rejection))
    }

    fn respond(&mut self, response: Response) -> Result<Flow, Fatal> {
        let payload = response.encode()?;
        self.writer.send(&payload).map_err(exit::write_failure)?;
        Ok(Flow::Continue)
    }

    pub fn registry(&self) -> &ClassifierRegistry<E> {
        &self.registry
    }

    /// Drop the registry (closing its views) and return the streams.
    pub fn into_parts(self) -> (R, W) {
        (self.reader.into_inner(), self.writer.into_inner())
    }
}

