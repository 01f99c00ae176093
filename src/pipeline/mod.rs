//! The transcription and report workflow around the renderer.
//!
//! Speech-to-text and text generation are capabilities ([`Transcriber`],
//! [`Generator`]) chosen once from configuration. Results are memoized in an
//! injected [`ContentStore`] keyed by a [`Fingerprint`] of the inputs and the
//! model that produced them.

mod backend;
mod store;

use std::fs::File;
use std::path::Path;

use memmap2::Mmap;

use crate::error::Error;

pub use backend::{
    CommandGenerator, Generator, ReportModel, Transcriber, WhisperCpp, WhisperModel,
};
pub use store::{ContentStore, DirStore, Fingerprint, MemoryStore};

pub const DEFAULT_PROMPT: &str = "Please analyze the following transcription and answer these questions:

1. What is the main topic or subject of this audio?
2. What are the key points or main ideas discussed?
3. Are there any action items or tasks mentioned?
4. What is the overall tone or sentiment of the conversation?
5. Are there any important dates, numbers, or names mentioned?
6. What are the main conclusions or takeaways?

Please provide clear and concise answers to each question based on the transcription.";

/// Full generation prompt: the question template, a separator, then the transcript.
pub fn build_prompt(template: &str, transcript: &str) -> String {
    format!("{template}\n\n---\n\nTRANSCRIPTION:\n{transcript}")
}

/// Load a saved prompt template, falling back to [`DEFAULT_PROMPT`] when the
/// file does not exist.
pub fn load_prompt(path: &Path) -> Result<String, Error> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(DEFAULT_PROMPT.to_string()),
        Err(e) => Err(Error::Io(e)),
    }
}

pub fn save_prompt(path: &Path, template: &str) -> Result<(), Error> {
    std::fs::write(path, template).map_err(Error::Io)
}

/// The question template for a report run. An explicit `source` file wins
/// over the saved template at `path`. With `save`, the chosen template is
/// written to `path` so later runs use it by default; without a `source`
/// this only seeds `path` with [`DEFAULT_PROMPT`] when it is missing.
pub fn resolve_prompt(path: &Path, source: Option<&Path>, save: bool) -> Result<String, Error> {
    let template = match source {
        Some(src) => std::fs::read_to_string(src).map_err(|e| {
            Error::Io(std::io::Error::new(e.kind(), format!("{}: {}", e, src.display())))
        })?,
        None => load_prompt(path)?,
    };
    if save {
        save_prompt(path, &template)?;
        log::info!("Saved prompt template to {}", path.display());
    }
    Ok(template)
}

/// A result together with its cache address.
#[derive(Clone, Debug)]
pub struct Output {
    pub key: Fingerprint,
    pub text: String,
    pub cached: bool,
}

pub struct Session<S: ContentStore> {
    store: S,
}

impl<S: ContentStore> Session<S> {
    pub fn new(store: S) -> Self {
        Session { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn memoize(
        &mut self,
        key: Fingerprint,
        what: &str,
        produce: impl FnOnce() -> Result<String, Error>,
    ) -> Result<Output, Error> {
        if let Some(text) = self.store.get(&key) {
            log::info!("Using cached {what} ({key})");
            return Ok(Output {
                key,
                text,
                cached: true,
            });
        }
        let text = produce()?;
        if text.trim().is_empty() {
            return Err(Error::Backend(format!("{what} is empty")));
        }
        if let Err(e) = self.store.put(key, &text) {
            log::warn!("Could not cache {what}: {e}");
        }
        Ok(Output {
            key,
            text,
            cached: false,
        })
    }

    /// Transcribe `audio`, keyed on the file's bytes and the transcriber's model.
    pub fn transcript(
        &mut self,
        audio: &Path,
        transcriber: &dyn Transcriber,
    ) -> Result<Output, Error> {
        let file = File::open(audio).map_err(|e| {
            Error::Io(std::io::Error::new(e.kind(), format!("{}: {}", e, audio.display())))
        })?;
        let key = if file.metadata()?.len() == 0 {
            Fingerprint::of(&[b"", transcriber.model_id().as_bytes()])
        } else {
            let data = unsafe { Mmap::map(&file) }?;
            Fingerprint::of(&[&data[..], transcriber.model_id().as_bytes()])
        };
        self.memoize(key, "transcription", || transcriber.transcribe(audio))
    }

    /// Generate a report for a transcript, keyed on the transcript's key, the
    /// generator's model and the prompt template.
    pub fn report(
        &mut self,
        transcript: &Output,
        template: &str,
        generator: &dyn Generator,
    ) -> Result<Output, Error> {
        let key = Fingerprint::of(&[
            &transcript.key.as_bytes(),
            generator.model_id().as_bytes(),
            template.as_bytes(),
        ]);
        let prompt = build_prompt(template, &transcript.text);
        self.memoize(key, "report", || generator.generate(&prompt))
    }
}
