use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::Error;

/// Speech-to-text capability.
pub trait Transcriber {
    /// Stable identifier of the model, part of the cache key.
    fn model_id(&self) -> &str;
    fn transcribe(&self, audio: &Path) -> Result<String, Error>;
}

/// Text-generation capability.
pub trait Generator {
    /// Stable identifier of the model, part of the cache key.
    fn model_id(&self) -> &str;
    fn generate(&self, prompt: &str) -> Result<String, Error>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum WhisperModel {
    Base,
    Small,
    Medium,
    Large,
}

impl WhisperModel {
    pub fn name(self) -> &'static str {
        match self {
            WhisperModel::Base => "base",
            WhisperModel::Small => "small",
            WhisperModel::Medium => "medium",
            WhisperModel::Large => "large",
        }
    }

    /// ggml model file as distributed for whisper.cpp.
    pub fn file_name(self) -> &'static str {
        match self {
            WhisperModel::Base => "ggml-base.bin",
            WhisperModel::Small => "ggml-small.bin",
            WhisperModel::Medium => "ggml-medium.bin",
            WhisperModel::Large => "ggml-large-v3.bin",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum ReportModel {
    #[cfg_attr(feature = "cli", value(name = "gemini-2.5-flash"))]
    Gemini25Flash,
    #[cfg_attr(feature = "cli", value(name = "gemini-2.5-pro"))]
    Gemini25Pro,
    #[cfg_attr(feature = "cli", value(name = "gemini-2.0-flash"))]
    Gemini20Flash,
}

impl ReportModel {
    pub fn id(self) -> &'static str {
        match self {
            ReportModel::Gemini25Flash => "models/gemini-2.5-flash",
            ReportModel::Gemini25Pro => "models/gemini-2.5-pro",
            ReportModel::Gemini20Flash => "models/gemini-2.0-flash",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ReportModel::Gemini25Flash => "Gemini 2.5 Flash (Fast)",
            ReportModel::Gemini25Pro => "Gemini 2.5 Pro (High Quality)",
            ReportModel::Gemini20Flash => "Gemini 2.0 Flash (Stable)",
        }
    }
}

fn failure(program: &Path, output: &std::process::Output) -> Error {
    let stderr = String::from_utf8_lossy(&output.stderr);
    Error::Backend(format!(
        "{} exited with {}: {}",
        program.display(),
        output.status,
        stderr.trim()
    ))
}

/// Runs a whisper.cpp binary (`whisper-cli -m MODEL -f AUDIO -nt`) and reads
/// the transcript from its stdout.
pub struct WhisperCpp {
    program: PathBuf,
    model_path: PathBuf,
    model_id: String,
}

impl WhisperCpp {
    pub fn new(program: impl Into<PathBuf>, model_dir: &Path, model: WhisperModel) -> Self {
        WhisperCpp {
            program: program.into(),
            model_path: model_dir.join(model.file_name()),
            model_id: format!("whisper.cpp/{}", model.name()),
        }
    }
}

impl Transcriber for WhisperCpp {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn transcribe(&self, audio: &Path) -> Result<String, Error> {
        if !self.model_path.exists() {
            return Err(Error::Backend(format!(
                "whisper model not found: {}",
                self.model_path.display()
            )));
        }
        log::info!("Transcribing {} with {}", audio.display(), self.model_id);
        let output = Command::new(&self.program)
            .arg("-m")
            .arg(&self.model_path)
            .arg("-f")
            .arg(audio)
            .arg("-nt")
            .stdin(Stdio::null())
            .output()?;
        if !output.status.success() {
            return Err(failure(&self.program, &output));
        }
        let text = String::from_utf8_lossy(&output.stdout);
        let joined = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        Ok(joined)
    }
}

/// Runs a text-generation command with the prompt on stdin and takes its
/// stdout as the reply. `{model}` in any argument is replaced by the model id.
pub struct CommandGenerator {
    program: PathBuf,
    args: Vec<String>,
    model: ReportModel,
}

impl CommandGenerator {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>, model: ReportModel) -> Self {
        CommandGenerator {
            program: program.into(),
            args,
            model,
        }
    }

    fn resolved_args(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.replace("{model}", self.model.id()))
            .collect()
    }
}

impl Generator for CommandGenerator {
    fn model_id(&self) -> &str {
        self.model.id()
    }

    fn generate(&self, prompt: &str) -> Result<String, Error> {
        log::info!(
            "Generating report with {} via {}",
            self.model.label(),
            self.program.display()
        );
        let mut child = Command::new(&self.program)
            .args(self.resolved_args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // Feed stdin from a separate thread; the child may fill its stdout pipe first
        let writer = child.stdin.take().map(|mut stdin| {
            let prompt = prompt.to_string();
            std::thread::spawn(move || stdin.write_all(prompt.as_bytes()))
        });
        let output = child.wait_with_output()?;
        if let Some(handle) = writer {
            match handle.join() {
                Ok(Ok(())) => {}
                // The command may exit without reading its whole input
                Ok(Err(e)) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                    log::debug!("generator closed stdin early");
                }
                Ok(Err(e)) => return Err(Error::Io(e)),
                Err(_) => return Err(Error::Backend("prompt writer thread panicked".into())),
            }
        }

        if !output.status.success() {
            return Err(failure(&self.program, &output));
        }
        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if text.is_empty() {
            return Err(Error::Backend(format!(
                "{} returned no text",
                self.program.display()
            )));
        }
        Ok(text)
    }
}
