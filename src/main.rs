//! transcript-pdf - transcribe audio, generate reports, export them as PDF

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use memmap2::Mmap;

use transcript_pdf::pipeline::{
    CommandGenerator, ContentStore, DirStore, MemoryStore, ReportModel, Session,
    WhisperCpp, WhisperModel,
};
use transcript_pdf::{CustomFonts, Error, Face, StyleSpec};

#[derive(Parser)]
#[command(name = "transcript-pdf")]
#[command(version, about = "Transcribe audio and export transcripts and reports as PDF", long_about = None)]
#[command(after_help = "EXAMPLES:
    transcript-pdf render notes.md -o notes.pdf
    transcript-pdf transcribe meeting.wav --model small
    transcript-pdf report meeting.wav --generator llm --generator-arg=-m --generator-arg={model}")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a markdown-like text file to PDF
    Render {
        #[arg(value_name = "INPUT")]
        input: PathBuf,
        #[arg(short, long, value_name = "OUTPUT")]
        output: PathBuf,
        #[command(flatten)]
        render: RenderArgs,
    },
    /// Transcribe an audio file and export the transcript
    Transcribe {
        #[arg(value_name = "AUDIO")]
        audio: PathBuf,
        /// Defaults to <stem>_transcription.pdf next to the audio file
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,
        /// Also write the plain transcript to this file
        #[arg(long, value_name = "TXT")]
        text: Option<PathBuf>,
        #[command(flatten)]
        whisper: WhisperArgs,
        #[command(flatten)]
        render: RenderArgs,
    },
    /// Transcribe an audio file, generate a report from it, and export both
    Report {
        #[arg(value_name = "AUDIO")]
        audio: PathBuf,
        /// Defaults to <stem>_report.pdf next to the audio file
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,
        #[command(flatten)]
        whisper: WhisperArgs,
        #[command(flatten)]
        generator: GeneratorArgs,
        #[command(flatten)]
        render: RenderArgs,
    },
}

#[derive(Args)]
struct RenderArgs {
    /// Document title (defaults from the input file name)
    #[arg(long)]
    title: Option<String>,
    /// Style override, e.g. heading1.text_color=#AA0000 (repeatable)
    #[arg(long = "style", value_name = "KIND.KEY=VALUE")]
    styles: Vec<String>,
    #[arg(long, value_name = "TTF")]
    font_regular: Option<PathBuf>,
    #[arg(long, value_name = "TTF")]
    font_bold: Option<PathBuf>,
    #[arg(long, value_name = "TTF")]
    font_italic: Option<PathBuf>,
    #[arg(long, value_name = "TTF")]
    font_bold_italic: Option<PathBuf>,
    #[arg(long, value_name = "TTF")]
    font_mono: Option<PathBuf>,
}

#[derive(Args)]
struct WhisperArgs {
    /// whisper.cpp executable
    #[arg(long, default_value = "whisper-cli")]
    whisper_bin: PathBuf,
    /// Directory holding ggml-*.bin model files
    #[arg(long, default_value = "models")]
    model_dir: PathBuf,
    #[arg(long, value_enum, default_value_t = WhisperModel::Base)]
    model: WhisperModel,
    /// Do not read or write the on-disk cache
    #[arg(long)]
    no_cache: bool,
}

#[derive(Args)]
struct GeneratorArgs {
    /// Program that reads a prompt on stdin and prints the reply
    #[arg(long, default_value = "llm")]
    generator: PathBuf,
    /// Argument passed to the generator; {model} is replaced by the model id (repeatable)
    #[arg(long = "generator-arg", value_name = "ARG", allow_hyphen_values = true)]
    generator_args: Vec<String>,
    #[arg(long, value_enum, default_value_t = ReportModel::Gemini25Flash)]
    report_model: ReportModel,
    /// Saved question template; the built-in questions are used when it is missing
    #[arg(long, value_name = "FILE", default_value = "default_prompt.txt")]
    prompt: PathBuf,
    /// Read the question template for this run from FILE instead of --prompt
    #[arg(long, value_name = "FILE")]
    prompt_from: Option<PathBuf>,
    /// Store the template in use at --prompt (the --prompt-from file, or the
    /// built-in questions when --prompt does not exist yet)
    #[arg(long)]
    save_prompt: bool,
}

impl RenderArgs {
    fn style_spec(&self) -> StyleSpec {
        let mut spec = StyleSpec::default();
        for s in &self.styles {
            spec.apply_override(s);
        }
        spec
    }

    fn font_paths(&self) -> Vec<(Face, &Path)> {
        [
            (Face::Regular, &self.font_regular),
            (Face::Bold, &self.font_bold),
            (Face::Italic, &self.font_italic),
            (Face::BoldItalic, &self.font_bold_italic),
            (Face::Mono, &self.font_mono),
        ]
        .into_iter()
        .filter_map(|(face, path)| path.as_deref().map(|p| (face, p)))
        .collect()
    }
}

fn map_fonts(args: &RenderArgs) -> Result<Vec<(Face, Mmap)>, Error> {
    args.font_paths()
        .into_iter()
        .map(|(face, path)| {
            let file = std::fs::File::open(path).map_err(|e| {
                Error::Font(format!("cannot open {}: {e}", path.display()))
            })?;
            let mmap = unsafe { Mmap::map(&file) }?;
            Ok((face, mmap))
        })
        .collect()
}

fn write_pdf(title: &str, text: &str, args: &RenderArgs, output: &Path) -> Result<(), Error> {
    let mapped = map_fonts(args)?;
    let mut fonts = CustomFonts::new();
    for (face, mmap) in &mapped {
        fonts.set(*face, &mmap[..]);
    }
    let doc = transcript_pdf::markdown_to_pdf_with_fonts(title, text, &args.style_spec(), &fonts)?;
    std::fs::write(output, &doc.bytes)?;
    log::info!(
        "Wrote {} ({} page(s))",
        output.display(),
        doc.page_count
    );
    Ok(())
}

fn stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string())
}

fn sibling(audio: &Path, suffix: &str) -> PathBuf {
    audio.with_file_name(format!("{}_{suffix}.pdf", stem(audio)))
}

fn open_store(no_cache: bool) -> Box<dyn ContentStore> {
    if no_cache {
        return Box::new(MemoryStore::new());
    }
    match DirStore::open_default() {
        Some(store) => {
            log::debug!("cache: {}", store.root().display());
            Box::new(store)
        }
        None => {
            log::warn!("No cache directory available, results will not be persisted");
            Box::new(MemoryStore::new())
        }
    }
}

fn render(input: &Path, output: &Path, args: &RenderArgs) -> Result<(), Error> {
    let text = std::fs::read_to_string(input)?;
    let title = args.title.clone().unwrap_or_else(|| stem(input));
    write_pdf(&title, &text, args, output)
}

fn transcribe(
    audio: &Path,
    output: Option<PathBuf>,
    text_out: Option<PathBuf>,
    whisper: &WhisperArgs,
    args: &RenderArgs,
) -> Result<(), Error> {
    let transcriber = WhisperCpp::new(&whisper.whisper_bin, &whisper.model_dir, whisper.model);
    let mut session = Session::new(open_store(whisper.no_cache));
    let transcript = session.transcript(audio, &transcriber)?;

    if let Some(path) = text_out {
        std::fs::write(&path, &transcript.text)?;
    }
    let title = args
        .title
        .clone()
        .unwrap_or_else(|| format!("Transcription: {}", stem(audio)));
    let output = output.unwrap_or_else(|| sibling(audio, "transcription"));
    write_pdf(&title, &transcript.text, args, &output)
}

fn report(
    audio: &Path,
    output: Option<PathBuf>,
    whisper: &WhisperArgs,
    gen_args: &GeneratorArgs,
    args: &RenderArgs,
) -> Result<(), Error> {
    let template = transcript_pdf::pipeline::resolve_prompt(
        &gen_args.prompt,
        gen_args.prompt_from.as_deref(),
        gen_args.save_prompt,
    )?;

    let transcriber = WhisperCpp::new(&whisper.whisper_bin, &whisper.model_dir, whisper.model);
    let generator = CommandGenerator::new(
        &gen_args.generator,
        gen_args.generator_args.clone(),
        gen_args.report_model,
    );
    let mut session = Session::new(open_store(whisper.no_cache));
    let transcript = session.transcript(audio, &transcriber)?;
    let report = session.report(&transcript, &template, &generator)?;

    let name = stem(audio);
    write_pdf(
        &format!("Transcription: {name}"),
        &transcript.text,
        args,
        &sibling(audio, "transcription"),
    )?;
    let title = args.title.clone().unwrap_or_else(|| format!("Report: {name}"));
    let output = output.unwrap_or_else(|| sibling(audio, "report"));
    write_pdf(&title, &report.text, args, &output)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Render {
            input,
            output,
            render: args,
        } => render(&input, &output, &args),
        Command::Transcribe {
            audio,
            output,
            text,
            whisper,
            render: args,
        } => transcribe(&audio, output, text, &whisper, &args),
        Command::Report {
            audio,
            output,
            whisper,
            generator,
            render: args,
        } => report(&audio, output, &whisper, &generator, &args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
