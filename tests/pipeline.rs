mod common;

use std::cell::Cell;
use std::path::Path;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use transcript_pdf::Error;
use transcript_pdf::pipeline::{
    ContentStore, DEFAULT_PROMPT, DirStore, Fingerprint, Generator, MemoryStore, Session,
    Transcriber, build_prompt, load_prompt, resolve_prompt, save_prompt,
};

struct FakeTranscriber {
    model: &'static str,
    reply: &'static str,
    calls: Cell<usize>,
}

impl FakeTranscriber {
    fn new(model: &'static str, reply: &'static str) -> Self {
        FakeTranscriber {
            model,
            reply,
            calls: Cell::new(0),
        }
    }
}

impl Transcriber for FakeTranscriber {
    fn model_id(&self) -> &str {
        self.model
    }

    fn transcribe(&self, _audio: &Path) -> Result<String, Error> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.reply.to_string())
    }
}

struct EchoGenerator {
    calls: Cell<usize>,
}

impl Generator for EchoGenerator {
    fn model_id(&self) -> &str {
        "models/echo"
    }

    fn generate(&self, prompt: &str) -> Result<String, Error> {
        self.calls.set(self.calls.get() + 1);
        Ok(format!("# Report\n\n{} chars of prompt", prompt.len()))
    }
}

struct FailingGenerator;

impl Generator for FailingGenerator {
    fn model_id(&self) -> &str {
        "models/failing"
    }

    fn generate(&self, _prompt: &str) -> Result<String, Error> {
        Err(Error::Backend("quota exceeded".into()))
    }
}

#[test]
fn fingerprint_separates_parts() {
    let a = Fingerprint::of(&[b"ab", b"c"]);
    let b = Fingerprint::of(&[b"a", b"bc"]);
    assert_ne!(a, b);
    assert_eq!(a, Fingerprint::of(&[b"ab", b"c"]));
    assert_eq!(a.hex().len(), 40);
    assert!(a.hex().bytes().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(a.to_string(), a.hex());
    assert_eq!(
        Fingerprint::of(&[]).hex(),
        "da39a3ee5e6b4b0d3255bfef95601890afd80709"
    );
    assert_eq!(a.as_bytes().len(), 20);
}

#[test]
fn memory_store_round_trip() {
    let mut store = MemoryStore::new();
    let key = Fingerprint::of(&[b"k"]);
    assert!(store.get(&key).is_none());
    store.put(key, "value").expect("put");
    assert_eq!(store.get(&key).as_deref(), Some("value"));
    assert_eq!(store.len(), 1);
}

#[test]
fn dir_store_persists_across_instances() {
    let tmp = TempDir::new().expect("temp dir");
    let dir = tmp.path();
    let key = Fingerprint::of(&[b"audio", b"whisper.cpp/base"]);
    {
        let mut store = DirStore::new(dir.join("cache"));
        store.put(key, "hello transcript").expect("put");
    }
    let store = DirStore::new(dir.join("cache"));
    assert_eq!(store.get(&key).as_deref(), Some("hello transcript"));
    assert!(dir.join("cache").join(format!("{}.txt", key.hex())).exists());
}

#[test]
fn transcript_is_memoized_per_audio_and_model() {
    let tmp = TempDir::new().expect("temp dir");
    let dir = tmp.path();
    let audio = dir.join("meeting.wav");
    std::fs::write(&audio, b"RIFF fake audio").expect("write audio");

    let base = FakeTranscriber::new("whisper.cpp/base", "hello world");
    let mut session = Session::new(MemoryStore::new());

    let first = session.transcript(&audio, &base).expect("first");
    let second = session.transcript(&audio, &base).expect("second");
    assert!(!first.cached);
    assert!(second.cached);
    assert_eq!(first.key, second.key);
    assert_eq!(second.text, "hello world");
    assert_eq!(base.calls.get(), 1);

    let small = FakeTranscriber::new("whisper.cpp/small", "hello there");
    let other = session.transcript(&audio, &small).expect("other model");
    assert!(!other.cached);
    assert_ne!(other.key, first.key);

    std::fs::write(&audio, b"RIFF different audio").expect("rewrite audio");
    let changed = session.transcript(&audio, &base).expect("changed audio");
    assert!(!changed.cached);
    assert_eq!(base.calls.get(), 2);
    assert_eq!(session.store().len(), 3);
}

#[test]
fn empty_transcript_is_a_backend_error() {
    let tmp = TempDir::new().expect("temp dir");
    let dir = tmp.path();
    let audio = dir.join("silence.wav");
    std::fs::write(&audio, b"").expect("write audio");

    let silent = FakeTranscriber::new("whisper.cpp/base", "  \n ");
    let mut session = Session::new(MemoryStore::new());
    let err = session.transcript(&audio, &silent).unwrap_err();
    assert!(matches!(err, Error::Backend(_)), "{err}");
    assert!(session.store().is_empty());
}

#[test]
fn missing_audio_is_an_io_error() {
    let t = FakeTranscriber::new("whisper.cpp/base", "x");
    let mut session = Session::new(MemoryStore::new());
    let err = session
        .transcript(Path::new("/nonexistent/audio.wav"), &t)
        .unwrap_err();
    assert!(matches!(err, Error::Io(_)), "{err}");
    assert_eq!(t.calls.get(), 0);
}

#[test]
fn report_is_memoized_per_prompt() {
    let tmp = TempDir::new().expect("temp dir");
    let dir = tmp.path();
    let audio = dir.join("call.mp3");
    std::fs::write(&audio, b"ID3 fake").expect("write audio");

    let t = FakeTranscriber::new("whisper.cpp/base", "we agreed to ship on friday");
    let g = EchoGenerator { calls: Cell::new(0) };
    let mut session = Session::new(MemoryStore::new());

    let transcript = session.transcript(&audio, &t).expect("transcript");
    let first = session.report(&transcript, DEFAULT_PROMPT, &g).expect("report");
    let again = session.report(&transcript, DEFAULT_PROMPT, &g).expect("report again");
    assert!(!first.cached);
    assert!(again.cached);
    assert_eq!(first.text, again.text);
    assert_eq!(g.calls.get(), 1);

    let custom = session
        .report(&transcript, "Summarize in one line.", &g)
        .expect("custom prompt");
    assert!(!custom.cached);
    assert_eq!(g.calls.get(), 2);
}

#[test]
fn generator_failure_is_not_cached() {
    let tmp = TempDir::new().expect("temp dir");
    let dir = tmp.path();
    let audio = dir.join("a.wav");
    std::fs::write(&audio, b"data").expect("write audio");

    let t = FakeTranscriber::new("whisper.cpp/base", "text");
    let mut session = Session::new(MemoryStore::new());
    let transcript = session.transcript(&audio, &t).expect("transcript");
    let err = session
        .report(&transcript, DEFAULT_PROMPT, &FailingGenerator)
        .unwrap_err();
    assert!(err.to_string().contains("quota exceeded"));
    assert_eq!(session.store().len(), 1);
}

#[test]
fn session_works_over_a_boxed_store() {
    let tmp = TempDir::new().expect("temp dir");
    let dir = tmp.path();
    let audio = dir.join("a.wav");
    std::fs::write(&audio, b"data").expect("write audio");

    let store: Box<dyn ContentStore> = Box::new(DirStore::new(dir.join("cache")));
    let t = FakeTranscriber::new("whisper.cpp/base", "persisted");
    let key = Session::new(store).transcript(&audio, &t).expect("first").key;

    let reopened: Box<dyn ContentStore> = Box::new(DirStore::new(dir.join("cache")));
    let hit = Session::new(reopened).transcript(&audio, &t).expect("second");
    assert!(hit.cached);
    assert_eq!(hit.key, key);
    assert_eq!(t.calls.get(), 1);
}

#[test]
fn prompt_layout() {
    assert_eq!(
        build_prompt("Q?", "said things"),
        "Q?\n\n---\n\nTRANSCRIPTION:\nsaid things"
    );
    assert!(DEFAULT_PROMPT.contains("6. What are the main conclusions or takeaways?"));
}

#[test]
fn prompt_file_falls_back_to_default_and_saves() {
    let tmp = TempDir::new().expect("temp dir");
    let dir = tmp.path();
    let path = dir.join("default_prompt.txt");
    assert_eq!(load_prompt(&path).expect("load"), DEFAULT_PROMPT);
    save_prompt(&path, "Custom questions").expect("save");
    assert_eq!(load_prompt(&path).expect("reload"), "Custom questions");
}

#[test]
fn prompt_source_file_overrides_and_can_be_saved() {
    let tmp = TempDir::new().expect("temp dir");
    let saved = tmp.path().join("default_prompt.txt");
    let source = tmp.path().join("questions.txt");
    std::fs::write(&source, "Who spoke first?").expect("write source");

    assert_eq!(
        resolve_prompt(&saved, Some(&source), false).expect("from source"),
        "Who spoke first?"
    );
    assert!(!saved.exists());

    assert_eq!(
        resolve_prompt(&saved, Some(&source), true).expect("save source"),
        "Who spoke first?"
    );
    assert_eq!(load_prompt(&saved).expect("reload"), "Who spoke first?");
    assert_eq!(
        resolve_prompt(&saved, None, false).expect("saved"),
        "Who spoke first?"
    );

    let missing = tmp.path().join("nope.txt");
    let err = resolve_prompt(&saved, Some(&missing), true).unwrap_err();
    assert!(matches!(err, Error::Io(_)), "{err}");
    assert!(err.to_string().contains("nope.txt"), "{err}");
}

#[test]
fn saving_without_a_source_seeds_the_default_questions() {
    let tmp = TempDir::new().expect("temp dir");
    let saved = tmp.path().join("default_prompt.txt");
    assert_eq!(
        resolve_prompt(&saved, None, true).expect("seed"),
        DEFAULT_PROMPT
    );
    assert_eq!(
        std::fs::read_to_string(&saved).expect("seeded file"),
        DEFAULT_PROMPT
    );
}

#[cfg(unix)]
#[test]
fn command_generator_pipes_prompt_through_a_program() {
    use transcript_pdf::pipeline::{CommandGenerator, ReportModel};

    let g = CommandGenerator::new("cat", Vec::new(), ReportModel::Gemini25Pro);
    assert_eq!(g.model_id(), "models/gemini-2.5-pro");
    let reply = g.generate("echo me back\n").expect("cat generator");
    assert_eq!(reply, "echo me back");

    let silent = CommandGenerator::new("true", Vec::new(), ReportModel::Gemini25Flash);
    assert!(matches!(silent.generate("ignored"), Err(Error::Backend(_))));
}

#[test]
fn whisper_backend_requires_its_model_file() {
    use transcript_pdf::pipeline::{WhisperCpp, WhisperModel};

    let tmp = TempDir::new().expect("temp dir");
    let dir = tmp.path();
    let w = WhisperCpp::new("whisper-cli", dir, WhisperModel::Small);
    assert_eq!(w.model_id(), "whisper.cpp/small");
    let err = w.transcribe(&dir.join("a.wav")).unwrap_err();
    assert!(err.to_string().contains("ggml-small.bin"), "{err}");
}
