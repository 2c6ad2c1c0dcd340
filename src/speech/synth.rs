use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    process::{Command, Stdio},
    time::Instant,
};

use log::{debug, error};
use shlex::Shlex;
use thiserror::Error;

/// Environment override for the synthesiser command line, parsed with shell
/// quoting rules. Defaults to `piper` on PATH.
pub const PIPER_COMMAND_ENV: &str = "READABLE_PIPER_COMMAND";

const DEFAULT_PROGRAM: &str = "piper";

#[derive(Debug, Error)]
pub enum EngineFailure {
    #[error("voice model not found at {0}")]
    VoiceNotFound(PathBuf),
    #[error("no speech synthesiser available: {0}")]
    Unavailable(String),
    #[error("failed to launch the synthesiser: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("synthesiser exited with status {status}: {stderr}")]
    SynthFailed { status: i32, stderr: String },
    #[error("no audio playback device found")]
    Device,
    #[error("synthesised audio is corrupt: {0}")]
    Decode(String),
    #[error("{0}")]
    Other(String),
}

/// How to reach the Piper synthesiser and where to put its output.
#[derive(Debug, Clone)]
pub struct PiperConfig {
    pub voice_model: PathBuf,
    pub output_dir: PathBuf,
    pub speaker: Option<String>,
    pub length_scale: Option<f32>,
}

impl PiperConfig {
    pub fn new(voice_model: PathBuf, output_dir: PathBuf) -> Self {
        Self {
            voice_model,
            output_dir,
            speaker: None,
            length_scale: None,
        }
    }
}

fn base_command() -> Result<Command, EngineFailure> {
    if let Some(raw) = std::env::var_os(PIPER_COMMAND_ENV) {
        let raw = raw.to_string_lossy().into_owned();
        let mut parts: Vec<String> = Shlex::new(&raw).collect();
        if parts.is_empty() {
            return Err(EngineFailure::Unavailable(format!(
                "{PIPER_COMMAND_ENV} is empty"
            )));
        }
        let program = parts.remove(0);
        let mut command = Command::new(program);
        command.args(parts);
        Ok(command)
    } else {
        Ok(Command::new(DEFAULT_PROGRAM))
    }
}

fn program_on_path(program: &str) -> bool {
    let Some(paths) = std::env::var_os("PATH") else {
        return false;
    };
    std::env::split_paths(&paths).any(|dir| dir.join(program).is_file())
}

/// One-shot startup check: does the configured synthesiser exist at all?
/// Callers treat a failure here as "speech unsupported" and do not retry.
pub fn check_available(config: &PiperConfig) -> Result<(), EngineFailure> {
    if std::env::var_os(PIPER_COMMAND_ENV).is_none() && !program_on_path(DEFAULT_PROGRAM) {
        return Err(EngineFailure::Unavailable(format!(
            "'{DEFAULT_PROGRAM}' not found on PATH and {PIPER_COMMAND_ENV} is unset"
        )));
    }
    if !config.voice_model.exists() {
        return Err(EngineFailure::VoiceNotFound(config.voice_model.clone()));
    }
    Ok(())
}

/// Runs the synthesiser, feeding `text` on stdin and writing a WAV to `out`.
pub fn synthesize(config: &PiperConfig, text: &str, out: &Path) -> Result<(), EngineFailure> {
    if !config.voice_model.exists() {
        return Err(EngineFailure::VoiceNotFound(config.voice_model.clone()));
    }

    if let Some(parent) = out.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| {
            EngineFailure::Other(format!(
                "unable to create output directory {}: {err}",
                parent.display()
            ))
        })?;
    }

    let start = Instant::now();
    let mut command = base_command()?;
    command.arg("--model").arg(&config.voice_model);
    command.arg("--output_file").arg(out);
    if let Some(speaker) = &config.speaker {
        command.arg("--speaker").arg(speaker);
    }
    if let Some(scale) = config.length_scale {
        command.arg("--length_scale").arg(scale.to_string());
    }

    let mut child = command
        .stdin(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(EngineFailure::Spawn)?;
    {
        let stdin = child
            .stdin
            .as_mut()
            .ok_or_else(|| EngineFailure::Other("failed to access synthesiser stdin".into()))?;
        stdin
            .write_all(text.as_bytes())
            .map_err(|err| EngineFailure::Other(err.to_string()))?;
    }
    let output = child
        .wait_with_output()
        .map_err(|err| EngineFailure::Other(err.to_string()))?;
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

    if !output.status.success() {
        let status = output.status.code().unwrap_or_default();
        error!("Synthesiser exited with status {status}: {stderr}");
        return Err(EngineFailure::SynthFailed { status, stderr });
    }

    debug!(
        "Synthesised {} chars to {} in {} ms",
        text.len(),
        out.display(),
        start.elapsed().as_millis()
    );
    Ok(())
}
