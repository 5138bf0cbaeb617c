use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::application::EmbeddingService;
use crate::domain::{Embedding, EmbeddingConfig, EmbeddingResult, ExtractionFailure};

/// How to launch the external embedding generator.
#[derive(Debug, Clone)]
pub struct ProcessEmbeddingConfig {
    /// Executable to run, e.g. `python3` or a script with a shebang.
    pub program: PathBuf,
    /// Arguments placed before the image path.
    pub args: Vec<String>,
    /// Wall-clock bound on a single invocation.
    pub timeout: Duration,
}

impl ProcessEmbeddingConfig {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Wire format printed by the generator.
#[derive(Debug, Deserialize)]
struct GeneratorPayload {
    success: bool,
    #[serde(default)]
    embedding: Option<Vec<f32>>,
    #[serde(default)]
    error: Option<String>,
}

/// Runs the generator as a child process, once per image.
///
/// The child is killed if the call times out or the calling future is dropped.
pub struct ProcessEmbedding {
    process: ProcessEmbeddingConfig,
    config: EmbeddingConfig,
}

impl ProcessEmbedding {
    pub fn new(process: ProcessEmbeddingConfig, config: EmbeddingConfig) -> Self {
        info!(
            "Embedding generator: {} {} (timeout {}s)",
            process.program.display(),
            process.args.join(" "),
            process.timeout.as_secs_f64()
        );
        Self { process, config }
    }

    async fn run(&self, image_path: &Path) -> Result<Vec<u8>, ExtractionFailure> {
        let child = tokio::process::Command::new(&self.process.program)
            .args(&self.process.args)
            .arg(image_path)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.process.timeout, child).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(ExtractionFailure::execution(
                    format!(
                        "failed to spawn {}: {}",
                        self.process.program.display(),
                        e
                    ),
                    "",
                ))
            }
            Err(_) => {
                warn!(
                    "Embedding generator timed out after {:.1}s on {}",
                    self.process.timeout.as_secs_f64(),
                    image_path.display()
                );
                return Err(ExtractionFailure::execution(
                    format!(
                        "generator timed out after {:.1}s",
                        self.process.timeout.as_secs_f64()
                    ),
                    "",
                ));
            }
        };

        let mut combined = output.stdout;
        combined.extend_from_slice(&output.stderr);

        if !output.status.success() {
            return Err(ExtractionFailure::execution(
                format!("generator failed ({})", output.status),
                String::from_utf8_lossy(&combined),
            ));
        }

        Ok(combined)
    }
}

#[async_trait]
impl EmbeddingService for ProcessEmbedding {
    async fn extract(&self, image_path: &Path) -> EmbeddingResult {
        debug!("Running embedding generator on {}", image_path.display());
        let output = self.run(image_path).await?;
        interpret_output(&output)
    }

    fn config(&self) -> &EmbeddingConfig {
        &self.config
    }
}

/// Returns the span from the first `{` to the last `}`, inclusive.
pub fn locate_payload(output: &[u8]) -> Option<&[u8]> {
    let start = output.iter().position(|&b| b == b'{')?;
    let end = output.iter().rposition(|&b| b == b'}')?;
    if end < start {
        return None;
    }
    Some(&output[start..=end])
}

/// Maps raw generator output of a successful run onto an [`EmbeddingResult`].
pub fn interpret_output(output: &[u8]) -> EmbeddingResult {
    let payload = locate_payload(output).ok_or_else(|| {
        ExtractionFailure::malformed(format!(
            "no JSON found in output\nOutput was: {}",
            String::from_utf8_lossy(output).trim()
        ))
    })?;

    let parsed: GeneratorPayload = serde_json::from_slice(payload).map_err(|e| {
        ExtractionFailure::malformed(format!(
            "failed to parse JSON output: {}\nJSON was: {}",
            e,
            String::from_utf8_lossy(payload)
        ))
    })?;

    if !parsed.success {
        return Err(ExtractionFailure::Detection(parsed.error.unwrap_or_default()));
    }

    match parsed.embedding {
        Some(vector) if !vector.is_empty() => Ok(Embedding::new(vector)),
        _ => Err(ExtractionFailure::NoFaceDetected),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embedding_json(dims: usize) -> String {
        let values: Vec<String> = (0..dims).map(|i| format!("{}", (i as f32) / 1000.0)).collect();
        format!("{{\"success\":true,\"embedding\":[{}]}}", values.join(","))
    }

    #[test]
    fn test_locate_payload_ignores_surrounding_noise() {
        let output = b"loading model...\n{\"a\":{\"b\":1}}\ndone.\n";
        assert_eq!(locate_payload(output).unwrap(), b"{\"a\":{\"b\":1}}");
    }

    #[test]
    fn test_locate_payload_requires_both_braces() {
        assert!(locate_payload(b"no json here").is_none());
        assert!(locate_payload(b"only { open").is_none());
        assert!(locate_payload(b"} reversed {").is_none());
    }

    #[test]
    fn test_interpret_success_in_noisy_output() {
        let output = format!(
            "WARNING: onnxruntime using CPU\n{}\nINFO: finished\n",
            embedding_json(512)
        );
        let embedding = interpret_output(output.as_bytes()).unwrap();
        assert_eq!(embedding.dimensions(), 512);
        assert_eq!(embedding.vector()[1], 0.001);
    }

    #[test]
    fn test_interpret_empty_embedding_is_no_face() {
        let result = interpret_output(br#"{"success":true,"embedding":[]}"#);
        assert_eq!(result, Err(ExtractionFailure::NoFaceDetected));

        let result = interpret_output(br#"{"success":true,"embedding":null}"#);
        assert_eq!(result, Err(ExtractionFailure::NoFaceDetected));
    }

    #[test]
    fn test_interpret_reported_failure() {
        let result = interpret_output(br#"{"success":false,"error":"cannot read image"}"#);
        assert_eq!(
            result,
            Err(ExtractionFailure::Detection("cannot read image".to_string()))
        );
    }

    #[test]
    fn test_interpret_malformed_payloads() {
        for output in [
            &b"Traceback (most recent call last): boom"[..],
            &b"{not json}"[..],
            &br#"{"embedding":[0.1]}"#[..],
            &br#"{"success":"yes"}"#[..],
        ] {
            assert!(
                matches!(
                    interpret_output(output),
                    Err(ExtractionFailure::MalformedOutput { .. })
                ),
                "expected malformed output for {:?}",
                String::from_utf8_lossy(output)
            );
        }
    }

    #[cfg(unix)]
    fn shell(script: &str, timeout: Duration) -> ProcessEmbedding {
        let process = ProcessEmbeddingConfig::new("sh")
            .with_args(vec!["-c".to_string(), script.to_string(), "sh".to_string()])
            .with_timeout(timeout);
        ProcessEmbedding::new(process, EmbeddingConfig::new("test", 3))
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_passes_image_path_and_parses_output() {
        let service = shell(
            r#"echo "processing $1"; echo '{"success":true,"embedding":[0.5,0.25,0.125]}'"#,
            Duration::from_secs(10),
        );

        let embedding = service.extract(Path::new("face.jpg")).await.unwrap();
        assert_eq!(embedding.vector(), &[0.5, 0.25, 0.125]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_nonzero_exit_is_execution_failure() {
        let service = shell("echo 'model crashed' >&2; exit 3", Duration::from_secs(10));

        match service.extract(Path::new("face.jpg")).await {
            Err(ExtractionFailure::Execution { output, .. }) => {
                assert!(output.contains("model crashed"));
            }
            other => panic!("expected execution failure, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_timeout_is_execution_failure() {
        let service = shell("sleep 5", Duration::from_millis(200));

        let result = service.extract(Path::new("face.jpg")).await;
        assert!(matches!(result, Err(ExtractionFailure::Execution { .. })));
    }

    #[tokio::test]
    async fn test_missing_program_is_execution_failure() {
        let process = ProcessEmbeddingConfig::new("/nonexistent/embedding-generator");
        let service = ProcessEmbedding::new(process, EmbeddingConfig::default());

        let result = service.extract(Path::new("face.jpg")).await;
        assert!(matches!(result, Err(ExtractionFailure::Execution { .. })));
    }
}
