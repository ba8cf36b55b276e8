/// Process Runner - One Child Process per Compile or Run Step
///
/// **Guarantees:**
/// - Argument-vector invocation only; nothing is ever passed through a shell
/// - stdin is written in full and then closed, so interpreters that wait for
///   EOF start processing
/// - stdout/stderr capture is bounded by `max_output_bytes` per stream; the
///   excess is drained and discarded so the child never blocks on a full pipe
/// - The child runs in its own process group; the whole group is killed when
///   the deadline passes or the child exits, and partial output is kept
/// - Spawn failures come back as data, never as `Err`
use examiner_common::types::{ExecutionResult, Failure};
use std::ffi::{OsStr, OsString};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// How long to wait for both pipe readers after the child is gone
const OUTPUT_DRAIN_GRACE: Duration = Duration::from_millis(500);
const READ_CHUNK_BYTES: usize = 8 * 1024;

/// Program, arguments, working directory and environment adjustments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    program: OsString,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
    env_remove: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        Self {
            program: program.as_ref().to_os_string(),
            args: Vec::new(),
            cwd: None,
            env_remove: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn env_remove(mut self, key: impl Into<String>) -> Self {
        self.env_remove.push(key.into());
        self
    }

    pub fn program(&self) -> &OsStr {
        &self.program
    }

    pub fn arguments(&self) -> &[OsString] {
        &self.args
    }

    pub fn display_program(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }
}

/// Raw observation of one child process
#[derive(Debug)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    pub status: Option<ExitStatus>,
    pub timed_out: bool,
    pub elapsed: Duration,
    pub output_truncated: bool,
    pub spawn_error: Option<io::Error>,
    program: String,
}

impl ProcessOutput {
    fn spawn_failed(program: String, error: io::Error, elapsed: Duration) -> Self {
        Self {
            stdout: String::new(),
            stderr: String::new(),
            status: None,
            timed_out: false,
            elapsed,
            output_truncated: false,
            spawn_error: Some(error),
            program,
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed.as_millis() as u64
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.status.and_then(|s| s.code())
    }

    /// The binary itself could not be found on the search path
    pub fn binary_missing(&self) -> bool {
        self.spawn_error
            .as_ref()
            .map(|e| e.kind() == io::ErrorKind::NotFound)
            .unwrap_or(false)
    }

    /// Exited on its own with status 0
    pub fn exited_cleanly(&self) -> bool {
        !self.timed_out && self.status.map(|s| s.success()).unwrap_or(false)
    }

    /// Diagnostic text for a failed step: stderr, falling back to stdout,
    /// falling back to a description of the exit status
    pub fn diagnostic(&self) -> String {
        if !self.stderr.trim().is_empty() {
            return self.stderr.clone();
        }
        if !self.stdout.trim().is_empty() {
            return self.stdout.clone();
        }
        describe_status(self.status)
    }

    /// Classify the observation for a run step.
    ///
    /// `stderr_is_failure` treats output on the error channel as a failed run
    /// even when the exit status is 0.
    pub fn into_execution_result(self, stderr_is_failure: bool) -> ExecutionResult {
        let execution_time_ms = self.elapsed_ms();
        let exit_code = self.exit_code();

        if let Some(e) = &self.spawn_error {
            let mut result = ExecutionResult::infrastructure(format!(
                "Failed to start `{}`: {}",
                self.program, e
            ));
            result.execution_time_ms = execution_time_ms;
            return result;
        }

        let (failure, error) = if self.timed_out {
            (
                Some(Failure::TimedOut),
                Some(format!("Time limit exceeded after {}ms", execution_time_ms)),
            )
        } else if !self.status.map(|s| s.success()).unwrap_or(false) {
            (Some(Failure::RuntimeFailed), Some(self.diagnostic()))
        } else if stderr_is_failure && !self.stderr.trim().is_empty() {
            (Some(Failure::RuntimeFailed), Some(self.stderr.clone()))
        } else {
            (None, None)
        };

        ExecutionResult {
            success: failure.is_none(),
            stdout: self.stdout,
            stderr: self.stderr,
            execution_time_ms,
            failure,
            error,
            exit_code,
            output_truncated: self.output_truncated,
        }
    }
}

fn describe_status(status: Option<ExitStatus>) -> String {
    let Some(status) = status else {
        return "Process did not report an exit status".to_string();
    };
    if let Some(code) = status.code() {
        return format!("Process exited with code {}", code);
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return format!("Process terminated by signal {}", signal);
        }
    }
    "Process terminated abnormally".to_string()
}

#[derive(Debug, Clone)]
pub struct ProcessRunner {
    max_output_bytes: usize,
}

impl ProcessRunner {
    pub fn new(max_output_bytes: usize) -> Self {
        Self { max_output_bytes }
    }

    pub fn max_output_bytes(&self) -> usize {
        self.max_output_bytes
    }

    /// Run `spec` to completion or until `timeout` elapses
    pub async fn spawn(&self, spec: &CommandSpec, stdin: &str, timeout: Duration) -> ProcessOutput {
        let program = spec.display_program();
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .stdin(if stdin.is_empty() { Stdio::null() } else { Stdio::piped() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group, so the deadline kill reaches anything it forks
        #[cfg(unix)]
        cmd.process_group(0);
        if let Some(cwd) = &spec.cwd {
            cmd.current_dir(cwd);
        }
        for key in &spec.env_remove {
            cmd.env_remove(key);
        }

        let start = Instant::now();
        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                debug!(program = %program, error = %e, "Spawn failed");
                return ProcessOutput::spawn_failed(program, e, start.elapsed());
            }
        };

        // Taken now: `id()` is gone once the child has been reaped
        let pid = child.id();

        let stdout_capture = SharedCapture::default();
        let stderr_capture = SharedCapture::default();
        let stdout_reader = child.stdout.take().map(|pipe| {
            tokio::spawn(read_bounded(pipe, self.max_output_bytes, stdout_capture.clone()))
        });
        let stderr_reader = child.stderr.take().map(|pipe| {
            tokio::spawn(read_bounded(pipe, self.max_output_bytes, stderr_capture.clone()))
        });

        let stdin_writer = child.stdin.take().map(|mut pipe| {
            let input = stdin.as_bytes().to_vec();
            tokio::spawn(async move {
                let written = pipe.write_all(&input).await;
                // Dropping the handle closes the stream and signals EOF
                drop(pipe);
                written
            })
        });

        let (status, timed_out) = match tokio::time::timeout(timeout, child.wait()).await {
            Ok(Ok(status)) => (Some(status), false),
            Ok(Err(e)) => {
                warn!(program = %program, error = %e, "Failed to wait for child");
                kill_process_group(pid, &program);
                let _ = child.kill().await;
                return ProcessOutput::spawn_failed(program, e, start.elapsed());
            }
            Err(_) => {
                kill_process_group(pid, &program);
                if let Err(e) = child.kill().await {
                    warn!(program = %program, error = %e, "Failed to kill timed-out child");
                }
                debug!(program = %program, timeout_ms = timeout.as_millis() as u64, "Child killed at deadline");
                (None, true)
            }
        };
        let elapsed = start.elapsed();

        // Anything the program left running in the background goes too,
        // otherwise it would hold the pipes open
        if !timed_out {
            kill_process_group(pid, &program);
        }

        // One grace period shared by the stdin writer and both readers
        let drain_deadline = tokio::time::Instant::now() + OUTPUT_DRAIN_GRACE;

        if let Some(mut writer) = stdin_writer {
            match tokio::time::timeout_at(drain_deadline, &mut writer).await {
                // The program may legitimately exit without reading its input
                Ok(Ok(Err(e))) if e.kind() != io::ErrorKind::BrokenPipe => {
                    debug!(program = %program, error = %e, "Failed to write stdin");
                }
                Ok(Err(e)) => debug!(program = %program, error = %e, "stdin writer task failed"),
                Err(_) => writer.abort(),
                _ => {}
            }
        }

        let stdout = collect(stdout_reader, stdout_capture, drain_deadline, &program).await;
        let stderr = collect(stderr_reader, stderr_capture, drain_deadline, &program).await;

        ProcessOutput {
            stdout: String::from_utf8_lossy(&stdout.bytes).into_owned(),
            stderr: String::from_utf8_lossy(&stderr.bytes).into_owned(),
            status,
            timed_out,
            elapsed,
            output_truncated: stdout.truncated || stderr.truncated,
            spawn_error: None,
            program,
        }
    }

    /// Spawn and classify as a run step
    pub async fn run(
        &self,
        spec: &CommandSpec,
        stdin: &str,
        timeout: Duration,
        stderr_is_failure: bool,
    ) -> ExecutionResult {
        self.spawn(spec, stdin, timeout)
            .await
            .into_execution_result(stderr_is_failure)
    }
}

/// Bytes kept from one stream so far
#[derive(Debug, Default)]
struct Captured {
    bytes: Vec<u8>,
    truncated: bool,
}

/// Filled by the reader task, read back even if that task has to be aborted
#[derive(Debug, Clone, Default)]
struct SharedCapture(Arc<Mutex<Captured>>);

impl SharedCapture {
    fn lock(&self) -> MutexGuard<'_, Captured> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn take(&self) -> Captured {
        std::mem::take(&mut *self.lock())
    }
}

async fn collect(
    reader: Option<JoinHandle<()>>,
    capture: SharedCapture,
    deadline: tokio::time::Instant,
    program: &str,
) -> Captured {
    if let Some(mut handle) = reader {
        match tokio::time::timeout_at(deadline, &mut handle).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(program = %program, error = %e, "Output reader task failed"),
            Err(_) => {
                // Something outside the process group still holds the pipe
                handle.abort();
                warn!(program = %program, "Output pipe still open after child exit; keeping partial output");
            }
        }
    }
    capture.take()
}

/// Read until EOF, keeping at most `limit` bytes in `sink`
async fn read_bounded<R>(mut reader: R, limit: usize, sink: SharedCapture)
where
    R: AsyncRead + Unpin,
{
    let mut chunk = vec![0u8; READ_CHUNK_BYTES];

    loop {
        let n = match reader.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(_) => break,
        };
        let mut captured = sink.lock();
        let room = limit.saturating_sub(captured.bytes.len());
        if n > room {
            captured.bytes.extend_from_slice(&chunk[..room]);
            captured.truncated = true;
        } else {
            captured.bytes.extend_from_slice(&chunk[..n]);
        }
        drop(captured);
    }
}

/// SIGKILL every process in the child's group
#[cfg(unix)]
fn kill_process_group(pid: Option<u32>, program: &str) {
    use nix::errno::Errno;
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Some(pid) = pid else {
        return;
    };
    match killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
        // Group already empty
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => warn!(program = %program, pgid = pid, error = %e, "Failed to kill process group"),
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>, _program: &str) {}
