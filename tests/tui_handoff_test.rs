//! Editor handoff from the interactive views, driven through a pseudo-terminal.
//!
//! These run the real binary on a PTY, press `E`, type an arrow key into the
//! editor and quit. They need `/bin/sh`, `stty`, `dd` and `od`, and take a few
//! seconds each, so they only run on request:
//!
//! ```text
//! cargo test --test tui_handoff_test -- --ignored
//! ```

#![cfg(unix)]

mod common;

use std::fs;
use std::io::{Read, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use common::TestEnv;
use portable_pty::{Child, ChildKiller, CommandBuilder, MasterPty, PtySize, native_pty_system};

const MARKER: &str = "Edited in interactive TUI test";
const EDITOR_READY: &str = "__EDITOR_READY__";
const UP_ARROW: &[u8] = b"\x1b[A";

/// Editor that records its start, appends the marker, then logs the raw
/// bytes it reads from the terminal for a short while.
const EDITOR_SCRIPT: &str = r#"printf 'started\n' >> "$BACKLOG_TEST_MARKER_FILE"
printf '\n%s\n' 'Edited in interactive TUI test' >> "$1"
stty raw -echo min 0 time 15
printf '__EDITOR_READY__\n'
bytes=$(dd bs=1 count=3 2>/dev/null | od -An -tu1)
printf 'DATA:%s\n' "$(echo $bytes | tr ' ' ',')" >> "$BACKLOG_TEST_KEY_LOG"
stty sane"#;

/// A running `backlog` process attached to a pseudo-terminal.
struct PtySession {
    child: Box<dyn Child + Send + Sync>,
    // Closing the master hangs up the child's terminal.
    _master: Box<dyn MasterPty + Send>,
    writer: Box<dyn Write + Send>,
    output: Arc<Mutex<Vec<u8>>>,
}

impl PtySession {
    fn spawn(env: &TestEnv, args: &[&str], editor: &Path) -> Self {
        let pair = native_pty_system()
            .openpty(PtySize {
                rows: 40,
                cols: 120,
                pixel_width: 0,
                pixel_height: 0,
            })
            .unwrap();

        let mut command = CommandBuilder::new(env!("CARGO_BIN_EXE_backlog"));
        command.args(args);
        command.cwd(env.path());
        command.env("TERM", "xterm-256color");
        command.env("NO_COLOR", "1");
        command.env("EDITOR", editor);
        command.env("BACKLOG_TEST_MARKER_FILE", env.path().join("editor-marker.txt"));
        command.env("BACKLOG_TEST_KEY_LOG", env.path().join("editor-keys.log"));
        command.env_remove("BACKLOG_CWD");
        command.env_remove("BACKLOG_LOG");

        let child = pair.slave.spawn_command(command).unwrap();
        drop(pair.slave);

        let mut reader = pair.master.try_clone_reader().unwrap();
        let writer = pair.master.take_writer().unwrap();
        let output = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&output);
        thread::spawn(move || {
            let mut buf = [0u8; 4096];
            loop {
                match reader.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => sink.lock().unwrap().extend_from_slice(&buf[..n]),
                }
            }
        });

        Self {
            child,
            _master: pair.master,
            writer,
            output,
        }
    }

    fn transcript(&self) -> String {
        String::from_utf8_lossy(&self.output.lock().unwrap()).into_owned()
    }

    fn expect(&self, pattern: &str, timeout: Duration) {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if self.transcript().contains(pattern) {
                return;
            }
            thread::sleep(Duration::from_millis(50));
        }
        panic!(
            "timed out waiting for {:?}; transcript:\n{}",
            pattern,
            self.transcript()
        );
    }

    fn send(&mut self, bytes: &[u8]) {
        self.writer.write_all(bytes).unwrap();
        self.writer.flush().unwrap();
    }

    /// Keep pressing `q` until the process exits.
    fn quit(&mut self, timeout: Duration) -> portable_pty::ExitStatus {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Some(status) = self.child.try_wait().unwrap() {
                return status;
            }
            self.send(b"q");
            thread::sleep(Duration::from_millis(250));
        }
        let _ = self.child.kill();
        panic!("backlog did not quit; transcript:\n{}", self.transcript());
    }
}

struct EditRun {
    env: TestEnv,
    id: String,
}

impl EditRun {
    fn task_contents(&self) -> String {
        fs::read_to_string(self.env.task_file(&self.id)).unwrap()
    }

    fn editor_marker(&self) -> String {
        fs::read_to_string(self.env.path().join("editor-marker.txt")).unwrap_or_default()
    }

    fn key_log(&self) -> String {
        fs::read_to_string(self.env.path().join("editor-keys.log")).unwrap_or_default()
    }
}

fn run_edit_from_view(args: &[&str], ready: &str, title: &str) -> EditRun {
    let env = TestEnv::init();
    let id = env.create_task(title, "TUI interactive editor test");
    let editor = env.script("editor.sh", EDITOR_SCRIPT);

    let mut session = PtySession::spawn(&env, args, &editor);
    session.expect(ready, Duration::from_secs(10));
    thread::sleep(Duration::from_millis(500));

    session.send(b"E");
    session.expect(EDITOR_READY, Duration::from_secs(10));
    session.send(UP_ARROW);
    thread::sleep(Duration::from_millis(200));

    let status = session.quit(Duration::from_secs(15));
    assert!(
        status.success(),
        "backlog exited with {:?}; transcript:\n{}",
        status,
        session.transcript()
    );

    EditRun { env, id }
}

#[test]
#[ignore = "drives a pseudo-terminal; run with --ignored"]
fn test_edit_from_board_view() {
    let run = run_edit_from_view(&["board"], "Backlog Board", "Board interactive editor task");

    assert!(run.editor_marker().contains("started"));
    assert!(run.key_log().contains("DATA:27,91,65"), "keys: {}", run.key_log());
    assert!(run.task_contents().contains(MARKER));
}

#[test]
#[ignore = "drives a pseudo-terminal; run with --ignored"]
fn test_edit_from_task_list_view() {
    let run = run_edit_from_view(&["task", "list"], "Tasks", "Task list interactive editor task");

    assert!(run.editor_marker().contains("started"));
    assert!(run.key_log().contains("DATA:27,91,65"), "keys: {}", run.key_log());
    assert!(run.task_contents().contains(MARKER));
}
