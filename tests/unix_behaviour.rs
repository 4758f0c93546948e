#![cfg(unix)]

use std::{
    io::{BufRead, BufReader, Read},
    process::{Child, ChildStdout, Command, Stdio},
    thread,
    time::Duration,
};

use nix::{
    sys::signal::{Signal, kill},
    unistd::Pid,
};

fn sigmux_bin() -> &'static str {
    env!("CARGO_BIN_EXE_sigmux")
}

fn spawn_sigmux(args: &[&str], envs: &[(&str, &str)]) -> (Child, BufReader<ChildStdout>) {
    let mut command = Command::new(sigmux_bin());
    command
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("SIGMUX_TRAPS")
        .stdout(Stdio::piped());
    for (key, value) in envs {
        command.env(key, value);
    }
    let mut child = command.spawn().expect("failed to spawn sigmux");
    let stdout = child.stdout.take().expect("stdout is piped");
    let mut reader = BufReader::new(stdout);
    wait_ready(&mut reader);
    (child, reader)
}

fn wait_ready(reader: &mut BufReader<ChildStdout>) {
    loop {
        let mut line = String::new();
        let n = reader.read_line(&mut line).expect("read sigmux stdout");
        assert_ne!(n, 0, "sigmux exited before reporting ready");
        if line.trim() == "ready" {
            return;
        }
    }
}

fn signal_child(child: &Child, signal: Signal) {
    kill(Pid::from_raw(child.id() as i32), signal).expect("failed to signal sigmux");
}

fn finish(mut child: Child, mut reader: BufReader<ChildStdout>) -> (bool, String) {
    let mut rest = String::new();
    reader
        .read_to_string(&mut rest)
        .expect("read sigmux stdout to end");
    let status = child.wait().expect("wait on sigmux");
    (status.success(), rest)
}

#[test]
fn trapped_signal_is_counted_and_reported() {
    let (child, reader) = spawn_sigmux(&["--trap", "usr1"], &[]);
    signal_child(&child, Signal::SIGUSR1);

    let (success, output) = finish(child, reader);
    assert!(success, "sigmux exited with failure\n{output}");
    assert!(output.contains("received 1 signal(s)"), "{output}");
    assert!(output.contains("SIGUSR1: 1 delivered"), "{output}");
}

#[test]
fn numeric_trap_token_resolves_to_the_canonical_name() {
    let number = (Signal::SIGUSR2 as i32).to_string();
    let (child, reader) = spawn_sigmux(&["--trap", &number], &[]);
    signal_child(&child, Signal::SIGUSR2);

    let (success, output) = finish(child, reader);
    assert!(success, "sigmux exited with failure\n{output}");
    assert!(output.contains("SIGUSR2: 1 delivered"), "{output}");
}

#[test]
fn multiple_traps_share_the_delivery_budget() {
    let (child, reader) = spawn_sigmux(&["--trap", "hup", "--trap", "SigTerm", "-n", "2"], &[]);
    signal_child(&child, Signal::SIGHUP);
    thread::sleep(Duration::from_millis(50));
    signal_child(&child, Signal::SIGTERM);

    let (success, output) = finish(child, reader);
    assert!(success, "sigmux exited with failure\n{output}");
    assert!(output.contains("received 2 signal(s)"), "{output}");
    assert!(output.contains("SIGHUP: 1 delivered"), "{output}");
    assert!(output.contains("SIGTERM: 1 delivered"), "{output}");
}

#[test]
fn traps_can_come_from_the_environment() {
    let (child, reader) = spawn_sigmux(&[], &[("SIGMUX_TRAPS", "winch")]);
    signal_child(&child, Signal::SIGWINCH);

    let (success, output) = finish(child, reader);
    assert!(success, "sigmux exited with failure\n{output}");
    assert!(output.contains("SIGWINCH: 1 delivered"), "{output}");
}

#[test]
fn invalid_trap_token_fails_with_the_token_in_the_message() {
    let output = Command::new(sigmux_bin())
        .args(["--trap", "woohoo"])
        .env_remove("SIGMUX_TRAPS")
        .output()
        .expect("failed to run sigmux");

    assert!(!output.status.success(), "bad trap token must not succeed");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("woohoo"), "{stderr}");
}

#[test]
fn missing_trap_configuration_exits_with_usage_error() {
    let output = Command::new(sigmux_bin())
        .env_remove("SIGMUX_TRAPS")
        .output()
        .expect("failed to run sigmux without args");

    assert!(!output.status.success(), "missing traps must not succeed");
}
