use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

use pretty_assertions::assert_eq;

fn program_file(name: &str, source: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("tapevm-{}-{name}.b", std::process::id()));
    fs::write(&path, source).unwrap();
    path
}

fn tapevm(args: &[&str], stdin: &[u8]) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_tapevm"))
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    // The process may exit before reading anything
    let _ = child.stdin.take().unwrap().write_all(stdin);
    child.wait_with_output().unwrap()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn hello_world() {
    let path = program_file(
        "hello",
        "++++++++[>++++[>++>+++>+++>+<<<<-]>+>+>->>+[<]<-]>>.>---.+++++++..+++.>>.<-.<.+++.------.--------.>>+.>++.",
    );
    let output = tapevm(&[path.to_str().unwrap()], b"");
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(output.stdout, b"Hello World!\n");
}

#[test]
fn echo_stdin() {
    let path = program_file("echo", ",[.,]");
    let output = tapevm(&[path.to_str().unwrap(), "--eof", "0"], b"abc");
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(output.stdout, b"abc");
}

#[test]
fn no_arguments() {
    let output = tapevm(&[], b"");
    assert!(!output.status.success());
    assert!(stderr(&output).contains("exactly one program file"));
}

#[test]
fn too_many_arguments() {
    let first = program_file("first", "+");
    let second = program_file("second", "+");
    let output = tapevm(&[first.to_str().unwrap(), second.to_str().unwrap()], b"");
    assert!(!output.status.success());
    assert!(stderr(&output).contains("exactly one program file"));
}

#[test]
fn bad_option_value() {
    let path = program_file("options", "+");
    for (flag, value) in [("--bounds", "foo"), ("--opt-level", "9")] {
        let output = tapevm(&[path.to_str().unwrap(), flag, value], b"");
        assert!(!output.status.success());

        let message = stderr(&output);
        assert!(message.contains(&format!("invalid value '{value}'")), "{message}");
        assert!(message.contains(flag), "{message}");
        assert!(!message.contains("exactly one program file"), "{message}");
    }
}

#[test]
fn missing_file() {
    let output = tapevm(&["/no/such/program.b"], b"");
    assert!(!output.status.success());
    assert!(stderr(&output).contains("the file /no/such/program.b could not be read"));
}

#[test]
fn syntax_error() {
    let path = program_file("unbalanced", "[[");
    let output = tapevm(&[path.to_str().unwrap()], b"");
    assert!(!output.status.success());
    assert!(stderr(&output).contains("unmatched bracket at position 2"));
}

#[test]
fn bad_tape_length() {
    let path = program_file("tape", "+");
    for len in ["0", "-5"] {
        let output = tapevm(&[path.to_str().unwrap(), "--tape-len", len], b"");
        assert!(!output.status.success());
        assert!(stderr(&output).contains("at least 1 cell"));
    }
}

#[test]
fn out_of_bounds() {
    let path = program_file("left", "<+");
    let output = tapevm(&[path.to_str().unwrap(), "--tape-len", "10"], b"");
    assert!(!output.status.success());
    assert!(stderr(&output).contains("cell -1 which is outside of the tape (0 - 9)"));

    let output = tapevm(&[path.to_str().unwrap(), "--bounds", "extend"], b"");
    assert!(output.status.success(), "{}", stderr(&output));
}

#[test]
fn dump() {
    let path = program_file("dump", "+[-]>.");
    let output = tapevm(&[path.to_str().unwrap(), "--dump"], b"");
    assert!(output.status.success(), "{}", stderr(&output));

    let listing = String::from_utf8(output.stdout).unwrap();
    let mnemonics: Vec<_> = listing
        .lines()
        .map(|line| line.split_whitespace().last().unwrap_or_default())
        .collect();
    assert_eq!(mnemonics, vec!["+1", "ZERO", "OUT", "END"]);
}
