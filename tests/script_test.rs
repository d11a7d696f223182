use std::{
    fs::{read_dir, read_to_string},
    path::Path,
};

use color_eyre::{eyre::Context, Result};
use stepwise::debugger::{DebuggerError, ScriptDebugger};

#[test]
fn test_expressions() -> Result<()> {
    let input_dir = Path::new("./test_data/scripts/expressions");
    test_engine(input_dir)
}

#[test]
fn test_scope() -> Result<()> {
    let input_dir = Path::new("./test_data/scripts/scope");
    test_engine(input_dir)
}

#[test]
fn test_functions() -> Result<()> {
    let input_dir = Path::new("./test_data/scripts/functions");
    test_engine(input_dir)
}

#[test]
fn test_control_flow() -> Result<()> {
    let input_dir = Path::new("./test_data/scripts/control_flow");
    test_engine(input_dir)
}

#[test]
fn test_collections() -> Result<()> {
    let input_dir = Path::new("./test_data/scripts/collections");
    test_engine(input_dir)
}

#[test]
fn test_errors() -> Result<()> {
    let input_dir = Path::new("./test_data/scripts/errors");
    test_engine(input_dir)
}

struct TestCase {
    name: String,
    source: String,
    output: Vec<String>,
    syntax_errors: Vec<String>,
    runtime_error: Option<(u32, String)>,
}

impl TestCase {
    pub fn check(&self) {
        let mut debugger = ScriptDebugger::default();
        let state = match debugger.start(self.source.as_str()) {
            Ok(state) => state,
            Err(DebuggerError::Initialization(error)) => {
                assert_eq!(
                    self.syntax_errors,
                    vec![error.to_string()],
                    "Failed test {} at compilation stage.",
                    self.name,
                );
                return;
            }
            Err(error) => panic!("Failed test {} with {error}.", self.name),
        };
        assert!(
            self.syntax_errors.is_empty(),
            "Failed test {}: expected a syntax error.",
            self.name
        );
        assert!(state.is_finished, "Failed test {}: did not finish.", self.name);

        let mut printed = state.console_output.clone();
        match self.runtime_error {
            Some((line, ref message)) => {
                let last = printed.pop();
                assert_eq!(
                    Some(format!("ERROR: {message}")),
                    last,
                    "Failed test {} at runtime.",
                    self.name,
                );
                assert_eq!(
                    line as i64, state.active_line,
                    "Failed test {} at runtime line.",
                    self.name,
                );
                assert_eq!(debugger.fault(), Some(message.as_str()));
            }
            None => {
                assert_eq!(debugger.fault(), None, "Failed test {} at runtime.", self.name);
                assert_eq!(state.active_line, -1);
            }
        }
        assert_eq!(self.output, printed, "Failed test {} at print.", self.name);
    }
}

fn test_engine(input_dir: &Path) -> Result<()> {
    let mut succeeded = true;
    for entry in read_dir(input_dir).context("Failed to open input test data folder")? {
        let entry = entry?;
        let path = entry.path();
        let Some(extension) = path.extension() else {
            continue;
        };
        if extension != "js" {
            continue;
        }
        println!("Parsing {path:?}");
        let test_case = parse_test_case(&path)?;
        println!("Checking {}", test_case.name);
        let res = std::panic::catch_unwind(|| {
            test_case.check();
        });
        if res.is_err() {
            println!("\tFails test case {}", test_case.name);
            succeeded = false;
        }
    }
    assert!(succeeded);
    Ok(())
}

fn parse_test_case(input_path: &Path) -> Result<TestCase> {
    let test_name = input_path
        .file_name()
        .expect("File name can't be none as the path is to a real file.")
        .to_string_lossy();
    let input = read_to_string(input_path).context("Failed to open input test data file")?;

    let mut output = Vec::new();
    let mut syntax_errors = Vec::new();
    let mut runtime_error = None;
    for (line_index, line) in input.lines().enumerate() {
        if let Some((_, expected)) = line.split_once("// expect runtime error:") {
            runtime_error = Some((line_index as u32 + 1, expected.trim().to_string()));
        } else if let Some((_, expected)) = line.split_once("// expect:") {
            output.push(expected.trim().to_string());
        } else if let Some((_, expected)) = line.split_once("// [line ") {
            syntax_errors.push(format!("[line {}", expected.trim()));
        }
    }

    Ok(TestCase {
        name: test_name.into_owned(),
        source: input,
        output,
        syntax_errors,
        runtime_error,
    })
}
