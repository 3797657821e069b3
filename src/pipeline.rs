use crate::context::{ExecContext, InputHandle, OutputHandle};
use crate::error::ExecError;
use crate::exec::{self, EXIT_FAILURE, EXIT_NOT_FOUND, SessionState, StageHandle};
use crate::registry::Registry;
use crate::stream::{Guarded, SharedWriter};
use log::{debug, warn};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectMode {
    Overwrite, // >
    Append,    // >>
}

/// One parsed stage of a pipeline: its argv plus any file redirections.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageSpec {
    pub argv: Vec<String>,
    pub stdin_file: Option<String>,
    pub stdout_file: Option<(String, RedirectMode)>,
}

/// Stage lifecycle. `Failed`, `Completed` and `NotFound` are terminal;
/// no transition skips a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageState {
    Pending,
    Resolved,
    Running,
    Completed,
    Failed,
    NotFound,
}

#[derive(Debug)]
pub struct StageReport {
    pub name: String,
    pub state: StageState,
    pub exit_code: Option<i32>,
}

pub struct PipelineRun {
    /// Exit status of the last stage (127 when it never ran).
    pub status: i32,
    pub reports: Vec<StageReport>,
    /// Final cwd/env of the last joined stage, for session adoption.
    pub session: Option<SessionState>,
}

#[derive(Debug, PartialEq)]
enum Token {
    Word(String),
    Pipe,
    RedirOut,
    RedirAppend,
    RedirIn,
}

/// Quote-aware tokenizer. Single quotes are literal, double quotes group,
/// backslash escapes the next character outside single quotes. `|`, `>`,
/// `>>` and `<` are operators only outside quotes.
fn tokenize(line: &str) -> Result<Vec<Token>, ExecError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_single = false;
    let mut in_double = false;
    let mut escaped = false;
    let mut token_started = false;

    let flush = |current: &mut String, started: &mut bool, tokens: &mut Vec<Token>| {
        if *started {
            tokens.push(Token::Word(std::mem::take(current)));
            *started = false;
        }
    };

    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        if escaped {
            current.push(c);
            escaped = false;
            token_started = true;
            continue;
        }

        match c {
            '\\' if !in_single => {
                escaped = true;
                token_started = true;
            }
            '\'' if !in_double => {
                in_single = !in_single;
                token_started = true;
            }
            '"' if !in_single => {
                in_double = !in_double;
                token_started = true;
            }
            '|' if !in_single && !in_double => {
                flush(&mut current, &mut token_started, &mut tokens);
                tokens.push(Token::Pipe);
            }
            '>' if !in_single && !in_double => {
                flush(&mut current, &mut token_started, &mut tokens);
                if chars.peek() == Some(&'>') {
                    chars.next();
                    tokens.push(Token::RedirAppend);
                } else {
                    tokens.push(Token::RedirOut);
                }
            }
            '<' if !in_single && !in_double => {
                flush(&mut current, &mut token_started, &mut tokens);
                tokens.push(Token::RedirIn);
            }
            c if c.is_whitespace() && !in_single && !in_double => {
                flush(&mut current, &mut token_started, &mut tokens);
            }
            c => {
                current.push(c);
                token_started = true;
            }
        }
    }

    if in_single || in_double {
        return Err(ExecError::Syntax("unterminated quote".to_string()));
    }
    if escaped {
        return Err(ExecError::Syntax("trailing backslash".to_string()));
    }
    flush(&mut current, &mut token_started, &mut tokens);

    Ok(tokens)
}

/// Splits a command line into pipeline stages. An empty line yields an
/// empty stage list.
pub fn parse_pipeline(line: &str) -> Result<Vec<StageSpec>, ExecError> {
    let tokens = tokenize(line)?;
    if tokens.is_empty() {
        return Ok(Vec::new());
    }

    let mut stages = vec![StageSpec::default()];
    let mut iter = tokens.into_iter();
    while let Some(token) = iter.next() {
        match token {
            Token::Word(w) => stages.last_mut().unwrap().argv.push(w),
            Token::Pipe => {
                if stages.last().unwrap().argv.is_empty() {
                    return Err(ExecError::Syntax("empty pipeline stage".to_string()));
                }
                stages.push(StageSpec::default());
            }
            op => {
                let target = match iter.next() {
                    Some(Token::Word(w)) => w,
                    _ => {
                        return Err(ExecError::Syntax(
                            "redirection without a target".to_string(),
                        ));
                    }
                };
                let stage = stages.last_mut().unwrap();
                match op {
                    Token::RedirOut => stage.stdout_file = Some((target, RedirectMode::Overwrite)),
                    Token::RedirAppend => stage.stdout_file = Some((target, RedirectMode::Append)),
                    Token::RedirIn => stage.stdin_file = Some(target),
                    _ => unreachable!(),
                }
            }
        }
    }

    if stages.last().unwrap().argv.is_empty() {
        return Err(ExecError::Syntax("empty pipeline stage".to_string()));
    }
    Ok(stages)
}

/// Wildcard expansion against the stage's working directory. A pattern
/// with no matches passes through verbatim.
fn expand_globs(argv: &[String], cwd: &Path) -> Vec<String> {
    let mut out = Vec::with_capacity(argv.len());
    out.push(argv[0].clone());

    for arg in &argv[1..] {
        let has_wildcard = arg.contains('*') || arg.contains('?') || arg.contains('[');
        if !has_wildcard {
            out.push(arg.clone());
            continue;
        }

        let relative = !Path::new(arg).is_absolute();
        let pattern = if relative {
            cwd.join(arg).to_string_lossy().into_owned()
        } else {
            arg.clone()
        };

        let mut found = false;
        if let Ok(paths) = glob::glob(&pattern) {
            for entry in paths.flatten() {
                let rendered = if relative {
                    entry
                        .strip_prefix(cwd)
                        .map(|p| p.to_string_lossy().into_owned())
                        .unwrap_or_else(|_| entry.to_string_lossy().into_owned())
                } else {
                    entry.to_string_lossy().into_owned()
                };
                out.push(rendered);
                found = true;
            }
        }
        if !found {
            out.push(arg.clone());
        }
    }
    out
}

/// Launches every stage on its own thread, wiring stage *i*'s output to
/// stage *i+1*'s input. Blocks until all stages complete; the pipeline's
/// status is the last stage's exit code.
///
/// An unresolvable command aborts downstream stages that have no other
/// input source; upstream stages keep draining against a dropped pipe
/// end. A redirection that fails to open marks its stage failed and hands
/// the consumer an immediate EOF.
pub fn run_pipeline(
    registry: &Registry,
    base: &ExecContext,
    stages: Vec<StageSpec>,
    mut stdin: Option<InputHandle>,
    mut stdout: Option<OutputHandle>,
    stderr: Option<OutputHandle>,
) -> Result<PipelineRun, ExecError> {
    let cancel = base.cancel.clone();
    let stderr_shared = stderr.map(SharedWriter::new);
    let report_error = |msg: &str| match &stderr_shared {
        Some(shared) => {
            let mut h = shared.handle();
            let _ = writeln!(h, "cove: {msg}");
        }
        None => eprintln!("cove: {msg}"),
    };

    let count = stages.len();
    let mut reports: Vec<StageReport> = stages
        .iter()
        .map(|s| StageReport {
            name: s.argv[0].clone(),
            state: StageState::Pending,
            exit_code: None,
        })
        .collect();

    let mut handles: Vec<(usize, StageHandle)> = Vec::new();
    let mut prev_read: Option<InputHandle> = stdin.take();
    let mut aborted = false;

    for (i, spec) in stages.into_iter().enumerate() {
        let last = i + 1 == count;

        if aborted && spec.stdin_file.is_none() {
            debug!("skipping '{}': no input source left", spec.argv[0]);
            continue;
        }

        let descriptor = match registry.lookup(&spec.argv[0]) {
            Ok(d) => d,
            Err(err) => {
                warn!("{err}");
                report_error(&format!("{}: command not found", spec.argv[0]));
                reports[i].state = StageState::NotFound;
                reports[i].exit_code = Some(EXIT_NOT_FOUND);
                // Dropping the consumer end lets running producers
                // observe broken pipe and drain.
                prev_read = None;
                aborted = true;
                continue;
            }
        };
        reports[i].state = StageState::Resolved;
        aborted = false;

        let mut ctx = base.for_stage();
        let argv = expand_globs(&spec.argv, &ctx.cwd);

        // Input: an explicit `<` supersedes the upstream pipe.
        let bound_stdin = if let Some(target) = &spec.stdin_file {
            prev_read = None;
            match open_stdin(&ctx, target) {
                Ok(f) => Some(f),
                Err(err) => {
                    report_error(&format!("{}: {err}", spec.argv[0]));
                    fail_without_launch(&mut reports[i], &mut prev_read, last)?;
                    continue;
                }
            }
        } else {
            prev_read.take()
        };

        // Output: `>`/`>>` supersede the downstream pipe.
        let mut next_read: Option<InputHandle> = None;
        let bound_stdout = if let Some((target, mode)) = &spec.stdout_file {
            match open_stdout(&ctx, target, *mode) {
                Ok(f) => {
                    if !last {
                        // Consumer gets immediate EOF.
                        let (r, w) = os_pipe::pipe()?;
                        drop(w);
                        next_read = Some(Box::new(r) as InputHandle);
                    }
                    Some(f)
                }
                Err(err) => {
                    report_error(&format!("{}: {err}", spec.argv[0]));
                    fail_without_launch(&mut reports[i], &mut prev_read, last)?;
                    continue;
                }
            }
        } else if last {
            stdout.take()
        } else {
            let (r, w) = os_pipe::pipe()?;
            next_read = Some(Box::new(Guarded::new(r, cancel.clone())) as InputHandle);
            Some(Box::new(Guarded::new(w, cancel.clone())) as OutputHandle)
        };

        ctx.stdin = bound_stdin;
        ctx.stdout = bound_stdout;
        ctx.stderr = stderr_shared.as_ref().map(|s| s.handle());

        let handle = exec::spawn(descriptor, argv, ctx)?;
        reports[i].state = StageState::Running;
        handles.push((i, handle));
        prev_read = next_read;
    }

    // Unconsumed trailing pipe from an aborted tail.
    drop(prev_read);

    let mut session: Option<SessionState> = None;
    for (i, handle) in handles {
        let result = handle.join();
        reports[i].exit_code = Some(result.code);
        reports[i].state = if result.code == 0 {
            StageState::Completed
        } else {
            StageState::Failed
        };
        session = result.state;
    }

    let status = reports[count - 1].exit_code.unwrap_or(EXIT_NOT_FOUND);
    debug!("pipeline finished with status {status}");
    Ok(PipelineRun {
        status,
        reports,
        session,
    })
}

/// A stage whose redirection cannot be opened fails without ever
/// launching; its consumer reads EOF and the rest of the pipeline
/// proceeds.
fn fail_without_launch(
    report: &mut StageReport,
    prev_read: &mut Option<InputHandle>,
    last: bool,
) -> Result<(), ExecError> {
    report.state = StageState::Failed;
    report.exit_code = Some(EXIT_FAILURE);
    *prev_read = if last {
        None
    } else {
        let (r, w) = os_pipe::pipe()?;
        drop(w);
        Some(Box::new(r) as InputHandle)
    };
    Ok(())
}

fn open_stdin(ctx: &ExecContext, target: &str) -> Result<InputHandle, ExecError> {
    let path = ctx.resolve(target)?;
    let file = OpenOptions::new().read(true).open(&path)?;
    Ok(Box::new(Guarded::new(file, ctx.cancel.clone())))
}

fn open_stdout(
    ctx: &ExecContext,
    target: &str,
    mode: RedirectMode,
) -> Result<OutputHandle, ExecError> {
    let path = ctx.resolve(target)?;
    let mut opts = OpenOptions::new();
    match mode {
        RedirectMode::Overwrite => opts.write(true).create(true).truncate(true),
        RedirectMode::Append => opts.write(true).create(true).append(true),
    };
    let file = opts.open(&path)?;
    Ok(Box::new(Guarded::new(file, ctx.cancel.clone())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(stage: &StageSpec) -> Vec<&str> {
        stage.argv.iter().map(String::as_str).collect()
    }

    #[test]
    fn parses_simple_command() {
        let stages = parse_pipeline("echo hello world").unwrap();
        assert_eq!(stages.len(), 1);
        assert_eq!(words(&stages[0]), ["echo", "hello", "world"]);
    }

    #[test]
    fn parses_quotes_and_escapes() {
        let stages = parse_pipeline(r#"echo 'a b' "c|d" e\ f"#).unwrap();
        assert_eq!(words(&stages[0]), ["echo", "a b", "c|d", "e f"]);
    }

    #[test]
    fn empty_quotes_make_empty_argument() {
        let stages = parse_pipeline(r#"echo """#).unwrap();
        assert_eq!(words(&stages[0]), ["echo", ""]);
    }

    #[test]
    fn splits_pipeline_stages() {
        let stages = parse_pipeline("cat notes.txt | wc -l").unwrap();
        assert_eq!(stages.len(), 2);
        assert_eq!(words(&stages[0]), ["cat", "notes.txt"]);
        assert_eq!(words(&stages[1]), ["wc", "-l"]);
    }

    #[test]
    fn binds_redirections() {
        let stages = parse_pipeline("wc -l < in.txt > out.txt").unwrap();
        assert_eq!(stages[0].stdin_file.as_deref(), Some("in.txt"));
        assert_eq!(
            stages[0].stdout_file,
            Some(("out.txt".to_string(), RedirectMode::Overwrite))
        );

        let stages = parse_pipeline("echo hi >> log.txt").unwrap();
        assert_eq!(
            stages[0].stdout_file,
            Some(("log.txt".to_string(), RedirectMode::Append))
        );
    }

    #[test]
    fn quoted_operators_are_words() {
        let stages = parse_pipeline(r#"echo ">" "|" "<""#).unwrap();
        assert_eq!(stages.len(), 1);
        assert_eq!(words(&stages[0]), ["echo", ">", "|", "<"]);
    }

    #[test]
    fn empty_line_is_no_stages() {
        assert!(parse_pipeline("   ").unwrap().is_empty());
    }

    #[test]
    fn syntax_errors_are_typed() {
        assert!(matches!(
            parse_pipeline("echo 'unterminated"),
            Err(ExecError::Syntax(_))
        ));
        assert!(matches!(
            parse_pipeline("a | | b"),
            Err(ExecError::Syntax(_))
        ));
        assert!(matches!(
            parse_pipeline("echo hi >"),
            Err(ExecError::Syntax(_))
        ));
        assert!(matches!(parse_pipeline("a |"), Err(ExecError::Syntax(_))));
    }

    #[test]
    fn globs_expand_relative_to_stage_cwd() {
        use std::fs;
        let dir = std::env::temp_dir().join("cove-glob-test");
        if dir.exists() {
            fs::remove_dir_all(&dir).unwrap();
        }
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("a.txt"), "").unwrap();
        fs::write(dir.join("b.txt"), "").unwrap();
        fs::write(dir.join("c.log"), "").unwrap();

        let argv = vec!["ls".to_string(), "*.txt".to_string()];
        let mut expanded = expand_globs(&argv, &dir);
        expanded[1..].sort();
        assert_eq!(expanded, ["ls", "a.txt", "b.txt"]);

        // No match: pattern passes through verbatim.
        let argv = vec!["ls".to_string(), "*.bin".to_string()];
        assert_eq!(expand_globs(&argv, &dir), ["ls", "*.bin"]);
    }
}
