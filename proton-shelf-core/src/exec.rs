//! Exec-command tokenization and launch-shape classification.
//!
//! Shortcut `Exec=` lines arrive as shell-style strings. The engine stores
//! them tokenized and classifies them into one of three shapes:
//!
//! ```text
//! env <script> <mode> <windows.exe> [extra]   — wrapper script plus payload
//! flatpak run <app-id> <windows.exe> [extra]  — flatpak-wrapped wrapper
//! <program> [args...]                         — anything else
//! ```

/// Script-path suffix that marks the wrapper's Steam-style entry point.
const STEAM_ENTRY_SCRIPT: &str = "data/scripts/start.sh";

/// Split a command string the way a POSIX shell would.
///
/// Handles single and double quotes plus backslash escapes. Inside double
/// quotes a backslash only escapes `"`, `\`, `` ` `` and `$`, as in sh. An
/// unterminated quote consumes the rest of the string rather than failing;
/// shortcut files in the wild are not always well formed.
pub fn tokenize(command: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut chars = command.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            c if c.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            '\'' => {
                in_token = true;
                for c in chars.by_ref() {
                    if c == '\'' {
                        break;
                    }
                    current.push(c);
                }
            }
            '"' => {
                in_token = true;
                while let Some(c) = chars.next() {
                    match c {
                        '"' => break,
                        '\\' => match chars.peek() {
                            Some(&next) if matches!(next, '"' | '\\' | '`' | '$') => {
                                chars.next();
                                current.push(next);
                            }
                            _ => current.push('\\'),
                        },
                        _ => current.push(c),
                    }
                }
            }
            '\\' => {
                in_token = true;
                if let Some(c) = chars.next() {
                    current.push(c);
                }
            }
            _ => {
                in_token = true;
                current.push(ch);
            }
        }
    }
    if in_token {
        tokens.push(current);
    }
    tokens
}

/// The recognized shapes of a shortcut exec command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecShape {
    /// `env <script> ... <windows.exe>` — a wrapper script runs the payload.
    EnvRunner { script: String, windows_exe: String },
    /// `flatpak run <app-id> <windows.exe>` — the wrapper lives in a flatpak.
    FlatpakRun { app_id: String, windows_exe: String },
    /// Any other first token; the program itself is what gets validated.
    Direct { program: String },
}

impl ExecShape {
    /// The path that must exist on disk for the launch to be viable.
    ///
    /// For wrapper shapes that is the wrapped Windows executable; for a
    /// direct command it is the program itself.
    pub fn validation_target(&self) -> &str {
        match self {
            ExecShape::EnvRunner { windows_exe, .. } => windows_exe,
            ExecShape::FlatpakRun { windows_exe, .. } => windows_exe,
            ExecShape::Direct { program } => program,
        }
    }
}

/// Classify tokenized exec arguments into an [`ExecShape`].
///
/// Returns `None` only for an empty token list. `env` commands place the
/// payload at argv[3] (legacy shortcuts carry a runner mode at argv[2]);
/// shorter `env` commands keep it at argv[2].
pub fn classify(tokens: &[String]) -> Option<ExecShape> {
    let first = tokens.first()?;
    if file_name(first) == "env" && tokens.len() >= 3 {
        let windows_exe = if tokens.len() > 3 {
            tokens[3].clone()
        } else {
            tokens[2].clone()
        };
        return Some(ExecShape::EnvRunner {
            script: tokens[1].clone(),
            windows_exe,
        });
    }
    if file_name(first) == "flatpak"
        && tokens.get(1).map(String::as_str) == Some("run")
        && tokens.len() >= 4
    {
        return Some(ExecShape::FlatpakRun {
            app_id: tokens[2].clone(),
            windows_exe: tokens[3].clone(),
        });
    }
    Some(ExecShape::Direct {
        program: first.clone(),
    })
}

/// Extract the wrapped Windows executable path from shortcut exec tokens.
///
/// This is the discovery-time heuristic used by the shortcut scanner:
/// `env`-runner commands carry the payload as the fourth argument, anything
/// else is assumed to end with it.
pub fn wrapped_windows_exe(tokens: &[String]) -> Option<&str> {
    let first = tokens.first()?;
    if file_name(first) == "env" {
        if let Some(exe) = tokens.get(3) {
            return Some(exe);
        }
    }
    tokens.last().map(String::as_str)
}

/// Everything the presentation layer needs to spawn a game process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    pub program: String,
    pub args: Vec<String>,
    /// Extra environment variables to set for the child process.
    pub env: Vec<(String, String)>,
}

/// Build a launch plan from tokenized exec arguments.
///
/// Sets `START_FROM_STEAM=1` when the wrapper is entered through its
/// Steam-style entry script or through the flatpak shape, matching what the
/// wrapper's own shortcuts expect.
pub fn launch_plan(tokens: &[String]) -> Option<LaunchPlan> {
    let shape = classify(tokens)?;
    let mut env = Vec::new();
    match &shape {
        ExecShape::EnvRunner { script, .. } => {
            if script.ends_with(STEAM_ENTRY_SCRIPT) {
                env.push(("START_FROM_STEAM".to_string(), "1".to_string()));
            }
        }
        ExecShape::FlatpakRun { .. } => {
            env.push(("START_FROM_STEAM".to_string(), "1".to_string()));
        }
        ExecShape::Direct { .. } => {}
    }
    Some(LaunchPlan {
        program: tokens[0].clone(),
        args: tokens[1..].to_vec(),
        env,
    })
}

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(command: &str) -> Vec<String> {
        tokenize(command)
    }

    #[test]
    fn tokenize_splits_on_whitespace() {
        assert_eq!(toks("steam steam://rungameid/220"), vec!["steam", "steam://rungameid/220"]);
        assert_eq!(toks("  a   b  "), vec!["a", "b"]);
        assert!(toks("").is_empty());
    }

    #[test]
    fn tokenize_respects_quotes() {
        assert_eq!(
            toks(r#"env "/home/u/.local/share/PortProton/data/scripts/start.sh" "PortProton" "/games/Half Life 2/hl2.exe""#),
            vec![
                "env",
                "/home/u/.local/share/PortProton/data/scripts/start.sh",
                "PortProton",
                "/games/Half Life 2/hl2.exe",
            ]
        );
        assert_eq!(toks("run 'one two' three"), vec!["run", "one two", "three"]);
    }

    #[test]
    fn tokenize_handles_escapes_and_empty_quotes() {
        assert_eq!(toks(r"a\ b c"), vec!["a b", "c"]);
        assert_eq!(toks(r#"say "\"hi\"""#), vec!["say", "\"hi\""]);
        assert_eq!(toks(r#"x "" y"#), vec!["x", "", "y"]);
        // Unterminated quote consumes the remainder.
        assert_eq!(toks(r#"run "half done"#), vec!["run", "half done"]);
    }

    #[test]
    fn classify_env_runner_legacy_argv3() {
        let shape = classify(&toks("env /pp/data/scripts/start.sh PortProton /games/hl2.exe"));
        assert_eq!(
            shape,
            Some(ExecShape::EnvRunner {
                script: "/pp/data/scripts/start.sh".into(),
                windows_exe: "/games/hl2.exe".into(),
            })
        );
    }

    #[test]
    fn classify_env_runner_short_form_argv2() {
        let shape = classify(&toks("env /pp/start.sh /games/hl2.exe"));
        assert_eq!(
            shape,
            Some(ExecShape::EnvRunner {
                script: "/pp/start.sh".into(),
                windows_exe: "/games/hl2.exe".into(),
            })
        );
    }

    #[test]
    fn classify_flatpak_run() {
        let shape = classify(&toks("flatpak run ru.linux_gaming.PortProton /games/hl2.exe"));
        assert_eq!(
            shape,
            Some(ExecShape::FlatpakRun {
                app_id: "ru.linux_gaming.PortProton".into(),
                windows_exe: "/games/hl2.exe".into(),
            })
        );
    }

    #[test]
    fn classify_direct_command() {
        let shape = classify(&toks("steam steam://rungameid/220"));
        assert_eq!(shape, Some(ExecShape::Direct { program: "steam".into() }));
        assert_eq!(classify(&[]), None);
    }

    #[test]
    fn wrapped_exe_prefers_fourth_env_argument() {
        assert_eq!(
            wrapped_windows_exe(&toks("env /pp/start.sh PortProton /games/hl2.exe")),
            Some("/games/hl2.exe")
        );
        assert_eq!(
            wrapped_windows_exe(&toks("/usr/bin/wine /games/solitaire.exe")),
            Some("/games/solitaire.exe")
        );
        assert_eq!(wrapped_windows_exe(&[]), None);
    }

    #[test]
    fn launch_plan_sets_steam_entry_env() {
        let plan =
            launch_plan(&toks("env /pp/data/scripts/start.sh PortProton /games/hl2.exe")).unwrap();
        assert_eq!(plan.program, "env");
        assert_eq!(plan.env, vec![("START_FROM_STEAM".to_string(), "1".to_string())]);

        let plan = launch_plan(&toks("flatpak run ru.linux_gaming.PortProton /g/hl2.exe")).unwrap();
        assert_eq!(plan.env.len(), 1);

        let plan = launch_plan(&toks("env /elsewhere/run.sh PortProton /g/hl2.exe")).unwrap();
        assert!(plan.env.is_empty());

        let plan = launch_plan(&toks("steam steam://rungameid/220")).unwrap();
        assert_eq!(plan.program, "steam");
        assert_eq!(plan.args, vec!["steam://rungameid/220"]);
        assert!(plan.env.is_empty());
    }

    #[test]
    fn validation_target_per_shape() {
        let env_shape = classify(&toks("env /pp/start.sh PortProton /g/hl2.exe")).unwrap();
        assert_eq!(env_shape.validation_target(), "/g/hl2.exe");
        let direct = classify(&toks("/usr/bin/lutris")).unwrap();
        assert_eq!(direct.validation_target(), "/usr/bin/lutris");
    }
}
