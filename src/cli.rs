//! Command-line parsing
//!
//! The flags are single-dash words (`-buildfile`, `-Dname=value`, ...) with
//! a few irregular rules, so they are scanned by hand in one left-to-right
//! pass over a [`TokenCursor`].

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::{MessageLevel, RunConfiguration, DEFAULT_BUILD_FILENAME};
use crate::error::MyrmexError;
use crate::output::{OutputContext, Sink};
use crate::utils::paths::{absolutize, find_build_file};
use crate::utils::terminal::disable_colors;
use crate::version;

/// Forward-only view over the command-line tokens
#[derive(Debug)]
pub struct TokenCursor<'a> {
    tokens: &'a [String],
    position: usize,
}

impl<'a> TokenCursor<'a> {
    pub fn new(tokens: &'a [String]) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    pub fn has_next(&self) -> bool {
        self.position < self.tokens.len()
    }

    pub fn peek(&self) -> Option<&'a str> {
        self.tokens.get(self.position).map(String::as_str)
    }

    /// Consume and return the next token
    pub fn advance(&mut self) -> Option<&'a str> {
        let token = self.peek()?;
        self.position += 1;
        Some(token)
    }

    /// Consume a flag argument, failing with the `missing` message if there is none
    pub fn next_value(&mut self, missing: &str) -> Result<&'a str, MyrmexError> {
        self.advance().ok_or_else(|| MyrmexError::config_error(missing))
    }
}

/// Usage text printed by `-help` and after an unknown flag
pub fn usage() -> String {
    let mut msg = String::new();
    msg.push_str("myrmex [options] [target [target2 [target3] ...]]\n");
    msg.push_str("Options: \n");
    msg.push_str("  -help                  print this message\n");
    msg.push_str("  -projecthelp           print project help information\n");
    msg.push_str("  -version               print the version information and exit\n");
    msg.push_str("  -quiet, -q             be extra quiet\n");
    msg.push_str("  -verbose, -v           be extra verbose\n");
    msg.push_str("  -debug                 print debugging information\n");
    msg.push_str("  -emacs                 produce logging information without adornments\n");
    msg.push_str("  -logfile <file>        use given file for log\n");
    msg.push_str("  -logger <classname>    the class which is to perform logging\n");
    msg.push_str("  -listener <classname>  add an instance of class as a project listener\n");
    msg.push_str("  -buildfile <file>      use given buildfile\n");
    msg.push_str("  -D<property>=<value>   use value for given property\n");
    msg.push_str("  -find <file>           search for buildfile towards the root of the\n");
    msg.push_str("                         filesystem and use it\n");
    msg
}

/// Turns command-line tokens into a [`RunConfiguration`]
pub struct ArgumentParser<'a> {
    output: &'a mut OutputContext,
    working_dir: PathBuf,
}

impl<'a> ArgumentParser<'a> {
    /// Parser printing to `output`, resolving paths against `working_dir`
    pub fn new(output: &'a mut OutputContext, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            output,
            working_dir: working_dir.into(),
        }
    }

    fn print(&self, text: &str) {
        let mut out = self.output.out();
        let _ = writeln!(out, "{}", text);
        let _ = out.flush();
    }

    /// Scan `tokens` once.
    ///
    /// `-help` and `-version` return a configuration that is not ready to
    /// run. Malformed flags and an unusable build file are errors.
    pub fn parse(mut self, tokens: &[String]) -> Result<RunConfiguration, MyrmexError> {
        let mut config = RunConfiguration::default();
        let mut cursor = TokenCursor::new(tokens);

        while let Some(arg) = cursor.advance() {
            match arg {
                "-help" => {
                    self.print(&usage());
                    return Ok(config);
                }
                "-version" => {
                    self.print(&version::banner());
                    return Ok(config);
                }
                "-quiet" | "-q" => config.level = MessageLevel::Warn,
                "-verbose" | "-v" => {
                    self.print(&version::banner());
                    config.level = MessageLevel::Verbose;
                }
                "-debug" => {
                    self.print(&version::banner());
                    config.level = MessageLevel::Debug;
                }
                "-logfile" | "-l" => {
                    let path = cursor.next_value(
                        "You must specify a log file when using the -log argument",
                    )?;
                    self.redirect_to_log_file(Path::new(path))?;
                }
                "-buildfile" | "-file" | "-f" => {
                    let path = cursor.next_value(
                        "You must specify a buildfile when using the -buildfile argument",
                    )?;
                    config.build_file = Some(PathBuf::from(path));
                }
                "-listener" => {
                    let class = cursor.next_value(
                        "You must specify a classname when using the -listener argument",
                    )?;
                    config.listeners.push(class.to_string());
                }
                "-logger" => {
                    if config.logger.is_some() {
                        return Err(MyrmexError::config_error(
                            "Only one logger class may be specified.",
                        ));
                    }
                    let class = cursor.next_value(
                        "You must specify a classname when using the -logger argument",
                    )?;
                    config.logger = Some(class.to_string());
                }
                "-emacs" => {
                    config.emacs_mode = true;
                    disable_colors();
                }
                "-projecthelp" => config.project_help = true,
                "-find" => {
                    // Takes the next token whatever it looks like
                    let suffix = cursor.advance().unwrap_or(DEFAULT_BUILD_FILENAME);
                    config.search_for = Some(suffix.to_string());
                }
                _ if arg.starts_with("-D") => {
                    let (name, value) = parse_define(&arg[2..], &mut cursor)?;
                    config.properties.insert(name, value);
                }
                _ if arg.starts_with('-') => {
                    return Err(MyrmexError::UnknownArgument {
                        argument: arg.to_string(),
                    });
                }
                _ => config.targets.push(arg.to_string()),
            }
        }

        let build_file = self.resolve_build_file(&config)?;
        config.resolved_build_file = Some(build_file);
        config.ready_to_run = true;
        Ok(config)
    }

    fn redirect_to_log_file(&mut self, path: &Path) -> Result<(), MyrmexError> {
        let path = absolutize(&self.working_dir, path);
        let file = File::create(&path).map_err(|_| {
            MyrmexError::config_error_with_hint(
                "Cannot write on the specified log file. \
                 Make sure the path exists and you have write permissions.",
                format!("The log file was resolved to {}", path.display()),
            )
        })?;

        let sink = Sink::new(file);
        self.output.replace(sink.clone(), sink);
        disable_colors();
        Ok(())
    }

    fn resolve_build_file(&self, config: &RunConfiguration) -> Result<PathBuf, MyrmexError> {
        let build_file = match (&config.build_file, &config.search_for) {
            (Some(path), _) => absolutize(&self.working_dir, path),
            (None, Some(suffix)) => {
                let mut out = self.output.out();
                find_build_file(&self.working_dir, suffix, config.level, &mut out)?
            }
            (None, None) => self.working_dir.join(DEFAULT_BUILD_FILENAME),
        };

        if !build_file.exists() {
            return Err(MyrmexError::MissingBuildFile { path: build_file });
        }
        if build_file.is_dir() {
            return Err(MyrmexError::BuildFileIsDirectory { path: build_file });
        }
        Ok(build_file)
    }
}

/// Split the text after `-D` into a property name and value
fn parse_define(
    definition: &str,
    cursor: &mut TokenCursor<'_>,
) -> Result<(String, String), MyrmexError> {
    match definition.find('=') {
        Some(pos) if pos > 0 => Ok((
            definition[..pos].to_string(),
            definition[pos + 1..].to_string(),
        )),
        _ if cursor.has_next() => {
            let value = cursor.advance().unwrap_or_default();
            Ok((definition.to_string(), value.to_string()))
        }
        _ => Err(MyrmexError::config_error(format!(
            "You must specify a value when using -D{}",
            definition
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::testing::captured_context;
    use std::fs;
    use tempfile::TempDir;

    fn args(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|s| s.to_string()).collect()
    }

    fn project_dir() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("build.toml"), "").unwrap();
        temp_dir
    }

    fn parse_in(dir: &Path, tokens: &[&str]) -> Result<RunConfiguration, MyrmexError> {
        let (mut ctx, _, _) = captured_context();
        ArgumentParser::new(&mut ctx, dir).parse(&args(tokens))
    }

    #[test]
    fn test_cursor() {
        let tokens = args(&["a", "b"]);
        let mut cursor = TokenCursor::new(&tokens);
        assert!(cursor.has_next());
        assert_eq!(cursor.peek(), Some("a"));
        assert_eq!(cursor.advance(), Some("a"));
        assert_eq!(cursor.next_value("missing").unwrap(), "b");
        assert!(!cursor.has_next());
        assert!(cursor.next_value("missing").is_err());
    }

    #[test]
    fn test_default_build_file_in_working_dir() {
        let dir = project_dir();
        let config = parse_in(dir.path(), &[]).unwrap();

        assert!(config.ready_to_run);
        assert_eq!(
            config.resolved_build_file,
            Some(dir.path().join(DEFAULT_BUILD_FILENAME))
        );
        assert_eq!(config.level, MessageLevel::Info);
        assert!(config.targets.is_empty());
    }

    #[test]
    fn test_properties_and_targets() {
        let dir = project_dir();
        let config = parse_in(dir.path(), &["-Dfoo=bar", "compile"]).unwrap();

        assert_eq!(config.properties.get("foo").map(String::as_str), Some("bar"));
        assert_eq!(config.targets, vec!["compile".to_string()]);
    }

    #[test]
    fn test_define_last_write_wins() {
        let dir = project_dir();
        let config = parse_in(dir.path(), &["-Dk=v", "x", "-Dk=w"]).unwrap();
        assert_eq!(config.properties["k"], "w");
        assert_eq!(config.properties.len(), 1);
    }

    #[test]
    fn test_define_forms() {
        let dir = project_dir();
        let config = parse_in(
            dir.path(),
            &["-Dsplit", "value", "-Dempty=", "-D=odd", "next", "-Da=b=c"],
        )
        .unwrap();

        assert_eq!(config.properties["split"], "value");
        assert_eq!(config.properties["empty"], "");
        assert_eq!(config.properties["=odd"], "next");
        assert_eq!(config.properties["a"], "b=c");
        assert!(config.targets.is_empty());
    }

    #[test]
    fn test_define_without_value() {
        let dir = project_dir();
        let err = parse_in(dir.path(), &["-Dlonely"]).unwrap_err();
        assert_eq!(err.to_string(), "You must specify a value when using -Dlonely");
    }

    #[test]
    fn test_targets_keep_order_and_duplicates() {
        let dir = project_dir();
        let config = parse_in(dir.path(), &["b", "a", "b"]).unwrap();
        assert_eq!(config.targets, args(&["b", "a", "b"]));
    }

    #[test]
    fn test_levels() {
        let dir = project_dir();
        assert_eq!(parse_in(dir.path(), &["-q"]).unwrap().level, MessageLevel::Warn);
        assert_eq!(parse_in(dir.path(), &["-quiet"]).unwrap().level, MessageLevel::Warn);
        assert_eq!(parse_in(dir.path(), &["-v"]).unwrap().level, MessageLevel::Verbose);
        assert_eq!(parse_in(dir.path(), &["-debug"]).unwrap().level, MessageLevel::Debug);
    }

    #[test]
    fn test_verbose_prints_banner() {
        let dir = project_dir();
        let (mut ctx, out, _) = captured_context();
        ArgumentParser::new(&mut ctx, dir.path())
            .parse(&args(&["-verbose"]))
            .unwrap();
        assert!(out.contents().starts_with("Myrmex version "));
    }

    #[test]
    fn test_help_and_version_stop_early() {
        let (mut ctx, out, _) = captured_context();
        let missing = Path::new("/definitely/not/here");
        let config = ArgumentParser::new(&mut ctx, missing)
            .parse(&args(&["-help", "-bogus"]))
            .unwrap();
        assert!(!config.ready_to_run);
        assert!(out.contents().contains("-projecthelp"));

        let (mut ctx, out, _) = captured_context();
        let config = ArgumentParser::new(&mut ctx, missing)
            .parse(&args(&["-version"]))
            .unwrap();
        assert!(!config.ready_to_run);
        assert!(out.contents().contains(" compiled on "));
    }

    #[test]
    fn test_flags() {
        let dir = project_dir();
        let config = parse_in(
            dir.path(),
            &[
                "-emacs",
                "-projecthelp",
                "-listener",
                "A",
                "-listener",
                "B",
                "-logger",
                "DefaultLogger",
            ],
        )
        .unwrap();

        assert!(config.emacs_mode);
        assert!(config.project_help);
        assert_eq!(config.listeners, args(&["A", "B"]));
        assert_eq!(config.logger.as_deref(), Some("DefaultLogger"));
    }

    #[test]
    fn test_second_logger_rejected() {
        let dir = project_dir();
        let err = parse_in(dir.path(), &["-logger", "A", "-logger", "B"]).unwrap_err();
        assert_eq!(err.to_string(), "Only one logger class may be specified.");
    }

    #[test]
    fn test_missing_flag_arguments() {
        let dir = project_dir();
        for flag in ["-logfile", "-l", "-buildfile", "-file", "-f", "-listener", "-logger"] {
            let err = parse_in(dir.path(), &[flag]).unwrap_err();
            assert!(
                err.to_string().starts_with("You must specify"),
                "{} gave {}",
                flag,
                err
            );
        }
    }

    #[test]
    fn test_unknown_argument() {
        let dir = project_dir();
        let err = parse_in(dir.path(), &["-bogus"]).unwrap_err();
        assert!(err.wants_usage());
        assert_eq!(err.to_string(), "Unknown argument: -bogus");
    }

    #[test]
    fn test_explicit_build_file() {
        let dir = project_dir();
        fs::write(dir.path().join("other.toml"), "").unwrap();

        let config = parse_in(dir.path(), &["-f", "other.toml"]).unwrap();
        assert_eq!(config.build_file, Some(PathBuf::from("other.toml")));
        assert_eq!(config.resolved_build_file, Some(dir.path().join("other.toml")));
    }

    #[test]
    fn test_missing_build_file() {
        let dir = TempDir::new().unwrap();
        let err = parse_in(dir.path(), &[]).unwrap_err();
        assert_eq!(
            err.to_string(),
            format!(
                "Buildfile: {} does not exist!",
                dir.path().join("build.toml").display()
            )
        );
    }

    #[test]
    fn test_build_file_is_directory() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("build.toml")).unwrap();
        let err = parse_in(dir.path(), &[]).unwrap_err();
        assert!(matches!(err, MyrmexError::BuildFileIsDirectory { .. }));
    }

    #[test]
    fn test_find_from_nested_directory() {
        let dir = project_dir();
        let nested = dir.path().join("src").join("deep").join("er");
        fs::create_dir_all(&nested).unwrap();

        let config = parse_in(&nested, &["-find", "build.toml", "compile"]).unwrap();
        assert_eq!(config.search_for.as_deref(), Some("build.toml"));
        assert_eq!(config.targets, args(&["compile"]));
        assert_eq!(config.resolved_build_file, Some(dir.path().join("build.toml")));

        // `-find` takes the next token as the file name, even a target name
        let err = parse_in(&nested, &["-find", "compile"]).unwrap_err();
        assert!(
            matches!(err, MyrmexError::BuildFileNotFound { ref suffix, .. } if suffix == "compile")
        );

        let config = parse_in(&nested, &["-find"]).unwrap();
        assert_eq!(config.search_for.as_deref(), Some(DEFAULT_BUILD_FILENAME));
        assert_eq!(config.resolved_build_file, Some(dir.path().join("build.toml")));
        assert!(config.targets.is_empty());
    }

    #[test]
    fn test_find_consumes_flag_like_token() {
        let dir = project_dir();
        let err = parse_in(dir.path(), &["-find", "-verbose"]).unwrap_err();
        assert!(
            matches!(err, MyrmexError::BuildFileNotFound { ref suffix, .. } if suffix == "-verbose")
        );
    }

    #[test]
    fn test_logfile_redirects_both_sinks() {
        let dir = project_dir();
        let (mut ctx, out, _) = captured_context();
        let config = ArgumentParser::new(&mut ctx, dir.path())
            .parse(&args(&["-logfile", "run.log", "-version"]))
            .unwrap();

        assert!(!config.ready_to_run);
        assert!(ctx.out().same_as(&ctx.err()));
        assert!(out.contents().is_empty());
        let logged = fs::read_to_string(dir.path().join("run.log")).unwrap();
        assert!(logged.starts_with("Myrmex version "));
    }

    #[test]
    fn test_logfile_unwritable() {
        let dir = project_dir();
        let err = parse_in(dir.path(), &["-l", "no/such/dir/run.log"]).unwrap_err();
        assert!(err.to_string().starts_with("Cannot write on the specified log file."));
    }
}
