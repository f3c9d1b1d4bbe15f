//! Git output parsing helpers.

use std::process::Output;

/// Formats a git error with both stdout and stderr for better debugging.
pub fn format_git_error(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();

    match (stderr.is_empty(), stdout.is_empty()) {
        (true, true) => format!(
            "Command failed with exit code {}",
            output.status.code().unwrap_or(-1)
        ),
        (true, false) => stdout,
        (false, true) => stderr,
        (false, false) => format!("{}\n{}", stderr, stdout),
    }
}

/// Paths listed by `git status --porcelain`, renames reported by their new
/// name.
pub fn changed_paths(porcelain: &str) -> Vec<String> {
    porcelain
        .lines()
        .filter(|line| line.len() > 3)
        .map(|line| {
            let path = line[3..].trim();
            path.rsplit(" -> ").next().unwrap_or(path).to_string()
        })
        .collect()
}

/// Splits a chunk of git stderr into progress segments. Git redraws progress
/// with `\r`, so a single line may hold many updates.
pub fn progress_segments(line: &str) -> impl Iterator<Item = &str> {
    line.split('\r').map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_changed_paths() {
        let porcelain = "A  story.json\n?? avatars/avatar-1.png\nR  old.png -> img/new.png\n";
        assert_eq!(
            changed_paths(porcelain),
            vec!["story.json", "avatars/avatar-1.png", "img/new.png"]
        );
        assert!(changed_paths("").is_empty());
    }

    #[test]
    fn test_progress_segments() {
        let line = "Writing objects:  50% (1/2)\rWriting objects: 100% (2/2), done.\r";
        let segments: Vec<_> = progress_segments(line).collect();
        assert_eq!(
            segments,
            vec!["Writing objects:  50% (1/2)", "Writing objects: 100% (2/2), done."]
        );
    }

    #[cfg(unix)]
    mod unix_tests {
        use super::*;
        use std::os::unix::process::ExitStatusExt;
        use std::process::ExitStatus;

        fn make_output(status_code: i32, stdout: &[u8], stderr: &[u8]) -> Output {
            Output {
                status: ExitStatus::from_raw(status_code << 8),
                stdout: stdout.to_vec(),
                stderr: stderr.to_vec(),
            }
        }

        #[test]
        fn test_format_git_error_empty_output() {
            let output = make_output(1, b"", b"");
            assert_eq!(format_git_error(&output), "Command failed with exit code 1");
        }

        #[test]
        fn test_format_git_error_both() {
            let output = make_output(1, b"some output", b"some error");
            assert_eq!(format_git_error(&output), "some error\nsome output");
        }
    }
}
