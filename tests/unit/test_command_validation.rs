//! Unit tests for command validation
//!
//! These tests validate the deny rules applied to commands before they are
//! written to the shell.

use repotools::safety::{check_command, CommandVerdict, DENIED_PROGRAMS};

#[cfg(test)]
mod command_validation_tests {
    use super::*;

    #[test]
    fn test_validate_simple_command() {
        assert_eq!(check_command("ls"), CommandVerdict::Allowed);
    }

    #[test]
    fn test_validate_command_with_pipes_and_redirects() {
        assert!(check_command("grep -rn TODO src | sort > todo.txt").is_allowed());
        assert!(check_command("cargo test 2>&1 | tail -n 20").is_allowed());
    }

    #[test]
    fn test_validate_multiline_command() {
        let script = "set -e\ncd src\nls";
        assert!(check_command(script).is_allowed());

        let hidden = "echo fine\nsudo rm file";
        assert!(!check_command(hidden).is_allowed());
    }

    #[test]
    fn test_every_denied_program_is_rejected() {
        for program in DENIED_PROGRAMS {
            let verdict = check_command(&format!("{} --help", program));
            assert_eq!(
                verdict.reason(),
                Some(format!("Command '{}' is not permitted.", program).as_str()),
                "{}",
                program
            );
        }
    }

    #[test]
    fn test_denied_program_is_case_sensitive() {
        assert!(check_command("echo Reboot").is_allowed());
        assert!(!check_command("echo reboot").is_allowed());
    }

    #[test]
    fn test_sudo_takes_precedence() {
        let verdict = check_command("sudo reboot");
        assert_eq!(verdict.reason(), Some("Use of 'sudo' is not allowed."));
    }

    #[test]
    fn test_sudo_with_separators() {
        for cmd in ["sudo", "a|sudo b", "a&&sudo b", "x; sudo", "\tsudo\t-i"] {
            assert!(!check_command(cmd).is_allowed(), "{}", cmd);
        }
        for cmd in ["visudo-check", "sudoers", "my_sudo", "echo 'pseudo'"] {
            assert!(check_command(cmd).is_allowed(), "{}", cmd);
        }
    }

    #[test]
    fn test_root_removal_variants() {
        assert!(!check_command("rm -rfv /").is_allowed());
        assert!(!check_command("rm -f -R /*").is_allowed());
        assert!(!check_command("ls; rm --force -r /").is_allowed());
        assert!(!check_command("rm -rf -- /").is_allowed());
    }

    #[test]
    fn test_scoped_removal_allowed() {
        assert!(check_command("rm -rf /tmp/build").is_allowed());
        assert!(check_command("rm -rf target").is_allowed());
        assert!(check_command("rm /").is_allowed());
        assert!(check_command("echo rm -rf; ls /").is_allowed());
    }

    #[test]
    fn test_empty_command_is_not_a_safety_concern() {
        // Empty input is rejected by the toolbox, not the filter
        assert!(check_command("").is_allowed());
    }
}
