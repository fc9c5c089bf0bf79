use super::commands::config::ConfigCommands;
use super::commands::lecture::LectureCommands;
use super::commands::user::UserCommands;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "qanda")]
#[command(about = "Ask and answer questions about lectures from the terminal")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the database and install its design documents
    Install,
    /// Lecture management
    Lecture(LectureCommands),
    /// User management
    User(UserCommands),
    /// Configuration management
    Config(ConfigCommands),
    /// Launch the interactive TUI (default)
    Tui,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::config::ConfigSubcommands;
    use crate::cli::commands::lecture::LectureSubcommands;
    use crate::cli::commands::user::UserSubcommands;

    #[test]
    fn test_no_subcommand_means_tui() {
        let cli = Cli::try_parse_from(["qanda"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_lecture_create_parses_name() {
        let cli = Cli::try_parse_from(["qanda", "lecture", "create", "HCI 101"]).unwrap();
        match cli.command {
            Some(Commands::Lecture(LectureCommands {
                command: LectureSubcommands::Create { name },
            })) => assert_eq!(name, "HCI 101"),
            _ => panic!("expected lecture create"),
        }
    }

    #[test]
    fn test_user_create_flags_are_optional() {
        let cli = Cli::try_parse_from(["qanda", "user", "create", "--username", "alice"]).unwrap();
        match cli.command {
            Some(Commands::User(UserCommands {
                command: UserSubcommands::Create { username, display_name },
            })) => {
                assert_eq!(username.as_deref(), Some("alice"));
                assert_eq!(display_name, None);
            }
            _ => panic!("expected user create"),
        }
    }

    #[test]
    fn test_config_set_takes_key_and_value() {
        let cli = Cli::try_parse_from(["qanda", "config", "set", "theme", "latte"]).unwrap();
        match cli.command {
            Some(Commands::Config(ConfigCommands {
                command: ConfigSubcommands::Set { key, value },
            })) => {
                assert_eq!(key, "theme");
                assert_eq!(value, "latte");
            }
            _ => panic!("expected config set"),
        }
    }

    #[test]
    fn test_lecture_create_requires_name() {
        assert!(Cli::try_parse_from(["qanda", "lecture", "create"]).is_err());
    }
}
