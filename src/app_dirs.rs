use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "dsatype";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    fn project() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", APP_NAME)
    }

    /// `$HOME/.local/state/dsatype`, falling back to the platform data dir
    pub fn state_dir() -> PathBuf {
        if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home)
                .join(".local")
                .join("state")
                .join(APP_NAME)
        } else if let Some(proj_dirs) = Self::project() {
            proj_dirs.data_local_dir().to_path_buf()
        } else {
            PathBuf::from(".")
        }
    }

    pub fn config_path() -> PathBuf {
        match Self::project() {
            Some(pd) => pd.config_dir().join("config.json"),
            None => PathBuf::from("dsatype_config.json"),
        }
    }

    pub fn results_path() -> PathBuf {
        Self::state_dir().join("results.csv")
    }

    pub fn log_path() -> PathBuf {
        Self::state_dir().join("dsatype.log")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_files_share_a_directory() {
        let state = AppDirs::state_dir();
        assert_eq!(AppDirs::results_path().parent(), Some(state.as_path()));
        assert_eq!(AppDirs::log_path().parent(), Some(state.as_path()));
    }

    #[test]
    fn test_config_file_name() {
        assert!(AppDirs::config_path().ends_with("config.json")
            || AppDirs::config_path().ends_with("dsatype_config.json"));
    }
}
