use std::fmt;

/// Deployment target a package is assembled for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Environment {
    #[default]
    Local,
    Dev,
    Live,
}

impl Environment {
    /// `--prod` selects live, `--dev` selects dev, neither selects local.
    pub fn from_flags(prod: bool, dev: bool) -> Self {
        match (prod, dev) {
            (true, _) => Self::Live,
            (false, true) => Self::Dev,
            (false, false) => Self::Local,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Dev => "dev",
            Self::Live => "live",
        }
    }

    pub fn archive_suffix(self) -> &'static str {
        match self {
            Self::Dev => "-dev",
            Self::Local | Self::Live => "",
        }
    }

    pub fn archive_name(self, task_name: &str) -> String {
        format!("{task_name}{}.zip", self.archive_suffix())
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
