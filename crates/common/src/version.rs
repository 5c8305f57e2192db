use std::fmt;

#[derive(Debug, Clone, Copy)]
pub struct BuildInfo {
    pub version: &'static str,
    pub build_profile: &'static str,
    pub build_features: &'static str,
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hubstore {} ({} build",
            self.version, self.build_profile
        )?;
        if !self.build_features.is_empty() {
            write!(f, ", features: {}", self.build_features)?;
        }
        f.write_str(")")
    }
}

pub fn build_info() -> BuildInfo {
    BuildInfo {
        version: env!("CARGO_PKG_VERSION"),
        build_profile: if cfg!(debug_assertions) {
            "debug"
        } else {
            "release"
        },
        build_features: option_env!("HUBSTORE_BUILD_FEATURES").unwrap_or(""),
    }
}
