//! [`WallpaperDaemon`] implementation backed by `swww`.
//!
//! `swww query` prints one line per output:
//!
//! ```text
//! eDP-1: 1920x1080, scale: 1, currently displaying: image: /home/me/Pictures/wallpapers/dune.jpg
//! ```

use crate::command::Transition;
use crate::traits::{CommandRunner, WallpaperDaemon};
use log::{info, warn};
use std::path::{Path, PathBuf};

const SWWW: &str = "swww";

/// Wallpaper backend that shells out to `swww`.
#[derive(Debug, Clone, Default)]
pub struct Swww<R> {
    runner: R,
}

impl<R: CommandRunner> Swww<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    #[cfg(test)]
    pub(crate) fn runner(&self) -> &R {
        &self.runner
    }
}

/// The image path from the first `swww query` line that shows one.
///
/// Lines showing a solid colour (`currently displaying: color: …`) are
/// skipped.
pub fn parse_query(text: &str) -> Option<PathBuf> {
    text.lines().find_map(|line| {
        let (_, path) = line.rsplit_once("image:")?;
        let path = path.trim();
        (!path.is_empty()).then(|| PathBuf::from(path))
    })
}

/// Arguments for `swww img`.
pub fn img_args(path: &Path, transition: &Transition) -> Vec<String> {
    vec![
        "img".into(),
        path.to_string_lossy().into_owned(),
        "--transition-type".into(),
        transition.kind.to_string(),
        "--transition-duration".into(),
        transition.duration.to_string(),
        "--transition-fps".into(),
        transition.fps.to_string(),
    ]
}

impl<R: CommandRunner> WallpaperDaemon for Swww<R> {
    type Error = R::Error;

    fn ensure_running(&self) -> Result<(), Self::Error> {
        if !self.runner.status(SWWW, &["query"])? {
            warn!("swww daemon not answering, starting swww-daemon");
            self.runner.spawn("swww-daemon", &[])?;
        }
        Ok(())
    }

    fn current(&self) -> Result<Option<PathBuf>, Self::Error> {
        Ok(parse_query(&self.runner.output(SWWW, &["query"])?))
    }

    fn apply(&self, path: &Path, transition: &Transition) -> Result<(), Self::Error> {
        info!("wallpaper -> {} ({})", path.display(), transition.kind);
        let args = img_args(path, transition);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.runner.output(SWWW, &args).map(|_| ())
    }
}
