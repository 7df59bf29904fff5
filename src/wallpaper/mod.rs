//! Wallpaper carousel model: image discovery, the selection ring with
//! hold acceleration, and the thumbnail cache.

pub mod cache;
pub mod carousel;
pub mod scan;

pub use cache::{cover_size, ThumbnailCache};
pub use carousel::{Carousel, Fire, HoldController, SlideAnimation, SlideTick};
pub use scan::{list_images, resolve_directory};

use crate::traits::WallpaperDaemon;
use log::warn;
use std::path::PathBuf;

/// The wallpaper `daemon` is showing, or `None` when it cannot tell.
///
/// With `start_daemon` a stopped daemon is started first.  Without it the
/// daemon is only queried, so read-only callers never launch a process.
pub fn current_wallpaper<D: WallpaperDaemon>(daemon: &D, start_daemon: bool) -> Option<PathBuf> {
    if start_daemon {
        if let Err(e) = daemon.ensure_running() {
            warn!("could not start wallpaper daemon: {}", e);
        }
    }
    daemon.current().unwrap_or_else(|e| {
        warn!("wallpaper query failed: {}", e);
        None
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::swww::Swww;
    use crate::cli::testing::ScriptedRunner;

    const QUERY: &str = "eDP-1: 1920x1080, scale: 1, currently displaying: image: /w/a.png\n";

    #[test]
    fn query_only_never_starts_daemon() {
        let swww = Swww::new(ScriptedRunner::new().with_failure("swww query"));
        assert_eq!(current_wallpaper(&swww, false), None);
        assert!(!swww_calls(&swww).iter().any(|c| c.starts_with("swww-daemon")));
    }

    #[test]
    fn starting_daemon_when_query_fails() {
        let swww = Swww::new(ScriptedRunner::new().with_failure("swww query"));
        assert_eq!(current_wallpaper(&swww, true), None);
        assert!(swww_calls(&swww).contains(&"swww-daemon &".to_string()));
    }

    #[test]
    fn reports_current_image() {
        let swww = Swww::new(ScriptedRunner::new().with_output("swww query", QUERY));
        assert_eq!(current_wallpaper(&swww, false), Some(PathBuf::from("/w/a.png")));
        assert_eq!(swww_calls(&swww), vec!["swww query"]);
    }

    fn swww_calls(swww: &Swww<ScriptedRunner>) -> Vec<String> {
        swww.runner().calls()
    }
}
