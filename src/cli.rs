use crate::layout::LayoutVersion;
use clap::Parser;
use std::path::PathBuf;

/// Every option is optional so that a config file can supply it; anything
/// given on the command line wins.
#[derive(Parser, Debug)]
#[command(name = "thermocam-live")]
#[command(version)]
#[command(about = "Headless live view for a thermal camera webserver")]
pub struct Args {
    /// Page origin of the camera webserver (the socket is <origin>/ws)
    #[arg(long)]
    pub url: Option<String>,

    /// Viewer layout paired with the server deployment
    #[arg(long, value_enum)]
    pub layout: Option<LayoutVersion>,

    /// Delay before reconnecting after the socket closes, in milliseconds
    #[arg(long)]
    pub reconnect_ms: Option<u64>,

    /// Keep an HTML rendering of the live page at this path
    #[arg(long, short)]
    pub snapshot: Option<PathBuf>,

    /// TOML config file with the same keys as the flags above
    #[arg(long, short)]
    pub config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parse_minimal() {
        let args = Args::parse_from(["thermocam-live"]);
        assert!(args.url.is_none());
        assert!(args.layout.is_none());
        assert!(args.reconnect_ms.is_none());
        assert!(args.snapshot.is_none());
        assert!(args.config.is_none());
    }

    #[test]
    fn test_args_parse_full() {
        let args = Args::parse_from([
            "thermocam-live",
            "--url",
            "https://cam.local",
            "--layout",
            "v2",
            "--reconnect-ms",
            "500",
            "--snapshot",
            "live.html",
            "--config",
            "viewer.toml",
        ]);
        assert_eq!(args.url.as_deref(), Some("https://cam.local"));
        assert_eq!(args.layout, Some(LayoutVersion::V2));
        assert_eq!(args.reconnect_ms, Some(500));
        assert_eq!(args.snapshot, Some(PathBuf::from("live.html")));
        assert_eq!(args.config, Some(PathBuf::from("viewer.toml")));
    }

    #[test]
    fn test_args_short_flags() {
        let args = Args::parse_from(["thermocam-live", "-s", "out.html", "-c", "a.toml"]);
        assert_eq!(args.snapshot, Some(PathBuf::from("out.html")));
        assert_eq!(args.config, Some(PathBuf::from("a.toml")));
    }

    #[test]
    fn test_args_rejects_unknown_layout() {
        assert!(Args::try_parse_from(["thermocam-live", "--layout", "v9"]).is_err());
    }
}
