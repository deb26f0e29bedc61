use clap::Parser;

#[derive(Parser)]
#[command(name = "debate-lens")]
#[command(version = "0.2.0")]
#[command(about = "Terminal client and HTML renderer for multi-agent product-debate backends")]
pub struct Args {
    /// Topic to open a new debate with
    pub topic: Option<String>,

    /// Base URL of the debate backend API
    #[arg(long, default_value = "http://localhost:5000/api")]
    pub api_base: String,

    /// Resume a saved session by id instead of starting a new debate
    #[arg(long)]
    pub load: Option<String>,

    /// List saved sessions and exit
    #[arg(long)]
    pub sessions: bool,

    /// Serve the transcript viewer on localhost instead of the terminal loop
    #[arg(long)]
    pub serve: bool,

    /// Port for the transcript viewer
    #[arg(long, default_value = "8890")]
    pub port: u16,

    /// Write the transcript HTML to this path when the run ends
    #[arg(long)]
    pub export: Option<String>,

    /// Disable colored terminal output
    #[arg(long)]
    pub plain: bool,
}

/// A run needs exactly one entry point: a topic, a saved session, or the
/// sessions listing. The viewer never returns, so an `--export` alongside
/// `--serve` would never fire — reject it up front.
pub fn validate(args: &Args) -> Result<(), String> {
    if args.serve && args.export.is_some() {
        return Err("--export does not combine with --serve (the viewer serves the transcript itself)".to_string());
    }
    if args.sessions {
        return Ok(());
    }
    match (&args.topic, &args.load) {
        (Some(_), Some(_)) => Err("pass either a topic or --load, not both".to_string()),
        (None, None) => Err("pass a topic, or --load <session-id>, or --sessions".to_string()),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parse_minimal() {
        let args = Args::parse_from(["debate-lens", "a note-taking app"]);
        assert_eq!(args.topic.as_deref(), Some("a note-taking app"));
        assert_eq!(args.api_base, "http://localhost:5000/api");
        assert!(!args.serve);
        assert!(!args.sessions);
        assert!(!args.plain);
        assert_eq!(args.port, 8890);
        assert!(args.load.is_none());
        assert!(args.export.is_none());
    }

    #[test]
    fn test_args_parse_full() {
        let args = Args::parse_from([
            "debate-lens",
            "--api-base",
            "http://example.test/api",
            "--load",
            "abc123",
            "--serve",
            "--port",
            "9000",
            "--export",
            "out.html",
            "--plain",
        ]);
        assert!(args.topic.is_none());
        assert_eq!(args.api_base, "http://example.test/api");
        assert_eq!(args.load.as_deref(), Some("abc123"));
        assert!(args.serve);
        assert_eq!(args.port, 9000);
        assert_eq!(args.export.as_deref(), Some("out.html"));
        assert!(args.plain);
    }

    #[test]
    fn test_validate_topic_only() {
        let args = Args::parse_from(["debate-lens", "topic"]);
        assert!(validate(&args).is_ok());
    }

    #[test]
    fn test_validate_load_only() {
        let args = Args::parse_from(["debate-lens", "--load", "id1"]);
        assert!(validate(&args).is_ok());
    }

    #[test]
    fn test_validate_sessions_alone() {
        let args = Args::parse_from(["debate-lens", "--sessions"]);
        assert!(validate(&args).is_ok());
    }

    #[test]
    fn test_validate_rejects_topic_and_load() {
        let args = Args::parse_from(["debate-lens", "topic", "--load", "id1"]);
        assert!(validate(&args).is_err());
    }

    #[test]
    fn test_validate_rejects_nothing() {
        let args = Args::parse_from(["debate-lens"]);
        assert!(validate(&args).is_err());
    }

    #[test]
    fn test_validate_rejects_serve_with_export() {
        let args =
            Args::parse_from(["debate-lens", "--load", "id1", "--serve", "--export", "out.html"]);
        assert!(validate(&args).is_err());
    }

    #[test]
    fn test_validate_allows_serve_without_export() {
        let args = Args::parse_from(["debate-lens", "--load", "id1", "--serve"]);
        assert!(validate(&args).is_ok());
    }
}
